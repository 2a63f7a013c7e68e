// This file is part of marsh, a POSIX-compatible shell.
// Copyright (C) 2024 the marsh authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! This crate provides a function that quotes a string so that, when the
//! result is used in a shell script, it expands to a single field having the
//! same value as the original string.
//!
//! The [`quote`] function chooses a quoting mechanism according to the
//! following decision rules:
//!
//! - If the string is not empty and contains no characters that need
//!   quoting, the string is returned intact.
//! - Otherwise, if the string contains a control character, the whole string
//!   is encoded in the `$'...'` form with backslash escapes.
//! - Otherwise, the whole string is single-quoted, with each single quote
//!   spliced out as `'\''`.
//!
//! The following characters need quoting:
//!
//! - `;`, `&`, `|`, `(`, `)`, `<`, and `>`
//! - A space, tab, newline, or any other whitespace character
//! - `$`, `` ` ``, `\`, `"`, and `'`
//! - `=`, `*`, `?`, `[`, `]`, `{`, `}`, `!`, and `^`
//! - `#` or `~` occurring at the beginning of the string
//!
//! # Examples
//!
//! ```
//! # use std::borrow::Cow::{Borrowed, Owned};
//! # use marsh_quote::quote;
//! assert_eq!(quote("foo"), Borrowed("foo"));
//! assert_eq!(quote(""), Owned::<str>("''".to_owned()));
//! assert_eq!(quote("$foo"), Owned::<str>("'$foo'".to_owned()));
//! assert_eq!(quote("a'b"), Owned::<str>(r"'a'\''b'".to_owned()));
//! assert_eq!(quote("a\nb"), Owned::<str>(r"$'a\nb'".to_owned()));
//! ```

use std::borrow::Cow::{self, Borrowed, Owned};

/// Quotes the argument.
///
/// If the argument needs no quoting, the return value is `Borrowed(s)`.
/// Otherwise, it is `Owned(new_quoted_string)`.
///
/// See the [module doc](self) for more details.
#[must_use]
pub fn quote(s: &str) -> Cow<str> {
    if !s.is_empty() && !str_needs_quoting(s) {
        return Borrowed(s);
    }

    if s.chars().any(char::is_control) {
        return Owned(dollar_single_quote(s));
    }

    Owned(single_quote(s))
}

/// Encloses the string in single quotes, splicing out single quotes.
fn single_quote(s: &str) -> String {
    let mut result = String::with_capacity(s.len().saturating_add(8));
    result.push('\'');
    for c in s.chars() {
        if c == '\'' {
            result.push_str(r"'\''");
        } else {
            result.push(c);
        }
    }
    result.push('\'');
    result
}

/// Encodes the string in the `$'...'` form.
fn dollar_single_quote(s: &str) -> String {
    let mut result = String::with_capacity(s.len().saturating_add(8));
    result.push_str("$'");
    for c in s.chars() {
        match c {
            '\\' => result.push_str(r"\\"),
            '\'' => result.push_str(r"\'"),
            '\x07' => result.push_str(r"\a"),
            '\x08' => result.push_str(r"\b"),
            '\t' => result.push_str(r"\t"),
            '\n' => result.push_str(r"\n"),
            '\x0B' => result.push_str(r"\v"),
            '\x0C' => result.push_str(r"\f"),
            '\r' => result.push_str(r"\r"),
            '\x1B' => result.push_str(r"\E"),
            c if c.is_control() => {
                result.push_str(&format!(r"\x{:02X}", c as u32));
            }
            c => result.push(c),
        }
    }
    result.push('\'');
    result
}

/// Returns true iff any character needs quoting.
fn str_needs_quoting(s: &str) -> bool {
    if s.chars().any(char_needs_quoting) {
        return true;
    }

    // `#` or `~` occurring at the beginning of the string
    matches!(s.chars().next(), Some('#' | '~'))
}

fn char_needs_quoting(c: char) -> bool {
    match c {
        ';' | '&' | '|' | '(' | ')' | '<' | '>' | ' ' | '\t' | '\n' => true,
        '$' | '`' | '\\' | '"' | '\'' | '=' | '*' | '?' => true,
        '[' | ']' | '{' | '}' | '!' | '^' => true,
        _ => c.is_whitespace() || c.is_control(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_quoting() {
        fn test(s: &str) {
            assert_eq!(quote(s), Borrowed(s));
        }
        test("a");
        test("foo");
        test("/usr/local/bin");
        test("foo.txt");
        test("a:b");
        test("x+y");
        test("10%");
    }

    #[test]
    fn empty_string() {
        assert_eq!(quote(""), Owned::<str>("''".to_owned()));
    }

    #[test]
    fn single_quoting() {
        fn test(s: &str, quoted: &str) {
            assert_eq!(quote(s), Owned::<str>(quoted.to_owned()));
        }
        test("a b", "'a b'");
        test("*", "'*'");
        test("foo?", "'foo?'");
        test("$PATH", "'$PATH'");
        test("`cmd`", "'`cmd`'");
        test(r"back\slash", r"'back\slash'");
        test("#comment", "'#comment'");
        test("~user", "'~user'");
        test("{a,b}", "'{a,b}'");
        test("[abc]", "'[abc]'");
    }

    #[test]
    fn splices_single_quotes() {
        assert_eq!(quote("a'b"), Owned::<str>(r"'a'\''b'".to_owned()));
        assert_eq!(quote("'"), Owned::<str>(r"''\'''".to_owned()));
    }

    #[test]
    fn dollar_quoting_for_control_characters() {
        fn test(s: &str, quoted: &str) {
            assert_eq!(quote(s), Owned::<str>(quoted.to_owned()));
        }
        test("a\nb", r"$'a\nb'");
        test("a\tb", r"$'a\tb'");
        test("bell\x07", r"$'bell\a'");
        test("\x1B[0m", r"$'\E[0m'");
        test("\x00", r"$'\x00'");
        test("a'\n", r"$'a\'\n'");
        test("back\\\n", r"$'back\\\n'");
    }

    #[test]
    fn quoted_form_has_no_raw_control_characters() {
        for s in ["\n", "a\rb", "\x1F", "mixed ' and \n"] {
            let quoted = quote(s);
            assert!(
                !quoted.chars().any(char::is_control),
                "{quoted:?} leaks a control character"
            );
        }
    }
}
