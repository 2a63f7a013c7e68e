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

//! This crate performs pattern matching based on a globbing pattern by
//! translating the pattern to a regular expression.
//!
//! The following syntax is supported:
//!
//! - Any single character (`?`)
//! - Any character sequence (`*`)
//! - Bracket expression (`[...]`)
//!     - Character literals
//!     - Character ranges (e.g. `a-z`)
//!     - Complement (`[!...]` or `[^...]`)
//!     - Character classes (`[:alpha:]`)
//! - With [`Config::extended`], the alternation groups `@(...)`, `?(...)`,
//!   `*(...)` and `+(...)`
//!
//! The `!(...)` group cannot be expressed as a plain regular expression and
//! is rejected with [`Error::UnsupportedExtGlob`]; callers typically degrade
//! to literal matching and report a warning.
//!
//! Input is a stream of [`PatternChar`]s so that the caller decides which
//! characters keep their special meaning: characters originating from quoted
//! source are passed as `Literal` and always match themselves. The
//! [`with_escape`] and [`without_escape`] adapters build such streams from
//! plain strings.

pub mod ast;

use regex::Regex;
use std::ops::Range;
use std::str::Chars;
use thiserror::Error;

/// Character appearing in patterns
///
/// The [`with_escape`] and [`without_escape`] functions return an iterator
/// that yields pattern characters.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PatternChar {
    /// Normal pattern character
    ///
    /// `?`, `*`, `[` and `]` have special meaning when used in a pattern.
    /// Other `Normal` characters are the same as `Literal`.
    Normal(char),

    /// Literal pattern character
    ///
    /// A literal character always matches itself. `?`, `*`, `[` and `]` lose
    /// special meaning when regarded literal.
    Literal(char),
}

impl PatternChar {
    /// Returns the character value.
    #[inline]
    #[must_use]
    pub const fn char_value(self) -> char {
        match self {
            PatternChar::Normal(c) => c,
            PatternChar::Literal(c) => c,
        }
    }
}

/// Iterator returned by [`with_escape`]
#[derive(Clone, Debug)]
pub struct WithEscape<'a> {
    chars: Chars<'a>,
}

impl Iterator for WithEscape<'_> {
    type Item = PatternChar;
    fn next(&mut self) -> Option<PatternChar> {
        match self.chars.next() {
            None => None,
            Some('\\') => self.chars.next().map(PatternChar::Literal),
            Some(c) => Some(PatternChar::Normal(c)),
        }
    }
}

/// Adapts an escaped string for input to a parser.
///
/// Backslashes in the string act as escape characters: the escaped character
/// is yielded as [`PatternChar::Literal`].
#[must_use]
pub fn with_escape(pattern: &str) -> WithEscape {
    let chars = pattern.chars();
    WithEscape { chars }
}

/// Iterator returned by [`without_escape`]
#[derive(Clone, Debug)]
pub struct WithoutEscape<'a> {
    chars: Chars<'a>,
}

impl Iterator for WithoutEscape<'_> {
    type Item = PatternChar;
    fn next(&mut self) -> Option<PatternChar> {
        self.chars.next().map(PatternChar::Normal)
    }
}

/// Adapts a literal string for input to a parser.
///
/// Backslashes in the string do not act as escape characters.
#[must_use]
pub fn without_escape(pattern: &str) -> WithoutEscape {
    let chars = pattern.chars();
    WithoutEscape { chars }
}

/// Configuration for pattern parsing and matching
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub struct Config {
    /// Whether the pattern must match at the beginning of the subject.
    pub anchor_begin: bool,
    /// Whether the pattern must match at the end of the subject.
    pub anchor_end: bool,
    /// Whether the `@( ?( *( +(` alternation groups are recognized.
    pub extended: bool,
}

/// Error that may occur while parsing a pattern
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    /// The `!(...)` group was used, which cannot be translated to a plain
    /// regular expression.
    #[error("the !(...) pattern group is not supported")]
    UnsupportedExtGlob,

    /// A `@( ?( *( +(` group was not closed by `)`.
    #[error("unterminated pattern group")]
    UnterminatedGroup,

    /// The translated regular expression failed to compile.
    #[error("broken pattern translation: {0}")]
    InvalidRegex(String),
}

/// Compiled globbing pattern
#[derive(Clone, Debug)]
pub struct Pattern {
    regex: Regex,
    regex_str: String,
    literal: Option<String>,
    warnings: Vec<String>,
}

impl Pattern {
    /// Parses a pattern with the default configuration.
    #[inline]
    pub fn parse<I>(pattern: I) -> Result<Pattern, Error>
    where
        I: IntoIterator<Item = PatternChar>,
    {
        Pattern::parse_with_config(pattern, Config::default())
    }

    /// Parses a pattern with the given configuration.
    pub fn parse_with_config<I>(pattern: I, config: Config) -> Result<Pattern, Error>
    where
        I: IntoIterator<Item = PatternChar>,
    {
        let chars: Vec<PatternChar> = pattern.into_iter().collect();
        let (atoms, warnings) = ast::parse(&chars, config)?;
        let literal = ast::to_literal(&atoms);
        let regex_str = ast::to_regex(&atoms, config);
        let regex = Regex::new(&regex_str).map_err(|e| Error::InvalidRegex(e.to_string()))?;
        Ok(Pattern {
            regex,
            regex_str,
            literal,
            warnings,
        })
    }

    /// Tests whether this pattern matches the given string.
    #[must_use]
    pub fn is_match(&self, subject: &str) -> bool {
        self.regex.is_match(subject)
    }

    /// Returns the byte range of the leftmost match in the given string.
    #[must_use]
    pub fn find(&self, subject: &str) -> Option<Range<usize>> {
        self.regex.find(subject).map(|m| m.range())
    }

    /// Returns the plain string this pattern matches, if the pattern has no
    /// special elements at all.
    ///
    /// Callers use this to skip directory scanning for literal pathname
    /// components.
    #[must_use]
    pub fn as_literal(&self) -> Option<&str> {
        self.literal.as_deref()
    }

    /// Returns the regular expression this pattern was translated to.
    #[must_use]
    pub fn as_regex_str(&self) -> &str {
        &self.regex_str
    }

    /// Returns the warnings collected while parsing.
    ///
    /// A warning means part of the pattern was translated approximately
    /// (for example, a malformed bracket expression taken literally).
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(pattern: &str) -> Pattern {
        Pattern::parse(without_escape(pattern)).unwrap()
    }

    fn parse_anchored(pattern: &str) -> Pattern {
        let config = Config {
            anchor_begin: true,
            anchor_end: true,
            ..Config::default()
        };
        Pattern::parse_with_config(without_escape(pattern), config).unwrap()
    }

    #[test]
    fn literal_pattern() {
        let p = parse_anchored("abc");
        assert_eq!(p.as_literal(), Some("abc"));
        assert!(p.is_match("abc"));
        assert!(!p.is_match("abd"));
        assert!(!p.is_match("xabc"));
    }

    #[test]
    fn any_char_and_any_string() {
        let p = parse_anchored("a?c");
        assert_eq!(p.as_literal(), None);
        assert!(p.is_match("abc"));
        assert!(p.is_match("a.c"));
        assert!(!p.is_match("ac"));
        assert!(!p.is_match("abbc"));

        let p = parse_anchored("a*c");
        assert!(p.is_match("ac"));
        assert!(p.is_match("abbbc"));
        assert!(!p.is_match("ab"));
    }

    #[test]
    fn question_mark_matches_newline() {
        let p = parse_anchored("a?c");
        assert!(p.is_match("a\nc"));
    }

    #[test]
    fn regex_metacharacters_are_not_special() {
        let p = parse_anchored("a.c+");
        assert!(p.is_match("a.c+"));
        assert!(!p.is_match("abc"));
        assert!(!p.is_match("a.ccc"));
    }

    #[test]
    fn escaped_chars_lose_special_meaning() {
        let p = Pattern::parse(with_escape(r"a\*c")).unwrap();
        assert_eq!(p.as_literal(), Some("a*c"));
        let config = Config {
            anchor_begin: true,
            anchor_end: true,
            ..Config::default()
        };
        let p = Pattern::parse_with_config(with_escape(r"a\*c"), config).unwrap();
        assert!(p.is_match("a*c"));
        assert!(!p.is_match("abc"));
    }

    #[test]
    fn bracket_expression() {
        let p = parse_anchored("[abc]");
        assert!(p.is_match("a"));
        assert!(p.is_match("c"));
        assert!(!p.is_match("d"));
        assert!(!p.is_match("ab"));
    }

    #[test]
    fn bracket_range() {
        let p = parse_anchored("[a-cx]");
        assert!(p.is_match("b"));
        assert!(p.is_match("x"));
        assert!(!p.is_match("d"));
    }

    #[test]
    fn bracket_complement() {
        let p = parse_anchored("[!a-c]");
        assert!(!p.is_match("b"));
        assert!(p.is_match("d"));

        let p = parse_anchored("[^a-c]");
        assert!(p.is_match("d"));
    }

    #[test]
    fn bracket_leading_rbracket_is_literal() {
        let p = parse_anchored("[]x]");
        assert!(p.is_match("]"));
        assert!(p.is_match("x"));
        assert!(!p.is_match("a"));
    }

    #[test]
    fn bracket_trailing_hyphen_is_literal() {
        let p = parse_anchored("[a-]");
        assert!(p.is_match("a"));
        assert!(p.is_match("-"));
        assert!(!p.is_match("b"));
    }

    #[test]
    fn bracket_character_class() {
        let p = parse_anchored("[[:digit:]x]");
        assert!(p.is_match("5"));
        assert!(p.is_match("x"));
        assert!(!p.is_match("a"));
    }

    #[test]
    fn unterminated_bracket_is_literal() {
        let p = parse_anchored("a[b");
        assert!(p.is_match("a[b"));
        assert!(!p.is_match("ab"));
        assert!(!p.warnings().is_empty());
    }

    #[test]
    fn unanchored_find() {
        let p = parse("b*d");
        assert_eq!(p.find("abcde"), Some(1..4));
        assert_eq!(p.find("xyz"), None);
    }

    #[test]
    fn extended_groups() {
        let config = Config {
            anchor_begin: true,
            anchor_end: true,
            extended: true,
        };
        let p = Pattern::parse_with_config(without_escape("@(foo|bar)"), config).unwrap();
        assert!(p.is_match("foo"));
        assert!(p.is_match("bar"));
        assert!(!p.is_match("foobar"));

        let p = Pattern::parse_with_config(without_escape("a*(bc)"), config).unwrap();
        assert!(p.is_match("a"));
        assert!(p.is_match("abcbc"));
        assert!(!p.is_match("ab"));

        let p = Pattern::parse_with_config(without_escape("+([0-9])"), config).unwrap();
        assert!(p.is_match("42"));
        assert!(!p.is_match(""));

        let p = Pattern::parse_with_config(without_escape("a?(x)"), config).unwrap();
        assert!(p.is_match("a"));
        assert!(p.is_match("ax"));
        assert!(!p.is_match("axx"));
    }

    #[test]
    fn extended_groups_off_by_default() {
        let p = parse_anchored("@(foo|bar)");
        assert!(p.is_match("@(foo|bar)"));
        assert!(!p.is_match("foo"));
    }

    #[test]
    fn negative_group_is_rejected() {
        let config = Config {
            extended: true,
            ..Config::default()
        };
        let e = Pattern::parse_with_config(without_escape("!(foo)"), config).unwrap_err();
        assert_eq!(e, Error::UnsupportedExtGlob);
    }

    #[test]
    fn unterminated_group_is_rejected() {
        let config = Config {
            extended: true,
            ..Config::default()
        };
        let e = Pattern::parse_with_config(without_escape("@(foo"), config).unwrap_err();
        assert_eq!(e, Error::UnterminatedGroup);
    }
}
