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

//! Pathname expansion
//!
//! Pathname expansion scans directories and produces pathnames matching the
//! input pattern. The input is split by `/`, and each component is matched
//! separately: components with only literal characters extend the candidate
//! path without a directory scan, and components with `?`, `*`, or a
//! bracket expression scan the directory accumulated so far. Read errors
//! are silently ignored.
//!
//! Results are sorted. If scanning produces no pathnames, the input is
//! returned intact (with escapes removed), as is a pattern disabled by the
//! `noglob` option.
//!
//! Patterns arrive here in backslash-escaped form: `\c` always stands for
//! the literal character `c`. A name starting with a period is only matched
//! by a component whose pattern starts with a literal period.

use marsh_env::option::Option::{ExtGlob, NoGlob};
use marsh_env::Env;
use marsh_fnmatch::{with_escape, Config, Pattern};
use marsh_syntax::syntax::Word;

/// Escapes glob metacharacters (and backslash) so the string matches
/// literally.
#[must_use]
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '*' | '?' | '[' | ']') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Removes one level of backslash escaping.
#[must_use]
pub fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(escaped) => out.push(escaped),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Whether the escaped string contains an unescaped glob metacharacter.
///
/// The `@( +( !(` group openers count as well; whether they actually group
/// is decided later by the `extglob` option.
#[must_use]
pub fn looks_like_glob(s: &str) -> bool {
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '*' | '?' | '[' => return true,
            '@' | '+' | '!' if chars.peek() == Some(&'(') => return true,
            _ => {}
        }
    }
    false
}

/// Whether the word is a static glob: a single unquoted literal containing
/// a glob metacharacter.
///
/// Static globs are the only words expanded by the globber when the
/// `simple_word_eval` option is on.
#[must_use]
pub fn looks_like_static_glob(word: &Word) -> bool {
    match word.as_literal() {
        Some(token) => looks_like_glob(&token.text),
        None => false,
    }
}

/// Translates an escaped glob pattern to an extended regular expression.
///
/// Returns the regex source and any warnings about constructs that were
/// translated approximately.
pub fn glob_to_ere(pat: &str) -> Result<(String, Vec<String>), marsh_fnmatch::Error> {
    let pattern = Pattern::parse(with_escape(pat))?;
    let regex = pattern.as_regex_str().to_string();
    let warnings = pattern.warnings().to_vec();
    Ok((regex, warnings))
}

/// Expands an escaped pattern into zero or more pathnames, appending them
/// to `out`. Returns the number of entries appended.
///
/// When the pattern has no unescaped metacharacters, when `noglob` is on,
/// or when nothing matches, the unescaped pattern itself is appended.
pub fn expand(env: &Env, pat: &str, out: &mut Vec<String>) -> usize {
    if env.options.is_on(NoGlob) || !looks_like_glob(pat) {
        out.push(unescape(pat));
        return 1;
    }

    let mut results = Vec::new();
    let mut search = Search {
        env,
        prefix: String::new(),
        results: &mut results,
    };
    search.search_dir(pat);

    if results.is_empty() {
        out.push(unescape(pat));
        1
    } else {
        results.sort_unstable();
        let count = results.len();
        out.append(&mut results);
        count
    }
}

struct Search<'a> {
    env: &'a Env,
    prefix: String,
    results: &'a mut Vec<String>,
}

impl Search<'_> {
    /// Recursively searches directories for pathnames matching the
    /// remaining suffix of the pattern.
    fn search_dir(&mut self, suffix: &str) {
        let (this, rest) = match suffix.find('/') {
            None => (suffix, None),
            Some(index) => (&suffix[..index], Some(&suffix[index + 1..])),
        };

        if !looks_like_glob(this) {
            let literal = unescape(this);
            self.push_component(&literal, rest);
            return;
        }

        let mut config = Config::default();
        config.anchor_begin = true;
        config.anchor_end = true;
        config.extended = self.env.options.is_on(ExtGlob);
        let pattern = match Pattern::parse_with_config(with_escape(this), config) {
            Ok(pattern) => pattern,
            // A component that cannot be parsed matches only itself.
            Err(_) => {
                let literal = unescape(this);
                self.push_component(&literal, rest);
                return;
            }
        };
        let matches_leading_period =
            matches!(with_escape(this).next(), Some(c) if c.char_value() == '.');

        let dir = if self.prefix.is_empty() {
            "."
        } else {
            self.prefix.as_str()
        };
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name.starts_with('.') && !matches_leading_period {
                continue;
            }
            if pattern.is_match(&name) {
                self.push_component(&name, rest);
            }
        }
    }

    /// Appends one pathname component to the candidate prefix and continues
    /// with the rest of the pattern, or records the result if the pattern
    /// is exhausted.
    fn push_component(&mut self, component: &str, rest: Option<&str>) {
        let old_len = self.prefix.len();
        self.prefix.push_str(component);

        match rest {
            None => {
                if !self.prefix.is_empty()
                    && std::fs::symlink_metadata(&self.prefix).is_ok()
                {
                    self.results.push(self.prefix.clone());
                }
            }
            Some(rest) => {
                self.prefix.push('/');
                self.search_dir(rest);
            }
        }

        self.prefix.truncate(old_len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marsh_env::option::State::On;
    use marsh_syntax::id::Id;
    use marsh_syntax::syntax::{Token, WordPart};

    #[test]
    fn escape_and_unescape_round_trip() {
        for s in ["plain", "a*b", "?x[y]", r"back\slash", ""] {
            assert_eq!(unescape(&escape(s)), s, "{s:?}");
        }
        assert_eq!(escape("a*"), r"a\*");
        assert_eq!(unescape(r"a\*"), "a*");
    }

    #[test]
    fn glob_detection_honors_escapes() {
        assert!(looks_like_glob("*.txt"));
        assert!(looks_like_glob("a?b"));
        assert!(looks_like_glob("[ab]"));
        assert!(looks_like_glob("@(a|b)"));
        assert!(looks_like_glob("+(x)"));
        assert!(!looks_like_glob("plain"));
        assert!(!looks_like_glob("a@b"));
        assert!(!looks_like_glob(r"\*"));
        assert!(!looks_like_glob(r"a\[b"));
    }

    #[test]
    fn static_glob_detection() {
        let word = Word::from_parts(vec![WordPart::Literal(Token::dummy(
            Id::LitChars,
            "*.rs",
        ))]);
        assert!(looks_like_static_glob(&word));

        let word = Word::from_parts(vec![WordPart::Literal(Token::dummy(
            Id::LitChars,
            "main.rs",
        ))]);
        assert!(!looks_like_static_glob(&word));

        let word = Word::from_parts(vec![
            WordPart::Literal(Token::dummy(Id::LitChars, "*")),
            WordPart::SingleQuoted {
                text: ".rs".to_string(),
                location: marsh_syntax::source::Location::dummy("'.rs'"),
            },
        ]);
        assert!(!looks_like_static_glob(&word));
    }

    #[test]
    fn glob_to_ere_translation() {
        let (regex, warnings) = glob_to_ere("a*.txt").unwrap();
        assert_eq!(regex, r"(?s)a.*\.txt");
        assert_eq!(warnings, Vec::<String>::new());

        let (regex, _) = glob_to_ere(r"a\*b").unwrap();
        assert_eq!(regex, r"(?s)a\*b");

        let (_, warnings) = glob_to_ere("a[b").unwrap();
        assert!(!warnings.is_empty());
    }

    #[test]
    fn noglob_returns_pattern_unescaped() {
        let mut env = Env::new();
        env.options.set(NoGlob, On);
        let mut out = Vec::new();
        let n = expand(&env, r"*.\?", &mut out);
        assert_eq!(n, 1);
        assert_eq!(out, ["*.?"]);
    }

    #[test]
    fn literal_pattern_is_returned_intact() {
        let env = Env::new();
        let mut out = Vec::new();
        expand(&env, r"no\ such\ file", &mut out);
        assert_eq!(out, ["no such file"]);
    }

    #[test]
    fn expansion_in_a_real_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path();
        for name in ["foo.exe", "foo.txt", "bar.txt", ".hidden.txt"] {
            std::fs::write(path.join(name), "").unwrap();
        }

        let env = Env::new();
        let base = path.to_str().unwrap();

        let mut out = Vec::new();
        let n = expand(&env, &format!("{}/*.txt", escape(base)), &mut out);
        assert_eq!(n, 2);
        assert_eq!(
            out,
            [format!("{base}/bar.txt"), format!("{base}/foo.txt")]
        );

        // Dotfiles require an explicit leading period.
        let mut out = Vec::new();
        expand(&env, &format!("{}/.*.txt", escape(base)), &mut out);
        assert_eq!(out, [format!("{base}/.hidden.txt")]);

        // No match falls back to the unescaped pattern.
        let mut out = Vec::new();
        let n = expand(&env, &format!("{}/*.rs", escape(base)), &mut out);
        assert_eq!(n, 1);
        assert_eq!(out, [format!("{base}/*.rs")]);
    }

    #[test]
    fn multi_component_patterns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path();
        std::fs::create_dir_all(path.join("a/x")).unwrap();
        std::fs::create_dir_all(path.join("b/x")).unwrap();
        std::fs::write(path.join("a/x/f"), "").unwrap();
        std::fs::write(path.join("b/x/f"), "").unwrap();
        std::fs::write(path.join("b/x/g"), "").unwrap();

        let env = Env::new();
        let base = path.to_str().unwrap();
        let mut out = Vec::new();
        let n = expand(&env, &format!("{}/?/x/f", escape(base)), &mut out);
        assert_eq!(n, 2);
        assert_eq!(out, [format!("{base}/a/x/f"), format!("{base}/b/x/f")]);
    }
}
