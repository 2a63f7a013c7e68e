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

//! Field splitting
//!
//! Field splitting divides a word into fields delimited by the characters of
//! `$IFS`. Every occurrence of a non-whitespace separator delimits a field
//! (which may be empty); runs of whitespace separators delimit fields
//! without producing empty ones, and leading and trailing whitespace is
//! ignored. A separator adjacent to the end of input does not produce a
//! final empty field.
//!
//! The functions here speak the backslash-escape protocol of the frame
//! evaluator: [`escape`] prefixes a backslash to every separator (and to
//! backslash itself), and [`split_for_word_eval`] treats `\c` as the literal
//! character `c`, removing one level of escaping while splitting. Globbing
//! later removes the remaining level.
//!
//! `$IFS` is read from the variable store at call time: unset means
//! space-tab-newline, and an empty value disables splitting entirely.

use marsh_env::variable::Value;
use marsh_env::Env;

const DEFAULT_IFS: &str = " \t\n";

/// Returns the current `$IFS` separator set.
fn ifs(env: &Env) -> &str {
    match env.variables.value_of("IFS") {
        Some(Value::Scalar(s)) => s.as_str(),
        Some(_) => DEFAULT_IFS,
        None => DEFAULT_IFS,
    }
}

/// Returns the string that joins array elements when an array decays to a
/// single string.
///
/// This is the first character of `$IFS`; a space when `$IFS` is unset, and
/// the empty string when `$IFS` is empty.
#[must_use]
pub fn join_char(env: &Env) -> String {
    match env.variables.value_of("IFS") {
        Some(Value::Scalar(s)) => s.chars().take(1).collect(),
        Some(_) => " ".to_string(),
        None => " ".to_string(),
    }
}

/// Escapes separators so that the string survives [`split_for_word_eval`]
/// as a single field.
///
/// Backslash itself is escaped too, so escaping commutes with the one level
/// of unescaping the splitter performs.
#[must_use]
pub fn escape(env: &Env, s: &str) -> String {
    let ifs = ifs(env);
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '\\' || ifs.contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Splits a word into fields.
///
/// `\c` sequences are taken as the literal character `c` and never act as
/// separators; the backslash is removed from the output.
#[must_use]
pub fn split_for_word_eval(env: &Env, s: &str) -> Vec<String> {
    let ifs = ifs(env);
    let is_ws_sep = |c: char| matches!(c, ' ' | '\t' | '\n') && ifs.contains(c);
    let is_other_sep = |c: char| !matches!(c, ' ' | '\t' | '\n') && ifs.contains(c);

    /// Splitter state between characters.
    #[derive(Clone, Copy, Eq, PartialEq)]
    enum State {
        /// At the start of input or just after a non-whitespace separator;
        /// another non-whitespace separator delimits an empty field.
        Sep,
        /// Just after whitespace that terminated a field; one
        /// non-whitespace separator is absorbed without delimiting a field.
        AfterWs,
        /// Inside a field.
        Field,
    }

    let mut fields = Vec::new();
    let mut current = String::new();
    let mut state = State::Sep;
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(escaped) => current.push(escaped),
                None => current.push('\\'),
            }
            state = State::Field;
        } else if is_other_sep(c) {
            match state {
                State::Field | State::Sep => fields.push(std::mem::take(&mut current)),
                State::AfterWs => {}
            }
            state = State::Sep;
        } else if is_ws_sep(c) {
            if state == State::Field {
                fields.push(std::mem::take(&mut current));
                state = State::AfterWs;
            }
        } else {
            current.push(c);
            state = State::Field;
        }
    }

    if state == State::Field {
        fields.push(current);
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use marsh_env::variable::Variable;

    fn env_with_ifs(ifs: &str) -> Env {
        let mut env = Env::new();
        env.variables.define("IFS", Variable::new(ifs));
        env
    }

    #[test]
    fn default_ifs_splits_on_whitespace_runs() {
        let env = Env::new();
        assert_eq!(split_for_word_eval(&env, "a b"), ["a", "b"]);
        assert_eq!(split_for_word_eval(&env, "  a \t b\n"), ["a", "b"]);
        assert_eq!(split_for_word_eval(&env, ""), Vec::<String>::new());
        assert_eq!(split_for_word_eval(&env, "   "), Vec::<String>::new());
    }

    #[test]
    fn non_whitespace_separator_delimits_empty_fields() {
        let env = env_with_ifs(",");
        assert_eq!(split_for_word_eval(&env, "a,,b"), ["a", "", "b"]);
        assert_eq!(split_for_word_eval(&env, ",a"), ["", "a"]);
        // A trailing separator terminates the last field; it does not start
        // an empty one.
        assert_eq!(split_for_word_eval(&env, "a,"), ["a"]);
        assert_eq!(split_for_word_eval(&env, ","), [""]);
    }

    #[test]
    fn whitespace_around_other_separators_is_absorbed() {
        let env = env_with_ifs(", ");
        assert_eq!(split_for_word_eval(&env, "a , b"), ["a", "b"]);
        assert_eq!(split_for_word_eval(&env, "a , , b"), ["a", "", "b"]);
        assert_eq!(split_for_word_eval(&env, " , "), [""]);
    }

    #[test]
    fn empty_ifs_disables_splitting() {
        let env = env_with_ifs("");
        assert_eq!(split_for_word_eval(&env, "a b"), ["a b"]);
    }

    #[test]
    fn backslash_escapes_separators() {
        let env = Env::new();
        assert_eq!(split_for_word_eval(&env, r"a\ b"), ["a b"]);
        assert_eq!(split_for_word_eval(&env, r"a\\ b"), [r"a\", "b"]);
        // A trailing lone backslash stays.
        assert_eq!(split_for_word_eval(&env, r"a\"), [r"a\"]);
    }

    #[test]
    fn escape_makes_a_string_survive_splitting() {
        let env = Env::new();
        for s in ["a b", " ", r"back\slash", "a\tb c"] {
            let escaped = escape(&env, s);
            assert_eq!(split_for_word_eval(&env, &escaped), [s], "{s:?}");
        }
    }

    #[test]
    fn join_char_follows_ifs() {
        assert_eq!(join_char(&Env::new()), " ");
        assert_eq!(join_char(&env_with_ifs(",")), ",");
        assert_eq!(join_char(&env_with_ifs(",:")), ",");
        assert_eq!(join_char(&env_with_ifs("")), "");
    }

    #[test]
    fn only_ifs_whitespace_collapses() {
        // A non-default whitespace setup: only space is a separator, so
        // tabs are ordinary characters.
        let env = env_with_ifs(" ");
        assert_eq!(split_for_word_eval(&env, "a\tb c"), ["a\tb", "c"]);
    }
}
