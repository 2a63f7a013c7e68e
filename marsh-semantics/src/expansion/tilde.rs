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

//! Tilde expansion
//!
//! A bare `~` expands to the `HOME` variable and falls back to the user
//! database; `~user` always consults the user database. A failing lookup
//! expands to the token text itself unless the `strict_tilde` option makes
//! it an error.

use super::{Error, ErrorCause, Result};
use marsh_env::option::Option::StrictTilde;
use marsh_env::variable::Value;
use marsh_env::Env;
use marsh_syntax::syntax::Token;

/// Expands `~` or `~user`.
pub fn eval(env: &Env, token: &Token) -> Result<String> {
    let result = if token.text == "~" {
        // The HOME variable wins over the user database.
        if let Some(Value::Scalar(home)) = env.variables.value_of("HOME") {
            return Ok(home.clone());
        }
        env.user_lookup.my_home_dir()
    } else {
        env.user_lookup.home_dir(&token.text[1..])
    };

    match result {
        Some(home) => Ok(home),
        None => {
            if env.options.is_on(StrictTilde) {
                Err(Error {
                    cause: ErrorCause::TildeFailed(token.text.clone()),
                    location: token.location.clone(),
                })
            } else {
                Ok(token.text.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use marsh_env::option::State::On;
    use marsh_env::system::VirtualUserLookup;
    use marsh_env::variable::Variable;
    use marsh_syntax::id::Id;

    fn env() -> Env {
        let mut lookup = VirtualUserLookup {
            my_home: Some("/home/me".to_string()),
            ..Default::default()
        };
        lookup
            .homes
            .insert("alice".to_string(), "/home/alice".to_string());
        Env::with_user_lookup(Box::new(lookup))
    }

    fn tilde(text: &str) -> Token {
        Token::dummy(Id::LitTilde, text)
    }

    #[test]
    fn bare_tilde_uses_home_variable_first() {
        let mut env = env();
        env.variables.define("HOME", Variable::new("/somewhere/else"));
        assert_eq!(eval(&env, &tilde("~")).unwrap(), "/somewhere/else");
    }

    #[test]
    fn bare_tilde_falls_back_to_user_database() {
        let env = env();
        assert_eq!(eval(&env, &tilde("~")).unwrap(), "/home/me");
    }

    #[test]
    fn named_user_ignores_home_variable() {
        let mut env = env();
        env.variables.define("HOME", Variable::new("/somewhere/else"));
        assert_eq!(eval(&env, &tilde("~alice")).unwrap(), "/home/alice");
    }

    #[test]
    fn unknown_user_expands_to_itself() {
        let env = env();
        assert_eq!(eval(&env, &tilde("~nobody")).unwrap(), "~nobody");
    }

    #[test]
    fn unknown_user_is_fatal_under_strict_tilde() {
        let mut env = env();
        env.options.set(StrictTilde, On);
        let e = eval(&env, &tilde("~nobody")).unwrap_err();
        assert_matches!(e.cause, ErrorCause::TildeFailed(name) if name == "~nobody");
    }
}
