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

//! Parameter value lookup
//!
//! Fetching the base value of a parameter expansion: named variables,
//! positional parameters, and the special parameters. `$@` and `$*` carry
//! an extra bit, `maybe_decay_array`: whether the resulting array joins
//! into a single string after the suffix operators have been applied.
//! `"$@"` keeps the array, unquoted `$@` decays, and `$*` decays either
//! way.

use super::part::value_to_part_value;
use super::split;
use super::{Error, ErrorCause, PartValue, Result};
use marsh_env::option::Option::{CompatArray, NoUnset};
use marsh_env::variable::Value;
use marsh_syntax::id::Id;
use marsh_syntax::syntax::Token;

/// Variables that may be used both as scalars and as arrays, for bash
/// compatibility.
const STRING_AND_ARRAY: &[&str] = &["BASH_SOURCE", "FUNCNAME", "BASH_LINENO"];

impl super::WordEvaluator<'_> {
    /// Whether an array value of the named variable silently decays to its
    /// first element instead of being a fatal scalar misuse.
    pub(super) fn check_compat_array(&self, var_name: &str, is_plain_var_sub: bool) -> bool {
        self.env.options.is_on(CompatArray)
            || is_plain_var_sub && STRING_AND_ARRAY.contains(&var_name)
    }

    /// Fetches the value of a positional parameter, `None` when there are
    /// not enough parameters.
    pub(super) fn eval_var_num(&self, var_num: usize) -> Option<Value> {
        self.env.get_arg(var_num).map(Value::scalar)
    }

    /// Fetches the value of a special parameter.
    ///
    /// Returns the value and the `maybe_decay_array` bit.
    pub(super) fn eval_special_var(&mut self, id: Id, quoted: bool) -> (Option<Value>, bool) {
        let mut maybe_decay_array = false;
        let value = match id {
            Id::VSubAt | Id::VSubStar => {
                maybe_decay_array = if id == Id::VSubAt {
                    // "$@" stays an array; bare $@ splits like any other
                    // unquoted expansion.
                    !quoted
                } else {
                    // $* and "$*" both join.
                    true
                };
                Value::array(self.env.positional_params.clone())
            }
            Id::VSubPound => Value::scalar(self.env.positional_params.len().to_string()),
            Id::VSubQMark => Value::scalar(self.env.exit_status.to_string()),
            Id::VSubHyphen => Value::scalar(self.env.options.dollar_hyphen()),
            Id::VSubDollar => Value::scalar(self.env.shell_pid.to_string()),
            Id::VSubBang => Value::scalar(self.env.last_async_pid.to_string()),
            _ => unreachable!("not a special parameter: {id:?}"),
        };
        (Some(value), maybe_decay_array)
    }

    /// Replaces an unset value with an empty string, or raises under
    /// `nounset`.
    pub(super) fn empty_str_or_error(&self, value: Option<Value>, token: &Token) -> Result<Value> {
        match value {
            Some(value) => Ok(value),
            None => {
                if self.env.options.is_on(NoUnset) {
                    Err(Error {
                        cause: ErrorCause::UndefinedVariable(token.text.clone()),
                        location: token.location.clone(),
                    })
                } else {
                    Ok(Value::scalar(""))
                }
            }
        }
    }

    /// Replaces an unset array with an empty one, or raises under
    /// `nounset`.
    pub(super) fn empty_array_or_error(&self, token: &Token) -> Result<Value> {
        if self.env.options.is_on(NoUnset) {
            Err(Error {
                cause: ErrorCause::UndefinedArray(token.text.clone()),
                location: token.location.clone(),
            })
        } else {
            Ok(Value::Array(Vec::new()))
        }
    }

    /// Joins an array value into a scalar using the splitter's join
    /// character, skipping unassigned entries.
    pub(super) fn decay_array(&self, items: &[Option<String>]) -> Value {
        let sep = split::join_char(self.env);
        let kept: Vec<&str> = items.iter().flatten().map(String::as_str).collect();
        Value::Scalar(kept.join(&sep))
    }

    /// Evaluates `$name`, `$0`-`$9`, and the special parameters.
    pub(super) fn eval_simple_var_sub(
        &mut self,
        token: &Token,
        part_vals: &mut Vec<PartValue>,
        quoted: bool,
    ) -> Result<()> {
        let mut maybe_decay_array = false;

        let value = match token.id {
            Id::VSubDollarName | Id::VSubName => {
                let var_name = &token.text;
                let value = self.env.variables.value_of(var_name).cloned();
                match value {
                    Some(Value::Array(_) | Value::Assoc(_)) => {
                        if self.check_compat_array(var_name, true) {
                            resolve_compat_array(value.unwrap())
                        } else {
                            return Err(Error {
                                cause: ErrorCause::ArrayAsScalar(var_name.clone()),
                                location: token.location.clone(),
                            });
                        }
                    }
                    value => value,
                }
            }
            Id::VSubNumber => {
                let var_num: usize = token.text.parse().unwrap_or(usize::MAX);
                self.eval_var_num(var_num)
            }
            id => {
                let (value, decay) = self.eval_special_var(id, quoted);
                maybe_decay_array = decay;
                value
            }
        };

        let mut value = self.empty_str_or_error(value, token)?;
        if maybe_decay_array {
            if let Value::Array(items) = &value {
                value = self.decay_array(items);
            }
        }

        part_vals.push(value_to_part_value(Some(value), quoted));
        Ok(())
    }
}

/// Decays `${array}` to `${array[0]}`.
pub(super) fn resolve_compat_array(value: Value) -> Option<Value> {
    let first = match value {
        Value::Array(items) => items.into_iter().next().flatten(),
        Value::Assoc(entries) => entries.get("0").cloned(),
        Value::Scalar(_) => unreachable!("only arrays decay"),
    };
    first.map(Value::Scalar)
}
