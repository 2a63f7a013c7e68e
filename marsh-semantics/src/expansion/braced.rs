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

//! Braced parameter expansion
//!
//! `${...}` combines four layers of operators, applied in a fixed order:
//!
//! 1. The bracket op turns the fetched value into a scalar or keeps it an
//!    array, and decides whether the result joins afterwards.
//! 2. The prefix ops: length and indirection.
//! 3. The suffix op: test/default family, trim and case ops, pattern
//!    substitution, slice, or a nullary formatter. Prefix and suffix never
//!    both apply except with indirection.
//! 4. Arrays marked for decay join into one string.
//!
//! `${!prefix@}` and `${!prefix*}` look at variable *names* and are handled
//! before anything is fetched.

use super::part::value_to_part_value;
use super::split;
use super::{AIndex, Error, ErrorCause, PartValue, Result};
use marsh_env::variable::Value;
use marsh_syntax::id::{Id, Kind};
use marsh_syntax::syntax::{BracedParam, BracketOp, PrefixOp, SuffixOp, Token};

/// Looks up an array entry, counting negative indices from the end.
///
/// Returns `None` both for out-of-range indices and for holes.
pub(super) fn get_array_item(items: &[Option<String>], index: i64) -> Option<String> {
    let n = items.len() as i64;
    let index = if index < 0 { index + n } else { index };
    if (0..n).contains(&index) {
        items[index as usize].clone()
    } else {
        None
    }
}

impl super::WordEvaluator<'_> {
    /// Evaluates a `${...}` into part values.
    pub(super) fn eval_braced_var_sub(
        &mut self,
        part: &BracedParam,
        part_vals: &mut Vec<PartValue>,
        quoted: bool,
    ) -> Result<()> {
        let mut maybe_decay_array = false;
        let mut var_name: Option<String> = None;
        let mut var_index: Option<AIndex> = None;

        // 1. Evaluate from (name | number | special) to a value.
        let mut value: Option<Value>;
        match part.token.id {
            Id::VSubName => {
                // ${!prefix@} looks at names, not values. ${!a[@]@a} does
                // not belong here because it has a bracket op.
                if part.prefix_op == Some(PrefixOp::Indirect) && part.bracket_op.is_none() {
                    if let Some(SuffixOp::Nullary(op)) = &part.suffix_op {
                        if op.id.kind() == Kind::VOp3 {
                            self.eval_prefixed_names(&part.token.text, op.id, quoted, part_vals);
                            return Ok(());
                        }
                    }
                }
                var_name = Some(part.token.text.clone());
                value = self.env.variables.value_of(&part.token.text).cloned();
            }
            Id::VSubNumber => {
                let var_num = part.token.text.parse().unwrap_or(usize::MAX);
                value = self.eval_var_num(var_num);
            }
            id => {
                let (fetched, decay) = self.eval_special_var(id, quoted);
                value = fetched;
                maybe_decay_array = decay;
            }
        }

        // 2. Bracket op. The decay bit set here takes effect only after
        // the suffix ops have been applied.
        match &part.bracket_op {
            Some(BracketOp::WholeArray(op_id)) => {
                let (indexed, decay) = self.whole_array(value, *op_id, part, quoted)?;
                value = indexed;
                maybe_decay_array = decay;
            }
            Some(BracketOp::ArrayIndex(expr)) => {
                let (indexed, index) = self.array_index(value, expr, part)?;
                value = indexed;
                var_index = index;
            }
            None => {
                let is_array = matches!(&value, Some(Value::Array(_) | Value::Assoc(_)));
                if is_array {
                    if let Some(name) = &var_name {
                        let is_plain = part.prefix_op.is_none() && part.suffix_op.is_none();
                        if self.check_compat_array(name, is_plain) {
                            value = super::param::resolve_compat_array(value.unwrap());
                        } else {
                            // ${array@a} and the test operators observe the
                            // array; everything else is a scalar misuse.
                            let allowed = match &part.suffix_op {
                                Some(SuffixOp::Nullary(op)) => op.id == Id::VOp0A,
                                Some(SuffixOp::Unary { op, .. }) => op.id.kind() == Kind::VTest,
                                _ => false,
                            };
                            if !allowed {
                                return Err(Error {
                                    cause: ErrorCause::ArrayAsScalar(name.clone()),
                                    location: part.location.clone(),
                                });
                            }
                        }
                    }
                }
            }
        }

        // 3. The unset check, up front, EXCEPT for the test operators,
        // which must observe the unset value themselves.
        let undef_check = !matches!(
            &part.suffix_op,
            Some(SuffixOp::Unary { op, .. }) if op.id.kind() == Kind::VTest
        );
        if undef_check {
            value = Some(self.empty_str_or_error(value, &part.token)?);
        }

        match part.prefix_op {
            Some(PrefixOp::Length) => value = Some(apply_length_op(value.as_ref())),
            Some(PrefixOp::Indirect) => value = self.apply_indirect_op(value, &part.token)?,
            None => {}
        }

        // 4. Suffix op.
        let mut quoted2 = false;
        match &part.suffix_op {
            None => {}
            Some(SuffixOp::Nullary(op)) => {
                if op.id.kind() == Kind::VOp0 {
                    let (formatted, quoted_by_op) =
                        self.apply_nullary_op(value, op, var_name.as_deref())?;
                    value = Some(formatted);
                    quoted2 = quoted_by_op;
                } else {
                    return Err(Error {
                        cause: ErrorCause::UnknownFormatter(op.text.clone()),
                        location: op.location.clone(),
                    });
                }
            }
            Some(SuffixOp::Unary { op, arg }) => {
                if op.id.kind() == Kind::VTest {
                    if self.apply_test_op(
                        &value,
                        op,
                        arg,
                        quoted,
                        part_vals,
                        var_name.as_deref(),
                        var_index.as_ref(),
                        &part.token,
                    )? {
                        // The operator already appended the substituted
                        // part values.
                        return Ok(());
                    }
                } else {
                    value = Some(self.apply_unary_suffix_op(value, op, arg)?);
                }
            }
            Some(SuffixOp::PatSub {
                pat,
                replace,
                mode,
                location,
            }) => {
                value = Some(self.apply_pat_sub(value, pat, replace.as_ref(), *mode, location)?);
            }
            Some(SuffixOp::Slice {
                begin,
                length,
                location,
            }) => {
                value = Some(self.apply_slice(
                    value,
                    begin.as_deref(),
                    length.as_deref(),
                    var_name.as_deref(),
                    location,
                )?);
            }
        }

        // 5. Arrays marked for joining decay here.
        if maybe_decay_array {
            if let Some(Value::Array(items)) = &value {
                value = Some(self.decay_array(items));
            }
        }

        part_vals.push(value_to_part_value(value, quoted || quoted2));
        Ok(())
    }

    /// `${!prefix@}` / `${!prefix*}`: the sorted names of all variables
    /// starting with the prefix.
    fn eval_prefixed_names(
        &mut self,
        prefix: &str,
        op_id: Id,
        quoted: bool,
        part_vals: &mut Vec<PartValue>,
    ) {
        let mut names = self.env.variables.names_with_prefix(prefix);
        names.sort();
        if quoted && op_id == Id::VOp3At {
            part_vals.push(PartValue::Array(names.into_iter().map(Some).collect()));
        } else {
            let sep = split::join_char(self.env);
            part_vals.push(PartValue::string(names.join(&sep), quoted, true));
        }
    }

    /// `[@]` or `[*]` on a fetched value.
    fn whole_array(
        &mut self,
        value: Option<Value>,
        op_id: Id,
        part: &BracedParam,
        quoted: bool,
    ) -> Result<(Option<Value>, bool)> {
        let star = op_id == Id::ArithStar;
        // ${a[@]} decays but "${a[@]}" doesn't; ${a[*]} and "${a[*]}" both
        // decay.
        let maybe_decay_array = star || !quoted;
        let value = match value {
            None => Some(self.empty_array_or_error(&part.token)?),
            Some(Value::Scalar(_)) => {
                return Err(Error {
                    cause: ErrorCause::WholeArrayOnScalar {
                        name: part.token.text.clone(),
                        op: if star { '*' } else { '@' },
                    },
                    location: part.location.clone(),
                });
            }
            keep => keep,
        };
        Ok((value, maybe_decay_array))
    }

    /// `[expr]` on a fetched value. Returns the selected element and the
    /// subscript for a potential write-back by `${v[i]:=default}`.
    fn array_index(
        &mut self,
        value: Option<Value>,
        expr: &str,
        part: &BracedParam,
    ) -> Result<(Option<Value>, Option<AIndex>)> {
        match value {
            // Unset is checked later.
            None => Ok((None, None)),
            Some(Value::Scalar(_)) => Err(Error {
                cause: ErrorCause::IndexOnScalar(part.token.text.clone()),
                location: part.location.clone(),
            }),
            Some(Value::Array(items)) => {
                let index = self
                    .arith
                    .eval_to_int(self.env, expr)
                    .map_err(|message| Error {
                        cause: ErrorCause::ArithError(message),
                        location: part.location.clone(),
                    })?;
                let item = get_array_item(&items, index);
                Ok((item.map(Value::Scalar), Some(AIndex::Int(index))))
            }
            Some(Value::Assoc(entries)) => {
                // The subscript of an associative array is a key string,
                // not an arithmetic expression.
                let key = self
                    .arith
                    .eval_to_key(self.env, expr)
                    .map_err(|message| Error {
                        cause: ErrorCause::ArithError(message),
                        location: part.location.clone(),
                    })?;
                let item = entries.get(&key).cloned();
                Ok((item.map(Value::Scalar), Some(AIndex::Str(key))))
            }
        }
    }

    /// `${!ref}`: dereferences through the value of `ref`.
    fn apply_indirect_op(
        &mut self,
        value: Option<Value>,
        blame: &Token,
    ) -> Result<Option<Value>> {
        match value {
            None => Ok(None),
            Some(Value::Scalar(s)) => {
                if super::is_valid_var_name(&s) {
                    return Ok(self.env.variables.value_of(&s).cloned());
                }
                if let Ok(n) = s.parse::<usize>() {
                    return Ok(self.eval_var_num(n));
                }
                if s == "@" || s == "*" {
                    return Ok(Some(Value::array(self.env.positional_params.clone())));
                }
                // An array reference like 'arr[0]', 'arr[key]', 'arr[@]'.
                if let (Some(open), true) = (s.find('['), s.ends_with(']')) {
                    let name = &s[..open];
                    let index = &s[open + 1..s.len() - 1];
                    if let Some(result) = self.indirect_array_expand(name, index) {
                        return Ok(result);
                    }
                }
                Err(Error {
                    cause: ErrorCause::BadIndirection(s),
                    location: blame.location.clone(),
                })
            }
            // ${!a[@]}: the assigned indices, as strings.
            Some(Value::Array(items)) => Ok(Some(Value::array(
                items
                    .iter()
                    .enumerate()
                    .filter(|(_, item)| item.is_some())
                    .map(|(index, _)| index.to_string()),
            ))),
            Some(Value::Assoc(entries)) => {
                Ok(Some(Value::array(entries.keys().cloned())))
            }
        }
    }

    /// Expands `${!ref}` when `$ref` has the form `name[index]`.
    ///
    /// Returns `None` when the reference is not usable, which the caller
    /// turns into a fatal error.
    fn indirect_array_expand(&mut self, name: &str, index: &str) -> Option<Option<Value>> {
        if !super::is_valid_var_name(name) {
            return None;
        }
        match self.env.variables.value_of(name).cloned() {
            None => Some(None),
            Some(Value::Scalar(_)) => None,
            Some(Value::Array(items)) => {
                if index == "@" || index == "*" {
                    return Some(Some(Value::Array(items)));
                }
                let index: i64 = index.parse().ok()?;
                Some(get_array_item(&items, index).map(Value::Scalar))
            }
            Some(Value::Assoc(entries)) => {
                if index == "@" || index == "*" {
                    return Some(Some(Value::Array(
                        entries.values().map(|v| Some(v.clone())).collect(),
                    )));
                }
                Some(entries.get(index).cloned().map(Value::Scalar))
            }
        }
    }
}

/// `${#v}`: the length of the value.
///
/// Scalars count UTF-8 characters; arrays count assigned entries;
/// associative arrays count entries.
fn apply_length_op(value: Option<&Value>) -> Value {
    let length = match value {
        None => 0,
        Some(Value::Scalar(s)) => s.chars().count(),
        Some(Value::Array(items)) => items.iter().flatten().count(),
        Some(Value::Assoc(entries)) => entries.len(),
    };
    Value::Scalar(length.to_string())
}
