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

//! Suffix operators of braced parameter expansion
//!
//! Four families:
//!
//! - The test operators `:-` `-` `:+` `+` `:=` `=` `:?` `?` substitute,
//!   assign, or raise depending on whether the value is unset (or, with
//!   `:`, empty). Their argument word is evaluated lazily and spliced into
//!   the part-value stream, so `${undef:-'a b' c}` contributes fragments
//!   with their own quoting.
//! - The trim and case operators `%` `%%` `#` `##` `^` `^^` `,` `,,` match
//!   a glob pattern against the value. On arrays they apply element-wise,
//!   producing a new array.
//! - Pattern substitution `${v/pat/rep}` with its `//`, `/#`, `/%` forms.
//! - Slices `${v:begin:length}`, in UTF-8 character units for scalars and
//!   in elements for arrays (counting `$0` when slicing the positional
//!   parameters).

use super::part::decay;
use super::{AIndex, Error, ErrorCause, PartValue, QuoteKind, Result};
use itertools::Itertools;
use marsh_env::option::Option::{ExtGlob, StrictWordEval};
use marsh_env::variable::{Lvalue, Value};
use marsh_fnmatch::{with_escape, Config, Pattern};
use marsh_syntax::id::Id;
use marsh_syntax::source::Location;
use marsh_syntax::syntax::{PatSubMode, Token, Word};

impl super::WordEvaluator<'_> {
    /// Applies a test operator.
    ///
    /// Returns whether `part_vals` was mutated: `true` means the operator
    /// already appended the substitution and the caller is done.
    #[allow(clippy::too_many_arguments)]
    pub(super) fn apply_test_op(
        &mut self,
        value: &Option<Value>,
        op: &Token,
        arg_word: &Word,
        quoted: bool,
        part_vals: &mut Vec<PartValue>,
        var_name: Option<&str>,
        var_index: Option<&AIndex>,
        blame: &Token,
    ) -> Result<bool> {
        let is_falsey = match value {
            None => true,
            // Only the `:` forms treat an empty string as missing; an empty
            // array is missing either way.
            Some(Value::Scalar(s)) => match op.id {
                Id::VTestColonHyphen
                | Id::VTestColonEquals
                | Id::VTestColonQMark
                | Id::VTestColonPlus => s.is_empty(),
                _ => false,
            },
            Some(value) => value.is_empty(),
        };

        match op.id {
            Id::VTestColonHyphen | Id::VTestHyphen => {
                if is_falsey {
                    self.eval_word_to_parts(arg_word, quoted, part_vals, true)?;
                    Ok(true)
                } else {
                    Ok(false)
                }
            }

            // Inverse of the above.
            Id::VTestColonPlus | Id::VTestPlus => {
                if is_falsey {
                    Ok(false)
                } else {
                    self.eval_word_to_parts(arg_word, quoted, part_vals, true)?;
                    Ok(true)
                }
            }

            // Splice and assign.
            Id::VTestColonEquals | Id::VTestEquals => {
                if !is_falsey {
                    return Ok(false);
                }
                let mut assign_part_vals = Vec::new();
                self.eval_word_to_parts(arg_word, quoted, &mut assign_part_vals, true)?;

                let Some(var_name) = var_name else {
                    return Err(Error {
                        cause: ErrorCause::AssignToSpecial(blame.text.clone()),
                        location: blame.location.clone(),
                    });
                };

                // The written value decays arrays too.
                let rhs = decay(&assign_part_vals, &super::split::join_char(self.env));
                let lvalue = match var_index {
                    None => Lvalue::Named(var_name.to_string()),
                    Some(AIndex::Int(index)) => Lvalue::Indexed(var_name.to_string(), *index),
                    Some(AIndex::Str(key)) => Lvalue::Keyed(var_name.to_string(), key.clone()),
                };
                self.env
                    .variables
                    .assign(&lvalue, rhs)
                    .map_err(|e| Error {
                        cause: ErrorCause::Assign(e),
                        location: blame.location.clone(),
                    })?;

                part_vals.extend(assign_part_vals);
                Ok(true)
            }

            Id::VTestColonQMark | Id::VTestQMark => {
                if !is_falsey {
                    return Ok(false);
                }
                // The argument is the error message.
                let mut error_part_vals = Vec::new();
                self.eval_word_to_parts(arg_word, quoted, &mut error_part_vals, true)?;
                let message = decay(&error_part_vals, &super::split::join_char(self.env));
                Err(Error {
                    cause: ErrorCause::ExplicitError {
                        name: blame.text.clone(),
                        message,
                    },
                    location: blame.location.clone(),
                })
            }

            _ => unreachable!("not a test operator: {:?}", op.id),
        }
    }

    /// Applies a trim or case operator, element-wise on arrays.
    pub(super) fn apply_unary_suffix_op(
        &mut self,
        value: Option<Value>,
        op: &Token,
        arg_word: &Word,
    ) -> Result<Value> {
        // Glob syntax is supported in the argument of all of these ops.
        let pat = self.eval_word_to_string(arg_word, QuoteKind::FnMatch)?;
        let extended = self.env.options.is_on(ExtGlob);

        match value.unwrap_or_else(|| Value::scalar("")) {
            Value::Scalar(s) => {
                let out = self.do_unary_suffix_op(&s, op, &pat, extended)?;
                Ok(Value::Scalar(out))
            }
            Value::Array(items) => {
                let mut out = Vec::new();
                for item in items.iter().flatten() {
                    out.push(Some(self.do_unary_suffix_op(item, op, &pat, extended)?));
                }
                Ok(Value::Array(out))
            }
            Value::Assoc(entries) => {
                let mut out = Vec::new();
                for item in entries.values() {
                    out.push(Some(self.do_unary_suffix_op(item, op, &pat, extended)?));
                }
                Ok(Value::Array(out))
            }
        }
    }

    /// Applies one trim or case operator to one string.
    fn do_unary_suffix_op(
        &mut self,
        s: &str,
        op: &Token,
        pat: &str,
        extended: bool,
    ) -> Result<String> {
        match op.id {
            Id::VOp1Pound | Id::VOp1DPound | Id::VOp1Percent | Id::VOp1DPercent => {
                let Some(pattern) = self.compile_anchored(pat, extended, &op.location)? else {
                    return Ok(s.to_string());
                };

                // Candidate boundaries, in character units.
                let boundaries: Vec<usize> =
                    s.char_indices().map(|(i, _)| i).chain([s.len()]).collect();
                match op.id {
                    // Shortest prefix.
                    Id::VOp1Pound => {
                        for &end in &boundaries {
                            if pattern.is_match(&s[..end]) {
                                return Ok(s[end..].to_string());
                            }
                        }
                    }
                    // Longest prefix.
                    Id::VOp1DPound => {
                        for &end in boundaries.iter().rev() {
                            if pattern.is_match(&s[..end]) {
                                return Ok(s[end..].to_string());
                            }
                        }
                    }
                    // Shortest suffix.
                    Id::VOp1Percent => {
                        for &start in boundaries.iter().rev() {
                            if pattern.is_match(&s[start..]) {
                                return Ok(s[..start].to_string());
                            }
                        }
                    }
                    // Longest suffix.
                    Id::VOp1DPercent => {
                        for &start in &boundaries {
                            if pattern.is_match(&s[start..]) {
                                return Ok(s[..start].to_string());
                            }
                        }
                    }
                    _ => unreachable!(),
                }
                Ok(s.to_string())
            }

            Id::VOp1Caret | Id::VOp1DCaret | Id::VOp1Comma | Id::VOp1DComma => {
                // An omitted pattern matches every character.
                let pattern = if pat.is_empty() {
                    None
                } else {
                    match self.compile_anchored(pat, extended, &op.location)? {
                        Some(pattern) => Some(pattern),
                        None => return Ok(s.to_string()),
                    }
                };
                let matches = |c: char| match &pattern {
                    None => true,
                    Some(pattern) => pattern.is_match(c.encode_utf8(&mut [0; 4])),
                };
                let upper = matches!(op.id, Id::VOp1Caret | Id::VOp1DCaret);
                let all = matches!(op.id, Id::VOp1DCaret | Id::VOp1DComma);

                let mut out = String::with_capacity(s.len());
                for (i, c) in s.chars().enumerate() {
                    let convert = (all || i == 0) && matches(c);
                    if convert && upper {
                        out.extend(c.to_uppercase());
                    } else if convert {
                        out.extend(c.to_lowercase());
                    } else {
                        out.push(c);
                    }
                }
                Ok(out)
            }

            _ => unreachable!("not a unary suffix operator: {:?}", op.id),
        }
    }

    /// Compiles a fully anchored pattern. Unsupported pattern groups are a
    /// warning and give `None`; a broken translation is fatal.
    fn compile_anchored(
        &mut self,
        pat: &str,
        extended: bool,
        location: &Location,
    ) -> Result<Option<Pattern>> {
        let mut config = Config::default();
        config.anchor_begin = true;
        config.anchor_end = true;
        config.extended = extended;
        match Pattern::parse_with_config(with_escape(pat), config) {
            Ok(pattern) => Ok(Some(pattern)),
            Err(marsh_fnmatch::Error::InvalidRegex(message)) => Err(Error {
                cause: ErrorCause::InvalidPattern(message),
                location: location.clone(),
            }),
            Err(e) => {
                self.errfmt.warn(&format!("unusable pattern: {e}"), location);
                Ok(None)
            }
        }
    }

    /// Applies `${v/pat/rep}` and its variants, element-wise on arrays.
    pub(super) fn apply_pat_sub(
        &mut self,
        value: Option<Value>,
        pat: &Word,
        replace: Option<&Word>,
        mode: PatSubMode,
        location: &Location,
    ) -> Result<Value> {
        let pat_str = self.eval_word_to_string(pat, QuoteKind::FnMatch)?;
        let replace_str = match replace {
            Some(word) => self.eval_word_to_string(word, QuoteKind::Default)?,
            None => String::new(),
        };

        let mut config = Config::default();
        config.anchor_begin = mode == PatSubMode::Prefix;
        config.anchor_end = mode == PatSubMode::Suffix;
        config.extended = false;
        let pattern = Pattern::parse_with_config(with_escape(&pat_str), config).map_err(|e| {
            Error {
                cause: ErrorCause::InvalidPattern(e.to_string()),
                location: location.clone(),
            }
        })?;
        // Approximate translations are not fatal here; the pattern still
        // compiled to something usable.

        let replace_one = |s: &str| pat_sub_replace(s, &pattern, &replace_str, mode);

        Ok(match value.unwrap_or_else(|| Value::scalar("")) {
            Value::Scalar(s) => Value::Scalar(replace_one(&s)),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .flatten()
                    .map(|item| Some(replace_one(item)))
                    .collect(),
            ),
            Value::Assoc(entries) => Value::Array(
                entries.values().map(|item| Some(replace_one(item))).collect(),
            ),
        })
    }

    /// Applies `${v:begin}` / `${v:begin:length}`.
    pub(super) fn apply_slice(
        &mut self,
        value: Option<Value>,
        begin: Option<&str>,
        length: Option<&str>,
        var_name: Option<&str>,
        location: &Location,
    ) -> Result<Value> {
        let begin = match begin {
            Some(expr) => self.eval_arith(expr, location)?,
            None => 0,
        };
        let length = match length {
            Some(expr) => Some(self.eval_arith(expr, location)?),
            None => None,
        };

        // Slicing the positional parameters counts $0.
        let arg0 = var_name.is_none().then(|| self.env.arg0.clone());

        let value = value.unwrap_or_else(|| Value::scalar(""));
        match perform_slice(&value, begin, length, arg0, location) {
            Ok(sliced) => Ok(sliced),
            Err(e) if e.cause == ErrorCause::SliceOutOfRange => {
                if self.env.options.is_on(StrictWordEval) {
                    Err(e)
                } else {
                    self.errfmt.warn(&e.to_string(), location);
                    Ok(match value {
                        Value::Scalar(_) => Value::scalar(""),
                        _ => Value::Array(Vec::new()),
                    })
                }
            }
            Err(e) => Err(e),
        }
    }

    fn eval_arith(&mut self, expr: &str, location: &Location) -> Result<i64> {
        self.arith
            .eval_to_int(self.env, expr)
            .map_err(|message| Error {
                cause: ErrorCause::ArithError(message),
                location: location.clone(),
            })
    }

    /// Applies a `@P`, `@Q`, or `@a` formatter.
    ///
    /// Returns the new value and whether the result counts as quoted at the
    /// outer level (`${x@Q}` expands like `"${x@Q}"`).
    pub(super) fn apply_nullary_op(
        &mut self,
        value: Option<Value>,
        op: &Token,
        var_name: Option<&str>,
    ) -> Result<(Value, bool)> {
        match op.id {
            Id::VOp0P => match value {
                Some(Value::Scalar(s)) => {
                    let prompt = self.prompt.eval_prompt(self.env, &s);
                    // Readline brackets its invisible spans with \x01/\x02;
                    // they never reach the user.
                    let prompt = prompt.replace('\u{1}', "").replace('\u{2}', "");
                    Ok((Value::Scalar(prompt), false))
                }
                _ => Err(Error {
                    cause: ErrorCause::FormatterTypeError { op: "@P" },
                    location: op.location.clone(),
                }),
            },

            Id::VOp0Q => match value {
                Some(Value::Scalar(s)) => {
                    let quoted = marsh_quote::quote(&s).into_owned();
                    Ok((Value::Scalar(quoted), true))
                }
                Some(Value::Array(items)) => {
                    let joined = items
                        .iter()
                        .flatten()
                        .map(|item| marsh_quote::quote(item))
                        .join(" ");
                    Ok((Value::Scalar(joined), false))
                }
                _ => Err(Error {
                    cause: ErrorCause::FormatterTypeError { op: "@Q" },
                    location: op.location.clone(),
                }),
            },

            Id::VOp0A => {
                let mut chars = String::new();
                match &value {
                    Some(Value::Array(_)) => chars.push('a'),
                    Some(Value::Assoc(_)) => chars.push('A'),
                    _ => {}
                }
                // e.g. ${?@a} has no cell to inspect.
                if let Some(name) = var_name {
                    if let Some(cell) = self.env.variables.get(name) {
                        if cell.is_read_only() {
                            chars.push('r');
                        }
                        if cell.is_exported {
                            chars.push('x');
                        }
                        if cell.is_nameref {
                            chars.push('n');
                        }
                    }
                }
                Ok((Value::Scalar(chars), false))
            }

            _ => unreachable!("not a formatter: {:?}", op.id),
        }
    }
}

/// Replaces matches of `pattern` in `s`.
fn pat_sub_replace(s: &str, pattern: &Pattern, replace: &str, mode: PatSubMode) -> String {
    if mode == PatSubMode::All {
        let mut out = String::with_capacity(s.len());
        let mut rest = s;
        loop {
            match pattern.find(rest) {
                None => {
                    out.push_str(rest);
                    break;
                }
                Some(range) => {
                    out.push_str(&rest[..range.start]);
                    out.push_str(replace);
                    if range.is_empty() {
                        // An empty match must not stall; copy one character.
                        match rest[range.end..].chars().next() {
                            Some(c) => {
                                out.push(c);
                                rest = &rest[range.end + c.len_utf8()..];
                            }
                            None => break,
                        }
                    } else {
                        rest = &rest[range.end..];
                    }
                }
            }
        }
        out
    } else {
        match pattern.find(s) {
            Some(range) => format!("{}{}{}", &s[..range.start], replace, &s[range.end..]),
            None => s.to_string(),
        }
    }
}

/// Slices a value. `begin` and `length` follow the shell conventions:
/// negative `begin` counts from the end; for scalars a negative `length` is
/// a position from the end, and for arrays it is an error.
fn perform_slice(
    value: &Value,
    begin: i64,
    length: Option<i64>,
    arg0: Option<String>,
    location: &Location,
) -> Result<Value> {
    let out_of_range = || Error {
        cause: ErrorCause::SliceOutOfRange,
        location: location.clone(),
    };

    match value {
        // Slice UTF-8 characters in a string.
        Value::Scalar(s) => {
            let n = s.chars().count() as i64;
            let start = if begin < 0 { n + begin } else { begin };
            if start < 0 {
                return Err(out_of_range());
            }
            let start = start.min(n);

            let end = match length {
                None => n,
                Some(length) if length < 0 => {
                    // A position counted from the end, not a count.
                    let end = n + length;
                    if end < 0 {
                        return Err(out_of_range());
                    }
                    end.max(start)
                }
                Some(length) => (start + length).min(n),
            };

            let sliced: String = s
                .chars()
                .skip(start as usize)
                .take((end - start) as usize)
                .collect();
            Ok(Value::Scalar(sliced))
        }

        // Slice array entries.
        Value::Array(items) => {
            // This is always fatal, unlike the string case.
            if let Some(length) = length {
                if length < 0 {
                    return Err(Error {
                        cause: ErrorCause::NegativeSliceLength(length),
                        location: location.clone(),
                    });
                }
            }

            let mut orig: Vec<Option<String>> = Vec::new();
            if let Some(arg0) = arg0 {
                orig.push(Some(arg0));
            }
            orig.extend(items.iter().cloned());

            let n = orig.len() as i64;
            let start = if begin < 0 { n + begin } else { begin };
            if start < 0 {
                return Err(out_of_range());
            }

            let mut out = Vec::new();
            let mut index = start;
            while index < n {
                if let Some(limit) = length {
                    if out.len() as i64 == limit {
                        break;
                    }
                }
                // Unassigned entries don't count towards the length.
                if let Some(item) = &orig[index as usize] {
                    out.push(Some(item.clone()));
                }
                index += 1;
            }
            Ok(Value::Array(out))
        }

        Value::Assoc(_) => Err(Error {
            cause: ErrorCause::SliceOfAssoc,
            location: location.clone(),
        }),
    }
}
