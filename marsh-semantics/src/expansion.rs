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

//! Word expansion
//!
//! This module evaluates [words](Word) into strings and argument vectors:
//! tilde expansion, parameter expansion with its bracket, prefix, and suffix
//! operators, command and arithmetic substitution, field splitting, and
//! pathname expansion.
//!
//! The [`WordEvaluator`] borrows the [environment](Env) and the collaborator
//! interfaces it re-enters: the [executor](ShellExecutor) for command
//! substitution, the [arithmetic evaluator](ArithEvaluator) for `$((...))`
//! and subscripts, the [prompt evaluator](PromptEvaluator) for `${v@P}`,
//! and optionally the [expression evaluator](ExprEvaluator) of the
//! extension language. Everything is synchronous: command substitution
//! re-enters the executor and folds its output back into the part-value
//! stream before evaluation continues.
//!
//! Fatal errors carry the [location](Location) of the construct to blame
//! and unwind to the caller; degradable conditions are reported through the
//! caller-supplied [`ErrorFormatter`] and evaluation continues with a
//! neutral value.

pub mod glob;
pub mod part;
pub mod split;
pub mod tilde;

mod braced;
mod command;
mod param;
mod suffix;

pub use self::command::{AssignArg, CmdValue};
pub use self::part::{Fragment, PartValue};

use marsh_env::variable::{AssignError, Value};
use marsh_env::Env;
use marsh_syntax::id::Id;
use marsh_syntax::source::Location;
use marsh_syntax::syntax::{BracedParam, Token, Word, WordPart};
use thiserror::Error;

/// Types of errors that may occur in the word expansion.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ErrorCause {
    /// Expansion of an unset variable under the `nounset` option.
    #[error("Undefined variable {0:?}")]
    UndefinedVariable(String),

    /// Expansion of an unset array under the `nounset` option.
    #[error("Undefined array {0:?}")]
    UndefinedArray(String),

    /// `${!ref}` where the value of `ref` does not name anything.
    #[error("Bad indirect expansion: {0:?}")]
    BadIndirection(String),

    /// An array used as a scalar without `[@]` or `[*]`.
    #[error("Array {0:?} can't be referred to as a scalar (without @ or *)")]
    ArrayAsScalar(String),

    /// An integer subscript applied to a string value.
    #[error("Can't index string {0:?} with an integer")]
    IndexOnScalar(String),

    /// `[@]` or `[*]` applied to a string value.
    #[error("Can't index string {name:?} with {op}")]
    WholeArrayOnScalar { name: String, op: char },

    /// Slicing an associative array.
    #[error("Can't slice associative arrays")]
    SliceOfAssoc,

    /// A negative length in an array slice.
    #[error("The length of an array slice can't be negative: {0}")]
    NegativeSliceLength(i64),

    /// A slice bound reached outside the value. Degradable: fatal only
    /// under `strict_word_eval`.
    #[error("Slice bound is out of range")]
    SliceOutOfRange,

    /// `${v:?message}` observed an unset or empty value.
    #[error("{name}: {message}")]
    ExplicitError { name: String, message: String },

    /// `${v:=default}` on a parameter that has no variable cell.
    #[error("Can't assign to special parameter {0:?}")]
    AssignToSpecial(String),

    /// The variable store rejected an assignment.
    #[error(transparent)]
    Assign(#[from] AssignError),

    /// A substitution pattern did not translate to a usable regex.
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// A dynamic assignment argument is not `name` or `name=value`.
    #[error("Invalid variable name {0:?}")]
    InvalidVariableName(String),

    /// `name+=value` passed to an assignment builtin.
    #[error("+= is not allowed in an assignment builtin")]
    PlusEqualInAssignBuiltin,

    /// An array literal outside the right-hand side of an assignment.
    #[error("Unexpected array literal")]
    UnexpectedArrayLiteral,

    /// `@name` splicing a value that is not an array.
    #[error("Can't splice {0:?}")]
    CannotSplice(String),

    /// A `@P`/`@Q` formatter applied to a value of the wrong shape.
    #[error("Can't use {op} on this value type")]
    FormatterTypeError { op: &'static str },

    /// A nullary operator that names no known formatter.
    #[error("Var op {0:?} not implemented")]
    UnknownFormatter(String),

    /// A word that must be a single string contained an array, under the
    /// `strict_array` option.
    #[error("This word should yield a string, but it contains an array")]
    StrictArray,

    /// The executor failed to run a command substitution.
    #[error("Error in command substitution: {0}")]
    CommandSubError(String),

    /// The arithmetic evaluator rejected an expression.
    #[error("Arithmetic error: {0}")]
    ArithError(String),

    /// The expression evaluator rejected an expression.
    #[error("Expression error: {0}")]
    ExprError(String),

    /// An expression-language construct without an expression evaluator.
    #[error("Expression substitution is not supported here")]
    ExprUnsupported,

    /// Tilde expansion failed under the `strict_tilde` option.
    #[error("Error expanding tilde {0:?} (e.g. invalid user)")]
    TildeFailed(String),
}

/// Explanation of an expansion failure.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("{cause}")]
pub struct Error {
    pub cause: ErrorCause,
    pub location: Location,
}

/// Result of word expansion.
pub type Result<T = ()> = std::result::Result<T, Error>;

/// How the characters of an evaluated word are escaped for the consumer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum QuoteKind {
    /// No escaping: the word becomes a plain string.
    Default,
    /// Characters from quoted parts are escaped so they match literally as
    /// a glob pattern; unquoted glob metacharacters keep their meaning.
    FnMatch,
    /// Characters from quoted parts are escaped for an extended regular
    /// expression.
    Ere,
}

/// Subscript that locates the array slot a test-and-assign operator writes
/// back into.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AIndex {
    /// Integer index into an indexed array.
    Int(i64),
    /// Key into an associative array.
    Str(String),
}

/// Interface to the command executor.
///
/// Command substitution re-enters the executor synchronously; the executor
/// re-enters this evaluator for the words of the nested command.
pub trait ShellExecutor: std::fmt::Debug {
    /// Runs a command substitution body and returns its captured standard
    /// output, with trailing newlines removed.
    fn run_command_sub(&mut self, env: &mut Env, body: &str)
        -> std::result::Result<String, String>;

    /// Runs a process substitution body and returns the device path that
    /// reads from or writes to it. `direction` is
    /// [`Id::LeftProcSubIn`] or [`Id::LeftProcSubOut`].
    fn run_process_sub(
        &mut self,
        env: &mut Env,
        body: &str,
        direction: Id,
    ) -> std::result::Result<String, String>;
}

/// Interface to the arithmetic evaluator.
pub trait ArithEvaluator: std::fmt::Debug {
    /// Evaluates an arithmetic expression to an integer.
    fn eval_to_int(&mut self, env: &mut Env, expr: &str) -> std::result::Result<i64, String>;

    /// Evaluates a subscript expression to an associative array key.
    fn eval_to_key(&mut self, env: &mut Env, expr: &str) -> std::result::Result<String, String>;
}

/// Interface to the prompt evaluator, for the `@P` formatter.
pub trait PromptEvaluator: std::fmt::Debug {
    /// Expands prompt escapes in the given string.
    fn eval_prompt(&mut self, env: &mut Env, prompt: &str) -> String;
}

/// Value returned by the expression evaluator of the extension language.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ExprValue {
    /// A single string.
    Str(String),
    /// A sequence that splices into multiple fields.
    Array(Vec<String>),
}

/// Optional interface to the expression evaluator of the extension
/// language, for `$[expr]` and `$f(args)` word parts.
pub trait ExprEvaluator: std::fmt::Debug {
    /// Evaluates an expression and stringifies the result.
    fn eval_expr(&mut self, env: &mut Env, expr: &str) -> std::result::Result<ExprValue, String>;

    /// Calls a function with the given argument list source.
    fn eval_call(
        &mut self,
        env: &mut Env,
        name: &str,
        args: &str,
    ) -> std::result::Result<ExprValue, String>;
}

/// Sink for non-fatal diagnostics.
///
/// The evaluator never prints; degradable conditions are routed here and
/// the caller decides how to render them.
pub trait ErrorFormatter: std::fmt::Debug {
    /// Reports a warning attached to a source location.
    fn warn(&mut self, message: &str, location: &Location);
}

/// Whether the string is a well-formed variable name.
#[must_use]
pub fn is_valid_var_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// The word evaluator.
///
/// Borrows the environment and collaborators for the duration of one or
/// more evaluations. All evaluation is synchronous and single-threaded;
/// no part-value state survives across words.
#[derive(Debug)]
pub struct WordEvaluator<'a> {
    pub env: &'a mut Env,
    pub executor: &'a mut dyn ShellExecutor,
    pub arith: &'a mut dyn ArithEvaluator,
    pub prompt: &'a mut dyn PromptEvaluator,
    /// Expression evaluator of the extension language, if configured.
    pub expr: Option<&'a mut dyn ExprEvaluator>,
    pub errfmt: &'a mut dyn ErrorFormatter,
}

impl<'a> WordEvaluator<'a> {
    /// Creates an evaluator without an expression evaluator.
    pub fn new(
        env: &'a mut Env,
        executor: &'a mut dyn ShellExecutor,
        arith: &'a mut dyn ArithEvaluator,
        prompt: &'a mut dyn PromptEvaluator,
        errfmt: &'a mut dyn ErrorFormatter,
    ) -> Self {
        WordEvaluator {
            env,
            executor,
            arith,
            prompt,
            expr: None,
            errfmt,
        }
    }

    /// Evaluates a word to a single string.
    ///
    /// Array parts (from `"$@"` and friends) are joined with spaces unless
    /// the `strict_array` option makes them an error. The quote kind
    /// selects how characters from quoted parts are escaped, so that the
    /// result can be consumed as a glob pattern or a regular expression.
    pub fn eval_word_to_string(&mut self, word: &Word, quote_kind: QuoteKind) -> Result<String> {
        let mut part_vals = Vec::new();
        self.eval_word_to_parts(word, false, &mut part_vals, false)?;

        let mut out = String::new();
        for part_val in part_vals {
            match part_val {
                PartValue::String { s, quoted, .. } => {
                    if quoted {
                        match quote_kind {
                            QuoteKind::Default => out.push_str(&s),
                            QuoteKind::FnMatch => out.push_str(&glob::escape(&s)),
                            QuoteKind::Ere => out.push_str(&ere_escape(&s)),
                        }
                    } else {
                        out.push_str(&s);
                    }
                }
                PartValue::Array(items) => {
                    out.push_str(&self.join_array_fragment(items, &word.location)?);
                }
            }
        }
        Ok(out)
    }

    /// Evaluates the right-hand side of an assignment. There is no
    /// splitting; `a=(...)` and `a=([k]=v ...)` produce array values.
    pub fn eval_rhs_word(&mut self, word: &Word) -> Result<Value> {
        if let [part] = word.parts.as_slice() {
            match part {
                WordPart::ArrayLiteral { words, .. } => {
                    let strs = self.eval_word_sequence(words)?;
                    return Ok(Value::array(strs));
                }
                WordPart::AssocArrayLiteral { pairs, .. } => {
                    let mut entries = Vec::new();
                    for (key_word, value_word) in pairs {
                        let key = self.eval_word_to_string(key_word, QuoteKind::Default)?;
                        let value = self.eval_word_to_string(value_word, QuoteKind::Default)?;
                        entries.push((key, value));
                    }
                    return Ok(Value::assoc(entries));
                }
                _ => {}
            }
        }

        self.eval_word_to_string(word, QuoteKind::Default)
            .map(Value::Scalar)
    }

    /// Turns a list of words into an argument vector.
    ///
    /// For arrays and `for` loops, which never allow assignment builtins.
    pub fn eval_word_sequence(&mut self, words: &[Word]) -> Result<Vec<String>> {
        match self.eval_word_sequence2(words, false)? {
            CmdValue::Argv { argv, .. } => Ok(argv),
            CmdValue::Assign { .. } => unreachable!("assignment detection is disabled"),
        }
    }

    /// Evaluates a word for a plugin such as the prompt renderer.
    ///
    /// Runtime errors are caught and rendered into the returned string, and
    /// the special registers (`$?`, `PIPESTATUS`) are restored afterwards,
    /// so a broken prompt cannot crash or corrupt the shell.
    pub fn eval_for_plugin(&mut self, word: &Word) -> String {
        let mut guard = self.env.push_registers();
        let expr: Option<&mut dyn ExprEvaluator> = match &mut self.expr {
            Some(e) => Some(&mut **e),
            None => None,
        };
        let mut sub: WordEvaluator<'_> = WordEvaluator {
            env: &mut guard,
            executor: &mut *self.executor,
            arith: &mut *self.arith,
            prompt: &mut *self.prompt,
            expr,
            errfmt: &mut *self.errfmt,
        };
        match sub.eval_word_to_string(word, QuoteKind::Default) {
            Ok(s) => s,
            Err(error) => format!("<Runtime error: {error}>"),
        }
    }

    /// Evaluates the parts of a double-quoted string to a single string.
    ///
    /// For double-quoted strings in extension-language expressions.
    pub fn eval_double_quoted_to_string(
        &mut self,
        parts: &[WordPart],
        location: &Location,
    ) -> Result<String> {
        let mut part_vals = Vec::new();
        self.eval_double_quoted(parts, &mut part_vals)?;
        self.part_vals_to_string(part_vals, location)
    }

    /// Evaluates one `${...}` to a single string.
    pub fn eval_braced_var_sub_to_string(&mut self, sub: &BracedParam) -> Result<String> {
        let mut part_vals = Vec::new();
        self.eval_braced_var_sub(sub, &mut part_vals, false)?;
        self.part_vals_to_string(part_vals, &sub.location)
    }

    /// Evaluates one `$name`-style substitution to a single string.
    pub fn eval_simple_var_sub_to_string(&mut self, token: &Token) -> Result<String> {
        let mut part_vals = Vec::new();
        self.eval_simple_var_sub(token, &mut part_vals, false)?;
        self.part_vals_to_string(part_vals, &token.location)
    }

    /// Concatenates part values into one string, joining arrays with
    /// spaces unless `strict_array` forbids it.
    fn part_vals_to_string(
        &mut self,
        part_vals: Vec<PartValue>,
        location: &Location,
    ) -> Result<String> {
        let mut out = String::new();
        for part_val in part_vals {
            match part_val {
                PartValue::String { s, .. } => out.push_str(&s),
                PartValue::Array(items) => {
                    out.push_str(&self.join_array_fragment(items, location)?);
                }
            }
        }
        Ok(out)
    }

    /// Joins an array part value that appeared where a single string is
    /// required. Joining ignores `$IFS`; the separator is a space.
    fn join_array_fragment(
        &mut self,
        items: Vec<Option<String>>,
        location: &Location,
    ) -> Result<String> {
        use marsh_env::option::Option::StrictArray;
        if self.env.options.is_on(StrictArray) {
            return Err(Error {
                cause: ErrorCause::StrictArray,
                location: location.clone(),
            });
        }
        let kept: Vec<String> = items.into_iter().flatten().collect();
        Ok(kept.join(" "))
    }
}

/// Escapes a string for literal use in an extended regular expression.
#[must_use]
fn ere_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(
            c,
            '\\' | '^' | '$' | '.' | '|' | '?' | '*' | '+' | '(' | ')' | '[' | ']' | '{' | '}'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
