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

//! Fake collaborators and word builders shared by the tests of this crate.

use crate::expansion::{
    ArithEvaluator, ErrorFormatter, ExprEvaluator, ExprValue, PromptEvaluator, ShellExecutor,
    WordEvaluator,
};
use marsh_env::variable::Value;
use marsh_env::Env;
use marsh_syntax::id::Id;
use marsh_syntax::source::Location;
use marsh_syntax::syntax::{Token, Word, WordPart};
use std::collections::HashMap;

/// Executor with canned outputs.
#[derive(Debug, Default)]
pub struct FakeExecutor {
    /// Canned standard output per command-substitution body.
    pub command_outputs: HashMap<String, String>,
    /// Canned device path per process-substitution body.
    pub process_subs: HashMap<String, String>,
    /// Bodies in the order they were run.
    pub calls: Vec<String>,
}

impl ShellExecutor for FakeExecutor {
    fn run_command_sub(
        &mut self,
        _env: &mut Env,
        body: &str,
    ) -> std::result::Result<String, String> {
        self.calls.push(body.to_string());
        self.command_outputs
            .get(body)
            .cloned()
            .ok_or_else(|| format!("no such command: {body}"))
    }

    fn run_process_sub(
        &mut self,
        _env: &mut Env,
        body: &str,
        _direction: Id,
    ) -> std::result::Result<String, String> {
        self.calls.push(body.to_string());
        self.process_subs
            .get(body)
            .cloned()
            .ok_or_else(|| format!("no such process: {body}"))
    }
}

/// Arithmetic evaluator that handles integer literals and plain variable
/// names.
#[derive(Debug, Default)]
pub struct FakeArith;

impl ArithEvaluator for FakeArith {
    fn eval_to_int(&mut self, env: &mut Env, expr: &str) -> std::result::Result<i64, String> {
        let expr = expr.trim();
        if let Ok(n) = expr.parse() {
            return Ok(n);
        }
        match env.variables.value_of(expr) {
            Some(Value::Scalar(s)) => s.trim().parse().map_err(|_| format!("not a number: {s}")),
            _ => Err(format!("cannot evaluate: {expr}")),
        }
    }

    fn eval_to_key(&mut self, _env: &mut Env, expr: &str) -> std::result::Result<String, String> {
        Ok(expr.to_string())
    }
}

/// Prompt evaluator that returns its input unchanged.
#[derive(Debug, Default)]
pub struct FakePrompt;

impl PromptEvaluator for FakePrompt {
    fn eval_prompt(&mut self, _env: &mut Env, prompt: &str) -> String {
        prompt.to_string()
    }
}

/// Expression evaluator with canned results.
#[derive(Debug, Default)]
pub struct FakeExpr {
    /// Canned result per expression source.
    pub exprs: HashMap<String, ExprValue>,
    /// Canned result per function name.
    pub functions: HashMap<String, ExprValue>,
}

impl ExprEvaluator for FakeExpr {
    fn eval_expr(
        &mut self,
        _env: &mut Env,
        expr: &str,
    ) -> std::result::Result<ExprValue, String> {
        self.exprs
            .get(expr)
            .cloned()
            .ok_or_else(|| format!("no such expression: {expr}"))
    }

    fn eval_call(
        &mut self,
        _env: &mut Env,
        name: &str,
        _args: &str,
    ) -> std::result::Result<ExprValue, String> {
        self.functions
            .get(name)
            .cloned()
            .ok_or_else(|| format!("no such function: {name}"))
    }
}

/// Formatter that records warnings instead of printing them.
#[derive(Debug, Default)]
pub struct RecordingFormatter {
    pub warnings: Vec<String>,
}

impl ErrorFormatter for RecordingFormatter {
    fn warn(&mut self, message: &str, _location: &Location) {
        self.warnings.push(message.to_string());
    }
}

/// One environment plus one of each fake collaborator.
#[derive(Debug, Default)]
pub struct TestContext {
    pub env: Env,
    pub executor: FakeExecutor,
    pub arith: FakeArith,
    pub prompt: FakePrompt,
    pub expr: FakeExpr,
    pub errfmt: RecordingFormatter,
}

impl TestContext {
    /// Borrows everything into a fresh evaluator.
    pub fn evaluator(&mut self) -> WordEvaluator<'_> {
        WordEvaluator::new(
            &mut self.env,
            &mut self.executor,
            &mut self.arith,
            &mut self.prompt,
            &mut self.errfmt,
        )
    }

    /// Like [`evaluator`](Self::evaluator), with the expression evaluator
    /// wired up.
    pub fn evaluator_with_expr(&mut self) -> WordEvaluator<'_> {
        let mut evaluator = WordEvaluator::new(
            &mut self.env,
            &mut self.executor,
            &mut self.arith,
            &mut self.prompt,
            &mut self.errfmt,
        );
        evaluator.expr = Some(&mut self.expr);
        evaluator
    }
}

/// An unquoted literal part.
pub fn lit(text: &str) -> WordPart {
    WordPart::Literal(Token::dummy(Id::LitChars, text))
}

/// A word of one unquoted literal.
pub fn lit_word(text: &str) -> Word {
    Word::from_parts(vec![lit(text)])
}

/// A `name=` literal as the lexer marks assignment prefixes.
pub fn var_like(text: &str) -> WordPart {
    WordPart::Literal(Token::dummy(Id::LitVarLike, text))
}

/// A single-quoted part.
pub fn sq(text: &str) -> WordPart {
    WordPart::SingleQuoted {
        text: text.to_string(),
        location: Location::dummy(format!("'{text}'")),
    }
}

/// A double-quoted part.
pub fn dq(parts: &[WordPart]) -> WordPart {
    WordPart::DoubleQuoted {
        parts: parts.to_vec(),
        location: Location::dummy("\"\""),
    }
}

/// A `$name` part.
pub fn simple_var(name: &str) -> WordPart {
    WordPart::SimpleVarSub(Token::dummy(Id::VSubDollarName, name))
}
