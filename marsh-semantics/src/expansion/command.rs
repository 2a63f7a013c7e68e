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

//! From words to argument vectors
//!
//! The driver walks the words of a command. Each word part contributes part
//! values; the part values group into frames; and each frame yields zero or
//! more arguments after field splitting and pathname expansion.
//!
//! When the first word of a command names an assignment builtin (`declare`,
//! `typeset`, `local`, `readonly`, `export`), evaluation re-routes: the
//! remaining words are parsed as flags and `name=value` pairs whose
//! right-hand sides are evaluated without splitting or globbing. The
//! detection is dynamic, so `e=export; $e foo=bar` works, but a first word
//! produced by a quoted expansion never triggers it.

use super::glob;
use super::part::{make_frames, Fragment, PartValue};
use super::split;
use super::{Error, ErrorCause, ExprValue, QuoteKind, Result};
use marsh_env::option::Option::{NoGlob, SimpleWordEval};
use marsh_env::variable::Value;
use marsh_syntax::id::{lookup_assign_builtin, Id};
use marsh_syntax::source::Location;
use marsh_syntax::syntax::{Word, WordPart};

/// Result of evaluating the words of a simple command.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CmdValue {
    /// An ordinary command: its argument vector, with one source location
    /// per argument for blame.
    Argv {
        argv: Vec<String>,
        locations: Vec<Location>,
    },
    /// An assignment-builtin invocation.
    Assign {
        /// Which builtin, e.g. [`Id::AssignDeclare`].
        builtin: Id,
        /// The builtin name and its flags, e.g. `["declare", "-r"]`.
        flags: Vec<String>,
        /// One location per flag.
        flag_locations: Vec<Location>,
        /// The assignments.
        args: Vec<AssignArg>,
    },
}

/// One assignment argument of an assignment builtin.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AssignArg {
    /// Variable name.
    pub name: String,
    /// Assigned value; `None` for a bare name like `local x`.
    pub value: Option<Value>,
    /// Location of the originating word.
    pub location: Location,
}

/// Doubles up backslashes.
///
/// Used on strings about to be split and globbed: splitting eats one level
/// of escaping and globbing the other.
fn backslash_escape(s: &str) -> String {
    s.replace('\\', r"\\")
}

impl super::WordEvaluator<'_> {
    /// Evaluates one word part into part values.
    ///
    /// `is_subst` is true inside the argument of a suffix operator, where
    /// even literal text is subject to later splitting (`${u:-a b}` splits,
    /// plain `a b` was already split by the parser).
    pub(super) fn eval_word_part(
        &mut self,
        part: &WordPart,
        part_vals: &mut Vec<PartValue>,
        quoted: bool,
        is_subst: bool,
    ) -> Result<()> {
        match part {
            WordPart::ArrayLiteral { location, .. }
            | WordPart::AssocArrayLiteral { location, .. } => Err(Error {
                cause: ErrorCause::UnexpectedArrayLiteral,
                location: location.clone(),
            }),

            WordPart::Literal(token) => {
                part_vals.push(PartValue::string(token.text.clone(), quoted, is_subst));
                Ok(())
            }

            WordPart::EscapedLiteral(token) => {
                debug_assert!(token.text.starts_with('\\'));
                part_vals.push(PartValue::string(&token.text[1..], true, false));
                Ok(())
            }

            WordPart::SingleQuoted { text, .. } => {
                part_vals.push(PartValue::string(text.clone(), true, false));
                Ok(())
            }

            WordPart::DoubleQuoted { parts, .. } => self.eval_double_quoted(parts, part_vals),

            WordPart::CommandSub {
                left,
                body,
                location,
            } => {
                let part_val = match *left {
                    Id::LeftDollarParen | Id::LeftBacktick => {
                        let stdout = self.run_command_sub(body, location)?;
                        PartValue::string(stdout, quoted, !quoted)
                    }
                    // @(...) splits the output into an array up front.
                    Id::LeftAtParen => {
                        let stdout = self.run_command_sub(body, location)?;
                        let fields = split::split_for_word_eval(self.env, &stdout);
                        PartValue::Array(fields.into_iter().map(Some).collect())
                    }
                    Id::LeftProcSubIn | Id::LeftProcSubOut => {
                        let path = self
                            .executor
                            .run_process_sub(self.env, body, *left)
                            .map_err(|message| Error {
                                cause: ErrorCause::CommandSubError(message),
                                location: location.clone(),
                            })?;
                        // The device path is never split or globbed.
                        PartValue::string(path, true, false)
                    }
                    id => unreachable!("not a substitution delimiter: {id:?}"),
                };
                part_vals.push(part_val);
                Ok(())
            }

            WordPart::SimpleVarSub(token) => self.eval_simple_var_sub(token, part_vals, quoted),

            WordPart::BracedVarSub(sub) => self.eval_braced_var_sub(sub, part_vals, quoted),

            WordPart::TildeSub(token) => {
                // Quoted tildes never parse into a tilde part.
                debug_assert!(!quoted);
                let home = super::tilde::eval(self.env, token)?;
                // NOT split, even though it is unquoted.
                part_vals.push(PartValue::string(home, true, false));
                Ok(())
            }

            WordPart::ArithSub { expr, location } => {
                let number =
                    self.arith
                        .eval_to_int(self.env, expr)
                        .map_err(|message| Error {
                            cause: ErrorCause::ArithError(message),
                            location: location.clone(),
                        })?;
                part_vals.push(PartValue::string(number.to_string(), quoted, !quoted));
                Ok(())
            }

            WordPart::ExtGlob { op, arms } => {
                // ,(foo|bar) is the spelling that reaches the glob engine
                // as @(foo|bar).
                let op_str = if op.id == Id::ExtGlobComma {
                    "@(".to_string()
                } else {
                    op.text.clone()
                };
                // None of the operator pieces are split.
                part_vals.push(PartValue::string(op_str, false, false));
                for (i, arm) in arms.iter().enumerate() {
                    if i != 0 {
                        part_vals.push(PartValue::string("|", false, false));
                    }
                    // This flattens the tree.
                    self.eval_word_to_parts(arm, false, part_vals, false)?;
                }
                part_vals.push(PartValue::string(")", false, false));
                Ok(())
            }

            WordPart::Splice(token) => {
                let items = match self.env.variables.value_of(&token.text) {
                    Some(Value::Array(items)) => items.clone(),
                    Some(Value::Assoc(entries)) => {
                        entries.keys().map(|k| Some(k.clone())).collect()
                    }
                    _ => {
                        return Err(Error {
                            cause: ErrorCause::CannotSplice(token.text.clone()),
                            location: token.location.clone(),
                        });
                    }
                };
                part_vals.push(PartValue::Array(items));
                Ok(())
            }

            WordPart::ExprSub { expr, location } => {
                let Some(expr_ev) = self.expr.as_mut() else {
                    return Err(Error {
                        cause: ErrorCause::ExprUnsupported,
                        location: location.clone(),
                    });
                };
                let value = expr_ev
                    .eval_expr(self.env, expr)
                    .map_err(|message| Error {
                        cause: ErrorCause::ExprError(message),
                        location: location.clone(),
                    })?;
                part_vals.push(expr_value_to_part_value(value, quoted, false));
                Ok(())
            }

            WordPart::FuncCall {
                name,
                args,
                location,
            } => {
                let Some(expr_ev) = self.expr.as_mut() else {
                    return Err(Error {
                        cause: ErrorCause::ExprUnsupported,
                        location: location.clone(),
                    });
                };
                let value = expr_ev
                    .eval_call(self.env, &name.text, args)
                    .map_err(|message| Error {
                        cause: ErrorCause::ExprError(message),
                        location: location.clone(),
                    })?;
                let splice = name.id == Id::LitSplice;
                part_vals.push(expr_value_to_part_value(value, quoted, splice));
                Ok(())
            }
        }
    }

    fn run_command_sub(&mut self, body: &str, location: &Location) -> Result<String> {
        self.executor
            .run_command_sub(self.env, body)
            .map_err(|message| Error {
                cause: ErrorCause::CommandSubError(message),
                location: location.clone(),
            })
    }

    /// Evaluates the parts of a double-quoted string.
    ///
    /// `""` parses into zero parts but still contributes one empty quoted
    /// fragment, which is what stops `argv ""` from eliding the argument.
    pub(super) fn eval_double_quoted(
        &mut self,
        parts: &[WordPart],
        part_vals: &mut Vec<PartValue>,
    ) -> Result<()> {
        if parts.is_empty() {
            part_vals.push(PartValue::string("", true, false));
            return Ok(());
        }
        for part in parts {
            self.eval_word_part(part, part_vals, true, false)?;
        }
        Ok(())
    }

    /// Evaluates a whole word into part values.
    pub(super) fn eval_word_to_parts(
        &mut self,
        word: &Word,
        quoted: bool,
        part_vals: &mut Vec<PartValue>,
        is_subst: bool,
    ) -> Result<()> {
        if word.parts.is_empty() {
            part_vals.push(PartValue::string("", quoted, !quoted));
            return Ok(());
        }
        for part in &word.parts {
            self.eval_word_part(part, part_vals, quoted, is_subst)?;
        }
        Ok(())
    }

    /// Turns one frame into zero or more argv entries.
    fn eval_word_frame(&mut self, frame: &[Fragment], argv: &mut Vec<String>) -> Result<()> {
        let mut all_empty = true;
        let mut all_quoted = true;
        let mut any_quoted = false;
        for fragment in frame {
            if !fragment.text.is_empty() {
                all_empty = false;
            }
            if fragment.quoted {
                any_quoted = true;
            } else {
                all_quoted = false;
            }
        }

        // ${empty}${empty} elides, but $empty"$empty" and $empty"" don't.
        if all_empty && !any_quoted {
            return Ok(());
        }

        // "$a$b", or any part of "${a[@]}"x: no splitting, no globbing.
        if all_quoted {
            let arg: String = frame.iter().map(|f| f.text.as_str()).collect();
            argv.push(arg);
            return Ok(());
        }

        let will_glob = !self.env.options.is_on(NoGlob);

        // Fragments can be BOTH separator-escaped and glob-escaped.
        let mut flat = String::new();
        for fragment in frame {
            let escaped = if will_glob && fragment.quoted {
                glob::escape(&fragment.text)
            } else {
                // A literal \ becomes \\\\: splitting takes \\\\ to \\,
                // and globbing takes \\ to \ when nothing matches.
                backslash_escape(&fragment.text)
            };
            let escaped = if fragment.do_split {
                backslash_escape(&escaped)
            } else {
                split::escape(self.env, &escaped)
            };
            flat.push_str(&escaped);
        }

        let args = split::split_for_word_eval(self.env, &flat);

        // space=' '; argv $space"": there is a quoted part, so one empty
        // argument survives even though splitting produced none.
        if args.is_empty() && any_quoted {
            argv.push(String::new());
            return Ok(());
        }

        for arg in args {
            glob::expand(self.env, &arg, argv);
        }
        Ok(())
    }

    /// Evaluates one word to arguments with neither splitting nor
    /// globbing.
    ///
    /// This is how the words of an assignment builtin are seen, e.g.
    /// `declare -"${flags[@]}" x=1`.
    fn eval_word_to_argv(&mut self, word: &Word) -> Result<Vec<String>> {
        let mut part_vals = Vec::new();
        self.eval_word_to_parts(word, false, &mut part_vals, false)?;
        let mut argv = Vec::new();
        for frame in make_frames(part_vals) {
            // An empty array gives an empty frame, which gives nothing.
            if !frame.is_empty() {
                argv.push(frame.iter().map(|f| f.text.as_str()).collect());
            }
        }
        Ok(argv)
    }

    /// Parses the words of an assignment-builtin invocation.
    ///
    /// Handles both static and dynamic assignments:
    ///
    /// ```text
    /// x='foo=bar'
    /// local a=(1 2) $x
    /// ```
    fn eval_assign_builtin(
        &mut self,
        builtin: Id,
        arg0: String,
        words: &[Word],
    ) -> Result<CmdValue> {
        // Grammar: builtin-name flag* pair*, where flag is [-+].*
        let mut eval_to_pairs = true; // false after -f or -F
        let mut started_pairs = false;

        let mut flags = vec![arg0];
        let mut flag_locations = vec![words[0].location.clone()];
        let mut args = Vec::new();

        for word in &words[1..] {
            let location = word.location.clone();

            if word.is_var_like() {
                // Everything from now on is an assignment pair.
                started_pairs = true;
            }

            if started_pairs {
                if let Some((left, rhs_word)) = word.detect_assignment() {
                    let name = left.text.strip_suffix('=').unwrap_or(&left.text);
                    if name.ends_with('+') {
                        return Err(Error {
                            cause: ErrorCause::PlusEqualInAssignBuiltin,
                            location,
                        });
                    }
                    let value = self.eval_rhs_word(&rhs_word)?;
                    args.push(AssignArg {
                        name: name.to_string(),
                        value: Some(value),
                        location,
                    });
                } else {
                    // e.g. export $dynamic
                    for arg in self.eval_word_to_argv(word)? {
                        let (name, value) = split_assign_arg(&arg, word)?;
                        args.push(AssignArg {
                            name,
                            value,
                            location: location.clone(),
                        });
                    }
                }
            } else {
                for arg in self.eval_word_to_argv(word)? {
                    if arg.starts_with('-') || arg.starts_with('+') {
                        // -f and -F mean "function" for every assignment
                        // builtin; the remaining arguments are names, not
                        // pairs.
                        if arg.contains(['f', 'F']) {
                            eval_to_pairs = false;
                        }
                        flags.push(arg);
                        flag_locations.push(location.clone());
                    } else if eval_to_pairs {
                        let (name, value) = split_assign_arg(&arg, word)?;
                        args.push(AssignArg {
                            name,
                            value,
                            location: location.clone(),
                        });
                        started_pairs = true;
                    } else {
                        flags.push(arg);
                        flag_locations.push(location.clone());
                    }
                }
            }
        }

        Ok(CmdValue::Assign {
            builtin,
            flags,
            flag_locations,
            args,
        })
    }

    /// Turns a list of words into a command value, expanding, splitting,
    /// and globbing, and detecting assignment builtins in the first word
    /// when `allow_assign` is set.
    pub fn eval_word_sequence2(&mut self, words: &[Word], allow_assign: bool) -> Result<CmdValue> {
        if self.env.options.is_on(SimpleWordEval) {
            return self.simple_eval_word_sequence2(words, allow_assign);
        }

        let mut argv: Vec<String> = Vec::new();
        let mut locations = Vec::new();
        let mut n = 0;

        for (i, word) in words.iter().enumerate() {
            let mut part_vals = Vec::new();
            self.eval_word_to_parts(word, false, &mut part_vals, false)?;

            // Dynamically detect an assignment builtin and change the rest
            // of the algorithm. `e=export; $e foo=bar` must work, but the
            // first word is not evaluated twice for `$(some-command) --flag`.
            if allow_assign && i == 0 && part_vals.len() == 1 {
                if let PartValue::String {
                    s, quoted: false, ..
                } = &part_vals[0]
                {
                    if let Some(builtin) = lookup_assign_builtin(s) {
                        let arg0 = s.clone();
                        return self.eval_assign_builtin(builtin, arg0, words);
                    }
                }
            }

            for frame in make_frames(part_vals) {
                self.eval_word_frame(&frame, &mut argv)?;
            }

            for _ in n..argv.len() {
                locations.push(word.location.clone());
            }
            n = argv.len();
        }

        // NOTE: Non-assignment builtins can't be looked up here, because
        // functions can override them.
        Ok(CmdValue::Argv { argv, locations })
    }

    /// The `simple_word_eval` variant: one fragment list is one argument.
    /// No field splitting; no globbing except static globs.
    fn simple_eval_word_sequence2(
        &mut self,
        words: &[Word],
        allow_assign: bool,
    ) -> Result<CmdValue> {
        let mut argv: Vec<String> = Vec::new();
        let mut locations = Vec::new();

        for (i, word) in words.iter().enumerate() {
            // No globbing in the first word of a command.
            if i == 0 && allow_assign {
                let strs0 = self.eval_word_to_argv(word)?;
                if let [arg0] = strs0.as_slice() {
                    if let Some(builtin) = lookup_assign_builtin(arg0) {
                        let arg0 = arg0.clone();
                        return self.eval_assign_builtin(builtin, arg0, words);
                    }
                }
                for s in strs0 {
                    argv.push(s);
                    locations.push(word.location.clone());
                }
                continue;
            }

            if glob::looks_like_static_glob(word) {
                let pat = self.eval_word_to_string(word, QuoteKind::Default)?;
                let count = glob::expand(self.env, &pat, &mut argv);
                for _ in 0..count {
                    locations.push(word.location.clone());
                }
                continue;
            }

            let mut part_vals = Vec::new();
            self.eval_word_to_parts(word, false, &mut part_vals, false)?;
            for frame in make_frames(part_vals) {
                if !frame.is_empty() {
                    argv.push(frame.iter().map(|f| f.text.as_str()).collect());
                    locations.push(word.location.clone());
                }
            }
        }

        Ok(CmdValue::Argv { argv, locations })
    }
}

/// Converts an expression-language value into a part value.
fn expr_value_to_part_value(value: ExprValue, quoted: bool, splice: bool) -> PartValue {
    match (value, splice) {
        (ExprValue::Array(items), true) => {
            PartValue::Array(items.into_iter().map(Some).collect())
        }
        (ExprValue::Str(s), true) => PartValue::Array(vec![Some(s)]),
        (ExprValue::Str(s), false) => PartValue::string(s, quoted, !quoted),
        // An unspliced call stringifies its result.
        (ExprValue::Array(items), false) => PartValue::string(items.join(" "), quoted, !quoted),
    }
}

/// Splits a dynamic assignment argument into a name and an optional value.
fn split_assign_arg(arg: &str, blame: &Word) -> Result<(String, Option<Value>)> {
    if let Some(eq) = arg.find('=') {
        let name = &arg[..eq];
        if super::is_valid_var_name(name) {
            return Ok((name.to_string(), Some(Value::scalar(&arg[eq + 1..]))));
        }
    }
    if super::is_valid_var_name(arg) {
        // e.g. `local foo`: foo becomes defined but unset.
        Ok((arg.to_string(), None))
    } else {
        Err(Error {
            cause: ErrorCause::InvalidVariableName(arg.to_string()),
            location: blame.location.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{dq, lit, lit_word, var_like, TestContext};
    use assert_matches::assert_matches;
    use marsh_env::option::State::On;
    use marsh_env::variable::Variable;
    use marsh_syntax::syntax::Token;

    #[test]
    fn split_assign_arg_forms() {
        let blame = lit_word("x");
        assert_eq!(
            split_assign_arg("foo=bar", &blame).unwrap(),
            ("foo".to_string(), Some(Value::scalar("bar")))
        );
        assert_eq!(
            split_assign_arg("foo=", &blame).unwrap(),
            ("foo".to_string(), Some(Value::scalar("")))
        );
        assert_eq!(
            split_assign_arg("foo", &blame).unwrap(),
            ("foo".to_string(), None)
        );
        assert_matches!(
            split_assign_arg("1bad=x", &blame).unwrap_err().cause,
            ErrorCause::InvalidVariableName(_)
        );
        assert_matches!(
            split_assign_arg("no/name", &blame).unwrap_err().cause,
            ErrorCause::InvalidVariableName(_)
        );
    }

    #[test]
    fn word_to_argv_joins_without_splitting() {
        let mut fixture = TestContext::default();
        fixture
            .env
            .variables
            .define("v", Variable::new("a b"));
        let mut evaluator = fixture.evaluator();
        let word = Word::from_parts(vec![crate::tests::simple_var("v"), lit("x")]);
        assert_eq!(evaluator.eval_word_to_argv(&word).unwrap(), ["a bx"]);
    }

    #[test]
    fn static_assignment_builtin() {
        let mut fixture = TestContext::default();
        let mut evaluator = fixture.evaluator();
        let words = [
            lit_word("declare"),
            lit_word("-r"),
            Word::from_parts(vec![var_like("foo="), lit("bar")]),
        ];
        let result = evaluator.eval_word_sequence2(&words, true).unwrap();
        assert_matches!(result, CmdValue::Assign { builtin, flags, args, .. } => {
            assert_eq!(builtin, Id::AssignDeclare);
            assert_eq!(flags, ["declare", "-r"]);
            assert_eq!(args.len(), 1);
            assert_eq!(args[0].name, "foo");
            assert_eq!(args[0].value, Some(Value::scalar("bar")));
        });
    }

    #[test]
    fn assignment_builtin_rhs_is_not_globbed() {
        let mut fixture = TestContext::default();
        let mut evaluator = fixture.evaluator();
        let words = [
            lit_word("export"),
            Word::from_parts(vec![var_like("pat="), lit("*")]),
        ];
        let result = evaluator.eval_word_sequence2(&words, true).unwrap();
        assert_matches!(result, CmdValue::Assign { args, .. } => {
            assert_eq!(args[0].value, Some(Value::scalar("*")));
        });
    }

    #[test]
    fn assignment_builtin_array_literal_rhs() {
        let mut fixture = TestContext::default();
        let mut evaluator = fixture.evaluator();
        let rhs = WordPart::ArrayLiteral {
            words: vec![lit_word("1"), lit_word("2")],
            location: marsh_syntax::source::Location::dummy("(1 2)"),
        };
        let words = [
            lit_word("declare"),
            Word::from_parts(vec![var_like("a="), rhs]),
        ];
        let result = evaluator.eval_word_sequence2(&words, true).unwrap();
        assert_matches!(result, CmdValue::Assign { args, .. } => {
            assert_eq!(args[0].value, Some(Value::array(["1", "2"])));
        });
    }

    #[test]
    fn dynamic_assignment_builtin() {
        let mut fixture = TestContext::default();
        fixture.env.variables.define("e", Variable::new("export"));
        fixture
            .env
            .variables
            .define("pair", Variable::new("foo=bar"));
        let mut evaluator = fixture.evaluator();
        let words = [
            Word::from_parts(vec![crate::tests::simple_var("e")]),
            Word::from_parts(vec![crate::tests::simple_var("pair")]),
        ];
        let result = evaluator.eval_word_sequence2(&words, true).unwrap();
        assert_matches!(result, CmdValue::Assign { builtin, args, .. } => {
            assert_eq!(builtin, Id::AssignExport);
            assert_eq!(args[0].name, "foo");
            assert_eq!(args[0].value, Some(Value::scalar("bar")));
        });
    }

    #[test]
    fn quoted_first_word_is_not_an_assignment_builtin() {
        let mut fixture = TestContext::default();
        let mut evaluator = fixture.evaluator();
        let words = [Word::from_parts(vec![dq(&[lit("export")])]), lit_word("x")];
        let result = evaluator.eval_word_sequence2(&words, true).unwrap();
        assert_matches!(result, CmdValue::Argv { argv, .. } => {
            assert_eq!(argv, ["export", "x"]);
        });
    }

    #[test]
    fn plus_equals_is_rejected() {
        let mut fixture = TestContext::default();
        let mut evaluator = fixture.evaluator();
        let words = [
            lit_word("declare"),
            Word::from_parts(vec![var_like("foo+="), lit("x")]),
        ];
        let e = evaluator.eval_word_sequence2(&words, true).unwrap_err();
        assert_eq!(e.cause, ErrorCause::PlusEqualInAssignBuiltin);
    }

    #[test]
    fn function_flags_stop_pair_parsing() {
        let mut fixture = TestContext::default();
        let mut evaluator = fixture.evaluator();
        let words = [
            lit_word("declare"),
            lit_word("-f"),
            lit_word("my_func"),
        ];
        let result = evaluator.eval_word_sequence2(&words, true).unwrap();
        assert_matches!(result, CmdValue::Assign { flags, args, .. } => {
            assert_eq!(flags, ["declare", "-f", "my_func"]);
            assert_eq!(args, []);
        });
    }

    #[test]
    fn empty_unquoted_expansion_elides() {
        let mut fixture = TestContext::default();
        fixture.env.variables.define("empty", Variable::new(""));
        let mut evaluator = fixture.evaluator();
        let words = [
            Word::from_parts(vec![crate::tests::simple_var("empty")]),
            lit_word("x"),
        ];
        let result = evaluator.eval_word_sequence2(&words, false).unwrap();
        assert_matches!(result, CmdValue::Argv { argv, locations } => {
            assert_eq!(argv, ["x"]);
            assert_eq!(locations.len(), 1);
        });
    }

    #[test]
    fn empty_quotes_survive() {
        let mut fixture = TestContext::default();
        let mut evaluator = fixture.evaluator();
        let words = [Word::from_parts(vec![dq(&[])])];
        let result = evaluator.eval_word_sequence2(&words, false).unwrap();
        assert_matches!(result, CmdValue::Argv { argv, .. } => {
            assert_eq!(argv, [""]);
        });
    }

    #[test]
    fn quoted_empty_next_to_split_space() {
        // space=' '; argv $space"" must keep one empty argument.
        let mut fixture = TestContext::default();
        fixture.env.variables.define("space", Variable::new(" "));
        let mut evaluator = fixture.evaluator();
        let words = [Word::from_parts(vec![
            crate::tests::simple_var("space"),
            dq(&[]),
        ])];
        let result = evaluator.eval_word_sequence2(&words, false).unwrap();
        assert_matches!(result, CmdValue::Argv { argv, .. } => {
            assert_eq!(argv, [""]);
        });
    }

    #[test]
    fn simple_mode_skips_splitting() {
        let mut fixture = TestContext::default();
        fixture.env.options.set(SimpleWordEval, On);
        fixture
            .env
            .variables
            .define("v", Variable::new("a b"));
        let mut evaluator = fixture.evaluator();
        let words = [
            lit_word("echo"),
            Word::from_parts(vec![crate::tests::simple_var("v")]),
        ];
        let result = evaluator.eval_word_sequence2(&words, true).unwrap();
        assert_matches!(result, CmdValue::Argv { argv, .. } => {
            assert_eq!(argv, ["echo", "a b"]);
        });
    }

    #[test]
    fn backtick_and_dollar_paren_substitute_output() {
        let mut fixture = TestContext::default();
        fixture
            .executor
            .command_outputs
            .insert("echo hi".to_string(), "hi".to_string());
        let mut evaluator = fixture.evaluator();
        let word = Word::from_parts(vec![WordPart::CommandSub {
            left: Id::LeftDollarParen,
            body: "echo hi".to_string(),
            location: marsh_syntax::source::Location::dummy("$(echo hi)"),
        }]);
        assert_eq!(
            evaluator.eval_word_to_string(&word, QuoteKind::Default).unwrap(),
            "hi"
        );
    }

    #[test]
    fn at_paren_substitution_splits_into_fields() {
        let mut fixture = TestContext::default();
        fixture
            .executor
            .command_outputs
            .insert("seq".to_string(), "1 2 3".to_string());
        let mut evaluator = fixture.evaluator();
        let words = [Word::from_parts(vec![WordPart::CommandSub {
            left: Id::LeftAtParen,
            body: "seq".to_string(),
            location: marsh_syntax::source::Location::dummy("@(seq)"),
        }])];
        let result = evaluator.eval_word_sequence2(&words, false).unwrap();
        assert_matches!(result, CmdValue::Argv { argv, .. } => {
            assert_eq!(argv, ["1", "2", "3"]);
        });
    }

    #[test]
    fn splice_expands_array_entries() {
        let mut fixture = TestContext::default();
        fixture
            .env
            .variables
            .define("a", Variable::new_array(["x", "y z"]));
        let mut evaluator = fixture.evaluator();
        let words = [Word::from_parts(vec![WordPart::Splice(Token::dummy(
            Id::LitSplice,
            "a",
        ))])];
        let result = evaluator.eval_word_sequence2(&words, false).unwrap();
        assert_matches!(result, CmdValue::Argv { argv, .. } => {
            assert_eq!(argv, ["x", "y z"]);
        });
    }

    #[test]
    fn splice_of_scalar_is_fatal() {
        let mut fixture = TestContext::default();
        fixture.env.variables.define("s", Variable::new("x"));
        let mut evaluator = fixture.evaluator();
        let words = [Word::from_parts(vec![WordPart::Splice(Token::dummy(
            Id::LitSplice,
            "s",
        ))])];
        let e = evaluator.eval_word_sequence2(&words, false).unwrap_err();
        assert_matches!(e.cause, ErrorCause::CannotSplice(name) if name == "s");
    }
}
