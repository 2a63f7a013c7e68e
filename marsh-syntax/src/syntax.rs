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

//! Word AST
//!
//! A [`Word`] is the syntactic unit that expands to zero or more command
//! arguments. Words are trees: a word is a sequence of [`WordPart`]s, and
//! parts like double quotes and braced parameters contain further words.
//!
//! The parser produces these nodes; the word evaluator consumes them. Bodies
//! of command, process, and arithmetic substitutions are carried as source
//! text because their structure belongs to the executor and the arithmetic
//! evaluator, not to word evaluation.

use crate::id::Id;
use crate::source::Location;

/// Token with its identifier, text, and origin.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Token {
    /// Identifier classifying the token.
    pub id: Id,
    /// Text of the token as written in the source.
    pub text: String,
    /// Position of the token in the source code.
    pub location: Location,
}

impl Token {
    /// Creates a token with a dummy location, for use in tests.
    #[must_use]
    pub fn dummy<S: Into<String>>(id: Id, text: S) -> Token {
        let text = text.into();
        let location = Location::dummy(text.clone());
        Token { id, text, location }
    }
}

/// Element of a word.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum WordPart {
    /// Literal run of characters.
    Literal(Token),
    /// Backslash-escaped single character. The token text includes the
    /// backslash, e.g. `\*`.
    EscapedLiteral(Token),
    /// Single-quoted string; the text excludes the quotes.
    SingleQuoted { text: String, location: Location },
    /// Double-quoted sequence of parts. An empty `""` has no parts but still
    /// produces one empty field.
    DoubleQuoted { parts: Vec<WordPart>, location: Location },
    /// Parameter expansion not enclosed in braces, e.g. `$foo`, `$1`, `$@`.
    ///
    /// The token id distinguishes named ([`Id::VSubDollarName`], text is the
    /// name without `$`), positional ([`Id::VSubNumber`]), and special
    /// parameters (`Id::VSubAt` and friends).
    SimpleVarSub(Token),
    /// Parameter expansion enclosed in braces, `${...}`.
    BracedVarSub(Box<BracedParam>),
    /// Tilde expansion, `~` or `~user`.
    TildeSub(Token),
    /// Command or process substitution. `left` tells the flavor:
    /// [`Id::LeftDollarParen`] and [`Id::LeftBacktick`] capture output,
    /// [`Id::LeftAtParen`] captures and splits it, and
    /// [`Id::LeftProcSubIn`]/[`Id::LeftProcSubOut`] substitute a device path.
    CommandSub {
        left: Id,
        body: String,
        location: Location,
    },
    /// Arithmetic substitution, `$((expr))`.
    ArithSub { expr: String, location: Location },
    /// Extended glob operator with its alternatives, e.g. `@(foo|bar)`.
    ExtGlob { op: Token, arms: Vec<Word> },
    /// Array splice, `@name`. The token text is the name without `@`.
    Splice(Token),
    /// Expression substitution from the extension language, `$[expr]`.
    ExprSub { expr: String, location: Location },
    /// Function call from the extension language, `$f(args)` or `@f(args)`.
    /// A name token with id [`Id::LitSplice`] splices the returned sequence.
    FuncCall {
        name: Token,
        args: String,
        location: Location,
    },
    /// Array literal, `(one two three)`. Only valid on the right-hand side
    /// of an assignment.
    ArrayLiteral { words: Vec<Word>, location: Location },
    /// Associative array literal, `([key]=value ...)`. Only valid on the
    /// right-hand side of an assignment.
    AssocArrayLiteral {
        pairs: Vec<(Word, Word)>,
        location: Location,
    },
}

/// Selects how the value being substituted is chosen in a pattern
/// substitution.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PatSubMode {
    /// Replace the first match, `${v/pat/rep}`.
    First,
    /// Replace every match, `${v//pat/rep}`.
    All,
    /// Replace a match anchored at the beginning, `${v/#pat/rep}`.
    Prefix,
    /// Replace a match anchored at the end, `${v/%pat/rep}`.
    Suffix,
}

/// Operator applied before the suffix operator in a braced parameter.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PrefixOp {
    /// `${#v}`: length of the value.
    Length,
    /// `${!v}`: indirect expansion through the value.
    Indirect,
}

/// Subscript operator in a braced parameter.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BracketOp {
    /// `[@]` ([`Id::VSubAt`]) or `[*]` ([`Id::ArithStar`]).
    WholeArray(Id),
    /// `[expr]`: an arithmetic expression, or an arbitrary key for
    /// associative arrays.
    ArrayIndex(String),
}

/// Operator applied after the bracket and prefix operators in a braced
/// parameter.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SuffixOp {
    /// Operator with no argument: the formatters `@P`, `@Q`, `@a`
    /// (kind [`VOp0`](crate::id::Kind::VOp0)) and the name-listing `@`/`*`
    /// of `${!prefix@}` (kind [`VOp3`](crate::id::Kind::VOp3)).
    Nullary(Token),
    /// Operator with one word argument: the test/default family
    /// (kind [`VTest`](crate::id::Kind::VTest)) and the trim and case
    /// operators (kind [`VOp1`](crate::id::Kind::VOp1)).
    Unary { op: Token, arg: Word },
    /// Pattern substitution, `${v/pat/rep}` and variants.
    PatSub {
        pat: Word,
        replace: Option<Word>,
        mode: PatSubMode,
        location: Location,
    },
    /// Slice, `${v:begin}` or `${v:begin:length}`. Bounds are arithmetic
    /// expressions.
    Slice {
        begin: Option<String>,
        length: Option<String>,
        location: Location,
    },
}

/// Parameter expansion enclosed in braces.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BracedParam {
    /// The parameter itself: a name ([`Id::VSubName`]), a positional number
    /// ([`Id::VSubNumber`]), or a special parameter id.
    pub token: Token,
    /// Optional `#` or `!` before the name.
    pub prefix_op: Option<PrefixOp>,
    /// Optional subscript after the name.
    pub bracket_op: Option<BracketOp>,
    /// Optional operator after the subscript.
    pub suffix_op: Option<SuffixOp>,
    /// Position of the whole `${...}` in the source code.
    pub location: Location,
}

/// Compound word: a sequence of parts that expands to zero or more fields.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Word {
    /// Parts of the word, in source order. An empty list is the empty word,
    /// which expands to one empty field when quoted context requires it.
    pub parts: Vec<WordPart>,
    /// Position of the word in the source code.
    pub location: Location,
}

impl Word {
    /// Creates a word from parts with a dummy location, for use in tests.
    #[must_use]
    pub fn from_parts(parts: Vec<WordPart>) -> Word {
        Word {
            parts,
            location: Location::dummy(""),
        }
    }

    /// Returns the literal text of the word if it consists of exactly one
    /// unquoted literal part.
    ///
    /// Assignment-builtin detection and static-glob detection look at words
    /// through this lens.
    #[must_use]
    pub fn as_literal(&self) -> Option<&Token> {
        match self.parts.as_slice() {
            [WordPart::Literal(token)] => Some(token),
            _ => None,
        }
    }

    /// Whether this word starts like a `name=value` assignment.
    ///
    /// The lexer marks such prefixes with [`Id::LitVarLike`] tokens.
    #[must_use]
    pub fn is_var_like(&self) -> bool {
        matches!(
            self.parts.first(),
            Some(WordPart::Literal(token)) if token.id == Id::LitVarLike
        )
    }

    /// Splits a `name=rest...` word into the left token and the right-hand
    /// side word.
    ///
    /// Returns `None` when the word does not start with a
    /// [`Id::LitVarLike`] token, i.e. when the assignment (if any) can only
    /// be discovered dynamically after expansion.
    #[must_use]
    pub fn detect_assignment(&self) -> Option<(&Token, Word)> {
        match self.parts.first() {
            Some(WordPart::Literal(token)) if token.id == Id::LitVarLike => {
                let rhs = Word {
                    parts: self.parts[1..].to_vec(),
                    location: self.location.clone(),
                };
                Some((token, rhs))
            }
            _ => None,
        }
    }
}
