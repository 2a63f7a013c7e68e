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

//! Token and operator identifiers
//!
//! Every token and operator the shell runtime dispatches on is a variant of
//! the flat [`Id`] enum. Each id belongs to exactly one [`Kind`], a coarse
//! category used to make dispatch decisions without enumerating every id
//! (for example, the braced-parameter evaluator asks whether a suffix
//! operator's kind is [`Kind::VTest`] before it asks which operator it is).
//!
//! The id-to-kind and id-to-name mappings are generated together by one
//! declarative table, so an id without a kind or a name cannot exist.
//!
//! This module also owns the side tables keyed by id:
//!
//! - [`redir_default_fd`]: the file descriptor a redirection operator
//!   applies to when none is written (`<file` means `0<file`).
//! - [`redir_kind`]: whether a redirection operand is a pathname, a
//!   descriptor, or a here-document body.
//! - [`bool_op_operand`]: the operand category of each `test`/`[[`
//!   operator.
//! - [`lookup_assign_builtin`]: the command names that route word
//!   evaluation down the assignment path.

/// Generates [`Id`], [`Kind`], and the total mappings between them.
///
/// Each entry of the table is `Kind { Variant, ... }`. The generated
/// [`Id::kind`] and [`Id::name`] functions are exhaustive matches, so adding
/// an id in one place keeps every mapping total.
macro_rules! id_registry {
    ( $( $kind:ident { $( $id:ident ),* $(,)? } )* ) => {
        /// Coarse category of an [`Id`].
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        pub enum Kind {
            $( $kind, )*
        }

        /// Identifier of a token or operator.
        ///
        /// Ids are cheap copyable tags; equality is identity.
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        pub enum Id {
            $( $( $id, )* )*
        }

        impl Id {
            /// All ids, in declaration order.
            pub const ALL: &'static [Id] = &[ $( $( Id::$id, )* )* ];

            /// Returns the kind this id belongs to.
            #[must_use]
            pub const fn kind(self) -> Kind {
                match self {
                    $( $( Id::$id => Kind::$kind, )* )*
                }
            }

            /// Returns the name of this id.
            ///
            /// Names are unique and non-empty; they appear in diagnostics and
            /// traces.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $( $( Id::$id => stringify!($id), )* )*
                }
            }
        }
    };
}

id_registry! {
    Undefined { UndefinedTok }
    Unknown { UnknownTok }
    Eol { EolTok }
    Eof { EofReal, EofRParen, EofBacktick }
    Ignored { IgnoredLineCont, IgnoredSpace, IgnoredComment }
    Ws { WsSpace }
    Lit {
        LitChars, LitVarLike, LitOther, LitEscapedChar,
        LitLBrace, LitRBrace, LitComma,
        LitDRightBracket,
        LitTilde,
        LitPound,
        LitSlash, LitPercent,
        LitDigits,
        LitAt,
        LitArithVarLike,
        LitSplice,
    }
    Op {
        OpNewline, OpAmp, OpPipe, OpPipeAmp, OpDAmp, OpDPipe, OpSemi, OpDSemi,
        OpLParen, OpRParen, OpDLeftParen, OpDRightParen,
    }
    Redir {
        RedirLess, RedirGreat, RedirDLess, RedirTLess, RedirDGreat,
        RedirGreatAnd, RedirLessAnd, RedirDLessDash, RedirLessGreat,
        RedirClobber,
    }
    Left {
        LeftDoubleQuote, LeftSingleQuote, LeftBacktick,
        LeftDollarParen, LeftAtParen,
        LeftVarSub, LeftArithSub,
        LeftDollarDoubleQuote, LeftDollarSingleQuote,
        LeftProcSubIn, LeftProcSubOut,
    }
    Right {
        RightDoubleQuote, RightSingleQuote, RightBacktick,
        RightDollarParen, RightVarSub, RightArithSub,
        RightDollarDoubleQuote, RightDollarSingleQuote,
        RightSubshell, RightFuncDef, RightCasePat, RightArrayLiteral,
        RightExtGlob,
    }
    ExtGlob { ExtGlobAt, ExtGlobStar, ExtGlobPlus, ExtGlobQMark, ExtGlobBang, ExtGlobComma }
    VSub {
        VSubName, VSubDollarName, VSubNumber,
        VSubBang, VSubAt, VSubPound, VSubDollar, VSubStar, VSubHyphen,
        VSubQMark,
    }
    VTest {
        VTestColonHyphen, VTestHyphen,
        VTestColonEquals, VTestEquals,
        VTestColonQMark, VTestQMark,
        VTestColonPlus, VTestPlus,
    }
    VOp0 { VOp0P, VOp0Q, VOp0A }
    VOp1 {
        VOp1Percent, VOp1DPercent,
        VOp1Pound, VOp1DPound,
        VOp1Caret, VOp1DCaret,
        VOp1Comma, VOp1DComma,
    }
    VOp2 { VOp2Slash, VOp2Colon, VOp2LBracket, VOp2RBracket }
    VOp3 { VOp3At, VOp3Star }
    Arith {
        ArithSemi, ArithComma,
        ArithPlus, ArithMinus, ArithStar, ArithSlash, ArithPercent,
        ArithDPlus, ArithDMinus, ArithDStar,
        ArithLParen, ArithRParen, ArithLBracket, ArithRBracket, ArithRBrace,
        ArithQMark, ArithColon,
        ArithLessEqual, ArithLess, ArithGreatEqual, ArithGreat,
        ArithDEqual, ArithNEqual,
        ArithDAmp, ArithDPipe, ArithBang,
        ArithDGreat, ArithDLess,
        ArithAmp, ArithPipe, ArithCaret, ArithTilde,
        ArithEqual,
        ArithPlusEqual, ArithMinusEqual, ArithStarEqual, ArithSlashEqual,
        ArithPercentEqual,
        ArithDGreatEqual, ArithDLessEqual,
        ArithAmpEqual, ArithPipeEqual, ArithCaretEqual,
    }
    Word { WordCompound }
    Kw {
        KwDLeftBracket, KwBang,
        KwFor, KwWhile, KwUntil, KwDo, KwDone, KwIn, KwCase,
        KwEsac, KwIf, KwFi, KwThen, KwElse, KwElif, KwFunction,
        KwTime,
    }
    Assign { AssignDeclare, AssignTypeset, AssignLocal, AssignReadonly, AssignExport, AssignNone }
    ControlFlow { ControlFlowBreak, ControlFlowContinue, ControlFlowReturn }
    BoolUnary {
        BoolUnaryZ, BoolUnaryN,
        BoolUnaryO, BoolUnaryV, BoolUnaryUpperR,
        BoolUnaryA, BoolUnaryB, BoolUnaryC, BoolUnaryD, BoolUnaryE,
        BoolUnaryF, BoolUnaryG, BoolUnaryH, BoolUnaryUpperL, BoolUnaryP,
        BoolUnaryR, BoolUnaryS, BoolUnaryUpperS, BoolUnaryT, BoolUnaryU,
        BoolUnaryW, BoolUnaryX, BoolUnaryUpperO, BoolUnaryUpperG,
        BoolUnaryUpperN,
    }
    BoolBinary {
        BoolBinaryGlobEqual, BoolBinaryGlobDEqual, BoolBinaryGlobNEqual,
        BoolBinaryEqualTilde,
        BoolBinaryEf, BoolBinaryNt, BoolBinaryOt,
        BoolBinaryEq, BoolBinaryNe, BoolBinaryGt, BoolBinaryGe,
        BoolBinaryLt, BoolBinaryLe,
        BoolBinaryEqual, BoolBinaryDEqual, BoolBinaryNEqual,
    }
}

/// What a redirection operator's operand denotes.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RedirKind {
    /// The operand is a pathname to open.
    Path,
    /// The operand is a file descriptor to duplicate.
    Desc,
    /// The operand introduces a here-document or here-string body.
    Here,
}

/// Returns the default file descriptor of a redirection operator.
///
/// `cat <input.txt` means `cat 0<input.txt`; `echo >&2` means `echo 1>&2`.
/// Returns `None` for ids that are not redirection operators.
#[must_use]
pub const fn redir_default_fd(id: Id) -> Option<i32> {
    match id {
        Id::RedirLess | Id::RedirLessAnd => Some(0),
        Id::RedirTLess | Id::RedirDLess | Id::RedirDLessDash => Some(0),
        Id::RedirGreat | Id::RedirDGreat | Id::RedirClobber => Some(1),
        Id::RedirLessGreat => Some(1),
        Id::RedirGreatAnd => Some(1),
        _ => None,
    }
}

/// Returns what kind of operand a redirection operator takes.
///
/// Returns `None` for ids that are not redirection operators.
#[must_use]
pub const fn redir_kind(id: Id) -> Option<RedirKind> {
    match id {
        Id::RedirLess | Id::RedirGreat | Id::RedirDGreat | Id::RedirClobber
        | Id::RedirLessGreat => Some(RedirKind::Path),
        Id::RedirGreatAnd | Id::RedirLessAnd => Some(RedirKind::Desc),
        Id::RedirTLess | Id::RedirDLess | Id::RedirDLessDash => Some(RedirKind::Here),
        _ => None,
    }
}

/// Operand category of a `test` / `[[` operator.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum OperandKind {
    /// Not a test operator, or a logical connective with no operand of its
    /// own (`&&`, `||`, `!`).
    Undefined,
    /// The operand is a pathname to stat.
    Path,
    /// The operand is an integer.
    Int,
    /// The operand is a plain string (possibly matched as a pattern).
    Str,
    /// The operand is something else (an option name, a variable name, ...).
    Other,
}

/// Returns the operand category of a `test` / `[[` operator.
#[must_use]
pub const fn bool_op_operand(id: Id) -> OperandKind {
    match id {
        // -z -n, string comparisons, and the redirection-shaped sort
        // operators `<` and `>` all take strings.
        Id::BoolUnaryZ | Id::BoolUnaryN => OperandKind::Str,
        Id::BoolBinaryGlobEqual | Id::BoolBinaryGlobDEqual | Id::BoolBinaryGlobNEqual
        | Id::BoolBinaryEqualTilde => OperandKind::Str,
        Id::BoolBinaryEqual | Id::BoolBinaryDEqual | Id::BoolBinaryNEqual => OperandKind::Str,
        Id::RedirLess | Id::RedirGreat => OperandKind::Str,

        // -o is an option name, -v a variable name, -R a nameref.
        Id::BoolUnaryO | Id::BoolUnaryV | Id::BoolUnaryUpperR => OperandKind::Other,

        // File tests.
        Id::BoolUnaryA | Id::BoolUnaryB | Id::BoolUnaryC | Id::BoolUnaryD
        | Id::BoolUnaryE | Id::BoolUnaryF | Id::BoolUnaryG | Id::BoolUnaryH
        | Id::BoolUnaryUpperL | Id::BoolUnaryP | Id::BoolUnaryR | Id::BoolUnaryS
        | Id::BoolUnaryUpperS | Id::BoolUnaryT | Id::BoolUnaryU | Id::BoolUnaryW
        | Id::BoolUnaryX | Id::BoolUnaryUpperO | Id::BoolUnaryUpperG
        | Id::BoolUnaryUpperN => OperandKind::Path,
        Id::BoolBinaryEf | Id::BoolBinaryNt | Id::BoolBinaryOt => OperandKind::Path,

        Id::BoolBinaryEq | Id::BoolBinaryNe | Id::BoolBinaryGt | Id::BoolBinaryGe
        | Id::BoolBinaryLt | Id::BoolBinaryLe => OperandKind::Int,

        _ => OperandKind::Undefined,
    }
}

/// Looks up a command name in the assignment-builtin table.
///
/// Assignment builtins are parsed like commands but bind variables with
/// assignment semantics, so the word evaluator routes them specially.
#[must_use]
pub fn lookup_assign_builtin(name: &str) -> Option<Id> {
    match name {
        "declare" => Some(Id::AssignDeclare),
        "typeset" => Some(Id::AssignTypeset),
        "local" => Some(Id::AssignLocal),
        "readonly" => Some(Id::AssignReadonly),
        "export" => Some(Id::AssignExport),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_id_has_a_unique_nonempty_name() {
        let mut seen = HashSet::new();
        for &id in Id::ALL {
            let name = id.name();
            assert!(!name.is_empty(), "{id:?}");
            assert!(seen.insert(name), "duplicate name {name}");
        }
    }

    #[test]
    fn kinds_of_representative_ids() {
        assert_eq!(Id::VSubAt.kind(), Kind::VSub);
        assert_eq!(Id::VTestColonHyphen.kind(), Kind::VTest);
        assert_eq!(Id::VOp0Q.kind(), Kind::VOp0);
        assert_eq!(Id::VOp1DPound.kind(), Kind::VOp1);
        assert_eq!(Id::VOp3At.kind(), Kind::VOp3);
        assert_eq!(Id::RedirDLessDash.kind(), Kind::Redir);
        assert_eq!(Id::AssignLocal.kind(), Kind::Assign);
        assert_eq!(Id::BoolBinaryEqualTilde.kind(), Kind::BoolBinary);
    }

    #[test]
    fn redirection_defaults() {
        assert_eq!(redir_default_fd(Id::RedirLess), Some(0));
        assert_eq!(redir_default_fd(Id::RedirGreat), Some(1));
        assert_eq!(redir_default_fd(Id::RedirDGreat), Some(1));
        assert_eq!(redir_default_fd(Id::RedirGreatAnd), Some(1));
        assert_eq!(redir_default_fd(Id::RedirLessAnd), Some(0));
        assert_eq!(redir_default_fd(Id::RedirDLess), Some(0));
        assert_eq!(redir_default_fd(Id::RedirDLessDash), Some(0));
        assert_eq!(redir_default_fd(Id::RedirTLess), Some(0));
        assert_eq!(redir_default_fd(Id::OpSemi), None);
    }

    #[test]
    fn redirection_kind_is_total_over_redirection_ids() {
        for &id in Id::ALL {
            assert_eq!(
                matches!(id.kind(), Kind::Redir),
                redir_kind(id).is_some(),
                "{id:?}"
            );
        }
        assert_eq!(redir_kind(Id::RedirGreat), Some(RedirKind::Path));
        assert_eq!(redir_kind(Id::RedirLessAnd), Some(RedirKind::Desc));
        assert_eq!(redir_kind(Id::RedirDLess), Some(RedirKind::Here));
    }

    #[test]
    fn bool_operand_kinds() {
        assert_eq!(bool_op_operand(Id::BoolUnaryZ), OperandKind::Str);
        assert_eq!(bool_op_operand(Id::BoolUnaryF), OperandKind::Path);
        assert_eq!(bool_op_operand(Id::BoolUnaryV), OperandKind::Other);
        assert_eq!(bool_op_operand(Id::BoolBinaryEq), OperandKind::Int);
        assert_eq!(bool_op_operand(Id::BoolBinaryNt), OperandKind::Path);
        assert_eq!(bool_op_operand(Id::RedirLess), OperandKind::Str);
        assert_eq!(bool_op_operand(Id::OpDAmp), OperandKind::Undefined);
        assert_eq!(bool_op_operand(Id::KwBang), OperandKind::Undefined);
    }

    #[test]
    fn assign_builtin_lookup() {
        assert_eq!(lookup_assign_builtin("declare"), Some(Id::AssignDeclare));
        assert_eq!(lookup_assign_builtin("typeset"), Some(Id::AssignTypeset));
        assert_eq!(lookup_assign_builtin("local"), Some(Id::AssignLocal));
        assert_eq!(lookup_assign_builtin("readonly"), Some(Id::AssignReadonly));
        assert_eq!(lookup_assign_builtin("export"), Some(Id::AssignExport));
        assert_eq!(lookup_assign_builtin("echo"), None);
        assert_eq!(lookup_assign_builtin(""), None);
    }

    #[test]
    fn every_bool_op_id_has_an_operand_kind() {
        for &id in Id::ALL {
            if matches!(id.kind(), Kind::BoolUnary | Kind::BoolBinary) {
                assert_ne!(bool_op_operand(id), OperandKind::Undefined, "{id:?}");
            }
        }
    }
}
