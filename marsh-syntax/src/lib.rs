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

//! Syntax types shared by the marsh shell crates.
//!
//! This crate defines the vocabulary the rest of the shell speaks:
//!
//! - [`source`]: source-code locations attached to tokens and AST nodes so
//!   runtime errors can be blamed on the construct that caused them.
//! - [`id`]: the flat registry of token and operator identifiers, each
//!   belonging to exactly one coarse [`Kind`](id::Kind), with the side tables
//!   keyed by identifier (redirection defaults, test-operator operand kinds).
//! - [`syntax`]: the word AST consumed by the word evaluator. The parser
//!   that produces these nodes lives elsewhere; this crate only defines the
//!   shapes.

pub mod id;
pub mod source;
pub mod syntax;
