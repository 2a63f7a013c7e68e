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

//! Word evaluation semantics of the marsh shell
//!
//! This crate turns parsed [words](marsh_syntax::syntax::Word) into the
//! strings and argument vectors commands actually receive. See the
//! [`expansion`] module for the evaluator and its collaborator interfaces.

pub mod expansion;

#[cfg(test)]
pub(crate) mod tests;
