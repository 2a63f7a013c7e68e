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

//! Source locations
//!
//! A [`Location`] names the region of source code a token or AST node came
//! from. Locations travel with every construct that can be blamed for a
//! runtime error; the error reporter resolves them back to line and column.

use std::ops::Range;
use std::rc::Rc;

/// Position of a syntactic construct in the source code.
///
/// The `snippet` is the source fragment the construct was read from, shared
/// among all locations produced from the same input. The `range` is a byte
/// range into that snippet.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Location {
    /// Source fragment this location points into.
    pub snippet: Rc<str>,
    /// Byte range of the construct within the snippet.
    pub range: Range<usize>,
}

impl Location {
    /// Creates a location covering the whole of the given string.
    ///
    /// This is mainly for use in tests, where the exact origin of a node does
    /// not matter.
    #[must_use]
    pub fn dummy<S: Into<String>>(snippet: S) -> Location {
        let snippet: Rc<str> = Rc::from(snippet.into());
        let range = 0..snippet.len();
        Location { snippet, range }
    }

    /// Returns the source text this location covers.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.snippet[self.range.clone()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dummy_location_covers_whole_snippet() {
        let location = Location::dummy("echo $foo");
        assert_eq!(location.range, 0..9);
        assert_eq!(location.text(), "echo $foo");
    }

    #[test]
    fn locations_into_same_snippet_compare_equal() {
        let a = Location::dummy("x");
        let b = Location::dummy("x");
        assert_eq!(a, b);
    }
}
