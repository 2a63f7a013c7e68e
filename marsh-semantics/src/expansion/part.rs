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

//! Intermediate values of word evaluation
//!
//! A word evaluates to a flat list of [`PartValue`]s: string fragments
//! carrying their quoting state, and array fragments that expand into
//! multiple fields. The list is then grouped into [frames](make_frames),
//! the unit of argv production: each frame becomes zero or more arguments
//! after splitting and globbing.
//!
//! Array part values only arise from `"$@"`, `"${a[@]}"`, splices, and the
//! splitting form of command substitution; their entries are quoted by
//! construction, so frames never split or glob them.
//!
//! Part values live for one word evaluation only; none of this state
//! crosses word boundaries.

use marsh_env::variable::Value;

/// Fragment of an evaluated word.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PartValue {
    /// String fragment.
    String {
        /// The fragment text.
        s: String,
        /// Whether the fragment originates from a quoted context. Quoted
        /// fragments are never split and are glob-escaped instead of
        /// expanded.
        quoted: bool,
        /// Whether the fragment is subject to field splitting. Always false
        /// for quoted fragments.
        do_split: bool,
    },
    /// Fragment that expands into multiple fields. A `None` entry is an
    /// unassigned array index and expands to nothing.
    Array(Vec<Option<String>>),
}

impl PartValue {
    /// Creates a string part value, normalizing the split flag: a quoted
    /// fragment is never subject to splitting.
    #[must_use]
    pub fn string<S: Into<String>>(s: S, quoted: bool, do_split: bool) -> PartValue {
        PartValue::String {
            s: s.into(),
            quoted,
            do_split: do_split && !quoted,
        }
    }
}

/// Piece of a frame: one fragment with its quoting state.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Fragment {
    pub text: String,
    pub quoted: bool,
    pub do_split: bool,
}

/// Converts a value fetched from the variable store into a part value.
///
/// An unset value contributes an empty fragment: this happens for
/// `${undef+word}`, where the test operator observed the unset value and
/// left it in place.
#[must_use]
pub fn value_to_part_value(value: Option<Value>, quoted: bool) -> PartValue {
    match value {
        None => PartValue::string("", quoted, !quoted),
        Some(Value::Scalar(s)) => PartValue::string(s, quoted, !quoted),
        Some(Value::Array(items)) => PartValue::Array(items),
        Some(Value::Assoc(entries)) => {
            PartValue::Array(entries.into_values().map(Some).collect())
        }
    }
}

/// Groups part values into frames.
///
/// A frame is a run of fragments that together yield one or more arguments.
/// Fragments can never be joined across frames; the boundary exists because
/// of arrays like `"$@"` and `"${a[@]}"`:
///
/// ```text
/// a=(1 '2 3' 4); x=x; y=y
/// $x"${a[@]}"$y
/// ```
///
/// produces three frames: `x` joined with `1`, then `2 3` alone, then `4`
/// joined with `y`.
#[must_use]
pub fn make_frames(part_vals: Vec<PartValue>) -> Vec<Vec<Fragment>> {
    let mut frames = Vec::new();
    let mut current = Vec::new();

    for part in part_vals {
        match part {
            PartValue::String { s, quoted, do_split } => current.push(Fragment {
                text: s,
                quoted,
                do_split,
            }),
            PartValue::Array(items) => {
                let mut is_first = true;
                for item in items {
                    // Unassigned entries expand to nothing at all.
                    let Some(text) = item else { continue };
                    // Array entries are always quoted; otherwise the value
                    // would have decayed to a string before reaching here.
                    let fragment = Fragment {
                        text,
                        quoted: true,
                        do_split: false,
                    };
                    if is_first {
                        current.push(fragment);
                        is_first = false;
                    } else {
                        frames.push(std::mem::replace(&mut current, vec![fragment]));
                    }
                }
            }
        }
    }

    frames.push(current);
    frames
}

/// Joins part values into one string, joining array entries with the given
/// separator and skipping unassigned entries.
///
/// This is how `${a=x"$@"x}` decays to the string written back into `a`.
#[must_use]
pub fn decay(part_vals: &[PartValue], join_char: &str) -> String {
    let mut out = String::new();
    for part in part_vals {
        match part {
            PartValue::String { s, .. } => out.push_str(s),
            PartValue::Array(items) => {
                let mut first = true;
                for item in items.iter().flatten() {
                    if !first {
                        out.push_str(join_char);
                    }
                    out.push_str(item);
                    first = false;
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unquoted(s: &str) -> PartValue {
        PartValue::string(s, false, true)
    }

    #[test]
    fn string_constructor_normalizes_split_flag() {
        let part = PartValue::string("x", true, true);
        assert_eq!(
            part,
            PartValue::String {
                s: "x".to_string(),
                quoted: true,
                do_split: false,
            }
        );
    }

    #[test]
    fn frames_for_plain_fragments() {
        let frames = make_frames(vec![unquoted("a"), unquoted("b")]);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].len(), 2);
        assert_eq!(frames[0][0].text, "a");
        assert_eq!(frames[0][1].text, "b");
    }

    #[test]
    fn frames_split_around_array_entries() {
        // x"${a[@]}"y with a=(1 '2 3' 4)
        let frames = make_frames(vec![
            unquoted("x"),
            PartValue::Array(vec![
                Some("1".to_string()),
                Some("2 3".to_string()),
                Some("4".to_string()),
            ]),
            unquoted("y"),
        ]);
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].len(), 2);
        assert_eq!(frames[0][0].text, "x");
        assert_eq!(frames[0][1].text, "1");
        assert!(frames[0][1].quoted);
        assert_eq!(frames[1].len(), 1);
        assert_eq!(frames[1][0].text, "2 3");
        assert_eq!(frames[2].len(), 2);
        assert_eq!(frames[2][0].text, "4");
        assert_eq!(frames[2][1].text, "y");
    }

    #[test]
    fn frames_skip_array_holes() {
        let frames = make_frames(vec![PartValue::Array(vec![
            Some("a".to_string()),
            None,
            Some("b".to_string()),
        ])]);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0][0].text, "a");
        assert_eq!(frames[1][0].text, "b");
    }

    #[test]
    fn empty_array_gives_one_empty_frame() {
        let frames = make_frames(vec![PartValue::Array(vec![])]);
        assert_eq!(frames, [Vec::<Fragment>::new()]);
    }

    #[test]
    fn decay_joins_arrays_and_concatenates() {
        let parts = [
            unquoted("x"),
            PartValue::Array(vec![
                Some("1".to_string()),
                None,
                Some("2".to_string()),
            ]),
            unquoted("y"),
        ];
        assert_eq!(decay(&parts, " "), "x1 2y");
        assert_eq!(decay(&parts, ","), "x1,2y");
        assert_eq!(decay(&[], " "), "");
    }

    #[test]
    fn value_to_part_value_shapes() {
        assert_eq!(
            value_to_part_value(None, false),
            PartValue::string("", false, true)
        );
        assert_eq!(
            value_to_part_value(Some(Value::scalar("s")), true),
            PartValue::string("s", true, false)
        );
        assert_eq!(
            value_to_part_value(Some(Value::array(["a", "b"])), true),
            PartValue::Array(vec![Some("a".to_string()), Some("b".to_string())])
        );
        assert_eq!(
            value_to_part_value(Some(Value::assoc([("k", "v")])), false),
            PartValue::Array(vec![Some("v".to_string())])
        );
    }
}
