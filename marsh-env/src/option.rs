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

//! Type definitions for shell options
//!
//! This module defines the [`OptionSet`] struct, a map from [`Option`] to
//! [`State`]. The option set represents whether each option is on or off.
//!
//! Note that `OptionSet` merely manages the state of options. It is not the
//! responsibility of `OptionSet` to change the behavior of the shell
//! according to the options.

use enumset::EnumSet;
use enumset::EnumSetType;
use std::fmt::Display;
use std::fmt::Formatter;
use std::ops::Not;

/// State of an option: either enabled or disabled.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum State {
    /// Enabled.
    On,
    /// Disabled.
    Off,
}

pub use State::*;

/// Converts a state to a string (`on` or `off`).
impl Display for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            On => "on",
            Off => "off",
        };
        s.fmt(f)
    }
}

impl Not for State {
    type Output = Self;
    #[must_use]
    fn not(self) -> Self {
        match self {
            On => Off,
            Off => On,
        }
    }
}

impl From<bool> for State {
    fn from(on: bool) -> Self {
        if on {
            On
        } else {
            Off
        }
    }
}

/// Kinds of shell options.
#[derive(Clone, Copy, Debug, EnumSetType, Eq, Hash, PartialEq)]
#[enumset(no_super_impls)]
#[non_exhaustive]
pub enum Option {
    /// The shell is interactive.
    Interactive,
    /// Exit on command failure.
    ErrExit,
    /// Refuse to overwrite files with `>`.
    NoClobber,
    /// Parse but do not execute commands.
    NoExec,
    /// Disable pathname expansion.
    NoGlob,
    /// Expanding an unset parameter is an error.
    NoUnset,
    /// Print commands before executing them.
    Xtrace,
    /// Recognize the `@( ?( *( +( !(` pattern groups.
    ExtGlob,
    /// Expand each word to exactly one field per fragment: no field
    /// splitting, no globbing except static globs.
    SimpleWordEval,
    /// Let every array decay to its first element when used as a scalar.
    CompatArray,
    /// Refuse to silently join an array into a string.
    StrictArray,
    /// A failing tilde expansion is an error rather than literal text.
    StrictTilde,
    /// Decoding errors in length and slice operators are fatal rather than
    /// degraded with a warning.
    StrictWordEval,
}

impl Option {
    /// Returns the name of this option as used in `set -o`.
    #[must_use]
    pub const fn long_name(self) -> &'static str {
        use self::Option::*;
        match self {
            Interactive => "interactive",
            ErrExit => "errexit",
            NoClobber => "noclobber",
            NoExec => "noexec",
            NoGlob => "noglob",
            NoUnset => "nounset",
            Xtrace => "xtrace",
            ExtGlob => "extglob",
            SimpleWordEval => "simple_word_eval",
            CompatArray => "compat_array",
            StrictArray => "strict_array",
            StrictTilde => "strict_tilde",
            StrictWordEval => "strict_word_eval",
        }
    }

    /// Returns the single-letter name of this option, if any.
    ///
    /// Options with a short name contribute that letter to the `$-` special
    /// parameter while they are on.
    #[must_use]
    pub const fn short_name(self) -> std::option::Option<char> {
        use self::Option::*;
        match self {
            Interactive => Some('i'),
            ErrExit => Some('e'),
            NoGlob => Some('f'),
            NoExec => Some('n'),
            NoUnset => Some('u'),
            Xtrace => Some('x'),
            NoClobber => Some('C'),
            _ => None,
        }
    }
}

/// Converts an option to a string (its long name).
impl Display for Option {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.long_name().fmt(f)
    }
}

/// Collection of all option states.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct OptionSet {
    enabled: EnumSet<Option>,
}

impl OptionSet {
    /// Returns a set with all options off.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the state of the given option.
    #[must_use]
    pub fn get(&self, option: Option) -> State {
        self.enabled.contains(option).into()
    }

    /// Whether the given option is on.
    #[must_use]
    pub fn is_on(&self, option: Option) -> bool {
        self.enabled.contains(option)
    }

    /// Sets the state of the given option.
    pub fn set(&mut self, option: Option, state: State) {
        match state {
            On => self.enabled.insert(option),
            Off => self.enabled.remove(option),
        };
    }

    /// Returns the value of the `$-` special parameter: the short names of
    /// the enabled options, in declaration order.
    #[must_use]
    pub fn dollar_hyphen(&self) -> String {
        EnumSet::<Option>::all()
            .iter()
            .filter(|option| self.is_on(*option))
            .filter_map(Option::short_name)
            .collect()
    }
}
