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

//! Shell execution environment for marsh
//!
//! The [`Env`] struct aggregates the state the word evaluator reads and
//! writes: the [variable set](variable::VariableSet), the
//! [option set](option::OptionSet), positional parameters, and the special
//! registers (`$?`, `$$`, `$!`, `PIPESTATUS`).
//!
//! The environment is strictly single-threaded; evaluation re-enters it
//! synchronously during command substitution. The
//! [`push_registers`](Env::push_registers) guard snapshots the registers
//! around such re-entry so that, for example, prompt evaluation cannot
//! clobber `$?` no matter how it exits.

pub mod option;
pub mod system;
pub mod variable;

use crate::option::OptionSet;
use crate::system::RealUserLookup;
use crate::system::UserLookup;
use crate::variable::VariableSet;
use std::ops::Deref;
use std::ops::DerefMut;

/// Whole shell execution environment.
#[derive(Debug)]
pub struct Env {
    /// Shell variables.
    pub variables: VariableSet,
    /// Shell options.
    pub options: OptionSet,
    /// Positional parameters (`$1`, `$2`, ...).
    pub positional_params: Vec<String>,
    /// Name of the shell or shell script (`$0`).
    pub arg0: String,
    /// Exit status of the last command (`$?`).
    pub exit_status: i32,
    /// Exit statuses of the last pipeline (`PIPESTATUS`).
    pub pipestatus: Vec<i32>,
    /// Process ID of the last asynchronous command (`$!`).
    pub last_async_pid: i32,
    /// Process ID of the shell itself (`$$`).
    pub shell_pid: i32,
    /// User database access for tilde expansion.
    pub user_lookup: Box<dyn UserLookup>,
}

impl Env {
    /// Creates an environment that consults the real user database.
    #[must_use]
    pub fn new() -> Env {
        Env::with_user_lookup(Box::new(RealUserLookup))
    }

    /// Creates an environment with the given user database access.
    #[must_use]
    pub fn with_user_lookup(user_lookup: Box<dyn UserLookup>) -> Env {
        Env {
            variables: VariableSet::new(),
            options: OptionSet::default(),
            positional_params: Vec::new(),
            arg0: String::new(),
            exit_status: 0,
            pipestatus: Vec::new(),
            last_async_pid: 0,
            shell_pid: 0,
            user_lookup,
        }
    }

    /// Returns the positional parameter with the given number.
    ///
    /// Number 0 is `$0`; numbers beyond the parameter count return `None`.
    #[must_use]
    pub fn get_arg(&self, n: usize) -> Option<&str> {
        if n == 0 {
            Some(&self.arg0)
        } else {
            self.positional_params.get(n - 1).map(String::as_str)
        }
    }

    /// Saves the special registers and returns a guard that restores them
    /// when dropped.
    ///
    /// Command substitution and plugin evaluation mutate `$?` and
    /// `PIPESTATUS` as a side effect; callers bracket such re-entry with this
    /// guard so the registers are restored on every exit path, including
    /// error unwinding.
    pub fn push_registers(&mut self) -> RegisterGuard<'_> {
        let exit_status = self.exit_status;
        let pipestatus = self.pipestatus.clone();
        RegisterGuard {
            env: self,
            exit_status,
            pipestatus,
        }
    }
}

impl Default for Env {
    fn default() -> Env {
        Env::new()
    }
}

/// RAII guard that restores the special registers of an [`Env`].
///
/// Returned by [`Env::push_registers`]. Dereferences to the environment.
#[derive(Debug)]
#[must_use]
pub struct RegisterGuard<'a> {
    env: &'a mut Env,
    exit_status: i32,
    pipestatus: Vec<i32>,
}

impl Drop for RegisterGuard<'_> {
    fn drop(&mut self) {
        self.env.exit_status = self.exit_status;
        std::mem::swap(&mut self.env.pipestatus, &mut self.pipestatus);
    }
}

impl Deref for RegisterGuard<'_> {
    type Target = Env;
    fn deref(&self) -> &Env {
        self.env
    }
}

impl DerefMut for RegisterGuard<'_> {
    fn deref_mut(&mut self) -> &mut Env {
        self.env
    }
}
