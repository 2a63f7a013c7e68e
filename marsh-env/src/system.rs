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

//! Access to the OS user database
//!
//! Tilde expansion needs the home directory of the current user and of
//! arbitrary named users. The [`UserLookup`] trait is the seam between the
//! evaluator and the OS so tests can substitute a [`VirtualUserLookup`] with
//! canned entries.

use std::collections::HashMap;
use std::fmt::Debug;

/// Access to home directories in the user database.
pub trait UserLookup: Debug {
    /// Returns the home directory of the current user.
    fn my_home_dir(&self) -> Option<String>;

    /// Returns the home directory of the named user.
    fn home_dir(&self, user: &str) -> Option<String>;
}

/// User database access backed by the real OS.
#[derive(Clone, Copy, Debug, Default)]
pub struct RealUserLookup;

#[cfg(unix)]
impl UserLookup for RealUserLookup {
    fn my_home_dir(&self) -> Option<String> {
        let user = nix::unistd::User::from_uid(nix::unistd::getuid()).ok()??;
        user.dir.into_os_string().into_string().ok()
    }

    fn home_dir(&self, user: &str) -> Option<String> {
        let user = nix::unistd::User::from_name(user).ok()??;
        user.dir.into_os_string().into_string().ok()
    }
}

#[cfg(not(unix))]
impl UserLookup for RealUserLookup {
    fn my_home_dir(&self) -> Option<String> {
        None
    }

    fn home_dir(&self, _user: &str) -> Option<String> {
        None
    }
}

/// User database with canned entries, for tests.
#[derive(Clone, Debug, Default)]
pub struct VirtualUserLookup {
    /// Home directory of the current user.
    pub my_home: Option<String>,
    /// Home directories by user name.
    pub homes: HashMap<String, String>,
}

impl UserLookup for VirtualUserLookup {
    fn my_home_dir(&self) -> Option<String> {
        self.my_home.clone()
    }

    fn home_dir(&self, user: &str) -> Option<String> {
        self.homes.get(user).cloned()
    }
}
