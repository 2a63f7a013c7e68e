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

//! Items for shell variables
//!
//! A [`Variable`] is a named cell holding an optional [`Value`] together with
//! its attributes (exported, read-only, nameref). Variables live in a
//! [`VariableSet`], a stack of contexts: the base context is always present,
//! and function calls push further contexts whose variables hide same-named
//! variables below. Popping is guaranteed by the guard returned from
//! [`VariableSet::push_context`].
//!
//! Values come in three shapes. Arrays are dense vectors with sparse
//! semantics: an entry may be a hole (an index that was never assigned), and
//! holes are skipped by length, expansion, and slicing. Associative arrays
//! preserve insertion order.
//!
//! Writes go through [`VariableSet::assign`] with an [`Lvalue`] naming the
//! target cell or slot; reads return shared references only.

use indexmap::IndexMap;
use marsh_syntax::source::Location;
use std::collections::HashMap;
use thiserror::Error;

/// Value of a variable.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Value {
    /// Single string.
    Scalar(String),
    /// Array of strings. A `None` entry is a hole: the index exists but was
    /// never assigned.
    Array(Vec<Option<String>>),
    /// Associative array, ordered by insertion.
    Assoc(IndexMap<String, String>),
}

pub use Value::*;

impl Value {
    /// Creates a scalar value.
    #[must_use]
    pub fn scalar<S: Into<String>>(value: S) -> Self {
        Scalar(value.into())
    }

    /// Creates an array value without holes.
    #[must_use]
    pub fn array<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Array(values.into_iter().map(|s| Some(s.into())).collect())
    }

    /// Creates an associative array value from key-value pairs.
    #[must_use]
    pub fn assoc<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Assoc(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Whether this value counts as empty: an empty string, an array with no
    /// entries, or an associative array with no entries.
    ///
    /// Holes count as entries here; `is_empty` is about the shape of the
    /// value, not the number of assigned slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Scalar(s) => s.is_empty(),
            Array(items) => items.is_empty(),
            Assoc(entries) => entries.is_empty(),
        }
    }
}

/// Converts a string into a scalar value.
impl From<String> for Value {
    fn from(value: String) -> Self {
        Scalar(value)
    }
}

/// Converts a string slice to a scalar value.
impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Scalar(value.to_owned())
    }
}

/// Definition of a variable.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Variable {
    /// Value of the variable.
    ///
    /// The value is `None` if the variable has been declared without
    /// assignment.
    pub value: Option<Value>,

    /// Optional location where this variable was last assigned.
    pub last_assigned_location: Option<Location>,

    /// Whether this variable is exported to the environment of executed
    /// commands.
    pub is_exported: bool,

    /// Optional location where this variable was made read-only.
    ///
    /// If this variable is not read-only, `read_only_location` is `None`.
    pub read_only_location: Option<Location>,

    /// Whether this variable is a name reference.
    pub is_nameref: bool,
}

impl Variable {
    /// Creates a new scalar variable from a string.
    #[must_use]
    pub fn new<S: Into<String>>(value: S) -> Self {
        Variable {
            value: Some(Value::scalar(value)),
            ..Default::default()
        }
    }

    /// Creates a new array variable.
    #[must_use]
    pub fn new_array<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Variable {
            value: Some(Value::array(values)),
            ..Default::default()
        }
    }

    /// Sets the `is_exported` flag in a method chain.
    #[inline]
    #[must_use]
    pub fn export(mut self) -> Self {
        self.is_exported = true;
        self
    }

    /// Makes the variable read-only in a method chain.
    #[inline]
    #[must_use]
    pub fn make_read_only(mut self, location: Location) -> Self {
        self.read_only_location = Some(location);
        self
    }

    /// Whether this variable is read-only.
    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        self.read_only_location.is_some()
    }
}

/// Target of a variable assignment.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Lvalue {
    /// The whole variable, `name=...`.
    Named(String),
    /// One slot of an indexed array, `name[index]=...`. Negative indices
    /// count from the end.
    Indexed(String, i64),
    /// One slot of an associative array, `name[key]=...`.
    Keyed(String, String),
}

impl Lvalue {
    /// Returns the name of the variable this lvalue writes into.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Lvalue::Named(name) | Lvalue::Indexed(name, _) | Lvalue::Keyed(name, _) => name,
        }
    }
}

/// Error assigning to a variable.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum AssignError {
    /// The target cell is read-only.
    #[error("cannot assign to read-only variable `{name}`")]
    ReadOnly {
        /// Name of the read-only variable.
        name: String,
        /// Location where the variable was made read-only.
        read_only_location: Location,
    },

    /// An index was applied to a value that is not an indexed array.
    #[error("cannot index variable `{name}` as an array")]
    NotArray { name: String },

    /// A key was applied to a value that is not an associative array.
    #[error("cannot index variable `{name}` with a key")]
    NotAssoc { name: String },

    /// A negative index reached before the beginning of the array.
    #[error("index {index} is out of range for variable `{name}`")]
    BadIndex { name: String, index: i64 },
}

#[derive(Clone, Debug, Eq, PartialEq)]
struct VariableInContext {
    variable: Variable,
    context_index: usize,
}

/// Choice of contexts to search for a variable.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Scope {
    /// Search all contexts, from the topmost down to the base.
    Global,
    /// Search the topmost context only.
    Local,
}

/// Collection of variables.
///
/// See the [module documentation](self) for details.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VariableSet {
    /// Hash map containing all variables.
    ///
    /// The value of an entry is a stack of variables defined in contexts,
    /// sorted in the ascending order of the context index. Keeping the
    /// variables of all contexts in one map makes lookup a single hashing.
    all_variables: HashMap<String, Vec<VariableInContext>>,

    /// Number of contexts. The base context is always counted, so this is
    /// at least 1.
    context_count: usize,
}

impl Default for VariableSet {
    fn default() -> Self {
        VariableSet {
            all_variables: HashMap::new(),
            context_count: 1,
        }
    }
}

impl VariableSet {
    /// Creates an empty variable set.
    #[must_use]
    pub fn new() -> VariableSet {
        Default::default()
    }

    /// Gets a reference to the variable with the specified name.
    ///
    /// If variables with the same name are defined in multiple contexts, the
    /// one in the topmost context is visible and returned.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Variable> {
        Some(&self.all_variables.get(name)?.last()?.variable)
    }

    /// Gets a reference to the visible value of the named variable, if the
    /// variable is set.
    #[must_use]
    pub fn value_of(&self, name: &str) -> Option<&Value> {
        self.get(name)?.value.as_ref()
    }

    /// Gets a reference to the variable with the specified name, restricted
    /// to the given scope.
    ///
    /// With [`Scope::Local`], only a variable defined in the topmost context
    /// is returned.
    #[must_use]
    pub fn get_scoped(&self, name: &str, scope: Scope) -> Option<&Variable> {
        let entry = self.all_variables.get(name)?.last()?;
        match scope {
            Scope::Global => Some(&entry.variable),
            Scope::Local => {
                (entry.context_index == self.context_count - 1).then_some(&entry.variable)
            }
        }
    }

    /// Returns the names of all visible variables starting with the given
    /// prefix, in unspecified order.
    #[must_use]
    pub fn names_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.all_variables
            .iter()
            .filter(|(name, stack)| name.starts_with(prefix) && !stack.is_empty())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Defines (or replaces) a variable in the topmost context.
    pub fn define<S: Into<String>>(&mut self, name: S, variable: Variable) {
        let context_index = self.context_count - 1;
        let stack = self.all_variables.entry(name.into()).or_default();
        match stack.last_mut() {
            Some(top) if top.context_index == context_index => top.variable = variable,
            _ => stack.push(VariableInContext {
                variable,
                context_index,
            }),
        }
    }

    /// Assigns a string through an lvalue.
    ///
    /// A [`Named`](Lvalue::Named) target replaces the whole value with a
    /// scalar. An [`Indexed`](Lvalue::Indexed) target writes one array slot,
    /// creating the array or extending it with holes as needed; a negative
    /// index counts from the end of the existing array. A
    /// [`Keyed`](Lvalue::Keyed) target writes one slot of an associative
    /// array, creating the array as needed.
    ///
    /// The write goes to the visible variable if the name is defined in any
    /// context, and otherwise creates the variable in the base context.
    pub fn assign(&mut self, lvalue: &Lvalue, new: String) -> Result<(), AssignError> {
        let name = lvalue.name();
        if let Some(variable) = self.get(name) {
            if let Some(location) = &variable.read_only_location {
                return Err(AssignError::ReadOnly {
                    name: name.to_string(),
                    read_only_location: location.clone(),
                });
            }
        }

        let stack = self.all_variables.entry(name.to_string()).or_default();
        if stack.is_empty() {
            stack.push(VariableInContext {
                variable: Variable::default(),
                context_index: 0,
            });
        }
        let variable = &mut stack.last_mut().unwrap().variable;

        match lvalue {
            Lvalue::Named(_) => {
                variable.value = Some(Scalar(new));
                Ok(())
            }

            Lvalue::Indexed(name, index) => match &mut variable.value {
                value @ None => {
                    if *index < 0 {
                        return Err(AssignError::BadIndex {
                            name: name.clone(),
                            index: *index,
                        });
                    }
                    let mut items = vec![None; *index as usize];
                    items.push(Some(new));
                    *value = Some(Array(items));
                    Ok(())
                }
                Some(Array(items)) => {
                    let n = items.len() as i64;
                    let index = if *index < 0 { index + n } else { *index };
                    if index < 0 {
                        return Err(AssignError::BadIndex {
                            name: name.clone(),
                            index: index - n,
                        });
                    }
                    let index = index as usize;
                    if index >= items.len() {
                        items.resize(index + 1, None);
                    }
                    items[index] = Some(new);
                    Ok(())
                }
                Some(Assoc(entries)) => {
                    entries.insert(index.to_string(), new);
                    Ok(())
                }
                Some(Scalar(_)) => Err(AssignError::NotArray { name: name.clone() }),
            },

            Lvalue::Keyed(name, key) => match &mut variable.value {
                value @ None => {
                    let mut entries = IndexMap::new();
                    entries.insert(key.clone(), new);
                    *value = Some(Assoc(entries));
                    Ok(())
                }
                Some(Assoc(entries)) => {
                    entries.insert(key.clone(), new);
                    Ok(())
                }
                Some(Scalar(_) | Array(_)) => Err(AssignError::NotAssoc { name: name.clone() }),
            },
        }
    }

    /// Pushes a new context and returns a guard that pops it when dropped.
    pub fn push_context(&mut self) -> ContextGuard<'_> {
        self.context_count += 1;
        ContextGuard { set: self }
    }

    fn pop_context(&mut self) {
        debug_assert!(self.context_count > 1, "cannot pop the base context");
        let top = self.context_count - 1;
        self.all_variables.retain(|_, stack| {
            if matches!(stack.last(), Some(entry) if entry.context_index == top) {
                stack.pop();
            }
            !stack.is_empty()
        });
        self.context_count -= 1;
    }
}

/// RAII guard that pops a context pushed with [`VariableSet::push_context`].
///
/// Dereferences to the borrowed variable set.
#[derive(Debug)]
#[must_use]
pub struct ContextGuard<'a> {
    set: &'a mut VariableSet,
}

impl Drop for ContextGuard<'_> {
    fn drop(&mut self) {
        self.set.pop_context();
    }
}

impl std::ops::Deref for ContextGuard<'_> {
    type Target = VariableSet;
    fn deref(&self) -> &VariableSet {
        self.set
    }
}

impl std::ops::DerefMut for ContextGuard<'_> {
    fn deref_mut(&mut self) -> &mut VariableSet {
        self.set
    }
}
