//! Identifier resolution supplied by the host.
//!
//! The engine only ever reads a scope. Lookups may fail (a host backed by a
//! model or a remote store can report an error), so every query returns a
//! [`Result`].

use std::collections::BTreeSet;

use hashbrown::HashMap;

mod constants;

pub use constants::Constants;

use crate::errors::Result;
use crate::types::Type;
use crate::values::Value;

pub trait Scope {
    /// Current value bound to `name`.
    fn get(&self, name: &str) -> Result<Option<Value>>;

    /// Declared type of `name`, which may be known before its value is.
    fn get_type(&self, name: &str) -> Result<Option<Type>>;

    fn identifiers(&self) -> BTreeSet<String>;
}

impl<S: Scope + ?Sized> Scope for &S {
    fn get(&self, name: &str) -> Result<Option<Value>> {
        (**self).get(name)
    }

    fn get_type(&self, name: &str) -> Result<Option<Type>> {
        (**self).get_type(name)
    }

    fn identifiers(&self) -> BTreeSet<String> {
        (**self).identifiers()
    }
}

/// A scope that binds nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyScope;

impl Scope for EmptyScope {
    fn get(&self, _name: &str) -> Result<Option<Value>> {
        Ok(None)
    }

    fn get_type(&self, _name: &str) -> Result<Option<Type>> {
        Ok(None)
    }

    fn identifiers(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }
}

/// Owned name-to-value bindings.
#[derive(Debug, Clone, Default)]
pub struct MapScope {
    values: HashMap<String, Value>,
}

impl MapScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> &mut Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Value)> for MapScope {
    fn from_iter<I: IntoIterator<Item = (S, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl Scope for MapScope {
    fn get(&self, name: &str) -> Result<Option<Value>> {
        Ok(self.values.get(name).cloned())
    }

    fn get_type(&self, name: &str) -> Result<Option<Type>> {
        Ok(self.values.get(name).map(Value::ty))
    }

    fn identifiers(&self) -> BTreeSet<String> {
        self.values.keys().cloned().collect()
    }
}

/// Arguments of a function call layered over a fallback scope.
pub struct ArgumentScope<'a> {
    names: &'a [String],
    values: &'a [Value],
    parent: &'a dyn Scope,
}

impl<'a> ArgumentScope<'a> {
    pub fn new(names: &'a [String], values: &'a [Value], parent: &'a dyn Scope) -> Self {
        Self {
            names,
            values,
            parent,
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

impl Scope for ArgumentScope<'_> {
    fn get(&self, name: &str) -> Result<Option<Value>> {
        match self.position(name) {
            Some(i) => Ok(self.values.get(i).cloned()),
            None => self.parent.get(name),
        }
    }

    fn get_type(&self, name: &str) -> Result<Option<Type>> {
        match self.position(name) {
            Some(i) => Ok(self.values.get(i).map(Value::ty)),
            None => self.parent.get_type(name),
        }
    }

    fn identifiers(&self) -> BTreeSet<String> {
        let mut names = self.parent.identifiers();
        names.extend(self.names.iter().cloned());
        names
    }
}

/// A scope consulted first, with a second one answering what it leaves unbound.
pub struct LayeredScope<'a> {
    front: &'a dyn Scope,
    back: &'a dyn Scope,
}

impl<'a> LayeredScope<'a> {
    pub fn new(front: &'a dyn Scope, back: &'a dyn Scope) -> Self {
        Self { front, back }
    }
}

impl Scope for LayeredScope<'_> {
    fn get(&self, name: &str) -> Result<Option<Value>> {
        match self.front.get(name)? {
            Some(value) => Ok(Some(value)),
            None => self.back.get(name),
        }
    }

    fn get_type(&self, name: &str) -> Result<Option<Type>> {
        match self.front.get_type(name)? {
            Some(ty) => Ok(Some(ty)),
            None => self.back.get_type(name),
        }
    }

    fn identifiers(&self) -> BTreeSet<String> {
        let mut names = self.back.identifiers();
        names.extend(self.front.identifiers());
        names
    }
}

/// Declared types shadowing a parent scope, used to infer function bodies.
///
/// Shadowed names have no value.
pub struct TypeScope<'a> {
    types: &'a [(String, Type)],
    parent: &'a dyn Scope,
}

impl<'a> TypeScope<'a> {
    pub fn new(types: &'a [(String, Type)], parent: &'a dyn Scope) -> Self {
        Self { types, parent }
    }

    fn lookup(&self, name: &str) -> Option<&Type> {
        self.types.iter().find(|(n, _)| n == name).map(|(_, ty)| ty)
    }
}

impl Scope for TypeScope<'_> {
    fn get(&self, name: &str) -> Result<Option<Value>> {
        match self.lookup(name) {
            Some(_) => Ok(None),
            None => self.parent.get(name),
        }
    }

    fn get_type(&self, name: &str) -> Result<Option<Type>> {
        match self.lookup(name) {
            Some(ty) => Ok(Some(ty.clone())),
            None => self.parent.get_type(name),
        }
    }

    fn identifiers(&self) -> BTreeSet<String> {
        let mut names = self.parent.identifiers();
        names.extend(self.types.iter().map(|(n, _)| n.clone()));
        names
    }
}
