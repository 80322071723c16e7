//! Native operation registry.
//!
//! The registry is a static table of native operations, grouped three ways:
//!
//! - **Providers**: ordered namespaces searched for free functions (`sin(x)`).
//! - **Value surfaces**: methods attached to a [`ValueClass`] (`x.add(y)`),
//!   searched along the receiver's class chain.
//! - **Native surfaces**: methods attached to a [`NativeType`], reached by
//!   converting the receiver to its native form first (`"abc".length()`).
//!
//! Operations whose return type depends on their argument types declare a
//! companion hook named `<name>ReturnType` in the same table.

use hashbrown::HashMap;

use crate::conversion::{Native, NativeType, ValueClass};
use crate::errors::{NativeError, Result};
use crate::types::Type;

pub mod complex;
pub mod math;
pub mod surfaces;
pub mod utility;

pub use complex::build_complex_provider;
pub use math::build_math_provider;
pub use utility::build_utility_provider;

/// Body of a native operation. Arguments arrive already converted.
pub type NativeFn = fn(&[Native]) -> Result<Native, NativeError>;

/// Computes an operation's return type from its argument types.
pub type ReturnTypeFn = fn(&[Type]) -> Result<Type>;

/// One native operation with its declared signature.
#[derive(Debug, Clone)]
pub struct NativeOp {
    name: String,
    params: Vec<NativeType>,
    ret: NativeType,
    func: NativeFn,
}

impl NativeOp {
    pub fn new(name: impl Into<String>, params: Vec<NativeType>, ret: NativeType, func: NativeFn) -> Self {
        Self {
            name: name.into(),
            params,
            ret,
            func,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[NativeType] {
        &self.params
    }

    pub fn ret(&self) -> &NativeType {
        &self.ret
    }

    pub fn call(&self, args: &[Native]) -> Result<Native, NativeError> {
        (self.func)(args)
    }

    /// `name(param, ...)`, used in ambiguity reports.
    pub fn signature(&self) -> String {
        let params = self
            .params
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}({params})", self.name)
    }
}

/// Operations of one provider or surface, plus their return-type hooks.
#[derive(Debug, Clone, Default)]
pub struct OperationTable {
    ops: Vec<NativeOp>,
    return_types: HashMap<String, ReturnTypeFn>,
}

impl OperationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, op: NativeOp) -> &mut Self {
        self.ops.push(op);
        self
    }

    /// Register the `<name>ReturnType` hook for `name`.
    pub fn add_return_type(&mut self, name: &str, hook: ReturnTypeFn) -> &mut Self {
        self.return_types.insert(format!("{name}ReturnType"), hook);
        self
    }

    pub fn candidates<'a>(&'a self, name: &'a str, arity: usize) -> impl Iterator<Item = &'a NativeOp> + 'a {
        self.ops
            .iter()
            .filter(move |op| op.name == name && op.params.len() == arity)
    }

    pub fn return_type_hook(&self, name: &str) -> Option<ReturnTypeFn> {
        self.return_types.get(&format!("{name}ReturnType")).copied()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// A named namespace of free functions.
#[derive(Debug, Clone)]
pub struct Provider {
    name: String,
    table: OperationTable,
}

impl Provider {
    pub fn new(name: impl Into<String>, table: OperationTable) -> Self {
        Self {
            name: name.into(),
            table,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &OperationTable {
        &self.table
    }
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    providers: Vec<Provider>,
    value_surfaces: HashMap<ValueClass, OperationTable>,
    native_surfaces: HashMap<NativeType, OperationTable>,
}

impl Registry {
    /// A registry with nothing in it.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in providers and surfaces.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.add_provider(build_math_provider());
        registry.add_provider(build_complex_provider());
        registry.add_provider(build_utility_provider());
        surfaces::register_value_surfaces(&mut registry);
        surfaces::register_native_surfaces(&mut registry);
        registry
    }

    /// Append a provider; it is searched after every existing one.
    pub fn add_provider(&mut self, provider: Provider) {
        tracing::debug!(provider = provider.name(), ops = provider.table.len(), "Adding provider");
        self.providers.push(provider);
    }

    pub fn add_method(&mut self, class: ValueClass, op: NativeOp) {
        self.value_surfaces.entry(class).or_default().add(op);
    }

    pub fn add_method_return_type(&mut self, class: ValueClass, name: &str, hook: ReturnTypeFn) {
        self.value_surfaces
            .entry(class)
            .or_default()
            .add_return_type(name, hook);
    }

    pub fn add_native_method(&mut self, native: NativeType, op: NativeOp) {
        self.native_surfaces.entry(native).or_default().add(op);
    }

    pub fn add_native_method_return_type(&mut self, native: NativeType, name: &str, hook: ReturnTypeFn) {
        self.native_surfaces
            .entry(native)
            .or_default()
            .add_return_type(name, hook);
    }

    pub fn providers(&self) -> &[Provider] {
        &self.providers
    }

    pub fn value_surface(&self, class: ValueClass) -> Option<&OperationTable> {
        self.value_surfaces.get(&class)
    }

    pub fn native_surface(&self, native: &NativeType) -> Option<&OperationTable> {
        self.native_surfaces.get(native)
    }
}

// ============================================================================
// Helpers shared by the built-in tables
// ============================================================================

pub(crate) fn fail(message: impl Into<String>) -> NativeError {
    NativeError::new(message)
}

/// Return-type hook: the type of the first argument.
pub(crate) fn first_argument_type(args: &[Type]) -> Result<Type> {
    Ok(args.first().cloned().unwrap_or(Type::General))
}

/// Return-type hook: the element type of the first argument.
pub(crate) fn first_element_type(args: &[Type]) -> Result<Type> {
    Ok(args
        .first()
        .and_then(Type::element_type)
        .cloned()
        .unwrap_or(Type::General))
}
