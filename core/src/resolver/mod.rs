//! Operation resolution and invocation.
//!
//! [`Resolver::resolve`] matches `(name, kind, argument types)` against the
//! [`Registry`] and memoizes the answer, failures included, in a process-wide
//! concurrent cache. Resolution tries, in order:
//!
//! 1. the cache;
//! 2. a direct match (providers for functions, the receiver's class chain for
//!    methods), picking the unique most preferable candidate;
//! 3. for methods, the native surface of the receiver's native form;
//! 4. element-wise mapping over array arguments;
//! 5. element-wise mapping over matrix arguments.
//!
//! Anything else is an invalid resolution whose return type is the error to
//! report.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Arc, RwLock};

use dashmap::DashMap;
use once_cell::sync::Lazy;
use smallvec::SmallVec;

use crate::conversion::{ConversionRule, NativeType, ValueClass, from_native};
use crate::errors::{Error, Result};
use crate::registry::{NativeOp, OperationTable, Provider, Registry};
use crate::types::{Relation, Type, compare};
use crate::values::Value;

/// Whether an operation is called as `f(args)` or `receiver.f(args)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Function,
    Method,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Function => write!(f, "function"),
            OperationKind::Method => write!(f, "method"),
        }
    }
}

/// Why a resolution failed.
#[derive(Debug, Clone, PartialEq)]
pub enum Unresolved {
    NoMatch,
    /// Signatures of the equally preferable candidates.
    Ambiguous(Vec<String>),
}

#[derive(Debug, Clone)]
pub enum Binding {
    Invalid(Unresolved),
    Direct {
        op: NativeOp,
        conversions: Vec<ConversionRule>,
    },
    /// Found on the native surface of `base` after converting the receiver.
    BaseConverted {
        base: NativeType,
        op: NativeOp,
        conversions: Vec<ConversionRule>,
    },
    /// `reduced[i]` is true when argument `i` is an array being mapped over.
    ArrayMapped {
        inner: Arc<ResolvedOperation>,
        reduced: Vec<bool>,
    },
    MatrixMapped {
        inner: Arc<ResolvedOperation>,
        reduced: Vec<bool>,
    },
}

/// The memoized result of resolving one `(name, kind, argument types)` key.
///
/// Two resolved operations are equal when their keys are.
#[derive(Debug, Clone)]
pub struct ResolvedOperation {
    name: String,
    kind: OperationKind,
    arg_types: Vec<Type>,
    binding: Binding,
    return_type: Result<Type>,
}

impl PartialEq for ResolvedOperation {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.kind == other.kind && self.arg_types == other.arg_types
    }
}

impl Eq for ResolvedOperation {}

impl Hash for ResolvedOperation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.kind.hash(state);
        self.arg_types.hash(state);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct OperationKey {
    name: String,
    kind: OperationKind,
    arg_types: SmallVec<[Type; 4]>,
}

impl ResolvedOperation {
    fn new(name: &str, kind: OperationKind, arg_types: &[Type], binding: Binding) -> Self {
        let return_type = Self::compute_return_type(name, arg_types, &binding);
        Self {
            name: name.to_string(),
            kind,
            arg_types: arg_types.to_vec(),
            binding,
            return_type,
        }
    }

    fn direct(
        name: &str,
        kind: OperationKind,
        arg_types: &[Type],
        found: Found,
        base: Option<NativeType>,
    ) -> Self {
        let return_type = match found.hook {
            Some(hook) => hook(arg_types),
            None => Ok(found.op.ret().value_type()),
        };
        let binding = match base {
            Some(base) => Binding::BaseConverted {
                base,
                op: found.op,
                conversions: found.conversions,
            },
            None => Binding::Direct {
                op: found.op,
                conversions: found.conversions,
            },
        };
        Self {
            name: name.to_string(),
            kind,
            arg_types: arg_types.to_vec(),
            binding,
            return_type,
        }
    }

    fn compute_return_type(name: &str, arg_types: &[Type], binding: &Binding) -> Result<Type> {
        match binding {
            Binding::Invalid(Unresolved::NoMatch) => Err(Error::NoMatchingOperation {
                name: name.to_string(),
                arg_types: arg_types.to_vec(),
            }),
            Binding::Invalid(Unresolved::Ambiguous(candidates)) => Err(Error::AmbiguousOperation {
                name: name.to_string(),
                arg_types: arg_types.to_vec(),
                candidates: candidates.clone(),
            }),
            Binding::ArrayMapped { inner, .. } => Ok(Type::array(inner.return_type()?)),
            Binding::MatrixMapped { inner, .. } => {
                Ok(Type::matrix(inner.return_type()?.matrix_element()?))
            }
            Binding::Direct { op, .. } | Binding::BaseConverted { op, .. } => {
                Ok(op.ret().value_type())
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn arg_types(&self) -> &[Type] {
        &self.arg_types
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self.binding, Binding::Invalid(_))
    }

    /// The type `invoke` produces; the resolution error for invalid bindings.
    pub fn return_type(&self) -> Result<Type> {
        self.return_type.clone()
    }

    fn resolution_error(&self) -> Error {
        match &self.return_type {
            Err(err) => err.clone(),
            Ok(_) => Error::NoMatchingOperation {
                name: self.name.clone(),
                arg_types: self.arg_types.clone(),
            },
        }
    }

    /// Call the operation on `args`, whose types should match the key's.
    pub fn invoke(&self, args: &[Value]) -> Result<Value> {
        if args.len() != self.arg_types.len() {
            return Err(Error::type_error(format!(
                "{} expects {} arguments, got {}",
                self.name,
                self.arg_types.len(),
                args.len()
            )));
        }
        match &self.binding {
            Binding::Invalid(_) => Err(self.resolution_error()),
            Binding::Direct { op, conversions } | Binding::BaseConverted { op, conversions, .. } => {
                let natives = conversions
                    .iter()
                    .zip(args)
                    .map(|(rule, arg)| rule.apply(arg))
                    .collect::<Result<Vec<_>>>()?;
                tracing::trace!(name = %self.name, "Invoking native operation");
                let result = op.call(&natives).map_err(|source| Error::NativeInvocationFailure {
                    name: self.name.clone(),
                    source,
                })?;
                conform(from_native(result)?, &self.return_type()?)
            }
            Binding::ArrayMapped { inner, reduced } => {
                let len = mapped_len(args, reduced, |arg| match arg {
                    Value::Array(a) => Some(a.len()),
                    _ => None,
                })?;
                let mut elements = Vec::with_capacity(len);
                let mut substituted = args.to_vec();
                for i in 0..len {
                    for ((slot, arg), is_reduced) in substituted.iter_mut().zip(args).zip(reduced) {
                        if let (true, Value::Array(a)) = (*is_reduced, arg)
                            && let Some(element) = a.get(i)
                        {
                            *slot = element.clone();
                        }
                    }
                    elements.push(inner.invoke(&substituted)?);
                }
                let element_type = inner.return_type()?;
                if element_type.is_concrete() {
                    Ok(Value::array_unchecked(element_type, elements))
                } else {
                    Value::array_with(element_type, elements)
                }
            }
            Binding::MatrixMapped { inner, reduced } => {
                let (rows, cols) = mapped_shape(args, reduced)?;
                let mut elements = Vec::with_capacity(rows * cols);
                let mut substituted = args.to_vec();
                for row in 0..rows {
                    for col in 0..cols {
                        for ((slot, arg), is_reduced) in substituted.iter_mut().zip(args).zip(reduced) {
                            if let (true, Value::Matrix(m)) = (*is_reduced, arg)
                                && let Some(element) = m.get(row, col)
                            {
                                *slot = element.clone();
                            }
                        }
                        elements.push(inner.invoke(&substituted)?);
                    }
                }
                Value::matrix_from_flat(rows, cols, elements)
            }
        }
    }
}

/// Convert an operation result to its declared concrete return type.
fn conform(value: Value, ty: &Type) -> Result<Value> {
    if ty.is_concrete() && value.ty() != *ty {
        value.convert_to(ty)
    } else {
        Ok(value)
    }
}

fn mapped_len(args: &[Value], reduced: &[bool], len_of: impl Fn(&Value) -> Option<usize>) -> Result<usize> {
    let mut len = None;
    for (arg, _) in args.iter().zip(reduced).filter(|(_, r)| **r) {
        let this = len_of(arg)
            .ok_or_else(|| Error::shape(format!("expected an array argument, found {}", arg.ty())))?;
        match len {
            None => len = Some(this),
            Some(expected) if expected != this => {
                return Err(Error::shape(format!(
                    "array arguments have different lengths: {expected} and {this}"
                )));
            }
            Some(_) => {}
        }
    }
    Ok(len.unwrap_or(0))
}

fn mapped_shape(args: &[Value], reduced: &[bool]) -> Result<(usize, usize)> {
    let mut shape = None;
    for (arg, _) in args.iter().zip(reduced).filter(|(_, r)| **r) {
        let Value::Matrix(m) = arg else {
            return Err(Error::shape(format!(
                "expected a matrix argument, found {}",
                arg.ty()
            )));
        };
        let this = (m.rows(), m.cols());
        match shape {
            None => shape = Some(this),
            Some(expected) if expected != this => {
                return Err(Error::shape(format!(
                    "matrix arguments have different dimensions: {}x{} and {}x{}",
                    expected.0, expected.1, this.0, this.1
                )));
            }
            Some(_) => {}
        }
    }
    shape.ok_or_else(|| Error::shape("no matrix argument to map over"))
}

// ============================================================================
// Candidate selection
// ============================================================================

/// A viable candidate with its argument conversions.
struct Found {
    op: NativeOp,
    conversions: Vec<ConversionRule>,
    hook: Option<crate::registry::ReturnTypeFn>,
}

enum Search {
    Found(Found),
    Ambiguous(Vec<String>),
    NotFound,
}

/// Compare two viable candidates argument by argument.
///
/// `Greater` means `a` is at least as good everywhere and better somewhere.
fn compare_candidates(a: &Found, b: &Found) -> Option<Ordering> {
    let mut overall = Ordering::Equal;
    for ((rule_a, rule_b), (formal_a, formal_b)) in a
        .conversions
        .iter()
        .zip(&b.conversions)
        .zip(a.op.params().iter().zip(b.op.params()))
    {
        let ord = match rule_a.preference(rule_b)? {
            Ordering::Equal => match compare(&formal_a.value_type(), &formal_b.value_type()) {
                Relation::Lower => Ordering::Greater,
                Relation::Higher => Ordering::Less,
                Relation::Equal | Relation::Incomparable => Ordering::Equal,
            },
            ord => ord,
        };
        overall = match (overall, ord) {
            (Ordering::Equal, ord) | (ord, Ordering::Equal) => ord,
            (x, y) if x == y => x,
            _ => return None,
        };
    }
    Some(overall)
}

/// Pick the most preferable viable candidate of one table.
fn search_table(table: &OperationTable, name: &str, arg_types: &[Type]) -> Search {
    let viable: Vec<Found> = table
        .candidates(name, arg_types.len())
        .filter_map(|op| {
            let conversions: Vec<ConversionRule> = op
                .params()
                .iter()
                .zip(arg_types)
                .map(|(formal, actual)| ConversionRule::for_types(formal, actual))
                .collect();
            conversions.iter().all(ConversionRule::is_possible).then(|| Found {
                op: op.clone(),
                conversions,
                hook: table.return_type_hook(name),
            })
        })
        .collect();

    let best: Vec<usize> = (0..viable.len())
        .filter(|&i| {
            (0..viable.len()).all(|j| {
                i == j
                    || matches!(
                        compare_candidates(&viable[i], &viable[j]),
                        Some(Ordering::Greater)
                    )
            })
        })
        .collect();

    match (viable.len(), best.as_slice()) {
        (0, _) => Search::NotFound,
        (_, [winner]) => match viable.into_iter().nth(*winner) {
            Some(found) => Search::Found(found),
            None => Search::NotFound,
        },
        _ => Search::Ambiguous(viable.iter().map(|f| f.op.signature()).collect()),
    }
}

// ============================================================================
// Resolver
// ============================================================================

static GLOBAL_RESOLVER: Lazy<Arc<Resolver>> =
    Lazy::new(|| Arc::new(Resolver::new(Registry::standard())));

/// Resolves operations against a registry and caches the results.
#[derive(Debug)]
pub struct Resolver {
    registry: RwLock<Arc<Registry>>,
    cache: DashMap<OperationKey, Arc<ResolvedOperation>>,
    scans: AtomicUsize,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(Registry::standard())
    }
}

impl Resolver {
    /// An isolated resolver with its own cache.
    pub fn new(registry: Registry) -> Self {
        Self {
            registry: RwLock::new(Arc::new(registry)),
            cache: DashMap::new(),
            scans: AtomicUsize::new(0),
        }
    }

    /// The process-wide resolver over the standard registry.
    pub fn global() -> &'static Resolver {
        &GLOBAL_RESOLVER
    }

    /// A shared handle to [`Resolver::global`].
    pub fn shared() -> Arc<Resolver> {
        Arc::clone(&GLOBAL_RESOLVER)
    }

    fn registry(&self) -> Arc<Registry> {
        match self.registry.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn update_registry(&self, update: impl FnOnce(&mut Registry)) {
        {
            let mut guard = match self.registry.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            update(Arc::make_mut(&mut guard));
        }
        self.clear_cache();
    }

    /// Add a function provider, searched after the existing ones.
    pub fn register_provider(&self, provider: Provider) {
        self.update_registry(|registry| registry.add_provider(provider));
    }

    /// Add a method to the surface of a value class.
    pub fn register_method(&self, class: ValueClass, op: NativeOp) {
        self.update_registry(|registry| registry.add_method(class, op));
    }

    /// Drop every cached resolution, valid or not.
    pub fn clear_cache(&self) {
        tracing::warn!(entries = self.cache.len(), "Clearing resolved operation cache");
        self.cache.clear();
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Number of resolutions that had to search the registry.
    pub fn scan_count(&self) -> usize {
        self.scans.load(AtomicOrdering::Relaxed)
    }

    pub fn resolve(&self, name: &str, kind: OperationKind, arg_types: &[Type]) -> Arc<ResolvedOperation> {
        let key = OperationKey {
            name: name.to_string(),
            kind,
            arg_types: arg_types.iter().cloned().collect(),
        };
        if let Some(hit) = self.cache.get(&key) {
            tracing::trace!(name, %kind, "Resolution cache hit");
            return hit.value().clone();
        }

        self.scans.fetch_add(1, AtomicOrdering::Relaxed);
        let resolved = Arc::new(self.search(name, kind, arg_types));
        tracing::debug!(name, %kind, valid = resolved.is_valid(), "Publishing resolution");
        self.cache.entry(key).or_insert(resolved).value().clone()
    }

    fn search(&self, name: &str, kind: OperationKind, arg_types: &[Type]) -> ResolvedOperation {
        let registry = self.registry();
        let invalid = |why| ResolvedOperation::new(name, kind, arg_types, Binding::Invalid(why));

        match self.search_direct(&registry, name, kind, arg_types) {
            Search::Found(found) => {
                tracing::trace!(name, op = %found.op.signature(), "Direct match");
                return ResolvedOperation::direct(name, kind, arg_types, found, None);
            }
            Search::Ambiguous(candidates) => return invalid(Unresolved::Ambiguous(candidates)),
            Search::NotFound => {}
        }

        if kind == OperationKind::Method
            && let Some(base) = arg_types.first().and_then(NativeType::native_form)
            && let Some(table) = registry.native_surface(&base)
        {
            match search_table(table, name, arg_types) {
                Search::Found(found) => {
                    tracing::trace!(name, %base, "Base-converted match");
                    return ResolvedOperation::direct(name, kind, arg_types, found, Some(base));
                }
                Search::Ambiguous(candidates) => return invalid(Unresolved::Ambiguous(candidates)),
                Search::NotFound => {}
            }
        }

        if let Some((inner, reduced)) = self.search_mapped(name, kind, arg_types, |ty| match ty {
            Type::Array(inner) => Some((**inner).clone()),
            _ => None,
        }) {
            return ResolvedOperation::new(name, kind, arg_types, Binding::ArrayMapped { inner, reduced });
        }
        if let Some((inner, reduced)) = self.search_mapped(name, kind, arg_types, |ty| match ty {
            Type::Matrix(inner) => Some((**inner).clone()),
            _ => None,
        }) {
            return ResolvedOperation::new(name, kind, arg_types, Binding::MatrixMapped { inner, reduced });
        }

        invalid(Unresolved::NoMatch)
    }

    fn search_direct(&self, registry: &Registry, name: &str, kind: OperationKind, arg_types: &[Type]) -> Search {
        match kind {
            OperationKind::Function => {
                for provider in registry.providers() {
                    match search_table(provider.table(), name, arg_types) {
                        Search::NotFound => continue,
                        outcome => return outcome,
                    }
                }
                Search::NotFound
            }
            OperationKind::Method => {
                let Some(receiver) = arg_types.first() else {
                    return Search::NotFound;
                };
                // The first class with a viable candidate shadows the rest of the chain.
                for class in ValueClass::of(receiver).chain() {
                    if let Some(table) = registry.value_surface(*class) {
                        match search_table(table, name, arg_types) {
                            Search::NotFound => continue,
                            outcome => return outcome,
                        }
                    }
                }
                Search::NotFound
            }
        }
    }

    /// Resolve against the element types of the containers `element_of` recognizes.
    ///
    /// Returns the element-level resolution and which arguments were reduced.
    fn search_mapped(
        &self,
        name: &str,
        kind: OperationKind,
        arg_types: &[Type],
        element_of: impl Fn(&Type) -> Option<Type>,
    ) -> Option<(Arc<ResolvedOperation>, Vec<bool>)> {
        let reduced: Vec<bool> = arg_types.iter().map(|ty| element_of(ty).is_some()).collect();
        if !reduced.iter().any(|r| *r) {
            return None;
        }
        let element_types: Vec<Type> = arg_types
            .iter()
            .map(|ty| element_of(ty).unwrap_or_else(|| ty.clone()))
            .collect();
        let inner = self.resolve(name, kind, &element_types);
        inner.is_valid().then_some((inner, reduced))
    }
}

#[cfg(test)]
#[path = "resolver_test.rs"]
mod resolver_test;
