//! Opaque references to host objects.

use std::fmt;
use std::sync::Arc;

use super::Value;

/// A host object that expressions can carry around without looking inside.
///
/// Objects that expose a sequence of values can be folded over with `fold`.
pub trait ForeignObject: fmt::Debug + Send + Sync {
    fn class_name(&self) -> &str;

    /// The values this object yields when iterated, if it is iterable.
    fn values(&self) -> Option<Vec<Value>> {
        None
    }
}

/// Opaque reference value; its type is `object("<class>")`.
#[derive(Clone)]
pub struct ObjectRef {
    class: Arc<str>,
    payload: Option<Arc<dyn ForeignObject>>,
}

impl ObjectRef {
    /// A reference that only names a class, as built by `object("Name")`.
    pub fn named(class: &str) -> Self {
        Self {
            class: Arc::from(class),
            payload: None,
        }
    }

    pub fn new(payload: Arc<dyn ForeignObject>) -> Self {
        Self {
            class: Arc::from(payload.class_name()),
            payload: Some(payload),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class
    }

    pub(crate) fn class(&self) -> Arc<str> {
        self.class.clone()
    }

    pub fn payload(&self) -> Option<&Arc<dyn ForeignObject>> {
        self.payload.as_ref()
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.class == other.class
            && match (&self.payload, &other.payload) {
                (None, None) => true,
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                _ => false,
            }
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRef")
            .field("class", &self.class)
            .field("payload", &self.payload)
            .finish()
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "object(\"{}\")", self.class)
    }
}
