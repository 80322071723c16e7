//! Named constants consulted after the scope during identifier lookup.

use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};

use hashbrown::HashMap;
use num_complex::Complex64;
use once_cell::sync::Lazy;

use super::Scope;
use crate::errors::Result;
use crate::types::Type;
use crate::values::Value;

static GLOBAL_CONSTANTS: Lazy<Arc<Constants>> = Lazy::new(|| Arc::new(Constants::with_defaults()));

/// A host-editable table of named values.
#[derive(Debug, Default)]
pub struct Constants {
    table: RwLock<HashMap<String, Value>>,
}

fn defaults() -> HashMap<String, Value> {
    let mut table: HashMap<String, Value> = HashMap::new();
    let mut add = |name: &str, value: Value| {
        table.insert(name.to_string(), value);
    };

    add("pi", Value::Double(std::f64::consts::PI));
    add("PI", Value::Double(std::f64::consts::PI));
    add("e", Value::Double(std::f64::consts::E));
    add("E", Value::Double(std::f64::consts::E));
    add("i", Value::Complex(Complex64::new(0.0, 1.0)));
    add("j", Value::Complex(Complex64::new(0.0, 1.0)));
    add("true", Value::Boolean(true));
    add("false", Value::Boolean(false));
    add("NaN", Value::Double(f64::NAN));
    add("Infinity", Value::Double(f64::INFINITY));

    add("MaxUnsignedByte", Value::UnsignedByte(u8::MAX));
    add("MinUnsignedByte", Value::UnsignedByte(u8::MIN));
    add("MaxShort", Value::Short(i16::MAX));
    add("MinShort", Value::Short(i16::MIN));
    add("MaxInt", Value::Int(i32::MAX));
    add("MinInt", Value::Int(i32::MIN));
    add("MaxLong", Value::Long(i64::MAX));
    add("MinLong", Value::Long(i64::MIN));
    add("MaxDouble", Value::Double(f64::MAX));
    add("MinDouble", Value::Double(f64::MIN_POSITIVE));

    // Type prototypes for cast() and parameter annotations.
    add("boolean", Value::Boolean(false));
    add("unsignedByte", Value::UnsignedByte(0));
    add("short", Value::Short(0));
    add("int", Value::Int(0));
    add("long", Value::Long(0));
    add("float", Value::Float(0.0));
    add("double", Value::Double(0.0));
    add("complex", Value::Complex(Complex64::new(0.0, 0.0)));
    add("string", Value::string(""));

    for name in ["HOME", "USER"] {
        if let Ok(value) = std::env::var(name) {
            add(name, Value::string(value));
        }
    }
    if let Ok(cwd) = std::env::current_dir() {
        add("CWD", Value::string(cwd.to_string_lossy()));
    }
    table
}

impl Constants {
    /// The process-wide table.
    pub fn global() -> &'static Constants {
        &GLOBAL_CONSTANTS
    }

    /// A shared handle to [`Constants::global`].
    pub fn shared() -> Arc<Constants> {
        Arc::clone(&GLOBAL_CONSTANTS)
    }

    /// A fresh table holding the built-in constants.
    pub fn with_defaults() -> Self {
        Self {
            table: RwLock::new(defaults()),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        match self.table.read() {
            Ok(table) => table.get(name).cloned(),
            Err(poisoned) => poisoned.into_inner().get(name).cloned(),
        }
    }

    pub fn add(&self, name: impl Into<String>, value: Value) {
        let name = name.into();
        tracing::debug!(%name, %value, "Adding constant");
        self.write().insert(name, value);
    }

    pub fn remove(&self, name: &str) -> Option<Value> {
        self.write().remove(name)
    }

    /// Drop host additions and restore the built-in constants.
    pub fn reset(&self) {
        *self.write() = defaults();
    }

    pub fn names(&self) -> BTreeSet<String> {
        match self.table.read() {
            Ok(table) => table.keys().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().keys().cloned().collect(),
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Value>> {
        match self.table.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Scope for Constants {
    fn get(&self, name: &str) -> Result<Option<Value>> {
        Ok(Constants::get(self, name))
    }

    fn get_type(&self, name: &str) -> Result<Option<Type>> {
        Ok(Constants::get(self, name).map(|value| value.ty()))
    }

    fn identifiers(&self) -> BTreeSet<String> {
        self.names()
    }
}
