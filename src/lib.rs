//! Tessera - an embeddable expression language
//!
//! # Overview
//!
//! Tessera evaluates small numeric expressions supplied at runtime by users
//! of a host application: formulas in a spreadsheet-like tool, derived
//! signals in a plotting front end, thresholds in a monitoring rule. An
//! expression is parsed once, type-checked against the host's variables
//! and evaluated as often as needed.
//!
//! Operators broadcast over arrays and matrices, and named operations such
//! as `sqrt(x)` or `s.length()` are matched against native implementations
//! registered with a resolver.
//!
//! # Quick Start
//!
//! ```
//! use tessera::{Engine, EngineOptions, MapScope, Type, Value};
//!
//! let engine = Engine::new(EngineOptions::default());
//! let ast = engine.parse("(x > 0) ? 1 : -1").unwrap();
//!
//! let scope: MapScope = [("x", Value::Int(-5))].into_iter().collect();
//! assert_eq!(engine.infer(&ast, &scope).unwrap(), Type::Int);
//! assert_eq!(engine.evaluate(&ast, &scope).unwrap(), Value::Int(-1));
//! ```
//!
//! # Extending
//!
//! Hosts add operations by registering a [`Provider`](registry::Provider)
//! with the resolver, and can forward `external(...)` calls to another
//! numeric engine through [`ExternalEngine`].
//!
//! ```
//! use std::sync::Arc;
//!
//! use tessera::conversion::{Native, NativeType};
//! use tessera::registry::{NativeOp, OperationTable, Provider, Registry};
//! use tessera::resolver::Resolver;
//! use tessera::{Constants, Engine, EngineOptions, MapScope, NativeError};
//!
//! fn twice(args: &[Native]) -> Result<Native, NativeError> {
//!     Ok(Native::I32(args[0].as_i32()? * 2))
//! }
//!
//! let mut table = OperationTable::new();
//! table.add(NativeOp::new("twice", vec![NativeType::I32], NativeType::I32, twice));
//!
//! let resolver = Arc::new(Resolver::new(Registry::standard()));
//! let engine = Engine::with_parts(EngineOptions::default(), resolver, Constants::shared());
//! engine.resolver().register_provider(Provider::new("host", table));
//! let ast = engine.parse("twice([1, 2])").unwrap();
//! assert_eq!(engine.evaluate(&ast, &MapScope::new()).unwrap().to_string(), "[2, 4]");
//! ```

// Re-export public API from tessera_core
pub use tessera_core::api::{
    CompilationOptions, Engine, EngineOptions, Environment, ExecutionOptions, ExternalEngine,
};
pub use tessera_core::{Error, NativeError, Result, evaluate, infer, parse, trace};

// Re-export commonly used types and values
pub use tessera_core::ast::{self, Ast};
pub use tessera_core::scope::{self, Constants, EmptyScope, MapScope, Scope};
pub use tessera_core::types::{self, Type};
pub use tessera_core::values::{self, Value};

pub use tessera_core::{conversion, registry, resolver};
