//! Public API for the tessera expression language.
//!
//! An [`Engine`] bundles the operation resolver, the constants table, an
//! optional [`ExternalEngine`] and the [`EngineOptions`]. The free functions
//! here use the process-wide resolver and constants with default options.
//!
//! # Example
//!
//! ```
//! use tessera_core::api;
//! use tessera_core::scope::EmptyScope;
//! use tessera_core::types::Type;
//! use tessera_core::values::Value;
//!
//! let ast = api::parse("1 + 2 * 3").unwrap();
//! assert_eq!(api::infer(&ast, &EmptyScope).unwrap(), Type::Int);
//! assert_eq!(api::evaluate(&ast, &EmptyScope).unwrap(), Value::Int(7));
//! ```

pub mod engine;
pub mod environment;
pub mod external;
pub mod options;

pub use engine::Engine;
pub use environment::Environment;
pub use external::ExternalEngine;
pub use options::{CompilationOptions, EngineOptions, ExecutionOptions};

use crate::ast::Ast;
use crate::errors::Result;
use crate::scope::Scope;
use crate::types::Type;
use crate::values::Value;
use crate::{evaluator, inference, parser};

pub fn parse(source: &str) -> Result<Ast> {
    parser::parse(source)
}

pub fn infer(ast: &Ast, scope: &dyn Scope) -> Result<Type> {
    inference::infer_in(ast, scope, Environment::global())
}

pub fn evaluate(ast: &Ast, scope: &dyn Scope) -> Result<Value> {
    evaluator::evaluate_in(ast, scope, Environment::global())
}

pub fn trace(ast: &Ast, scope: &dyn Scope) -> String {
    evaluator::trace_in(ast, scope, Environment::global())
}
