//! The tessera engine.

use std::sync::Arc;

use super::{EngineOptions, Environment, ExternalEngine};
use crate::ast::Ast;
use crate::errors::Result;
use crate::resolver::Resolver;
use crate::scope::{Constants, Scope};
use crate::types::Type;
use crate::values::Value;
use crate::{evaluator, inference, parser};

/// Parses, type-checks and evaluates expressions.
///
/// The engine owns handles to a [`Resolver`] and a [`Constants`] table.
/// [`Engine::new`] shares the process-wide ones; [`Engine::with_parts`] lets
/// tests and hosts run against isolated instances.
///
/// # Example
///
/// ```
/// use tessera_core::api::{Engine, EngineOptions};
/// use tessera_core::scope::MapScope;
/// use tessera_core::values::Value;
///
/// let engine = Engine::new(EngineOptions::default());
/// let ast = engine.parse("(x > 0) ? 1 : -1").unwrap();
///
/// let mut scope = MapScope::new();
/// scope.insert("x", Value::Int(-5));
/// assert_eq!(engine.evaluate(&ast, &scope).unwrap(), Value::Int(-1));
/// ```
#[derive(Debug)]
pub struct Engine {
    options: EngineOptions,
    resolver: Arc<Resolver>,
    constants: Arc<Constants>,
    external: Option<Arc<dyn ExternalEngine>>,
}

impl Engine {
    /// Create an engine over the process-wide resolver and constants.
    pub fn new(options: EngineOptions) -> Self {
        Self::with_parts(options, Resolver::shared(), Constants::shared())
    }

    pub fn with_parts(
        options: EngineOptions,
        resolver: Arc<Resolver>,
        constants: Arc<Constants>,
    ) -> Self {
        Self {
            options,
            resolver,
            constants,
            external: None,
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn constants(&self) -> &Constants {
        &self.constants
    }

    /// Install the engine that `external(...)` calls are forwarded to.
    pub fn set_external(&mut self, external: Arc<dyn ExternalEngine>) {
        self.external = Some(external);
    }

    pub fn environment(&self) -> Environment<'_> {
        Environment::new(
            &self.resolver,
            &self.constants,
            self.external.as_deref(),
            &self.options,
        )
    }

    pub fn parse(&self, source: &str) -> Result<Ast> {
        parser::parse_in(source, self.environment())
    }

    /// Static type of `ast` under `scope`.
    pub fn infer(&self, ast: &Ast, scope: &dyn Scope) -> Result<Type> {
        inference::infer_in(ast, scope, self.environment())
    }

    pub fn evaluate(&self, ast: &Ast, scope: &dyn Scope) -> Result<Value> {
        evaluator::evaluate_in(ast, scope, self.environment())
    }

    /// Evaluate `ast` and return the step log instead of the value.
    ///
    /// An error ends the log with an `Error: ...` line.
    pub fn trace(&self, ast: &Ast, scope: &dyn Scope) -> String {
        evaluator::trace_in(ast, scope, self.environment())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}
