//! Tree-walking evaluator.
//!
//! The evaluator computes one [`Value`] per node. The rules that set it
//! apart from a plain interpreter:
//!
//! - **Memoization**: a node marked constant at parse time caches its value
//!   on first evaluation and never recomputes it, whatever the scope.
//! - **Short-circuit**: `&&` and `||` stop at the first operand that decides
//!   the result.
//! - **Lazy branches**: a functional-if evaluates one branch but widens its
//!   value to the join of both branches' inferred types.
//! - **Indexing**: applying an array or matrix value indexes into it; a
//!   scalar applied to all-zero indices is itself.
//! - **Closures**: `function(...) body` captures a copy of the body with its
//!   free identifiers already replaced by their values.
//!
//! ## Example
//!
//! ```
//! use tessera_core::{evaluator, parser};
//! use tessera_core::scope::MapScope;
//! use tessera_core::values::Value;
//!
//! let ast = parser::parse("[1, 2, 3] + [10, 20, 30]").unwrap();
//! let value = evaluator::evaluate(&ast, &MapScope::new()).unwrap();
//! assert_eq!(value.to_string(), "[11, 22, 33]");
//! ```

mod eval;
mod trace;


#[cfg(test)]
#[path = "trace_test.rs"]
mod trace_test;

use crate::api::Environment;
use crate::ast::{Ast, NodeId};
use crate::errors::Result;
use crate::scope::Scope;
use crate::values::Value;

pub(crate) use eval::scalar_index_count;

use eval::Evaluator;
use trace::TraceLog;

/// Evaluate `ast` with the process-wide environment.
pub fn evaluate(ast: &Ast, scope: &dyn Scope) -> Result<Value> {
    evaluate_in(ast, scope, Environment::global())
}

pub fn evaluate_in(ast: &Ast, scope: &dyn Scope, env: Environment<'_>) -> Result<Value> {
    tracing::debug!(nodes = ast.len(), "Evaluating expression");
    Evaluator::new(ast, scope, env).evaluate()
}

/// Evaluate `ast` and return the step log.
///
/// Every node contributes an `Entering node <Kind>` line and, once it
/// completes, a `Node <Kind> evaluated to <value>` line. Resolved operations
/// add `Invoking <name>`. An error ends the log with `Error: <message>`.
pub fn trace(ast: &Ast, scope: &dyn Scope) -> String {
    trace_in(ast, scope, Environment::global())
}

pub fn trace_in(ast: &Ast, scope: &dyn Scope, env: Environment<'_>) -> String {
    let log = TraceLog::default();
    let result = Evaluator::new(ast, scope, env).with_trace(&log).evaluate();
    if let Err(err) = result {
        log.push(0, &format!("Error: {err}"));
    }
    log.into_string()
}

/// Evaluate a single subtree, continuing the caller's depth count.
pub(crate) fn evaluate_node(
    ast: &Ast,
    id: NodeId,
    scope: &dyn Scope,
    env: Environment<'_>,
    depth: usize,
) -> Result<Value> {
    Evaluator::new(ast, scope, env)
        .with_depth(depth)
        .evaluate_node(id)
}
