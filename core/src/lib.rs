//! Embeddable expression-language engine.
//!
//! Source text is parsed into an arena [`Ast`](ast::Ast); the
//! [`inference`] visitor predicts its type and the [`evaluator`] computes
//! its value. Named operations are matched against native implementations
//! by the [`resolver`], which caches every answer and broadcasts scalar
//! operations over arrays and matrices.
//!
//! ```
//! use tessera_core::scope::MapScope;
//! use tessera_core::types::Type;
//! use tessera_core::values::Value;
//!
//! let ast = tessera_core::parse("(x > 0) ? 1 : -1").unwrap();
//! let scope: MapScope = [("x", Value::Int(-5))].into_iter().collect();
//! assert_eq!(tessera_core::evaluate(&ast, &scope).unwrap(), Value::Int(-1));
//! assert_eq!(tessera_core::infer(&ast, &scope).unwrap(), Type::Int);
//! ```

pub mod api;
pub mod ast;
pub mod conversion;
pub mod errors;
pub mod evaluator;
pub mod inference;
pub mod parser;
pub mod pseudo;
pub mod registry;
pub mod resolver;
pub mod scope;
pub mod syntax;
pub mod types;
pub mod values;

pub use api::{Engine, EngineOptions, ExternalEngine, evaluate, infer, parse, trace};
pub use errors::{Error, NativeError, Result};

/// Logging hooks shared by the unit tests.
#[cfg(test)]
pub mod test_utils {
    /// Routes `tracing` output through the test harness so it shows up next
    /// to a failing test. `RUST_LOG` picks the filter, `debug` otherwise.
    /// Only the first call installs the subscriber.
    pub fn init_test_logging() {
        use tracing_subscriber::{EnvFilter, fmt};

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        // A subscriber installed by an earlier test stays in place.
        let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
    }

    #[test]
    fn test_logging_setup_is_repeatable() {
        init_test_logging();
        init_test_logging();
        tracing::debug!(target: "tessera_core::test_utils", "subscriber installed");
    }
}

