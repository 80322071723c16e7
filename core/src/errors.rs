//! Error values shared by the parser, the resolver and both visitors.
//!
//! Every failure is reported as an [`Error`] value and propagates unchanged
//! up to the caller of [`infer`](crate::infer) or [`evaluate`](crate::evaluate).
//! Nothing inside the engine recovers from an error; the host decides whether
//! to retry, substitute a default or give up.

use crate::types::Type;
use thiserror::Error as ThisError;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors produced while parsing, inferring or evaluating an expression.
#[derive(Debug, Clone, PartialEq, ThisError)]
pub enum Error {
    #[error("Parse error at {position}: {message}")]
    Parse { message: String, position: usize },

    #[error("The ID {0} is undefined")]
    UndefinedIdentifier(String),

    /// An operator was applied to operands of incompatible types, a branch
    /// condition was not boolean, or an index had the wrong arity.
    #[error("Type error: {0}")]
    TypeError(String),

    #[error("No operation found matching {name}({})", format_types(.arg_types))]
    NoMatchingOperation { name: String, arg_types: Vec<Type> },

    #[error(
        "Ambiguous operation {name}({}); candidates: {}",
        format_types(.arg_types),
        .candidates.join(", ")
    )]
    AmbiguousOperation {
        name: String,
        arg_types: Vec<Type>,
        candidates: Vec<String>,
    },

    #[error("Irregular shape: {0}")]
    IrregularShape(String),

    #[error("Native operation {name} failed: {source}")]
    NativeInvocationFailure {
        name: String,
        #[source]
        source: NativeError,
    },

    #[error("Index {index} out of bounds (length: {len})")]
    IndexOutOfBounds { index: i64, len: usize },

    #[error("Division by zero")]
    DivisionByZero,

    /// Reserved for the reactive-variable layer of a host. Never raised here.
    #[error("Dependency cycle: {0}")]
    DependencyCycle(String),

    #[error("Scope lookup failed: {0}")]
    Scope(String),

    #[error("External engine: {0}")]
    External(String),

    #[error("Evaluation depth {depth} exceeds maximum of {max_depth}")]
    DepthExceeded { depth: usize, max_depth: usize },
}

/// Failure raised by a native operation body.
#[derive(Debug, Clone, PartialEq, ThisError)]
#[error("{message}")]
pub struct NativeError {
    pub message: String,
}

impl NativeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Error {
    pub(crate) fn type_error(detail: impl Into<String>) -> Self {
        Error::TypeError(detail.into())
    }

    pub(crate) fn shape(detail: impl Into<String>) -> Self {
        Error::IrregularShape(detail.into())
    }
}

fn format_types(types: &[Type]) -> String {
    types
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<pest::error::Error<crate::parser::Rule>> for Error {
    fn from(err: pest::error::Error<crate::parser::Rule>) -> Self {
        let position = match err.location {
            pest::error::InputLocation::Pos(pos) => pos,
            pest::error::InputLocation::Span((start, _)) => start,
        };
        Error::Parse {
            message: err.variant.message().to_string(),
            position,
        }
    }
}
