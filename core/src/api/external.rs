//! Bridge to an external numeric engine, reached through `external(...)`.

use std::fmt;

use crate::errors::Result;
use crate::types::Type;
use crate::values::Value;

/// A host-supplied evaluator for expressions written in another language.
///
/// `external("x * 2", x)` ships the expression text together with the values
/// of every free identifier mentioned in the call. The engine does not
/// interpret the text; whatever the implementation returns becomes the
/// value of the call.
pub trait ExternalEngine: fmt::Debug + Send + Sync {
    fn evaluate(&self, expression: &str, variables: &[(String, Value)]) -> Result<Value>;

    /// Static type of `expression`, used by inference. Unknown by default.
    fn result_type(&self, expression: &str) -> Type {
        let _ = expression;
        Type::General
    }
}
