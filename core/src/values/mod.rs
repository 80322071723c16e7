//! Runtime values.
//!
//! [`Value`] is the token type every visitor and native operation passes
//! around. Conversions up the lattice live in `convert`, operator semantics
//! in [`operators`].

mod convert;
mod fixpoint;
mod function;
mod object;
pub mod operators;
mod value;

pub use fixpoint::FixPoint;
pub use function::ExpressionFunction;
pub use object::{ForeignObject, ObjectRef};
pub use value::{ArrayValue, MatrixValue, UnionValue, Value};
pub(crate) use value::format_double;
