pub mod lattice;
pub mod operators;
mod types;

pub use lattice::{Relation, compare, least_upper_bound, least_upper_bound_of};
pub use types::{FunctionType, MAX_FIX_BITS, Precision, Type};
