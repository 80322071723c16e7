//! Source text to [`Ast`](crate::ast::Ast), via a pest grammar.

#[allow(clippy::module_inception)]
mod parser;

pub use parser::{ExpressionParser, Rule, parse, parse_in};


#[cfg(test)]
mod precedence_test;

#[cfg(test)]
mod rule_valid_test;
