//! Closures defined inside expressions.

use std::fmt;

use crate::ast::Ast;
use crate::types::Type;

/// A function value created by `function(x:int, y) body`.
///
/// The body is a private copy of the defining subtree in which every free
/// identifier other than the parameters was already replaced by its value
/// in the defining scope.
#[derive(Debug, Clone)]
pub struct ExpressionFunction {
    params: Vec<(String, Type)>,
    body: Ast,
    return_type: Type,
}

impl ExpressionFunction {
    pub fn new(params: Vec<(String, Type)>, body: Ast, return_type: Type) -> Self {
        Self {
            params,
            body,
            return_type,
        }
    }

    pub fn params(&self) -> &[(String, Type)] {
        &self.params
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn body(&self) -> &Ast {
        &self.body
    }

    pub fn return_type(&self) -> &Type {
        &self.return_type
    }

    pub fn ty(&self) -> Type {
        Type::function(
            self.params.iter().map(|(_, ty)| ty.clone()).collect(),
            self.return_type.clone(),
        )
    }
}

impl PartialEq for ExpressionFunction {
    fn eq(&self, other: &Self) -> bool {
        self.params == other.params
            && self.return_type == other.return_type
            && self.body.to_source() == other.body.to_source()
    }
}

impl fmt::Display for ExpressionFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(function(")?;
        for (i, (name, ty)) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match ty {
                Type::General => write!(f, "{name}")?,
                ty => write!(f, "{name}:{ty}")?,
            }
        }
        write!(f, ") {})", self.body.to_source())
    }
}
