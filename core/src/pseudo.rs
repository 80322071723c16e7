//! Names both visitors treat specially instead of resolving them.
//!
//! A call `name(args)` is a pseudo-function call when `name` is one of the
//! names below and the scope does not bind it to a value. Inference and
//! evaluation consult the same [`PseudoFunction::lookup`], so they always
//! agree on which calls bypass the resolver.

use std::fmt;

use crate::ast::{Ast, NodeId};
use crate::errors::{Error, Result};
use crate::types::{Precision, Type};
use crate::values::{FixPoint, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoFunction {
    /// `cast(prototype, value)`
    Cast,
    /// `fix(value, totalBits, integerBits)`
    Fix,
    /// `eval(source)`
    Eval,
    /// `external(expression, args...)`
    External,
    /// `fold(function, initial, iterable)`
    Fold,
    /// `object(className)`
    Object,
}

impl PseudoFunction {
    pub const ALL: [PseudoFunction; 6] = [
        PseudoFunction::Cast,
        PseudoFunction::Fix,
        PseudoFunction::Eval,
        PseudoFunction::External,
        PseudoFunction::Fold,
        PseudoFunction::Object,
    ];

    pub fn lookup(name: &str) -> Option<PseudoFunction> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            PseudoFunction::Cast => "cast",
            PseudoFunction::Fix => "fix",
            PseudoFunction::Eval => "eval",
            PseudoFunction::External => "external",
            PseudoFunction::Fold => "fold",
            PseudoFunction::Object => "object",
        }
    }

    /// Reject a call with the wrong number of arguments.
    pub fn check_arity(self, count: usize) -> Result<()> {
        let ok = match self {
            PseudoFunction::Cast => count == 2,
            PseudoFunction::Fix => count == 3,
            PseudoFunction::Eval | PseudoFunction::Object => count == 1,
            PseudoFunction::External => count >= 1,
            PseudoFunction::Fold => count == 3,
        };
        if ok {
            Ok(())
        } else {
            Err(Error::type_error(format!(
                "{self} does not take {count} arguments"
            )))
        }
    }
}

impl fmt::Display for PseudoFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}()", self.name())
    }
}

/// Arguments that must be known without consulting the scope.
pub(crate) fn require_static(ast: &Ast, id: NodeId, pseudo: PseudoFunction) -> Result<()> {
    if ast.is_static(id) {
        Ok(())
    } else {
        Err(Error::type_error(format!(
            "{pseudo} expects a constant argument, found {}",
            ast.source_of(id)
        )))
    }
}

pub(crate) fn expect_string(value: &Value, pseudo: PseudoFunction) -> Result<&str> {
    value.as_str().ok_or_else(|| {
        Error::type_error(format!(
            "{pseudo} expects a string, found {value} of type {}",
            value.ty()
        ))
    })
}

/// Bit counts of `fix(value, total, integer)` as a precision.
pub(crate) fn fix_precision(total: &Value, integer: &Value) -> Result<Precision> {
    let bits = |value: &Value, what: &str| -> Result<u32> {
        value
            .as_i64()
            .and_then(|bits| u32::try_from(bits).ok())
            .ok_or_else(|| {
                Error::type_error(format!(
                    "fix() expects a non-negative integer {what}, found {value}"
                ))
            })
    };
    Precision::new(bits(total, "total bit count")?, bits(integer, "integer bit count")?)
}

/// Quantize `value` to `precision`, element-wise for arrays and matrices.
pub(crate) fn to_fix(value: &Value, precision: Precision) -> Result<Value> {
    match value {
        Value::Fix(f) => Ok(Value::Fix(f.quantize(precision))),
        Value::Array(array) => {
            let elements = array
                .elements()
                .iter()
                .map(|e| to_fix(e, precision))
                .collect::<Result<Vec<_>>>()?;
            Value::array_with(Type::fix(precision), elements)
        }
        Value::Matrix(matrix) => {
            let elements = matrix
                .elements()
                .iter()
                .map(|e| to_fix(e, precision))
                .collect::<Result<Vec<_>>>()?;
            Value::matrix_from_flat(matrix.rows(), matrix.cols(), elements)
        }
        other => {
            if let Some(integer) = other.as_i64() {
                Ok(Value::Fix(FixPoint::from_integer(integer, precision)))
            } else if let Some(real) = other.as_f64() {
                Ok(Value::Fix(FixPoint::from_f64(real, precision)))
            } else {
                Err(Error::type_error(format!(
                    "fix() cannot quantize {other} of type {}",
                    other.ty()
                )))
            }
        }
    }
}

/// Type of `fix(value, ...)` for an argument of type `ty`.
pub(crate) fn fix_type(ty: &Type, precision: Precision) -> Result<Type> {
    match ty {
        Type::Array(inner) => Ok(Type::array(fix_type(inner, precision)?)),
        Type::Matrix(inner) => Ok(Type::matrix(fix_type(inner, precision)?)),
        Type::Unknown
        | Type::General
        | Type::Scalar
        | Type::Fix(_)
        | Type::UnsignedByte
        | Type::Short
        | Type::Int
        | Type::Long
        | Type::Float
        | Type::Double => Ok(Type::fix(precision)),
        other => Err(Error::type_error(format!(
            "fix() cannot quantize a value of type {other}"
        ))),
    }
}
