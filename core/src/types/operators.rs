//! Type-level versions of the value operators.
//!
//! Each function here predicts the type the matching value operator in
//! [`values::operators`](crate::values::operators) produces, without looking
//! at any value. Both sides share [`scalar_result`] so they cannot drift apart.

use crate::errors::{Error, Result};
use crate::syntax::{ArithmeticOp, BitwiseOp, RelationalOp, ShiftOp, UnaryOp};

use super::Type;
use super::lattice::{is_lower_or_equal, least_upper_bound};

/// Whether `op` is defined on values of the concrete scalar type `ty`.
pub fn supports(ty: &Type, op: ArithmeticOp) -> bool {
    use ArithmeticOp::*;
    match ty {
        Type::Boolean => matches!(op, Add | Multiply),
        Type::UnsignedByte | Type::Short | Type::Int | Type::Long | Type::Float | Type::Double => {
            true
        }
        Type::Complex | Type::Fix(_) => !matches!(op, Modulo),
        Type::String => matches!(op, Add),
        _ => false,
    }
}

/// Result type of `op` applied to two scalar (or string) operand types.
///
/// Both operands are converted to their join; the join must be a concrete
/// type supporting `op`. Fixed-point results grow their precision.
pub fn scalar_result(op: ArithmeticOp, left: &Type, right: &Type) -> Result<Type> {
    if let (Type::Fix(Some(p)), Type::Fix(Some(q))) = (left, right) {
        return match op {
            ArithmeticOp::Add | ArithmeticOp::Subtract => Ok(Type::fix(p.sum(q)?)),
            ArithmeticOp::Multiply => Ok(Type::fix(p.product(q)?)),
            ArithmeticOp::Divide => Ok(Type::fix(p.join(q))),
            ArithmeticOp::Modulo => Err(incompatible(op, left, right)),
        };
    }
    let join = least_upper_bound(left, right);
    if join.is_abstract() {
        // An abstract operand (scalar, general) only tells us the family.
        if left.is_concrete() && right.is_concrete() {
            return Err(incompatible(op, left, right));
        }
        return Ok(join);
    }
    if supports(&join, op) {
        Ok(join)
    } else {
        Err(incompatible(op, left, right))
    }
}

fn incompatible(op: ArithmeticOp, left: &Type, right: &Type) -> Error {
    Error::type_error(format!(
        "{} is not supported between {left} and {right}",
        op.name()
    ))
}

fn passthrough(left: &Type, right: &Type) -> Option<Type> {
    match (left, right) {
        (Type::General, _) | (_, Type::General) => Some(Type::General),
        (Type::Unknown, other) | (other, Type::Unknown) => Some(other.clone()),
        _ => None,
    }
}

/// Result type of a binary arithmetic operator, with broadcasting.
pub fn arithmetic(op: ArithmeticOp, left: &Type, right: &Type) -> Result<Type> {
    if let Some(ty) = passthrough(left, right) {
        return Ok(ty);
    }
    match (left, right) {
        (Type::Array(x), Type::Array(y)) => Ok(Type::array(arithmetic(op, x, y)?)),
        (Type::Array(x), other) if !matches!(other, Type::Matrix(_)) => {
            Ok(Type::array(arithmetic(op, x, other)?))
        }
        (other, Type::Array(y)) if !matches!(other, Type::Matrix(_)) => {
            Ok(Type::array(arithmetic(op, other, y)?))
        }
        (Type::Matrix(x), Type::Matrix(y)) => {
            if op == ArithmeticOp::Modulo {
                return Err(incompatible(op, left, right));
            }
            Ok(Type::matrix(arithmetic(op, x, y)?.matrix_element()?))
        }
        (Type::Matrix(x), other) if other.is_scalar() => {
            Ok(Type::matrix(arithmetic(op, x, other)?.matrix_element()?))
        }
        (other, Type::Matrix(y)) if other.is_scalar() => {
            Ok(Type::matrix(arithmetic(op, other, y)?.matrix_element()?))
        }
        (Type::Record(x), Type::Record(y)) => {
            let mut fields = std::collections::BTreeMap::new();
            for (label, tx) in x {
                if let Some(ty) = y.get(label) {
                    fields.insert(label.clone(), arithmetic(op, tx, ty)?);
                }
            }
            Ok(Type::Record(fields))
        }
        (l, r) if (l.is_scalar() || *l == Type::String) && (r.is_scalar() || *r == Type::String) => {
            scalar_result(op, l, r)
        }
        _ => Err(incompatible(op, left, right)),
    }
}

/// Result type of `base ^ exponent`.
pub fn power(base: &Type, exponent: &Type) -> Result<Type> {
    if !matches!(exponent, Type::Unknown | Type::General) && !is_lower_or_equal(exponent, &Type::Int)
    {
        return Err(Error::type_error(format!(
            "exponent must be an int, found {exponent}"
        )));
    }
    match base {
        Type::Unknown | Type::General | Type::Scalar => Ok(base.clone()),
        Type::Array(inner) => Ok(Type::array(power(inner, exponent)?)),
        Type::Matrix(inner) => Ok(Type::matrix(power(inner, exponent)?)),
        Type::Fix(_) => Err(Error::type_error(
            "fixed-point values cannot be raised to a power",
        )),
        ty if ty.is_numeric() => Ok(ty.clone()),
        other => Err(Error::type_error(format!("cannot raise {other} to a power"))),
    }
}

/// Result type of a shift: the left operand's type.
pub fn shift(op: ShiftOp, left: &Type, right: &Type) -> Result<Type> {
    let left_ok = left.is_integral() || matches!(left, Type::Unknown | Type::General);
    let right_ok = matches!(right, Type::Unknown | Type::General) || is_lower_or_equal(right, &Type::Int);
    if left_ok && right_ok {
        Ok(left.clone())
    } else {
        Err(Error::type_error(format!(
            "{op} requires an integral value and an int amount, found {left} and {right}"
        )))
    }
}

fn is_bitwise(ty: &Type) -> bool {
    matches!(
        ty,
        Type::Boolean | Type::UnsignedByte | Type::Short | Type::Int | Type::Long
    )
}

/// Result type of a bitwise operator: the join of both operands.
pub fn bitwise(op: BitwiseOp, left: &Type, right: &Type) -> Result<Type> {
    if let Some(ty) = passthrough(left, right) {
        return Ok(ty);
    }
    let join = least_upper_bound(left, right);
    if is_bitwise(left) && is_bitwise(right) && is_bitwise(&join) {
        Ok(join)
    } else {
        Err(Error::type_error(format!(
            "{op} is not supported between {left} and {right}"
        )))
    }
}

/// Result type of a unary operator.
pub fn unary(op: UnaryOp, operand: &Type) -> Result<Type> {
    match (op, operand) {
        (_, Type::Unknown | Type::General) => Ok(operand.clone()),
        (UnaryOp::Negate, Type::Array(inner)) => Ok(Type::array(unary(op, inner)?)),
        (UnaryOp::Negate, Type::Matrix(inner)) => Ok(Type::matrix(unary(op, inner)?)),
        (UnaryOp::Negate, ty) if ty.is_numeric() => Ok(ty.clone()),
        (UnaryOp::Not, Type::Boolean) => Ok(Type::Boolean),
        (UnaryOp::BitwiseNot, ty) if is_bitwise(ty) => Ok(ty.clone()),
        _ => Err(Error::type_error(format!(
            "{op} cannot be applied to {operand}"
        ))),
    }
}

fn is_ordered(ty: &Type) -> bool {
    matches!(
        ty,
        Type::UnsignedByte
            | Type::Short
            | Type::Int
            | Type::Long
            | Type::Float
            | Type::Double
            | Type::Fix(_)
            | Type::Scalar
            | Type::Unknown
            | Type::General
    )
}

/// Check a relational operator's operands; the result is always boolean.
pub fn relational(op: RelationalOp, left: &Type, right: &Type) -> Result<Type> {
    if !op.is_ordering() {
        return Ok(Type::Boolean);
    }
    let join = least_upper_bound(left, right);
    let comparable = is_ordered(left)
        && is_ordered(right)
        && (is_ordered(&join) && !(join.is_abstract() && left.is_concrete() && right.is_concrete()));
    if comparable {
        Ok(Type::Boolean)
    } else {
        Err(Error::type_error(format!(
            "{op} requires ordered scalars, found {left} and {right}"
        )))
    }
}

/// Element type of a `start:step:end` matrix row.
pub fn sequence_element(start: &Type, step: &Type, end: &Type) -> Result<Type> {
    for bound in [start, step, end] {
        if !is_ordered(bound) || matches!(bound, Type::Fix(_)) {
            return Err(Error::type_error(format!(
                "sequence bounds must be real numbers, found {start}:{step}:{end}"
            )));
        }
    }
    relational(RelationalOp::Less, start, end)?;
    arithmetic(ArithmeticOp::Add, start, step)
}

/// Operand check for `&&`, `||`, `!` and branch conditions.
pub fn require_boolean(ty: &Type, what: &str) -> Result<()> {
    match ty {
        Type::Boolean | Type::Unknown | Type::General => Ok(()),
        other => Err(Error::type_error(format!(
            "{what} must be boolean, found {other}"
        ))),
    }
}

#[cfg(test)]
#[path = "operators_test.rs"]
mod operators_test;
