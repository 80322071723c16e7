//! Operators on runtime values.
//!
//! Every function first asks [`types::operators`](crate::types::operators)
//! for the result type, so a value operator fails exactly when the type-level
//! check does. Integer arithmetic wraps; division by an integer zero is
//! [`Error::DivisionByZero`].

use std::cmp::Ordering;

use num_complex::Complex64;

use crate::errors::{Error, Result};
use crate::syntax::{ArithmeticOp, BitwiseOp, RelationalOp, ShiftOp, UnaryOp};
use crate::types::{Type, least_upper_bound, operators as type_ops};

use super::{FixPoint, Value};

// ============================================================================
// Arithmetic
// ============================================================================

/// Longest regular sequence handed out by [`sequence_length`].
const MAX_SEQUENCE: f64 = (1u32 << 24) as f64;

/// Number of elements in `start, start + step, ...` that do not pass `end`.
pub fn sequence_length(start: &Value, step: &Value, end: &Value) -> Result<usize> {
    type_ops::sequence_element(&start.ty(), &step.ty(), &end.ty())?;
    let (Some(first), Some(delta), Some(last)) = (start.as_f64(), step.as_f64(), end.as_f64())
    else {
        return Err(Error::type_error(format!(
            "sequence bounds must be real numbers, found {start}:{step}:{end}"
        )));
    };
    if delta == 0.0 {
        return Err(Error::type_error("sequence step cannot be zero"));
    }
    // Tolerate rounding in fractional steps such as 0:0.1:1.
    let steps = ((last - first) / delta + 1e-9).floor();
    if !steps.is_finite() || steps < 0.0 {
        return Err(Error::shape(format!(
            "step {step} never leads from {start} to {end}"
        )));
    }
    if steps >= MAX_SEQUENCE {
        return Err(Error::shape(format!("sequence {start}:{step}:{end} is too long")));
    }
    Ok(steps as usize + 1)
}

/// The first `len` terms of `start, start + step, ...`, all of one type.
pub fn sequence(start: &Value, step: &Value, len: usize) -> Result<Vec<Value>> {
    let ty = type_ops::arithmetic(ArithmeticOp::Add, &start.ty(), &step.ty())?;
    let mut current = start.convert_to(&ty)?;
    let mut terms = Vec::with_capacity(len);
    for _ in 1..len {
        let next = arithmetic(ArithmeticOp::Add, &current, step)?;
        terms.push(std::mem::replace(&mut current, next));
    }
    if len > 0 {
        terms.push(current);
    }
    Ok(terms)
}

/// Apply `op` to two values, broadcasting over arrays and matrices.
pub fn arithmetic(op: ArithmeticOp, left: &Value, right: &Value) -> Result<Value> {
    let result_type = type_ops::arithmetic(op, &left.ty(), &right.ty())?;
    match (left, right) {
        (Value::Array(a), Value::Array(b)) => {
            let len = broadcast_len(a.len(), b.len())?;
            let elements = (0..len)
                .map(|i| {
                    let x = if a.len() == 1 { &a.elements()[0] } else { &a.elements()[i] };
                    let y = if b.len() == 1 { &b.elements()[0] } else { &b.elements()[i] };
                    arithmetic(op, x, y)
                })
                .collect::<Result<Vec<_>>>()?;
            build_array(&result_type, elements)
        }
        (Value::Array(a), other) if !matches!(other, Value::Matrix(_)) => {
            let elements = a
                .elements()
                .iter()
                .map(|x| arithmetic(op, x, other))
                .collect::<Result<Vec<_>>>()?;
            build_array(&result_type, elements)
        }
        (other, Value::Array(b)) if !matches!(other, Value::Matrix(_)) => {
            let elements = b
                .elements()
                .iter()
                .map(|y| arithmetic(op, other, y))
                .collect::<Result<Vec<_>>>()?;
            build_array(&result_type, elements)
        }
        (Value::Matrix(a), Value::Matrix(b)) if op == ArithmeticOp::Multiply => {
            if a.cols() != b.rows() {
                return Err(Error::shape(format!(
                    "cannot multiply a {}x{} matrix by a {}x{} matrix",
                    a.rows(),
                    a.cols(),
                    b.rows(),
                    b.cols()
                )));
            }
            let mut elements = Vec::with_capacity(a.rows() * b.cols());
            for row in 0..a.rows() {
                for col in 0..b.cols() {
                    let terms = (0..a.cols()).map(|k| {
                        arithmetic(op, &a.elements()[row * a.cols() + k], &b.elements()[k * b.cols() + col])
                    });
                    elements.push(sum_terms(terms)?);
                }
            }
            Value::matrix_from_flat(a.rows(), b.cols(), elements)
        }
        (Value::Matrix(a), Value::Matrix(b)) => {
            if a.rows() != b.rows() || a.cols() != b.cols() {
                return Err(Error::shape(format!(
                    "matrix dimensions differ: {}x{} and {}x{}",
                    a.rows(),
                    a.cols(),
                    b.rows(),
                    b.cols()
                )));
            }
            let elements = a
                .elements()
                .iter()
                .zip(b.elements())
                .map(|(x, y)| arithmetic(op, x, y))
                .collect::<Result<Vec<_>>>()?;
            Value::matrix_from_flat(a.rows(), a.cols(), elements)
        }
        (Value::Matrix(a), other) => {
            let elements = a
                .elements()
                .iter()
                .map(|x| arithmetic(op, x, other))
                .collect::<Result<Vec<_>>>()?;
            Value::matrix_from_flat(a.rows(), a.cols(), elements)
        }
        (other, Value::Matrix(b)) => {
            let elements = b
                .elements()
                .iter()
                .map(|y| arithmetic(op, other, y))
                .collect::<Result<Vec<_>>>()?;
            Value::matrix_from_flat(b.rows(), b.cols(), elements)
        }
        (Value::Record(x), Value::Record(y)) => {
            let mut fields = Vec::new();
            for (label, vx) in x.iter() {
                if let Some(vy) = y.get(label) {
                    fields.push((label.clone(), arithmetic(op, vx, vy)?));
                }
            }
            Ok(Value::record(fields))
        }
        _ => scalar_arithmetic(op, left, right, &result_type),
    }
}

fn broadcast_len(a: usize, b: usize) -> Result<usize> {
    match (a, b) {
        _ if a == b => Ok(a),
        (1, n) | (n, 1) => Ok(n),
        _ => Err(Error::shape(format!(
            "arrays of length {a} and {b} cannot be combined element-wise"
        ))),
    }
}

fn build_array(result_type: &Type, elements: Vec<Value>) -> Result<Value> {
    let element_type = result_type.element_type().cloned().unwrap_or(Type::Unknown);
    if element_type.is_concrete() && !elements.is_empty() {
        let elements = elements
            .iter()
            .map(|e| e.convert_to(&element_type))
            .collect::<Result<Vec<_>>>()?;
        Ok(Value::array_unchecked(element_type, elements))
    } else {
        Value::array_with(element_type, elements)
    }
}

/// Sum the terms of one matrix-product cell.
///
/// Fixed-point sums stay at the precision of a single product.
fn sum_terms(terms: impl Iterator<Item = Result<Value>>) -> Result<Value> {
    let mut acc: Option<Value> = None;
    for term in terms {
        let term = term?;
        acc = Some(match acc {
            None => term,
            Some(sum) => match (&sum, &term) {
                (Value::Fix(a), Value::Fix(b)) => {
                    Value::Fix(a.add(b)?.quantize(b.precision()))
                }
                _ => arithmetic(ArithmeticOp::Add, &sum, &term)?,
            },
        });
    }
    acc.ok_or_else(|| Error::shape("a matrix product needs at least one column"))
}

macro_rules! integral {
    ($variant:ident, $op:expr, $a:expr, $b:expr) => {{
        let (a, b) = ($a, $b);
        Value::$variant(match $op {
            ArithmeticOp::Add => a.wrapping_add(b),
            ArithmeticOp::Subtract => a.wrapping_sub(b),
            ArithmeticOp::Multiply => a.wrapping_mul(b),
            ArithmeticOp::Divide => {
                if b == 0 {
                    return Err(Error::DivisionByZero);
                }
                a.wrapping_div(b)
            }
            ArithmeticOp::Modulo => {
                if b == 0 {
                    return Err(Error::DivisionByZero);
                }
                a.wrapping_rem(b)
            }
        })
    }};
}

macro_rules! floating {
    ($variant:ident, $op:expr, $a:expr, $b:expr) => {{
        let (a, b) = ($a, $b);
        Value::$variant(match $op {
            ArithmeticOp::Add => a + b,
            ArithmeticOp::Subtract => a - b,
            ArithmeticOp::Multiply => a * b,
            ArithmeticOp::Divide => a / b,
            ArithmeticOp::Modulo => a % b,
        })
    }};
}

fn scalar_arithmetic(
    op: ArithmeticOp,
    left: &Value,
    right: &Value,
    result_type: &Type,
) -> Result<Value> {
    if let (Value::Fix(a), Value::Fix(b)) = (left, right) {
        return Ok(Value::Fix(match op {
            ArithmeticOp::Add => a.add(b)?,
            ArithmeticOp::Subtract => a.subtract(b)?,
            ArithmeticOp::Multiply => a.multiply(b)?,
            ArithmeticOp::Divide => a.divide(b)?,
            ArithmeticOp::Modulo => {
                return Err(Error::type_error("modulo is not defined on fixed-point values"));
            }
        }));
    }
    let a = left.convert_to(result_type)?;
    let b = right.convert_to(result_type)?;
    let value = match (&a, &b) {
        (Value::Boolean(x), Value::Boolean(y)) => match op {
            ArithmeticOp::Add => Value::Boolean(*x || *y),
            ArithmeticOp::Multiply => Value::Boolean(*x && *y),
            _ => return Err(unsupported(op, &a)),
        },
        (Value::UnsignedByte(x), Value::UnsignedByte(y)) => integral!(UnsignedByte, op, *x, *y),
        (Value::Short(x), Value::Short(y)) => integral!(Short, op, *x, *y),
        (Value::Int(x), Value::Int(y)) => integral!(Int, op, *x, *y),
        (Value::Long(x), Value::Long(y)) => integral!(Long, op, *x, *y),
        (Value::Float(x), Value::Float(y)) => floating!(Float, op, *x, *y),
        (Value::Double(x), Value::Double(y)) => floating!(Double, op, *x, *y),
        (Value::Complex(x), Value::Complex(y)) => match op {
            ArithmeticOp::Add => Value::Complex(x + y),
            ArithmeticOp::Subtract => Value::Complex(x - y),
            ArithmeticOp::Multiply => Value::Complex(x * y),
            ArithmeticOp::Divide => Value::Complex(x / y),
            ArithmeticOp::Modulo => return Err(unsupported(op, &a)),
        },
        (Value::String(x), Value::String(y)) if op == ArithmeticOp::Add => {
            Value::string(format!("{x}{y}"))
        }
        _ => {
            return Err(Error::type_error(format!(
                "{} is not supported between {left} and {right}",
                op.name()
            )));
        }
    };
    Ok(value)
}

fn unsupported(op: ArithmeticOp, value: &Value) -> Error {
    Error::type_error(format!("{} is not supported on {}", op.name(), value.ty()))
}

// ============================================================================
// Power
// ============================================================================

/// The small integer `n` (zero or one in practice) as a value of type `ty`.
fn constant_of(ty: &Type, n: i64) -> Result<Value> {
    Ok(match ty {
        Type::Boolean => Value::Boolean(n != 0),
        Type::UnsignedByte => Value::UnsignedByte(n as u8),
        Type::Short => Value::Short(n as i16),
        Type::Int => Value::Int(n as i32),
        Type::Long => Value::Long(n),
        Type::Float => Value::Float(n as f32),
        Type::Double => Value::Double(n as f64),
        Type::Complex => Value::Complex(Complex64::new(n as f64, 0.0)),
        Type::Fix(Some(p)) => Value::Fix(FixPoint::from_integer(n, *p)),
        other => return Err(Error::type_error(format!("{other} has no value {n}"))),
    })
}

/// `base ^ exponent`; a negative exponent yields `1 / base ^ -exponent`.
pub fn power(base: &Value, exponent: &Value) -> Result<Value> {
    type_ops::power(&base.ty(), &exponent.ty())?;
    let n = exponent
        .as_i64()
        .ok_or_else(|| Error::type_error(format!("exponent must be an int, found {exponent}")))?;
    match base {
        Value::Array(a) => {
            let elements = a
                .elements()
                .iter()
                .map(|x| power(x, exponent))
                .collect::<Result<Vec<_>>>()?;
            Value::array_with(a.element_type().clone(), elements)
        }
        Value::Matrix(m) => {
            if m.rows() != m.cols() {
                return Err(Error::shape(format!(
                    "only square matrices have powers, found {}x{}",
                    m.rows(),
                    m.cols()
                )));
            }
            if n < 0 {
                return Err(Error::type_error("matrix powers must be non-negative"));
            }
            let size = m.rows();
            let unit = constant_of(m.element_type(), 1)?;
            let zero = constant_of(m.element_type(), 0)?;
            let identity = (0..size * size)
                .map(|i| if i / size == i % size { unit.clone() } else { zero.clone() })
                .collect();
            let mut result = Value::matrix_from_flat(size, size, identity)?;
            for _ in 0..n {
                result = arithmetic(ArithmeticOp::Multiply, &result, base)?;
            }
            Ok(result)
        }
        _ => scalar_power(base, n),
    }
}

fn scalar_power(base: &Value, n: i64) -> Result<Value> {
    let magnitude = u32::try_from(n.unsigned_abs())
        .map_err(|_| Error::type_error(format!("exponent {n} is too large")))?;
    let exp = i32::try_from(n).map_err(|_| Error::type_error(format!("exponent {n} is too large")))?;
    let raised = match base {
        Value::UnsignedByte(x) => Value::UnsignedByte(x.wrapping_pow(magnitude)),
        Value::Short(x) => Value::Short(x.wrapping_pow(magnitude)),
        Value::Int(x) => Value::Int(x.wrapping_pow(magnitude)),
        Value::Long(x) => Value::Long(x.wrapping_pow(magnitude)),
        Value::Float(x) => return Ok(Value::Float(x.powi(exp))),
        Value::Double(x) => return Ok(Value::Double(x.powi(exp))),
        Value::Complex(x) => return Ok(Value::Complex(x.powi(exp))),
        other => {
            return Err(Error::type_error(format!(
                "cannot raise {} to a power",
                other.ty()
            )));
        }
    };
    if n < 0 {
        arithmetic(ArithmeticOp::Divide, &constant_of(&base.ty(), 1)?, &raised)
    } else {
        Ok(raised)
    }
}

// ============================================================================
// Shifts and bitwise operators
// ============================================================================

/// Shift an integral value; the amount wraps modulo the value's bit width.
pub fn shift(op: ShiftOp, value: &Value, amount: &Value) -> Result<Value> {
    type_ops::shift(op, &value.ty(), &amount.ty())?;
    let by = amount
        .as_i64()
        .ok_or_else(|| Error::type_error(format!("shift amount must be an int, found {amount}")))?
        as u32;
    macro_rules! shifted {
        ($variant:ident, $x:expr, $unsigned:ty) => {{
            let x = $x;
            Value::$variant(match op {
                ShiftOp::Left => x.wrapping_shl(by),
                ShiftOp::Right => x.wrapping_shr(by),
                ShiftOp::UnsignedRight => (x as $unsigned).wrapping_shr(by) as _,
            })
        }};
    }
    Ok(match value {
        Value::UnsignedByte(x) => shifted!(UnsignedByte, *x, u8),
        Value::Short(x) => shifted!(Short, *x, u16),
        Value::Int(x) => shifted!(Int, *x, u32),
        Value::Long(x) => shifted!(Long, *x, u64),
        other => {
            return Err(Error::type_error(format!("{op} cannot shift {}", other.ty())));
        }
    })
}

pub fn bitwise(op: BitwiseOp, left: &Value, right: &Value) -> Result<Value> {
    let result_type = type_ops::bitwise(op, &left.ty(), &right.ty())?;
    let a = left.convert_to(&result_type)?;
    let b = right.convert_to(&result_type)?;
    macro_rules! bits {
        ($variant:ident, $x:expr, $y:expr) => {{
            let (x, y) = ($x, $y);
            Value::$variant(match op {
                BitwiseOp::And => x & y,
                BitwiseOp::Or => x | y,
                BitwiseOp::Xor => x ^ y,
            })
        }};
    }
    Ok(match (&a, &b) {
        (Value::Boolean(x), Value::Boolean(y)) => bits!(Boolean, *x, *y),
        (Value::UnsignedByte(x), Value::UnsignedByte(y)) => bits!(UnsignedByte, *x, *y),
        (Value::Short(x), Value::Short(y)) => bits!(Short, *x, *y),
        (Value::Int(x), Value::Int(y)) => bits!(Int, *x, *y),
        (Value::Long(x), Value::Long(y)) => bits!(Long, *x, *y),
        _ => {
            return Err(Error::type_error(format!(
                "{op} is not supported between {left} and {right}"
            )));
        }
    })
}

// ============================================================================
// Unary operators
// ============================================================================

pub fn unary(op: UnaryOp, operand: &Value) -> Result<Value> {
    type_ops::unary(op, &operand.ty())?;
    Ok(match (op, operand) {
        (UnaryOp::Negate, Value::Array(a)) => {
            let elements = a
                .elements()
                .iter()
                .map(|x| unary(op, x))
                .collect::<Result<Vec<_>>>()?;
            Value::array_with(a.element_type().clone(), elements)?
        }
        (UnaryOp::Negate, Value::Matrix(m)) => {
            let elements = m
                .elements()
                .iter()
                .map(|x| unary(op, x))
                .collect::<Result<Vec<_>>>()?;
            Value::matrix_from_flat(m.rows(), m.cols(), elements)?
        }
        (UnaryOp::Negate, Value::UnsignedByte(x)) => Value::UnsignedByte(x.wrapping_neg()),
        (UnaryOp::Negate, Value::Short(x)) => Value::Short(x.wrapping_neg()),
        (UnaryOp::Negate, Value::Int(x)) => Value::Int(x.wrapping_neg()),
        (UnaryOp::Negate, Value::Long(x)) => Value::Long(x.wrapping_neg()),
        (UnaryOp::Negate, Value::Float(x)) => Value::Float(-x),
        (UnaryOp::Negate, Value::Double(x)) => Value::Double(-x),
        (UnaryOp::Negate, Value::Complex(x)) => Value::Complex(-x),
        (UnaryOp::Negate, Value::Fix(x)) => Value::Fix(x.negate()),
        (UnaryOp::Not, Value::Boolean(b)) => Value::Boolean(!b),
        (UnaryOp::BitwiseNot, Value::Boolean(b)) => Value::Boolean(!b),
        (UnaryOp::BitwiseNot, Value::UnsignedByte(x)) => Value::UnsignedByte(!x),
        (UnaryOp::BitwiseNot, Value::Short(x)) => Value::Short(!x),
        (UnaryOp::BitwiseNot, Value::Int(x)) => Value::Int(!x),
        (UnaryOp::BitwiseNot, Value::Long(x)) => Value::Long(!x),
        (op, other) => {
            return Err(Error::type_error(format!(
                "{op} cannot be applied to {}",
                other.ty()
            )));
        }
    })
}

// ============================================================================
// Comparison
// ============================================================================

/// Equality after converting both sides to their join.
///
/// Values whose types have no concrete join are never equal.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    let join = least_upper_bound(&left.ty(), &right.ty());
    if !join.is_concrete() {
        return false;
    }
    match (left.convert_to(&join), right.convert_to(&join)) {
        (Ok(Value::Fix(a)), Ok(Value::Fix(b))) => a.compare(&b) == Ordering::Equal,
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn order(left: &Value, right: &Value) -> Result<Option<Ordering>> {
    let join = least_upper_bound(&left.ty(), &right.ty());
    let a = left.convert_to(&join)?;
    let b = right.convert_to(&join)?;
    Ok(match (&a, &b) {
        (Value::Fix(x), Value::Fix(y)) => Some(x.compare(y)),
        _ => match (a.as_i64(), b.as_i64()) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.partial_cmp(&y),
                _ => {
                    return Err(Error::type_error(format!(
                        "cannot order {left} and {right}"
                    )));
                }
            },
        },
    })
}

pub fn relational(op: RelationalOp, left: &Value, right: &Value) -> Result<Value> {
    type_ops::relational(op, &left.ty(), &right.ty())?;
    let result = match op {
        RelationalOp::Equal => values_equal(left, right),
        RelationalOp::NotEqual => !values_equal(left, right),
        RelationalOp::Less => order(left, right)? == Some(Ordering::Less),
        RelationalOp::LessOrEqual => matches!(
            order(left, right)?,
            Some(Ordering::Less | Ordering::Equal)
        ),
        RelationalOp::Greater => order(left, right)? == Some(Ordering::Greater),
        RelationalOp::GreaterOrEqual => matches!(
            order(left, right)?,
            Some(Ordering::Greater | Ordering::Equal)
        ),
    };
    Ok(Value::Boolean(result))
}

#[cfg(test)]
#[path = "operators_test.rs"]
mod operators_test;
