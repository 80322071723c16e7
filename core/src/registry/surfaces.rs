//! Built-in method surfaces.
//!
//! Value surfaces hang off a [`ValueClass`] and see the receiver as a
//! [`Value`]; native surfaces hang off a [`NativeType`] and are only reached
//! after the receiver was converted to that representation.

use crate::conversion::{Native, NativeType, ValueClass};
use crate::errors::{NativeError, Result};
use crate::syntax::{ArithmeticOp, RelationalOp, UnaryOp};
use crate::types::{Type, operators as type_ops};
use crate::values::{Value, operators};

use super::complex::{complex_angle, complex_conjugate, complex_imag, complex_magnitude, complex_real};
use super::utility::{utility_subarray, utility_to_string, utility_transpose};
use super::{NativeOp, Registry, fail, first_argument_type, first_element_type};

type NativeResult = Result<Native, NativeError>;

fn to_native_error(err: crate::errors::Error) -> NativeError {
    NativeError::new(err.to_string())
}

fn index(native: &Native, len: usize) -> Result<usize, NativeError> {
    let i = native.as_i32()?;
    usize::try_from(i)
        .ok()
        .filter(|i| *i < len)
        .ok_or_else(|| fail(format!("index {i} is out of bounds for length {len}")))
}

// ============================================================================
// Every value
// ============================================================================

fn token_is_equal_to(args: &[Native]) -> NativeResult {
    Ok(Native::Bool(operators::values_equal(
        args[0].as_value()?,
        args[1].as_value()?,
    )))
}

/// Values are never nil; hosts with nullable tokens override this.
fn token_is_nil(_args: &[Native]) -> NativeResult {
    Ok(Native::Bool(false))
}

// ============================================================================
// Scalars
// ============================================================================

macro_rules! scalar_arithmetic {
    ($body:ident, $hook:ident, $op:expr) => {
        fn $body(args: &[Native]) -> NativeResult {
            operators::arithmetic($op, args[0].as_value()?, args[1].as_value()?)
                .map(Native::Value)
                .map_err(to_native_error)
        }

        fn $hook(args: &[Type]) -> Result<Type> {
            match args {
                [left, right] => type_ops::arithmetic($op, left, right),
                _ => Ok(Type::General),
            }
        }
    };
}

scalar_arithmetic!(scalar_add, add_return_type, ArithmeticOp::Add);
scalar_arithmetic!(scalar_subtract, subtract_return_type, ArithmeticOp::Subtract);
scalar_arithmetic!(scalar_multiply, multiply_return_type, ArithmeticOp::Multiply);
scalar_arithmetic!(scalar_divide, divide_return_type, ArithmeticOp::Divide);
scalar_arithmetic!(scalar_modulo, modulo_return_type, ArithmeticOp::Modulo);

fn scalar_abs(args: &[Native]) -> NativeResult {
    let value = args[0].as_value()?;
    let negative = match value {
        Value::Complex(_) => return Err(fail("abs is not defined on complex values; use magnitude")),
        Value::Boolean(_) => false,
        Value::Fix(f) => f.to_f64() < 0.0,
        other => other.as_f64().is_some_and(|v| v < 0.0),
    };
    if negative {
        operators::unary(UnaryOp::Negate, value)
            .map(Native::Value)
            .map_err(to_native_error)
    } else {
        Ok(Native::Value(value.clone()))
    }
}

fn scalar_int_value(args: &[Native]) -> NativeResult {
    let value = args[0].as_value()?;
    if let Some(v) = value.as_i64() {
        return i32::try_from(v)
            .map(Native::I32)
            .map_err(|_| fail(format!("{value} does not fit an int")));
    }
    value
        .as_f64()
        .map(|v| Native::I32(v as i32))
        .ok_or_else(|| fail(format!("{value} has no int value")))
}

fn scalar_long_value(args: &[Native]) -> NativeResult {
    let value = args[0].as_value()?;
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|v| v as i64))
        .map(Native::I64)
        .ok_or_else(|| fail(format!("{value} has no long value")))
}

fn scalar_double_value(args: &[Native]) -> NativeResult {
    let value = args[0].as_value()?;
    value
        .as_f64()
        .map(Native::F64)
        .ok_or_else(|| fail(format!("{value} has no double value")))
}

fn scalar_is_less_than(args: &[Native]) -> NativeResult {
    operators::relational(RelationalOp::Less, args[0].as_value()?, args[1].as_value()?)
        .map(|v| Native::Bool(v.as_bool().unwrap_or(false)))
        .map_err(to_native_error)
}

/// True when both values differ by at most `epsilon`; complex values
/// compare by the magnitude of their difference.
fn scalar_is_close_to(args: &[Native]) -> NativeResult {
    let epsilon = args[2].as_f64()?;
    let difference = operators::arithmetic(
        ArithmeticOp::Subtract,
        args[0].as_value()?,
        args[1].as_value()?,
    )
    .map_err(to_native_error)?;
    let distance = match difference {
        Value::Complex(c) => c.norm(),
        other => other
            .as_f64()
            .map(f64::abs)
            .ok_or_else(|| fail(format!("cannot measure the distance {other}")))?,
    };
    Ok(Native::Bool(distance <= epsilon))
}

// ============================================================================
// Arrays, matrices and records
// ============================================================================

fn array_of(native: &Native) -> Result<&[Value], NativeError> {
    match native.as_value()? {
        Value::Array(a) => Ok(a.elements()),
        other => Err(fail(format!("expected an array, found {other}"))),
    }
}

fn array_length(args: &[Native]) -> NativeResult {
    Ok(Native::I32(array_of(&args[0])?.len() as i32))
}

fn array_get(args: &[Native]) -> NativeResult {
    let elements = array_of(&args[0])?;
    let i = index(&args[1], elements.len())?;
    Ok(Native::Value(elements[i].clone()))
}

fn array_is_empty(args: &[Native]) -> NativeResult {
    Ok(Native::Bool(array_of(&args[0])?.is_empty()))
}

fn matrix_row_count(args: &[Native]) -> NativeResult {
    match args[0].as_value()? {
        Value::Matrix(m) => Ok(Native::I32(m.rows() as i32)),
        other => Err(fail(format!("expected a matrix, found {other}"))),
    }
}

fn matrix_column_count(args: &[Native]) -> NativeResult {
    match args[0].as_value()? {
        Value::Matrix(m) => Ok(Native::I32(m.cols() as i32)),
        other => Err(fail(format!("expected a matrix, found {other}"))),
    }
}

fn matrix_element_at(args: &[Native]) -> NativeResult {
    let Value::Matrix(m) = args[0].as_value()? else {
        return Err(fail("getElementAt expects a matrix"));
    };
    let row = index(&args[1], m.rows())?;
    let col = index(&args[2], m.cols())?;
    m.get(row, col)
        .cloned()
        .map(Native::Value)
        .ok_or_else(|| fail(format!("no element at ({row}, {col})")))
}

fn record_length(args: &[Native]) -> NativeResult {
    match args[0].as_value()? {
        Value::Record(fields) => Ok(Native::I32(fields.len() as i32)),
        other => Err(fail(format!("expected a record, found {other}"))),
    }
}

fn record_labels(args: &[Native]) -> NativeResult {
    match args[0].as_value()? {
        Value::Record(fields) => Ok(Native::Array(
            NativeType::Str,
            fields.keys().map(Native::str).collect(),
        )),
        other => Err(fail(format!("expected a record, found {other}"))),
    }
}

// ============================================================================
// Native surfaces
// ============================================================================

fn string_length(args: &[Native]) -> NativeResult {
    Ok(Native::I32(args[0].as_str()?.chars().count() as i32))
}

fn string_to_upper_case(args: &[Native]) -> NativeResult {
    Ok(Native::str(args[0].as_str()?.to_uppercase()))
}

fn string_to_lower_case(args: &[Native]) -> NativeResult {
    Ok(Native::str(args[0].as_str()?.to_lowercase()))
}

fn string_trim(args: &[Native]) -> NativeResult {
    Ok(Native::str(args[0].as_str()?.trim()))
}

/// Character index of the first occurrence, or -1.
fn string_index_of(args: &[Native]) -> NativeResult {
    let haystack = args[0].as_str()?;
    let needle = args[1].as_str()?;
    Ok(Native::I32(match haystack.find(needle) {
        Some(byte) => haystack[..byte].chars().count() as i32,
        None => -1,
    }))
}

/// Characters in `[begin, end)`.
fn string_substring(args: &[Native]) -> NativeResult {
    let text = args[0].as_str()?;
    let len = text.chars().count();
    let begin = args[1].as_i32()?;
    let end = args[2].as_i32()?;
    let (Ok(b), Ok(e)) = (usize::try_from(begin), usize::try_from(end)) else {
        return Err(fail(format!("substring({begin}, {end}) has a negative bound")));
    };
    if b > e || e > len {
        return Err(fail(format!(
            "substring({begin}, {end}) is out of bounds for length {len}"
        )));
    }
    Ok(Native::str(text.chars().skip(b).take(e - b).collect::<String>()))
}

fn string_starts_with(args: &[Native]) -> NativeResult {
    Ok(Native::Bool(args[0].as_str()?.starts_with(args[1].as_str()?)))
}

fn string_ends_with(args: &[Native]) -> NativeResult {
    Ok(Native::Bool(args[0].as_str()?.ends_with(args[1].as_str()?)))
}

fn fix_double_value(args: &[Native]) -> NativeResult {
    Ok(Native::F64(args[0].as_fix()?.to_f64()))
}

fn fix_integer_bits(args: &[Native]) -> NativeResult {
    Ok(Native::I32(args[0].as_fix()?.precision().integer_bits() as i32))
}

fn fix_total_bits(args: &[Native]) -> NativeResult {
    Ok(Native::I32(args[0].as_fix()?.precision().total_bits() as i32))
}

// ============================================================================
// Registration
// ============================================================================

pub fn register_value_surfaces(registry: &mut Registry) {
    use NativeType::{Bool, F64, I32, I64, Str};
    use ValueClass::{Array, Matrix, Record, Scalar, Token};

    let value = NativeType::Value;

    registry.add_method(Token, NativeOp::new("isEqualTo", vec![value(Token), value(Token)], Bool, token_is_equal_to));
    registry.add_method(Token, NativeOp::new("toString", vec![value(Token)], Str, utility_to_string));
    registry.add_method(Token, NativeOp::new("isNil", vec![value(Token)], Bool, token_is_nil));

    let arithmetic: [(&str, super::NativeFn, super::ReturnTypeFn); 5] = [
        ("add", scalar_add, add_return_type),
        ("subtract", scalar_subtract, subtract_return_type),
        ("multiply", scalar_multiply, multiply_return_type),
        ("divide", scalar_divide, divide_return_type),
        ("modulo", scalar_modulo, modulo_return_type),
    ];
    for (name, func, hook) in arithmetic {
        registry.add_method(Scalar, NativeOp::new(name, vec![value(Scalar), value(Scalar)], value(Scalar), func));
        registry.add_method_return_type(Scalar, name, hook);
    }
    registry.add_method(Scalar, NativeOp::new("abs", vec![value(Scalar)], value(Scalar), scalar_abs));
    registry.add_method_return_type(Scalar, "abs", first_argument_type);
    registry.add_method(Scalar, NativeOp::new("intValue", vec![value(Scalar)], I32, scalar_int_value));
    registry.add_method(Scalar, NativeOp::new("longValue", vec![value(Scalar)], I64, scalar_long_value));
    registry.add_method(Scalar, NativeOp::new("doubleValue", vec![value(Scalar)], F64, scalar_double_value));
    registry.add_method(Scalar, NativeOp::new("isLessThan", vec![value(Scalar), value(Scalar)], Bool, scalar_is_less_than));
    registry.add_method(Scalar, NativeOp::new("isCloseTo", vec![value(Scalar), value(Scalar), F64], Bool, scalar_is_close_to));

    registry.add_method(Array, NativeOp::new("length", vec![value(Array)], I32, array_length));
    registry.add_method(Array, NativeOp::new("get", vec![value(Array), I32], value(Token), array_get));
    registry.add_method_return_type(Array, "get", first_element_type);
    registry.add_method(Array, NativeOp::new("subarray", vec![value(Array), I32, I32], NativeType::Values, utility_subarray));
    registry.add_method_return_type(Array, "subarray", first_argument_type);
    registry.add_method(Array, NativeOp::new("isEmpty", vec![value(Array)], Bool, array_is_empty));

    registry.add_method(Matrix, NativeOp::new("getRowCount", vec![value(Matrix)], I32, matrix_row_count));
    registry.add_method(Matrix, NativeOp::new("getColumnCount", vec![value(Matrix)], I32, matrix_column_count));
    registry.add_method(Matrix, NativeOp::new("getElementAt", vec![value(Matrix), I32, I32], value(Token), matrix_element_at));
    registry.add_method_return_type(Matrix, "getElementAt", first_element_type);
    registry.add_method(Matrix, NativeOp::new("transpose", vec![value(Matrix)], value(Matrix), utility_transpose));
    registry.add_method_return_type(Matrix, "transpose", first_argument_type);

    registry.add_method(Record, NativeOp::new("length", vec![value(Record)], I32, record_length));
    registry.add_method(Record, NativeOp::new("labels", vec![value(Record)], NativeType::array(Str), record_labels));
}

pub fn register_native_surfaces(registry: &mut Registry) {
    use NativeType::{Bool, Complex, F64, Fix, I32, Str};

    registry.add_native_method(Str, NativeOp::new("length", vec![Str], I32, string_length));
    registry.add_native_method(Str, NativeOp::new("toUpperCase", vec![Str], Str, string_to_upper_case));
    registry.add_native_method(Str, NativeOp::new("toLowerCase", vec![Str], Str, string_to_lower_case));
    registry.add_native_method(Str, NativeOp::new("trim", vec![Str], Str, string_trim));
    registry.add_native_method(Str, NativeOp::new("indexOf", vec![Str, Str], I32, string_index_of));
    registry.add_native_method(Str, NativeOp::new("substring", vec![Str, I32, I32], Str, string_substring));
    registry.add_native_method(Str, NativeOp::new("startsWith", vec![Str, Str], Bool, string_starts_with));
    registry.add_native_method(Str, NativeOp::new("endsWith", vec![Str, Str], Bool, string_ends_with));

    registry.add_native_method(Complex, NativeOp::new("real", vec![Complex], F64, complex_real));
    registry.add_native_method(Complex, NativeOp::new("imag", vec![Complex], F64, complex_imag));
    registry.add_native_method(Complex, NativeOp::new("magnitude", vec![Complex], F64, complex_magnitude));
    registry.add_native_method(Complex, NativeOp::new("angle", vec![Complex], F64, complex_angle));
    registry.add_native_method(Complex, NativeOp::new("conjugate", vec![Complex], Complex, complex_conjugate));

    registry.add_native_method(Fix, NativeOp::new("doubleValue", vec![Fix], F64, fix_double_value));
    registry.add_native_method(Fix, NativeOp::new("integerBits", vec![Fix], I32, fix_integer_bits));
    registry.add_native_method(Fix, NativeOp::new("totalBits", vec![Fix], I32, fix_total_bits));
}
