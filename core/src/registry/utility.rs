//! Utility provider: array and matrix helpers plus string conversions.

use crate::conversion::{Native, NativeType, ValueClass};
use crate::errors::{NativeError, Result};
use crate::syntax::ArithmeticOp;
use crate::types::{Type, least_upper_bound};
use crate::values::{Value, operators};

use super::{NativeOp, OperationTable, Provider, fail, first_argument_type, first_element_type};

type NativeResult = Result<Native, NativeError>;

fn to_native_error(err: crate::errors::Error) -> NativeError {
    NativeError::new(err.to_string())
}

fn count(native: &Native, what: &str) -> Result<usize, NativeError> {
    let n = native.as_i32()?;
    usize::try_from(n).map_err(|_| fail(format!("{what} must not be negative, got {n}")))
}

// ============================================================================
// Arrays
// ============================================================================

/// Sum of the elements. Fixed-point sums keep the element precision.
fn utility_sum(args: &[Native]) -> NativeResult {
    let values = args[0].as_values()?;
    let (first, rest) = values
        .split_first()
        .ok_or_else(|| fail("cannot sum an empty array"))?;
    let mut total = first.clone();
    for value in rest {
        total = match (&total, value) {
            (Value::Fix(a), Value::Fix(b)) => Value::Fix(
                a.add(b)
                    .map_err(to_native_error)?
                    .quantize(a.precision().join(&b.precision())),
            ),
            _ => operators::arithmetic(ArithmeticOp::Add, &total, value).map_err(to_native_error)?,
        };
    }
    Ok(Native::Value(total))
}

fn utility_repeat(args: &[Native]) -> NativeResult {
    let n = count(&args[0], "repeat count")?;
    let value = args[1].as_value()?;
    let array = Value::array_with(value.ty(), vec![value.clone(); n]).map_err(to_native_error)?;
    Ok(Native::Value(array))
}

fn repeat_return_type(args: &[Type]) -> Result<Type> {
    Ok(Type::array(args.get(1).cloned().unwrap_or(Type::General)))
}

fn utility_length(args: &[Native]) -> NativeResult {
    let len = args[0].as_values()?.len();
    i32::try_from(len)
        .map(Native::I32)
        .map_err(|_| fail(format!("length {len} does not fit an int")))
}

fn utility_concatenate(args: &[Native]) -> NativeResult {
    let mut values = args[0].as_values()?.to_vec();
    values.extend_from_slice(args[1].as_values()?);
    Ok(Native::Values(values))
}

fn concatenate_return_type(args: &[Type]) -> Result<Type> {
    Ok(match args {
        [a, b] => least_upper_bound(a, b),
        _ => Type::General,
    })
}

fn utility_reverse(args: &[Native]) -> NativeResult {
    let mut values = args[0].as_values()?.to_vec();
    values.reverse();
    Ok(Native::Values(values))
}

/// `subarray(array, start, length)`.
pub(crate) fn utility_subarray(args: &[Native]) -> NativeResult {
    let values = match &args[0] {
        Native::Value(Value::Array(a)) => a.elements(),
        other => other.as_values()?,
    };
    let start = count(&args[1], "start index")?;
    let len = count(&args[2], "length")?;
    let end = start
        .checked_add(len)
        .filter(|end| *end <= values.len())
        .ok_or_else(|| {
            fail(format!(
                "subarray({start}, {len}) is out of bounds for length {}",
                values.len()
            ))
        })?;
    Ok(Native::Values(values[start..end].to_vec()))
}

// ============================================================================
// Matrices
// ============================================================================

fn utility_zero_matrix(args: &[Native]) -> NativeResult {
    let rows = count(&args[0], "row count")?;
    let cols = count(&args[1], "column count")?;
    if rows == 0 || cols == 0 {
        return Err(fail("a matrix needs at least one row and one column"));
    }
    Ok(Native::Matrix {
        rows,
        cols,
        elements: vec![Native::F64(0.0); rows * cols],
    })
}

fn utility_identity_matrix(args: &[Native]) -> NativeResult {
    let n = count(&args[0], "size")?;
    if n == 0 {
        return Err(fail("a matrix needs at least one row and one column"));
    }
    let elements = (0..n * n)
        .map(|i| Native::F64(if i / n == i % n { 1.0 } else { 0.0 }))
        .collect();
    Ok(Native::Matrix {
        rows: n,
        cols: n,
        elements,
    })
}

pub(crate) fn utility_transpose(args: &[Native]) -> NativeResult {
    let Value::Matrix(m) = args[0].as_value()? else {
        return Err(fail("transpose expects a matrix"));
    };
    let mut elements = Vec::with_capacity(m.elements().len());
    for col in 0..m.cols() {
        for row in 0..m.rows() {
            if let Some(value) = m.get(row, col) {
                elements.push(value.clone());
            }
        }
    }
    Value::matrix_from_flat(m.cols(), m.rows(), elements)
        .map(Native::Value)
        .map_err(to_native_error)
}

// ============================================================================
// Strings
// ============================================================================

pub(crate) fn utility_to_string(args: &[Native]) -> NativeResult {
    Ok(Native::str(args[0].as_value()?.to_plain_string()))
}

fn utility_parse_int(args: &[Native]) -> NativeResult {
    let text = args[0].as_str()?;
    text.trim()
        .parse::<i32>()
        .map(Native::I32)
        .map_err(|e| fail(format!("cannot parse {text:?} as an int: {e}")))
}

fn utility_parse_double(args: &[Native]) -> NativeResult {
    let text = args[0].as_str()?;
    text.trim()
        .parse::<f64>()
        .map(Native::F64)
        .map_err(|e| fail(format!("cannot parse {text:?} as a double: {e}")))
}

// ============================================================================
// Provider
// ============================================================================

pub fn build_utility_provider() -> Provider {
    use NativeType::{F64, I32, Str, Values};
    let token = NativeType::Value(ValueClass::Token);
    let array = NativeType::Value(ValueClass::Array);
    let matrix = NativeType::Value(ValueClass::Matrix);

    let mut table = OperationTable::new();
    table
        .add(NativeOp::new("sum", vec![Values], token.clone(), utility_sum))
        .add_return_type("sum", first_element_type)
        .add(NativeOp::new("repeat", vec![I32, token.clone()], array.clone(), utility_repeat))
        .add_return_type("repeat", repeat_return_type)
        .add(NativeOp::new("length", vec![Values], I32, utility_length))
        .add(NativeOp::new("concatenate", vec![Values, Values], Values, utility_concatenate))
        .add_return_type("concatenate", concatenate_return_type)
        .add(NativeOp::new("reverse", vec![Values], Values, utility_reverse))
        .add_return_type("reverse", first_argument_type)
        .add(NativeOp::new("subarray", vec![Values, I32, I32], Values, utility_subarray))
        .add_return_type("subarray", first_argument_type)
        .add(NativeOp::new("zeroMatrix", vec![I32, I32], NativeType::matrix(F64), utility_zero_matrix))
        .add(NativeOp::new("identityMatrix", vec![I32], NativeType::matrix(F64), utility_identity_matrix))
        .add(NativeOp::new("transpose", vec![matrix.clone()], matrix, utility_transpose))
        .add_return_type("transpose", first_argument_type)
        .add(NativeOp::new("toString", vec![token], Str, utility_to_string))
        .add(NativeOp::new("parseInt", vec![Str], I32, utility_parse_int))
        .add(NativeOp::new("parseDouble", vec![Str], F64, utility_parse_double));
    Provider::new("utility", table)
}
