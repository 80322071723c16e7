//! Math provider.
//!
//! Functions: abs, min, max, sgn (int, long and double overloads), sin, cos,
//! tan, asin, acos, atan, atan2, sinh, cosh, tanh, exp, log, sqrt, pow,
//! hypot, floor, ceil, round.

use crate::conversion::{Native, NativeType};
use crate::errors::NativeError;

use super::{NativeOp, OperationTable, Provider};

type NativeResult = Result<Native, NativeError>;

// ============================================================================
// Overloaded arithmetic
// ============================================================================

fn abs_i32(args: &[Native]) -> NativeResult {
    Ok(Native::I32(args[0].as_i32()?.wrapping_abs()))
}

fn abs_i64(args: &[Native]) -> NativeResult {
    Ok(Native::I64(args[0].as_i64()?.wrapping_abs()))
}

fn abs_f64(args: &[Native]) -> NativeResult {
    Ok(Native::F64(args[0].as_f64()?.abs()))
}

fn min_i32(args: &[Native]) -> NativeResult {
    Ok(Native::I32(args[0].as_i32()?.min(args[1].as_i32()?)))
}

fn min_i64(args: &[Native]) -> NativeResult {
    Ok(Native::I64(args[0].as_i64()?.min(args[1].as_i64()?)))
}

fn min_f64(args: &[Native]) -> NativeResult {
    Ok(Native::F64(args[0].as_f64()?.min(args[1].as_f64()?)))
}

fn max_i32(args: &[Native]) -> NativeResult {
    Ok(Native::I32(args[0].as_i32()?.max(args[1].as_i32()?)))
}

fn max_i64(args: &[Native]) -> NativeResult {
    Ok(Native::I64(args[0].as_i64()?.max(args[1].as_i64()?)))
}

fn max_f64(args: &[Native]) -> NativeResult {
    Ok(Native::F64(args[0].as_f64()?.max(args[1].as_f64()?)))
}

fn sgn_i32(args: &[Native]) -> NativeResult {
    Ok(Native::I32(args[0].as_i32()?.signum()))
}

fn sgn_i64(args: &[Native]) -> NativeResult {
    Ok(Native::I32(args[0].as_i64()?.signum() as i32))
}

/// Sign of a double; zero and NaN map to zero.
fn sgn_f64(args: &[Native]) -> NativeResult {
    let x = args[0].as_f64()?;
    Ok(Native::I32(if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }))
}

// ============================================================================
// Real functions
// ============================================================================

macro_rules! unary_f64 {
    ($name:ident, $method:ident) => {
        fn $name(args: &[Native]) -> NativeResult {
            Ok(Native::F64(args[0].as_f64()?.$method()))
        }
    };
}

unary_f64!(math_sin, sin);
unary_f64!(math_cos, cos);
unary_f64!(math_tan, tan);
unary_f64!(math_asin, asin);
unary_f64!(math_acos, acos);
unary_f64!(math_atan, atan);
unary_f64!(math_sinh, sinh);
unary_f64!(math_cosh, cosh);
unary_f64!(math_tanh, tanh);
unary_f64!(math_exp, exp);
unary_f64!(math_sqrt, sqrt);
unary_f64!(math_floor, floor);
unary_f64!(math_ceil, ceil);

/// Natural logarithm
fn math_log(args: &[Native]) -> NativeResult {
    Ok(Native::F64(args[0].as_f64()?.ln()))
}

fn math_atan2(args: &[Native]) -> NativeResult {
    Ok(Native::F64(args[0].as_f64()?.atan2(args[1].as_f64()?)))
}

fn math_pow(args: &[Native]) -> NativeResult {
    Ok(Native::F64(args[0].as_f64()?.powf(args[1].as_f64()?)))
}

fn math_hypot(args: &[Native]) -> NativeResult {
    Ok(Native::F64(args[0].as_f64()?.hypot(args[1].as_f64()?)))
}

/// Round half away from zero to a long.
fn math_round(args: &[Native]) -> NativeResult {
    let x = args[0].as_f64()?;
    if !x.is_finite() {
        return Err(NativeError::new(format!("cannot round {x} to a long")));
    }
    Ok(Native::I64(x.round() as i64))
}

// ============================================================================
// Provider
// ============================================================================

pub fn build_math_provider() -> Provider {
    use NativeType::{F64, I32, I64};

    let mut table = OperationTable::new();

    table
        .add(NativeOp::new("abs", vec![I32], I32, abs_i32))
        .add(NativeOp::new("abs", vec![I64], I64, abs_i64))
        .add(NativeOp::new("abs", vec![F64], F64, abs_f64))
        .add(NativeOp::new("min", vec![I32, I32], I32, min_i32))
        .add(NativeOp::new("min", vec![I64, I64], I64, min_i64))
        .add(NativeOp::new("min", vec![F64, F64], F64, min_f64))
        .add(NativeOp::new("max", vec![I32, I32], I32, max_i32))
        .add(NativeOp::new("max", vec![I64, I64], I64, max_i64))
        .add(NativeOp::new("max", vec![F64, F64], F64, max_f64))
        .add(NativeOp::new("sgn", vec![I32], I32, sgn_i32))
        .add(NativeOp::new("sgn", vec![I64], I32, sgn_i64))
        .add(NativeOp::new("sgn", vec![F64], I32, sgn_f64));

    let unary: [(&str, super::NativeFn); 15] = [
        ("sin", math_sin),
        ("cos", math_cos),
        ("tan", math_tan),
        ("asin", math_asin),
        ("acos", math_acos),
        ("atan", math_atan),
        ("sinh", math_sinh),
        ("cosh", math_cosh),
        ("tanh", math_tanh),
        ("exp", math_exp),
        ("log", math_log),
        ("sqrt", math_sqrt),
        ("floor", math_floor),
        ("ceil", math_ceil),
        ("round", math_round),
    ];
    for (name, func) in unary {
        let ret = if name == "round" { I64 } else { F64 };
        table.add(NativeOp::new(name, vec![F64], ret, func));
    }

    table
        .add(NativeOp::new("atan2", vec![F64, F64], F64, math_atan2))
        .add(NativeOp::new("pow", vec![F64, F64], F64, math_pow))
        .add(NativeOp::new("hypot", vec![F64, F64], F64, math_hypot));

    Provider::new("math", table)
}
