//! Complex-number provider: conjugate, real, imag, magnitude, angle and
//! polarToComplex. Real arguments are promoted to complex.

use num_complex::Complex64;

use crate::conversion::{Native, NativeType};
use crate::errors::NativeError;

use super::{NativeOp, OperationTable, Provider};

type NativeResult = Result<Native, NativeError>;

pub(crate) fn complex_conjugate(args: &[Native]) -> NativeResult {
    Ok(Native::Complex(args[0].as_complex()?.conj()))
}

pub(crate) fn complex_real(args: &[Native]) -> NativeResult {
    Ok(Native::F64(args[0].as_complex()?.re))
}

pub(crate) fn complex_imag(args: &[Native]) -> NativeResult {
    Ok(Native::F64(args[0].as_complex()?.im))
}

pub(crate) fn complex_magnitude(args: &[Native]) -> NativeResult {
    Ok(Native::F64(args[0].as_complex()?.norm()))
}

/// Argument in radians, in `(-pi, pi]`.
pub(crate) fn complex_angle(args: &[Native]) -> NativeResult {
    Ok(Native::F64(args[0].as_complex()?.arg()))
}

fn polar_to_complex(args: &[Native]) -> NativeResult {
    Ok(Native::Complex(Complex64::from_polar(
        args[0].as_f64()?,
        args[1].as_f64()?,
    )))
}

pub fn build_complex_provider() -> Provider {
    use NativeType::{Complex, F64};

    let mut table = OperationTable::new();
    table
        .add(NativeOp::new("conjugate", vec![Complex], Complex, complex_conjugate))
        .add(NativeOp::new("real", vec![Complex], F64, complex_real))
        .add(NativeOp::new("imag", vec![Complex], F64, complex_imag))
        .add(NativeOp::new("magnitude", vec![Complex], F64, complex_magnitude))
        .add(NativeOp::new("angle", vec![Complex], F64, complex_angle))
        .add(NativeOp::new("polarToComplex", vec![F64, F64], Complex, polar_to_complex));
    Provider::new("complex", table)
}
