//! Two's-complement fixed-point numbers.
//!
//! A [`FixPoint`] stores its value scaled by `2^fraction_bits` in an `i128`.
//! Quantization rounds half up, and every result saturates at the bounds of
//! its precision instead of wrapping.

use std::cmp::Ordering;
use std::fmt;

use crate::errors::{Error, Result};
use crate::types::Precision;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixPoint {
    precision: Precision,
    scaled: i128,
}

fn max_scaled(precision: &Precision) -> i128 {
    (1i128 << (precision.total_bits() - 1)) - 1
}

fn min_scaled(precision: &Precision) -> i128 {
    -(1i128 << (precision.total_bits() - 1))
}

fn saturate(scaled: i128, precision: &Precision) -> i128 {
    scaled.clamp(min_scaled(precision), max_scaled(precision))
}

/// Rescale `scaled` from `from` fraction bits to `to` fraction bits.
fn rescale(scaled: i128, from: u32, to: u32) -> i128 {
    match to.cmp(&from) {
        Ordering::Equal => scaled,
        Ordering::Greater => {
            let factor = 1i128.checked_shl(to - from).unwrap_or(i128::MAX);
            scaled.saturating_mul(factor)
        }
        Ordering::Less => {
            let diff = from - to;
            // Round half up: add half an output ulp, then floor.
            let half = 1i128 << (diff - 1);
            scaled.saturating_add(half) >> diff
        }
    }
}

impl FixPoint {
    pub fn from_f64(value: f64, precision: Precision) -> Self {
        let scaled = if value.is_nan() {
            0
        } else {
            let factor = 2f64.powi(precision.fraction_bits() as i32);
            // `as` saturates for out-of-range floats.
            (value * factor + 0.5).floor() as i128
        };
        Self {
            precision,
            scaled: saturate(scaled, &precision),
        }
    }

    pub fn from_integer(value: i64, precision: Precision) -> Self {
        let scaled = rescale(value as i128, 0, precision.fraction_bits());
        Self {
            precision,
            scaled: saturate(scaled, &precision),
        }
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// Raw two's-complement representation, scaled by `2^fraction_bits`.
    pub fn scaled(&self) -> i128 {
        self.scaled
    }

    pub fn to_f64(&self) -> f64 {
        self.scaled as f64 / 2f64.powi(self.precision.fraction_bits() as i32)
    }

    /// Re-quantize to another precision.
    pub fn quantize(&self, precision: Precision) -> Self {
        let scaled = rescale(
            self.scaled,
            self.precision.fraction_bits(),
            precision.fraction_bits(),
        );
        Self {
            precision,
            scaled: saturate(scaled, &precision),
        }
    }

    fn aligned(&self, fraction_bits: u32) -> i128 {
        rescale(self.scaled, self.precision.fraction_bits(), fraction_bits)
    }

    pub fn add(&self, other: &FixPoint) -> Result<FixPoint> {
        let precision = self.precision.sum(&other.precision)?;
        let frac = precision.fraction_bits();
        let scaled = self.aligned(frac).saturating_add(other.aligned(frac));
        Ok(Self {
            precision,
            scaled: saturate(scaled, &precision),
        })
    }

    pub fn subtract(&self, other: &FixPoint) -> Result<FixPoint> {
        let precision = self.precision.sum(&other.precision)?;
        let frac = precision.fraction_bits();
        let scaled = self.aligned(frac).saturating_sub(other.aligned(frac));
        Ok(Self {
            precision,
            scaled: saturate(scaled, &precision),
        })
    }

    pub fn multiply(&self, other: &FixPoint) -> Result<FixPoint> {
        let precision = self.precision.product(&other.precision)?;
        let scaled = self.scaled.saturating_mul(other.scaled);
        Ok(Self {
            precision,
            scaled: saturate(scaled, &precision),
        })
    }

    /// Quotient quantized to the join of both precisions.
    pub fn divide(&self, other: &FixPoint) -> Result<FixPoint> {
        if other.scaled == 0 {
            return Err(Error::DivisionByZero);
        }
        let precision = self.precision.join(&other.precision);
        Ok(FixPoint::from_f64(
            self.to_f64() / other.to_f64(),
            precision,
        ))
    }

    pub fn negate(&self) -> FixPoint {
        Self {
            precision: self.precision,
            scaled: saturate(self.scaled.saturating_neg(), &self.precision),
        }
    }

    /// Numeric comparison, independent of precision.
    pub fn compare(&self, other: &FixPoint) -> Ordering {
        let frac = self
            .precision
            .fraction_bits()
            .max(other.precision.fraction_bits());
        self.aligned(frac).cmp(&other.aligned(frac))
    }
}

impl fmt::Display for FixPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fix({:?}, {}, {})",
            self.to_f64(),
            self.precision.total_bits(),
            self.precision.integer_bits()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn p(total: u32, integer: u32) -> Precision {
        Precision::new(total, integer).unwrap()
    }

    #[test]
    fn test_quantization_rounds_half_up() {
        assert_eq!(FixPoint::from_f64(1.3, p(8, 4)).to_f64(), 1.3125);
        assert_eq!(FixPoint::from_f64(0.03125, p(8, 4)).to_f64(), 0.0625);
        assert_eq!(FixPoint::from_f64(-0.03125, p(8, 4)).to_f64(), 0.0);
    }

    #[test]
    fn test_saturation() {
        // 8 bits with 4 integer bits spans [-8, 7.9375].
        assert_eq!(FixPoint::from_f64(100.0, p(8, 4)).to_f64(), 7.9375);
        assert_eq!(FixPoint::from_f64(-100.0, p(8, 4)).to_f64(), -8.0);
        assert_eq!(FixPoint::from_integer(9, p(8, 4)).to_f64(), 7.9375);
    }

    #[test]
    fn test_arithmetic_precisions() {
        let a = FixPoint::from_f64(1.5, p(8, 4));
        let b = FixPoint::from_f64(2.25, p(6, 3));
        let sum = a.add(&b).unwrap();
        assert_eq!(sum.precision(), p(9, 5));
        assert_eq!(sum.to_f64(), 3.75);
        let product = a.multiply(&b).unwrap();
        assert_eq!(product.precision(), p(14, 7));
        assert_eq!(product.to_f64(), 3.375);
        assert_eq!(a.subtract(&b).unwrap().to_f64(), -0.75);
    }

    #[test]
    fn test_divide_by_zero() {
        let a = FixPoint::from_f64(1.5, p(8, 4));
        let zero = FixPoint::from_f64(0.0, p(8, 4));
        assert_eq!(a.divide(&zero), Err(Error::DivisionByZero));
    }

    #[test]
    fn test_compare_across_precisions() {
        let a = FixPoint::from_f64(1.5, p(8, 4));
        let b = FixPoint::from_f64(1.5, p(16, 4));
        assert_eq!(a.compare(&b), Ordering::Equal);
        assert_eq!(a.negate().compare(&b), Ordering::Less);
    }

    #[test]
    fn test_display() {
        assert_eq!(FixPoint::from_f64(1.5, p(8, 4)).to_string(), "fix(1.5, 8, 4)");
    }
}
