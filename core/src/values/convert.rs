//! Lossless conversion of a value up the type lattice.

use num_complex::Complex64;

use crate::errors::{Error, Result};
use crate::types::{Type, lattice::is_lower_or_equal};

use super::Value;

impl Value {
    /// Convert this value to `target`, which must be higher or equal in the lattice.
    ///
    /// Abstract targets (`general`, `scalar`, ...) leave scalars untouched;
    /// containers converted to an abstract element type keep their elements
    /// and only take on the wider element type.
    pub fn convert_to(&self, target: &Type) -> Result<Value> {
        let source = self.ty();
        if &source == target {
            return Ok(self.clone());
        }
        if !is_lower_or_equal(&source, target) {
            return Err(Error::type_error(format!(
                "cannot convert {self} of type {source} to {target} without loss"
            )));
        }
        if target.is_abstract() {
            return Ok(self.clone());
        }
        match (self, target) {
            (_, Type::String) => Ok(Value::string(self.to_plain_string())),
            (Value::Array(array), Type::Array(element)) => {
                if element.is_concrete() {
                    let elements = array
                        .elements()
                        .iter()
                        .map(|e| e.convert_to(element))
                        .collect::<Result<Vec<_>>>()?;
                    Ok(Value::array_unchecked((**element).clone(), elements))
                } else {
                    Ok(Value::array_unchecked(
                        (**element).clone(),
                        array.elements().to_vec(),
                    ))
                }
            }
            (Value::Matrix(matrix), Type::Matrix(element)) => {
                let elements = if element.is_concrete() {
                    matrix
                        .elements()
                        .iter()
                        .map(|e| e.convert_to(element))
                        .collect::<Result<Vec<_>>>()?
                } else {
                    matrix.elements().to_vec()
                };
                Ok(Value::matrix_unchecked(
                    (**element).clone(),
                    matrix.rows(),
                    matrix.cols(),
                    elements,
                ))
            }
            (Value::Record(fields), Type::Record(target_fields)) => {
                let mut converted = Vec::with_capacity(target_fields.len());
                for (label, ty) in target_fields {
                    let field = fields.get(label).ok_or_else(|| {
                        Error::type_error(format!("record has no field {label}"))
                    })?;
                    converted.push((label.clone(), field.convert_to(ty)?));
                }
                Ok(Value::record(converted))
            }
            (Value::Union(union), Type::Union(alternatives)) => {
                let ty = alternatives.get(union.label()).ok_or_else(|| {
                    Error::type_error(format!("union has no alternative {}", union.label()))
                })?;
                Ok(Value::union_of(
                    alternatives.clone(),
                    union.label().to_string(),
                    union.value().convert_to(ty)?,
                ))
            }
            // Functions, objects and other structural values keep their identity.
            (Value::Function(_) | Value::Object(_), _) => Ok(self.clone()),
            _ => convert_scalar(self, target),
        }
    }
}

fn convert_scalar(value: &Value, target: &Type) -> Result<Value> {
    let converted = match (value, target) {
        (Value::UnsignedByte(v), Type::Short) => Value::Short(*v as i16),
        (Value::UnsignedByte(v), Type::Int) => Value::Int(*v as i32),
        (Value::UnsignedByte(v), Type::Long) => Value::Long(*v as i64),
        (Value::UnsignedByte(v), Type::Float) => Value::Float(*v as f32),
        (Value::UnsignedByte(v), Type::Double) => Value::Double(*v as f64),
        (Value::UnsignedByte(v), Type::Complex) => Value::Complex(Complex64::new(*v as f64, 0.0)),
        (Value::Short(v), Type::Int) => Value::Int(*v as i32),
        (Value::Short(v), Type::Long) => Value::Long(*v as i64),
        (Value::Short(v), Type::Float) => Value::Float(*v as f32),
        (Value::Short(v), Type::Double) => Value::Double(*v as f64),
        (Value::Short(v), Type::Complex) => Value::Complex(Complex64::new(*v as f64, 0.0)),
        (Value::Int(v), Type::Long) => Value::Long(*v as i64),
        (Value::Int(v), Type::Double) => Value::Double(*v as f64),
        (Value::Int(v), Type::Complex) => Value::Complex(Complex64::new(*v as f64, 0.0)),
        (Value::Float(v), Type::Double) => Value::Double(*v as f64),
        (Value::Float(v), Type::Complex) => Value::Complex(Complex64::new(*v as f64, 0.0)),
        (Value::Double(v), Type::Complex) => Value::Complex(Complex64::new(*v, 0.0)),
        (Value::Fix(f), Type::Fix(Some(p))) => Value::Fix(f.quantize(*p)),
        _ => {
            return Err(Error::type_error(format!(
                "cannot convert {value} to {target}"
            )));
        }
    };
    Ok(converted)
}
