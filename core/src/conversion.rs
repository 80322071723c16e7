//! The bridge between [`Value`]s and the representations native operations take.
//!
//! Every parameter of a native operation declares a [`NativeType`]. For each
//! argument the resolver picks a [`ConversionRule`] that adapts the argument's
//! value type to that declaration; [`ConversionRule::apply`] runs it on an
//! actual value and [`from_native`] maps the result back.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use num_complex::Complex64;

use crate::errors::{Error, NativeError, Result};
use crate::types::{Relation, Type, compare, lattice::is_lower_or_equal};
use crate::values::{FixPoint, ObjectRef, Value};

// ============================================================================
// Value classes
// ============================================================================

/// Kind of value a method surface is attached to.
///
/// Each class has a fixed chain of surfaces searched for methods: its own,
/// then the broader kinds its values can be used as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueClass {
    Boolean,
    UnsignedByte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Complex,
    Fix,
    Scalar,
    String,
    Object,
    Array,
    Matrix,
    Record,
    Union,
    Function,
    /// Every value.
    Token,
}

impl ValueClass {
    pub fn of(ty: &Type) -> ValueClass {
        match ty {
            Type::Boolean => ValueClass::Boolean,
            Type::UnsignedByte => ValueClass::UnsignedByte,
            Type::Short => ValueClass::Short,
            Type::Int => ValueClass::Int,
            Type::Long => ValueClass::Long,
            Type::Float => ValueClass::Float,
            Type::Double => ValueClass::Double,
            Type::Complex => ValueClass::Complex,
            Type::Fix(_) => ValueClass::Fix,
            Type::Scalar => ValueClass::Scalar,
            Type::String => ValueClass::String,
            Type::Object(_) => ValueClass::Object,
            Type::Array(_) => ValueClass::Array,
            Type::Matrix(_) => ValueClass::Matrix,
            Type::Record(_) => ValueClass::Record,
            Type::Union(_) => ValueClass::Union,
            Type::Function(_) => ValueClass::Function,
            Type::Unknown | Type::General => ValueClass::Token,
        }
    }

    /// Surfaces searched for a receiver of this class, most specific first.
    pub fn chain(self) -> &'static [ValueClass] {
        use ValueClass::*;
        match self {
            Boolean => &[Boolean, Scalar, Token],
            UnsignedByte => &[UnsignedByte, Scalar, Token],
            Short => &[Short, Scalar, Token],
            Int => &[Int, Scalar, Token],
            Long => &[Long, Scalar, Token],
            Float => &[Float, Scalar, Token],
            Double => &[Double, Scalar, Token],
            Complex => &[Complex, Scalar, Token],
            Fix => &[Fix, Scalar, Token],
            Scalar => &[Scalar, Token],
            String => &[String, Token],
            Object => &[Object, Token],
            Array => &[Array, Token],
            Matrix => &[Matrix, Token],
            Record => &[Record, Token],
            Union => &[Union, Token],
            Function => &[Function, Token],
            Token => &[Token],
        }
    }

    /// The type a value of this class is known to have.
    pub fn value_type(self) -> Type {
        match self {
            ValueClass::Boolean => Type::Boolean,
            ValueClass::UnsignedByte => Type::UnsignedByte,
            ValueClass::Short => Type::Short,
            ValueClass::Int => Type::Int,
            ValueClass::Long => Type::Long,
            ValueClass::Float => Type::Float,
            ValueClass::Double => Type::Double,
            ValueClass::Complex => Type::Complex,
            ValueClass::Fix => Type::Fix(None),
            ValueClass::Scalar => Type::Scalar,
            ValueClass::String => Type::String,
            ValueClass::Object => Type::Object(None),
            ValueClass::Array => Type::array(Type::General),
            ValueClass::Matrix => Type::matrix(Type::General),
            ValueClass::Record
            | ValueClass::Union
            | ValueClass::Function
            | ValueClass::Token => Type::General,
        }
    }
}

// ============================================================================
// Native types
// ============================================================================

/// Declared parameter or return representation of a native operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NativeType {
    /// The value itself, for any value whose class chain contains the class.
    Value(ValueClass),
    Bool,
    U8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Complex,
    Fix,
    Str,
    Array(Box<NativeType>),
    Matrix(Box<NativeType>),
    /// The raw elements of an array, whatever their type.
    Values,
    Object,
}

impl NativeType {
    pub fn array(element: NativeType) -> NativeType {
        NativeType::Array(Box::new(element))
    }

    pub fn matrix(element: NativeType) -> NativeType {
        NativeType::Matrix(Box::new(element))
    }

    /// The lattice type values of this representation have.
    pub fn value_type(&self) -> Type {
        match self {
            NativeType::Value(class) => class.value_type(),
            NativeType::Bool => Type::Boolean,
            NativeType::U8 => Type::UnsignedByte,
            NativeType::I16 => Type::Short,
            NativeType::I32 => Type::Int,
            NativeType::I64 => Type::Long,
            NativeType::F32 => Type::Float,
            NativeType::F64 => Type::Double,
            NativeType::Complex => Type::Complex,
            NativeType::Fix => Type::Fix(None),
            NativeType::Str => Type::String,
            NativeType::Array(inner) => Type::array(inner.value_type()),
            NativeType::Matrix(inner) => Type::matrix(inner.value_type()),
            NativeType::Values => Type::array(Type::General),
            NativeType::Object => Type::Object(None),
        }
    }

    /// The representation a value of type `ty` converts to, if it has one.
    pub fn native_form(ty: &Type) -> Option<NativeType> {
        Some(match ty {
            Type::Boolean => NativeType::Bool,
            Type::UnsignedByte => NativeType::U8,
            Type::Short => NativeType::I16,
            Type::Int => NativeType::I32,
            Type::Long => NativeType::I64,
            Type::Float => NativeType::F32,
            Type::Double => NativeType::F64,
            Type::Complex => NativeType::Complex,
            Type::Fix(Some(_)) => NativeType::Fix,
            Type::String => NativeType::Str,
            Type::Object(Some(_)) => NativeType::Object,
            Type::Array(inner) => NativeType::array(NativeType::native_form(inner)?),
            Type::Matrix(inner) => NativeType::matrix(NativeType::native_form(inner)?),
            _ => return None,
        })
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeType::Value(class) => write!(f, "{class:?}"),
            NativeType::Bool => write!(f, "bool"),
            NativeType::U8 => write!(f, "u8"),
            NativeType::I16 => write!(f, "i16"),
            NativeType::I32 => write!(f, "i32"),
            NativeType::I64 => write!(f, "i64"),
            NativeType::F32 => write!(f, "f32"),
            NativeType::F64 => write!(f, "f64"),
            NativeType::Complex => write!(f, "complex"),
            NativeType::Fix => write!(f, "fix"),
            NativeType::Str => write!(f, "str"),
            NativeType::Array(inner) => write!(f, "[{inner}]"),
            NativeType::Matrix(inner) => write!(f, "[[{inner}]]"),
            NativeType::Values => write!(f, "[value]"),
            NativeType::Object => write!(f, "object"),
        }
    }
}

// ============================================================================
// Native values
// ============================================================================

/// A value in the representation a native operation works with.
#[derive(Debug, Clone, PartialEq)]
pub enum Native {
    Value(Value),
    Bool(bool),
    U8(u8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Complex(Complex64),
    Fix(FixPoint),
    Str(Arc<str>),
    /// Elements plus their declared representation, needed for empty arrays.
    Array(NativeType, Vec<Native>),
    /// Row-major elements.
    Matrix {
        rows: usize,
        cols: usize,
        elements: Vec<Native>,
    },
    Values(Vec<Value>),
    Object(ObjectRef),
}

fn mismatch(expected: &str, found: &Native) -> NativeError {
    NativeError::new(format!("expected {expected}, found {found:?}"))
}

impl Native {
    pub fn str(s: impl AsRef<str>) -> Native {
        Native::Str(Arc::from(s.as_ref()))
    }

    pub fn as_bool(&self) -> Result<bool, NativeError> {
        match self {
            Native::Bool(b) => Ok(*b),
            other => Err(mismatch("bool", other)),
        }
    }

    pub fn as_i32(&self) -> Result<i32, NativeError> {
        match self {
            Native::I32(v) => Ok(*v),
            Native::I16(v) => Ok(*v as i32),
            Native::U8(v) => Ok(*v as i32),
            other => Err(mismatch("i32", other)),
        }
    }

    pub fn as_i64(&self) -> Result<i64, NativeError> {
        match self {
            Native::I64(v) => Ok(*v),
            other => other.as_i32().map(i64::from).map_err(|_| mismatch("i64", other)),
        }
    }

    pub fn as_f64(&self) -> Result<f64, NativeError> {
        match self {
            Native::F64(v) => Ok(*v),
            Native::F32(v) => Ok(*v as f64),
            Native::Fix(v) => Ok(v.to_f64()),
            other => other.as_i64().map(|v| v as f64).map_err(|_| mismatch("f64", other)),
        }
    }

    pub fn as_complex(&self) -> Result<Complex64, NativeError> {
        match self {
            Native::Complex(c) => Ok(*c),
            other => Err(mismatch("complex", other)),
        }
    }

    pub fn as_fix(&self) -> Result<FixPoint, NativeError> {
        match self {
            Native::Fix(f) => Ok(*f),
            other => Err(mismatch("fix", other)),
        }
    }

    pub fn as_str(&self) -> Result<&str, NativeError> {
        match self {
            Native::Str(s) => Ok(s),
            other => Err(mismatch("str", other)),
        }
    }

    pub fn as_value(&self) -> Result<&Value, NativeError> {
        match self {
            Native::Value(v) => Ok(v),
            other => Err(mismatch("value", other)),
        }
    }

    pub fn as_array(&self) -> Result<&[Native], NativeError> {
        match self {
            Native::Array(_, elements) => Ok(elements),
            other => Err(mismatch("array", other)),
        }
    }

    pub fn as_values(&self) -> Result<&[Value], NativeError> {
        match self {
            Native::Values(values) => Ok(values),
            other => Err(mismatch("values", other)),
        }
    }
}

/// Convert a value to its own native form.
pub fn to_native(value: &Value) -> Result<Native> {
    Ok(match value {
        Value::Boolean(b) => Native::Bool(*b),
        Value::UnsignedByte(v) => Native::U8(*v),
        Value::Short(v) => Native::I16(*v),
        Value::Int(v) => Native::I32(*v),
        Value::Long(v) => Native::I64(*v),
        Value::Float(v) => Native::F32(*v),
        Value::Double(v) => Native::F64(*v),
        Value::Complex(c) => Native::Complex(*c),
        Value::Fix(f) => Native::Fix(*f),
        Value::String(s) => Native::Str(s.clone()),
        Value::Object(o) => Native::Object(o.clone()),
        Value::Array(a) => {
            let element = NativeType::native_form(a.element_type()).ok_or_else(|| {
                Error::type_error(format!(
                    "arrays of {} have no native form",
                    a.element_type()
                ))
            })?;
            let elements = a
                .elements()
                .iter()
                .map(to_native)
                .collect::<Result<Vec<_>>>()?;
            Native::Array(element, elements)
        }
        Value::Matrix(m) => Native::Matrix {
            rows: m.rows(),
            cols: m.cols(),
            elements: m
                .elements()
                .iter()
                .map(to_native)
                .collect::<Result<Vec<_>>>()?,
        },
        other => {
            return Err(Error::type_error(format!(
                "{} has no native form",
                other.ty()
            )));
        }
    })
}

/// Map a native result back to a value.
pub fn from_native(native: Native) -> Result<Value> {
    Ok(match native {
        Native::Value(v) => v,
        Native::Bool(b) => Value::Boolean(b),
        Native::U8(v) => Value::UnsignedByte(v),
        Native::I16(v) => Value::Short(v),
        Native::I32(v) => Value::Int(v),
        Native::I64(v) => Value::Long(v),
        Native::F32(v) => Value::Float(v),
        Native::F64(v) => Value::Double(v),
        Native::Complex(c) => Value::Complex(c),
        Native::Fix(f) => Value::Fix(f),
        Native::Str(s) => Value::String(s),
        Native::Object(o) => Value::Object(o),
        Native::Array(element, elements) => {
            let elements = elements
                .into_iter()
                .map(from_native)
                .collect::<Result<Vec<_>>>()?;
            Value::array_with(element.value_type(), elements)?
        }
        Native::Matrix {
            rows,
            cols,
            elements,
        } => {
            let elements = elements
                .into_iter()
                .map(from_native)
                .collect::<Result<Vec<_>>>()?;
            Value::matrix_from_flat(rows, cols, elements)?
        }
        Native::Values(values) => Value::array(values)?,
    })
}

// ============================================================================
// Conversion rules
// ============================================================================

/// Strategy for adapting one argument to a declared [`NativeType`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConversionRule {
    Impossible,
    ArrayToNativeArray,
    ScalarToNative,
    /// Convert the value up to `target` first, then apply `inner`.
    PromoteThenConvert {
        target: Type,
        inner: Box<ConversionRule>,
    },
    Identity,
}

impl ConversionRule {
    pub fn rank(&self) -> u8 {
        match self {
            ConversionRule::Identity => 4,
            ConversionRule::ScalarToNative => 3,
            ConversionRule::PromoteThenConvert { .. } => 2,
            ConversionRule::ArrayToNativeArray => 1,
            ConversionRule::Impossible => 0,
        }
    }

    pub fn is_possible(&self) -> bool {
        !matches!(self, ConversionRule::Impossible)
    }

    /// How this rule compares to `other`; `None` when neither is preferable.
    ///
    /// Two promotions with equal rank prefer the lower (more specific)
    /// target, then the better inner rule.
    pub fn preference(&self, other: &ConversionRule) -> Option<Ordering> {
        match (self, other) {
            (
                ConversionRule::PromoteThenConvert {
                    target: a,
                    inner: ia,
                },
                ConversionRule::PromoteThenConvert {
                    target: b,
                    inner: ib,
                },
            ) => match compare(a, b) {
                Relation::Lower => Some(Ordering::Greater),
                Relation::Higher => Some(Ordering::Less),
                Relation::Equal => ia.preference(ib),
                Relation::Incomparable => None,
            },
            _ => Some(self.rank().cmp(&other.rank())),
        }
    }

    /// The rule adapting a value of type `actual` to `formal`.
    pub fn for_types(formal: &NativeType, actual: &Type) -> ConversionRule {
        if let NativeType::Value(class) = formal {
            return if ValueClass::of(actual).chain().contains(class) {
                ConversionRule::Identity
            } else {
                ConversionRule::Impossible
            };
        }
        if *formal == NativeType::Values && matches!(actual, Type::Array(_)) {
            return ConversionRule::ArrayToNativeArray;
        }
        if NativeType::native_form(actual).as_ref() == Some(formal) {
            return ConversionRule::ScalarToNative;
        }
        let target = formal.value_type();
        if target.is_concrete()
            && is_lower_or_equal(actual, &target)
            && NativeType::native_form(&target).as_ref() == Some(formal)
        {
            return ConversionRule::PromoteThenConvert {
                target,
                inner: Box::new(ConversionRule::ScalarToNative),
            };
        }
        ConversionRule::Impossible
    }

    /// Adapt `value` to the representation this rule targets.
    pub fn apply(&self, value: &Value) -> Result<Native> {
        match self {
            ConversionRule::Identity => Ok(Native::Value(value.clone())),
            ConversionRule::ScalarToNative => to_native(value),
            ConversionRule::PromoteThenConvert { target, inner } => {
                inner.apply(&value.convert_to(target)?)
            }
            ConversionRule::ArrayToNativeArray => match value {
                Value::Array(a) => Ok(Native::Values(a.elements().to_vec())),
                other => Err(Error::type_error(format!(
                    "expected an array, found {}",
                    other.ty()
                ))),
            },
            ConversionRule::Impossible => Err(Error::type_error(format!(
                "{} cannot be passed to a native operation",
                value.ty()
            ))),
        }
    }
}

impl fmt::Display for ConversionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionRule::Impossible => write!(f, "impossible"),
            ConversionRule::ArrayToNativeArray => write!(f, "array-to-native-array"),
            ConversionRule::ScalarToNative => write!(f, "scalar-to-native"),
            ConversionRule::PromoteThenConvert { target, inner } => {
                write!(f, "promote({target}) then {inner}")
            }
            ConversionRule::Identity => write!(f, "identity"),
        }
    }
}

#[cfg(test)]
#[path = "conversion_test.rs"]
mod conversion_test;
