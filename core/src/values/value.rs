use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use num_complex::Complex64;

use crate::errors::{Error, Result};
use crate::syntax::string_literal::escape_string;
use crate::types::{Type, least_upper_bound_of};

use super::{ExpressionFunction, FixPoint, ObjectRef};

/// A runtime value ("token").
///
/// Structural variants share their payload through `Arc`, so cloning a value
/// is cheap regardless of its size.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    UnsignedByte(u8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Complex(Complex64),
    Fix(FixPoint),
    String(Arc<str>),
    Object(ObjectRef),
    Array(ArrayValue),
    Matrix(MatrixValue),
    Record(Arc<BTreeMap<String, Value>>),
    Union(UnionValue),
    Function(Arc<ExpressionFunction>),
}

/// Fixed-length sequence whose elements all have (or were converted to) one type.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayValue {
    element_type: Type,
    elements: Arc<[Value]>,
}

impl ArrayValue {
    pub fn element_type(&self) -> &Type {
        &self.element_type
    }

    pub fn elements(&self) -> &[Value] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.elements.get(index)
    }
}

/// Row-major grid of scalars sharing one element type.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixValue {
    element_type: Type,
    rows: usize,
    cols: usize,
    elements: Arc<[Value]>,
}

impl MatrixValue {
    pub fn element_type(&self) -> &Type {
        &self.element_type
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Elements in row-major order.
    pub fn elements(&self) -> &[Value] {
        &self.elements
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Value> {
        if row < self.rows && col < self.cols {
            self.elements.get(row * self.cols + col)
        } else {
            None
        }
    }

    pub fn row(&self, row: usize) -> &[Value] {
        &self.elements[row * self.cols..(row + 1) * self.cols]
    }
}

/// One labelled alternative of a union type.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionValue {
    alternatives: BTreeMap<String, Type>,
    label: String,
    value: Box<Value>,
}

impl UnionValue {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn alternatives(&self) -> &BTreeMap<String, Type> {
        &self.alternatives
    }
}

impl Value {
    // ============================================================================
    // Construction
    // ============================================================================

    pub fn string(s: impl AsRef<str>) -> Value {
        Value::String(Arc::from(s.as_ref()))
    }

    /// Build an array whose element type is the join of the elements' types.
    ///
    /// Every element is converted up to that join. An empty array takes
    /// `element_type` as its element type.
    pub fn array_with(element_type: Type, elements: Vec<Value>) -> Result<Value> {
        if elements.is_empty() {
            return Ok(Value::Array(ArrayValue {
                element_type,
                elements: Arc::from(elements),
            }));
        }
        let types: Vec<Type> = elements.iter().map(Value::ty).collect();
        let join = least_upper_bound_of(&types);
        let elements = elements
            .iter()
            .map(|e| e.convert_to(&join))
            .collect::<Result<Vec<_>>>()?;
        Ok(Value::Array(ArrayValue {
            element_type: join,
            elements: Arc::from(elements),
        }))
    }

    pub fn array(elements: Vec<Value>) -> Result<Value> {
        Value::array_with(Type::Unknown, elements)
    }

    /// Build a matrix from row-major elements.
    pub fn matrix_from_flat(rows: usize, cols: usize, elements: Vec<Value>) -> Result<Value> {
        if rows * cols != elements.len() {
            return Err(Error::shape(format!(
                "{} elements cannot fill a {rows}x{cols} matrix",
                elements.len()
            )));
        }
        if elements.is_empty() {
            return Err(Error::shape("a matrix needs at least one element"));
        }
        let types: Vec<Type> = elements.iter().map(Value::ty).collect();
        let element_type = least_upper_bound_of(&types).matrix_element()?;
        if !element_type.is_concrete() {
            return Err(Error::type_error(format!(
                "matrix elements have no common scalar type ({element_type})"
            )));
        }
        let elements = elements
            .iter()
            .map(|e| e.convert_to(&element_type))
            .collect::<Result<Vec<_>>>()?;
        Ok(Value::Matrix(MatrixValue {
            element_type,
            rows,
            cols,
            elements: Arc::from(elements),
        }))
    }

    pub fn record<I, S>(fields: I) -> Value
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        Value::Record(Arc::new(
            fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// A union value; the union's type has the single alternative `label`.
    pub fn union(label: impl Into<String>, value: Value) -> Value {
        let label = label.into();
        let alternatives = BTreeMap::from([(label.clone(), value.ty())]);
        Value::Union(UnionValue {
            alternatives,
            label,
            value: Box::new(value),
        })
    }

    pub(crate) fn union_of(
        alternatives: BTreeMap<String, Type>,
        label: String,
        value: Value,
    ) -> Value {
        Value::Union(UnionValue {
            alternatives,
            label,
            value: Box::new(value),
        })
    }

    pub(crate) fn array_unchecked(element_type: Type, elements: Vec<Value>) -> Value {
        Value::Array(ArrayValue {
            element_type,
            elements: Arc::from(elements),
        })
    }

    pub(crate) fn matrix_unchecked(
        element_type: Type,
        rows: usize,
        cols: usize,
        elements: Vec<Value>,
    ) -> Value {
        Value::Matrix(MatrixValue {
            element_type,
            rows,
            cols,
            elements: Arc::from(elements),
        })
    }

    // ============================================================================
    // Inspection
    // ============================================================================

    pub fn ty(&self) -> Type {
        match self {
            Value::Boolean(_) => Type::Boolean,
            Value::UnsignedByte(_) => Type::UnsignedByte,
            Value::Short(_) => Type::Short,
            Value::Int(_) => Type::Int,
            Value::Long(_) => Type::Long,
            Value::Float(_) => Type::Float,
            Value::Double(_) => Type::Double,
            Value::Complex(_) => Type::Complex,
            Value::Fix(f) => Type::fix(f.precision()),
            Value::String(_) => Type::String,
            Value::Object(o) => Type::Object(Some(o.class())),
            Value::Array(a) => Type::array(a.element_type.clone()),
            Value::Matrix(m) => Type::matrix(m.element_type.clone()),
            Value::Record(fields) => Type::Record(
                fields
                    .iter()
                    .map(|(label, value)| (label.clone(), value.ty()))
                    .collect(),
            ),
            Value::Union(u) => Type::Union(u.alternatives.clone()),
            Value::Function(f) => f.ty(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer value of an integral scalar.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::UnsignedByte(v) => Some(*v as i64),
            Value::Short(v) => Some(*v as i64),
            Value::Int(v) => Some(*v as i64),
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric value of a real scalar.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v as f64),
            Value::Double(v) => Some(*v),
            Value::Fix(f) => Some(f.to_f64()),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayValue> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_matrix(&self) -> Option<&MatrixValue> {
        match self {
            Value::Matrix(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        self.ty().is_scalar()
    }

    /// Text used when a value is converted to a string.
    ///
    /// Strings yield their contents; everything else its display form.
    pub fn to_plain_string(&self) -> String {
        match self {
            Value::String(s) => s.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::string(v)
    }
}

/// Format a float so that it reads back as the same kind of literal.
pub(crate) fn format_double(f: &mut impl fmt::Write, value: f64) -> fmt::Result {
    if value.is_nan() {
        write!(f, "NaN")
    } else if value.is_infinite() {
        if value.is_sign_positive() {
            write!(f, "Infinity")
        } else {
            write!(f, "-Infinity")
        }
    } else {
        // Debug formatting always keeps a decimal point or an exponent.
        write!(f, "{:?}", value)
    }
}

fn format_complex(f: &mut fmt::Formatter<'_>, c: &Complex64) -> fmt::Result {
    format_double(f, c.re)?;
    if c.im < 0.0 {
        write!(f, " - ")?;
        format_double(f, -c.im)?;
    } else {
        write!(f, " + ")?;
        format_double(f, c.im)?;
    }
    write!(f, "i")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{b}"),
            Value::UnsignedByte(v) => write!(f, "{v}ub"),
            Value::Short(v) => write!(f, "{v}s"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}L"),
            Value::Float(v) if v.is_finite() => write!(f, "{v:?}f"),
            Value::Float(v) => format_double(f, *v as f64),
            Value::Double(v) => format_double(f, *v),
            Value::Complex(c) => format_complex(f, c),
            Value::Fix(fix) => write!(f, "{fix}"),
            Value::String(s) => escape_string(f, s),
            Value::Object(o) => write!(f, "{o}"),
            Value::Array(a) => {
                write!(f, "[")?;
                for (i, elem) in a.elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{elem}")?;
                }
                write!(f, "]")
            }
            Value::Matrix(m) => {
                write!(f, "[")?;
                for row in 0..m.rows {
                    if row > 0 {
                        write!(f, "; ")?;
                    }
                    for (col, elem) in m.row(row).iter().enumerate() {
                        if col > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{elem}")?;
                    }
                }
                // A single row needs the separator to read back as a matrix.
                if m.rows == 1 {
                    write!(f, ";")?;
                }
                write!(f, "]")
            }
            Value::Record(fields) => {
                write!(f, "{{")?;
                for (i, (label, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{label} = {value}")?;
                }
                write!(f, "}}")
            }
            Value::Union(u) => write!(f, "{{|{} = {}|}}", u.label, u.value),
            Value::Function(func) => write!(f, "{func}"),
        }
    }
}
