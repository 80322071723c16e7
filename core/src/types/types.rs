use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::errors::{Error, Result};

/// Largest total bit width a fixed-point precision may have.
///
/// Products of two values at this width still fit the `i128` scaled
/// representation used by [`FixPoint`](crate::values::FixPoint).
pub const MAX_FIX_BITS: u32 = 126;

/// Fixed-point precision: total bit width and how many of those bits sit
/// left of the binary point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Precision {
    total_bits: u32,
    integer_bits: u32,
}

impl Precision {
    pub fn new(total_bits: u32, integer_bits: u32) -> Result<Self> {
        if total_bits == 0 || total_bits > MAX_FIX_BITS {
            return Err(Error::type_error(format!(
                "fixed-point width must be between 1 and {MAX_FIX_BITS} bits, got {total_bits}"
            )));
        }
        if integer_bits > total_bits {
            return Err(Error::type_error(format!(
                "fixed-point integer bits ({integer_bits}) exceed total bits ({total_bits})"
            )));
        }
        Ok(Self {
            total_bits,
            integer_bits,
        })
    }

    pub fn total_bits(&self) -> u32 {
        self.total_bits
    }

    pub fn integer_bits(&self) -> u32 {
        self.integer_bits
    }

    pub fn fraction_bits(&self) -> u32 {
        self.total_bits - self.integer_bits
    }

    /// True when every value representable in `other` is representable here.
    pub fn covers(&self, other: &Precision) -> bool {
        self.integer_bits >= other.integer_bits && self.fraction_bits() >= other.fraction_bits()
    }

    /// Smallest precision covering both.
    pub fn join(&self, other: &Precision) -> Precision {
        let integer = self.integer_bits.max(other.integer_bits);
        let fraction = self.fraction_bits().max(other.fraction_bits());
        Precision {
            total_bits: integer + fraction,
            integer_bits: integer,
        }
    }

    /// Precision of a sum or difference: the join plus one carry bit.
    pub fn sum(&self, other: &Precision) -> Result<Precision> {
        let joined = self.join(other);
        Precision::new(joined.total_bits + 1, joined.integer_bits + 1)
    }

    /// Precision of a product: integer and fraction bits add up.
    pub fn product(&self, other: &Precision) -> Result<Precision> {
        Precision::new(
            self.total_bits + other.total_bits,
            self.integer_bits + other.integer_bits,
        )
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.total_bits, self.integer_bits)
    }
}

/// Signature of a function value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionType {
    pub params: Vec<Type>,
    pub ret: Type,
}

/// Static type of an expression.
///
/// The variants mirror [`Value`](crate::values::Value) one level up, plus the
/// abstract members `Unknown` (bottom), `Scalar`, `Fix(None)`, `Object(None)`
/// and `General` (top). See [`lattice`](super::lattice) for the order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Unknown,
    Boolean,
    UnsignedByte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Complex,
    /// `None` is the abstract fixed-point type above every precision.
    Fix(Option<Precision>),
    Scalar,
    String,
    /// `None` is the abstract object type above every named class.
    Object(Option<Arc<str>>),
    General,
    Array(Box<Type>),
    Matrix(Box<Type>),
    Record(BTreeMap<String, Type>),
    Union(BTreeMap<String, Type>),
    Function(Box<FunctionType>),
}

impl Type {
    pub fn array(element: Type) -> Type {
        Type::Array(Box::new(element))
    }

    pub fn matrix(element: Type) -> Type {
        Type::Matrix(Box::new(element))
    }

    pub fn fix(precision: Precision) -> Type {
        Type::Fix(Some(precision))
    }

    pub fn object(class: &str) -> Type {
        Type::Object(Some(Arc::from(class)))
    }

    pub fn function(params: Vec<Type>, ret: Type) -> Type {
        Type::Function(Box::new(FunctionType { params, ret }))
    }

    pub fn record<I, S>(fields: I) -> Type
    where
        I: IntoIterator<Item = (S, Type)>,
        S: Into<String>,
    {
        Type::Record(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn union<I, S>(fields: I) -> Type
    where
        I: IntoIterator<Item = (S, Type)>,
        S: Into<String>,
    {
        Type::Union(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Scalar kinds a single number or boolean can have, abstract `scalar` included.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Type::Boolean
                | Type::UnsignedByte
                | Type::Short
                | Type::Int
                | Type::Long
                | Type::Float
                | Type::Double
                | Type::Complex
                | Type::Fix(_)
                | Type::Scalar
        )
    }

    pub fn is_numeric(&self) -> bool {
        self.is_scalar() && !matches!(self, Type::Boolean)
    }

    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            Type::UnsignedByte | Type::Short | Type::Int | Type::Long
        )
    }

    /// Types with no runtime information: bottom, top, and abstract joins.
    pub fn is_abstract(&self) -> bool {
        matches!(
            self,
            Type::Unknown | Type::General | Type::Scalar | Type::Fix(None) | Type::Object(None)
        )
    }

    /// True when a value can carry exactly this type.
    ///
    /// An empty array is the one place `unknown` survives inside a concrete type.
    pub fn is_concrete(&self) -> bool {
        match self {
            Type::Unknown | Type::General | Type::Scalar | Type::Fix(None) => false,
            Type::Object(None) => false,
            Type::Array(inner) => matches!(**inner, Type::Unknown) || inner.is_concrete(),
            Type::Matrix(inner) => inner.is_concrete(),
            Type::Record(fields) | Type::Union(fields) => fields.values().all(Type::is_concrete),
            Type::Function(f) => f.params.iter().all(|p| !matches!(p, Type::Unknown)),
            _ => true,
        }
    }

    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Type::Array(inner) | Type::Matrix(inner) => Some(inner),
            _ => None,
        }
    }

    /// Element type a matrix actually stores for elements of type `self`.
    ///
    /// Narrow integers widen to `int` and `float` widens to `double`; anything
    /// that is not a scalar cannot live in a matrix.
    pub fn matrix_element(&self) -> Result<Type> {
        match self {
            Type::Boolean | Type::Int | Type::Long | Type::Double | Type::Complex => {
                Ok(self.clone())
            }
            Type::Fix(_) | Type::Scalar | Type::Unknown | Type::General => Ok(self.clone()),
            Type::UnsignedByte | Type::Short => Ok(Type::Int),
            Type::Float => Ok(Type::Double),
            other => Err(Error::type_error(format!(
                "matrix elements must be scalars, found {other}"
            ))),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Unknown => write!(f, "unknown"),
            Type::Boolean => write!(f, "boolean"),
            Type::UnsignedByte => write!(f, "unsignedByte"),
            Type::Short => write!(f, "short"),
            Type::Int => write!(f, "int"),
            Type::Long => write!(f, "long"),
            Type::Float => write!(f, "float"),
            Type::Double => write!(f, "double"),
            Type::Complex => write!(f, "complex"),
            Type::Fix(None) => write!(f, "fixedpoint"),
            Type::Fix(Some(p)) => write!(f, "fixedpoint{p}"),
            Type::Scalar => write!(f, "scalar"),
            Type::String => write!(f, "string"),
            Type::Object(None) => write!(f, "object"),
            Type::Object(Some(class)) => write!(f, "object(\"{class}\")"),
            Type::General => write!(f, "general"),
            Type::Array(inner) => write!(f, "arrayType({inner})"),
            Type::Matrix(inner) => write!(f, "matrixType({inner})"),
            Type::Record(fields) => {
                write!(f, "{{")?;
                for (i, (label, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{label} = {ty}")?;
                }
                write!(f, "}}")
            }
            Type::Union(fields) => {
                write!(f, "{{|")?;
                for (i, (label, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{label} = {ty}")?;
                }
                write!(f, "|}}")
            }
            Type::Function(func) => {
                write!(f, "function(")?;
                for (i, p) in func.params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "a{i}:{p}")?;
                }
                write!(f, ") {}", func.ret)
            }
        }
    }
}
