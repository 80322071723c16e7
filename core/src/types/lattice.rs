//! The type lattice.
//!
//! `unknown` is the bottom and `general` the top. Between them the scalar
//! kinds form a small fixed partial order:
//!
//! ```text
//!                 general
//!                /   |   \
//!          string  object  containers, records, unions, functions
//!             |      |
//!          scalar  object("Name")
//!       /   |    |     \
//!  boolean long complex fixedpoint
//!           |      |        |
//!           |    double   fixedpoint(p)
//!           |   /     \
//!           int      float
//!             \      /
//!              short
//!                |
//!           unsignedByte
//! ```
//!
//! Arrays and matrices compare only through their element types. Records use
//! width subtyping (more labels is lower), unions the dual, and functions are
//! contravariant in their parameters and covariant in their result.

use std::cmp::Ordering;

use super::Type;

/// Outcome of comparing two types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Lower,
    Equal,
    Higher,
    Incomparable,
}

impl Relation {
    pub fn reverse(self) -> Relation {
        match self {
            Relation::Lower => Relation::Higher,
            Relation::Higher => Relation::Lower,
            other => other,
        }
    }

    /// Ordering view, `None` for incomparable pairs.
    pub fn as_ordering(self) -> Option<Ordering> {
        match self {
            Relation::Lower => Some(Ordering::Less),
            Relation::Equal => Some(Ordering::Equal),
            Relation::Higher => Some(Ordering::Greater),
            Relation::Incomparable => None,
        }
    }
}

// Bit positions for the scalar part of the lattice.
const BOOLEAN: u16 = 1 << 0;
const UNSIGNED_BYTE: u16 = 1 << 1;
const SHORT: u16 = 1 << 2;
const INT: u16 = 1 << 3;
const LONG: u16 = 1 << 4;
const FLOAT: u16 = 1 << 5;
const DOUBLE: u16 = 1 << 6;
const COMPLEX: u16 = 1 << 7;
const FIX: u16 = 1 << 8;
const SCALAR: u16 = 1 << 9;
const STRING: u16 = 1 << 10;

/// Bit for each scalar-like type, `None` for everything else.
fn base_bit(ty: &Type) -> Option<u16> {
    Some(match ty {
        Type::Boolean => BOOLEAN,
        Type::UnsignedByte => UNSIGNED_BYTE,
        Type::Short => SHORT,
        Type::Int => INT,
        Type::Long => LONG,
        Type::Float => FLOAT,
        Type::Double => DOUBLE,
        Type::Complex => COMPLEX,
        Type::Fix(_) => FIX,
        Type::Scalar => SCALAR,
        Type::String => STRING,
        _ => return None,
    })
}

/// Upward closure of a scalar-like type, itself included.
fn ancestors(bit: u16) -> u16 {
    let above_scalar = SCALAR | STRING;
    let above_complex = COMPLEX | above_scalar;
    let above_double = DOUBLE | above_complex;
    match bit {
        BOOLEAN => BOOLEAN | above_scalar,
        UNSIGNED_BYTE => UNSIGNED_BYTE | ancestors(SHORT),
        SHORT => SHORT | ancestors(INT) | ancestors(FLOAT),
        INT => INT | LONG | above_double,
        LONG => LONG | above_scalar,
        FLOAT => FLOAT | above_double,
        DOUBLE => above_double,
        COMPLEX => above_complex,
        FIX => FIX | above_scalar,
        SCALAR => above_scalar,
        _ => STRING,
    }
}

fn base_type(bit: u16) -> Type {
    match bit {
        BOOLEAN => Type::Boolean,
        UNSIGNED_BYTE => Type::UnsignedByte,
        SHORT => Type::Short,
        INT => Type::Int,
        LONG => Type::Long,
        FLOAT => Type::Float,
        DOUBLE => Type::Double,
        COMPLEX => Type::Complex,
        FIX => Type::Fix(None),
        SCALAR => Type::Scalar,
        _ => Type::String,
    }
}

/// `a <= b` in the lattice.
pub fn is_lower_or_equal(a: &Type, b: &Type) -> bool {
    if a == b {
        return true;
    }
    match (a, b) {
        (Type::Unknown, _) | (_, Type::General) => true,
        (Type::General, _) | (_, Type::Unknown) => false,

        (Type::Array(x), Type::Array(y)) | (Type::Matrix(x), Type::Matrix(y)) => {
            is_lower_or_equal(x, y)
        }

        // A record with more labels is lower; every label of the higher one
        // must be present with a lower-or-equal type.
        (Type::Record(low), Type::Record(high)) => high
            .iter()
            .all(|(label, th)| low.get(label).is_some_and(|tl| is_lower_or_equal(tl, th))),
        (Type::Union(low), Type::Union(high)) => low
            .iter()
            .all(|(label, tl)| high.get(label).is_some_and(|th| is_lower_or_equal(tl, th))),

        (Type::Function(f), Type::Function(g)) => {
            f.params.len() == g.params.len()
                && f
                    .params
                    .iter()
                    .zip(&g.params)
                    .all(|(p, q)| is_lower_or_equal(q, p))
                && is_lower_or_equal(&f.ret, &g.ret)
        }

        (Type::Object(Some(_)), Type::Object(None)) => true,

        (Type::Fix(Some(p)), Type::Fix(Some(q))) => q.covers(p),
        (Type::Fix(Some(_)), Type::Fix(None)) => true,
        (Type::Fix(None), Type::Fix(Some(_))) => false,

        _ => match (base_bit(a), base_bit(b)) {
            (Some(x), Some(y)) => ancestors(x) & y != 0,
            _ => false,
        },
    }
}

/// Compare two types in the lattice.
pub fn compare(a: &Type, b: &Type) -> Relation {
    match (is_lower_or_equal(a, b), is_lower_or_equal(b, a)) {
        (true, true) => Relation::Equal,
        (true, false) => Relation::Lower,
        (false, true) => Relation::Higher,
        (false, false) => Relation::Incomparable,
    }
}

/// Least upper bound of two types; `general` when they are unrelated.
pub fn least_upper_bound(a: &Type, b: &Type) -> Type {
    if is_lower_or_equal(a, b) {
        return b.clone();
    }
    if is_lower_or_equal(b, a) {
        return a.clone();
    }
    match (a, b) {
        (Type::Array(x), Type::Array(y)) => Type::array(least_upper_bound(x, y)),
        (Type::Matrix(x), Type::Matrix(y)) => Type::matrix(least_upper_bound(x, y)),
        (Type::Record(x), Type::Record(y)) => Type::Record(
            x.iter()
                .filter_map(|(label, tx)| {
                    y.get(label)
                        .map(|ty| (label.clone(), least_upper_bound(tx, ty)))
                })
                .collect(),
        ),
        (Type::Union(x), Type::Union(y)) => {
            let mut fields = x.clone();
            for (label, ty) in y {
                let joined = match fields.get(label) {
                    Some(existing) => least_upper_bound(existing, ty),
                    None => ty.clone(),
                };
                fields.insert(label.clone(), joined);
            }
            Type::Union(fields)
        }
        (Type::Fix(Some(p)), Type::Fix(Some(q))) => Type::fix(p.join(q)),
        (Type::Object(_), Type::Object(_)) => Type::Object(None),
        _ => match (base_bit(a), base_bit(b)) {
            (Some(x), Some(y)) => {
                let common = ancestors(x) & ancestors(y);
                // The least common ancestor is the one whose own upward
                // closure is exactly the common set.
                (0..11)
                    .map(|shift| 1u16 << shift)
                    .find(|bit| common & bit != 0 && ancestors(*bit) == common)
                    .map(base_type)
                    .unwrap_or(Type::General)
            }
            _ => Type::General,
        },
    }
}

/// Join of every type in `types`; `unknown` for an empty sequence.
pub fn least_upper_bound_of<'a, I>(types: I) -> Type
where
    I: IntoIterator<Item = &'a Type>,
{
    types
        .into_iter()
        .fold(Type::Unknown, |acc, ty| least_upper_bound(&acc, ty))
}

#[cfg(test)]
#[path = "lattice_test.rs"]
mod lattice_test;
