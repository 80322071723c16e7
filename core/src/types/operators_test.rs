use super::*;
use crate::types::Precision;
use pretty_assertions::assert_eq;

#[test]
fn test_scalar_arithmetic_widens_to_join() {
    assert_eq!(
        arithmetic(ArithmeticOp::Add, &Type::Int, &Type::Int).unwrap(),
        Type::Int
    );
    assert_eq!(
        arithmetic(ArithmeticOp::Multiply, &Type::Short, &Type::Float).unwrap(),
        Type::Float
    );
    assert_eq!(
        arithmetic(ArithmeticOp::Add, &Type::Int, &Type::Float).unwrap(),
        Type::Double
    );
    assert_eq!(
        arithmetic(ArithmeticOp::Add, &Type::Int, &Type::String).unwrap(),
        Type::String
    );
}

#[test]
fn test_incompatible_scalars_are_type_errors() {
    assert!(matches!(
        arithmetic(ArithmeticOp::Add, &Type::Long, &Type::Double),
        Err(Error::TypeError(_))
    ));
    assert!(matches!(
        arithmetic(ArithmeticOp::Subtract, &Type::String, &Type::String),
        Err(Error::TypeError(_))
    ));
    assert!(matches!(
        arithmetic(ArithmeticOp::Modulo, &Type::Complex, &Type::Complex),
        Err(Error::TypeError(_))
    ));
}

#[test]
fn test_unknown_is_identity_and_general_absorbs() {
    assert_eq!(
        arithmetic(ArithmeticOp::Add, &Type::Unknown, &Type::Double).unwrap(),
        Type::Double
    );
    assert_eq!(
        arithmetic(ArithmeticOp::Add, &Type::Int, &Type::General).unwrap(),
        Type::General
    );
}

#[test]
fn test_array_broadcasting_types() {
    let ints = Type::array(Type::Int);
    assert_eq!(
        arithmetic(ArithmeticOp::Add, &ints, &ints).unwrap(),
        Type::array(Type::Int)
    );
    assert_eq!(
        arithmetic(ArithmeticOp::Multiply, &ints, &Type::Double).unwrap(),
        Type::array(Type::Double)
    );
    assert_eq!(
        arithmetic(ArithmeticOp::Add, &Type::Double, &ints).unwrap(),
        Type::array(Type::Double)
    );
}

#[test]
fn test_matrix_types_are_normalized() {
    let shorts = Type::matrix(Type::Int);
    assert_eq!(
        arithmetic(ArithmeticOp::Add, &shorts, &Type::Short).unwrap(),
        Type::matrix(Type::Int)
    );
    assert_eq!(
        arithmetic(ArithmeticOp::Multiply, &shorts, &Type::Float).unwrap(),
        Type::matrix(Type::Double)
    );
}

#[test]
fn test_fixed_point_precision_growth() {
    let p = Type::fix(Precision::new(8, 4).unwrap());
    let q = Type::fix(Precision::new(6, 2).unwrap());
    assert_eq!(
        arithmetic(ArithmeticOp::Add, &p, &q).unwrap(),
        Type::fix(Precision::new(9, 5).unwrap())
    );
    assert_eq!(
        arithmetic(ArithmeticOp::Multiply, &p, &q).unwrap(),
        Type::fix(Precision::new(14, 6).unwrap())
    );
}

#[test]
fn test_record_arithmetic_keeps_common_labels() {
    let a = Type::record([("x", Type::Int), ("y", Type::Int)]);
    let b = Type::record([("x", Type::Double), ("z", Type::Int)]);
    assert_eq!(
        arithmetic(ArithmeticOp::Add, &a, &b).unwrap(),
        Type::record([("x", Type::Double)])
    );
}

#[test]
fn test_power_requires_int_exponent() {
    assert_eq!(power(&Type::Double, &Type::Int).unwrap(), Type::Double);
    assert_eq!(power(&Type::Int, &Type::Short).unwrap(), Type::Int);
    assert!(power(&Type::Int, &Type::Double).is_err());
    assert!(power(&Type::String, &Type::Int).is_err());
}

#[test]
fn test_shift_and_bitwise() {
    assert_eq!(shift(ShiftOp::Left, &Type::Long, &Type::Int).unwrap(), Type::Long);
    assert!(shift(ShiftOp::Right, &Type::Double, &Type::Int).is_err());
    assert_eq!(
        bitwise(BitwiseOp::And, &Type::Short, &Type::Int).unwrap(),
        Type::Int
    );
    assert_eq!(
        bitwise(BitwiseOp::Xor, &Type::Boolean, &Type::Boolean).unwrap(),
        Type::Boolean
    );
    assert!(bitwise(BitwiseOp::Or, &Type::Boolean, &Type::Int).is_err());
}

#[test]
fn test_unary() {
    assert_eq!(unary(UnaryOp::Negate, &Type::Int).unwrap(), Type::Int);
    assert_eq!(
        unary(UnaryOp::Negate, &Type::array(Type::Double)).unwrap(),
        Type::array(Type::Double)
    );
    assert!(unary(UnaryOp::Not, &Type::Int).is_err());
    assert_eq!(unary(UnaryOp::BitwiseNot, &Type::Long).unwrap(), Type::Long);
}

#[test]
fn test_relational_needs_ordering() {
    assert_eq!(
        relational(RelationalOp::Less, &Type::Int, &Type::Double).unwrap(),
        Type::Boolean
    );
    assert!(relational(RelationalOp::Less, &Type::Complex, &Type::Complex).is_err());
    assert!(relational(RelationalOp::Greater, &Type::Long, &Type::Double).is_err());
    assert_eq!(
        relational(RelationalOp::Equal, &Type::String, &Type::Int).unwrap(),
        Type::Boolean
    );
}
