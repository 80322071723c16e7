use super::*;
use crate::types::Precision;
use pretty_assertions::assert_eq;

fn ints(values: &[i32]) -> Value {
    Value::array(values.iter().map(|v| Value::Int(*v)).collect()).unwrap()
}

fn int_matrix(rows: usize, cols: usize, values: &[i32]) -> Value {
    Value::matrix_from_flat(rows, cols, values.iter().map(|v| Value::Int(*v)).collect()).unwrap()
}

#[test]
fn test_scalar_arithmetic_converts_to_join() {
    assert_eq!(
        arithmetic(ArithmeticOp::Add, &Value::Int(1), &Value::Double(0.5)).unwrap(),
        Value::Double(1.5)
    );
    assert_eq!(
        arithmetic(ArithmeticOp::Multiply, &Value::Short(3), &Value::UnsignedByte(4)).unwrap(),
        Value::Short(12)
    );
    assert_eq!(
        arithmetic(ArithmeticOp::Add, &Value::string("n="), &Value::Int(3)).unwrap(),
        Value::string("n=3")
    );
}

#[test]
fn test_boolean_arithmetic_is_logic() {
    let t = Value::Boolean(true);
    let f = Value::Boolean(false);
    assert_eq!(arithmetic(ArithmeticOp::Add, &t, &f).unwrap(), t);
    assert_eq!(arithmetic(ArithmeticOp::Multiply, &t, &f).unwrap(), f);
    assert!(arithmetic(ArithmeticOp::Subtract, &t, &f).is_err());
}

#[test]
fn test_integer_division() {
    assert_eq!(
        arithmetic(ArithmeticOp::Divide, &Value::Int(7), &Value::Int(2)).unwrap(),
        Value::Int(3)
    );
    assert_eq!(
        arithmetic(ArithmeticOp::Modulo, &Value::Int(7), &Value::Int(2)).unwrap(),
        Value::Int(1)
    );
    assert_eq!(
        arithmetic(ArithmeticOp::Divide, &Value::Int(7), &Value::Int(0)),
        Err(Error::DivisionByZero)
    );
    assert_eq!(
        arithmetic(ArithmeticOp::Modulo, &Value::Long(7), &Value::Long(0)),
        Err(Error::DivisionByZero)
    );
}

#[test]
fn test_integer_overflow_wraps() {
    assert_eq!(
        arithmetic(ArithmeticOp::Add, &Value::Int(i32::MAX), &Value::Int(1)).unwrap(),
        Value::Int(i32::MIN)
    );
}

#[test]
fn test_array_broadcasting() {
    assert_eq!(
        arithmetic(ArithmeticOp::Add, &ints(&[1, 2, 3]), &ints(&[10, 20, 30])).unwrap(),
        ints(&[11, 22, 33])
    );
    assert_eq!(
        arithmetic(ArithmeticOp::Multiply, &ints(&[1, 2, 3]), &Value::Int(2)).unwrap(),
        ints(&[2, 4, 6])
    );
    let halves = arithmetic(ArithmeticOp::Divide, &ints(&[1, 2]), &Value::Double(2.0)).unwrap();
    assert_eq!(halves.to_string(), "[0.5, 1.0]");
}

#[test]
fn test_irregular_arrays() {
    assert!(matches!(
        arithmetic(ArithmeticOp::Add, &ints(&[1, 2, 3]), &ints(&[1, 2])),
        Err(Error::IrregularShape(_))
    ));
}

#[test]
fn test_matrix_product() {
    let a = int_matrix(2, 2, &[1, 2, 3, 4]);
    let b = int_matrix(2, 1, &[5, 6]);
    let product = arithmetic(ArithmeticOp::Multiply, &a, &b).unwrap();
    assert_eq!(product, int_matrix(2, 1, &[17, 39]));
    assert!(matches!(
        arithmetic(ArithmeticOp::Multiply, &b, &b),
        Err(Error::IrregularShape(_))
    ));
}

#[test]
fn test_matrix_elementwise() {
    let a = int_matrix(2, 2, &[1, 2, 3, 4]);
    assert_eq!(
        arithmetic(ArithmeticOp::Add, &a, &a).unwrap(),
        int_matrix(2, 2, &[2, 4, 6, 8])
    );
    assert_eq!(
        arithmetic(ArithmeticOp::Subtract, &a, &Value::Int(1)).unwrap(),
        int_matrix(2, 2, &[0, 1, 2, 3])
    );
}

#[test]
fn test_record_arithmetic_keeps_common_fields() {
    let a = Value::record([("x", Value::Int(1)), ("y", Value::Int(2))]);
    let b = Value::record([("x", Value::Int(10)), ("z", Value::Int(3))]);
    assert_eq!(
        arithmetic(ArithmeticOp::Add, &a, &b).unwrap(),
        Value::record([("x", Value::Int(11))])
    );
}

#[test]
fn test_fixed_point_arithmetic() {
    let p = Precision::new(8, 4).unwrap();
    let a = Value::Fix(FixPoint::from_f64(1.5, p));
    let sum = arithmetic(ArithmeticOp::Add, &a, &a).unwrap();
    assert_eq!(sum.to_string(), "fix(3.0, 9, 5)");
    assert_eq!(
        sum.ty(),
        type_ops::arithmetic(ArithmeticOp::Add, &a.ty(), &a.ty()).unwrap()
    );
}

#[test]
fn test_power() {
    assert_eq!(power(&Value::Int(2), &Value::Int(10)).unwrap(), Value::Int(1024));
    assert_eq!(power(&Value::Double(2.0), &Value::Int(-1)).unwrap(), Value::Double(0.5));
    assert_eq!(power(&Value::Int(2), &Value::Int(-1)).unwrap(), Value::Int(0));
    assert!(power(&Value::Int(2), &Value::Double(2.0)).is_err());

    let m = int_matrix(2, 2, &[1, 1, 1, 0]);
    assert_eq!(
        power(&m, &Value::Int(5)).unwrap(),
        int_matrix(2, 2, &[8, 5, 5, 3])
    );
    assert_eq!(
        power(&m, &Value::Int(0)).unwrap(),
        int_matrix(2, 2, &[1, 0, 0, 1])
    );
}

#[test]
fn test_shifts() {
    assert_eq!(
        shift(ShiftOp::Left, &Value::Int(1), &Value::Int(4)).unwrap(),
        Value::Int(16)
    );
    assert_eq!(
        shift(ShiftOp::Right, &Value::Int(-16), &Value::Int(2)).unwrap(),
        Value::Int(-4)
    );
    assert_eq!(
        shift(ShiftOp::UnsignedRight, &Value::Int(-1), &Value::Int(28)).unwrap(),
        Value::Int(15)
    );
    assert!(shift(ShiftOp::Left, &Value::Double(1.0), &Value::Int(1)).is_err());
}

#[test]
fn test_bitwise() {
    assert_eq!(
        bitwise(BitwiseOp::And, &Value::Int(12), &Value::Short(10)).unwrap(),
        Value::Int(8)
    );
    assert_eq!(
        bitwise(BitwiseOp::Xor, &Value::Boolean(true), &Value::Boolean(true)).unwrap(),
        Value::Boolean(false)
    );
}

#[test]
fn test_unary() {
    assert_eq!(unary(UnaryOp::Negate, &ints(&[1, -2])).unwrap(), ints(&[-1, 2]));
    assert_eq!(
        unary(UnaryOp::Not, &Value::Boolean(true)).unwrap(),
        Value::Boolean(false)
    );
    assert_eq!(unary(UnaryOp::BitwiseNot, &Value::Int(0)).unwrap(), Value::Int(-1));
    assert!(unary(UnaryOp::Not, &Value::Int(0)).is_err());
}

#[test]
fn test_relational() {
    assert_eq!(
        relational(RelationalOp::Less, &Value::Int(1), &Value::Double(1.5)).unwrap(),
        Value::Boolean(true)
    );
    assert_eq!(
        relational(RelationalOp::Equal, &Value::Int(2), &Value::Double(2.0)).unwrap(),
        Value::Boolean(true)
    );
    assert_eq!(
        relational(RelationalOp::NotEqual, &ints(&[1, 2]), &ints(&[1, 2])).unwrap(),
        Value::Boolean(false)
    );
    assert_eq!(
        relational(RelationalOp::GreaterOrEqual, &Value::Double(f64::NAN), &Value::Double(0.0))
            .unwrap(),
        Value::Boolean(false)
    );
    assert!(relational(RelationalOp::Less, &Value::string("a"), &Value::string("b")).is_err());
}
