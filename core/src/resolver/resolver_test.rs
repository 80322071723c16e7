use super::*;
use crate::conversion::Native;
use crate::errors::NativeError;
use crate::registry::OperationTable;
use crate::test_utils::init_test_logging;
use pretty_assertions::assert_eq;

fn ints(items: &[i32]) -> Value {
    Value::array(items.iter().map(|v| Value::Int(*v)).collect()).unwrap()
}

fn pick_long(_args: &[Native]) -> Result<Native, NativeError> {
    Ok(Native::I64(64))
}

fn pick_double(_args: &[Native]) -> Result<Native, NativeError> {
    Ok(Native::F64(0.5))
}

fn always_fails(_args: &[Native]) -> Result<Native, NativeError> {
    Err(NativeError::new("boom"))
}

fn host_provider() -> Provider {
    let mut table = OperationTable::new();
    table
        .add(NativeOp::new("pick", vec![NativeType::I64], NativeType::I64, pick_long))
        .add(NativeOp::new("pick", vec![NativeType::F64], NativeType::F64, pick_double))
        .add(NativeOp::new("explode", vec![NativeType::I32], NativeType::I32, always_fails));
    Provider::new("host", table)
}

#[test]
fn test_resolution_is_memoized() {
    init_test_logging();
    let resolver = Resolver::new(Registry::standard());
    let first = resolver.resolve("sin", OperationKind::Function, &[Type::Double]);
    let second = resolver.resolve("sin", OperationKind::Function, &[Type::Double]);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(resolver.scan_count(), 1);
    assert_eq!(resolver.cache_len(), 1);
}

#[test]
fn test_container_signatures_are_memoized() {
    let resolver = Resolver::new(Registry::standard());
    let signature = [Type::array(Type::Double), Type::matrix(Type::Int)];
    let first = resolver.resolve("nope", OperationKind::Function, &signature);
    let scans = resolver.scan_count();
    let second = resolver.resolve("nope", OperationKind::Function, &signature);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(resolver.scan_count(), scans);

    let sqrt = resolver.resolve("sqrt", OperationKind::Function, &[Type::array(Type::Int)]);
    assert_eq!(sqrt.return_type(), Ok(Type::array(Type::Double)));
    let scans = resolver.scan_count();
    let again = resolver.resolve("sqrt", OperationKind::Function, &[Type::array(Type::Int)]);
    assert!(Arc::ptr_eq(&sqrt, &again));
    assert_eq!(resolver.scan_count(), scans);
}

#[test]
fn test_invalid_resolutions_are_cached() {
    let resolver = Resolver::new(Registry::standard());
    let missing = resolver.resolve("nope", OperationKind::Function, &[Type::Int]);
    assert!(!missing.is_valid());
    assert_eq!(
        missing.return_type(),
        Err(Error::NoMatchingOperation {
            name: "nope".to_string(),
            arg_types: vec![Type::Int],
        })
    );
    resolver.resolve("nope", OperationKind::Function, &[Type::Int]);
    assert_eq!(resolver.scan_count(), 1);
    assert_eq!(
        missing.invoke(&[Value::Int(1)]).unwrap_err(),
        missing.return_type().unwrap_err()
    );
}

#[test]
fn test_direct_method_on_scalar_surface() {
    let resolver = Resolver::new(Registry::standard());
    let add = resolver.resolve("add", OperationKind::Method, &[Type::Int, Type::Int]);
    assert!(matches!(add.binding(), Binding::Direct { .. }));
    assert_eq!(add.return_type(), Ok(Type::Int));
    assert_eq!(add.invoke(&[Value::Int(1), Value::Int(2)]), Ok(Value::Int(3)));
}

#[test]
fn test_overload_prefers_narrowest_promotion() {
    let resolver = Resolver::new(Registry::standard());
    let abs = resolver.resolve("abs", OperationKind::Function, &[Type::Short]);
    let Binding::Direct { op, conversions } = abs.binding() else {
        panic!("expected a direct binding, got {:?}", abs.binding());
    };
    assert_eq!(op.signature(), "abs(i32)");
    assert_eq!(
        conversions,
        &vec![ConversionRule::PromoteThenConvert {
            target: Type::Int,
            inner: Box::new(ConversionRule::ScalarToNative),
        }]
    );
    assert_eq!(abs.invoke(&[Value::Short(-4)]), Ok(Value::Int(4)));
}

#[test]
fn test_ambiguous_overloads() {
    let resolver = Resolver::new(Registry::empty());
    resolver.register_provider(host_provider());

    let resolved = resolver.resolve("pick", OperationKind::Function, &[Type::Short]);
    let Err(Error::AmbiguousOperation { candidates, .. }) = resolved.return_type() else {
        panic!("expected ambiguity, got {:?}", resolved.return_type());
    };
    assert_eq!(candidates, vec!["pick(i64)", "pick(f64)"]);

    let long = resolver.resolve("pick", OperationKind::Function, &[Type::Long]);
    assert_eq!(long.invoke(&[Value::Long(1)]), Ok(Value::Long(64)));
}

#[test]
fn test_native_failure_is_wrapped() {
    let resolver = Resolver::new(Registry::empty());
    resolver.register_provider(host_provider());
    let explode = resolver.resolve("explode", OperationKind::Function, &[Type::Int]);
    assert_eq!(
        explode.invoke(&[Value::Int(1)]),
        Err(Error::NativeInvocationFailure {
            name: "explode".to_string(),
            source: NativeError::new("boom"),
        })
    );
}

#[test]
fn test_registration_clears_cache() {
    let resolver = Resolver::new(Registry::empty());
    let before = resolver.resolve("pick", OperationKind::Function, &[Type::Long]);
    assert!(!before.is_valid());
    assert_eq!(resolver.cache_len(), 1);

    resolver.register_provider(host_provider());
    assert_eq!(resolver.cache_len(), 0);
    let after = resolver.resolve("pick", OperationKind::Function, &[Type::Long]);
    assert!(after.is_valid());
}

#[test]
fn test_method_on_native_surface() {
    let resolver = Resolver::new(Registry::standard());
    let length = resolver.resolve("length", OperationKind::Method, &[Type::String]);
    assert!(matches!(
        length.binding(),
        Binding::BaseConverted {
            base: NativeType::Str,
            ..
        }
    ));
    assert_eq!(length.invoke(&[Value::string("abc")]), Ok(Value::Int(3)));
}

#[test]
fn test_array_broadcast() {
    let resolver = Resolver::new(Registry::standard());
    let ty = Type::array(Type::Int);
    let add = resolver.resolve("add", OperationKind::Method, &[ty.clone(), ty.clone()]);
    assert!(matches!(add.binding(), Binding::ArrayMapped { .. }));
    assert_eq!(add.return_type(), Ok(ty));
    assert_eq!(
        add.invoke(&[ints(&[1, 2, 3]), ints(&[10, 20, 30])]),
        Ok(ints(&[11, 22, 33]))
    );
    // The element-level resolution is cached too.
    assert_eq!(resolver.scan_count(), 2);
}

#[test]
fn test_array_broadcast_with_scalar_argument() {
    let resolver = Resolver::new(Registry::standard());
    let add = resolver.resolve("add", OperationKind::Method, &[Type::array(Type::Int), Type::Int]);
    assert_eq!(add.invoke(&[ints(&[1, 2]), Value::Int(5)]), Ok(ints(&[6, 7])));
}

#[test]
fn test_broadcast_length_mismatch() {
    let resolver = Resolver::new(Registry::standard());
    let ty = Type::array(Type::Int);
    let add = resolver.resolve("add", OperationKind::Method, &[ty.clone(), ty]);
    assert!(matches!(
        add.invoke(&[ints(&[1, 2, 3]), ints(&[1, 2])]),
        Err(Error::IrregularShape(_))
    ));
}

#[test]
fn test_function_maps_over_matrix() {
    let resolver = Resolver::new(Registry::standard());
    let abs = resolver.resolve("abs", OperationKind::Function, &[Type::matrix(Type::Int)]);
    assert!(matches!(abs.binding(), Binding::MatrixMapped { .. }));
    assert_eq!(abs.return_type(), Ok(Type::matrix(Type::Int)));

    let m = Value::matrix_from_flat(2, 1, vec![Value::Int(-1), Value::Int(2)]).unwrap();
    let expected = Value::matrix_from_flat(2, 1, vec![Value::Int(1), Value::Int(2)]).unwrap();
    assert_eq!(abs.invoke(&[m]), Ok(expected));
}

#[test]
fn test_return_type_hook() {
    let resolver = Resolver::new(Registry::standard());
    let sum = resolver.resolve("sum", OperationKind::Function, &[Type::array(Type::Int)]);
    assert_eq!(sum.return_type(), Ok(Type::Int));
    assert_eq!(sum.invoke(&[ints(&[1, 2, 3])]), Ok(Value::Int(6)));
}

#[test]
fn test_result_conforms_to_declared_type() {
    let resolver = Resolver::new(Registry::standard());
    let sin = resolver.resolve("sin", OperationKind::Function, &[Type::Int]);
    assert_eq!(sin.return_type(), Ok(Type::Double));
    assert_eq!(sin.invoke(&[Value::Int(0)]), Ok(Value::Double(0.0)));
}

#[test]
fn test_resolved_operation_identity() {
    let resolver = Resolver::new(Registry::standard());
    let a = resolver.resolve("sin", OperationKind::Function, &[Type::Double]);
    let b = Resolver::new(Registry::standard()).resolve("sin", OperationKind::Function, &[Type::Double]);
    assert_eq!(*a, *b);
    assert_ne!(
        *a,
        *resolver.resolve("sin", OperationKind::Method, &[Type::Double])
    );
}

#[test]
fn test_global_resolver() {
    let resolved = Resolver::global().resolve("cos", OperationKind::Function, &[Type::Double]);
    assert_eq!(resolved.invoke(&[Value::Double(0.0)]), Ok(Value::Double(1.0)));
}
