//! Integration tests for the public engine API.

use std::sync::Arc;
use std::thread;

use pretty_assertions::assert_eq;
use tessera_core::api::{Engine, EngineOptions};
use tessera_core::conversion::{Native, NativeType};
use tessera_core::registry::{NativeOp, OperationTable, Provider, Registry};
use tessera_core::resolver::{OperationKind, Resolver};
use tessera_core::scope::{Constants, EmptyScope, MapScope};
use tessera_core::types::Type;
use tessera_core::values::Value;
use tessera_core::{Error, NativeError};

fn isolated_engine() -> Engine {
    Engine::with_parts(
        EngineOptions::default(),
        Arc::new(Resolver::new(Registry::standard())),
        Arc::new(Constants::with_defaults()),
    )
}

fn celsius(args: &[Native]) -> Result<Native, NativeError> {
    Ok(Native::F64((args[0].as_f64()? - 32.0) * 5.0 / 9.0))
}

#[test]
fn test_repeated_evaluation_is_deterministic() {
    let engine = isolated_engine();
    let ast = engine.parse("sqrt(x * x + 16) + [1, 2](1)").unwrap();
    let scope: MapScope = [("x", Value::Int(3))].into_iter().collect();
    let first = engine.evaluate(&ast, &scope).unwrap();
    for _ in 0..5 {
        assert_eq!(engine.evaluate(&ast, &scope).unwrap(), first);
    }
    assert_eq!(first, Value::Double(7.0));
}

#[test]
fn test_shared_ast_across_threads() {
    let engine = isolated_engine();
    let ast = engine.parse("[1, 2, 3] * n + abs(-n)").unwrap();
    thread::scope(|s| {
        for n in 0..4 {
            let (engine, ast) = (&engine, &ast);
            s.spawn(move || {
                let scope: MapScope = [("n", Value::Int(n))].into_iter().collect();
                let expected = Value::array(
                    [1, 2, 3].iter().map(|v| Value::Int(v * n + n)).collect(),
                )
                .unwrap();
                assert_eq!(engine.evaluate(ast, &scope), Ok(expected));
            });
        }
    });
}

#[test]
fn test_host_provider_and_broadcast() {
    let engine = isolated_engine();
    let mut table = OperationTable::new();
    table.add(NativeOp::new(
        "celsius",
        vec![NativeType::F64],
        NativeType::F64,
        celsius,
    ));
    engine.resolver().register_provider(Provider::new("host", table));

    let ast = engine.parse("celsius([32, 212])").unwrap();
    assert_eq!(
        engine.infer(&ast, &EmptyScope),
        Ok(Type::array(Type::Double))
    );
    assert_eq!(
        engine.evaluate(&ast, &EmptyScope),
        Ok(Value::array(vec![Value::Double(0.0), Value::Double(100.0)]).unwrap())
    );
    assert!(
        engine
            .resolver()
            .resolve("celsius", OperationKind::Function, &[Type::Double])
            .is_valid()
    );
}

#[test]
fn test_constants_are_editable() {
    let engine = isolated_engine();
    let ast = engine.parse("rate * 2").unwrap();
    assert_eq!(
        engine.evaluate(&ast, &EmptyScope),
        Err(Error::UndefinedIdentifier("rate".to_string()))
    );
    engine.constants().add("rate", Value::Double(1.5));
    assert_eq!(engine.evaluate(&ast, &EmptyScope), Ok(Value::Double(3.0)));
    engine.constants().remove("rate");
    assert!(engine.evaluate(&ast, &EmptyScope).is_err());
}

#[test]
fn test_global_and_engine_agree() {
    let source = "{x = 1, y = 2.5}.y * 2";
    let ast = tessera_core::parse(source).unwrap();
    let global = tessera_core::evaluate(&ast, &EmptyScope).unwrap();
    let engine = isolated_engine();
    let local = engine.evaluate(&engine.parse(source).unwrap(), &EmptyScope).unwrap();
    assert_eq!(global, local);
    assert_eq!(tessera_core::infer(&ast, &EmptyScope), Ok(Type::Double));
}
