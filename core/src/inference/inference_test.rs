use super::*;
use crate::api::{Engine, EngineOptions, ExecutionOptions};
use crate::scope::{EmptyScope, MapScope};
use crate::types::Precision;
use crate::values::Value;
use pretty_assertions::assert_eq;

fn infer_str(source: &str) -> Result<Type> {
    infer_with(source, &EmptyScope)
}

fn infer_with(source: &str, scope: &dyn Scope) -> Result<Type> {
    let ast = parser::parse(source).unwrap_or_else(|e| panic!("failed to parse {source}: {e}"));
    infer(&ast, scope)
}

fn assert_type_error(result: Result<Type>) {
    assert!(matches!(result, Err(Error::TypeError(_))), "{result:?}");
}

#[test]
fn test_literal_types() {
    assert_eq!(infer_str("42"), Ok(Type::Int));
    assert_eq!(infer_str("42L"), Ok(Type::Long));
    assert_eq!(infer_str("2.5"), Ok(Type::Double));
    assert_eq!(infer_str("2.5f"), Ok(Type::Float));
    assert_eq!(infer_str("3i"), Ok(Type::Complex));
    assert_eq!(infer_str("\"text\""), Ok(Type::String));
    assert_eq!(infer_str("false"), Ok(Type::Boolean));
}

#[test]
fn test_operators() {
    assert_eq!(infer_str("1 + 2 * 3"), Ok(Type::Int));
    assert_eq!(infer_str("1 + 2.5"), Ok(Type::Double));
    assert_eq!(infer_str("1 < 2"), Ok(Type::Boolean));
    assert_eq!(infer_str("true && false"), Ok(Type::Boolean));
    assert_eq!(infer_str("-1"), Ok(Type::Int));
    assert_eq!(
        infer_str("[1, 2, 3] + [10, 20, 30]"),
        Ok(Type::array(Type::Int))
    );
    assert_type_error(infer_str("1 && true"));
    assert_eq!(infer_str("1 + \"a\""), Ok(Type::String));
    assert_type_error(infer_str("\"a\" - \"b\""));
}

#[test]
fn test_functional_if_takes_join_of_branches() {
    let scope: MapScope = [("x", Value::Int(-5))].into_iter().collect();
    assert_eq!(infer_with("(x > 0) ? 1 : -1", &scope), Ok(Type::Int));
    assert_eq!(infer_with("(x > 0) ? 1 : 2.5", &scope), Ok(Type::Double));
    assert_type_error(infer_str("1 ? 2 : 3"));
}

#[test]
fn test_identifiers() {
    let scope: MapScope = [("n", Value::Long(3))].into_iter().collect();
    assert_eq!(infer_with("n * 2", &scope), Ok(Type::Long));
    assert_eq!(infer_str("pi"), Ok(Type::Double));
    assert_eq!(
        infer_str("y + 1"),
        Err(Error::UndefinedIdentifier("y".to_string()))
    );
}

#[test]
fn test_containers() {
    assert_eq!(infer_str("[1, 2.5]"), Ok(Type::array(Type::Double)));
    assert_eq!(infer_str("[1, 2; 3, 4]"), Ok(Type::matrix(Type::Int)));
    assert_eq!(
        infer_str("{a = 1, b = \"x\"}"),
        Ok(Type::record([("a", Type::Int), ("b", Type::String)]))
    );
    assert_eq!(
        infer_str("{|ok = 1.5|}"),
        Ok(Type::union([("ok", Type::Double)]))
    );
}

#[test]
fn test_regular_matrix_rows() {
    assert_eq!(infer_str("[1:1:3]"), Ok(Type::matrix(Type::Int)));
    assert_eq!(infer_str("[0:0.5:1; 1:1:3]"), Ok(Type::matrix(Type::Double)));
    assert_type_error(infer_str("[1:\"a\":3]"));
    assert_type_error(infer_str("[1:1:2i]"));
}

#[test]
fn test_field_access() {
    assert_eq!(infer_str("{a = 1, b = 2.5}.b"), Ok(Type::Double));
    assert_eq!(infer_str("{|ok = 1|}.ok"), Ok(Type::Int));
}

#[test]
fn test_resolved_operations() {
    assert_eq!(infer_str("abs(-3)"), Ok(Type::Int));
    assert_eq!(infer_str("sqrt(4)"), Ok(Type::Double));
    assert_eq!(infer_str("sqrt([1, 4])"), Ok(Type::array(Type::Double)));
    assert_eq!(infer_str("\"abc\".length()"), Ok(Type::Int));
    assert_eq!(infer_str("[1, 2, 3].length()"), Ok(Type::Int));
    assert!(matches!(
        infer_str("nosuch(1)"),
        Err(Error::NoMatchingOperation { .. })
    ));
}

#[test]
fn test_function_definitions() {
    assert_eq!(
        infer_str("function(x:int) x * 2"),
        Ok(Type::function(vec![Type::Int], Type::Int))
    );
    assert_eq!(infer_str("(function(x:int) x * 2)(4)"), Ok(Type::Int));
    assert_eq!(
        infer_str("function(x) x"),
        Ok(Type::function(vec![Type::General], Type::General))
    );
    assert_type_error(infer_str("(function(x:int) x)(1, 2)"));
    assert_type_error(infer_str("(function(x:int) x)(\"no\")"));
}

#[test]
fn test_application_indexes() {
    let scope: MapScope = [
        ("v", Value::array(vec![Value::Int(1), Value::Int(2)]).unwrap()),
        (
            "m",
            Value::matrix_from_flat(1, 2, vec![Value::Double(1.0), Value::Double(2.0)]).unwrap(),
        ),
    ]
    .into_iter()
    .collect();
    assert_eq!(infer_with("v(1)", &scope), Ok(Type::Int));
    assert_eq!(infer_with("m(0, 1)", &scope), Ok(Type::Double));
    assert_type_error(infer_with("v(0, 0)", &scope));
    assert_type_error(infer_with("v(0.5)", &scope));
}

#[test]
fn test_zero_index_promotion() {
    assert_eq!(infer_str("5(0)"), Ok(Type::Int));
    assert_eq!(infer_str("2.5(0, 0)"), Ok(Type::Double));
    assert_type_error(infer_str("5(0.5)"));
    assert_type_error(infer_str("5(0, 0, 0)"));
}

#[test]
fn test_pseudo_function_types() {
    assert_eq!(infer_str("cast(double, 1)"), Ok(Type::Double));
    assert_type_error(infer_str("cast(int, 2.5)"));

    let precision = Precision::new(8, 4).unwrap();
    assert_eq!(infer_str("fix(1.5, 8, 4)"), Ok(Type::fix(precision)));
    assert_eq!(
        infer_str("fix([1, 2], 8, 4)"),
        Ok(Type::array(Type::fix(precision)))
    );

    assert_eq!(infer_str("object(\"Sensor\")"), Ok(Type::object("Sensor")));
    assert_eq!(
        infer_str("fold(function(acc:int, x:int) acc + x, 0, [1, 2, 3])"),
        Ok(Type::Int)
    );
    assert_type_error(infer_str("fold(function(acc) acc, 0, [1])"));

    assert_eq!(infer_str("eval(\"1 + 2.5\")"), Ok(Type::Double));
    assert_eq!(infer_str("external(\"anything\")"), Ok(Type::General));
}

#[test]
fn test_pseudo_function_arity() {
    assert_type_error(infer_str("cast(1)"));
    assert_type_error(infer_str("fold(1, 2)"));
}

#[test]
fn test_fix_requires_static_bit_counts() {
    let scope: MapScope = [("bits", Value::Int(8))].into_iter().collect();
    assert!(infer_with("fix(1.5, bits, 4)", &scope).is_err());
}

#[test]
fn test_both_branches_are_checked() {
    let scope: MapScope = [("flag", Value::Boolean(true))].into_iter().collect();
    // Both branches are checked even though only one would run.
    assert!(infer_with("flag ? 1 : nothing", &scope).is_err());
}

#[test]
fn test_depth_limit() {
    let ast = parser::parse("[[[[1]]]]").unwrap();
    let shallow = Engine::new(EngineOptions {
        execution: ExecutionOptions { max_depth: 3 },
        ..Default::default()
    });
    assert!(matches!(
        shallow.infer(&ast, &EmptyScope),
        Err(Error::DepthExceeded { max_depth: 3, .. })
    ));
    assert_eq!(
        Engine::default().infer(&ast, &EmptyScope),
        Ok(Type::array(Type::array(Type::array(Type::array(Type::Int)))))
    );
}
