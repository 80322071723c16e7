use super::*;
use crate::parser::parse;
use crate::scope::MapScope;
use pretty_assertions::assert_eq;

fn sum_of_literals() -> Ast {
    let mut b = AstBuilder::new();
    let one = b.constant(Value::Int(1));
    let two = b.constant(Value::Int(2));
    let root = b.push(NodeKind::Sum(vec![SumOp::Add]), [one, two]);
    b.finish(root)
}

#[test]
fn test_constancy_follows_children() {
    let ast = sum_of_literals();
    assert!(ast.node(ast.root()).is_constant());

    let mut b = AstBuilder::new();
    let x = b.identifier("x");
    let one = b.constant(Value::Int(1));
    let root = b.push(NodeKind::Sum(vec![SumOp::Add]), [x, one]);
    let ast = b.finish(root);
    assert!(!ast.node(root).is_constant());
    assert!(ast.node(one).is_constant());
}

#[test]
fn test_method_calls_are_never_constant() {
    let mut b = AstBuilder::new();
    let receiver = b.constant(Value::Int(1));
    let root = b.push(NodeKind::MethodCall("abs".to_string()), [receiver]);
    let ast = b.finish(root);
    assert!(!ast.node(root).is_constant());
}

#[test]
fn test_without_folding() {
    let mut b = AstBuilder::without_folding();
    let one = b.constant(Value::Int(1));
    let ast = b.finish(one);
    assert!(!ast.node(one).is_constant());
}

#[test]
fn test_clone_has_independent_caches() {
    let ast = sum_of_literals();
    let copy = ast.clone();
    ast.node(ast.root()).remember(&Value::Int(3));
    assert_eq!(ast.node(ast.root()).cached(), Some(&Value::Int(3)));
    assert_eq!(copy.node(copy.root()).cached(), None);
}

#[test]
fn test_remember_is_write_once() {
    let ast = sum_of_literals();
    let root = ast.node(ast.root());
    root.remember(&Value::Int(3));
    root.remember(&Value::Int(4));
    assert_eq!(root.cached(), Some(&Value::Int(3)));
}

#[test]
fn test_to_source() {
    for src in [
        "1 + 2 * 3",
        "(x > 0) ? 1 : -1",
        "[1, 2; 3, 4]",
        "{a = 1, b = \"x\"}",
        "{|a = 1|}",
        "function(x:int, y) x + y",
        "sin(x).abs()",
        "a && (b || c)",
    ] {
        let ast = parse(src).unwrap();
        let rendered = ast.to_source();
        let reparsed = parse(&rendered).unwrap();
        assert_eq!(reparsed.to_source(), rendered, "round trip of {src}");
    }
    assert_eq!(parse("1 + 2 * 3").unwrap().to_source(), "1 + (2 * 3)");
    assert_eq!(parse("[1, 2;]").unwrap().to_source(), "[1, 2;]");
}

#[test]
fn test_free_identifiers() {
    let ast = parse("f(x) + function(y) y + z").unwrap();
    let free: Vec<String> = ast.free_identifiers(ast.root()).into_iter().collect();
    assert_eq!(free, vec!["f", "x", "z"]);
}

#[test]
fn test_specialize_resolves_free_identifiers() {
    let ast = parse("function(x) x + k + unknown").unwrap();
    let NodeKind::FunctionDefinition(params) = ast.kind(ast.root()) else {
        panic!("expected a function definition");
    };
    let names: Vec<String> = params.iter().map(|(n, _)| n.clone()).collect();

    let mut scope = MapScope::new();
    scope.insert("k", Value::Int(10));
    scope.insert("x", Value::Int(99));
    let body = ast.children(ast.root())[0];
    let specialized = ast.specialize(body, &names, &scope).unwrap();
    assert_eq!(specialized.to_source(), "x + 10 + unknown");
}

#[test]
fn test_specialized_callee_becomes_anonymous() {
    let ast = parse("g(1)").unwrap();
    let mut scope = MapScope::new();
    scope.insert("g", Value::array(vec![Value::Int(5)]).unwrap());
    let specialized = ast.specialize(ast.root(), &[], &scope).unwrap();
    assert_eq!(
        specialized.kind(specialized.root()),
        &NodeKind::FunctionApplication(None)
    );
}

#[test]
fn test_subtree() {
    let ast = parse("(1 + 2) * x").unwrap();
    let left = ast.children(ast.root())[0];
    let sub = ast.subtree(left);
    assert_eq!(sub.len(), 3);
    assert_eq!(sub.to_source(), "1 + 2");
    assert!(sub.node(sub.root()).is_constant());
}

#[test]
fn test_dump() {
    let ast = parse("1 + x").unwrap();
    assert_eq!(ast.dump(), "Sum\n  Constant 1 [constant]\n  Identifier x\n");
}
