use super::*;
use crate::api::Engine;
use crate::parser;
use crate::scope::{EmptyScope, MapScope};
use indoc::indoc;
use pretty_assertions::assert_eq;

fn trace_str(source: &str, scope: &dyn Scope) -> String {
    let ast = parser::parse(source).unwrap_or_else(|e| panic!("failed to parse {source}: {e}"));
    trace(&ast, scope)
}

#[test]
fn test_trace_nests_by_depth() {
    assert_eq!(
        trace_str("1 + 2 * 3", &EmptyScope),
        indoc! {"
            Entering node Sum
              Entering node Constant
              Node Constant evaluated to 1
              Entering node Product
                Entering node Constant
                Node Constant evaluated to 2
                Entering node Constant
                Node Constant evaluated to 3
              Node Product evaluated to 6
            Node Sum evaluated to 7
        "}
    );
}

#[test]
fn test_trace_shows_invocations() {
    let scope: MapScope = [("x", Value::Int(-3))].into_iter().collect();
    assert_eq!(
        trace_str("abs(x)", &scope),
        indoc! {"
            Entering node FunctionApplication
              Entering node Identifier
              Node Identifier evaluated to -3
              Invoking abs
            Node FunctionApplication evaluated to 3
        "}
    );
}

#[test]
fn test_trace_skips_untaken_branch() {
    let scope: MapScope = [("x", Value::Int(5))].into_iter().collect();
    assert_eq!(
        trace_str("x > 0 ? 1 : 2", &scope),
        indoc! {"
            Entering node FunctionalIf
              Entering node Relational
                Entering node Identifier
                Node Identifier evaluated to 5
                Entering node Constant
                Node Constant evaluated to 0
              Node Relational evaluated to true
              Entering node Constant
              Node Constant evaluated to 1
            Node FunctionalIf evaluated to 1
        "}
    );
}

#[test]
fn test_trace_ends_with_error() {
    assert_eq!(
        trace_str("1 / 0", &EmptyScope),
        indoc! {"
            Entering node Product
              Entering node Constant
              Node Constant evaluated to 1
              Entering node Constant
              Node Constant evaluated to 0
            Error: Division by zero
        "}
    );
}

#[test]
fn test_memoized_nodes_do_not_revisit_children() {
    let engine = Engine::default();
    let ast = engine.parse("1 + 2").unwrap();
    engine.evaluate(&ast, &EmptyScope).unwrap();
    assert_eq!(
        engine.trace(&ast, &EmptyScope),
        indoc! {"
            Entering node Sum
            Node Sum evaluated to 3
        "}
    );
}
