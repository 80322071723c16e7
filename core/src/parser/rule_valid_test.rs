// Valid expressions for each rule of the grammar.

use crate::parser::{ExpressionParser, Rule};
use pest::Parser;
use pest::iterators::Pair;

fn contains_rule(pair: Pair<Rule>, target: Rule) -> bool {
    if pair.as_rule() == target {
        return true;
    }
    for inner in pair.into_inner() {
        if contains_rule(inner, target) {
            return true;
        }
    }
    false
}

macro_rules! rule_examples {
    ( $($rule:ident => [$($expr:expr),* $(,)?]),* $(,)? ) => {
        $(
            #[test]
            fn $rule() {
                let inputs = vec![$($expr),*];
                for input in inputs {
                    let result = ExpressionParser::parse(Rule::main, input)
                        .unwrap_or_else(|e| panic!("Failed to parse '{}': {}", input, e));
                    let root = result.into_iter().next().unwrap();
                    assert!(
                        contains_rule(root.clone(), Rule::$rule),
                        "Expected to find rule {:?} in parse tree for input '{}'",
                        Rule::$rule,
                        input
                    );
                }
            }
        )*
    };
}

rule_examples! {
    integer => ["42", "7ub", "12s", "9L", "1.abs()"],
    hex => ["0x0", "0x1A3F", "0xffL"],
    float => ["3.14", ".5", "6.022e23", "1.6E-19", "2f", "2.5d"],
    imaginary => ["2i", "1.5j", "x * 3i"],
    boolean => ["true", "false", "!true"],
    string => ["\"hello\"", "\"\"", "\"escaped \\\" quote\"", "\"unicode: \\u0041\""],
    ident => ["foo", "_bar123", "$tmp", "trueish"],
    call => ["foo()", "foo(1)", "foo(1, 2, 3)", "f(\"x\")", "v(0)(1)"],
    method => ["s.length", "s.length()", "s.substring(1, 2)", "a.b.c"],
    array => ["[]", "[1]", "[1, 2, 3]", "[[1], [2]]"],
    matrix => ["[1;]", "[1, 2; 3, 4]", "[1, 2; 3, 4;]"],
    matrix_range => ["[1:1:3]", "[0:0.5:1; 1:0.5:2]", "[a:b:c;]"],
    record => ["{}", "{x = 1}", "{x = 1, y = {z = 2}}"],
    union => ["{|ok = 1|}", "{|err = \"bad\"|}"],
    function_definition => [
        "function() 42",
        "function(x) x + 1",
        "function(x:int, y:double) x * y",
        "function(a) function(b) a + b",
        "(function(x) x * x)(5)",
    ],
    functional_if => ["a ? b : c", "a ? b : c ? d : e"],
    logical_or => ["a || b", "a && b || c"],
    logical_and => ["a && b", "!a && b"],
    bitwise_or => ["a | b", "1 | 2 | 4"],
    bitwise_xor => ["a # b"],
    bitwise_and => ["a & b"],
    relational => ["a < b", "a <= b", "a == b", "a != b", "a >= b", "a > b"],
    shift => ["a << 1", "a >> 2", "a >>> 3"],
    sum => ["1 + 2", "a - b + c"],
    product => ["1 * 2", "a / b % c"],
    unary => ["-1", "!a", "~a", "--a"],
    power => ["2 ^ 3", "a ^ b ^ c"],
}
