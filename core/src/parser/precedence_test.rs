use super::parse;
use pretty_assertions::assert_eq;

// Render an expression with every non-primary operand parenthesized.
//
// Two sources group the same way exactly when their renderings match.
fn grouped(source: &str) -> String {
    parse(source)
        .unwrap_or_else(|e| panic!("Expression parsing failed: {}\n{}", source, e))
        .to_source()
}

#[test]
fn test_sum_chain_is_one_node() {
    assert_eq!(grouped("a + b - c"), "a + b - c");
    assert_eq!(grouped("(a + b) - c"), "(a + b) - c");
    assert_eq!(grouped("a + b - c + d - e + f"), "a + b - c + d - e + f");
}

#[test]
fn test_product_chain_is_one_node() {
    assert_eq!(grouped("a * b / c % d"), "a * b / c % d");
}

#[test]
fn test_addition_vs_multiplication() {
    assert_eq!(grouped("a + b * c"), grouped("a + (b * c)"));
    assert_eq!(grouped("a * b + c"), grouped("(a * b) + c"));
}

#[test]
fn test_and_vs_or() {
    assert_eq!(grouped("a && b || c"), grouped("(a && b) || c"));
    assert_eq!(grouped("a || b && c"), grouped("a || (b && c)"));
}

#[test]
fn test_bitwise_levels() {
    assert_eq!(grouped("a | b # c & d"), grouped("a | (b # (c & d))"));
    assert_eq!(grouped("a & b == c"), grouped("a & (b == c)"));
}

#[test]
fn test_relational_vs_arithmetic() {
    assert_eq!(grouped("a + 1 < b * 2"), grouped("(a + 1) < (b * 2)"));
    assert_eq!(grouped("a << 1 >= b"), grouped("(a << 1) >= b"));
}

#[test]
fn test_relational_is_not_associative() {
    assert!(parse("a < b < c").is_err());
    assert!(parse("(a < b) == c").is_ok());
}

#[test]
fn test_unary_vs_binary() {
    assert_eq!(grouped("-a * b"), grouped("(-a) * b"));
    assert_eq!(grouped("!a && b"), grouped("(!a) && b"));
    assert_eq!(grouped("-a ^ 2"), grouped("-(a ^ 2)"));
}

#[test]
fn test_power_chain() {
    assert_eq!(grouped("a ^ b ^ c"), "a ^ b ^ c");
    assert_eq!(grouped("a * b ^ c"), grouped("a * (b ^ c)"));
}

#[test]
fn test_postfix_binds_tightest() {
    assert_eq!(grouped("-f(x).abs()"), grouped("-(f(x).abs())"));
    assert_eq!(grouped("a + m(1, 2)"), grouped("a + (m(1, 2))"));
}

#[test]
fn test_functional_if_is_lowest() {
    assert_eq!(
        grouped("a || b ? x + 1 : y * 2"),
        grouped("(a || b) ? (x + 1) : (y * 2)")
    );
    assert_eq!(
        grouped("a ? b : c ? d : e"),
        grouped("a ? b : (c ? d : e)")
    );
}
