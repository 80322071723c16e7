use num_complex::Complex64;
use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;

use crate::api::Environment;
use crate::ast::{Ast, AstBuilder, NodeId, NodeKind};
use crate::errors::{Error, Result};
use crate::scope::EmptyScope;
use crate::syntax::string_literal::unescape_string;
use crate::syntax::{BitwiseOp, LogicalOp, ProductOp, RelationalOp, ShiftOp, SumOp, UnaryOp};
use crate::types::Type;
use crate::values::Value;

#[derive(Parser)]
#[grammar = "parser/expression.pest"]
pub struct ExpressionParser;

/// Parse `source` with the process-wide environment.
pub fn parse(source: &str) -> Result<Ast> {
    parse_in(source, Environment::global())
}

/// Parse `source`, evaluating parameter annotations in `env`.
pub fn parse_in(source: &str, env: Environment<'_>) -> Result<Ast> {
    check_nesting(source, env.options().execution.max_depth)?;
    let mut pairs = ExpressionParser::parse(Rule::main, source)?;
    let main = pairs
        .next()
        .ok_or_else(|| parse_error(0, "missing expected pair in rule"))?;
    let mut tree = TreeBuilder::new(env);
    let root = tree.build(main)?;
    tracing::trace!(nodes = tree.builder_len(), "Parsed expression");
    Ok(tree.finish(root))
}

/// Reject bracket nesting deeper than `max_depth` before handing the
/// source to pest, whose descent is not depth-limited.
fn check_nesting(source: &str, max_depth: usize) -> Result<()> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for ch in source.chars() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '(' | '[' | '{' => {
                depth += 1;
                if depth >= max_depth {
                    return Err(Error::DepthExceeded { depth, max_depth });
                }
            }
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}

/// Precedence levels that pass a lone operand through unchanged.
fn is_level(rule: Rule) -> bool {
    matches!(
        rule,
        Rule::functional_if
            | Rule::logical_or
            | Rule::logical_and
            | Rule::bitwise_or
            | Rule::bitwise_xor
            | Rule::bitwise_and
            | Rule::relational
            | Rule::shift
            | Rule::sum
            | Rule::product
            | Rule::unary
            | Rule::power
            | Rule::postfix
    )
}

fn parse_error(position: usize, message: impl Into<String>) -> Error {
    Error::Parse {
        message: message.into(),
        position,
    }
}

fn error_at(pair: &Pair<'_, Rule>, message: impl Into<String>) -> Error {
    pest::error::Error::<Rule>::new_from_span(
        pest::error::ErrorVariant::CustomError {
            message: message.into(),
        },
        pair.as_span(),
    )
    .into()
}

struct TreeBuilder<'e> {
    builder: AstBuilder,
    env: Environment<'e>,
    depth: usize,
}

impl<'e> TreeBuilder<'e> {
    fn new(env: Environment<'e>) -> Self {
        let builder = if env.options().compilation.fold_constants {
            AstBuilder::new()
        } else {
            AstBuilder::without_folding()
        };
        Self {
            builder,
            env,
            depth: 0,
        }
    }

    fn builder_len(&self) -> usize {
        self.builder.len()
    }

    fn finish(self, root: NodeId) -> Ast {
        self.builder.finish(root)
    }

    /// Build a node, counting nesting at each `expression`.
    fn build(&mut self, pair: Pair<'_, Rule>) -> Result<NodeId> {
        let entry = self.depth;
        let result = match self.descend(pair) {
            Ok(pair) => self.build_inner(pair),
            Err(e) => Err(e),
        };
        self.depth = entry;
        result
    }

    /// Walk down through `expression` wrappers and precedence levels that
    /// hold a single operand, without recursing.
    fn descend<'i>(&mut self, mut pair: Pair<'i, Rule>) -> Result<Pair<'i, Rule>> {
        loop {
            match pair.as_rule() {
                Rule::expression => self.enter()?,
                rule if is_level(rule) => {}
                _ => return Ok(pair),
            }
            let mut inner = pair.clone().into_inner();
            match (inner.next(), inner.next()) {
                (Some(only), None) => pair = only,
                _ => return Ok(pair),
            }
        }
    }

    fn enter(&mut self) -> Result<()> {
        let max_depth = self.env.options().execution.max_depth;
        if self.depth >= max_depth {
            return Err(Error::DepthExceeded {
                depth: self.depth,
                max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn first_inner(&mut self, pair: Pair<'_, Rule>) -> Result<NodeId> {
        let inner = pair
            .clone()
            .into_inner()
            .next()
            .ok_or_else(|| error_at(&pair, "missing expected pair in rule"))?;
        self.build(inner)
    }

    /// Split a precedence level into its operands and operator tokens.
    fn level<'i>(&mut self, pair: Pair<'i, Rule>) -> Result<(Vec<NodeId>, Vec<Pair<'i, Rule>>)> {
        let mut operands = Vec::new();
        let mut ops = Vec::new();
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::or_op
                | Rule::and_op
                | Rule::bit_or_op
                | Rule::bit_xor_op
                | Rule::bit_and_op
                | Rule::relational_op
                | Rule::shift_op
                | Rule::sum_op
                | Rule::product_op
                | Rule::power_op => ops.push(inner),
                _ => operands.push(self.build(inner)?),
            }
        }
        Ok((operands, ops))
    }

    fn chain<Op>(
        &mut self,
        pair: Pair<'_, Rule>,
        op_of: impl Fn(&str) -> Option<Op>,
        kind_of: impl FnOnce(Vec<Op>) -> NodeKind,
    ) -> Result<NodeId> {
        let (operands, ops) = self.level(pair)?;
        if let [single] = operands.as_slice() {
            return Ok(*single);
        }
        let ops = ops
            .iter()
            .map(|op| op_of(op.as_str()).ok_or_else(|| error_at(op, "unknown operator")))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.builder.push(kind_of(ops), operands))
    }

    fn build_inner(&mut self, pair: Pair<'_, Rule>) -> Result<NodeId> {
        match pair.as_rule() {
            Rule::main | Rule::expression => self.first_inner(pair),

            Rule::functional_if => {
                let (operands, _) = self.level(pair)?;
                match operands.as_slice() {
                    [single] => Ok(*single),
                    _ => Ok(self.builder.push(NodeKind::FunctionalIf, operands)),
                }
            }

            Rule::logical_or => self.chain(pair, |_| Some(()), |_| NodeKind::Logical(LogicalOp::Or)),
            Rule::logical_and => self.chain(pair, |_| Some(()), |_| NodeKind::Logical(LogicalOp::And)),
            Rule::bitwise_or => self.chain(pair, |_| Some(()), |_| NodeKind::Bitwise(BitwiseOp::Or)),
            Rule::bitwise_xor => self.chain(pair, |_| Some(()), |_| NodeKind::Bitwise(BitwiseOp::Xor)),
            Rule::bitwise_and => self.chain(pair, |_| Some(()), |_| NodeKind::Bitwise(BitwiseOp::And)),
            Rule::power => self.chain(pair, |_| Some(()), |_| NodeKind::Power),

            Rule::relational => self.chain(
                pair,
                |op| {
                    Some(match op {
                        "==" => RelationalOp::Equal,
                        "!=" => RelationalOp::NotEqual,
                        "<" => RelationalOp::Less,
                        "<=" => RelationalOp::LessOrEqual,
                        ">" => RelationalOp::Greater,
                        ">=" => RelationalOp::GreaterOrEqual,
                        _ => return None,
                    })
                },
                |ops| NodeKind::Relational(ops[0]),
            ),

            Rule::shift => self.chain(
                pair,
                |op| match op {
                    "<<" => Some(ShiftOp::Left),
                    ">>" => Some(ShiftOp::Right),
                    ">>>" => Some(ShiftOp::UnsignedRight),
                    _ => None,
                },
                NodeKind::Shift,
            ),

            Rule::sum => self.chain(
                pair,
                |op| match op {
                    "+" => Some(SumOp::Add),
                    "-" => Some(SumOp::Subtract),
                    _ => None,
                },
                NodeKind::Sum,
            ),

            Rule::product => self.chain(
                pair,
                |op| match op {
                    "*" => Some(ProductOp::Multiply),
                    "/" => Some(ProductOp::Divide),
                    "%" => Some(ProductOp::Modulo),
                    _ => None,
                },
                NodeKind::Product,
            ),

            Rule::unary => self.unary(pair),

            Rule::postfix => self.postfix(pair),

            Rule::ident => Ok(self.builder.identifier(pair.as_str())),

            Rule::array => {
                let elements = pair
                    .into_inner()
                    .map(|p| self.build(p))
                    .collect::<Result<Vec<_>>>()?;
                Ok(self.builder.push(NodeKind::ArrayConstruct, elements))
            }

            Rule::matrix => self.matrix(pair),
            Rule::matrix_range => self.matrix_range(pair),

            Rule::record => self.record(pair),
            Rule::union => self.union(pair),

            Rule::function_definition => self.function_definition(pair),

            Rule::integer | Rule::hex | Rule::float | Rule::imaginary | Rule::boolean | Rule::string => {
                self.literal(pair)
            }

            rule => Err(error_at(&pair, format!("unhandled rule: {rule:?}"))),
        }
    }

    fn unary(&mut self, pair: Pair<'_, Rule>) -> Result<NodeId> {
        let mut inner = pair.clone().into_inner();
        let first = inner
            .next()
            .ok_or_else(|| error_at(&pair, "missing operand"))?;
        if first.as_rule() != Rule::unary_op {
            return self.build(first);
        }
        let op = match first.as_str() {
            "-" => UnaryOp::Negate,
            "!" => UnaryOp::Not,
            "~" => UnaryOp::BitwiseNot,
            _ => return Err(error_at(&first, "unknown unary operator")),
        };
        let operand = inner
            .next()
            .ok_or_else(|| error_at(&pair, "missing operand"))?;
        let operand = self.build(operand)?;
        Ok(self.builder.push(NodeKind::Unary(op), [operand]))
    }

    fn record(&mut self, pair: Pair<'_, Rule>) -> Result<NodeId> {
        let mut labels = Vec::new();
        let mut values = Vec::new();
        for field in pair.into_inner() {
            let (label, value) = self.field(field)?;
            labels.push(label);
            values.push(value);
        }
        Ok(self.builder.push(NodeKind::RecordConstruct(labels), values))
    }

    fn union(&mut self, pair: Pair<'_, Rule>) -> Result<NodeId> {
        let field = pair
            .clone()
            .into_inner()
            .next()
            .ok_or_else(|| error_at(&pair, "missing union field"))?;
        let (label, value) = self.field(field)?;
        Ok(self.builder.push(NodeKind::UnionConstruct(label), [value]))
    }

    fn literal(&mut self, pair: Pair<'_, Rule>) -> Result<NodeId> {
        let value = match pair.as_rule() {
            Rule::integer | Rule::hex => integer_literal(pair.as_str())
                .ok_or_else(|| error_at(&pair, "integer literal out of range"))?,
            Rule::float => float_literal(pair.as_str())
                .ok_or_else(|| error_at(&pair, "invalid floating point literal"))?,
            Rule::imaginary => {
                let text = pair.as_str();
                let im: f64 = text[..text.len() - 1]
                    .parse()
                    .map_err(|_| error_at(&pair, "invalid imaginary literal"))?;
                Value::Complex(Complex64::new(0.0, im))
            }
            Rule::boolean => Value::Boolean(pair.as_str() == "true"),
            _ => {
                let inner = pair
                    .clone()
                    .into_inner()
                    .next()
                    .map(|p| p.as_str())
                    .unwrap_or("");
                let text = unescape_string(inner).map_err(|e| {
                    parse_error(pair.as_span().start() + 1 + e.position(), e.to_string())
                })?;
                Value::string(text)
            }
        };
        Ok(self.builder.constant(value))
    }

    fn postfix(&mut self, pair: Pair<'_, Rule>) -> Result<NodeId> {
        let mut inner = pair.clone().into_inner();
        let primary = inner
            .next()
            .ok_or_else(|| error_at(&pair, "missing expression"))?;
        let mut node = self.build(primary)?;
        for op in inner {
            match op.as_rule() {
                Rule::call => {
                    let name = match self.builder.kind(node) {
                        NodeKind::Identifier(name) => Some(name.clone()),
                        _ => None,
                    };
                    let mut children = vec![node];
                    for arg in op.into_inner() {
                        children.push(self.build(arg)?);
                    }
                    node = self.builder.push(NodeKind::FunctionApplication(name), children);
                }
                Rule::method => {
                    let mut parts = op.clone().into_inner();
                    let name = parts
                        .next()
                        .ok_or_else(|| error_at(&op, "missing method name"))?
                        .as_str()
                        .to_string();
                    let mut children = vec![node];
                    if let Some(call) = parts.next() {
                        for arg in call.into_inner() {
                            children.push(self.build(arg)?);
                        }
                    }
                    node = self.builder.push(NodeKind::MethodCall(name), children);
                }
                rule => return Err(error_at(&op, format!("unexpected postfix {rule:?}"))),
            }
        }
        Ok(node)
    }

    fn matrix(&mut self, pair: Pair<'_, Rule>) -> Result<NodeId> {
        let mut elements = Vec::new();
        let mut rows = 0;
        let mut cols = None;
        for row in pair.clone().into_inner() {
            let mut width = 0;
            for element in row.into_inner() {
                elements.push(self.build(element)?);
                width += 1;
            }
            match cols {
                None => cols = Some(width),
                Some(expected) if expected != width => {
                    return Err(error_at(
                        &pair,
                        format!("matrix row {} has {width} columns, expected {expected}", rows + 1),
                    ));
                }
                Some(_) => {}
            }
            rows += 1;
        }
        let cols = cols.unwrap_or(0);
        Ok(self
            .builder
            .push(NodeKind::MatrixConstruct { rows, cols }, elements))
    }

    /// Rows of `start:step:end` triples; children are the triples in order.
    fn matrix_range(&mut self, pair: Pair<'_, Rule>) -> Result<NodeId> {
        let mut bounds = Vec::new();
        let mut rows = 0;
        for row in pair.into_inner() {
            for bound in row.into_inner() {
                bounds.push(self.build(bound)?);
            }
            rows += 1;
        }
        Ok(self.builder.push(NodeKind::RangeMatrix { rows }, bounds))
    }

    fn field(&mut self, pair: Pair<'_, Rule>) -> Result<(String, NodeId)> {
        let mut inner = pair.clone().into_inner();
        let label = inner
            .next()
            .ok_or_else(|| error_at(&pair, "missing field label"))?
            .as_str()
            .to_string();
        let value = inner
            .next()
            .ok_or_else(|| error_at(&pair, "missing field value"))?;
        Ok((label, self.build(value)?))
    }

    fn function_definition(&mut self, pair: Pair<'_, Rule>) -> Result<NodeId> {
        let mut params: Vec<(String, Type)> = Vec::new();
        let mut body = None;
        for inner in pair.clone().into_inner() {
            match inner.as_rule() {
                Rule::parameter => {
                    let mut parts = inner.clone().into_inner();
                    let name = parts
                        .next()
                        .ok_or_else(|| error_at(&inner, "missing parameter name"))?
                        .as_str()
                        .to_string();
                    if params.iter().any(|(n, _)| *n == name) {
                        return Err(error_at(&inner, format!("duplicate parameter {name}")));
                    }
                    let ty = match parts.next() {
                        Some(annotation) => self.annotation_type(annotation)?,
                        None => Type::General,
                    };
                    params.push((name, ty));
                }
                _ => body = Some(self.build(inner)?),
            }
        }
        let body = body.ok_or_else(|| error_at(&pair, "missing function body"))?;
        Ok(self
            .builder
            .push(NodeKind::FunctionDefinition(params), [body]))
    }

    /// The type of a parameter annotation's value.
    fn annotation_type(&mut self, pair: Pair<'_, Rule>) -> Result<Type> {
        let mut annotation = TreeBuilder::new(self.env);
        annotation.depth = self.depth;
        let root = annotation.build(pair)?;
        let ast = annotation.finish(root);
        let value = crate::evaluator::evaluate_in(&ast, &EmptyScope, self.env)?;
        Ok(value.ty())
    }
}

/// Decimal or hexadecimal integer with an optional `ub`, `s` or `l` suffix.
///
/// Unsuffixed literals are `int` when they fit and `long` otherwise.
fn integer_literal(text: &str) -> Option<Value> {
    let lower = text.to_ascii_lowercase();
    let (body, radix) = match lower.strip_prefix("0x") {
        Some(hex) => (hex, 16),
        None => (lower.as_str(), 10),
    };
    if let Some(digits) = body.strip_suffix("ub") {
        return u8::from_str_radix(digits, radix).ok().map(Value::UnsignedByte);
    }
    if let Some(digits) = body.strip_suffix('s') {
        return i16::from_str_radix(digits, radix).ok().map(Value::Short);
    }
    if let Some(digits) = body.strip_suffix('l') {
        return i64::from_str_radix(digits, radix).ok().map(Value::Long);
    }
    let wide = i64::from_str_radix(body, radix).ok()?;
    match i32::try_from(wide) {
        Ok(narrow) => Some(Value::Int(narrow)),
        // 0xFFFFFFFF and friends keep their bit pattern.
        Err(_) if radix == 16 && wide <= u32::MAX as i64 => Some(Value::Int(wide as u32 as i32)),
        Err(_) => Some(Value::Long(wide)),
    }
}

fn float_literal(text: &str) -> Option<Value> {
    match text.as_bytes().last()? {
        b'f' | b'F' => text[..text.len() - 1].parse::<f32>().ok().map(Value::Float),
        b'd' | b'D' => text[..text.len() - 1].parse::<f64>().ok().map(Value::Double),
        _ => text.parse::<f64>().ok().map(Value::Double),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_integer_literals() {
        assert_eq!(integer_literal("42"), Some(Value::Int(42)));
        assert_eq!(integer_literal("3000000000"), Some(Value::Long(3_000_000_000)));
        assert_eq!(integer_literal("7L"), Some(Value::Long(7)));
        assert_eq!(integer_literal("255ub"), Some(Value::UnsignedByte(255)));
        assert_eq!(integer_literal("256ub"), None);
        assert_eq!(integer_literal("12s"), Some(Value::Short(12)));
        assert_eq!(integer_literal("0xff"), Some(Value::Int(255)));
        assert_eq!(integer_literal("0xFFFFFFFF"), Some(Value::Int(-1)));
        assert_eq!(integer_literal("0x10ub"), Some(Value::UnsignedByte(16)));
    }

    #[test]
    fn test_float_literals() {
        assert_eq!(float_literal("1.5"), Some(Value::Double(1.5)));
        assert_eq!(float_literal("1.5f"), Some(Value::Float(1.5)));
        assert_eq!(float_literal("2d"), Some(Value::Double(2.0)));
        assert_eq!(float_literal("1e3"), Some(Value::Double(1000.0)));
    }
}
