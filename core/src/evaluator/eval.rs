//! Core evaluation logic.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::trace::TraceLog;
use crate::api::Environment;
use crate::ast::{Ast, NodeId, NodeKind};
use crate::errors::{Error, Result};
use crate::inference::{TypeInference, malformed};
use crate::parser;
use crate::pseudo::{self, PseudoFunction};
use crate::resolver::OperationKind;
use crate::scope::{ArgumentScope, EmptyScope, LayeredScope, Scope, TypeScope};
use crate::syntax::{ArithmeticOp, LogicalOp};
use crate::types::{Type, least_upper_bound};
use crate::values::{ExpressionFunction, ObjectRef, Value, operators};

/// Evaluator for one AST under one scope.
pub(crate) struct Evaluator<'a> {
    ast: &'a Ast,
    scope: &'a dyn Scope,
    env: Environment<'a>,
    depth: usize,
    trace: Option<&'a TraceLog>,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(ast: &'a Ast, scope: &'a dyn Scope, env: Environment<'a>) -> Self {
        Self {
            ast,
            scope,
            env,
            depth: 0,
            trace: None,
        }
    }

    pub(crate) fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    pub(crate) fn with_trace(mut self, trace: &'a TraceLog) -> Self {
        self.trace = Some(trace);
        self
    }

    /// An evaluator for another tree that shares this one's depth and log.
    fn nested<'b>(&self, ast: &'b Ast, scope: &'b dyn Scope) -> Evaluator<'b>
    where
        'a: 'b,
    {
        Evaluator {
            ast,
            scope,
            env: self.env,
            depth: self.depth,
            trace: self.trace,
        }
    }

    fn inference(&self) -> TypeInference<'a> {
        TypeInference::new(self.ast, self.scope, self.env).with_depth(self.depth)
    }

    fn log(&self, line: impl FnOnce() -> String) {
        if let Some(trace) = self.trace {
            trace.push(self.depth, &line());
        }
    }

    pub(crate) fn evaluate(&mut self) -> Result<Value> {
        self.evaluate_node(self.ast.root())
    }

    /// Evaluate a node, answering from its cache when it is constant.
    pub(crate) fn evaluate_node(&mut self, id: NodeId) -> Result<Value> {
        let max_depth = self.env.options().execution.max_depth;
        if self.depth >= max_depth {
            return Err(Error::DepthExceeded {
                depth: self.depth,
                max_depth,
            });
        }

        let node = self.ast.node(id);
        let name = node.kind().name();
        self.log(|| format!("Entering node {name}"));

        self.depth += 1;
        let result = match node.cached() {
            Some(value) if node.is_constant() => Ok(value.clone()),
            _ => self.evaluate_inner(id),
        };
        self.depth -= 1;

        if let Ok(value) = &result {
            node.remember(value);
            self.log(|| format!("Node {name} evaluated to {value}"));
        }
        result
    }

    fn evaluate_all(&mut self, ids: &[NodeId]) -> Result<Vec<Value>> {
        ids.iter().map(|id| self.evaluate_node(*id)).collect()
    }

    /// Fold `apply` left to right over the children's values.
    fn chain(
        &mut self,
        kind: &NodeKind,
        children: &[NodeId],
        mut apply: impl FnMut(usize, &Value, &Value) -> Result<Value>,
    ) -> Result<Value> {
        let (first, rest) = children.split_first().ok_or_else(|| malformed(kind))?;
        let mut acc = self.evaluate_node(*first)?;
        for (i, child) in rest.iter().enumerate() {
            let rhs = self.evaluate_node(*child)?;
            acc = apply(i, &acc, &rhs)?;
        }
        Ok(acc)
    }

    fn evaluate_inner(&mut self, id: NodeId) -> Result<Value> {
        let node = self.ast.node(id);
        let children = node.children();
        let kind = node.kind();
        match kind {
            NodeKind::Constant(value) => Ok(value.clone()),
            NodeKind::Identifier(name) => self.identifier(name),

            NodeKind::Sum(ops) => self.chain(kind, children, |i, l, r| {
                operators::arithmetic(ArithmeticOp::from(ops[i]), l, r)
            }),
            NodeKind::Product(ops) => self.chain(kind, children, |i, l, r| {
                operators::arithmetic(ArithmeticOp::from(ops[i]), l, r)
            }),
            NodeKind::Power => self.chain(kind, children, |_, l, r| operators::power(l, r)),
            NodeKind::Shift(ops) => {
                self.chain(kind, children, |i, l, r| operators::shift(ops[i], l, r))
            }
            NodeKind::Bitwise(op) => {
                self.chain(kind, children, |_, l, r| operators::bitwise(*op, l, r))
            }

            NodeKind::Logical(op) => {
                for child in children {
                    let operand = self.evaluate_node(*child)?;
                    let Value::Boolean(flag) = operand else {
                        return Err(Error::type_error(format!(
                            "operand of {op} must be boolean, found {}",
                            operand.ty()
                        )));
                    };
                    match (op, flag) {
                        (LogicalOp::And, false) => return Ok(Value::Boolean(false)),
                        (LogicalOp::Or, true) => return Ok(Value::Boolean(true)),
                        _ => {}
                    }
                }
                Ok(Value::Boolean(*op == LogicalOp::And))
            }
            NodeKind::Relational(op) => {
                let [left, right] = children else {
                    return Err(malformed(kind));
                };
                let left = self.evaluate_node(*left)?;
                let right = self.evaluate_node(*right)?;
                operators::relational(*op, &left, &right)
            }
            NodeKind::Unary(op) => {
                let [operand] = children else {
                    return Err(malformed(kind));
                };
                let operand = self.evaluate_node(*operand)?;
                operators::unary(*op, &operand)
            }

            NodeKind::FunctionalIf => {
                let [condition, then_branch, else_branch] = children else {
                    return Err(malformed(kind));
                };
                let condition = self.evaluate_node(*condition)?;
                let Value::Boolean(flag) = condition else {
                    return Err(Error::type_error(format!(
                        "condition must be boolean, found {}",
                        condition.ty()
                    )));
                };
                let (taken, other) = if flag {
                    (*then_branch, *else_branch)
                } else {
                    (*else_branch, *then_branch)
                };
                let value = self.evaluate_node(taken)?;
                let mut inference = self.inference();
                let target = least_upper_bound(
                    &inference.infer_node(taken)?,
                    &inference.infer_node(other)?,
                );
                value.convert_to(&target)
            }

            NodeKind::ArrayConstruct => Value::array(self.evaluate_all(children)?),
            NodeKind::MatrixConstruct { rows, cols } => {
                Value::matrix_from_flat(*rows, *cols, self.evaluate_all(children)?)
            }
            NodeKind::RangeMatrix { rows } => {
                let bounds = self.evaluate_all(children)?;
                let mut elements = Vec::new();
                let mut cols = None;
                for triple in bounds.chunks(3) {
                    let [start, step, end] = triple else {
                        return Err(malformed(kind));
                    };
                    let len = operators::sequence_length(start, step, end)?;
                    match cols {
                        Some(expected) if expected != len => {
                            return Err(Error::shape(format!(
                                "matrix rows have {expected} and {len} columns"
                            )));
                        }
                        _ => cols = Some(len),
                    }
                    elements.extend(operators::sequence(start, step, len)?);
                }
                Value::matrix_from_flat(*rows, cols.unwrap_or(0), elements)
            }
            NodeKind::RecordConstruct(labels) => {
                let values = self.evaluate_all(children)?;
                Ok(Value::record(labels.iter().cloned().zip(values)))
            }
            NodeKind::UnionConstruct(label) => {
                let [value] = children else {
                    return Err(malformed(kind));
                };
                Ok(Value::union(label.clone(), self.evaluate_node(*value)?))
            }

            NodeKind::MethodCall(name) => self.method_call(kind, name, children),
            NodeKind::FunctionApplication(name) => {
                self.application(kind, name.as_deref(), children)
            }
            NodeKind::FunctionDefinition(params) => {
                let [body] = children else {
                    return Err(malformed(kind));
                };
                self.define_function(params, *body)
            }
        }
    }

    fn identifier(&self, name: &str) -> Result<Value> {
        if let Some(value) = self.scope.get(name)? {
            return Ok(value);
        }
        self.env
            .constants()
            .get(name)
            .ok_or_else(|| Error::UndefinedIdentifier(name.to_string()))
    }

    fn invoke(&self, name: &str, kind: OperationKind, args: &[Value]) -> Result<Value> {
        let arg_types: Vec<Type> = args.iter().map(Value::ty).collect();
        let operation = self.env.resolver().resolve(name, kind, &arg_types);
        self.log(|| format!("Invoking {name}"));
        operation.invoke(args)
    }

    fn method_call(&mut self, kind: &NodeKind, name: &str, children: &[NodeId]) -> Result<Value> {
        let [receiver, args @ ..] = children else {
            return Err(malformed(kind));
        };
        let receiver = self.evaluate_node(*receiver)?;
        if args.is_empty() {
            match &receiver {
                Value::Record(fields) => {
                    if let Some(value) = fields.get(name) {
                        return Ok(value.clone());
                    }
                }
                Value::Union(union) if union.alternatives().contains_key(name) => {
                    if union.label() == name {
                        return Ok(union.value().clone());
                    }
                    return Err(Error::type_error(format!(
                        "union holds {}, not {name}",
                        union.label()
                    )));
                }
                _ => {}
            }
        }
        let mut values = vec![receiver];
        values.extend(self.evaluate_all(args)?);
        self.invoke(name, OperationKind::Method, &values)
    }

    fn application(
        &mut self,
        kind: &NodeKind,
        name: Option<&str>,
        children: &[NodeId],
    ) -> Result<Value> {
        let [callee, args @ ..] = children else {
            return Err(malformed(kind));
        };
        if let Some(name) = name {
            if let Some(callee) = self.scope.get(name)? {
                return self.apply(callee, args);
            }
            if let Some(pseudo) = PseudoFunction::lookup(name) {
                return self.pseudo(pseudo, args);
            }
            let values = self.evaluate_all(args)?;
            return self.invoke(name, OperationKind::Function, &values);
        }
        let callee = self.evaluate_node(*callee)?;
        self.apply(callee, args)
    }

    /// Apply a value to arguments: index an array or matrix, promote a
    /// scalar through zero indices, or call a closure.
    fn apply(&mut self, callee: Value, args: &[NodeId]) -> Result<Value> {
        let args = self.evaluate_all(args)?;
        match &callee {
            Value::Array(array) => {
                let [index] = args.as_slice() else {
                    return Err(index_count(1, args.len(), "an array"));
                };
                let index = index_value(index)?;
                usize::try_from(index)
                    .ok()
                    .and_then(|i| array.get(i))
                    .cloned()
                    .ok_or(Error::IndexOutOfBounds {
                        index,
                        len: array.len(),
                    })
            }
            Value::Matrix(matrix) => {
                let [row, col] = args.as_slice() else {
                    return Err(index_count(2, args.len(), "a matrix"));
                };
                let row = bounded(index_value(row)?, matrix.rows())?;
                let col = bounded(index_value(col)?, matrix.cols())?;
                matrix.get(row, col).cloned().ok_or(Error::IndexOutOfBounds {
                    index: col as i64,
                    len: matrix.cols(),
                })
            }
            Value::Function(function) => self.call_function(function, args),
            scalar if scalar.is_scalar() && !args.is_empty() => {
                if args.len() > 2 {
                    return Err(scalar_index_count(args.len()));
                }
                for arg in &args {
                    let index = index_value(arg)?;
                    if index != 0 {
                        return Err(Error::IndexOutOfBounds { index, len: 1 });
                    }
                }
                Ok(scalar.clone())
            }
            other => Err(Error::type_error(format!(
                "a value of type {} cannot be applied to arguments",
                other.ty()
            ))),
        }
    }

    fn call_function(&mut self, function: &ExpressionFunction, args: Vec<Value>) -> Result<Value> {
        if args.len() != function.arity() {
            return Err(Error::type_error(format!(
                "function expects {} arguments, got {}",
                function.arity(),
                args.len()
            )));
        }
        let args = function
            .params()
            .iter()
            .zip(&args)
            .map(|((_, ty), arg)| arg.convert_to(ty))
            .collect::<Result<Vec<_>>>()?;
        let names: Vec<String> = function.params().iter().map(|(n, _)| n.clone()).collect();
        // Free names were bound when the closure was defined.
        let scope = ArgumentScope::new(&names, &args, &EmptyScope);
        let result = self.nested(function.body(), &scope).evaluate()?;
        result.convert_to(function.return_type())
    }

    fn define_function(&mut self, params: &[(String, Type)], body: NodeId) -> Result<Value> {
        let names: Vec<String> = params.iter().map(|(n, _)| n.clone()).collect();
        let defining = LayeredScope::new(self.scope, self.env.constants());
        let specialized = self.ast.specialize(body, &names, &defining)?;
        let scope = TypeScope::new(params, self.scope);
        let return_type = TypeInference::new(self.ast, &scope, self.env)
            .with_depth(self.depth)
            .infer_node(body)?;
        Ok(Value::Function(Arc::new(ExpressionFunction::new(
            params.to_vec(),
            specialized,
            return_type,
        ))))
    }

    fn static_value(&mut self, id: NodeId, pseudo: PseudoFunction) -> Result<Value> {
        pseudo::require_static(self.ast, id, pseudo)?;
        self.evaluate_node(id)
    }

    fn pseudo(&mut self, pseudo: PseudoFunction, args: &[NodeId]) -> Result<Value> {
        pseudo.check_arity(args.len())?;
        match pseudo {
            PseudoFunction::Cast => {
                let prototype = self.evaluate_node(args[0])?;
                let value = self.evaluate_node(args[1])?;
                value.convert_to(&prototype.ty())
            }
            PseudoFunction::Fix => {
                let value = self.evaluate_node(args[0])?;
                let total = self.static_value(args[1], pseudo)?;
                let integer = self.static_value(args[2], pseudo)?;
                pseudo::to_fix(&value, pseudo::fix_precision(&total, &integer)?)
            }
            PseudoFunction::Eval => {
                let source = self.evaluate_node(args[0])?;
                let nested = parser::parse_in(pseudo::expect_string(&source, pseudo)?, self.env)?;
                self.nested(&nested, self.scope).evaluate()
            }
            PseudoFunction::External => {
                let engine = self
                    .env
                    .external()
                    .ok_or_else(|| Error::External("no external engine is configured".into()))?;
                let expression = self.evaluate_node(args[0])?;
                let expression = pseudo::expect_string(&expression, pseudo)?;
                let names: BTreeSet<String> = args
                    .iter()
                    .flat_map(|arg| self.ast.free_identifiers(*arg))
                    .collect();
                let mut variables = Vec::with_capacity(names.len());
                for name in names {
                    if let Some(value) = self.scope.get(&name)? {
                        variables.push((name, value));
                    }
                }
                self.log(|| format!("Invoking {}", pseudo.name()));
                engine.evaluate(expression, &variables)
            }
            PseudoFunction::Fold => {
                let function = self.evaluate_node(args[0])?;
                let initial = self.evaluate_node(args[1])?;
                let iterable = self.evaluate_node(args[2])?;
                let function = match function {
                    Value::Function(f) if f.arity() == 2 => f,
                    other => {
                        return Err(Error::type_error(format!(
                            "{pseudo} expects a two-argument function, found {}",
                            other.ty()
                        )));
                    }
                };
                let items = match &iterable {
                    Value::Array(array) => array.elements().to_vec(),
                    Value::Object(object) => object
                        .payload()
                        .and_then(|payload| payload.values())
                        .ok_or_else(|| {
                            Error::type_error(format!(
                                "{pseudo} cannot iterate over {object}"
                            ))
                        })?,
                    other => {
                        return Err(Error::type_error(format!(
                            "{pseudo} cannot iterate over {}",
                            other.ty()
                        )));
                    }
                };
                let target = least_upper_bound(&initial.ty(), function.return_type());
                let mut acc = initial;
                for item in items {
                    acc = self.call_function(&function, vec![acc, item])?;
                }
                acc.convert_to(&target)
            }
            PseudoFunction::Object => {
                let class = self.static_value(args[0], pseudo)?;
                let class = pseudo::expect_string(&class, pseudo)?;
                Ok(Value::Object(ObjectRef::named(class)))
            }
        }
    }
}

fn index_count(expected: usize, found: usize, what: &str) -> Error {
    Error::type_error(format!("{what} takes {expected} indices, found {found}"))
}

/// Scalars stand in for a one element array or a 1x1 matrix only.
pub(crate) fn scalar_index_count(found: usize) -> Error {
    Error::type_error(format!("a scalar takes 1 or 2 indices, found {found}"))
}

fn index_value(value: &Value) -> Result<i64> {
    value.as_i64().ok_or_else(|| {
        Error::type_error(format!("index must be an integer, found {}", value.ty()))
    })
}

fn bounded(index: i64, len: usize) -> Result<usize> {
    usize::try_from(index)
        .ok()
        .filter(|i| *i < len)
        .ok_or(Error::IndexOutOfBounds { index, len })
}
