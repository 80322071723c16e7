//! Static type inference over an [`Ast`].
//!
//! The inference visitor predicts, without side effects, the type the
//! evaluator will produce for every node. It shares the operator type rules
//! in [`types::operators`](crate::types::operators), the resolver and the
//! pseudo-function table with the evaluator so the two cannot disagree on
//! which operation a call selects.
//!
//! The only asymmetry is deliberate: a functional-if infers both branches,
//! while evaluation takes one.

use crate::api::Environment;
use crate::ast::{Ast, NodeId, NodeKind};
use crate::errors::{Error, Result};
use crate::evaluator;
use crate::parser;
use crate::pseudo::{self, PseudoFunction};
use crate::resolver::OperationKind;
use crate::scope::{Scope, TypeScope};
use crate::syntax::ArithmeticOp;
use crate::types::lattice::is_lower_or_equal;
use crate::types::{Type, least_upper_bound, least_upper_bound_of, operators};

/// Infer the type of `ast` with the process-wide environment.
pub fn infer(ast: &Ast, scope: &dyn Scope) -> Result<Type> {
    infer_in(ast, scope, Environment::global())
}

pub fn infer_in(ast: &Ast, scope: &dyn Scope, env: Environment<'_>) -> Result<Type> {
    tracing::debug!(nodes = ast.len(), "Inferring expression type");
    TypeInference::new(ast, scope, env).infer()
}

/// Types carrying no runtime information skip operation resolution.
fn is_open(ty: &Type) -> bool {
    ty.is_abstract() || ty.element_type().is_some_and(is_open)
}

pub(crate) fn malformed(kind: &NodeKind) -> Error {
    Error::type_error(format!("malformed {} node", kind.name()))
}

pub(crate) struct TypeInference<'a> {
    ast: &'a Ast,
    scope: &'a dyn Scope,
    env: Environment<'a>,
    depth: usize,
}

impl<'a> TypeInference<'a> {
    pub(crate) fn new(ast: &'a Ast, scope: &'a dyn Scope, env: Environment<'a>) -> Self {
        Self {
            ast,
            scope,
            env,
            depth: 0,
        }
    }

    /// Continue counting nesting from an enclosing visitor.
    pub(crate) fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    pub(crate) fn infer(&mut self) -> Result<Type> {
        self.infer_node(self.ast.root())
    }

    pub(crate) fn infer_node(&mut self, id: NodeId) -> Result<Type> {
        let max_depth = self.env.options().execution.max_depth;
        if self.depth >= max_depth {
            return Err(Error::DepthExceeded {
                depth: self.depth,
                max_depth,
            });
        }
        self.depth += 1;
        let result = self.infer_inner(id);
        self.depth -= 1;
        result
    }

    fn infer_all(&mut self, ids: &[NodeId]) -> Result<Vec<Type>> {
        ids.iter().map(|id| self.infer_node(*id)).collect()
    }

    /// Fold `apply` left to right over the children's types.
    fn chain(
        &mut self,
        kind: &NodeKind,
        children: &[NodeId],
        mut apply: impl FnMut(usize, &Type, &Type) -> Result<Type>,
    ) -> Result<Type> {
        let (first, rest) = children.split_first().ok_or_else(|| malformed(kind))?;
        let mut acc = self.infer_node(*first)?;
        for (i, child) in rest.iter().enumerate() {
            let rhs = self.infer_node(*child)?;
            acc = apply(i, &acc, &rhs)?;
        }
        Ok(acc)
    }

    fn infer_inner(&mut self, id: NodeId) -> Result<Type> {
        let node = self.ast.node(id);
        let children = node.children();
        let kind = node.kind();
        match kind {
            NodeKind::Constant(value) => Ok(value.ty()),
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
                    let ty = self.infer_node(*child)?;
                    operators::require_boolean(&ty, &format!("operand of {op}"))?;
                }
                Ok(Type::Boolean)
            }
            NodeKind::Relational(op) => {
                let [left, right] = children else {
                    return Err(malformed(kind));
                };
                let left = self.infer_node(*left)?;
                let right = self.infer_node(*right)?;
                operators::relational(*op, &left, &right)
            }
            NodeKind::Unary(op) => {
                let [operand] = children else {
                    return Err(malformed(kind));
                };
                let operand = self.infer_node(*operand)?;
                operators::unary(*op, &operand)
            }

            NodeKind::FunctionalIf => {
                let [condition, then_branch, else_branch] = children else {
                    return Err(malformed(kind));
                };
                let condition = self.infer_node(*condition)?;
                operators::require_boolean(&condition, "condition")?;
                let then_type = self.infer_node(*then_branch)?;
                let else_type = self.infer_node(*else_branch)?;
                Ok(least_upper_bound(&then_type, &else_type))
            }

            NodeKind::ArrayConstruct => {
                let types = self.infer_all(children)?;
                Ok(Type::array(least_upper_bound_of(&types)))
            }
            NodeKind::MatrixConstruct { .. } => {
                let types = self.infer_all(children)?;
                Ok(Type::matrix(least_upper_bound_of(&types).matrix_element()?))
            }
            NodeKind::RangeMatrix { .. } => {
                let bounds = self.infer_all(children)?;
                let mut element_types = Vec::new();
                for triple in bounds.chunks(3) {
                    let [start, step, end] = triple else {
                        return Err(malformed(kind));
                    };
                    element_types.push(operators::sequence_element(start, step, end)?);
                }
                Ok(Type::matrix(least_upper_bound_of(&element_types).matrix_element()?))
            }
            NodeKind::RecordConstruct(labels) => {
                let types = self.infer_all(children)?;
                Ok(Type::record(labels.iter().cloned().zip(types)))
            }
            NodeKind::UnionConstruct(label) => {
                let [value] = children else {
                    return Err(malformed(kind));
                };
                let ty = self.infer_node(*value)?;
                Ok(Type::union([(label.clone(), ty)]))
            }

            NodeKind::MethodCall(name) => self.method_call(kind, name, children),
            NodeKind::FunctionApplication(name) => {
                self.application(kind, name.as_deref(), children)
            }

            NodeKind::FunctionDefinition(params) => {
                let [body] = children else {
                    return Err(malformed(kind));
                };
                let scope = TypeScope::new(params, self.scope);
                let ret = TypeInference::new(self.ast, &scope, self.env)
                    .with_depth(self.depth)
                    .infer_node(*body)?;
                Ok(Type::function(
                    params.iter().map(|(_, ty)| ty.clone()).collect(),
                    ret,
                ))
            }
        }
    }

    fn identifier(&self, name: &str) -> Result<Type> {
        if let Some(ty) = self.scope.get_type(name)? {
            return Ok(ty);
        }
        match self.env.constants().get(name) {
            Some(value) => Ok(value.ty()),
            None => Err(Error::UndefinedIdentifier(name.to_string())),
        }
    }

    fn resolve(&self, name: &str, kind: OperationKind, arg_types: &[Type]) -> Result<Type> {
        if arg_types.iter().any(is_open) {
            return Ok(Type::General);
        }
        self.env
            .resolver()
            .resolve(name, kind, arg_types)
            .return_type()
    }

    fn method_call(&mut self, kind: &NodeKind, name: &str, children: &[NodeId]) -> Result<Type> {
        let [receiver, args @ ..] = children else {
            return Err(malformed(kind));
        };
        let receiver = self.infer_node(*receiver)?;
        if args.is_empty() {
            match &receiver {
                Type::Record(fields) | Type::Union(fields) => {
                    if let Some(ty) = fields.get(name) {
                        return Ok(ty.clone());
                    }
                }
                _ => {}
            }
        }
        let mut arg_types = vec![receiver];
        arg_types.extend(self.infer_all(args)?);
        self.resolve(name, OperationKind::Method, &arg_types)
    }

    fn application(
        &mut self,
        kind: &NodeKind,
        name: Option<&str>,
        children: &[NodeId],
    ) -> Result<Type> {
        let [callee, args @ ..] = children else {
            return Err(malformed(kind));
        };
        if let Some(name) = name {
            if let Some(callee) = self.scope.get_type(name)? {
                return self.apply(callee, args);
            }
            if let Some(pseudo) = PseudoFunction::lookup(name) {
                return self.pseudo(pseudo, args);
            }
            let arg_types = self.infer_all(args)?;
            return self.resolve(name, OperationKind::Function, &arg_types);
        }
        let callee = self.infer_node(*callee)?;
        self.apply(callee, args)
    }

    /// Type of applying a value of type `callee`: indexing or a closure call.
    fn apply(&mut self, callee: Type, args: &[NodeId]) -> Result<Type> {
        let arg_types = self.infer_all(args)?;
        match callee {
            Type::General | Type::Unknown => Ok(Type::General),
            Type::Array(element) => {
                check_indices(&arg_types, 1, "an array")?;
                Ok(*element)
            }
            Type::Matrix(element) => {
                check_indices(&arg_types, 2, "a matrix")?;
                Ok(*element)
            }
            Type::Function(function) => {
                if function.params.len() != arg_types.len() {
                    return Err(Error::type_error(format!(
                        "function expects {} arguments, got {}",
                        function.params.len(),
                        arg_types.len()
                    )));
                }
                for (arg, param) in arg_types.iter().zip(&function.params) {
                    if !is_open(arg) && !is_lower_or_equal(arg, param) {
                        return Err(Error::type_error(format!(
                            "cannot pass {arg} as a parameter of type {param}"
                        )));
                    }
                }
                Ok(function.ret)
            }
            scalar if scalar.is_scalar() && !arg_types.is_empty() => {
                if arg_types.len() > 2 {
                    return Err(evaluator::scalar_index_count(arg_types.len()));
                }
                check_indices(&arg_types, arg_types.len(), "a scalar")?;
                Ok(scalar)
            }
            other => Err(Error::type_error(format!(
                "a value of type {other} cannot be applied to arguments"
            ))),
        }
    }

    /// Evaluate an argument that does not depend on the scope.
    fn static_value(&self, id: NodeId, pseudo: PseudoFunction) -> Result<crate::values::Value> {
        pseudo::require_static(self.ast, id, pseudo)?;
        evaluator::evaluate_node(self.ast, id, self.scope, self.env, self.depth)
    }

    fn pseudo(&mut self, pseudo: PseudoFunction, args: &[NodeId]) -> Result<Type> {
        pseudo.check_arity(args.len())?;
        match pseudo {
            PseudoFunction::Cast => {
                let target = self.infer_node(args[0])?;
                let source = self.infer_node(args[1])?;
                if is_open(&source) || is_lower_or_equal(&source, &target) {
                    Ok(target)
                } else {
                    Err(Error::type_error(format!(
                        "cannot cast {source} to {target} without loss"
                    )))
                }
            }
            PseudoFunction::Fix => {
                let value = self.infer_node(args[0])?;
                let total = self.static_value(args[1], pseudo)?;
                let integer = self.static_value(args[2], pseudo)?;
                pseudo::fix_type(&value, pseudo::fix_precision(&total, &integer)?)
            }
            PseudoFunction::Eval => {
                let source = self.infer_node(args[0])?;
                require_string(&source, pseudo)?;
                if !self.ast.is_static(args[0]) {
                    return Ok(Type::General);
                }
                let source = self.static_value(args[0], pseudo)?;
                let nested = parser::parse_in(pseudo::expect_string(&source, pseudo)?, self.env)?;
                TypeInference::new(&nested, self.scope, self.env)
                    .with_depth(self.depth)
                    .infer()
            }
            PseudoFunction::External => {
                let expression = self.infer_node(args[0])?;
                require_string(&expression, pseudo)?;
                let Some(engine) = self.env.external() else {
                    return Ok(Type::General);
                };
                if !self.ast.is_static(args[0]) {
                    return Ok(Type::General);
                }
                let expression = self.static_value(args[0], pseudo)?;
                Ok(engine.result_type(pseudo::expect_string(&expression, pseudo)?))
            }
            PseudoFunction::Fold => {
                let function = self.infer_node(args[0])?;
                let initial = self.infer_node(args[1])?;
                let iterable = self.infer_node(args[2])?;
                if !matches!(iterable, Type::Array(_) | Type::Object(_)) && !is_open(&iterable) {
                    return Err(Error::type_error(format!(
                        "{pseudo} cannot iterate over {iterable}"
                    )));
                }
                match function {
                    Type::Function(f) if f.params.len() == 2 => {
                        Ok(least_upper_bound(&initial, &f.ret))
                    }
                    Type::General | Type::Unknown => Ok(Type::General),
                    other => Err(Error::type_error(format!(
                        "{pseudo} expects a two-argument function, found {other}"
                    ))),
                }
            }
            PseudoFunction::Object => {
                let class = self.static_value(args[0], pseudo)?;
                Ok(Type::object(pseudo::expect_string(&class, pseudo)?))
            }
        }
    }
}

fn require_string(ty: &Type, pseudo: PseudoFunction) -> Result<()> {
    if *ty == Type::String || is_open(ty) {
        Ok(())
    } else {
        Err(Error::type_error(format!(
            "{pseudo} expects a string, found {ty}"
        )))
    }
}

/// Index arguments must be integral; `count` of them are expected.
pub(crate) fn check_indices(types: &[Type], count: usize, what: &str) -> Result<()> {
    if types.len() != count {
        return Err(Error::type_error(format!(
            "{what} takes {count} indices, found {}",
            types.len()
        )));
    }
    match types.iter().find(|ty| !ty.is_integral() && !is_open(ty)) {
        Some(ty) => Err(Error::type_error(format!("index must be an integer, found {ty}"))),
        None => Ok(()),
    }
}

#[cfg(test)]
#[path = "inference_test.rs"]
mod inference_test;
