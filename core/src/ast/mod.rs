//! Arena-allocated expression trees.
//!
//! Nodes live in a flat `Vec` and refer to their children by [`NodeId`].
//! Each node carries two caches shared by both visitors: the parse-time
//! `constant` flag and a write-once value cell. Cloning an [`Ast`] copies the
//! arena, so clones never alias each other's caches.

use std::collections::BTreeSet;
use std::fmt;

use once_cell::sync::OnceCell;
use smallvec::SmallVec;

use crate::errors::Result;
use crate::scope::Scope;
use crate::syntax::{BitwiseOp, LogicalOp, ProductOp, RelationalOp, ShiftOp, SumOp, UnaryOp};
use crate::types::Type;
use crate::values::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A literal, or an identifier pre-resolved by specialization.
    Constant(Value),
    Identifier(String),
    /// `ops[i]` sits between children `i` and `i + 1`.
    Sum(Vec<SumOp>),
    Product(Vec<ProductOp>),
    Power,
    Shift(Vec<ShiftOp>),
    Bitwise(BitwiseOp),
    Logical(LogicalOp),
    Relational(RelationalOp),
    Unary(UnaryOp),
    /// Children: condition, then-branch, else-branch.
    FunctionalIf,
    ArrayConstruct,
    /// Children are the elements in row-major order.
    MatrixConstruct { rows: usize, cols: usize },
    /// Rows given as `start:step:end`; three children per row.
    RangeMatrix { rows: usize },
    RecordConstruct(Vec<String>),
    UnionConstruct(String),
    /// First child is the callee, the rest are arguments. The name is set
    /// when the callee is a bare identifier.
    FunctionApplication(Option<String>),
    /// First child is the receiver, the rest are arguments.
    MethodCall(String),
    /// The only child is the body.
    FunctionDefinition(Vec<(String, Type)>),
}

impl NodeKind {
    /// Short name used by traces and debug dumps.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Constant(_) => "Constant",
            NodeKind::Identifier(_) => "Identifier",
            NodeKind::Sum(_) => "Sum",
            NodeKind::Product(_) => "Product",
            NodeKind::Power => "Power",
            NodeKind::Shift(_) => "Shift",
            NodeKind::Bitwise(_) => "Bitwise",
            NodeKind::Logical(_) => "Logical",
            NodeKind::Relational(_) => "Relational",
            NodeKind::Unary(_) => "Unary",
            NodeKind::FunctionalIf => "FunctionalIf",
            NodeKind::ArrayConstruct => "ArrayConstruct",
            NodeKind::MatrixConstruct { .. } => "MatrixConstruct",
            NodeKind::RangeMatrix { .. } => "RangeMatrix",
            NodeKind::RecordConstruct(_) => "RecordConstruct",
            NodeKind::UnionConstruct(_) => "UnionConstruct",
            NodeKind::FunctionApplication(_) => "FunctionApplication",
            NodeKind::MethodCall(_) => "MethodCall",
            NodeKind::FunctionDefinition(_) => "FunctionDefinition",
        }
    }

    /// Whether the node can be folded once its children are all constant.
    fn foldable(&self) -> bool {
        match self {
            NodeKind::Constant(_) => true,
            NodeKind::Identifier(_)
            | NodeKind::MethodCall(_)
            | NodeKind::FunctionApplication(_)
            | NodeKind::FunctionDefinition(_) => false,
            _ => true,
        }
    }

    fn is_primary(&self) -> bool {
        matches!(
            self,
            NodeKind::Constant(_)
                | NodeKind::Identifier(_)
                | NodeKind::ArrayConstruct
                | NodeKind::MatrixConstruct { .. }
                | NodeKind::RangeMatrix { .. }
                | NodeKind::RecordConstruct(_)
                | NodeKind::UnionConstruct(_)
                | NodeKind::FunctionApplication(_)
                | NodeKind::MethodCall(_)
        )
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    children: SmallVec<[NodeId; 4]>,
    constant: bool,
    cache: OnceCell<Value>,
}

impl Node {
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Decided once when the node is built, never recomputed.
    pub fn is_constant(&self) -> bool {
        self.constant
    }

    pub fn cached(&self) -> Option<&Value> {
        self.cache.get()
    }

    /// Store the value of a constant node. Later stores are ignored.
    pub(crate) fn remember(&self, value: &Value) {
        if self.constant {
            let _ = self.cache.set(value.clone());
        }
    }
}

#[derive(Debug, Clone)]
pub struct Ast {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Ast {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Copy the subtree rooted at `id` into a fresh arena with empty caches.
    pub fn subtree(&self, id: NodeId) -> Ast {
        let mut builder = AstBuilder::new();
        let root = self.copy_into(&mut builder, id);
        builder.finish(root)
    }

    fn copy_into(&self, builder: &mut AstBuilder, id: NodeId) -> NodeId {
        let node = self.node(id);
        let children: SmallVec<[NodeId; 4]> = node
            .children
            .iter()
            .map(|child| self.copy_into(builder, *child))
            .collect();
        builder.push_node(node.kind.clone(), children, node.constant)
    }

    /// Copy the subtree at `id`, replacing every free identifier that
    /// `scope` binds (and that is not in `bound`) with its current value.
    ///
    /// Identifiers the scope does not know are kept and looked up when the
    /// copy is evaluated.
    pub fn specialize(&self, id: NodeId, bound: &[String], scope: &dyn Scope) -> Result<Ast> {
        let mut builder = AstBuilder::new();
        let mut bound: Vec<String> = bound.to_vec();
        let root = self.specialize_into(&mut builder, id, &mut bound, scope)?;
        Ok(builder.finish(root))
    }

    fn specialize_into(
        &self,
        builder: &mut AstBuilder,
        id: NodeId,
        bound: &mut Vec<String>,
        scope: &dyn Scope,
    ) -> Result<NodeId> {
        let node = self.node(id);
        match &node.kind {
            NodeKind::Identifier(name) if !bound.contains(name) => {
                if let Some(value) = scope.get(name)? {
                    return Ok(builder.constant(value));
                }
                Ok(builder.identifier(name.clone()))
            }
            NodeKind::FunctionDefinition(params) => {
                let depth = bound.len();
                bound.extend(params.iter().map(|(name, _)| name.clone()));
                let body = self.specialize_into(builder, node.children[0], bound, scope);
                bound.truncate(depth);
                Ok(builder.push(node.kind.clone(), [body?]))
            }
            NodeKind::FunctionApplication(Some(_)) => {
                let mut children = SmallVec::<[NodeId; 4]>::new();
                for child in node.children.iter() {
                    children.push(self.specialize_into(builder, *child, bound, scope)?);
                }
                // A callee resolved to a value is no longer a named operation.
                let kind = match builder.kind(children[0]) {
                    NodeKind::Constant(_) => NodeKind::FunctionApplication(None),
                    _ => node.kind.clone(),
                };
                Ok(builder.push(kind, children))
            }
            kind => {
                let mut children = SmallVec::<[NodeId; 4]>::new();
                for child in node.children.iter() {
                    children.push(self.specialize_into(builder, *child, bound, scope)?);
                }
                Ok(builder.push(kind.clone(), children))
            }
        }
    }

    /// Identifiers referenced under `id` that no enclosing function
    /// definition inside the subtree binds. Callee names are included.
    pub fn free_identifiers(&self, id: NodeId) -> BTreeSet<String> {
        let mut free = BTreeSet::new();
        let mut bound = Vec::new();
        self.collect_free(id, &mut bound, &mut free);
        free
    }

    /// Whether the subtree at `id` can be evaluated without a scope.
    pub fn is_static(&self, id: NodeId) -> bool {
        self.node(id).constant || self.free_identifiers(id).is_empty()
    }

    fn collect_free(&self, id: NodeId, bound: &mut Vec<String>, free: &mut BTreeSet<String>) {
        let node = self.node(id);
        match &node.kind {
            NodeKind::Identifier(name) => {
                if !bound.contains(name) {
                    free.insert(name.clone());
                }
            }
            NodeKind::FunctionDefinition(params) => {
                let depth = bound.len();
                bound.extend(params.iter().map(|(name, _)| name.clone()));
                for child in node.children.iter() {
                    self.collect_free(*child, bound, free);
                }
                bound.truncate(depth);
            }
            _ => {
                for child in node.children.iter() {
                    self.collect_free(*child, bound, free);
                }
            }
        }
    }

    /// Render the tree back to parseable source text.
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = self.write_source(&mut out, self.root);
        out
    }

    pub fn source_of(&self, id: NodeId) -> String {
        let mut out = String::new();
        let _ = self.write_source(&mut out, id);
        out
    }

    fn write_operand(&self, out: &mut impl fmt::Write, id: NodeId) -> fmt::Result {
        if self.kind(id).is_primary() {
            self.write_source(out, id)
        } else {
            write!(out, "(")?;
            self.write_source(out, id)?;
            write!(out, ")")
        }
    }

    fn write_list(&self, out: &mut impl fmt::Write, ids: &[NodeId]) -> fmt::Result {
        for (i, id) in ids.iter().enumerate() {
            if i > 0 {
                write!(out, ", ")?;
            }
            self.write_source(out, *id)?;
        }
        Ok(())
    }

    fn write_chain<Op: fmt::Display>(
        &self,
        out: &mut impl fmt::Write,
        children: &[NodeId],
        mut op_at: impl FnMut(usize) -> Op,
    ) -> fmt::Result {
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                write!(out, " {} ", op_at(i - 1))?;
            }
            self.write_operand(out, *child)?;
        }
        Ok(())
    }

    fn write_source(&self, out: &mut impl fmt::Write, id: NodeId) -> fmt::Result {
        let children = self.children(id);
        match self.kind(id) {
            NodeKind::Constant(value) => match value {
                Value::Double(_) | Value::Float(_) | Value::Long(_) | Value::Int(_) | Value::Short(_)
                    if value.as_f64().is_some_and(|v| v < 0.0) =>
                {
                    write!(out, "({value})")
                }
                _ => write!(out, "{value}"),
            },
            NodeKind::Identifier(name) => write!(out, "{name}"),
            NodeKind::Sum(ops) => self.write_chain(out, children, |i| ops[i]),
            NodeKind::Product(ops) => self.write_chain(out, children, |i| ops[i]),
            NodeKind::Shift(ops) => self.write_chain(out, children, |i| ops[i]),
            NodeKind::Power => self.write_chain(out, children, |_| "^"),
            NodeKind::Bitwise(op) => self.write_chain(out, children, |_| *op),
            NodeKind::Logical(op) => self.write_chain(out, children, |_| *op),
            NodeKind::Relational(op) => self.write_chain(out, children, |_| *op),
            NodeKind::Unary(op) => {
                write!(out, "{op}")?;
                self.write_operand(out, children[0])
            }
            NodeKind::FunctionalIf => {
                self.write_operand(out, children[0])?;
                write!(out, " ? ")?;
                self.write_operand(out, children[1])?;
                write!(out, " : ")?;
                self.write_operand(out, children[2])
            }
            NodeKind::ArrayConstruct => {
                write!(out, "[")?;
                self.write_list(out, children)?;
                write!(out, "]")
            }
            NodeKind::MatrixConstruct { rows, cols } => {
                write!(out, "[")?;
                for row in 0..*rows {
                    if row > 0 {
                        write!(out, "; ")?;
                    }
                    self.write_list(out, &children[row * cols..(row + 1) * cols])?;
                }
                if *rows == 1 {
                    write!(out, ";")?;
                }
                write!(out, "]")
            }
            NodeKind::RangeMatrix { .. } => {
                write!(out, "[")?;
                for (row, bounds) in children.chunks(3).enumerate() {
                    if row > 0 {
                        write!(out, "; ")?;
                    }
                    for (i, bound) in bounds.iter().enumerate() {
                        if i > 0 {
                            write!(out, ":")?;
                        }
                        self.write_source(out, *bound)?;
                    }
                }
                write!(out, "]")
            }
            NodeKind::RecordConstruct(labels) => {
                write!(out, "{{")?;
                for (i, (label, child)) in labels.iter().zip(children).enumerate() {
                    if i > 0 {
                        write!(out, ", ")?;
                    }
                    write!(out, "{label} = ")?;
                    self.write_source(out, *child)?;
                }
                write!(out, "}}")
            }
            NodeKind::UnionConstruct(label) => {
                write!(out, "{{|{label} = ")?;
                self.write_source(out, children[0])?;
                write!(out, "|}}")
            }
            NodeKind::FunctionApplication(_) => {
                self.write_operand(out, children[0])?;
                write!(out, "(")?;
                self.write_list(out, &children[1..])?;
                write!(out, ")")
            }
            NodeKind::MethodCall(name) => {
                self.write_operand(out, children[0])?;
                write!(out, ".{name}(")?;
                self.write_list(out, &children[1..])?;
                write!(out, ")")
            }
            NodeKind::FunctionDefinition(params) => {
                write!(out, "function(")?;
                for (i, (name, ty)) in params.iter().enumerate() {
                    if i > 0 {
                        write!(out, ", ")?;
                    }
                    match ty {
                        Type::General => write!(out, "{name}")?,
                        ty => write!(out, "{name}:{ty}")?,
                    }
                }
                write!(out, ") ")?;
                self.write_source(out, children[0])
            }
        }
    }

    /// Indented one-node-per-line dump, used by `--debug-ast`.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, self.root, 0);
        out
    }

    fn dump_into(&self, out: &mut String, id: NodeId, depth: usize) {
        let node = self.node(id);
        out.push_str(&"  ".repeat(depth));
        out.push_str(node.kind.name());
        match &node.kind {
            NodeKind::Constant(value) => out.push_str(&format!(" {value}")),
            NodeKind::Identifier(name) | NodeKind::MethodCall(name) => out.push_str(&format!(" {name}")),
            NodeKind::FunctionApplication(Some(name)) => out.push_str(&format!(" {name}")),
            _ => {}
        }
        if node.constant {
            out.push_str(" [constant]");
        }
        out.push('\n');
        for child in node.children.iter() {
            self.dump_into(out, *child, depth + 1);
        }
    }
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_source(f, self.root)
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Appends nodes bottom-up and decides each node's constancy as it goes.
#[derive(Debug, Default)]
pub struct AstBuilder {
    nodes: Vec<Node>,
    fold_constants: bool,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            fold_constants: true,
        }
    }

    /// A builder that marks no node constant, disabling memoization.
    pub fn without_folding() -> Self {
        Self {
            nodes: Vec::new(),
            fold_constants: false,
        }
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push_node(&mut self, kind: NodeKind, children: SmallVec<[NodeId; 4]>, constant: bool) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            children,
            constant,
            cache: OnceCell::new(),
        });
        id
    }

    pub fn push(&mut self, kind: NodeKind, children: impl IntoIterator<Item = NodeId>) -> NodeId {
        let children: SmallVec<[NodeId; 4]> = children.into_iter().collect();
        let constant = self.fold_constants
            && kind.foldable()
            && children.iter().all(|child| self.nodes[child.index()].constant);
        self.push_node(kind, children, constant)
    }

    pub fn constant(&mut self, value: Value) -> NodeId {
        self.push(NodeKind::Constant(value), [])
    }

    pub fn identifier(&mut self, name: impl Into<String>) -> NodeId {
        self.push(NodeKind::Identifier(name.into()), [])
    }

    pub fn finish(self, root: NodeId) -> Ast {
        Ast {
            nodes: self.nodes,
            root,
        }
    }
}

#[cfg(test)]
#[path = "ast_test.rs"]
mod ast_test;
