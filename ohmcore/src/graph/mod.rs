//! Parameter, expression and literal graph.
//!
//! A [`Generation`] is one immutable snapshot of the graph. Nodes live in a
//! slotmap arena and are addressed by version-tagged [`NodeId`]s; a separate
//! table records, for every node, the expressions using it. Ids are only
//! meaningful inside the generation that issued them.
use std::sync::Arc;

use slotmap::{SecondaryMap, SlotMap, new_key_type};
use smallvec::SmallVec;

pub mod builder;
pub mod node;
pub mod operator;
pub mod provenance;

pub use builder::GraphBuilder;
pub use node::{
    Constant, Domain, Expression, LiteralNode, Node, NodeKind, Parameter, ParameterFlags,
};
pub use operator::{Arity, Operator, OperatorFlags};
pub use provenance::{Origin, OriginTable, Provenance};

use crate::{
    name::ShortName,
    utils::error::{SolverError, SolverResult},
};

new_key_type! {
    /// Handle of a node inside one generation.
    pub struct NodeId;
}

/// A node together with the origins it derives from.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    pub node: Node,
    pub provenance: Provenance,
}

#[derive(Debug, Clone)]
pub struct Generation {
    index: usize,
    nodes: SlotMap<NodeId, NodeData>,
    order: Vec<NodeId>,
    users: SecondaryMap<NodeId, SmallVec<[NodeId; 4]>>,
    origins: Arc<OriginTable>,
}

impl Generation {
    pub(crate) fn new(index: usize, origins: Arc<OriginTable>) -> Self {
        Self {
            index,
            nodes: SlotMap::with_key(),
            order: Vec::new(),
            users: SecondaryMap::new(),
            origins,
        }
    }

    pub(crate) fn set_origins(&mut self, origins: Arc<OriginTable>) {
        self.origins = origins;
    }

    fn link(&mut self, id: NodeId) {
        let operands: SmallVec<[NodeId; 3]> = self.nodes[id].node.operands().into();
        for operand in operands {
            let users = self.users.entry(operand).map(|e| e.or_default());
            if let Some(users) = users {
                if !users.contains(&id) {
                    users.push(id);
                }
            }
        }
    }

    fn unlink(&mut self, id: NodeId) {
        let operands: SmallVec<[NodeId; 3]> = self.nodes[id].node.operands().into();
        for operand in operands {
            if let Some(users) = self.users.get_mut(operand) {
                users.retain(|user| *user != id);
            }
        }
    }

    /// Append a node. Operands must already be part of this generation.
    pub(crate) fn insert(&mut self, node: Node, provenance: Provenance) -> SolverResult<NodeId> {
        if let Some(missing) = node.operands().iter().find(|op| !self.nodes.contains_key(**op)) {
            return Err(SolverError::UnknownNode(*missing));
        }
        let id = self.nodes.insert(NodeData { node, provenance });
        self.users.insert(id, SmallVec::new());
        self.order.push(id);
        self.link(id);
        Ok(id)
    }

    /// Swap the content of a node that is still being built, keeping its id.
    pub(crate) fn replace(&mut self, id: NodeId, node: Node, provenance: Provenance) -> SolverResult<()> {
        if !self.nodes.contains_key(id) {
            return Err(SolverError::UnknownNode(id));
        }
        if let Some(missing) = node.operands().iter().find(|op| !self.nodes.contains_key(**op)) {
            return Err(SolverError::UnknownNode(*missing));
        }
        self.unlink(id);
        self.nodes[id] = NodeData { node, provenance };
        self.link(id);
        Ok(())
    }

    /// Remove a node and, transitively, every expression using it. Returns the
    /// removed ids.
    pub(crate) fn remove_cascade(&mut self, id: NodeId) -> Vec<NodeId> {
        let mut removed = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if !self.nodes.contains_key(next) {
                continue;
            }
            if let Some(users) = self.users.remove(next) {
                stack.extend(users);
            }
            self.unlink(next);
            self.nodes.remove(next);
            removed.push(next);
        }
        self.order.retain(|id| !removed.contains(id));
        removed
    }

    pub(crate) fn merge_provenance(&mut self, id: NodeId, provenance: &Provenance) {
        if let Some(data) = self.nodes.get_mut(id) {
            data.provenance.merge(provenance);
        }
    }

    /// Position of this generation in its solve; the front-end builds generation 0.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id)
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id).map(|data| &data.node)
    }

    #[inline]
    pub fn provenance(&self, id: NodeId) -> Option<&Provenance> {
        self.nodes.get(id).map(|data| &data.provenance)
    }

    pub fn parameter(&self, id: NodeId) -> Option<&Parameter> {
        self.node(id).and_then(Node::try_as_parameter_ref)
    }

    pub fn expression(&self, id: NodeId) -> Option<&Expression> {
        self.node(id).and_then(Node::try_as_expression_ref)
    }

    pub fn literal(&self, id: NodeId) -> Option<&LiteralNode> {
        self.node(id).and_then(Node::try_as_literal_ref)
    }

    /// Expressions that have `id` as an operand, in first-use order.
    pub fn users(&self, id: NodeId) -> &[NodeId] {
        self.users.get(id).map(|u| u.as_slice()).unwrap_or(&[])
    }

    #[inline]
    pub fn origins(&self) -> &Arc<OriginTable> {
        &self.origins
    }

    /// Node ids in insertion order.
    #[inline]
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    /// All nodes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &NodeData)> + '_ {
        self.order.iter().map(|id| (*id, &self.nodes[*id]))
    }

    pub fn parameters(&self) -> impl Iterator<Item = (NodeId, &Parameter)> + '_ {
        self.iter()
            .filter_map(|(id, data)| data.node.try_as_parameter_ref().map(|p| (id, p)))
    }

    pub fn expressions(&self) -> impl Iterator<Item = (NodeId, &Expression)> + '_ {
        self.iter()
            .filter_map(|(id, data)| data.node.try_as_expression_ref().map(|e| (id, e)))
    }

    pub fn literals(&self) -> impl Iterator<Item = (NodeId, &LiteralNode)> + '_ {
        self.iter()
            .filter_map(|(id, data)| data.node.try_as_literal_ref().map(|l| (id, l)))
    }

    pub fn constants(&self) -> impl Iterator<Item = (NodeId, &Constant)> + '_ {
        self.iter()
            .filter_map(|(id, data)| data.node.try_as_constant_ref().map(|c| (id, c)))
    }

    /// Parameters ordered by their earliest origin, ties in insertion order.
    ///
    /// Rewrites keep provenance, so this order is the same in every
    /// generation of a solve.
    pub fn parameters_by_origin(&self) -> Vec<NodeId> {
        let mut ids: Vec<_> = self.parameters().map(|(id, _)| id).collect();
        ids.sort_by_key(|id| self.nodes[*id].provenance.first());
        ids
    }

    /// Number of expressions carrying `op`.
    pub fn count_op(&self, op: Operator) -> usize {
        self.expressions().filter(|(_, e)| e.op == op).count()
    }

    /// Node ids ordered so every operand precedes its users. Ties follow
    /// insertion order.
    pub fn topological_order(&self) -> Vec<NodeId> {
        let mut visited: SecondaryMap<NodeId, ()> = SecondaryMap::new();
        let mut out = Vec::with_capacity(self.len());
        for root in &self.order {
            if visited.contains_key(*root) {
                continue;
            }
            // (node, operands already pushed)
            let mut stack: Vec<(NodeId, bool)> = vec![(*root, false)];
            while let Some((id, expanded)) = stack.pop() {
                if expanded {
                    if visited.insert(id, ()).is_none() {
                        out.push(id);
                    }
                    continue;
                }
                if visited.contains_key(id) {
                    continue;
                }
                stack.push((id, true));
                for operand in self.nodes[id].node.operands().iter().rev() {
                    if !visited.contains_key(*operand) {
                        stack.push((*operand, false));
                    }
                }
            }
        }
        out
    }

    /// First expression whose operator is outside the canonical basis, or
    /// first raw constant.
    pub fn first_non_canonical(&self) -> Option<(NodeId, Option<Operator>)> {
        self.iter().find_map(|(id, data)| match &data.node {
            Node::Expression(expr) if !expr.op.is_canonical() => Some((id, Some(expr.op))),
            Node::Constant(_) => Some((id, None)),
            _ => None,
        })
    }

    #[inline]
    pub fn is_canonical(&self) -> bool {
        self.first_non_canonical().is_none()
    }

    /// Check structural invariants: every operand exists, every node carries
    /// provenance and every expression has a legal operand count.
    pub fn validate(&self) -> SolverResult<()> {
        for (id, data) in self.iter() {
            if data.provenance.is_empty() {
                return Err(SolverError::MissingProvenance(id));
            }
            if let Node::Expression(expr) = &data.node {
                if let Some(operand) = expr.operands.iter().find(|op| !self.contains(**op)) {
                    return Err(SolverError::DanglingOperand {
                        node: id,
                        operand: *operand,
                        generation: self.index,
                    });
                }
                if !expr.op.arity().accepts(expr.operands.len()) {
                    return Err(SolverError::Arity {
                        op: expr.op,
                        expected: expr.op.arity(),
                        found: expr.operands.len(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Render a node for log messages.
    pub fn display(&self, id: NodeId) -> impl std::fmt::Display + '_ {
        struct Fmt<'a> {
            generation: &'a Generation,
            id: NodeId,
        }

        impl std::fmt::Display for Fmt<'_> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let generation = self.generation;
                match generation.node(self.id) {
                    None => write!(f, "<{:?}>", self.id),
                    Some(Node::Parameter(p)) => match &p.name {
                        Some(name) => write!(f, "{}", name),
                        None => {
                            let position = generation
                                .parameters_by_origin()
                                .iter()
                                .position(|id| *id == self.id)
                                .unwrap_or_default();
                            write!(f, "{}", ShortName(position))
                        }
                    },
                    Some(Node::Literal(lit)) => write!(f, "{}", lit.value),
                    Some(Node::Constant(c)) => write!(f, "{:?}", c),
                    Some(Node::Expression(expr)) => {
                        write!(f, "{}(", expr.op)?;
                        for (index, operand) in expr.operands.iter().enumerate() {
                            if index > 0 {
                                write!(f, ", ")?;
                            }
                            write!(f, "{}", generation.display(*operand))?;
                        }
                        write!(f, ")")?;
                        if expr.constrained {
                            write!(f, "!")?;
                        }
                        Ok(())
                    }
                }
            }
        }

        Fmt {
            generation: self,
            id,
        }
    }
}
