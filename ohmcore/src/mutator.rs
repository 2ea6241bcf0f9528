//! Producing the next generation from the current one.
//!
//! A [`Mutator`] reads an input [`Generation`] and lazily builds an output
//! generation. Untouched nodes are copied verbatim (operands first); mutated,
//! created and removed nodes mark the output dirty. The input is never
//! modified.
use std::collections::HashMap;

use ohmsets::Literal;
use slotmap::SecondaryMap;

use crate::{
    ext::ohmlog::Diagnostics,
    graph::{Expression, Generation, LiteralNode, Node, NodeId, Operator, Parameter, Provenance},
    ohmdebug, ohmtrace,
    utils::error::{SolverError, SolverResult},
};

/// Operand of a node written by a pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A node of the input generation, copied on demand.
    Input(NodeId),
    /// A node already present in the output generation.
    Output(NodeId),
    /// A fresh literal node inheriting the provenance of its user.
    Literal(Literal),
}

impl From<NodeId> for Operand {
    fn from(id: NodeId) -> Self {
        Operand::Input(id)
    }
}

impl From<Literal> for Operand {
    fn from(literal: Literal) -> Self {
        Operand::Literal(literal)
    }
}

/// Replacement for some fields of an expression. Fields left `None` keep the
/// input's value.
#[derive(Debug, Clone, Default)]
pub struct ExpressionEdit {
    pub op: Option<Operator>,
    pub operands: Option<Vec<Operand>>,
    pub constrained: Option<bool>,
}

impl ExpressionEdit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn op(mut self, op: Operator) -> Self {
        self.op = Some(op);
        self
    }

    pub fn operands<T: Into<Operand>>(mut self, operands: impl IntoIterator<Item = T>) -> Self {
        self.operands = Some(operands.into_iter().map(Into::into).collect());
        self
    }

    pub fn constrained(mut self, constrained: bool) -> Self {
        self.constrained = Some(constrained);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutatorOptions {
    /// Reuse a structurally identical expression created earlier in the
    /// same output generation.
    pub deduplicate: bool,
}

/// Result of a pass.
#[derive(Debug)]
pub struct Mutation {
    pub generation: Generation,
    /// Anything other than a plain copy happened.
    pub dirty: bool,
    /// Input node to output node, for every surviving node.
    pub mapping: SecondaryMap<NodeId, NodeId>,
}

pub struct Mutator<'a> {
    input: &'a Generation,
    output: Generation,
    mapping: SecondaryMap<NodeId, NodeId>,
    removed: SecondaryMap<NodeId, ()>,
    dirty: bool,
    options: MutatorOptions,
    congruence: HashMap<Expression, NodeId>,
    diagnostics: &'a mut Diagnostics,
}

impl<'a> Mutator<'a> {
    pub fn new(
        input: &'a Generation,
        options: MutatorOptions,
        diagnostics: &'a mut Diagnostics,
    ) -> Self {
        Self {
            input,
            output: Generation::new(input.index() + 1, input.origins().clone()),
            mapping: SecondaryMap::new(),
            removed: SecondaryMap::new(),
            dirty: false,
            options,
            congruence: HashMap::new(),
            diagnostics,
        }
    }

    /// The generation being read. The borrow is independent of the mutator, so
    /// passes may iterate it while mutating.
    #[inline]
    pub fn input(&self) -> &'a Generation {
        self.input
    }

    /// The generation being written.
    #[inline]
    pub fn output(&self) -> &Generation {
        &self.output
    }

    #[inline]
    pub fn diagnostics(&mut self) -> &mut Diagnostics {
        &mut *self.diagnostics
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[inline]
    pub fn is_removed(&self, id: NodeId) -> bool {
        self.removed.contains_key(id)
    }

    /// Output counterpart of an input node, if it has been produced yet.
    pub fn mapped(&self, id: NodeId) -> Option<NodeId> {
        self.mapping
            .get(id)
            .copied()
            .filter(|out| self.output.contains(*out))
    }

    fn input_provenance(&self, id: NodeId) -> SolverResult<Provenance> {
        self.input
            .provenance(id)
            .cloned()
            .ok_or(SolverError::UnknownNode(id))
    }

    fn provenance_of(&self, from: &[NodeId]) -> SolverResult<Provenance> {
        let mut provenance = Provenance::new();
        for id in from {
            provenance.merge(&self.input_provenance(*id)?);
        }
        if provenance.is_empty() {
            return Err(SolverError::NoProvenance);
        }
        Ok(provenance)
    }

    /// Translate an input node into the output generation, copying it and its
    /// operands if needed. `None` if the node was removed, or is an expression
    /// over a removed node (which is then dropped as well).
    pub fn get_copy(&mut self, id: NodeId) -> SolverResult<Option<NodeId>> {
        if self.is_removed(id) {
            return Ok(None);
        }
        if let Some(out) = self.mapped(id) {
            return Ok(Some(out));
        }
        let input = self.input;
        let data = input.get(id).ok_or(SolverError::UnknownNode(id))?;

        let node = match &data.node {
            Node::Expression(expr) => {
                let mut operands = expr.operands.clone();
                for operand in operands.iter_mut() {
                    match self.get_copy(*operand)? {
                        Some(out) => *operand = out,
                        None => {
                            ohmdebug!(
                                self.diagnostics,
                                "dropping {} since one of its operands was removed",
                                input.display(id)
                            );
                            self.removed.insert(id, ());
                            self.dirty = true;
                            return Ok(None);
                        }
                    }
                }
                Node::Expression(Expression {
                    operands,
                    ..expr.clone()
                })
            }
            other => other.clone(),
        };

        let out = self.output.insert(node, data.provenance.clone())?;
        self.mapping.insert(id, out);
        Ok(Some(out))
    }

    fn resolve(&mut self, operand: Operand, provenance: &Provenance) -> SolverResult<Option<NodeId>> {
        match operand {
            Operand::Input(id) => self.get_copy(id),
            Operand::Output(id) if self.output.contains(id) => Ok(Some(id)),
            Operand::Output(id) => Err(SolverError::UnknownNode(id)),
            Operand::Literal(value) => self
                .output
                .insert(Node::Literal(value.into()), provenance.clone())
                .map(Some),
        }
    }

    fn resolve_all(
        &mut self,
        operands: Vec<Operand>,
        provenance: &Provenance,
    ) -> SolverResult<Option<Vec<NodeId>>> {
        let mut out = Vec::with_capacity(operands.len());
        for operand in operands {
            match self.resolve(operand, provenance)? {
                Some(id) => out.push(id),
                None => return Ok(None),
            }
        }
        Ok(Some(out))
    }

    /// Write the output counterpart of `id`, in place if it was already copied.
    fn emit(&mut self, id: NodeId, node: Node, provenance: Provenance) -> SolverResult<NodeId> {
        self.dirty = true;
        match self.mapped(id) {
            Some(out) => {
                self.output.replace(out, node, provenance)?;
                Ok(out)
            }
            None => {
                let out = self.output.insert(node, provenance)?;
                self.mapping.insert(id, out);
                Ok(out)
            }
        }
    }

    fn forget(&mut self, outputs: &[NodeId]) {
        let stale: Vec<NodeId> = self
            .mapping
            .iter()
            .filter(|(_, out)| outputs.contains(out))
            .map(|(id, _)| id)
            .collect();
        for id in stale {
            self.mapping.remove(id);
            self.removed.insert(id, ());
        }
    }

    /// Drop a node. Expressions using it are dropped when they get copied, or
    /// right away if they already were.
    pub fn remove(&mut self, id: NodeId) {
        self.dirty = true;
        self.removed.insert(id, ());
        if let Some(out) = self.mapping.remove(id) {
            let gone = self.output.remove_cascade(out);
            self.forget(&gone);
        }
        ohmtrace!(self.diagnostics, "removed {}", self.input.display(id));
    }

    /// Patch a parameter. Returns the output parameter, or `None` if it was
    /// removed.
    pub fn mutate_parameter(
        &mut self,
        id: NodeId,
        patch: impl FnOnce(&mut Parameter),
    ) -> SolverResult<Option<NodeId>> {
        if self.is_removed(id) {
            return Ok(None);
        }
        let current = match self.mapped(id) {
            Some(out) => self.output.parameter(out),
            None => self.input.parameter(id),
        };
        let current = current.cloned().ok_or(SolverError::NotAParameter(id))?;
        let mut patched = current.clone();
        patch(&mut patched);
        if patched == current {
            return self.get_copy(id);
        }
        let provenance = match self.mapped(id).and_then(|out| self.output.provenance(out)) {
            Some(provenance) => provenance.clone(),
            None => self.input_provenance(id)?,
        };
        self.emit(id, Node::Parameter(patched), provenance).map(Some)
    }

    /// Rewrite an expression. Operands given as [`Operand::Input`] are copied;
    /// `None` if one of them was removed, in which case the expression is
    /// removed too.
    pub fn mutate_expression(
        &mut self,
        id: NodeId,
        edit: ExpressionEdit,
    ) -> SolverResult<Option<NodeId>> {
        if self.is_removed(id) {
            return Ok(None);
        }
        let input = self.input;
        let expr = input
            .expression(id)
            .ok_or(SolverError::UnknownNode(id))?;

        let op = edit.op.unwrap_or(expr.op);
        let constrained = edit.constrained.unwrap_or(expr.constrained);
        let unchanged_operands = match &edit.operands {
            None => true,
            Some(operands) => {
                operands.len() == expr.operands.len()
                    && operands
                        .iter()
                        .zip(&expr.operands)
                        .all(|(new, old)| *new == Operand::Input(*old))
            }
        };
        if op == expr.op && constrained == expr.constrained && unchanged_operands {
            return self.get_copy(id);
        }

        let provenance = self.input_provenance(id)?;
        let operands = edit
            .operands
            .unwrap_or_else(|| expr.operands.iter().map(|o| Operand::Input(*o)).collect());
        let Some(operands) = self.resolve_all(operands, &provenance)? else {
            self.remove(id);
            return Ok(None);
        };

        let node = Node::Expression(Expression {
            op,
            operands: operands.into_iter().collect(),
            constrained,
        });
        self.emit(id, node, provenance).map(Some)
    }

    /// Rewrite every operand of an expression through `f`, keeping its operator.
    pub fn mutate_expression_with_op_map(
        &mut self,
        id: NodeId,
        mut f: impl FnMut(usize, NodeId) -> Operand,
    ) -> SolverResult<Option<NodeId>> {
        let expr = self
            .input
            .expression(id)
            .ok_or(SolverError::UnknownNode(id))?;
        let operands: Vec<Operand> = expr
            .operands
            .iter()
            .enumerate()
            .map(|(index, operand)| f(index, *operand))
            .collect();
        self.mutate_expression(id, ExpressionEdit::new().operands(operands))
    }

    /// Replace a leaf with another leaf, keeping its provenance.
    pub fn replace_leaf(&mut self, id: NodeId, node: Node) -> SolverResult<NodeId> {
        debug_assert!(node.operands().is_empty());
        let provenance = self.input_provenance(id)?;
        self.emit(id, node, provenance)
    }

    /// A fresh expression derived from the input nodes in `from`.
    ///
    /// `None` if one of the operands was removed.
    pub fn create_expression(
        &mut self,
        op: Operator,
        operands: impl IntoIterator<Item = Operand>,
        constrained: bool,
        from: &[NodeId],
    ) -> SolverResult<Option<NodeId>> {
        let provenance = self.provenance_of(from)?;
        let Some(operands) = self.resolve_all(operands.into_iter().collect(), &provenance)? else {
            return Ok(None);
        };
        let expr = Expression {
            op,
            operands: operands.into_iter().collect(),
            constrained,
        };

        if self.options.deduplicate {
            if let Some(existing) = self.congruence.get(&expr).copied() {
                if self.output.contains(existing) {
                    self.output.merge_provenance(existing, &provenance);
                    return Ok(Some(existing));
                }
            }
        }

        self.dirty = true;
        let key = self.options.deduplicate.then(|| expr.clone());
        let out = self.output.insert(Node::Expression(expr), provenance)?;
        if let Some(key) = key {
            self.congruence.insert(key, out);
        }
        Ok(Some(out))
    }

    pub fn create_parameter(&mut self, parameter: Parameter, from: &[NodeId]) -> SolverResult<NodeId> {
        let provenance = self.provenance_of(from)?;
        self.dirty = true;
        self.output.insert(Node::Parameter(parameter), provenance)
    }

    pub fn make_literal(&mut self, value: Literal, from: &[NodeId]) -> SolverResult<NodeId> {
        let provenance = self.provenance_of(from)?;
        self.dirty = true;
        self.output
            .insert(Node::Literal(LiteralNode::from(value)), provenance)
    }

    /// Merge the provenance of the input nodes `from` into the output node `out`.
    pub fn absorb_provenance(&mut self, out: NodeId, from: &[NodeId]) -> SolverResult<()> {
        let provenance = self.provenance_of(from)?;
        self.output.merge_provenance(out, &provenance);
        Ok(())
    }

    /// Make every user of the input node `id` use the output node `target`
    /// instead. `target` inherits the provenance of `id`.
    pub fn redirect(&mut self, id: NodeId, target: NodeId) -> SolverResult<()> {
        if !self.output.contains(target) {
            return Err(SolverError::UnknownNode(target));
        }
        self.dirty = true;
        let provenance = self.input_provenance(id)?;
        self.output.merge_provenance(target, &provenance);

        let previous = self.mapping.insert(id, target);
        if let Some(old) = previous.filter(|old| *old != target && self.output.contains(*old)) {
            for user in self.output.users(old).to_vec() {
                let Some(data) = self.output.get(user).cloned() else {
                    continue;
                };
                let Node::Expression(mut expr) = data.node else {
                    continue;
                };
                for operand in expr.operands.iter_mut().filter(|o| **o == old) {
                    *operand = target;
                }
                self.output
                    .replace(user, Node::Expression(expr), data.provenance)?;
            }
            let gone = self.output.remove_cascade(old);
            self.forget(&gone);
            self.mapping.insert(id, target);
        }
        Ok(())
    }

    /// Copy every node not handled yet and publish the output.
    pub fn close(mut self) -> SolverResult<Mutation> {
        let input = self.input;
        for id in input.order() {
            self.get_copy(*id)?;
        }
        Ok(Mutation {
            generation: self.output,
            dirty: self.dirty,
            mapping: self.mapping,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;

    fn sample() -> (Generation, [NodeId; 4]) {
        let mut builder = GraphBuilder::new();
        let a = builder.parameter(Parameter::real().named("A"));
        let b = builder.parameter(Parameter::real().named("B"));
        let sum = builder.expression(Operator::Add, [a, b]);
        let ge = builder.assert(Operator::GreaterOrEqual, [sum, a]);
        (builder.build().unwrap(), [a, b, sum, ge])
    }

    #[test]
    fn untouched_generation_is_clean() {
        let (input, _) = sample();
        let mut diagnostics = Diagnostics::new();
        let mutation = Mutator::new(&input, MutatorOptions::default(), &mut diagnostics)
            .close()
            .unwrap();
        assert!(!mutation.dirty);
        assert_eq!(mutation.generation.len(), input.len());
        assert_eq!(mutation.generation.index(), 1);
        mutation.generation.validate().unwrap();
    }

    #[test]
    fn removal_cascades_to_users() {
        let (input, [_, b, sum, ge]) = sample();
        let mut diagnostics = Diagnostics::new();
        let mut mutator = Mutator::new(&input, MutatorOptions::default(), &mut diagnostics);
        mutator.remove(b);
        let mutation = mutator.close().unwrap();

        assert!(mutation.dirty);
        assert_eq!(mutation.generation.len(), 1);
        assert!(!mutation.mapping.contains_key(sum));
        assert!(!mutation.mapping.contains_key(ge));
    }

    #[test]
    fn removal_after_copy_cascades_in_output() {
        let (input, [_, b, sum, ge]) = sample();
        let mut diagnostics = Diagnostics::new();
        let mut mutator = Mutator::new(&input, MutatorOptions::default(), &mut diagnostics);
        mutator.get_copy(ge).unwrap();
        mutator.remove(b);
        assert!(mutator.is_removed(sum));
        let mutation = mutator.close().unwrap();
        assert_eq!(mutation.generation.len(), 1);
    }

    #[test]
    fn mutation_keeps_provenance_and_users() {
        let (input, [a, b, sum, ge]) = sample();
        let mut diagnostics = Diagnostics::new();
        let mut mutator = Mutator::new(&input, MutatorOptions::default(), &mut diagnostics);
        mutator.get_copy(ge).unwrap();
        let out = mutator
            .mutate_expression(
                sum,
                ExpressionEdit::new()
                    .op(Operator::Multiply)
                    .operands([Operand::Input(b), Operand::Literal(Literal::number(2.0))]),
            )
            .unwrap()
            .unwrap();
        let mutation = mutator.close().unwrap();
        let generation = &mutation.generation;

        assert_eq!(mutation.mapping[sum], out);
        assert_eq!(generation.expression(out).unwrap().op, Operator::Multiply);
        assert_eq!(generation.provenance(out), input.provenance(sum));
        let user = mutation.mapping[ge];
        assert_eq!(generation.expression(user).unwrap().operands[0], out);
        // the literal inherits the provenance of its user
        let literal = generation.expression(out).unwrap().operands[1];
        assert_eq!(generation.provenance(literal), input.provenance(sum));
        assert!(generation.users(mutation.mapping[a]).contains(&user));
        generation.validate().unwrap();
    }

    #[test]
    fn patch_without_change_is_a_copy() {
        let (input, [a, ..]) = sample();
        let mut diagnostics = Diagnostics::new();
        let mut mutator = Mutator::new(&input, MutatorOptions::default(), &mut diagnostics);
        mutator.mutate_parameter(a, |_| {}).unwrap();
        assert!(!mutator.is_dirty());
        mutator
            .mutate_parameter(a, |p| p.name = Some("renamed".into()))
            .unwrap();
        assert!(mutator.is_dirty());
    }

    #[test]
    fn created_nodes_need_provenance() {
        let (input, [a, ..]) = sample();
        let mut diagnostics = Diagnostics::new();
        let mut mutator = Mutator::new(&input, MutatorOptions::default(), &mut diagnostics);
        assert!(matches!(
            mutator.create_parameter(Parameter::real(), &[]),
            Err(SolverError::NoProvenance)
        ));
        let p = mutator.create_parameter(Parameter::real(), &[a]).unwrap();
        assert_eq!(mutator.output().provenance(p), input.provenance(a));
    }

    #[test]
    fn congruent_expressions_are_shared_on_request() {
        let (input, [a, b, ..]) = sample();
        for deduplicate in [false, true] {
            let mut diagnostics = Diagnostics::new();
            let mut mutator =
                Mutator::new(&input, MutatorOptions { deduplicate }, &mut diagnostics);
            let x = mutator
                .create_expression(Operator::Add, [Operand::Input(a), Operand::Input(b)], false, &[a])
                .unwrap();
            let y = mutator
                .create_expression(Operator::Add, [Operand::Input(a), Operand::Input(b)], false, &[b])
                .unwrap();
            assert_eq!(x == y, deduplicate);
            if deduplicate {
                let merged = mutator.output().provenance(x.unwrap()).unwrap();
                assert_eq!(merged.len(), 2);
            }
        }
    }

    #[test]
    fn redirect_rewires_copied_users() {
        let (input, [a, b, sum, ge]) = sample();
        let mut diagnostics = Diagnostics::new();
        let mut mutator = Mutator::new(&input, MutatorOptions::default(), &mut diagnostics);
        mutator.get_copy(ge).unwrap();
        let p = mutator.create_parameter(Parameter::real(), &[sum]).unwrap();
        mutator.redirect(sum, p).unwrap();
        let mutation = mutator.close().unwrap();
        let generation = &mutation.generation;

        let user = generation.expression(mutation.mapping[ge]).unwrap();
        assert_eq!(user.operands[0], p);
        assert_eq!(generation.count_op(Operator::Add), 0);
        assert!(generation.users(mutation.mapping[b]).is_empty());
        assert!(mutation.mapping.contains_key(a));
        generation.validate().unwrap();
    }
}
