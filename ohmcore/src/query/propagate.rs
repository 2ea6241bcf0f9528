//! Bounded fixpoint of forward evaluation and backward narrowing.
use ohmsets::prelude::*;
use slotmap::SecondaryMap;
use smallvec::SmallVec;

use crate::{
    graph::{Generation, Node, NodeId, Operator, Provenance},
    query::eval::{evaluate, preserves_exactness},
};

#[derive(Debug, Clone)]
pub(crate) struct Propagation {
    pub values: SecondaryMap<NodeId, Literal>,
    pub exact: SecondaryMap<NodeId, ()>,
    /// Origins of everything that restricted a node beyond its own definition.
    pub evidence: SecondaryMap<NodeId, Provenance>,
    /// Nodes that lost their last value while their operands still had some.
    pub emptied: Vec<NodeId>,
    pub rounds: usize,
}

struct Propagator<'g> {
    generation: &'g Generation,
    order: Vec<NodeId>,
    state: Propagation,
    changed: bool,
}

impl Propagation {
    pub fn run(generation: &Generation, max_rounds: usize) -> Self {
        let mut propagator = Propagator {
            generation,
            order: generation.topological_order(),
            state: Propagation {
                values: SecondaryMap::new(),
                exact: SecondaryMap::new(),
                evidence: SecondaryMap::new(),
                emptied: Vec::new(),
                rounds: 0,
            },
            changed: false,
        };
        propagator.seed();
        while propagator.state.rounds < max_rounds {
            propagator.state.rounds += 1;
            propagator.changed = false;
            propagator.forward();
            propagator.backward();
            if !propagator.changed {
                break;
            }
        }
        propagator.state
    }
}

fn is_leaf_value(node: &Node) -> bool {
    matches!(node, Node::Literal(_) | Node::Constant(_))
}

impl Propagator<'_> {
    fn seed(&mut self) {
        for (id, data) in self.generation.iter() {
            let value = match &data.node {
                Node::Parameter(parameter) => {
                    let universe = parameter.universe();
                    let within = parameter
                        .within
                        .as_ref()
                        .and_then(|within| universe.intersection(within).ok());
                    Some(within.unwrap_or(universe))
                }
                Node::Literal(literal) => Some(literal.value.clone()),
                Node::Constant(constant) => constant.to_literal().ok(),
                Node::Expression(_) => None,
            };
            if let Some(value) = value {
                if is_leaf_value(&data.node) {
                    self.state.exact.insert(id, ());
                }
                self.state.values.insert(id, value);
            }
        }
    }

    fn value(&self, id: NodeId) -> Option<&Literal> {
        self.state.values.get(id)
    }

    fn is_empty(&self, id: NodeId) -> bool {
        self.value(id).is_some_and(Literal::is_empty)
    }

    /// Origins that explain the current value of `id`.
    fn explanation(&self, id: NodeId) -> Provenance {
        let mut out = self.generation.provenance(id).cloned().unwrap_or_default();
        if let Some(evidence) = self.state.evidence.get(id) {
            out.merge(evidence);
        }
        out
    }

    /// Intersect the value of `id` with `bound`, crediting `because`.
    fn restrict(&mut self, id: NodeId, bound: Literal, because: &Provenance) {
        let was_empty = self.is_empty(id);
        let next = match self.value(id) {
            Some(current) => match current.intersection(&bound) {
                Ok(next) => next,
                Err(_) => return,
            },
            None => bound,
        };
        if self.value(id) == Some(&next) {
            return;
        }

        self.changed = true;
        let empty = next.is_empty();
        self.state.values.insert(id, next);
        if let Some(entry) = self.state.evidence.entry(id) {
            entry.or_default().merge(because);
        }

        let generation = self.generation;
        let operands = generation.node(id).map(Node::operands).unwrap_or(&[]);
        let starved = operands.iter().any(|o| self.is_empty(*o));
        if empty && !was_empty && !starved && !self.state.emptied.contains(&id) {
            self.state.emptied.push(id);
        }
    }

    fn forward(&mut self) {
        let generation = self.generation;
        let order = std::mem::take(&mut self.order);
        for &id in &order {
            let Some(expr) = generation.expression(id) else {
                continue;
            };
            let exact: SmallVec<[bool; 4]> = expr
                .operands
                .iter()
                .map(|o| self.state.exact.contains_key(*o))
                .collect();
            let mut value = {
                let operands: SmallVec<[Option<&Literal>; 4]> =
                    expr.operands.iter().map(|o| self.state.values.get(*o)).collect();
                evaluate(expr.op, &operands, &exact)
            };
            if expr.constrained {
                value = Some(match value {
                    Some(v) => v.intersection(&Literal::truth()).unwrap_or(v),
                    None => Literal::truth(),
                });
            }
            if preserves_exactness(expr.op) && exact.iter().all(|e| *e) {
                self.state.exact.insert(id, ());
            }

            let Some(value) = value else {
                continue;
            };
            let mut because = Provenance::new();
            for operand in &expr.operands {
                because.merge(&self.explanation(*operand));
            }
            self.restrict(id, value, &because);
        }
        self.order = order;
    }

    fn backward(&mut self) {
        let generation = self.generation;
        let order = std::mem::take(&mut self.order);
        for &id in order.iter().rev() {
            let Some(expr) = generation.expression(id) else {
                continue;
            };
            let Some(value) = self.value(id).cloned() else {
                continue;
            };
            if value.is_empty() {
                continue;
            }
            let because = self.explanation(id);
            let ops = expr.operands.as_slice();

            match expr.op {
                Operator::Is if value.is_true() => self.narrow_is(ops[0], ops[1], &because),
                Operator::IsSubset if value.is_true() => {
                    if let Some(outer) = self.value(ops[1]).cloned() {
                        self.narrow(ops[0], outer, &because);
                    }
                }
                Operator::GreaterOrEqual if value.is_true() => {
                    self.narrow_ge(ops[0], ops[1], &because)
                }
                Operator::Not => {
                    if let Literal::Boolean(b) = value {
                        self.narrow(ops[0], Literal::Boolean(b.logical_not()), &because);
                    }
                }
                Operator::Or => self.narrow_or(ops, &value, &because),
                Operator::Add => self.narrow_sum(ops, &value, &because),
                Operator::Multiply => self.narrow_product(ops, &value, &because),
                _ => {}
            }
        }
        self.order = order;
    }

    /// Literal leaves are facts and never move.
    fn narrow(&mut self, id: NodeId, bound: Literal, because: &Provenance) {
        if self.generation.node(id).is_some_and(is_leaf_value) {
            return;
        }
        self.restrict(id, bound, because);
    }

    fn narrow_is(&mut self, a: NodeId, b: NodeId, because: &Provenance) {
        match (self.value(a).cloned(), self.value(b).cloned()) {
            (Some(va), Some(vb)) => {
                if let Ok(meet) = va.intersection(&vb) {
                    self.narrow(a, meet.clone(), because);
                    self.narrow(b, meet, because);
                }
            }
            (None, Some(vb)) => self.narrow(a, vb, because),
            (Some(va), None) => self.narrow(b, va, because),
            (None, None) => {}
        }
    }

    /// Operands of a `Union`, or the node itself.
    fn members(&self, id: NodeId) -> SmallVec<[NodeId; 4]> {
        match self.generation.expression(id) {
            Some(expr) if expr.op == Operator::Union => expr.operands.iter().copied().collect(),
            _ => smallvec::smallvec![id],
        }
    }

    fn bounds(&self, id: NodeId) -> Option<(f64, f64, Unit)> {
        let q = self.value(id)?.try_as_numeric_ref()?;
        Some((q.min_elem().ok()?, q.max_elem().ok()?, *q.unit()))
    }

    /// `greater ≥ lesser`, read member-wise when either side is a union.
    fn narrow_ge(&mut self, greater: NodeId, lesser: NodeId, because: &Provenance) {
        for high in self.members(greater) {
            for low in self.members(lesser) {
                if let Some((low_min, _, unit)) = self.bounds(low) {
                    let floor = QuantitySet::from_base(Numbers::at_least(low_min), unit);
                    self.narrow(high, Literal::Numeric(floor), because);
                }
                if let Some((_, high_max, unit)) = self.bounds(high) {
                    let ceiling = QuantitySet::from_base(Numbers::at_most(high_max), unit);
                    self.narrow(low, Literal::Numeric(ceiling), because);
                }
            }
        }
    }

    fn narrow_or(&mut self, ops: &[NodeId], value: &Literal, because: &Provenance) {
        if value.is_false() {
            for operand in ops {
                self.narrow(*operand, Literal::bool(false), because);
            }
        } else if value.is_true() {
            let open: SmallVec<[NodeId; 4]> = ops
                .iter()
                .copied()
                .filter(|o| !self.value(*o).is_some_and(Literal::is_false))
                .collect();
            if let [only] = open.as_slice() {
                self.narrow(*only, Literal::truth(), because);
            }
        }
    }

    fn numeric_operands(&self, ops: &[NodeId]) -> Option<Vec<QuantitySet>> {
        ops.iter()
            .map(|o| self.value(*o)?.try_as_numeric_ref().cloned())
            .collect()
    }

    fn narrow_sum(&mut self, ops: &[NodeId], value: &Literal, because: &Provenance) {
        let (Some(total), Some(terms)) = (value.try_as_numeric_ref(), self.numeric_operands(ops)) else {
            return;
        };
        for (index, operand) in ops.iter().enumerate() {
            let rest = terms
                .iter()
                .enumerate()
                .filter(|(other, _)| *other != index)
                .try_fold(None::<QuantitySet>, |acc, (_, term)| match acc {
                    None => Some(Some(term.clone())),
                    Some(acc) => acc.add(term).ok().map(Some),
                });
            let candidate = match rest {
                Some(Some(rest)) => total.add(&rest.negate()).ok(),
                Some(None) => Some(total.clone()),
                None => None,
            };
            if let Some(candidate) = candidate {
                self.narrow(*operand, Literal::Numeric(candidate), because);
            }
        }
    }

    fn narrow_product(&mut self, ops: &[NodeId], value: &Literal, because: &Provenance) {
        let (Some(product), Some(factors)) = (value.try_as_numeric_ref(), self.numeric_operands(ops)) else {
            return;
        };
        for (index, operand) in ops.iter().enumerate() {
            let rest = factors
                .iter()
                .enumerate()
                .filter(|(other, _)| *other != index)
                .try_fold(None::<QuantitySet>, |acc, (_, factor)| match acc {
                    None => Some(Some(factor.clone())),
                    Some(acc) => acc.mul(factor).ok().map(Some),
                });
            let candidate = match rest {
                Some(Some(rest)) if rest.numbers().contains(0.0) => continue,
                Some(Some(rest)) => rest.invert().and_then(|inverse| product.mul(&inverse)).ok(),
                Some(None) => Some(product.clone()),
                None => None,
            };
            let Some(candidate) = candidate else {
                continue;
            };
            self.narrow(*operand, Literal::Numeric(candidate), because);
        }
    }
}
