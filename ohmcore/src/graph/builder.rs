use std::sync::Arc;

use ohmsets::{Literal, prelude::Unit};
use slotmap::SecondaryMap;
use smallvec::SmallVec;

use crate::{
    graph::{
        Constant, Expression, Generation, Node, NodeId, Operator, OriginTable, Parameter,
        Provenance,
    },
    utils::error::{GraphError, SolverError, SolverResult},
};

/// Builds generation 0.
///
/// Every node the builder creates becomes its own origin. Malformed nodes are
/// still handed an id so construction can go on; all problems are reported
/// together by [`GraphBuilder::build`].
///
/// ```rust
/// # use ohmcore::prelude::*;
/// let mut builder = GraphBuilder::new();
/// let p = builder.parameter(Parameter::real().named("P"));
/// let three = builder.literal(Literal::number(3.0));
/// builder.assert(Operator::GreaterOrEqual, [p, three]);
/// let generation = builder.build().unwrap();
/// assert_eq!(generation.len(), 3);
/// ```
#[derive(Debug)]
pub struct GraphBuilder {
    generation: Generation,
    origins: OriginTable,
    errors: Vec<GraphError>,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            generation: Generation::new(0, Arc::default()),
            origins: OriginTable::default(),
            errors: Vec::new(),
        }
    }

    fn push(&mut self, node: Node) -> NodeId {
        match self.generation.insert(node, Provenance::new()) {
            Ok(id) => {
                let origin = self.origins.push(id, None);
                self.generation
                    .merge_provenance(id, &Provenance::of(origin));
                id
            }
            Err(SolverError::UnknownNode(operand)) => {
                self.errors.push(GraphError::UnknownOperand { operand });
                NodeId::default()
            }
            Err(_) => NodeId::default(),
        }
    }

    pub fn parameter(&mut self, parameter: Parameter) -> NodeId {
        self.push(Node::Parameter(parameter))
    }

    pub fn literal(&mut self, literal: Literal) -> NodeId {
        self.push(Node::Literal(literal.into()))
    }

    /// A raw source constant, normalized later by the solver.
    pub fn constant(&mut self, constant: Constant) -> NodeId {
        if let Err(err) = constant.to_literal() {
            self.errors.push(GraphError::BadConstant(err));
        }
        self.push(Node::Constant(constant))
    }

    fn check_arity(&mut self, expr: &Expression) {
        let expected = expr.op.arity();
        if !expected.accepts(expr.operands.len()) {
            self.errors.push(GraphError::Arity {
                op: expr.op,
                expected,
                found: expr.operands.len(),
            });
        }
    }

    /// A value-producing expression.
    pub fn expression(
        &mut self,
        op: Operator,
        operands: impl IntoIterator<Item = NodeId>,
    ) -> NodeId {
        let expr = Expression::new(op, operands);
        self.check_arity(&expr);
        self.push(Node::Expression(expr))
    }

    /// A predicate that must hold.
    pub fn assert(&mut self, op: Operator, operands: impl IntoIterator<Item = NodeId>) -> NodeId {
        let expr = Expression::asserted(op, operands);
        self.check_arity(&expr);
        if !op.is_predicate() {
            self.errors.push(GraphError::NotAPredicate { op });
        }
        self.push(Node::Expression(expr))
    }

    /// Field assignment `parameter := value`, lowered to an asserted `Is`.
    pub fn alias(&mut self, parameter: NodeId, value: Literal) -> NodeId {
        let value = self.literal(value);
        self.assert(Operator::Is, [parameter, value])
    }

    /// Attach a human-readable description of the source construct.
    pub fn label(&mut self, id: NodeId, label: impl Into<String>) -> &mut Self {
        if let Some(origin) = self.origins.origin_of(id) {
            self.origins.set_label(origin, label.into());
        }
        self
    }

    /// Problems found so far.
    pub fn errors(&self) -> &[GraphError] {
        &self.errors
    }

    pub fn build(mut self) -> SolverResult<Generation> {
        let unit_errors = check_units(&self.generation);
        self.errors.extend(unit_errors);
        if !self.errors.is_empty() {
            return Err(SolverError::Graph(self.errors));
        }
        let mut generation = self.generation;
        generation.set_origins(Arc::new(self.origins));
        generation.validate()?;
        Ok(generation)
    }
}

/// Operators whose numeric operands must measure the same dimension.
fn needs_same_unit(op: Operator) -> bool {
    use Operator::*;
    matches!(
        op,
        Add | Subtract
            | Min
            | Max
            | Round
            | Abs
            | Floor
            | Ceil
            | Union
            | Intersection
            | Difference
            | SymmetricDifference
            | Is
            | IsSubset
            | IsSuperset
            | GreaterOrEqual
            | LessOrEqual
            | GreaterThan
            | LessThan
    )
}

/// Infer the unit of every numeric node and report operands that cannot be
/// combined. Nodes whose unit cannot be inferred are not checked.
fn check_units(generation: &Generation) -> Vec<GraphError> {
    let mut units: SecondaryMap<NodeId, Unit> = SecondaryMap::new();
    let mut errors = Vec::new();

    for id in generation.topological_order() {
        let unit = match generation.node(id) {
            Some(Node::Parameter(parameter)) if parameter.domain.is_numbers() => {
                let bounds = [&parameter.within, &parameter.soft_set, &parameter.guess];
                for bound in bounds.into_iter().flatten() {
                    match bound.unit() {
                        Some(unit) if !unit.is_commensurable(&parameter.unit) => {
                            errors.push(GraphError::BoundUnitMismatch {
                                parameter: parameter.unit,
                                bound: *unit,
                            });
                        }
                        _ => {}
                    }
                }
                Some(parameter.unit)
            }
            Some(Node::Literal(literal)) => literal.value.unit().copied(),
            Some(Node::Constant(constant)) => constant
                .to_literal()
                .ok()
                .and_then(|literal| literal.unit().copied()),
            Some(Node::Expression(expr)) => {
                let known: SmallVec<[Unit; 4]> = expr
                    .operands
                    .iter()
                    .filter_map(|operand| units.get(*operand).copied())
                    .collect();
                let complete = known.len() == expr.operands.len();
                match expr.op {
                    op if needs_same_unit(op) => {
                        let first = known.first().copied();
                        if let Some(left) = first {
                            if let Some(right) = known.iter().find(|u| !u.is_commensurable(&left)) {
                                errors.push(GraphError::UnitMismatch {
                                    op,
                                    left,
                                    right: *right,
                                });
                            }
                        }
                        if op.is_predicate() { None } else { first }
                    }
                    Operator::Multiply if complete => known
                        .iter()
                        .try_fold(Unit::dimensionless(), |acc, unit| acc.mul(unit))
                        .ok(),
                    Operator::Divide if complete && known.len() == 2 => known[0].div(&known[1]).ok(),
                    _ => None,
                }
            }
            _ => None,
        };
        if let Some(unit) = unit {
            units.insert(id, unit);
        }
    }
    errors
}
