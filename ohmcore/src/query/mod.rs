//! Read-only answers about a published generation.
//!
//! A [`Query`] propagates value supersets through the generation once, when it
//! is created, and then only reads. It can be shared between threads.
use ohmsets::prelude::*;
use slotmap::SecondaryMap;
use thiserror::Error;

use crate::{
    graph::{Generation, Node, NodeId, Origin, Provenance},
    name::ShortName,
    solver::resolve_through,
    utils::{
        conf::SolverConfig,
        error::{SolverError, SolverResult},
    },
};

mod eval;
mod propagate;

use propagate::Propagation;

/// A node that cannot take any value.
#[derive(Debug, Clone, PartialEq)]
pub struct Contradiction {
    pub node: NodeId,
    /// Diagnostic rendering of the node.
    pub name: String,
    /// Every origin that contributed to the contradiction.
    pub origins: Provenance,
    /// Generation-0 nodes behind `origins`.
    pub origin_nodes: Vec<NodeId>,
    /// Labels attached to those nodes by the front-end.
    pub labels: Vec<String>,
}

impl Contradiction {
    pub fn involves(&self, origin: Origin) -> bool {
        self.origins.contains(origin)
    }
}

impl std::fmt::Display for Contradiction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "`{}` has no admissible value", self.name)?;
        if !self.labels.is_empty() {
            write!(f, " (from {})", self.labels.join(", "))?;
        }
        Ok(())
    }
}

/// Every independent contradiction found in a generation.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{} contradiction(s): {}", .0.len(), render(.0))]
pub struct Contradictions(pub Vec<Contradiction>);

fn render(contradictions: &[Contradiction]) -> String {
    contradictions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone)]
pub struct Query<'g> {
    generation: &'g Generation,
    mappings: &'g [SecondaryMap<NodeId, NodeId>],
    propagation: Propagation,
    contradictions: Vec<Contradiction>,
}

impl<'g> Query<'g> {
    pub fn new(generation: &'g Generation) -> Self {
        Self::with_rounds(generation, SolverConfig::default().max_propagation_rounds)
    }

    /// Propagate for at most `rounds` forward/backward sweeps.
    pub fn with_rounds(generation: &'g Generation, rounds: usize) -> Self {
        let propagation = Propagation::run(generation, rounds);
        let mut emptied = propagation.emptied.clone();
        emptied.sort_by_key(|id| generation.provenance(*id).and_then(Provenance::first));
        let contradictions = emptied
            .into_iter()
            .map(|id| Self::describe(generation, &propagation, id))
            .collect();
        Self {
            generation,
            mappings: &[],
            propagation,
            contradictions,
        }
    }

    /// Node mappings leading from generation 0 to this generation, used by
    /// [`Query::resolve`].
    pub fn with_mappings(mut self, mappings: &'g [SecondaryMap<NodeId, NodeId>]) -> Self {
        self.mappings = mappings;
        self
    }

    fn describe(generation: &Generation, propagation: &Propagation, id: NodeId) -> Contradiction {
        let mut origins = generation.provenance(id).cloned().unwrap_or_default();
        let mut involved = vec![id];
        involved.extend_from_slice(generation.node(id).map(Node::operands).unwrap_or(&[]));
        for node in involved {
            if let Some(provenance) = generation.provenance(node) {
                origins.merge(provenance);
            }
            if let Some(evidence) = propagation.evidence.get(node) {
                origins.merge(evidence);
            }
        }

        let table = generation.origins();
        let origin_nodes = origins.origins().filter_map(|o| table.node(o)).collect();
        let labels = origins
            .origins()
            .filter_map(|o| table.label(o).map(str::to_string))
            .collect();
        Contradiction {
            node: id,
            name: generation.display(id).to_string(),
            origins,
            origin_nodes,
            labels,
        }
    }

    #[inline]
    pub fn generation(&self) -> &'g Generation {
        self.generation
    }

    /// Sweeps the propagation ran.
    #[inline]
    pub fn rounds(&self) -> usize {
        self.propagation.rounds
    }

    /// Raw superset of any node, in base units. `None` when nothing is known.
    pub fn value(&self, id: NodeId) -> Option<&Literal> {
        self.propagation.values.get(id)
    }

    /// Best over-approximation of the values of a parameter, in its display
    /// unit.
    pub fn superset(&self, parameter: NodeId) -> SolverResult<Literal> {
        let p = match self.generation.node(parameter) {
            Some(Node::Parameter(p)) => p,
            Some(_) => return Err(SolverError::NotAParameter(parameter)),
            None => return Err(SolverError::UnknownNode(parameter)),
        };
        let value = self
            .value(parameter)
            .cloned()
            .unwrap_or_else(|| p.universe());
        Ok(match value {
            Literal::Numeric(q) => {
                Literal::Numeric(QuantitySet::from_base(q.numbers().clone(), p.display_unit()))
            }
            other => other,
        })
    }

    /// The value of a fully resolved parameter, numbers in its display unit.
    pub fn try_single(&self, parameter: NodeId) -> SolverResult<Option<Value>> {
        let superset = self.superset(parameter)?;
        Ok(match (superset.single(), superset.unit()) {
            (Some(Value::Number(v)), Some(unit)) => Some(Value::Number(unit.from_base(v))),
            (single, _) => single,
        })
    }

    /// A representative value: the single value if resolved, else the
    /// admissible value closest to the parameter's guess or soft set.
    pub fn pick(&self, parameter: NodeId) -> SolverResult<Option<Value>> {
        if let Some(single) = self.try_single(parameter)? {
            return Ok(Some(single));
        }
        let Some(p) = self.generation.parameter(parameter) else {
            return Err(SolverError::NotAParameter(parameter));
        };
        let Some(Literal::Numeric(q)) = self.value(parameter) else {
            return Ok(None);
        };
        let target = [&p.guess, &p.soft_set]
            .into_iter()
            .flatten()
            .filter_map(|hint| hint.try_as_numeric_ref())
            .find_map(|hint| hint.numbers().closest_elem(0.0))
            .unwrap_or(0.0);
        Ok(q.numbers()
            .closest_elem(target)
            .map(|v| Value::Number(p.display_unit().from_base(v))))
    }

    /// Every contradiction, in discovery order.
    #[inline]
    pub fn contradictions(&self) -> &[Contradiction] {
        &self.contradictions
    }

    #[inline]
    pub fn is_satisfiable(&self) -> bool {
        self.contradictions.is_empty()
    }

    pub fn check(&self) -> Result<(), Contradictions> {
        if self.contradictions.is_empty() {
            Ok(())
        } else {
            Err(Contradictions(self.contradictions.clone()))
        }
    }

    /// Counterpart in this generation of a generation-0 node.
    pub fn resolve(&self, original: NodeId) -> Option<NodeId> {
        resolve_through(self.mappings, original).filter(|id| self.generation.contains(*id))
    }

    /// Short diagnostic name of every parameter, in declaration order.
    pub fn names(&self) -> Vec<(NodeId, ShortName)> {
        self.generation
            .parameters_by_origin()
            .into_iter()
            .enumerate()
            .map(|(index, id)| (id, ShortName(index)))
            .collect()
    }
}
