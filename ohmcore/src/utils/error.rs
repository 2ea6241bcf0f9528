use ohmsets::{SetError, prelude::Unit};
use thiserror::Error;

use crate::graph::{Arity, NodeId, Operator};

/// A malformed node handed to [`GraphBuilder`](crate::graph::GraphBuilder).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("Operator `{op}` takes {expected} operands, found {found}.")]
    Arity {
        op: Operator,
        expected: Arity,
        found: usize,
    },

    #[error("Only predicates can be asserted, `{op}` is not a predicate.")]
    NotAPredicate { op: Operator },

    #[error("Operand {operand:?} was not created by this builder.")]
    UnknownOperand { operand: NodeId },

    #[error("Constant cannot be turned into a literal: {0}")]
    BadConstant(SetError),

    #[error("Operands of `{op}` measure different dimensions: `{left}` and `{right}`.")]
    UnitMismatch { op: Operator, left: Unit, right: Unit },

    #[error("Parameter in `{parameter}` is bounded by a set in `{bound}`.")]
    BoundUnitMismatch { parameter: Unit, bound: Unit },
}

#[derive(Debug, Error)]
pub enum SolverError {
    #[error("Graph construction failed with {} error(s): {}", .0.len(), join(.0))]
    Graph(Vec<GraphError>),

    #[error("Set operation failed: {0}")]
    Set(#[from] SetError),

    #[error("Operator `{op}` takes {expected} operands, found {found}.")]
    Arity {
        op: Operator,
        expected: Arity,
        found: usize,
    },

    #[error("Node {node:?} of generation {generation} refers to missing operand {operand:?}.")]
    DanglingOperand {
        node: NodeId,
        operand: NodeId,
        generation: usize,
    },

    #[error("Node {0:?} carries no provenance.")]
    MissingProvenance(NodeId),

    #[error("Generation {generation} is not canonical: node {node:?} still uses {}.", describe(.op))]
    NotCanonical {
        generation: usize,
        node: NodeId,
        op: Option<Operator>,
    },

    #[error("Canonicalization did not reach a fixpoint within {rounds} rounds.")]
    IterationBudgetExceeded { rounds: usize },

    #[error("Failed to parse solver configuration: {source}")]
    ConfigParse { source: toml::de::Error },

    #[error("Node {0:?} is not a parameter.")]
    NotAParameter(NodeId),

    #[error("Node {0:?} does not exist in this generation.")]
    UnknownNode(NodeId),

    #[error("Nodes created by a pass need at least one provenance source.")]
    NoProvenance,
}

fn join(errors: &[GraphError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn describe(op: &Option<Operator>) -> String {
    match op {
        Some(op) => format!("operator `{}`", op),
        None => "a raw constant".to_string(),
    }
}

pub type SolverResult<T> = Result<T, SolverError>;
