//! Canonicalization passes.
//!
//! Each pass reads one generation through a [`Mutator`] and writes the next.
//! [`PIPELINE`] lists them in the order the solver runs them every round.
use crate::{mutator::Mutator, utils::error::SolverResult};

pub mod domain;
pub mod literals;
pub mod operations;
pub mod predicates;
pub mod structural;

/// A named pass.
#[derive(Debug, Clone, Copy)]
pub struct Algorithm {
    pub name: &'static str,
    pub run: fn(&mut Mutator<'_>) -> SolverResult<()>,
}

pub const PIPELINE: [Algorithm; 5] = [
    domain::ALGORITHM,
    predicates::ALGORITHM,
    literals::ALGORITHM,
    operations::ALGORITHM,
    structural::ALGORITHM,
];
