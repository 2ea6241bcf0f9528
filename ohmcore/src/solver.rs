//! Running the pipeline to a fixpoint.
use std::sync::Arc;

use slotmap::SecondaryMap;

use crate::{
    algorithms::PIPELINE,
    ext::ohmlog::Diagnostics,
    graph::{Generation, NodeId},
    mutator::{Mutator, MutatorOptions},
    ohmdebug, ohmerror, ohminfo,
    query::Query,
    utils::{
        conf::SolverConfig,
        error::{SolverError, SolverResult},
    },
};

#[derive(Debug, Clone, Default)]
pub struct Solver {
    config: SolverConfig,
}

impl Solver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Canonicalize `generation`.
    ///
    /// Passes run in [`PIPELINE`] order; a pass that changes nothing publishes
    /// no generation. Rounds repeat until a whole round is clean.
    pub fn solve(&self, generation: Generation) -> SolverResult<Solution> {
        generation.validate()?;

        let options = MutatorOptions {
            deduplicate: self.config.deduplicate,
        };
        let mut diagnostics = Diagnostics::new();
        let mut generations = vec![Arc::new(generation)];
        let mut mappings = Vec::new();
        let mut rounds = 0;

        loop {
            if rounds == self.config.max_rounds {
                ohmerror!(
                    diagnostics,
                    "no fixpoint after {} rounds, giving up",
                    rounds
                );
                return Err(SolverError::IterationBudgetExceeded { rounds });
            }
            rounds += 1;

            let mut dirty = false;
            for algorithm in PIPELINE.iter() {
                let current = Arc::clone(&generations[generations.len() - 1]);
                let mut mutator = Mutator::new(&current, options, &mut diagnostics);
                (algorithm.run)(&mut mutator)?;
                let mutation = mutator.close()?;
                if !mutation.dirty {
                    continue;
                }

                mutation.generation.validate()?;
                ohmdebug!(
                    diagnostics,
                    "{} produced generation {} ({} nodes)",
                    algorithm.name,
                    mutation.generation.index(),
                    mutation.generation.len()
                );
                dirty = true;
                generations.push(Arc::new(mutation.generation));
                mappings.push(mutation.mapping);
            }

            if !dirty {
                break;
            }
        }

        let last = &generations[generations.len() - 1];
        if let Some((node, op)) = last.first_non_canonical() {
            ohmerror!(
                diagnostics,
                "generation {} is not canonical at {}",
                last.index(),
                last.display(node)
            );
            return Err(SolverError::NotCanonical {
                generation: last.index(),
                node,
                op,
            });
        }

        ohminfo!(
            diagnostics,
            "canonical after {} rounds and {} generations",
            rounds,
            generations.len()
        );
        Ok(Solution {
            generations,
            mappings,
            diagnostics,
            rounds,
            propagation_rounds: self.config.max_propagation_rounds,
        })
    }
}

/// Every generation of a finished solve.
#[derive(Debug, Clone)]
pub struct Solution {
    generations: Vec<Arc<Generation>>,
    mappings: Vec<SecondaryMap<NodeId, NodeId>>,
    diagnostics: Diagnostics,
    rounds: usize,
    propagation_rounds: usize,
}

impl Solution {
    /// Published generations, the input first.
    #[inline]
    pub fn generations(&self) -> &[Arc<Generation>] {
        &self.generations
    }

    #[inline]
    pub fn first(&self) -> &Arc<Generation> {
        &self.generations[0]
    }

    /// The canonical generation.
    #[inline]
    pub fn last(&self) -> &Arc<Generation> {
        &self.generations[self.generations.len() - 1]
    }

    /// Node mapping of every published step.
    #[inline]
    pub fn mappings(&self) -> &[SecondaryMap<NodeId, NodeId>] {
        &self.mappings
    }

    #[inline]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    #[inline]
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Counterpart in the canonical generation of a node of generation 0.
    pub fn resolve(&self, original: NodeId) -> Option<NodeId> {
        resolve_through(&self.mappings, original)
    }

    /// Read-only view of the canonical generation.
    pub fn query(&self) -> Query<'_> {
        Query::with_rounds(self.last(), self.propagation_rounds).with_mappings(&self.mappings)
    }
}

pub(crate) fn resolve_through(mappings: &[SecondaryMap<NodeId, NodeId>], original: NodeId) -> Option<NodeId> {
    mappings
        .iter()
        .try_fold(original, |id, mapping| mapping.get(id).copied())
}
