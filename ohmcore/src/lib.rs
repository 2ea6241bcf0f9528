//! Symbolic parameter solver for hardware design constraints.
//!
//! A front-end describes parameters and the relations between them with a
//! [`graph::GraphBuilder`]. The [`solver::Solver`] rewrites that graph, one
//! immutable [`graph::Generation`] per pass, into a canonical form built from a
//! small operator basis, and a [`query::Query`] over the last generation answers
//! what each parameter can be and which constraints contradict each other.
//!
//! ```rust
//! use ohmcore::prelude::*;
//!
//! let mut builder = GraphBuilder::new();
//! let r = builder.parameter(Parameter::new(Domain::positive(), Unit::ohm()).named("R"));
//! builder.alias(r, Literal::quantity(4.7, Unit::ohm().with_prefix(Prefix::Kilo)));
//!
//! let solution = Solver::default().solve(builder.build().unwrap()).unwrap();
//! let query = solution.query();
//! let r = solution.resolve(r).unwrap();
//! assert_eq!(query.try_single(r).unwrap(), Some(Value::Number(4700.0)));
//! assert!(query.is_satisfiable());
//! ```

pub mod algorithms;
pub mod ext;
pub mod graph;
pub mod mutator;
pub mod name;
pub mod query;
pub mod solver;
pub mod utils;

pub extern crate ohmsets;

pub mod prelude {
    //! Everything a front-end needs to build, solve and query a graph.
    pub use crate::ext::ohmlog::{Diagnostics, LogLevel, LogRecord};
    pub use crate::graph::{Constant, Domain, Generation, GraphBuilder, NodeId, Operator, Parameter};
    pub use crate::query::{Contradiction, Contradictions, Query};
    pub use crate::solver::{Solution, Solver};
    pub use crate::utils::conf::SolverConfig;
    pub use crate::utils::error::{SolverError, SolverResult};

    pub use ohmsets::prelude::*;
}
