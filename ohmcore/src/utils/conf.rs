use serde::{Deserialize, Serialize};

use crate::utils::error::{SolverError, SolverResult};

/// Knobs of one solve.
///
/// ```rust
/// # use ohmcore::utils::conf::SolverConfig;
/// let config = SolverConfig::from_toml_str("max_rounds = 8\ndeduplicate = true").unwrap();
/// assert_eq!(config.max_rounds, 8);
/// assert_eq!(config.max_propagation_rounds, SolverConfig::default().max_propagation_rounds);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    /// Full pipeline rounds allowed before the solve is aborted.
    pub max_rounds: usize,

    /// Forward/backward sweeps a [`Query`](crate::query::Query) runs at most.
    pub max_propagation_rounds: usize,

    /// Reuse structurally identical expressions created within one pass.
    pub deduplicate: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_rounds: 32,
            max_propagation_rounds: 64,
            deduplicate: false,
        }
    }
}

impl SolverConfig {
    pub fn from_toml_str(source: &str) -> SolverResult<Self> {
        toml::from_str(source).map_err(|source| SolverError::ConfigParse { source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(SolverConfig::from_toml_str("").unwrap(), SolverConfig::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = SolverConfig::from_toml_str("max_round = 3").unwrap_err();
        assert!(matches!(err, SolverError::ConfigParse { .. }));
    }

    #[test]
    fn wrong_types_are_rejected() {
        assert!(SolverConfig::from_toml_str("deduplicate = 1").is_err());
    }
}
