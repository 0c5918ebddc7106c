use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::analysis::coverability::AncestorPolicy;
use crate::analysis::reachability::{ExplorationMode, StateGraphConfig};
use crate::analysis::simulation::FiringStrategy;

/// Exploration settings read from a TOML file. Every field is optional in the
/// file; command-line flags override whatever is loaded here.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ExploreConfig {
    #[serde(default)]
    pub mode: ExplorationMode,
    #[serde(default)]
    pub policy: AncestorPolicy,
    #[serde(default = "default_state_limit")]
    pub state_limit: Option<usize>,
    #[serde(default)]
    pub simulation_steps: Option<usize>,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for ExploreConfig {
    fn default() -> Self {
        Self {
            mode: ExplorationMode::default(),
            policy: AncestorPolicy::default(),
            state_limit: default_state_limit(),
            simulation_steps: None,
            seed: None,
        }
    }
}

impl ExploreConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("config file {:?} not found, using defaults", path);
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: ExploreConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    pub fn state_graph_config(&self) -> StateGraphConfig {
        StateGraphConfig {
            mode: self.mode,
            policy: self.policy,
            state_limit: self.state_limit,
        }
    }

    pub fn firing_strategy(&self) -> FiringStrategy {
        match self.seed {
            Some(seed) => FiringStrategy::Random { seed },
            None => FiringStrategy::First,
        }
    }
}

// Keeps bounded exploration of an unbounded net from running forever.
fn default_state_limit() -> Option<usize> {
    Some(100_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let config = ExploreConfig::load_from_file("does/not/exist.toml").unwrap();
        assert_eq!(config, ExploreConfig::default());
        assert_eq!(config.state_graph_config().mode, ExplorationMode::Coverability);
        assert_eq!(config.firing_strategy(), FiringStrategy::First);
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let config: ExploreConfig = toml::from_str(
            r#"
            mode = "bounded"
            seed = 42
            "#,
        )
        .unwrap();
        assert_eq!(config.mode, ExplorationMode::Bounded);
        assert_eq!(config.policy, AncestorPolicy::Path);
        assert_eq!(config.state_limit, Some(100_000));
        assert_eq!(config.firing_strategy(), FiringStrategy::Random { seed: 42 });
    }

    #[test]
    fn unknown_mode_is_a_parse_error() {
        let parsed: std::result::Result<ExploreConfig, _> = toml::from_str(r#"mode = "exact""#);
        assert!(parsed.is_err());
    }
}
