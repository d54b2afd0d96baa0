//! Cluster configuration (§4.6a). A `meshrt` process needs to know how
//! many cores live on this node, how many total cores the mesh is
//! federated across, and — once more than one node is involved — which
//! rank it is. This is deliberately the thin, declarative half of
//! startup; the interesting behavior (spawning cores, running the
//! monitor loop) lives in [`crate::run_mesh`].
//!
//! Loaded from TOML: runtime-shaping config is plain,
//! serde-deserializable data rather than code, since it varies per
//! deployment rather than per build.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Accelerator cores per node (§5 — 16 for the reference board).
    pub cores_per_node: u32,
    /// Total cores in the mesh, across every node. Must be a multiple of
    /// `cores_per_node`.
    pub total_cores: u32,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self { cores_per_node: 16, total_cores: 16 }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    /// `total_cores` isn't an even multiple of `cores_per_node`.
    NotEvenlyDivisible { total_cores: u32, cores_per_node: u32 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "reading cluster config: {e}"),
            ConfigError::Parse(e) => write!(f, "parsing cluster config: {e}"),
            ConfigError::NotEvenlyDivisible { total_cores, cores_per_node } => write!(
                f,
                "total_cores ({total_cores}) is not a multiple of cores_per_node ({cores_per_node})"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

impl ClusterConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: ClusterConfig = toml::from_str(text).map_err(ConfigError::Parse)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.cores_per_node == 0 || self.total_cores % self.cores_per_node != 0 {
            return Err(ConfigError::NotEvenlyDivisible {
                total_cores: self.total_cores,
                cores_per_node: self.cores_per_node,
            });
        }
        Ok(())
    }

    pub fn node_count(&self) -> u32 {
        self.total_cores / self.cores_per_node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_a_single_sixteen_core_node() {
        let cfg = ClusterConfig::default();
        assert_eq!(cfg.node_count(), 1);
    }

    #[test]
    fn parses_a_multi_node_toml_document() {
        let cfg = ClusterConfig::from_toml_str("cores_per_node = 16\ntotal_cores = 64\n").unwrap();
        assert_eq!(cfg.node_count(), 4);
    }

    #[test]
    fn rejects_a_total_not_divisible_by_cores_per_node() {
        let err = ClusterConfig::from_toml_str("cores_per_node = 16\ntotal_cores = 20\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::NotEvenlyDivisible { .. }));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = ClusterConfig::from_toml_str("not valid toml = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
