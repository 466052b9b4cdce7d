//! Cluster topology provider
//!
//! Loads a [`ClusterTopology`] from a TOML, JSON or YAML file (chosen by file
//! extension, TOML by default).

use std::path::Path;

use dbcm_common::{ClusterTopology, DbNode, Error, Result};
use tracing::debug;

/// Read-only node lookup by host name
pub trait TopologyProvider {
    fn node_by_name(&self, name: &str) -> Option<&DbNode>;
}

impl TopologyProvider for ClusterTopology {
    fn node_by_name(&self, name: &str) -> Option<&DbNode> {
        self.node(name)
    }
}

/// Load a topology file
pub fn load_topology(path: &Path) -> Result<ClusterTopology> {
    let content = std::fs::read_to_string(path)?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    let topology: ClusterTopology = match extension.as_deref() {
        Some("json") => serde_json::from_str(&content)?,
        Some("yaml") | Some("yml") => {
            serde_yaml::from_str(&content).map_err(|e| Error::Parse(e.to_string()))?
        }
        _ => toml::from_str(&content).map_err(|e| Error::Parse(e.to_string()))?,
    };

    debug!(
        path = %path.display(),
        cluster = %topology.cluster_name,
        nodes = topology.nodes.len(),
        "Loaded cluster topology"
    );

    Ok(topology)
}
