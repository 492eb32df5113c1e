//! Configuration for overlay nodes
//!
//! An [`OverlayConfig`] describes the whole overlay (topology, ring and
//! transport channel naming) and is shared by every node. A [`NodeConfig`]
//! adds the local node id.
//!
//! ```toml
//! channel_prefix = "QUEUE"
//!
//! [topology]
//! one_indexed = true
//! edges = [[1, 3], [2, 3], [2, 4], [2, 5], [4, 5]]
//! ring = [1, 4, 3, 5, 2]
//! ```

use std::path::Path;

use ringmesh_core::{DEFAULT_CHANNEL_PREFIX, NodeId, OverlayTopology, TopologyConfig};
use serde::{Deserialize, Serialize};

use crate::error::NodeResult;

fn default_channel_prefix() -> String {
    DEFAULT_CHANNEL_PREFIX.to_string()
}

fn default_event_channel_capacity() -> usize {
    1024
}

/// Configuration shared by every node of an overlay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Prefix of per-node channel names
    #[serde(default = "default_channel_prefix")]
    pub channel_prefix: String,
    /// Event broadcast channel capacity
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
    /// Physical topology and ring order
    pub topology: TopologyConfig,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            channel_prefix: default_channel_prefix(),
            event_channel_capacity: default_event_channel_capacity(),
            topology: TopologyConfig::example(),
        }
    }
}

impl OverlayConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> NodeResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> NodeResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Validate and build the overlay topology
    pub fn build_topology(&self) -> NodeResult<OverlayTopology> {
        Ok(self.topology.build()?)
    }

    /// Set the topology
    pub fn with_topology(mut self, topology: TopologyConfig) -> Self {
        self.topology = topology;
        self
    }

    /// Set the channel prefix
    pub fn with_channel_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.channel_prefix = prefix.into();
        self
    }

    /// Set the event channel capacity
    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity;
        self
    }
}

/// Configuration for one overlay node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    /// Zero-indexed id of this node
    pub local_id: NodeId,
    /// Overlay-wide settings
    pub overlay: OverlayConfig,
}

impl NodeConfig {
    /// Create a node configuration
    pub fn new(local_id: NodeId, overlay: OverlayConfig) -> Self {
        Self { local_id, overlay }
    }

    /// Configuration for a node of the built-in example overlay
    pub fn example(local_id: NodeId) -> Self {
        Self::new(local_id, OverlayConfig::default())
    }

    /// Set the overlay configuration
    pub fn with_overlay(mut self, overlay: OverlayConfig) -> Self {
        self.overlay = overlay;
        self
    }

    /// Set the event channel capacity
    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.overlay.event_channel_capacity = capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const EXAMPLE_TOML: &str = r#"
channel_prefix = "RING"

[topology]
one_indexed = true
edges = [[1, 3], [2, 3], [2, 4], [2, 5], [4, 5]]
ring = [1, 4, 3, 5, 2]
"#;

    #[test]
    fn test_default_config() {
        let config = OverlayConfig::default();
        assert_eq!(config.channel_prefix, "QUEUE");
        assert_eq!(config.event_channel_capacity, 1024);
        assert_eq!(config.topology, TopologyConfig::example());
    }

    #[test]
    fn test_parse_toml_with_defaults() {
        let config = OverlayConfig::from_toml_str(EXAMPLE_TOML).unwrap();
        assert_eq!(config.channel_prefix, "RING");
        assert_eq!(config.event_channel_capacity, 1024);
        assert_eq!(config.topology.ring, vec![1, 4, 3, 5, 2]);
        assert!(config.topology.one_indexed);
        assert_eq!(config.topology.node_count, None);

        let overlay = config.build_topology().unwrap();
        assert_eq!(overlay.successor_in_ring(NodeId(0)), Some(NodeId(3)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(EXAMPLE_TOML.as_bytes()).unwrap();

        let config = OverlayConfig::from_file(file.path()).unwrap();
        assert_eq!(config.channel_prefix, "RING");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = OverlayConfig::from_file("/nonexistent/ringmesh.toml").unwrap_err();
        assert!(matches!(err, crate::NodeError::Io(_)));
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let err = OverlayConfig::from_toml_str("topology = 3").unwrap_err();
        assert!(matches!(err, crate::NodeError::Parse(_)));
    }

    #[test]
    fn test_invalid_ring_is_config_error() {
        let config = OverlayConfig::default().with_topology(TopologyConfig {
            node_count: None,
            edges: vec![[0, 1]],
            ring: vec![0, 0],
            one_indexed: false,
        });
        let err = config.build_topology().unwrap_err();
        assert!(matches!(err, crate::NodeError::Config(_)));
    }

    #[test]
    fn test_node_config_builders() {
        let config = NodeConfig::example(NodeId(2)).with_event_channel_capacity(8);
        assert_eq!(config.local_id, NodeId(2));
        assert_eq!(config.overlay.event_channel_capacity, 8);

        let overlay = OverlayConfig::default().with_channel_prefix("X");
        let config = config.with_overlay(overlay);
        assert_eq!(config.overlay.channel_prefix, "X");
    }
}
