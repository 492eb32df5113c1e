//! Error types for the ringmesh overlay

use thiserror::Error;

use crate::identity::NodeId;

/// Top-level error type for ringmesh
#[derive(Debug, Error)]
pub enum RingmeshError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Malformed frame: {0}")]
    Frame(#[from] FrameError),

    #[error("Routing error: {0}")]
    Routing(#[from] RoutingError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Malformed topology or ring order
///
/// Fatal to node startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Topology has no nodes")]
    EmptyTopology,

    #[error("Adjacency matrix is not square: row {row} has {len} entries, expected {expected}")]
    NotSquare {
        row: usize,
        len: usize,
        expected: usize,
    },

    #[error("Adjacency matrix is not symmetric at ({a}, {b})")]
    Asymmetric { a: usize, b: usize },

    #[error("Self-loop on node {0}")]
    SelfLoop(usize),

    #[error("Node {node} out of range for a network of {node_count} nodes")]
    NodeOutOfRange { node: usize, node_count: usize },

    #[error("Ring order has {actual} entries, expected {expected}")]
    RingLength { expected: usize, actual: usize },

    #[error("Node {0} appears more than once in the ring order")]
    DuplicateRingEntry(usize),

    #[error("Node {0} is missing from the ring order")]
    MissingRingEntry(usize),

    #[error("Zero is not a valid one-indexed node id")]
    ZeroInOneIndexed,

    #[error("Transport is bound to node {transport}, not node {configured}")]
    TransportMismatch {
        transport: NodeId,
        configured: NodeId,
    },

    #[error("Ping-pong peers must differ, both are {0}")]
    SamePeers(NodeId),
}

/// Frame that cannot be parsed
///
/// Recovered locally: the frame is dropped and the node keeps consuming.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("Empty frame")]
    Empty,

    #[error("Unknown frame tag: {0:#04x}")]
    UnknownTag(u8),

    #[error("Ring request is missing its direction")]
    MissingDirection,

    #[error("Invalid ring direction: {0:#04x}")]
    InvalidDirection(u8),

    #[error("Routed frame is missing its {0} field")]
    MissingField(&'static str),

    #[error("Invalid {field} id: {value:?}")]
    InvalidId { field: &'static str, value: String },
}

/// Errors related to routing
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoutingError {
    #[error("No route available to node {destination}")]
    NoRoute { destination: NodeId },

    #[error("Node {destination} is not part of a network of {node_count} nodes")]
    UnknownDestination {
        destination: NodeId,
        node_count: usize,
    },
}

/// Errors related to the publish/subscribe transport
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Channel closed: {0}")]
    ChannelClosed(String),

    #[error("Publish failed: {0}")]
    PublishFailed(String),

    #[error("Receive failed: {0}")]
    ReceiveFailed(String),
}

/// Result type alias for ringmesh operations
pub type RingmeshResult<T> = Result<T, RingmeshError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Asymmetric { a: 1, b: 3 };
        assert!(format!("{}", err).contains("(1, 3)"));

        let err = ConfigError::NotSquare {
            row: 2,
            len: 4,
            expected: 5,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("row 2"));
        assert!(msg.contains("expected 5"));

        let msg = ConfigError::DuplicateRingEntry(4).to_string();
        assert!(msg.contains("more than once"));

        let err = ConfigError::TransportMismatch {
            transport: NodeId(1),
            configured: NodeId(0),
        };
        assert_eq!(err.to_string(), "Transport is bound to node 1, not node 0");
        let msg = ConfigError::SamePeers(NodeId(2)).to_string();
        assert!(msg.ends_with("both are 2"));
    }

    #[test]
    fn test_frame_error_display() {
        assert!(format!("{}", FrameError::UnknownTag(b'7')).contains("0x37"));
        let err = FrameError::InvalidId {
            field: "target",
            value: "abc".to_string(),
        };
        assert!(format!("{}", err).contains("target"));
        assert!(format!("{}", err).contains("abc"));
    }

    #[test]
    fn test_routing_error_display() {
        let err = RoutingError::NoRoute {
            destination: NodeId(3),
        };
        assert!(format!("{}", err).contains("No route"));
        assert!(format!("{}", err).contains('3'));
    }

    #[test]
    fn test_error_conversions() {
        let err: RingmeshError = ConfigError::EmptyTopology.into();
        assert!(matches!(err, RingmeshError::Config(_)));

        let err: RingmeshError = FrameError::Empty.into();
        assert!(matches!(err, RingmeshError::Frame(_)));

        let err: RingmeshError = RoutingError::NoRoute {
            destination: NodeId(1),
        }
        .into();
        assert!(matches!(err, RingmeshError::Routing(_)));

        let err: RingmeshError = TransportError::ChannelClosed("QUEUE0".into()).into();
        assert!(format!("{}", err).contains("QUEUE0"));
    }
}
