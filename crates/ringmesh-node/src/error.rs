//! Error types for the overlay node

use ringmesh_core::{ConfigError, DropReason, FrameError, RoutingError, TransportError};
use thiserror::Error;

/// Errors that stop a node from starting or running
#[derive(Debug, Error)]
pub enum NodeError {
    /// Malformed topology, ring order or node settings
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Transport failed in a way the receive loop cannot recover from
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Configuration file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid TOML for an overlay
    #[error("Configuration parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Errors contained within the handling of a single frame
///
/// These never reach the receive loop's caller: the frame is dropped, a
/// diagnostic is logged and the node keeps consuming.
#[derive(Debug, Error)]
pub enum HandleError {
    #[error("Malformed frame: {0}")]
    Frame(#[from] FrameError),

    #[error("Routing error: {0}")]
    Routing(#[from] RoutingError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

impl HandleError {
    /// Why the frame was dropped, for observers
    pub fn drop_reason(&self) -> DropReason {
        match self {
            HandleError::Frame(e) => DropReason::MalformedFrame(e.to_string()),
            HandleError::Routing(
                RoutingError::NoRoute { destination }
                | RoutingError::UnknownDestination { destination, .. },
            ) => DropReason::NoRoute {
                destination: *destination,
            },
            HandleError::Transport(e) => DropReason::TransportFailure(e.to_string()),
        }
    }
}

/// Result type alias for node operations
pub type NodeResult<T> = Result<T, NodeError>;
