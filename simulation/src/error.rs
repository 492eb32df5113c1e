//! Simulation errors

use std::time::Duration;

use ringmesh_core::{ConfigError, DropReason, NodeId, TransportError};
use ringmesh_node::NodeError;
use thiserror::Error;

/// Errors raised while driving an in-process overlay
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Node error: {0}")]
    Node(#[from] NodeError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Frame dropped at node {at}: {reason}")]
    Dropped { at: NodeId, reason: DropReason },

    #[error("No delivery within {0:?}")]
    Timeout(Duration),

    #[error("Event stream closed")]
    EventsClosed,

    #[error("Task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Result type for simulation operations
pub type SimulationResult<T> = Result<T, SimulationError>;
