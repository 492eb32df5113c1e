//! # Ringmesh Node
//!
//! A participant of the ring overlay.
//!
//! The node wires the frame codec, the [`ProtocolHandler`] and the routing
//! table to a [`Transport`](ringmesh_core::Transport): it subscribes to its
//! own channel, handles every inbound frame in delivery order, and publishes
//! outbound frames to physical neighbours.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ringmesh_core::{Direction, MockBroker, NodeId};
//! use ringmesh_node::{NodeConfig, OverlayNode};
//!
//! let broker = MockBroker::new();
//! let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);
//!
//! let node = OverlayNode::new(
//!     NodeConfig::example(NodeId(3)),
//!     Arc::new(broker.subscribe(NodeId(3))),
//! )?;
//! let mut events = node.subscribe_events();
//! node.spawn(shutdown_tx.subscribe());
//! ```

pub mod config;
pub mod error;
pub mod handler;
pub mod runtime;

pub use config::{NodeConfig, OverlayConfig};
pub use error::{HandleError, NodeError, NodeResult};
pub use handler::{Dispatch, ProtocolHandler};
pub use runtime::{HandleOutcome, OverlayNode};
