//! # Ringmesh Core
//!
//! Core types, errors and seams for a logical ring overlay laid over an
//! arbitrary physical network graph.
//!
//! Every node knows the physical adjacency graph and a fixed ring order.
//! Messages are injected by ring position (left/right neighbour) and then
//! travel hop by hop over physical links until they reach their target.
//!
//! ## Key Types
//!
//! - [`NodeId`]: Zero-indexed node identity
//! - [`Topology`]: Physical adjacency graph
//! - [`VirtualRing`]: Cyclic logical ordering of all nodes
//! - [`OverlayTopology`]: A validated topology plus ring, built from [`TopologyConfig`]
//! - [`Frame`]: The two wire frame kinds (ring request and routed payload)
//! - [`OverlayEvent`]: Observable delivery, forward and drop events
//!
//! ## Key Traits
//!
//! - [`Transport`]: Publish/subscribe channel abstraction keyed by node id
//!
//! The in-memory [`MockBroker`] implements the transport seam for tests and
//! the in-process simulation.

pub mod error;
pub mod event;
pub mod frame;
pub mod identity;
pub mod mock_transport;
pub mod topology;
pub mod transport;

// Re-export main types
pub use error::*;
pub use event::*;
pub use frame::*;
pub use identity::*;
pub use mock_transport::*;
pub use topology::*;
pub use transport::*;
