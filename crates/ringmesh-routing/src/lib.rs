//! # Ringmesh Routing
//!
//! Per-node routing tables over the physical topology.
//!
//! Each node runs a single-source breadth-first search from itself once at
//! startup and keeps, for every destination, the physical neighbour to hand
//! a frame to. Edges are unweighted, so routes are shortest by hop count.
//!
//! ## Core Components
//!
//! - [`ShortestPathTree`]: BFS distances and parents from one source
//! - [`RoutingTable`]: Immutable destination -> next-hop mapping
//!
//! ## Tie-break
//!
//! The frontier is processed in FIFO order and each node's neighbours are
//! visited in increasing id order. Among several shortest paths, the one
//! discovered first through the lowest-id neighbour wins.
//!
//! ## Example
//!
//! ```rust,ignore
//! use ringmesh_core::{NodeId, TopologyConfig};
//! use ringmesh_routing::RoutingTable;
//!
//! let overlay = TopologyConfig::example().build()?;
//! let table = RoutingTable::build(overlay.topology(), NodeId(0));
//! assert_eq!(table.next_hop(NodeId(3))?, NodeId(2));
//! ```

pub mod bfs;
pub mod table;

// Re-export main types
pub use bfs::ShortestPathTree;
pub use table::{RouteInfo, RoutingTable};

// Re-export core routing types for convenience
pub use ringmesh_core::RoutingError;

/// Result type for routing operations
pub type RoutingResult<T> = Result<T, RoutingError>;
