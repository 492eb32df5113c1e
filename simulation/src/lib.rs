//! # Ringmesh Simulation
//!
//! Runs a whole ring overlay inside one process.
//!
//! ## Architecture
//!
//! - **Cluster** (`cluster.rs`): one node task per overlay node over a shared
//!   in-memory broker, with journeys traced hop by hop
//! - **Ping-pong** (`pingpong.rs`): the two-peer PING/PONG liveness demo
//! - **Scenarios** (`scenarios.rs`): the full ring tour and the ping-pong run
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use ringmesh_core::{Direction, NodeId};
//! use ringmesh_node::OverlayConfig;
//! use ringmesh_simulation::LocalCluster;
//!
//! let mut cluster = LocalCluster::start(&OverlayConfig::default())?;
//! let journey = cluster
//!     .send(NodeId(0), Direction::Right, "hi", Duration::from_secs(5))
//!     .await?;
//! println!("{}", journey); // [1] -> [3] -> [2] -> [4]
//! cluster.shutdown().await?;
//! ```

pub mod cluster;
pub mod error;
pub mod pingpong;
pub mod scenarios;

pub use cluster::{Journey, LocalCluster};
pub use error::{SimulationError, SimulationResult};
pub use pingpong::{PingPongConfig, PingPongFrame, PingPongPeer, PingPongStats};
pub use scenarios::{TourReport, run_ping_pong, run_tour};
