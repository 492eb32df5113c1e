//! Two-phase forwarding protocol
//!
//! A journey moves through three states:
//!
//! ```text
//! Injected(RingRequest) --translate--> Routed --forward*--> Delivered
//! ```
//!
//! The [`ProtocolHandler`] is pure: it decides what to do with a parsed
//! frame and leaves publishing to the runtime. Delivery is fire-and-forget;
//! there is no acknowledgment, retry or deduplication.

use ringmesh_core::{
    ConfigError, Delivery, Direction, Frame, NodeId, OverlayTopology, RoutedFrame,
};
use ringmesh_routing::{RoutingResult, RoutingTable};

/// What the runtime must do with a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// A ring request was translated into a new routed frame
    Translate {
        next_hop: NodeId,
        routed: RoutedFrame,
    },
    /// An in-flight frame must be re-published unchanged
    Relay {
        next_hop: NodeId,
        routed: RoutedFrame,
    },
    /// The journey ends here
    Deliver(Delivery),
}

impl Dispatch {
    /// The neighbour the frame goes to, `None` for local delivery
    pub fn next_hop(&self) -> Option<NodeId> {
        match self {
            Dispatch::Translate { next_hop, .. } | Dispatch::Relay { next_hop, .. } => {
                Some(*next_hop)
            }
            Dispatch::Deliver(_) => None,
        }
    }
}

/// Per-node protocol state: ring neighbours and the routing table
///
/// Everything is computed once in [`ProtocolHandler::new`] and read-only
/// afterwards.
#[derive(Debug, Clone)]
pub struct ProtocolHandler {
    local: NodeId,
    ring_predecessor: NodeId,
    ring_successor: NodeId,
    table: RoutingTable,
}

impl ProtocolHandler {
    /// Resolve ring neighbours and build the routing table for `local`
    pub fn new(overlay: &OverlayTopology, local: NodeId) -> Result<Self, ConfigError> {
        let node_count = overlay.node_count();
        local.ensure_within(node_count)?;

        let out_of_range = || ConfigError::NodeOutOfRange {
            node: local.index(),
            node_count,
        };
        let ring_predecessor = overlay.predecessor_in_ring(local).ok_or_else(out_of_range)?;
        let ring_successor = overlay.successor_in_ring(local).ok_or_else(out_of_range)?;

        Ok(Self {
            local,
            ring_predecessor,
            ring_successor,
            table: RoutingTable::build(overlay.topology(), local),
        })
    }

    /// The local node
    pub fn local(&self) -> NodeId {
        self.local
    }

    /// Ring predecessor of the local node
    pub fn ring_predecessor(&self) -> NodeId {
        self.ring_predecessor
    }

    /// Ring successor of the local node
    pub fn ring_successor(&self) -> NodeId {
        self.ring_successor
    }

    /// The local routing table
    pub fn routing_table(&self) -> &RoutingTable {
        &self.table
    }

    /// Ring neighbour addressed by a direction
    pub fn ring_target(&self, direction: Direction) -> NodeId {
        match direction {
            Direction::Left => self.ring_predecessor,
            Direction::Right => self.ring_successor,
        }
    }

    /// Decide what to do with a parsed frame
    ///
    /// # Errors
    ///
    /// Returns a routing error when the frame's target has no path from
    /// this node. The error is fatal to this journey only.
    pub fn handle(&self, frame: Frame) -> RoutingResult<Dispatch> {
        match frame {
            Frame::RingRequest { direction, payload } => {
                let target = self.ring_target(direction);
                let next_hop = self.table.next_hop(target)?;
                Ok(Dispatch::Translate {
                    next_hop,
                    routed: RoutedFrame {
                        target,
                        original_sender: self.local,
                        payload,
                    },
                })
            }
            Frame::Routed(routed) if routed.target == self.local => {
                Ok(Dispatch::Deliver(Delivery {
                    target: routed.target,
                    original_sender: routed.original_sender,
                    payload: routed.payload,
                }))
            }
            Frame::Routed(routed) => {
                let next_hop = self.table.next_hop(routed.target)?;
                Ok(Dispatch::Relay { next_hop, routed })
            }
        }
    }
}
