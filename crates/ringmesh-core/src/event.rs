//! Overlay events
//!
//! Nodes publish these so the surrounding application can observe
//! journeys without being part of the forwarding path.

use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::identity::NodeId;

/// A payload that reached its target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Node the payload was addressed to (the delivering node)
    pub target: NodeId,
    /// Node that translated the original ring request
    pub original_sender: NodeId,
    /// The application payload
    pub payload: Bytes,
}

impl Delivery {
    /// Payload as lossy UTF-8 (for console output)
    pub fn payload_lossy(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

/// Reasons why a frame is dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// Frame could not be parsed
    MalformedFrame(String),
    /// No physical path to the destination
    NoRoute { destination: NodeId },
    /// The transport refused the outbound frame
    TransportFailure(String),
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DropReason::MalformedFrame(detail) => write!(f, "malformed frame: {}", detail),
            DropReason::NoRoute { destination } => write!(f, "no route to {}", destination),
            DropReason::TransportFailure(detail) => write!(f, "transport failure: {}", detail),
        }
    }
}

/// Events that occur at a node
#[derive(Debug, Clone)]
pub enum OverlayEvent {
    /// A journey ended at this node
    Delivered {
        delivery: Delivery,
        timestamp: DateTime<Utc>,
    },

    /// A routed frame was handed to a physical neighbour
    Forwarded {
        at: NodeId,
        next_hop: NodeId,
        target: NodeId,
        original_sender: NodeId,
        timestamp: DateTime<Utc>,
    },

    /// A frame was dropped
    Dropped {
        at: NodeId,
        reason: DropReason,
        timestamp: DateTime<Utc>,
    },
}

impl OverlayEvent {
    /// Create a delivery event stamped now
    pub fn delivered(delivery: Delivery) -> Self {
        Self::Delivered {
            delivery,
            timestamp: Utc::now(),
        }
    }

    /// Create a forward event stamped now
    pub fn forwarded(
        at: NodeId,
        next_hop: NodeId,
        target: NodeId,
        original_sender: NodeId,
    ) -> Self {
        Self::Forwarded {
            at,
            next_hop,
            target,
            original_sender,
            timestamp: Utc::now(),
        }
    }

    /// Create a drop event stamped now
    pub fn dropped(at: NodeId, reason: DropReason) -> Self {
        Self::Dropped {
            at,
            reason,
            timestamp: Utc::now(),
        }
    }

    /// Get the timestamp of this event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Delivered { timestamp, .. } => *timestamp,
            Self::Forwarded { timestamp, .. } => *timestamp,
            Self::Dropped { timestamp, .. } => *timestamp,
        }
    }

    /// The delivery carried by this event, if it is one
    pub fn as_delivery(&self) -> Option<&Delivery> {
        match self {
            Self::Delivered { delivery, .. } => Some(delivery),
            _ => None,
        }
    }
}
