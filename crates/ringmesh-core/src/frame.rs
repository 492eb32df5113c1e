//! Wire frames and their codec
//!
//! A frame is a flat byte string whose first byte is a type tag:
//!
//! - `'0'` ring request: `'0' <direction: 'L' | 'R'> <payload...>`
//! - `'1'` routed: `'1' <target> ' ' <original sender> ' ' <payload...>`
//!
//! Ids in routed frames are zero-indexed decimal. The payload is opaque and
//! may itself contain spaces; a routed frame is split into at most three
//! fields so the payload is never split further.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::FrameError;
use crate::identity::NodeId;

/// Tag byte of a ring request frame
pub const TAG_RING_REQUEST: u8 = b'0';

/// Tag byte of a routed frame
pub const TAG_ROUTED: u8 = b'1';

const FIELD_SEPARATOR: u8 = b' ';

/// Direction around the virtual ring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Towards the ring predecessor
    Left,
    /// Towards the ring successor
    Right,
}

impl Direction {
    /// Wire byte for this direction
    pub const fn as_byte(self) -> u8 {
        match self {
            Direction::Left => b'L',
            Direction::Right => b'R',
        }
    }

    /// Parse a wire byte
    pub fn from_byte(byte: u8) -> Result<Self, FrameError> {
        match byte {
            b'L' => Ok(Direction::Left),
            b'R' => Ok(Direction::Right),
            other => Err(FrameError::InvalidDirection(other)),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Left => write!(f, "L"),
            Direction::Right => write!(f, "R"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "l" | "left" => Ok(Direction::Left),
            "r" | "right" => Ok(Direction::Right),
            _ => Err(format!("invalid direction {s:?}, expected L or R")),
        }
    }
}

/// A frame travelling between physical neighbours towards its target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedFrame {
    /// Final destination
    pub target: NodeId,
    /// Node that translated the ring request into this frame
    pub original_sender: NodeId,
    /// Opaque application payload
    pub payload: Bytes,
}

/// One discrete message unit exchanged between nodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Ring-relative injection, consumed by the node that receives it
    RingRequest {
        direction: Direction,
        payload: Bytes,
    },
    /// In-flight payload addressed to a physical node id
    Routed(RoutedFrame),
}

impl Frame {
    /// Create a ring request frame
    pub fn ring_request(direction: Direction, payload: impl Into<Bytes>) -> Self {
        Frame::RingRequest {
            direction,
            payload: payload.into(),
        }
    }

    /// Create a routed frame
    pub fn routed(target: NodeId, original_sender: NodeId, payload: impl Into<Bytes>) -> Self {
        Frame::Routed(RoutedFrame {
            target,
            original_sender,
            payload: payload.into(),
        })
    }

    /// Short name of the frame kind (for logging)
    pub fn kind(&self) -> &'static str {
        match self {
            Frame::RingRequest { .. } => "ring_request",
            Frame::Routed(_) => "routed",
        }
    }

    /// The opaque payload carried by this frame
    pub fn payload(&self) -> &Bytes {
        match self {
            Frame::RingRequest { payload, .. } => payload,
            Frame::Routed(routed) => &routed.payload,
        }
    }

    /// Serialize to the wire representation
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Frame::RingRequest { direction, payload } => {
                let mut out = Vec::with_capacity(2 + payload.len());
                out.push(TAG_RING_REQUEST);
                out.push(direction.as_byte());
                out.extend_from_slice(payload);
                out
            }
            Frame::Routed(routed) => {
                let header = format!("{} {} ", routed.target, routed.original_sender);
                let mut out = Vec::with_capacity(1 + header.len() + routed.payload.len());
                out.push(TAG_ROUTED);
                out.extend_from_slice(header.as_bytes());
                out.extend_from_slice(&routed.payload);
                out
            }
        }
    }

    /// Parse the wire representation
    pub fn decode(data: &[u8]) -> Result<Self, FrameError> {
        let (&tag, body) = data.split_first().ok_or(FrameError::Empty)?;
        match tag {
            TAG_RING_REQUEST => {
                let (&direction, payload) =
                    body.split_first().ok_or(FrameError::MissingDirection)?;
                Ok(Frame::RingRequest {
                    direction: Direction::from_byte(direction)?,
                    payload: Bytes::copy_from_slice(payload),
                })
            }
            TAG_ROUTED => {
                let mut fields = body.splitn(3, |b| *b == FIELD_SEPARATOR);
                let target = parse_id(fields.next(), "target")?;
                let original_sender = parse_id(fields.next(), "original_sender")?;
                let payload = fields.next().ok_or(FrameError::MissingField("payload"))?;
                Ok(Frame::Routed(RoutedFrame {
                    target,
                    original_sender,
                    payload: Bytes::copy_from_slice(payload),
                }))
            }
            other => Err(FrameError::UnknownTag(other)),
        }
    }
}

fn parse_id(field: Option<&[u8]>, name: &'static str) -> Result<NodeId, FrameError> {
    let raw = field
        .filter(|raw| !raw.is_empty())
        .ok_or(FrameError::MissingField(name))?;
    std::str::from_utf8(raw)
        .ok()
        .and_then(|text| text.parse::<usize>().ok())
        .map(NodeId)
        .ok_or_else(|| FrameError::InvalidId {
            field: name,
            value: String::from_utf8_lossy(raw).into_owned(),
        })
}
