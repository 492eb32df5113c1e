//! Alternating PING/PONG liveness demo between two peers
//!
//! Frames are a one-byte tag followed by the decimal id of the sender:
//!
//! ```text
//! '0'        initiate
//! '1' <id>   ping from <id>
//! '2' <id>   pong from <id>
//! ```
//!
//! A peer answers a ping only when it comes from a lower id and answers a
//! pong only when it comes from a higher id, so the lower peer drives the
//! exchange. This is unrelated to the ring overlay; it only shares the
//! transport seam.

use std::sync::Arc;
use std::time::Duration;

use ringmesh_core::{FrameError, NodeId, Transport, TransportError};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::error::SimulationResult;

/// Channel prefix used by ping-pong peers
pub const PING_PONG_CHANNEL_PREFIX: &str = "CUSTOM_QUEUE_";

const TAG_INITIATE: u8 = b'0';
const TAG_PING: u8 = b'1';
const TAG_PONG: u8 = b'2';

/// A ping-pong frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingPongFrame {
    Initiate,
    Ping(NodeId),
    Pong(NodeId),
}

impl PingPongFrame {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            PingPongFrame::Initiate => vec![TAG_INITIATE],
            PingPongFrame::Ping(from) => format!("1{}", from).into_bytes(),
            PingPongFrame::Pong(from) => format!("2{}", from).into_bytes(),
        }
    }

    pub fn decode(data: &[u8]) -> Result<Self, FrameError> {
        let (&tag, rest) = data.split_first().ok_or(FrameError::Empty)?;
        match tag {
            TAG_INITIATE => Ok(PingPongFrame::Initiate),
            TAG_PING => Ok(PingPongFrame::Ping(parse_sender(rest)?)),
            TAG_PONG => Ok(PingPongFrame::Pong(parse_sender(rest)?)),
            other => Err(FrameError::UnknownTag(other)),
        }
    }
}

fn parse_sender(raw: &[u8]) -> Result<NodeId, FrameError> {
    if raw.is_empty() {
        return Err(FrameError::MissingField("sender"));
    }
    std::str::from_utf8(raw)
        .ok()
        .and_then(|text| text.parse::<NodeId>().ok())
        .ok_or_else(|| FrameError::InvalidId {
            field: "sender",
            value: String::from_utf8_lossy(raw).into_owned(),
        })
}

/// Pacing and length of an exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingPongConfig {
    /// Completed ping/pong exchanges before both peers stop
    pub rounds: u32,
    /// Pause before every reply
    pub delay: Duration,
}

impl Default for PingPongConfig {
    fn default() -> Self {
        Self {
            rounds: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// Frame counters of one peer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PingPongStats {
    pub pings_sent: u32,
    pub pongs_sent: u32,
    pub pings_received: u32,
    pub pongs_received: u32,
}

/// One side of the exchange
pub struct PingPongPeer<T: Transport> {
    id: NodeId,
    peer: NodeId,
    transport: Arc<T>,
    config: PingPongConfig,
    initiated: bool,
    stats: PingPongStats,
}

impl<T: Transport + 'static> PingPongPeer<T> {
    /// Create a peer that replies to `peer`
    pub fn new(transport: Arc<T>, peer: NodeId, config: PingPongConfig) -> Self {
        Self {
            id: transport.local_id(),
            peer,
            transport,
            config,
            initiated: false,
            stats: PingPongStats::default(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn peer(&self) -> NodeId {
        self.peer
    }

    pub fn stats(&self) -> PingPongStats {
        self.stats
    }

    /// Whether this peer has played all of its rounds
    pub fn is_finished(&self) -> bool {
        self.stats.pongs_received >= self.config.rounds
            || self.stats.pongs_sent >= self.config.rounds
    }

    /// Decide the reply to a frame, if any
    pub fn handle(&mut self, frame: PingPongFrame) -> Option<PingPongFrame> {
        match frame {
            PingPongFrame::Initiate => {
                if self.initiated {
                    debug!(node = %self.id, "Already initiated");
                    return None;
                }
                self.initiated = true;
                Some(PingPongFrame::Ping(self.id))
            }
            PingPongFrame::Ping(from) => {
                self.stats.pings_received += 1;
                info!(node = %self.id, from = %from, "Received a <PING> message");
                (from < self.id).then_some(PingPongFrame::Pong(self.id))
            }
            PingPongFrame::Pong(from) => {
                self.stats.pongs_received += 1;
                info!(node = %self.id, from = %from, "Received a <PONG> message");
                if from <= self.id || self.stats.pongs_received >= self.config.rounds {
                    return None;
                }
                Some(PingPongFrame::Ping(self.id))
            }
        }
    }

    /// Consume frames until the rounds are played, shutdown, or the channel closes
    pub async fn run(
        mut self,
        mut shutdown: broadcast::Receiver<()>,
    ) -> SimulationResult<PingPongStats> {
        info!(node = %self.id, peer = %self.peer, "Waiting for ping-pong frames");

        while !self.is_finished() {
            let data = tokio::select! {
                _ = shutdown.recv() => break,
                received = self.transport.recv() => match received {
                    Ok(data) => data,
                    Err(TransportError::ChannelClosed(_)) => break,
                    Err(e) => return Err(e.into()),
                },
            };

            let frame = match PingPongFrame::decode(&data) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!(node = %self.id, error = %e, "Ignoring ping-pong frame");
                    continue;
                }
            };

            if let Some(reply) = self.handle(frame) {
                tokio::time::sleep(self.config.delay).await;
                self.transport.publish(self.peer, reply.encode()).await?;
                match reply {
                    PingPongFrame::Ping(_) => self.stats.pings_sent += 1,
                    PingPongFrame::Pong(_) => self.stats.pongs_sent += 1,
                    PingPongFrame::Initiate => {}
                }
            }
        }

        info!(node = %self.id, stats = ?self.stats, "Ping-pong finished");
        Ok(self.stats)
    }
}
