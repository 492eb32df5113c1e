//! Transport abstraction for frame delivery
//!
//! The [`Transport`] trait models a publish/subscribe system with one named
//! channel per node. A node consumes only its own channel and publishes to
//! the channels of other nodes. Channel names follow the
//! `<prefix><zero-indexed-id>` convention produced by [`channel_name`].
//!
//! ## Implementations
//!
//! - [`MockTransport`](crate::MockTransport): In-memory broker for tests and
//!   the in-process simulation

use async_trait::async_trait;

use crate::error::TransportError;
use crate::identity::NodeId;

/// Default channel name prefix
pub const DEFAULT_CHANNEL_PREFIX: &str = "QUEUE";

/// Name of the inbound channel for a node
pub fn channel_name(prefix: &str, node: NodeId) -> String {
    format!("{}{}", prefix, node.index())
}

/// Publish/subscribe transport bound to one node's inbound channel
///
/// The overlay relies on eventual, unbounded-buffer delivery to the named
/// channel. No ordering is assumed beyond FIFO per publisher.
#[async_trait]
pub trait Transport: Send + Sync {
    /// The node whose channel this transport consumes
    fn local_id(&self) -> NodeId;

    /// Publish a raw frame to another node's channel
    ///
    /// # Errors
    ///
    /// Returns an error if the transport refuses the frame.
    async fn publish(&self, to: NodeId, data: Vec<u8>) -> Result<(), TransportError>;

    /// Receive the next raw frame from the local channel
    ///
    /// Waits until a frame is available. Returns
    /// [`TransportError::ChannelClosed`] once the channel can never yield
    /// another frame.
    async fn recv(&self) -> Result<Vec<u8>, TransportError>;

    /// Try to receive a frame without waiting
    ///
    /// Returns `Ok(None)` if no frame is immediately available.
    async fn try_recv(&self) -> Result<Option<Vec<u8>>, TransportError>;
}
