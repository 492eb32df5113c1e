//! In-memory publish/subscribe broker
//!
//! Provides named, unbounded queues keyed by channel name so whole overlays
//! can run inside one process.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ringmesh_core::{Direction, MockBroker, NodeId, Transport};
//!
//! let broker = MockBroker::new();
//! let node0 = broker.subscribe(NodeId(0));
//!
//! // Frames published before anyone consumes are buffered
//! broker.inject(NodeId(0), Direction::Right, "hello")?;
//! let raw = node0.recv().await?;
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use tokio::sync::{Mutex, mpsc};
use tracing::trace;

use crate::error::TransportError;
use crate::frame::{Direction, Frame};
use crate::identity::NodeId;
use crate::transport::{DEFAULT_CHANNEL_PREFIX, Transport, channel_name};

/// One named queue
struct Queue {
    tx: mpsc::UnboundedSender<Vec<u8>>,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<Vec<u8>>>>,
}

impl Queue {
    fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
        }
    }
}

struct BrokerInner {
    prefix: String,
    queues: DashMap<String, Queue>,
}

/// In-memory broker shared by every node of a simulated overlay
///
/// Queues are declared lazily on first publish or subscribe, so frames sent
/// to a node that has not started consuming yet are buffered.
#[derive(Clone)]
pub struct MockBroker {
    inner: Arc<BrokerInner>,
}

impl Default for MockBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBroker {
    /// Create a broker using the default channel prefix
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_CHANNEL_PREFIX)
    }

    /// Create a broker with a custom channel prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(BrokerInner {
                prefix: prefix.into(),
                queues: DashMap::new(),
            }),
        }
    }

    /// The channel prefix
    pub fn prefix(&self) -> &str {
        &self.inner.prefix
    }

    /// Channel name for a node
    pub fn channel_for(&self, node: NodeId) -> String {
        channel_name(&self.inner.prefix, node)
    }

    fn declare(&self, channel: &str) -> dashmap::mapref::one::RefMut<'_, String, Queue> {
        self.inner
            .queues
            .entry(channel.to_string())
            .or_insert_with(Queue::new)
    }

    /// Bind a transport to a node's inbound channel
    pub fn subscribe(&self, node: NodeId) -> MockTransport {
        let channel = self.channel_for(node);
        let inbox = self.declare(&channel).rx.clone();
        MockTransport {
            local_id: node,
            channel,
            broker: self.clone(),
            inbox,
        }
    }

    /// Publish raw bytes to a node's channel
    pub fn publish_raw(&self, to: NodeId, data: Vec<u8>) -> Result<(), TransportError> {
        let channel = self.channel_for(to);
        trace!(channel = %channel, len = data.len(), "Publishing frame");
        self.declare(&channel)
            .tx
            .send(data)
            .map_err(|_| TransportError::ChannelClosed(channel))
    }

    /// Inject a ring request at a node
    pub fn inject(
        &self,
        node: NodeId,
        direction: Direction,
        payload: impl Into<Bytes>,
    ) -> Result<(), TransportError> {
        self.publish_raw(node, Frame::ring_request(direction, payload).encode())
    }

    /// Remove a node's queue
    ///
    /// The subscriber drains what is already buffered and then sees
    /// [`TransportError::ChannelClosed`].
    pub fn close(&self, node: NodeId) {
        self.inner.queues.remove(&self.channel_for(node));
    }

    /// Number of declared channels
    pub fn channel_count(&self) -> usize {
        self.inner.queues.len()
    }
}

/// Transport bound to one node's channel of a [`MockBroker`]
pub struct MockTransport {
    local_id: NodeId,
    channel: String,
    broker: MockBroker,
    inbox: Arc<Mutex<mpsc::UnboundedReceiver<Vec<u8>>>>,
}

impl MockTransport {
    /// Name of the inbound channel
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// The broker this transport is attached to
    pub fn broker(&self) -> &MockBroker {
        &self.broker
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn local_id(&self) -> NodeId {
        self.local_id
    }

    async fn publish(&self, to: NodeId, data: Vec<u8>) -> Result<(), TransportError> {
        self.broker.publish_raw(to, data)
    }

    async fn recv(&self) -> Result<Vec<u8>, TransportError> {
        let mut inbox = self.inbox.lock().await;
        inbox
            .recv()
            .await
            .ok_or_else(|| TransportError::ChannelClosed(self.channel.clone()))
    }

    async fn try_recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut inbox = self.inbox.lock().await;
        match inbox.try_recv() {
            Ok(data) => Ok(Some(data)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => {
                Err(TransportError::ChannelClosed(self.channel.clone()))
            }
        }
    }
}
