//! Node runtime: the single-consumer receive loop
//!
//! An [`OverlayNode`] owns its configuration, builds the routing table once,
//! and then handles frames from its inbound channel strictly one at a time.
//! Per-frame failures are contained here: they are logged, reported as
//! [`OverlayEvent::Dropped`], and the loop moves on to the next frame.

use std::sync::Arc;

use ringmesh_core::{
    ConfigError, Delivery, Frame, NodeId, OverlayEvent, Transport, TransportError,
};
use ringmesh_routing::RoutingTable;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::NodeConfig;
use crate::error::{HandleError, NodeError, NodeResult};
use crate::handler::{Dispatch, ProtocolHandler};

/// Result of handling one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleOutcome {
    /// A ring request became a routed frame sent to `next_hop`
    Translated { next_hop: NodeId, target: NodeId },
    /// An in-flight frame was passed on to `next_hop`
    Relayed { next_hop: NodeId, target: NodeId },
    /// The journey ended at this node
    Delivered(Delivery),
}

/// One participant of the overlay
pub struct OverlayNode<T: Transport> {
    config: NodeConfig,
    handler: ProtocolHandler,
    transport: Arc<T>,
    events: broadcast::Sender<OverlayEvent>,
}

impl<T: Transport + 'static> OverlayNode<T> {
    /// Validate the configuration and build the routing table
    ///
    /// # Errors
    ///
    /// Fails with [`NodeError::Config`] for a malformed topology or ring,
    /// an out-of-range local id, or a transport bound to another node.
    pub fn new(config: NodeConfig, transport: Arc<T>) -> NodeResult<Self> {
        let overlay = config.overlay.build_topology()?;
        let handler = ProtocolHandler::new(&overlay, config.local_id)?;

        if transport.local_id() != config.local_id {
            return Err(ConfigError::TransportMismatch {
                transport: transport.local_id(),
                configured: config.local_id,
            }
            .into());
        }

        let (events, _) = broadcast::channel(config.overlay.event_channel_capacity.max(1));

        debug!(
            node = %config.local_id,
            ring_predecessor = %handler.ring_predecessor(),
            ring_successor = %handler.ring_successor(),
            "Node configured"
        );

        Ok(Self {
            config,
            handler,
            transport,
            events,
        })
    }

    /// The local node id
    pub fn local_id(&self) -> NodeId {
        self.config.local_id
    }

    /// The node configuration
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// The protocol handler
    pub fn handler(&self) -> &ProtocolHandler {
        &self.handler
    }

    /// The routing table computed at startup
    pub fn routing_table(&self) -> &RoutingTable {
        self.handler.routing_table()
    }

    /// Subscribe to delivery, forward and drop events
    pub fn subscribe_events(&self) -> broadcast::Receiver<OverlayEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: OverlayEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Handle exactly one raw frame
    ///
    /// Emits the matching [`OverlayEvent`]; errors are returned to the caller
    /// after a drop event has been emitted.
    pub async fn process(&self, data: Vec<u8>) -> Result<HandleOutcome, HandleError> {
        let local = self.local_id();
        match self.dispatch(data).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.emit(OverlayEvent::dropped(local, e.drop_reason()));
                Err(e)
            }
        }
    }

    async fn dispatch(&self, data: Vec<u8>) -> Result<HandleOutcome, HandleError> {
        let local = self.local_id();
        let frame = Frame::decode(&data)?;

        match self.handler.handle(frame)? {
            Dispatch::Translate { next_hop, routed } => {
                debug!(
                    node = %local,
                    target = %routed.target,
                    next_hop = %next_hop,
                    "Translated ring request"
                );
                let target = routed.target;
                self.transport
                    .publish(next_hop, Frame::Routed(routed).encode())
                    .await?;
                self.emit(OverlayEvent::forwarded(local, next_hop, target, local));
                Ok(HandleOutcome::Translated { next_hop, target })
            }
            Dispatch::Relay { next_hop, routed } => {
                debug!(
                    node = %local,
                    target = %routed.target,
                    original_sender = %routed.original_sender,
                    next_hop = %next_hop,
                    "Passing frame to next node"
                );
                // Re-publish the bytes as received
                self.transport.publish(next_hop, data).await?;
                self.emit(OverlayEvent::forwarded(
                    local,
                    next_hop,
                    routed.target,
                    routed.original_sender,
                ));
                Ok(HandleOutcome::Relayed {
                    next_hop,
                    target: routed.target,
                })
            }
            Dispatch::Deliver(delivery) => {
                info!(
                    node = %local,
                    original_sender = %delivery.original_sender,
                    payload = %delivery.payload_lossy(),
                    "Reached destination"
                );
                self.emit(OverlayEvent::delivered(delivery.clone()));
                Ok(HandleOutcome::Delivered(delivery))
            }
        }
    }

    /// Run the receive loop until shutdown or until the channel closes
    ///
    /// A closed or dropped shutdown sender also stops the loop.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::Transport`] only for receive failures other than
    /// a closed channel. Per-frame errors never end the loop.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) -> NodeResult<()> {
        let local = self.local_id();
        info!(node = %local, "Waiting for frames");

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!(node = %local, "Node shutting down");
                    break;
                }
                received = self.transport.recv() => match received {
                    Ok(data) => {
                        if let Err(e) = self.process(data).await {
                            match &e {
                                HandleError::Transport(_) => {
                                    error!(node = %local, error = %e, "Failed to publish frame");
                                }
                                _ => warn!(node = %local, error = %e, "Dropping frame"),
                            }
                        }
                    }
                    Err(TransportError::ChannelClosed(channel)) => {
                        info!(node = %local, channel = %channel, "Inbound channel closed");
                        break;
                    }
                    Err(e) => {
                        error!(node = %local, error = %e, "Receive failed");
                        return Err(NodeError::Transport(e));
                    }
                }
            }
        }

        Ok(())
    }

    /// Spawn the receive loop as a background task
    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> JoinHandle<NodeResult<()>> {
        tokio::spawn(self.run(shutdown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringmesh_core::{Direction, DropReason, MockBroker};

    fn example_node(
        broker: &MockBroker,
        local: usize,
    ) -> OverlayNode<ringmesh_core::MockTransport> {
        let transport = Arc::new(broker.subscribe(NodeId(local)));
        OverlayNode::new(NodeConfig::example(NodeId(local)), transport).unwrap()
    }

    #[tokio::test]
    async fn test_process_translates_and_publishes() {
        let broker = MockBroker::new();
        let node = example_node(&broker, 0);
        let neighbour = broker.subscribe(NodeId(2));

        let frame = Frame::ring_request(Direction::Right, "hi").encode();
        let outcome = tokio_test::assert_ok!(node.process(frame).await);
        assert_eq!(
            outcome,
            HandleOutcome::Translated {
                next_hop: NodeId(2),
                target: NodeId(3)
            }
        );
        assert_eq!(neighbour.recv().await.unwrap(), b"13 0 hi".to_vec());
    }

    #[tokio::test]
    async fn test_relay_republishes_received_bytes() {
        let broker = MockBroker::new();
        let node = example_node(&broker, 2);
        let next_hop = broker.subscribe(NodeId(1));

        // Sign and double space survive the relay untouched
        let raw = b"1+03 0 a  b".to_vec();
        let outcome = tokio_test::assert_ok!(node.process(raw.clone()).await);
        assert_eq!(
            outcome,
            HandleOutcome::Relayed {
                next_hop: NodeId(1),
                target: NodeId(3)
            }
        );
        assert_eq!(next_hop.recv().await.unwrap(), raw);
    }

    #[tokio::test]
    async fn test_process_delivers_without_publishing() {
        let broker = MockBroker::new();
        let node = example_node(&broker, 3);
        let mut events = node.subscribe_events();

        let outcome = node.process(b"13 0 hi".to_vec()).await.unwrap();
        let HandleOutcome::Delivered(delivery) = outcome else {
            panic!("Expected delivery");
        };
        assert_eq!(delivery.original_sender, NodeId(0));

        let event = events.recv().await.unwrap();
        assert_eq!(event.as_delivery(), Some(&delivery));
        // Only the node's own channel was declared: nothing was published
        assert_eq!(broker.channel_count(), 1);
    }

    #[tokio::test]
    async fn test_malformed_frame_emits_drop() {
        let broker = MockBroker::new();
        let node = example_node(&broker, 0);
        let mut events = node.subscribe_events();

        let err = node.process(b"7junk".to_vec()).await.unwrap_err();
        assert!(matches!(err, HandleError::Frame(_)));

        match events.recv().await.unwrap() {
            OverlayEvent::Dropped { at, reason, .. } => {
                assert_eq!(at, NodeId(0));
                assert!(matches!(reason, DropReason::MalformedFrame(_)));
            }
            other => panic!("Expected drop event, got {:?}", other),
        }
    }

    #[test]
    fn test_transport_mismatch_rejected() {
        let broker = MockBroker::new();
        let transport = Arc::new(broker.subscribe(NodeId(1)));
        let result = OverlayNode::new(NodeConfig::example(NodeId(0)), transport);
        assert!(matches!(
            result,
            Err(NodeError::Config(ConfigError::TransportMismatch {
                transport: NodeId(1),
                configured: NodeId(0)
            }))
        ));
    }

    #[test]
    fn test_out_of_range_local_rejected() {
        let broker = MockBroker::new();
        let transport = Arc::new(broker.subscribe(NodeId(9)));
        let result = OverlayNode::new(NodeConfig::example(NodeId(9)), transport);
        assert!(matches!(result, Err(NodeError::Config(_))));
    }
}
