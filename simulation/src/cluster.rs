//! A whole overlay running in one process
//!
//! [`LocalCluster`] starts one [`OverlayNode`] task per node, all sharing a
//! single [`MockBroker`]. Node events are merged into one stream so a
//! journey can be followed from injection to delivery.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use ringmesh_core::{
    ConfigError, Delivery, Direction, MockBroker, NodeId, OverlayEvent, OverlayTopology,
};
use ringmesh_node::{NodeConfig, NodeResult, OverlayConfig, OverlayNode};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{SimulationError, SimulationResult};

/// One completed journey
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Journey {
    /// Node the ring request was injected at
    pub origin: NodeId,
    /// Ring direction of the request
    pub direction: Direction,
    /// Ring neighbour the journey should end at
    pub expected: NodeId,
    /// Every node visited, origin and target included
    pub path: Vec<NodeId>,
    /// What the target delivered
    pub delivery: Delivery,
}

impl Journey {
    /// Number of physical links crossed
    pub fn hops(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    /// Whether the delivery happened at the expected ring neighbour
    pub fn reached_expected(&self) -> bool {
        self.delivery.target == self.expected
    }
}

impl fmt::Display for Journey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path: Vec<String> = self
            .path
            .iter()
            .map(|node| format!("[{}]", node.one_indexed()))
            .collect();
        write!(f, "{}", path.join(" -> "))
    }
}

/// Every node of an overlay, each on its own task
pub struct LocalCluster {
    overlay: OverlayTopology,
    broker: MockBroker,
    events: mpsc::UnboundedReceiver<OverlayEvent>,
    shutdown: broadcast::Sender<()>,
    nodes: Vec<JoinHandle<NodeResult<()>>>,
    relays: Vec<JoinHandle<()>>,
}

impl LocalCluster {
    /// Start every node of the configured overlay
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: &OverlayConfig) -> SimulationResult<Self> {
        let overlay = config.build_topology()?;
        let broker = MockBroker::with_prefix(config.channel_prefix.clone());
        let (shutdown, _) = broadcast::channel(1);
        let (events_tx, events) = mpsc::unbounded_channel();

        let node_count = overlay.node_count();
        let mut nodes = Vec::with_capacity(node_count);
        let mut relays = Vec::with_capacity(node_count);

        for id in (0..node_count).map(NodeId) {
            let node = OverlayNode::new(
                NodeConfig::new(id, config.clone()),
                Arc::new(broker.subscribe(id)),
            )?;
            relays.push(tokio::spawn(relay_events(
                node.subscribe_events(),
                events_tx.clone(),
            )));
            nodes.push(node.spawn(shutdown.subscribe()));
        }

        info!(
            nodes = node_count,
            prefix = %config.channel_prefix,
            "Cluster started"
        );

        Ok(Self {
            overlay,
            broker,
            events,
            shutdown,
            nodes,
            relays,
        })
    }

    /// The validated topology and ring
    pub fn overlay(&self) -> &OverlayTopology {
        &self.overlay
    }

    /// The broker all nodes share
    pub fn broker(&self) -> &MockBroker {
        &self.broker
    }

    /// Number of running nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Inject a ring request and follow it until delivery
    ///
    /// Only one journey should be in flight at a time.
    ///
    /// # Errors
    ///
    /// [`SimulationError::Dropped`] if any node drops the frame and
    /// [`SimulationError::Timeout`] if nothing is delivered in time.
    pub async fn send(
        &mut self,
        origin: NodeId,
        direction: Direction,
        payload: impl Into<Bytes>,
        timeout: Duration,
    ) -> SimulationResult<Journey> {
        let node_count = self.overlay.node_count();
        let Some(expected) = self.overlay.ring().neighbor(origin, direction) else {
            return Err(ConfigError::NodeOutOfRange {
                node: origin.index(),
                node_count,
            }
            .into());
        };

        self.broker.inject(origin, direction, payload.into())?;
        debug!(origin = %origin, direction = %direction, "Injected ring request");

        let events = &mut self.events;
        let (delivery, path) = tokio::time::timeout(timeout, async {
            // Events of different nodes may arrive out of order
            let mut forwards: HashMap<NodeId, NodeId> = HashMap::new();
            let mut delivery: Option<Delivery> = None;

            loop {
                if let Some(delivered) = &delivery {
                    let path = trace_path(origin, delivered.target, &forwards, node_count);
                    if let Some(path) = path {
                        return Ok((delivered.clone(), path));
                    }
                }

                match events.recv().await {
                    Some(OverlayEvent::Forwarded {
                        at,
                        next_hop,
                        original_sender,
                        ..
                    }) if original_sender == origin => {
                        forwards.insert(at, next_hop);
                    }
                    Some(OverlayEvent::Delivered { delivery: d, .. })
                        if d.original_sender == origin =>
                    {
                        delivery = Some(d);
                    }
                    Some(OverlayEvent::Dropped { at, reason, .. }) => {
                        return Err(SimulationError::Dropped { at, reason });
                    }
                    Some(_) => {}
                    None => return Err(SimulationError::EventsClosed),
                }
            }
        })
        .await
        .map_err(|_| SimulationError::Timeout(timeout))??;

        Ok(Journey {
            origin,
            direction,
            expected,
            path,
            delivery,
        })
    }

    /// Stop every node and wait for the tasks to finish
    pub async fn shutdown(self) -> SimulationResult<()> {
        let LocalCluster {
            shutdown,
            nodes,
            relays,
            ..
        } = self;

        // Nodes that already stopped have no receiver left
        let _ = shutdown.send(());
        for node in nodes {
            node.await??;
        }
        for relay in relays {
            relay.await?;
        }

        info!("Cluster stopped");
        Ok(())
    }
}

/// Follow recorded forwards from `origin` to `target`
fn trace_path(
    origin: NodeId,
    target: NodeId,
    forwards: &HashMap<NodeId, NodeId>,
    node_count: usize,
) -> Option<Vec<NodeId>> {
    let mut path = vec![origin];
    let mut current = origin;
    while current != target {
        if path.len() > node_count {
            return None;
        }
        current = *forwards.get(&current)?;
        path.push(current);
    }
    Some(path)
}

async fn relay_events(
    mut events: broadcast::Receiver<OverlayEvent>,
    merged: mpsc::UnboundedSender<OverlayEvent>,
) {
    loop {
        match events.recv().await {
            Ok(event) => {
                if merged.send(event).is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Event relay lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_path_follows_forwards() {
        let forwards = HashMap::from([
            (NodeId(0), NodeId(2)),
            (NodeId(2), NodeId(1)),
            (NodeId(1), NodeId(3)),
        ]);
        let path = trace_path(NodeId(0), NodeId(3), &forwards, 5).unwrap();
        assert_eq!(path, vec![NodeId(0), NodeId(2), NodeId(1), NodeId(3)]);
    }

    #[test]
    fn test_trace_path_incomplete() {
        let forwards = HashMap::from([(NodeId(0), NodeId(2))]);
        assert!(trace_path(NodeId(0), NodeId(3), &forwards, 5).is_none());
    }

    #[test]
    fn test_trace_path_cycle_is_bounded() {
        let forwards = HashMap::from([(NodeId(0), NodeId(1)), (NodeId(1), NodeId(0))]);
        assert!(trace_path(NodeId(0), NodeId(3), &forwards, 4).is_none());
    }

    #[tokio::test]
    async fn test_send_follows_example_journey() {
        let mut cluster = LocalCluster::start(&OverlayConfig::default()).unwrap();
        assert_eq!(cluster.node_count(), 5);

        let journey = cluster
            .send(NodeId(0), Direction::Right, "hi", Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(journey.expected, NodeId(3));
        assert!(journey.reached_expected());
        assert_eq!(journey.hops(), 3);
        assert_eq!(journey.to_string(), "[1] -> [3] -> [2] -> [4]");
        assert_eq!(&journey.delivery.payload[..], b"hi");

        cluster.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_send_reports_drop() {
        let config = OverlayConfig::default().with_topology(ringmesh_core::TopologyConfig {
            node_count: Some(3),
            edges: vec![[0, 1]],
            ring: vec![0, 1, 2],
            one_indexed: false,
        });
        let mut cluster = LocalCluster::start(&config).unwrap();

        let err = cluster
            .send(NodeId(1), Direction::Right, "lost", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SimulationError::Dropped { at: NodeId(1), .. }
        ));

        cluster.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_send_from_unknown_node() {
        let mut cluster = LocalCluster::start(&OverlayConfig::default()).unwrap();
        let err = cluster
            .send(NodeId(9), Direction::Left, "x", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, SimulationError::Config(_)));
        cluster.shutdown().await.unwrap();
    }
}
