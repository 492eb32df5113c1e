//! Integration tests for ringmesh-node
//!
//! Whole overlays run over the in-memory broker, one task per node.

use std::sync::Arc;
use std::time::Duration;

use ringmesh_core::{
    Direction, DropReason, Frame, MockBroker, NodeId, OverlayEvent, TopologyConfig,
};
use ringmesh_node::{NodeConfig, NodeResult, OverlayConfig, OverlayNode};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

const WAIT: Duration = Duration::from_secs(5);

struct Overlay {
    broker: MockBroker,
    events: Vec<broadcast::Receiver<OverlayEvent>>,
    shutdown: broadcast::Sender<()>,
    handles: Vec<JoinHandle<NodeResult<()>>>,
}

fn start_overlay(overlay: OverlayConfig) -> Overlay {
    let node_count = overlay.topology.build().unwrap().node_count();
    let broker = MockBroker::with_prefix(overlay.channel_prefix.clone());
    let (shutdown, _) = broadcast::channel(1);

    let mut events = Vec::new();
    let mut handles = Vec::new();
    for id in (0..node_count).map(NodeId) {
        let node = OverlayNode::new(
            NodeConfig::new(id, overlay.clone()),
            Arc::new(broker.subscribe(id)),
        )
        .unwrap();
        events.push(node.subscribe_events());
        handles.push(node.spawn(shutdown.subscribe()));
    }

    Overlay {
        broker,
        events,
        shutdown,
        handles,
    }
}

async fn next_delivery(events: &mut broadcast::Receiver<OverlayEvent>) -> ringmesh_core::Delivery {
    tokio::time::timeout(WAIT, async {
        loop {
            if let OverlayEvent::Delivered { delivery, .. } = events.recv().await.unwrap() {
                return delivery;
            }
        }
    })
    .await
    .expect("timed out waiting for delivery")
}

async fn next_drop(events: &mut broadcast::Receiver<OverlayEvent>) -> DropReason {
    tokio::time::timeout(WAIT, async {
        loop {
            if let OverlayEvent::Dropped { reason, .. } = events.recv().await.unwrap() {
                return reason;
            }
        }
    })
    .await
    .expect("timed out waiting for drop")
}

async fn next_forward(
    events: &mut broadcast::Receiver<OverlayEvent>,
) -> (NodeId, NodeId, NodeId, NodeId) {
    tokio::time::timeout(WAIT, async {
        loop {
            if let OverlayEvent::Forwarded {
                at,
                next_hop,
                target,
                original_sender,
                ..
            } = events.recv().await.unwrap()
            {
                return (at, next_hop, target, original_sender);
            }
        }
    })
    .await
    .expect("timed out waiting for forward")
}

async fn stop(overlay: Overlay) {
    overlay.shutdown.send(()).unwrap();
    for handle in overlay.handles {
        let result = tokio::time::timeout(WAIT, handle).await.unwrap().unwrap();
        assert!(result.is_ok());
    }
}

#[tokio::test]
async fn test_example_journey_right() {
    let mut overlay = start_overlay(OverlayConfig::default());

    overlay
        .broker
        .inject(NodeId(0), Direction::Right, "hi")
        .unwrap();

    let delivery = next_delivery(&mut overlay.events[3]).await;
    assert_eq!(delivery.target, NodeId(3));
    assert_eq!(delivery.original_sender, NodeId(0));
    assert_eq!(&delivery.payload[..], b"hi");

    // 0 -> 2 -> 1 -> 3, every hop carrying the same target and sender
    assert_eq!(
        next_forward(&mut overlay.events[0]).await,
        (NodeId(0), NodeId(2), NodeId(3), NodeId(0))
    );
    assert_eq!(
        next_forward(&mut overlay.events[2]).await,
        (NodeId(2), NodeId(1), NodeId(3), NodeId(0))
    );
    assert_eq!(
        next_forward(&mut overlay.events[1]).await,
        (NodeId(1), NodeId(3), NodeId(3), NodeId(0))
    );
    // The target delivered without publishing anything further
    assert!(matches!(
        overlay.events[3].try_recv(),
        Err(broadcast::error::TryRecvError::Empty)
    ));

    stop(overlay).await;
}

#[tokio::test]
async fn test_every_journey_ends_at_ring_neighbour() {
    let mut overlay = start_overlay(OverlayConfig::default());
    let topology = TopologyConfig::example().build().unwrap();

    for node in topology.topology().nodes() {
        for direction in [Direction::Left, Direction::Right] {
            let payload = format!("from {} going {}", node, direction);
            overlay
                .broker
                .inject(node, direction, payload.clone())
                .unwrap();

            let expected = topology.ring().neighbor(node, direction).unwrap();
            let delivery = next_delivery(&mut overlay.events[expected.index()]).await;
            assert_eq!(delivery.target, expected);
            assert_eq!(delivery.original_sender, node);
            assert_eq!(delivery.payload_lossy(), payload);
        }
    }

    stop(overlay).await;
}

#[tokio::test]
async fn test_payload_bytes_are_preserved() {
    let mut overlay = start_overlay(OverlayConfig::default());
    let payload: Vec<u8> = vec![b' ', 0x00, 0xff, b'1', b' ', b'2', b' '];

    overlay
        .broker
        .inject(NodeId(3), Direction::Left, payload.clone())
        .unwrap();

    let delivery = next_delivery(&mut overlay.events[0]).await;
    assert_eq!(delivery.original_sender, NodeId(3));
    assert_eq!(&delivery.payload[..], &payload[..]);

    stop(overlay).await;
}

#[tokio::test]
async fn test_malformed_frames_do_not_stop_the_node() {
    let mut overlay = start_overlay(OverlayConfig::default());

    for junk in [&b""[..], b"x", b"0", b"0Q", b"1abc 0 hi", b"13"] {
        overlay
            .broker
            .publish_raw(NodeId(0), junk.to_vec())
            .unwrap();
        let reason = next_drop(&mut overlay.events[0]).await;
        assert!(matches!(reason, DropReason::MalformedFrame(_)));
    }

    overlay
        .broker
        .inject(NodeId(0), Direction::Left, "still alive")
        .unwrap();
    let delivery = next_delivery(&mut overlay.events[1]).await;
    assert_eq!(delivery.payload_lossy(), "still alive");

    stop(overlay).await;
}

#[tokio::test]
async fn test_no_route_is_contained() {
    // Ring 0 -> 1 -> 2, node 2 isolated
    let config = OverlayConfig::default().with_topology(TopologyConfig {
        node_count: Some(3),
        edges: vec![[0, 1]],
        ring: vec![0, 1, 2],
        one_indexed: false,
    });
    let mut overlay = start_overlay(config);

    overlay
        .broker
        .inject(NodeId(1), Direction::Right, "lost")
        .unwrap();
    let reason = next_drop(&mut overlay.events[1]).await;
    assert_eq!(
        reason,
        DropReason::NoRoute {
            destination: NodeId(2)
        }
    );

    // A routed frame for an id outside the network is dropped as well
    let stray = Frame::routed(NodeId(42), NodeId(1), "x").encode();
    overlay.broker.publish_raw(NodeId(0), stray).unwrap();
    let reason = next_drop(&mut overlay.events[0]).await;
    assert_eq!(
        reason,
        DropReason::NoRoute {
            destination: NodeId(42)
        }
    );

    overlay
        .broker
        .inject(NodeId(1), Direction::Left, "found")
        .unwrap();
    let delivery = next_delivery(&mut overlay.events[0]).await;
    assert_eq!(delivery.payload_lossy(), "found");

    stop(overlay).await;
}

#[tokio::test]
async fn test_closed_channel_ends_run() {
    let broker = MockBroker::new();
    let node = OverlayNode::new(
        NodeConfig::example(NodeId(4)),
        Arc::new(broker.subscribe(NodeId(4))),
    )
    .unwrap();
    let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let handle = node.spawn(shutdown_rx);

    broker.close(NodeId(4));
    let result = tokio::time::timeout(WAIT, handle).await.unwrap().unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_bad_configuration_prevents_start() {
    let broker = MockBroker::new();
    let config = OverlayConfig::default().with_topology(TopologyConfig {
        node_count: Some(3),
        edges: vec![[0, 1]],
        ring: vec![0, 1],
        one_indexed: false,
    });
    let result = OverlayNode::new(
        NodeConfig::new(NodeId(0), config),
        Arc::new(broker.subscribe(NodeId(0))),
    );
    assert!(matches!(result, Err(ringmesh_node::NodeError::Config(_))));
}
