//! Pre-built scenarios

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use ringmesh_core::{ConfigError, Direction, MockBroker, NodeId};
use tokio::sync::broadcast;
use tracing::info;

use crate::cluster::{Journey, LocalCluster};
use crate::error::SimulationResult;
use crate::pingpong::{
    PING_PONG_CHANNEL_PREFIX, PingPongConfig, PingPongFrame, PingPongPeer, PingPongStats,
};

/// Journeys of a full tour
#[derive(Debug, Clone, Default)]
pub struct TourReport {
    pub journeys: Vec<Journey>,
}

impl TourReport {
    /// Journeys that ended somewhere other than the ring neighbour
    pub fn failures(&self) -> impl Iterator<Item = &Journey> {
        self.journeys.iter().filter(|j| !j.reached_expected())
    }

    pub fn all_reached_expected(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Physical hops summed over every journey
    pub fn total_hops(&self) -> usize {
        self.journeys.iter().map(Journey::hops).sum()
    }
}

impl fmt::Display for TourReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for journey in &self.journeys {
            writeln!(
                f,
                "  [{}] {} -> [{}]: {} ({} hops){}",
                journey.origin.one_indexed(),
                journey.direction,
                journey.expected.one_indexed(),
                journey,
                journey.hops(),
                if journey.reached_expected() { "" } else { "  MISMATCH" }
            )?;
        }
        write!(
            f,
            "{} journeys, {} hops, {} mismatches",
            self.journeys.len(),
            self.total_hops(),
            self.failures().count()
        )
    }
}

/// Send a ring request in both directions from every node
pub async fn run_tour(
    cluster: &mut LocalCluster,
    timeout: Duration,
) -> SimulationResult<TourReport> {
    let mut report = TourReport::default();

    for node in (0..cluster.overlay().node_count()).map(NodeId) {
        for direction in [Direction::Left, Direction::Right] {
            let payload = format!("tour from {} going {}", node.one_indexed(), direction);
            let journey = cluster.send(node, direction, payload, timeout).await?;
            info!(
                origin = %node,
                direction = %direction,
                hops = journey.hops(),
                "Journey complete"
            );
            report.journeys.push(journey);
        }
    }

    Ok(report)
}

/// Play a ping-pong exchange between two peers over an in-memory broker
///
/// The exchange is initiated at the lower id. Returns the stats of `first`
/// and `second`, in that order.
pub async fn run_ping_pong(
    first: NodeId,
    second: NodeId,
    config: PingPongConfig,
) -> SimulationResult<(PingPongStats, PingPongStats)> {
    if first == second {
        return Err(ConfigError::SamePeers(first).into());
    }

    let broker = MockBroker::with_prefix(PING_PONG_CHANNEL_PREFIX);
    let (shutdown_tx, _) = broadcast::channel(1);

    let first_peer = PingPongPeer::new(Arc::new(broker.subscribe(first)), second, config.clone());
    let second_peer = PingPongPeer::new(Arc::new(broker.subscribe(second)), first, config);
    let first_task = tokio::spawn(first_peer.run(shutdown_tx.subscribe()));
    let second_task = tokio::spawn(second_peer.run(shutdown_tx.subscribe()));

    broker.publish_raw(first.min(second), PingPongFrame::Initiate.encode())?;

    let first_stats = first_task.await??;
    let second_stats = second_task.await??;
    Ok((first_stats, second_stats))
}
