//! Scenario tests for ringmesh-simulation

use std::io::Write;
use std::time::Duration;

use ringmesh_core::{ConfigError, Direction, NodeId};
use ringmesh_node::OverlayConfig;
use ringmesh_simulation::{
    LocalCluster, PingPongConfig, PingPongStats, SimulationError, run_ping_pong, run_tour,
};

const WAIT: Duration = Duration::from_secs(5);

// Physical line 1-2-3-4-5-6, ring visits every other node
const LINE_TOML: &str = r#"
channel_prefix = "LINE"

[topology]
one_indexed = true
edges = [[1, 2], [2, 3], [3, 4], [4, 5], [5, 6]]
ring = [1, 3, 5, 6, 4, 2]
"#;

#[tokio::test]
async fn test_tour_of_example_overlay() {
    let mut cluster = LocalCluster::start(&OverlayConfig::default()).unwrap();

    let report = run_tour(&mut cluster, WAIT).await.unwrap();
    assert_eq!(report.journeys.len(), 10);
    assert!(report.all_reached_expected());
    for journey in &report.journeys {
        assert_eq!(journey.path.first(), Some(&journey.origin));
        assert_eq!(journey.path.last(), Some(&journey.expected));
    }

    cluster.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_tour_of_config_file_overlay() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(LINE_TOML.as_bytes()).unwrap();
    let config = OverlayConfig::from_file(file.path()).unwrap();

    let mut cluster = LocalCluster::start(&config).unwrap();
    assert_eq!(cluster.broker().prefix(), "LINE");

    let report = run_tour(&mut cluster, WAIT).await.unwrap();
    assert_eq!(report.journeys.len(), 12);
    assert!(report.all_reached_expected());

    // On a line every hop count is the distance between the two positions
    for journey in &report.journeys {
        let distance = journey.origin.index().abs_diff(journey.expected.index());
        assert_eq!(journey.hops(), distance);
    }

    cluster.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_consecutive_sends_are_independent() {
    let mut cluster = LocalCluster::start(&OverlayConfig::default()).unwrap();

    let right = cluster
        .send(NodeId(0), Direction::Right, "first", WAIT)
        .await
        .unwrap();
    let left = cluster
        .send(NodeId(3), Direction::Left, "second", WAIT)
        .await
        .unwrap();

    assert_eq!(right.delivery.payload_lossy(), "first");
    assert_eq!(left.delivery.payload_lossy(), "second");
    assert_eq!(left.expected, NodeId(0));
    assert_eq!(left.hops(), 3);

    cluster.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_ping_pong_plays_all_rounds() {
    let config = PingPongConfig {
        rounds: 3,
        delay: Duration::ZERO,
    };
    let result = tokio::time::timeout(WAIT, run_ping_pong(NodeId(1), NodeId(2), config))
        .await
        .unwrap();
    let (lower, higher) = tokio_test::assert_ok!(result);

    assert_eq!(
        lower,
        PingPongStats {
            pings_sent: 3,
            pongs_sent: 0,
            pings_received: 0,
            pongs_received: 3,
        }
    );
    assert_eq!(
        higher,
        PingPongStats {
            pings_sent: 0,
            pongs_sent: 3,
            pings_received: 3,
            pongs_received: 0,
        }
    );
}

#[tokio::test]
async fn test_ping_pong_initiates_at_lower_id() {
    let config = PingPongConfig {
        rounds: 1,
        delay: Duration::from_millis(1),
    };
    let game = run_ping_pong(NodeId(9), NodeId(4), config);
    let (higher, lower) = tokio::time::timeout(WAIT, game).await.unwrap().unwrap();

    assert_eq!(lower.pings_sent, 1);
    assert_eq!(higher.pongs_sent, 1);
}

#[tokio::test]
async fn test_ping_pong_needs_two_peers() {
    let err = run_ping_pong(NodeId(1), NodeId(1), PingPongConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SimulationError::Config(ConfigError::SamePeers(NodeId(1)))
    ));
}
