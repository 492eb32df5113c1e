//! ringmesh - ring overlay over a physical network graph
//!
//! Runs every node of an overlay in-process over an in-memory broker.
//! Node ids on the command line are one-indexed.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};

use ringmesh_core::{Direction, NodeId};
use ringmesh_logging::{LogConfig, RingmeshSubscriberBuilder};
use ringmesh_node::OverlayConfig;
use ringmesh_routing::RoutingTable;
use ringmesh_simulation::{LocalCluster, PingPongConfig, run_ping_pong, run_tour};

#[derive(Parser)]
#[command(
    name = "ringmesh",
    about = "Ring overlay routing over a physical network graph",
    version
)]
struct Cli {
    /// Overlay configuration (TOML); the built-in 5-node example when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write a JSONL debug log of the run to <LOG_DIR>/ringmesh.log
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the physical topology and ring order
    Topology,

    /// Show the routing table of a node
    Table {
        /// Node id (one-indexed)
        #[arg(short, long)]
        node: usize,
    },

    /// Inject a ring request at a node and trace it to delivery
    Send {
        /// Node id the request is injected at (one-indexed)
        #[arg(short, long)]
        node: usize,

        /// Ring direction: L or R
        #[arg(short, long)]
        direction: Direction,

        /// Payload text
        payload: String,

        /// How long to wait for the delivery
        #[arg(short, long, default_value = "5000")]
        timeout_ms: u64,
    },

    /// Send both directions from every node and check every journey
    Tour {
        /// How long to wait for each delivery
        #[arg(short, long, default_value = "5000")]
        timeout_ms: u64,
    },

    /// Run the two-peer PING/PONG liveness demo
    PingPong {
        /// First peer id
        #[arg(long, default_value = "1")]
        first: usize,

        /// Second peer id
        #[arg(long, default_value = "2")]
        second: usize,

        /// Exchanges before both peers stop
        #[arg(short, long, default_value = "3")]
        rounds: u32,

        /// Pause before every reply
        #[arg(long, default_value = "2000")]
        delay_ms: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _guard = RingmeshSubscriberBuilder::new()
        .with_config(LogConfig::cli(cli.verbose, cli.log_dir.as_deref()))
        .init();

    let config = match &cli.config {
        Some(path) => OverlayConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => OverlayConfig::default(),
    };

    match cli.command {
        Commands::Topology => {
            let overlay = config.build_topology()?;
            print!("{}", overlay.topology().visualize());
            let ring: Vec<String> = overlay
                .ring()
                .order()
                .iter()
                .map(|node| format!("[{}]", node.one_indexed()))
                .collect();
            println!("Ring: {} -> (back to start)", ring.join(" -> "));
        }
        Commands::Table { node } => {
            let overlay = config.build_topology()?;
            let local = NodeId::from_one_indexed(node)?.ensure_within(overlay.node_count())?;
            print!("{}", RoutingTable::build(overlay.topology(), local));
        }
        Commands::Send {
            node,
            direction,
            payload,
            timeout_ms,
        } => {
            let origin = NodeId::from_one_indexed(node)?;
            let mut cluster = LocalCluster::start(&config)?;
            let timeout = Duration::from_millis(timeout_ms);
            let result = cluster.send(origin, direction, payload, timeout).await;
            cluster.shutdown().await?;

            let journey = result?;
            println!(
                "[{}] received from [{}]: {}",
                journey.delivery.target.one_indexed(),
                journey.delivery.original_sender.one_indexed(),
                journey.delivery.payload_lossy()
            );
            println!("Route ({} hops): {}", journey.hops(), journey);
        }
        Commands::Tour { timeout_ms } => {
            let mut cluster = LocalCluster::start(&config)?;
            let result = run_tour(&mut cluster, Duration::from_millis(timeout_ms)).await;
            cluster.shutdown().await?;

            let report = result?;
            println!("{}", report);
            if !report.all_reached_expected() {
                anyhow::bail!("some journeys did not end at their ring neighbour");
            }
        }
        Commands::PingPong {
            first,
            second,
            rounds,
            delay_ms,
        } => {
            let (first_stats, second_stats) = run_ping_pong(
                NodeId::new(first),
                NodeId::new(second),
                PingPongConfig {
                    rounds,
                    delay: Duration::from_millis(delay_ms),
                },
            )
            .await?;
            println!("[{}] {:?}", first, first_stats);
            println!("[{}] {:?}", second, second_stats);
        }
    }

    Ok(())
}
