//! CLI entry point for the breachmap-attack engine.
//!
//! Designed for subprocess invocation from the dashboard API: arguments in,
//! a JSON layout on stdout. Logs go to stderr so stdout stays parseable.

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use breachmap_core::types::{NodeIdentity, Partition};
use breachmap_graph::{GraphClient, GraphConfig};

use breachmap_attack::{AttackGraphEngine, AttackGraphRequest};

#[derive(Parser)]
#[command(name = "breachmap-attack")]
#[command(about = "Attack-path graph construction for the Breachmap network graph")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Partition (project tag) to scope queries to.
    #[arg(long, default_value = "multi-layer", global = true)]
    partition: String,

    /// Config file prefix (default: breachmap).
    #[arg(short, long, default_value = "breachmap", global = true)]
    config: String,
}

#[derive(Subcommand)]
enum Command {
    /// Compute the attack graph for a target device.
    AttackGraph {
        /// Device-layer element id of the target.
        #[arg(long)]
        device: String,
        /// Start node (Physical internal id). Omit to get the base topology.
        #[arg(long)]
        start: Option<i64>,
    },
    /// Dump the base Device topology for the partition.
    Topology,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    let graph_config = load_graph_config(&cli.config);
    let client = GraphClient::connect(&graph_config).await?;

    let engine = AttackGraphEngine::new(client).with_partition(Partition(cli.partition.clone()));

    match cli.command {
        Command::AttackGraph { device, start } => {
            let request = AttackGraphRequest {
                device_element_id: device,
                start_id: start.map(NodeIdentity),
                partition: None,
            };
            let result = engine.attack_graph(request).await?;
            println!("{}", serde_json::to_string(&result)?);
        }
        Command::Topology => {
            let layout = engine.topology().await?;
            println!("{}", serde_json::to_string(&layout)?);
        }
    }

    Ok(())
}

fn load_graph_config(file_prefix: &str) -> GraphConfig {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("BREACHMAP")
                .separator("__")
                .try_parsing(true),
        )
        .build();

    match cfg {
        Ok(c) => GraphConfig {
            uri: c
                .get_string("neo4j.uri")
                .unwrap_or_else(|_| "bolt://localhost:7687".to_string()),
            user: c
                .get_string("neo4j.user")
                .unwrap_or_else(|_| "neo4j".to_string()),
            password: c
                .get_string("neo4j.password")
                .unwrap_or_else(|_| "breachmap-dev".to_string()),
            ..Default::default()
        },
        Err(_) => GraphConfig::default(),
    }
}
