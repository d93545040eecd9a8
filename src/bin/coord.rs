//! Master binary

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tinyblob::common::{Config, CoordinatorConfig, ReplicaGroupConfig};
use tinyblob::Coordinator;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tinyblob-master")]
#[command(about = "tinyblob master: shard router and replication coordinator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the master
    Serve {
        /// Bind address for HTTP
        #[arg(long)]
        bind: Option<SocketAddr>,

        /// Index directory
        #[arg(long)]
        db: Option<PathBuf>,

        /// Replica group as comma-separated volume URLs; repeat once per group
        #[arg(long = "group")]
        groups: Vec<String>,

        /// Timeout for calls to volumes
        #[arg(long)]
        request_timeout_ms: Option<u64>,

        /// Health probe timeout used on reads
        #[arg(long)]
        probe_timeout_ms: Option<u64>,

        /// Largest accepted PUT body in bytes
        #[arg(long)]
        max_blob_size: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load config from file, then override with CLI arguments
    let config = Config::load()?;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Serve {
            bind,
            db,
            groups,
            request_timeout_ms,
            probe_timeout_ms,
            max_blob_size,
        } => {
            let mut coord_config: CoordinatorConfig = config.coordinator.unwrap_or_default();
            if let Some(bind) = bind {
                coord_config.bind_addr = bind;
            }
            if let Some(db) = db {
                coord_config.db_path = db;
            }
            if !groups.is_empty() {
                coord_config.groups = groups
                    .iter()
                    .map(|group| ReplicaGroupConfig {
                        replicas: group
                            .split(',')
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .map(str::to_string)
                            .collect(),
                    })
                    .collect();
            }
            if let Some(ms) = request_timeout_ms {
                coord_config.request_timeout_ms = ms;
            }
            if let Some(ms) = probe_timeout_ms {
                coord_config.probe_timeout_ms = ms;
            }
            if let Some(size) = max_blob_size {
                coord_config.max_blob_size = size;
            }

            Coordinator::new(coord_config).serve().await?;
        }
    }

    Ok(())
}
