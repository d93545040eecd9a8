//! Volume binary

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tinyblob::common::{Config, VolumeConfig};
use tinyblob::VolumeServer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tinyblob-volume")]
#[command(about = "tinyblob volume server: content-addressed blob storage node")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a volume server
    Serve {
        /// Volume ID, used in logs and /health
        #[arg(long, default_value = "volume-1")]
        id: String,

        /// Bind address for HTTP
        #[arg(long)]
        bind: Option<SocketAddr>,

        /// Storage root directory
        #[arg(long)]
        data: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load()?;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Serve { id, bind, data } => {
            let mut volume_config: VolumeConfig = config.volume.unwrap_or_default();
            if let Some(bind) = bind {
                volume_config.bind_addr = bind;
            }
            if let Some(data) = data {
                volume_config.data_path = data;
            }
            VolumeServer::new(volume_config, id).serve().await?;
        }
    }

    Ok(())
}
