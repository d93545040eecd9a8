//! CLI for blob and cluster operations

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tinyblob::common::format_bytes;
use tinyblob::ops::{delete_blob, get_blob, put_blob, verify_cluster};

#[derive(Parser)]
#[command(name = "tinyblob")]
#[command(about = "tinyblob replicated blob store CLI")]
#[command(version)]
struct Cli {
    /// Master URL
    #[arg(long, env = "TINYBLOB_MASTER", default_value = "http://localhost:3000")]
    master: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Put a blob
    Put {
        /// Key
        key: String,

        /// File path
        #[arg(long)]
        file: PathBuf,
    },

    /// Get a blob
    Get {
        /// Key
        key: String,

        /// Output file
        #[arg(long)]
        output: PathBuf,
    },

    /// Delete a blob
    Delete {
        /// Key
        key: String,
    },

    /// Verify every indexed key is present on all its replicas
    Verify {
        /// Keys checked concurrently
        #[arg(long, default_value = "16")]
        concurrency: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Put { key, file } => {
            let outcome = put_blob(&cli.master, &key, &file).await?;
            println!("Stored {} as {}", outcome.key, outcome.id);
            println!("  Replicas: {}", outcome.replicas.join(", "));
        }

        Commands::Get { key, output } => {
            let written = get_blob(&cli.master, &key, &output).await?;
            println!(
                "Wrote {} to {} ({})",
                key,
                output.display(),
                format_bytes(written)
            );
        }

        Commands::Delete { key } => {
            delete_blob(&cli.master, &key).await?;
            println!("Deleted {}", key);
        }

        Commands::Verify { concurrency } => {
            let report = verify_cluster(&cli.master, concurrency).await?;
            println!("Verification report:");
            println!("  Total keys: {}", report.total_keys);
            println!("  Healthy: {}", report.healthy);
            println!("  Under-replicated: {}", report.under_replicated);
            println!("  Dangling: {}", report.dangling);
            println!("  Unreachable: {}", report.unreachable);
            for key in &report.under_replicated_keys {
                println!("  under-replicated: {}", key);
            }
            for key in &report.dangling_keys {
                println!("  dangling: {}", key);
            }
            if !report.is_consistent() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
