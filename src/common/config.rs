//! Configuration for tinyblob components

use crate::common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "TINYBLOB_CONFIG";

/// Global configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Master-specific config
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinator: Option<CoordinatorConfig>,

    /// Volume-specific config
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<VolumeConfig>,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load config from the file named by `TINYBLOB_CONFIG` (default
    /// `tinyblob.toml`, optional) layered under `TINYBLOB__*` variables.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "tinyblob.toml".into());
        Self::load_from(&path)
    }

    pub fn load_from(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("TINYBLOB").separator("__"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

/// One replica group: every endpoint holds a full copy of each blob routed here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaGroupConfig {
    pub replicas: Vec<String>,
}

/// Master configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Bind address for HTTP API
    #[serde(default = "default_coord_bind")]
    pub bind_addr: SocketAddr,

    /// RocksDB path for the key index
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Static replica-group topology
    #[serde(default = "default_groups")]
    pub groups: Vec<ReplicaGroupConfig>,

    /// End-to-end timeout for calls to volumes
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Liveness probe timeout, must be below `request_timeout_ms`
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_ms: u64,

    /// Largest accepted PUT body
    #[serde(default = "default_max_blob_size")]
    pub max_blob_size: usize,
}

fn default_coord_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}
fn default_db_path() -> PathBuf {
    PathBuf::from("./tinyblob_master")
}
fn default_groups() -> Vec<ReplicaGroupConfig> {
    (0..4)
        .map(|g| ReplicaGroupConfig {
            replicas: (1..=3)
                .map(|r| format!("http://localhost:{}", 3000 + g * 3 + r))
                .collect(),
        })
        .collect()
}
fn default_request_timeout() -> u64 {
    10_000
}
fn default_probe_timeout() -> u64 {
    500
}
fn default_max_blob_size() -> usize {
    1024 * 1024 * 1024
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_coord_bind(),
            db_path: default_db_path(),
            groups: default_groups(),
            request_timeout_ms: default_request_timeout(),
            probe_timeout_ms: default_probe_timeout(),
            max_blob_size: default_max_blob_size(),
        }
    }
}

impl CoordinatorConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Reject topologies and timeouts the master cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.groups.is_empty() {
            return Err(Error::InvalidConfig("no replica groups configured".into()));
        }
        if let Some(i) = self.groups.iter().position(|g| g.replicas.is_empty()) {
            return Err(Error::InvalidConfig(format!("replica group {} is empty", i)));
        }
        if self.probe_timeout_ms == 0 || self.probe_timeout_ms >= self.request_timeout_ms {
            return Err(Error::InvalidConfig(format!(
                "probe timeout ({}ms) must be positive and below the request timeout ({}ms)",
                self.probe_timeout_ms, self.request_timeout_ms
            )));
        }
        Ok(())
    }
}

/// Volume configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeConfig {
    /// Bind address for HTTP API
    #[serde(default = "default_volume_bind")]
    pub bind_addr: SocketAddr,

    /// Storage root for the hash-prefix tree
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,
}

fn default_volume_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3001))
}
fn default_data_path() -> PathBuf {
    PathBuf::from("./tinyblob_data/volume")
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_volume_bind(),
            data_path: default_data_path(),
        }
    }
}
