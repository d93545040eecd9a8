//! Common utilities and types shared across tinyblob

pub mod config;
pub mod error;
pub mod hash;
pub mod tracing_middleware;
pub mod utils;

pub use config::{Config, CoordinatorConfig, ReplicaGroupConfig, VolumeConfig};
pub use error::{Error, Result};
pub use hash::{blob_file_name, blob_prefix, shard_key, sha256_hex, topology_fingerprint};
pub use utils::{
    encode_key, format_bytes, shutdown_signal, timestamp_now, validate_key, MAX_ENCODED_KEY_LEN,
    MAX_KEY_LEN, RESERVED_KEYS,
};
