//! # tinyblob
//!
//! A replicated, sharded blob store:
//! - A master that routes each key to one static replica group
//! - Concurrent replication with all-or-nothing commit to a RocksDB index
//! - Reads handed off to a live replica with a redirect
//! - Volume nodes storing blobs in a content-addressed directory tree
//!
//! ## Architecture
//!
//! ```text
//!            PUT / DELETE            GET
//! client ──────────────────► master ────► 302 Location: volume/files/key
//!                              │
//!                  RocksDB index (key → group)
//!                              │ HTTP fan-out
//!   ┌──────────────────────────┼──────────────────────────┐
//! ┌─▼──────────┐         ┌─────▼──────┐            ┌──────▼─────┐
//! │ Group 0    │         │ Group 1    │    ...     │ Group N-1  │
//! │ vol vol vol│         │ vol vol vol│            │ vol vol vol│
//! └────────────┘         └────────────┘            └────────────┘
//! ```
//!
//! ## Usage
//!
//! ### Start volume servers
//! ```bash
//! tinyblob-volume serve --id vol-1 --bind 0.0.0.0:3001 --data ./data/vol-1
//! ```
//!
//! ### Start the master
//! ```bash
//! tinyblob-master serve \
//!   --bind 0.0.0.0:3000 \
//!   --db ./master-index \
//!   --group http://localhost:3001,http://localhost:3002,http://localhost:3003 \
//!   --group http://localhost:3004,http://localhost:3005,http://localhost:3006
//! ```
//!
//! ### Use the CLI
//! ```bash
//! tinyblob put my-key --file ./data.bin --master http://localhost:3000
//! tinyblob get my-key --output ./out.bin
//! tinyblob delete my-key
//! tinyblob verify
//! ```

#![allow(clippy::result_large_err)]

pub mod common;
pub mod coordinator;
pub mod ops;
pub mod volume;

// Re-export commonly used types
pub use common::{Config, Error, Result};
pub use coordinator::{Cluster, Coordinator};
pub use volume::VolumeServer;

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
