//! Master: shard routing, replicated writes, redirected reads and deletes
//!
//! The master owns the key index (RocksDB) and decides which replica group
//! holds each key. Blob bytes flow through it only on PUT; reads are handed
//! off to a volume with a redirect.

pub mod cluster;
pub mod delete;
pub mod http;
pub mod locks;
pub mod metadata;
pub mod placement;
pub mod read;
pub mod server;
pub mod verify;
pub mod volume_client;
pub mod write;

pub use cluster::Cluster;
pub use metadata::{IndexEntry, MetadataStore};
pub use placement::{ReplicaGroup, ShardRouter};
pub use server::Coordinator;
pub use verify::VerifyReport;
pub use write::PutOutcome;
