//! Volume server implementation
//!
//! A volume node owns one storage root and serves blobs from it over HTTP.
//! It knows nothing about replication or sharding.

pub mod blob;
pub mod http;
pub mod server;

pub use blob::{BlobStore, ContentAddress};
pub use server::VolumeServer;
