//! Explicit wiring of the master's collaborators
//!
//! `Cluster` bundles the index, the shard router, the volume transport and
//! the per-key locks. It is built once at startup and cloned into handlers;
//! the write, read and delete paths live in their own modules as `impl
//! Cluster` blocks.

use crate::common::Result;
use crate::coordinator::locks::KeyLocks;
use crate::coordinator::metadata::MetadataStore;
use crate::coordinator::placement::ShardRouter;
use crate::coordinator::volume_client::VolumeApi;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct Cluster {
    pub(crate) index: Arc<MetadataStore>,
    pub(crate) router: Arc<ShardRouter>,
    pub(crate) volumes: Arc<dyn VolumeApi>,
    pub(crate) locks: KeyLocks,
    pub(crate) probe_timeout: Duration,
}

impl Cluster {
    /// Wire the collaborators together. Fails if the index was populated
    /// under a different topology.
    pub fn new(
        index: Arc<MetadataStore>,
        router: ShardRouter,
        volumes: Arc<dyn VolumeApi>,
        probe_timeout: Duration,
    ) -> Result<Self> {
        index.check_topology(&router.topology())?;
        Ok(Self {
            index,
            router: Arc::new(router),
            volumes,
            locks: KeyLocks::new(),
            probe_timeout,
        })
    }

    pub fn index(&self) -> &MetadataStore {
        &self.index
    }

    pub fn router(&self) -> &ShardRouter {
        &self.router
    }
}
