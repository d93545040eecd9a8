//! Shard routing over a static set of replica groups
//!
//! A key is hashed with BLAKE3; the first 8 digest bytes, read as a
//! little-endian `u64`, are reduced modulo the group count. The result picks
//! the group. Topology is fixed for the life of the process; changing the
//! group count would move keys and is refused by the index (see
//! `MetadataStore::check_topology`).

use crate::common::{shard_key, Error, ReplicaGroupConfig, Result};

/// Ordered endpoints holding identical copies of every blob routed to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaGroup {
    pub replicas: Vec<String>,
}

impl ReplicaGroup {
    pub fn new(replicas: Vec<String>) -> Self {
        Self {
            replicas: replicas
                .into_iter()
                .map(|r| r.trim_end_matches('/').to_string())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.replicas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replicas.is_empty()
    }
}

/// Maps keys to replica groups.
#[derive(Debug, Clone)]
pub struct ShardRouter {
    groups: Vec<ReplicaGroup>,
}

impl ShardRouter {
    pub fn new(groups: Vec<ReplicaGroup>) -> Result<Self> {
        if groups.is_empty() {
            return Err(Error::InvalidConfig("no replica groups configured".into()));
        }
        if let Some(i) = groups.iter().position(|g| g.is_empty()) {
            return Err(Error::InvalidConfig(format!("replica group {} is empty", i)));
        }
        Ok(Self { groups })
    }

    pub fn from_config(groups: &[ReplicaGroupConfig]) -> Result<Self> {
        Self::new(
            groups
                .iter()
                .map(|g| ReplicaGroup::new(g.replicas.clone()))
                .collect(),
        )
    }

    /// Index of the group owning `key`
    pub fn shard_index(&self, key: &str) -> usize {
        shard_key(key, self.groups.len() as u64) as usize
    }

    /// Group owning `key`
    pub fn shard_for(&self, key: &str) -> &ReplicaGroup {
        &self.groups[self.shard_index(key)]
    }

    pub fn groups(&self) -> &[ReplicaGroup] {
        &self.groups
    }

    /// Topology as plain endpoint lists, for fingerprinting.
    pub fn topology(&self) -> Vec<Vec<String>> {
        self.groups.iter().map(|g| g.replicas.clone()).collect()
    }
}
