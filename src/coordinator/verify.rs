//! Cluster verification
//!
//! Walks the index and checks that every member of each key's group still
//! holds the blob. Read-only: nothing is repaired.

use crate::common::Result;
use crate::coordinator::cluster::Cluster;
use crate::coordinator::metadata::IndexEntry;
use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

/// Default number of keys checked concurrently.
pub const DEFAULT_VERIFY_CONCURRENCY: usize = 16;

/// Where a key stands after checking its replicas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyHealth {
    /// Every member holds a copy
    Healthy,
    /// Some members hold a copy, some confirmed missing
    UnderReplicated,
    /// Every member confirmed missing
    Dangling,
    /// At least one member could not be asked, none confirmed missing
    Unreachable,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifyReport {
    pub total_keys: usize,
    pub healthy: usize,
    pub under_replicated: usize,
    pub dangling: usize,
    pub unreachable: usize,
    pub under_replicated_keys: Vec<String>,
    pub dangling_keys: Vec<String>,
}

impl VerifyReport {
    pub fn is_consistent(&self) -> bool {
        self.healthy == self.total_keys
    }

    fn record(&mut self, key: String, health: KeyHealth) {
        self.total_keys += 1;
        match health {
            KeyHealth::Healthy => self.healthy += 1,
            KeyHealth::UnderReplicated => {
                self.under_replicated += 1;
                self.under_replicated_keys.push(key);
            }
            KeyHealth::Dangling => {
                self.dangling += 1;
                self.dangling_keys.push(key);
            }
            KeyHealth::Unreachable => self.unreachable += 1,
        }
    }
}

impl Cluster {
    pub async fn verify(&self, concurrency: usize) -> Result<VerifyReport> {
        let entries = self.index.list_entries()?;
        tracing::info!(keys = entries.len(), "Starting cluster verification");

        let mut checks = stream::iter(entries)
            .map(|entry| async move {
                let health = self.check_entry(&entry).await;
                (entry.key, health)
            })
            .buffer_unordered(concurrency.max(1));

        let mut report = VerifyReport::default();
        while let Some((key, health)) = checks.next().await {
            if health != KeyHealth::Healthy {
                tracing::warn!(key = %key, health = ?health, "key not fully replicated");
            }
            report.record(key, health);
        }
        report.under_replicated_keys.sort();
        report.dangling_keys.sort();

        tracing::info!(
            total = report.total_keys,
            healthy = report.healthy,
            under_replicated = report.under_replicated,
            dangling = report.dangling,
            unreachable = report.unreachable,
            "Verification finished"
        );
        Ok(report)
    }

    async fn check_entry(&self, entry: &IndexEntry) -> KeyHealth {
        let (mut present, mut missing, mut failed) = (0, 0, 0);
        for endpoint in &entry.replicas {
            match self.volumes.exists(endpoint, &entry.key).await {
                Ok(true) => present += 1,
                Ok(false) => missing += 1,
                Err(e) => {
                    tracing::debug!(key = %entry.key, endpoint = %endpoint, error = %e, "verify probe failed");
                    failed += 1;
                }
            }
        }

        match (present, missing, failed) {
            (_, 0, 0) => KeyHealth::Healthy,
            (_, 0, _) => KeyHealth::Unreachable,
            (0, _, 0) => KeyHealth::Dangling,
            _ => KeyHealth::UnderReplicated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::cluster::testing::fake_cluster;
    use crate::coordinator::volume_client::VolumeApi;
    use bytes::Bytes;

    #[tokio::test]
    async fn test_clean_cluster_is_consistent() {
        let (cluster, _volumes, _dir) = fake_cluster();
        for i in 0..10 {
            cluster
                .put(&format!("k{}", i), Bytes::from_static(b"v"))
                .await
                .unwrap();
        }
        let report = cluster.verify(4).await.unwrap();
        assert_eq!(report.total_keys, 10);
        assert!(report.is_consistent());
    }

    #[tokio::test]
    async fn test_classifies_missing_copies() {
        let (cluster, volumes, _dir) = fake_cluster();
        for key in ["ok", "thin", "gone"] {
            cluster.put(key, Bytes::from_static(b"v")).await.unwrap();
        }

        let thin = cluster.router().shard_for("thin").clone();
        volumes.delete(&thin.replicas[0], "thin").await.unwrap();
        for endpoint in &cluster.router().shard_for("gone").replicas {
            volumes.delete(endpoint, "gone").await.unwrap();
        }

        let report = cluster.verify(2).await.unwrap();
        assert_eq!(report.total_keys, 3);
        assert_eq!(report.healthy, 1);
        assert_eq!(report.under_replicated_keys, vec!["thin".to_string()]);
        assert_eq!(report.dangling_keys, vec!["gone".to_string()]);
        assert!(!report.is_consistent());
    }

    #[tokio::test]
    async fn test_unreachable_member_is_not_reported_missing() {
        let (cluster, volumes, _dir) = fake_cluster();
        cluster.put("k", Bytes::from_static(b"v")).await.unwrap();
        let group = cluster.router().shard_for("k").clone();

        volumes.set_down(&group.replicas[2], true);
        let report = cluster.verify(1).await.unwrap();
        assert_eq!(report.unreachable, 1);
        assert!(report.under_replicated_keys.is_empty());
        assert!(report.dangling_keys.is_empty());
    }
}
