//! PUT path: replicate to every member of the key's group, then index
//!
//! The body is held in one reference-counted buffer; each replica gets its
//! own handle to it and all writes run concurrently. One failing replica
//! fails the whole PUT. Nothing is indexed unless every replica
//! acknowledged, and a failed or abandoned write is compensated with
//! best-effort deletes on the whole group.

use crate::common::{timestamp_now, validate_key, Error, Result};
use crate::coordinator::cluster::Cluster;
use crate::coordinator::locks::KeyGuard;
use crate::coordinator::metadata::IndexEntry;
use crate::coordinator::placement::ReplicaGroup;
use bytes::Bytes;
use futures_util::future::join_all;
use futures_util::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};

/// Answer to a successful PUT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PutOutcome {
    pub key: String,
    /// Canonical stored filename
    pub id: String,
    pub replicas: Vec<String>,
}

impl Cluster {
    /// Store `data` under `key` on every member of its replica group.
    pub async fn put(&self, key: &str, data: Bytes) -> Result<PutOutcome> {
        validate_key(key)?;
        let group = self.router.shard_for(key).clone();

        let lock = self.locks.lock(key).await;
        let had_previous = self.index.get_key(key)?.is_some();
        let pending = PendingWrite {
            cluster: self.clone(),
            key: key.to_string(),
            group: group.clone(),
            had_previous,
            lock: Some(lock),
            armed: true,
        };

        let size = data.len() as u64;
        let result = match self.replicate(key, &group, data).await {
            Ok(file_name) => self.commit(key, &group, file_name, size),
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            tracing::warn!(key = %key, error = %e, "PUT failed, compensating");
            self.rollback(key, &group, had_previous).await;
        }
        pending.disarm();
        result
    }

    async fn replicate(&self, key: &str, group: &ReplicaGroup, data: Bytes) -> Result<String> {
        let total = group.len();
        let mut writes: FuturesUnordered<_> = group
            .replicas
            .iter()
            .map(|endpoint| {
                let data = data.clone();
                async move { (endpoint, self.volumes.put(endpoint, key, data).await) }
            })
            .collect();

        let mut file_name: Option<String> = None;
        let mut succeeded = 0;
        let mut failure: Option<Error> = None;
        // Writes already in flight are drained rather than dropped, so none
        // of them can land on a volume after the compensating delete.
        while let Some((endpoint, result)) = writes.next().await {
            match result {
                Ok(name) => {
                    tracing::debug!(key = %key, endpoint = %endpoint, "replica stored");
                    if file_name.as_ref().is_some_and(|prev| *prev != name) {
                        tracing::warn!(
                            key = %key,
                            endpoint = %endpoint,
                            "replica reported a different canonical name"
                        );
                    }
                    file_name = Some(name);
                    succeeded += 1;
                }
                Err(e) => {
                    tracing::warn!(key = %key, endpoint = %endpoint, error = %e, "replica write failed");
                    failure.get_or_insert(e);
                }
            }
        }

        if let Some(e) = failure {
            return Err(if succeeded == 0 {
                e
            } else {
                Error::PartialReplicationFailure {
                    succeeded,
                    total,
                    cause: Box::new(e),
                }
            });
        }
        file_name.ok_or_else(|| Error::Internal("replica group has no members".into()))
    }

    fn commit(
        &self,
        key: &str,
        group: &ReplicaGroup,
        file_name: String,
        size: u64,
    ) -> Result<PutOutcome> {
        let entry = IndexEntry {
            key: key.to_string(),
            replicas: group.replicas.clone(),
            file_name,
            size,
            updated_at: timestamp_now(),
        };
        self.index.put_key(&entry)?;
        tracing::info!(key = %key, size, replicas = group.len(), "PUT committed");
        Ok(PutOutcome {
            key: entry.key,
            id: entry.file_name,
            replicas: entry.replicas,
        })
    }

    /// Best-effort cleanup after a write that did not commit.
    ///
    /// Every member is purged. A pre-existing entry for the key no longer
    /// describes what the replicas hold, so it is dropped once the purge
    /// reached every member; otherwise it stays so a DELETE can finish the job.
    pub(crate) async fn rollback(&self, key: &str, group: &ReplicaGroup, had_previous: bool) {
        let results = join_all(
            group
                .replicas
                .iter()
                .map(|endpoint| self.volumes.delete(endpoint, key)),
        )
        .await;

        let mut purged = true;
        for (endpoint, result) in group.replicas.iter().zip(results) {
            if let Err(e) = result {
                purged = false;
                tracing::warn!(key = %key, endpoint = %endpoint, error = %e, "compensating delete failed");
            }
        }

        if had_previous {
            if purged {
                tracing::warn!(key = %key, "overwrite failed, dropping stale index entry");
                if let Err(e) = self.index.delete_key(key) {
                    tracing::error!(key = %key, error = %e, "failed to drop stale index entry");
                }
            } else {
                tracing::warn!(key = %key, "overwrite failed, keeping index entry for a later DELETE");
            }
        }
    }
}

/// Drop guard for an in-flight PUT.
///
/// If the PUT future is dropped before it finishes (client went away), the
/// guard hands the key lock to a background task that compensates the
/// partial write, so the lock is held until cleanup is done.
struct PendingWrite {
    cluster: Cluster,
    key: String,
    group: ReplicaGroup,
    had_previous: bool,
    lock: Option<KeyGuard>,
    armed: bool,
}

impl PendingWrite {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingWrite {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::error!(key = %self.key, "PUT abandoned outside a runtime, replicas may hold orphans");
            return;
        };
        let cluster = self.cluster.clone();
        let key = std::mem::take(&mut self.key);
        let group = self.group.clone();
        let had_previous = self.had_previous;
        let lock = self.lock.take();
        tracing::warn!(key = %key, "PUT abandoned, compensating in background");
        handle.spawn(async move {
            let _lock = lock;
            cluster.rollback(&key, &group, had_previous).await;
        });
    }
}
