//! DELETE path: remove every copy, then forget the key
//!
//! The index entry is dropped only after every member confirmed. A hard
//! failure on any member leaves the entry in place so the DELETE can be
//! retried; otherwise the surviving copies would have no route to them.

use crate::common::{validate_key, Error, Result};
use crate::coordinator::cluster::Cluster;
use crate::coordinator::volume_client::DeleteOutcome;
use futures_util::future::try_join_all;

impl Cluster {
    pub async fn delete(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        let _lock = self.locks.lock(key).await;
        let entry = self
            .index
            .get_key(key)?
            .ok_or_else(|| Error::NotFound(key.to_string()))?;

        let outcomes = try_join_all(entry.replicas.iter().map(|endpoint| async move {
            let outcome = self.volumes.delete(endpoint, key).await.map_err(|e| {
                tracing::warn!(key = %key, endpoint = %endpoint, error = %e, "replica delete failed");
                e
            })?;
            Ok::<_, Error>((endpoint, outcome))
        }))
        .await?;

        for (endpoint, outcome) in outcomes {
            if outcome == DeleteOutcome::Absent {
                tracing::warn!(
                    key = %key,
                    endpoint = %endpoint,
                    "indexed replica had no copy, index and volume disagree"
                );
            }
        }

        self.index.delete_key(key)?;
        tracing::info!(key = %key, replicas = entry.replicas.len(), "DELETE committed");
        Ok(())
    }
}
