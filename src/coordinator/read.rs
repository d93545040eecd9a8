//! GET path: pick a live replica and hand the client off to it
//!
//! The master never proxies blob bytes on reads. Members are probed in group
//! order with the short probe timeout and the first healthy one is returned
//! as a direct volume URL. Health is not cached between requests.

use crate::common::{validate_key, Error, Result};
use crate::coordinator::cluster::Cluster;
use crate::coordinator::volume_client::file_url;

impl Cluster {
    /// Direct URL of `key` on the first replica that answers its probe.
    pub async fn locate(&self, key: &str) -> Result<String> {
        validate_key(key)?;
        let entry = self
            .index
            .get_key(key)?
            .ok_or_else(|| Error::NotFound(key.to_string()))?;

        for endpoint in &entry.replicas {
            if self.volumes.is_healthy(endpoint, self.probe_timeout).await {
                tracing::debug!(key = %key, endpoint = %endpoint, "redirecting read");
                return Ok(file_url(endpoint, key));
            }
            tracing::warn!(key = %key, endpoint = %endpoint, "replica failed health probe");
        }

        tracing::warn!(key = %key, replicas = entry.replicas.len(), "no healthy replica");
        Err(Error::Unavailable(key.to_string()))
    }
}
