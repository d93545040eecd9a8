//! Transport from the master to volume nodes
//!
//! `VolumeApi` is the seam the coordinators depend on; `HttpVolumeClient` is
//! the production implementation over the volume HTTP API.

use crate::common::{encode_key, Error, Result};
use crate::volume::http::StoredResponse;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use std::time::Duration;

/// How a replica answered a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The replica had no copy. Idempotent success, but worth logging.
    Absent,
}

/// Direct URL of a blob on one volume.
pub fn file_url(endpoint: &str, key: &str) -> String {
    format!("{}/files/{}", endpoint, encode_key(key))
}

#[async_trait]
pub trait VolumeApi: Send + Sync {
    /// Store `data` under `key`; returns the volume's canonical filename.
    async fn put(&self, endpoint: &str, key: &str, data: Bytes) -> Result<String>;

    async fn delete(&self, endpoint: &str, key: &str) -> Result<DeleteOutcome>;

    async fn exists(&self, endpoint: &str, key: &str) -> Result<bool>;

    /// Liveness probe bounded by `timeout`. Any failure counts as unhealthy.
    async fn is_healthy(&self, endpoint: &str, timeout: Duration) -> bool;
}

/// `VolumeApi` over HTTP.
#[derive(Clone)]
pub struct HttpVolumeClient {
    client: reqwest::Client,
}

impl HttpVolumeClient {
    pub fn new(request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| Error::InvalidConfig(format!("http client: {}", e)))?;
        Ok(Self { client })
    }
}

fn unavailable(endpoint: &str, reason: impl ToString) -> Error {
    Error::UpstreamUnavailable {
        endpoint: endpoint.to_string(),
        reason: reason.to_string(),
    }
}

#[async_trait]
impl VolumeApi for HttpVolumeClient {
    async fn put(&self, endpoint: &str, key: &str, data: Bytes) -> Result<String> {
        let resp = self
            .client
            .put(file_url(endpoint, key))
            .body(data)
            .send()
            .await
            .map_err(|e| unavailable(endpoint, e))?;

        if !resp.status().is_success() {
            return Err(unavailable(
                endpoint,
                format!("unexpected status {}", resp.status()),
            ));
        }
        let stored: StoredResponse = resp
            .json()
            .await
            .map_err(|e| unavailable(endpoint, format!("bad response: {}", e)))?;
        Ok(stored.key)
    }

    async fn delete(&self, endpoint: &str, key: &str) -> Result<DeleteOutcome> {
        let resp = self
            .client
            .delete(file_url(endpoint, key))
            .send()
            .await
            .map_err(|e| unavailable(endpoint, e))?;

        match resp.status() {
            StatusCode::NO_CONTENT | StatusCode::OK => Ok(DeleteOutcome::Deleted),
            StatusCode::NOT_FOUND => Ok(DeleteOutcome::Absent),
            status => Err(unavailable(endpoint, format!("unexpected status {}", status))),
        }
    }

    async fn exists(&self, endpoint: &str, key: &str) -> Result<bool> {
        let resp = self
            .client
            .head(file_url(endpoint, key))
            .send()
            .await
            .map_err(|e| unavailable(endpoint, e))?;

        match resp.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(unavailable(endpoint, format!("unexpected status {}", status))),
        }
    }

    async fn is_healthy(&self, endpoint: &str, timeout: Duration) -> bool {
        match self
            .client
            .get(format!("{}/health", endpoint))
            .timeout(timeout)
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::debug!(endpoint = %endpoint, error = %e, "health probe failed");
                false
            }
        }
    }
}
