//! Verify cluster integrity

use crate::common::Result;
use crate::coordinator::VerifyReport;
use crate::ops::{error_from_response, transport_error};

/// Ask the master to check every indexed key against its replicas.
pub async fn verify_cluster(master_url: &str, concurrency: usize) -> Result<VerifyReport> {
    tracing::info!("Starting cluster verification");
    let url = format!("{}/admin/verify", master_url.trim_end_matches('/'));

    let resp = reqwest::Client::new()
        .get(url)
        .query(&[("concurrency", concurrency)])
        .send()
        .await
        .map_err(|e| transport_error(master_url, e))?;
    if !resp.status().is_success() {
        return Err(error_from_response(master_url, resp).await);
    }
    resp.json()
        .await
        .map_err(|e| transport_error(master_url, e))
}
