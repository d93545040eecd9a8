//! Put, get and delete through the master

use crate::common::{encode_key, validate_key, Error, Result};
use crate::coordinator::PutOutcome;
use crate::ops::{error_from_response, transport_error};
use futures_util::StreamExt;
use std::path::Path;
use tokio::io::AsyncWriteExt;

fn key_url(master_url: &str, key: &str) -> String {
    format!("{}/{}", master_url.trim_end_matches('/'), encode_key(key))
}

/// Upload the file at `path` under `key`.
pub async fn put_blob(master_url: &str, key: &str, path: &Path) -> Result<PutOutcome> {
    validate_key(key)?;
    let data = tokio::fs::read(path).await?;
    tracing::debug!(key = %key, size = data.len(), "uploading");

    let resp = reqwest::Client::new()
        .put(key_url(master_url, key))
        .body(data)
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

/// Download `key` into `output`, following the master's redirect to a
/// volume. Returns the number of bytes written. A partial file is removed.
pub async fn get_blob(master_url: &str, key: &str, output: &Path) -> Result<u64> {
    validate_key(key)?;
    let resp = reqwest::get(key_url(master_url, key))
        .await
        .map_err(|e| transport_error(master_url, e))?;
    if !resp.status().is_success() {
        return Err(error_from_response(master_url, resp).await);
    }
    tracing::debug!(key = %key, from = %resp.url(), "downloading");

    let mut file = tokio::fs::File::create(output).await?;
    let mut written = 0u64;
    let mut stream = resp.bytes_stream();
    let result: Result<()> = async {
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| transport_error(master_url, e))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.sync_all().await?;
        Ok(())
    }
    .await;

    if let Err(e) = result {
        drop(file);
        let _ = tokio::fs::remove_file(output).await;
        return Err(e);
    }
    Ok(written)
}

pub async fn delete_blob(master_url: &str, key: &str) -> Result<()> {
    validate_key(key)?;
    let resp = reqwest::Client::new()
        .delete(key_url(master_url, key))
        .send()
        .await
        .map_err(|e| transport_error(master_url, e))?;
    if resp.status().is_success() {
        Ok(())
    } else {
        Err(error_from_response(master_url, resp).await)
    }
}
