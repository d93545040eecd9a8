//! Client-side operations against a running master
//!
//! Used by the `tinyblob` CLI.

pub mod blobs;
pub mod verify;

pub use blobs::{delete_blob, get_blob, put_blob};
pub use verify::verify_cluster;

use crate::common::Error;

/// Turn a non-success master response into the matching error.
pub(crate) async fn error_from_response(master_url: &str, resp: reqwest::Response) -> Error {
    let status = resp.status();
    let message = resp
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|v| v["error"].as_str().map(str::to_string))
        .unwrap_or_else(|| status.to_string());

    match status.as_u16() {
        400 => Error::InvalidKey(message),
        404 => Error::NotFound(message),
        503 => Error::Unavailable(message),
        _ => Error::UpstreamUnavailable {
            endpoint: master_url.to_string(),
            reason: message,
        },
    }
}

pub(crate) fn transport_error(master_url: &str, e: reqwest::Error) -> Error {
    Error::UpstreamUnavailable {
        endpoint: master_url.to_string(),
        reason: e.to_string(),
    }
}
