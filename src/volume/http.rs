//! HTTP API for a volume node
//!
//! - `PUT /files/:key` stores the body and answers `{"key": "<filename>"}`
//! - `GET|HEAD /files/:key` streams the blob with range support
//! - `DELETE /files/:key` removes it
//! - `GET /health` liveness probe

use crate::common::tracing_middleware::request_tracing_middleware;
use crate::common::{Error, Result};
use crate::volume::blob::BlobStore;
use axum::{
    body::Body,
    extract::{Path, Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use futures_util::TryStreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeFile;

/// Shared volume state for HTTP handlers.
#[derive(Clone)]
pub struct VolumeState {
    pub store: Arc<BlobStore>,
    pub volume_id: String,
}

/// Body of a successful `PUT /files/:key`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StoredResponse {
    pub key: String,
}

/// Creates the HTTP router for a volume node.
pub fn create_router(state: VolumeState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/files/:key",
            get(get_file).put(put_file).delete(delete_file),
        )
        .layer(middleware::from_fn(request_tracing_middleware))
        .with_state(state)
}

async fn health(State(state): State<VolumeState>) -> impl IntoResponse {
    axum::Json(json!({
        "status": "healthy",
        "volume_id": state.volume_id,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn put_file(
    State(state): State<VolumeState>,
    Path(key): Path<String>,
    body: Body,
) -> Result<impl IntoResponse> {
    let stream = body.into_data_stream().map_err(std::io::Error::other);
    let file_name = state.store.put(&key, stream).await?;
    tracing::info!(key = %key, file = %file_name, "stored");
    Ok((
        StatusCode::CREATED,
        axum::Json(StoredResponse { key: file_name }),
    ))
}

async fn get_file(
    State(state): State<VolumeState>,
    Path(key): Path<String>,
    request: Request,
) -> Result<Response> {
    let path = state.store.open_blob(&key).await?;
    let file_name = state.store.content_address(&key).file_name;

    let mut response = ServeFile::new(&path)
        .oneshot(request)
        .await
        .map_err(|e| Error::Internal(e.to_string()))?
        .map(Body::new);

    if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", file_name)) {
        response
            .headers_mut()
            .insert(header::CONTENT_DISPOSITION, value);
    }
    Ok(response)
}

async fn delete_file(
    State(state): State<VolumeState>,
    Path(key): Path<String>,
) -> Result<StatusCode> {
    // Failures surface as error responses; the node keeps serving.
    state.store.delete(&key).await?;
    tracing::info!(key = %key, "deleted");
    Ok(StatusCode::NO_CONTENT)
}
