//! HTTP API for the master
//!
//! - `PUT /:key` replicate and index, `201` with the stored id
//! - `GET /:key` `302` to a live replica's direct URL
//! - `DELETE /:key` remove from every replica and the index, `204`
//! - `GET /health` liveness
//! - `GET /admin/verify` replication report over the whole index
//!
//! Keys are a single path segment; a key containing `/` must be sent
//! percent-encoded. `health` and `admin` are rejected as keys with `400`
//! on every method, so `GET /health` always means liveness.

use crate::common::tracing_middleware::request_tracing_middleware;
use crate::common::{Error, Result};
use crate::coordinator::cluster::Cluster;
use crate::coordinator::verify::{VerifyReport, DEFAULT_VERIFY_CONCURRENCY};
use crate::coordinator::write::PutOutcome;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{any, get},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

/// Shared master state for HTTP handlers.
#[derive(Clone)]
pub struct CoordState {
    pub cluster: Cluster,
}

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    pub concurrency: Option<usize>,
}

/// Creates the HTTP router for the master.
pub fn create_router(state: CoordState, max_blob_size: usize) -> Router {
    Router::new()
        .route(
            "/health",
            get(health).put(reserved_key).delete(reserved_key),
        )
        .route("/admin/verify", get(admin_verify))
        .route("/", any(empty_key))
        .route("/:key", get(get_key).put(put_key).delete(delete_key))
        .layer(DefaultBodyLimit::max(max_blob_size))
        .layer(middleware::from_fn(request_tracing_middleware))
        .with_state(state)
}

async fn health(State(state): State<CoordState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "groups": state.cluster.router().groups().len(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn empty_key() -> Error {
    Error::InvalidKey("key required".into())
}

async fn reserved_key() -> Error {
    Error::InvalidKey("key \"health\" is reserved".into())
}

async fn put_key(
    State(state): State<CoordState>,
    Path(key): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<PutOutcome>)> {
    let outcome = state.cluster.put(&key, body).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

async fn get_key(
    State(state): State<CoordState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse> {
    let url = state.cluster.locate(&key).await?;
    Ok((StatusCode::FOUND, [(header::LOCATION, url)]))
}

async fn delete_key(
    State(state): State<CoordState>,
    Path(key): Path<String>,
) -> Result<StatusCode> {
    state.cluster.delete(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn admin_verify(
    State(state): State<CoordState>,
    Query(params): Query<VerifyParams>,
) -> Result<Json<VerifyReport>> {
    let concurrency = params.concurrency.unwrap_or(DEFAULT_VERIFY_CONCURRENCY);
    Ok(Json(state.cluster.verify(concurrency).await?))
}
