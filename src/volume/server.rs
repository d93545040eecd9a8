//! Volume server

use crate::common::{shutdown_signal, Result, VolumeConfig};
use crate::volume::blob::BlobStore;
use crate::volume::http::{create_router, VolumeState};
use axum::Router;
use std::sync::Arc;

pub struct VolumeServer {
    config: VolumeConfig,
    volume_id: String,
}

impl VolumeServer {
    pub fn new(config: VolumeConfig, volume_id: String) -> Self {
        Self { config, volume_id }
    }

    /// Open the storage root (creating it if absent) and build the HTTP app.
    pub fn router(&self) -> Result<Router> {
        let store = Arc::new(BlobStore::open(&self.config.data_path)?);
        Ok(create_router(VolumeState {
            store,
            volume_id: self.volume_id.clone(),
        }))
    }

    pub async fn serve(self) -> Result<()> {
        tracing::info!("Starting volume server: {}", self.volume_id);
        tracing::info!("  HTTP API: {}", self.config.bind_addr);
        tracing::info!("  Data path: {}", self.config.data_path.display());

        let http_router = self.router()?;

        let http_listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!("✓ Volume server ready");

        axum::serve(http_listener, http_router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Volume server stopped");
        Ok(())
    }
}
