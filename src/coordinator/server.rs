//! Master server

use crate::common::{shutdown_signal, CoordinatorConfig, Result};
use crate::coordinator::cluster::Cluster;
use crate::coordinator::http::{create_router, CoordState};
use crate::coordinator::metadata::MetadataStore;
use crate::coordinator::placement::ShardRouter;
use crate::coordinator::volume_client::HttpVolumeClient;
use axum::Router;
use std::sync::Arc;

pub struct Coordinator {
    config: CoordinatorConfig,
}

impl Coordinator {
    pub fn new(config: CoordinatorConfig) -> Self {
        Self { config }
    }

    /// Open the index and wire the coordinators. Fails on an invalid
    /// topology or one that does not match the index.
    pub fn cluster(&self) -> Result<Cluster> {
        self.config.validate()?;
        let router = ShardRouter::from_config(&self.config.groups)?;
        let index = Arc::new(MetadataStore::open(&self.config.db_path)?);
        let volumes = Arc::new(HttpVolumeClient::new(self.config.request_timeout())?);
        Cluster::new(index, router, volumes, self.config.probe_timeout())
    }

    /// The master's HTTP app over `cluster`.
    pub fn router(&self, cluster: Cluster) -> Router {
        create_router(CoordState { cluster }, self.config.max_blob_size)
    }

    pub async fn serve(self) -> Result<()> {
        tracing::info!("Starting master");
        tracing::info!("  HTTP API: {}", self.config.bind_addr);
        tracing::info!("  Index path: {}", self.config.db_path.display());
        tracing::info!("  Replica groups: {}", self.config.groups.len());

        let cluster = self.cluster()?;
        for (i, group) in cluster.router().groups().iter().enumerate() {
            tracing::info!("  Group {}: {}", i, group.replicas.join(", "));
        }
        let index = cluster.index.clone();
        let http_router = self.router(cluster);

        let http_listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!("✓ Master ready");

        axum::serve(http_listener, http_router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        index.flush()?;
        tracing::info!("Master stopped");
        Ok(())
    }
}
