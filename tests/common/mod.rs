//! In-process cluster harness: real volume and master routers on ephemeral
//! ports, driven over HTTP.

#![allow(dead_code)]

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::IntoResponse;
use axum::Router;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tinyblob::common::{CoordinatorConfig, ReplicaGroupConfig, VolumeConfig};
use tinyblob::{Coordinator, VolumeServer};

pub struct TestVolume {
    pub url: String,
    pub dir: TempDir,
    down: Arc<AtomicBool>,
}

impl TestVolume {
    /// Make the node answer every request with 503.
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    /// Blob files under the storage root, temporaries included.
    pub fn file_count(&self) -> usize {
        count_files(self.dir.path())
    }
}

pub struct TestCluster {
    pub master_url: String,
    pub volumes: Vec<TestVolume>,
    pub index_dir: TempDir,
    replicas: usize,
}

impl TestCluster {
    /// Client that does not follow redirects, to inspect the master directly.
    pub fn raw_client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap()
    }

    pub fn key_url(&self, key: &str) -> String {
        format!("{}/{}", self.master_url, tinyblob::common::encode_key(key))
    }

    pub fn groups(&self) -> Vec<Vec<String>> {
        self.volumes
            .chunks(self.replicas)
            .map(|g| g.iter().map(|v| v.url.clone()).collect())
            .collect()
    }

    /// Volumes of the group owning `key`.
    pub fn group_of(&self, key: &str) -> &[TestVolume] {
        let groups = self.volumes.len() / self.replicas;
        let g = tinyblob::common::shard_key(key, groups as u64) as usize;
        &self.volumes[g * self.replicas..(g + 1) * self.replicas]
    }

    pub fn total_files(&self) -> usize {
        self.volumes.iter().map(TestVolume::file_count).sum()
    }
}

async fn serve_on_ephemeral(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

pub async fn start_volume(id: &str) -> TestVolume {
    let dir = TempDir::new().unwrap();
    let config = VolumeConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        data_path: dir.path().to_path_buf(),
    };
    let down = Arc::new(AtomicBool::new(false));
    let flag = down.clone();
    let router = VolumeServer::new(config, id.to_string())
        .router()
        .unwrap()
        .layer(middleware::from_fn(move |req: Request, next: Next| {
            let flag = flag.clone();
            async move {
                if flag.load(Ordering::SeqCst) {
                    return StatusCode::SERVICE_UNAVAILABLE.into_response();
                }
                next.run(req).await
            }
        }));
    let url = serve_on_ephemeral(router).await;
    TestVolume { url, dir, down }
}

pub fn master_config(index_dir: &Path, groups: Vec<Vec<String>>) -> CoordinatorConfig {
    CoordinatorConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        db_path: index_dir.join("index"),
        groups: groups
            .into_iter()
            .map(|replicas| ReplicaGroupConfig { replicas })
            .collect(),
        request_timeout_ms: 5_000,
        probe_timeout_ms: 500,
        max_blob_size: 16 * 1024 * 1024,
    }
}

/// Start `groups × replicas` volumes and a master routing over them.
pub async fn start_cluster(groups: usize, replicas: usize) -> TestCluster {
    let mut volumes = Vec::new();
    for i in 0..groups * replicas {
        volumes.push(start_volume(&format!("vol-{}", i + 1)).await);
    }
    let index_dir = TempDir::new().unwrap();

    let topology = volumes
        .chunks(replicas)
        .map(|g| g.iter().map(|v| v.url.clone()).collect())
        .collect();
    let coordinator = Coordinator::new(master_config(index_dir.path(), topology));
    let cluster = coordinator.cluster().unwrap();
    let master_url = serve_on_ephemeral(coordinator.router(cluster)).await;

    TestCluster {
        master_url,
        volumes,
        index_dir,
        replicas,
    }
}

fn count_files(dir: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    entries
        .flatten()
        .map(|e| {
            let path = e.path();
            if path.is_dir() {
                count_files(&path)
            } else {
                1
            }
        })
        .sum()
}
