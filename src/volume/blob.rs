//! Content-addressed blob storage on the local filesystem
//!
//! Layout: `root/aa/bb/<sha256hex>_<encoded key>`, where `aa` and `bb` are the
//! first two byte pairs of the digest. Writes land in a temporary file inside
//! the leaf directory and are renamed into place, so readers only ever see
//! complete blobs.

use crate::common::{blob_file_name, blob_prefix, validate_key, Error, Result};
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Where a key lives on this volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentAddress {
    pub dir: PathBuf,
    pub file_name: String,
}

impl ContentAddress {
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }
}

/// Blob store rooted at one directory
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    /// Open or create blob store
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        std::fs::create_dir_all(root.as_ref())?;
        tracing::info!("BlobStore opened at {}", root.as_ref().display());
        Ok(Self {
            root: root.as_ref().to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Deterministic location of `key` under this root.
    pub fn content_address(&self, key: &str) -> ContentAddress {
        let (aa, bb) = blob_prefix(key);
        ContentAddress {
            dir: self.root.join(aa).join(bb),
            file_name: blob_file_name(key),
        }
    }

    /// Stream a blob to disk and return its canonical filename.
    ///
    /// The temporary file is removed if the stream fails, the write fails, or
    /// this future is dropped before completion.
    pub async fn put<S, E>(&self, key: &str, mut body: S) -> Result<String>
    where
        S: Stream<Item = std::result::Result<Bytes, E>> + Unpin,
        E: std::fmt::Display,
    {
        validate_key(key)?;
        let addr = self.content_address(key);
        tokio::fs::create_dir_all(&addr.dir).await?;

        let tmp = tempfile::Builder::new()
            .prefix(".tmp-")
            .tempfile_in(&addr.dir)?;
        let (std_file, tmp_path) = tmp.into_parts();
        let mut file = tokio::fs::File::from_std(std_file);

        let mut written: u64 = 0;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| {
                Error::Storage(std::io::Error::new(
                    std::io::ErrorKind::Interrupted,
                    format!("body stream failed: {}", e),
                ))
            })?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tmp_path.persist(addr.path()).map_err(|e| Error::Storage(e.error))?;

        tracing::debug!(key = %key, bytes = written, "stored blob");
        Ok(addr.file_name)
    }

    /// Store an in-memory blob.
    pub async fn put_bytes(&self, key: &str, data: impl Into<Bytes>) -> Result<String> {
        let chunk: std::result::Result<Bytes, std::io::Error> = Ok(data.into());
        self.put(key, futures_util::stream::iter(vec![chunk])).await
    }

    /// Resolve `key` to the path of an existing blob.
    pub async fn open_blob(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        let path = self.content_address(key).path();
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            Ok(_) => Err(Error::NotFound(key.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Read a whole blob into memory. Meant for small blobs and tests; the
    /// HTTP layer streams from `open_blob` instead.
    pub async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.open_blob(key).await?;
        Ok(tokio::fs::read(path).await?)
    }

    pub async fn exists(&self, key: &str) -> Result<bool> {
        match self.open_blob(key).await {
            Ok(_) => Ok(true),
            Err(Error::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Delete a blob
    pub async fn delete(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        let path = self.content_address(key).path();
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(key = %key, "deleted blob");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
