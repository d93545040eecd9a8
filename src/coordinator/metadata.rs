//! Key index using RocksDB
//!
//! Stores:
//! - Key entries (key → replica group, stored filename, size, timestamp)
//! - Cluster configuration (topology fingerprint)
//!
//! RocksDB handles concurrent readers and writers itself, so the store is
//! shared behind an `Arc` without extra locking.

use crate::common::{topology_fingerprint, Error, Result};
use rocksdb::{Options, DB};
use serde::{Deserialize, Serialize};
use std::path::Path;

const CF_KEYS: &str = "keys";
const CF_CONFIG: &str = "config";

const TOPOLOGY_KEY: &str = "topology";

/// Durable record of which replica group owns a key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub key: String,
    /// Endpoints of the owning replica group, in group order
    pub replicas: Vec<String>,
    /// Canonical filename reported by the volumes
    pub file_name: String,
    pub size: u64,
    pub updated_at: u64,
}

/// Metadata store
pub struct MetadataStore {
    db: DB,
}

impl MetadataStore {
    /// Open or create metadata store
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let db = DB::open_cf(&opts, path, vec![CF_KEYS, CF_CONFIG])?;

        Ok(Self { db })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::IndexCorrupted(format!("missing column family {}", name)))
    }

    // === Key operations ===

    /// Put (or overwrite) a key entry
    pub fn put_key(&self, entry: &IndexEntry) -> Result<()> {
        let value = bincode::serialize(entry)?;
        self.db.put_cf(self.cf(CF_KEYS)?, entry.key.as_bytes(), value)?;
        Ok(())
    }

    /// Get a key entry
    pub fn get_key(&self, key: &str) -> Result<Option<IndexEntry>> {
        match self.db.get_cf(self.cf(CF_KEYS)?, key.as_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Delete a key entry
    pub fn delete_key(&self, key: &str) -> Result<()> {
        self.db.delete_cf(self.cf(CF_KEYS)?, key.as_bytes())?;
        Ok(())
    }

    /// All entries in key order
    pub fn list_entries(&self) -> Result<Vec<IndexEntry>> {
        let iter = self
            .db
            .iterator_cf(self.cf(CF_KEYS)?, rocksdb::IteratorMode::Start);

        let mut entries = Vec::new();
        for item in iter {
            let (_, value) = item?;
            entries.push(bincode::deserialize(&value)?);
        }
        Ok(entries)
    }

    pub fn is_empty(&self) -> Result<bool> {
        let mut iter = self
            .db
            .iterator_cf(self.cf(CF_KEYS)?, rocksdb::IteratorMode::Start);
        match iter.next() {
            Some(item) => {
                item?;
                Ok(false)
            }
            None => Ok(true),
        }
    }

    // === Config operations ===

    /// Put config value
    pub fn put_config(&self, key: &str, value: &[u8]) -> Result<()> {
        self.db.put_cf(self.cf(CF_CONFIG)?, key.as_bytes(), value)?;
        Ok(())
    }

    /// Get config value
    pub fn get_config(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.db.get_cf(self.cf(CF_CONFIG)?, key.as_bytes())?)
    }

    /// Bind the index to a replica-group topology.
    ///
    /// Entries are only meaningful under the topology that produced them, and
    /// resharding is not supported: a populated index refuses a different
    /// topology. An empty index adopts whatever it is given.
    pub fn check_topology(&self, groups: &[Vec<String>]) -> Result<()> {
        let fingerprint = topology_fingerprint(groups);
        if let Some(stored) = self.get_config(TOPOLOGY_KEY)? {
            if stored == fingerprint.as_bytes() {
                return Ok(());
            }
            if !self.is_empty()? {
                return Err(Error::InvalidConfig(
                    "replica group topology differs from the one this index was built with; \
                     resharding is not supported"
                        .into(),
                ));
            }
            tracing::warn!("Index is empty, adopting new replica group topology");
        }
        self.put_config(TOPOLOGY_KEY, fingerprint.as_bytes())
    }

    /// Flush to disk
    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}
