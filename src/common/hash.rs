//! Hashing utilities for tinyblob
//!
//! - BLAKE3 for shard selection and topology fingerprints
//! - SHA-256 for content addressing on volumes

use crate::common::encode_key;
use sha2::{Digest, Sha256};

/// Compute shard index for a key.
///
/// The first 8 bytes of BLAKE3(key), read little-endian, modulo `num_shards`.
/// `num_shards` must be non-zero.
pub fn shard_key(key: &str, num_shards: u64) -> u64 {
    let hash = blake3::hash(key.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&hash.as_bytes()[0..8]);
    u64::from_le_bytes(prefix) % num_shards
}

/// Lowercase hex SHA-256 of a key.
pub fn sha256_hex(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

/// Compute directory prefix for blob storage (2-level hierarchy)
///
/// Returns (aa, bb), the first two byte pairs of the hex SHA-256 of the key.
/// This creates a balanced directory tree: root/aa/bb/<leaf>
pub fn blob_prefix(key: &str) -> (String, String) {
    let digest = sha256_hex(key);
    (digest[0..2].to_string(), digest[2..4].to_string())
}

/// Leaf filename for a key: `<sha256hex>_<encoded key>`.
pub fn blob_file_name(key: &str) -> String {
    format!("{}_{}", sha256_hex(key), encode_key(key))
}

/// Fingerprint of an ordered replica-group topology.
pub fn topology_fingerprint(groups: &[Vec<String>]) -> String {
    let mut hasher = blake3::Hasher::new();
    for group in groups {
        for endpoint in group {
            hasher.update(endpoint.as_bytes());
            hasher.update(b",");
        }
        hasher.update(b";");
    }
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shard_key_deterministic() {
        let key = "test-key";
        let shard1 = shard_key(key, 4);
        let shard2 = shard_key(key, 4);
        assert_eq!(shard1, shard2);
        assert!(shard1 < 4);
    }

    #[test]
    fn test_shard_key_spreads_keys() {
        let mut seen = [0usize; 4];
        for i in 0..400 {
            seen[shard_key(&format!("key-{}", i), 4) as usize] += 1;
        }
        assert!(seen.iter().all(|&n| n > 0), "every shard gets keys: {:?}", seen);
    }

    #[test]
    fn test_blob_prefix() {
        let (aa, bb) = blob_prefix("a.txt");
        assert_eq!(aa, "18");
        assert_eq!(bb, "b7");
    }

    #[test]
    fn test_blob_file_name() {
        assert_eq!(
            blob_file_name("my_test_file.txt"),
            "913b8765ecb1a18a0b4d761258a43765a236982000009682c18298dd2d376758_my_test_file.txt"
        );
        // Separators never reach the filesystem
        assert!(!blob_file_name("dir/sub/file").contains('/'));
    }

    #[test]
    fn test_topology_fingerprint() {
        let a = vec![vec!["http://a".to_string(), "http://b".to_string()]];
        let b = vec![vec!["http://b".to_string(), "http://a".to_string()]];
        assert_eq!(topology_fingerprint(&a), topology_fingerprint(&a));
        assert_eq!(topology_fingerprint(&a).len(), 64);
        assert_ne!(topology_fingerprint(&a), topology_fingerprint(&b));
    }
}
