//! Utility functions for tinyblob

use crate::common::{Error, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::time::{SystemTime, UNIX_EPOCH};

/// Percent-encoding set for keys (includes /, %, and control chars)
const KEY_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b'/')
    .add(b'\\')
    .add(b'%')
    .add(b' ')
    .add(b'?')
    .add(b'#')
    .add(b'&');

/// Longest accepted key, in bytes.
pub const MAX_KEY_LEN: usize = 180;

/// Longest accepted key once percent-encoded. The leaf filename is
/// `<64 hex>_<encoded key>` and must fit in a 255-byte name.
pub const MAX_ENCODED_KEY_LEN: usize = 255 - 64 - 1;

/// Names shadowed by master routes (`/health`, `/admin/...`).
pub const RESERVED_KEYS: &[&str] = &["health", "admin"];

/// Encode a key for URL/filesystem usage
pub fn encode_key(key: &str) -> String {
    utf8_percent_encode(key, KEY_ENCODE_SET).to_string()
}

/// Check a client key before any work is done for it.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::InvalidKey("key required".into()));
    }
    if key.len() > MAX_KEY_LEN {
        return Err(Error::InvalidKey(format!(
            "key longer than {} bytes",
            MAX_KEY_LEN
        )));
    }
    if key.contains('\0') {
        return Err(Error::InvalidKey("key contains NUL".into()));
    }
    if encode_key(key).len() > MAX_ENCODED_KEY_LEN {
        return Err(Error::InvalidKey(format!(
            "key longer than {} bytes once percent-encoded",
            MAX_ENCODED_KEY_LEN
        )));
    }
    if RESERVED_KEYS.contains(&key) {
        return Err(Error::InvalidKey(format!("key {:?} is reserved", key)));
    }
    Ok(())
}

/// Format bytes as human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_idx])
}

/// Get current Unix timestamp (seconds)
pub fn timestamp_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Resolves on Ctrl-C; used for graceful server shutdown.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_key() {
        assert_eq!(encode_key("a.txt"), "a.txt");
        assert_eq!(
            encode_key("photos/2024/a b?.jpg"),
            "photos%2F2024%2Fa%20b%3F.jpg"
        );
        assert_eq!(encode_key("..\\up"), "..%5Cup");
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("a.txt").is_ok());
        assert!(matches!(validate_key(""), Err(Error::InvalidKey(_))));
        assert!(validate_key(&"x".repeat(MAX_KEY_LEN)).is_ok());
        assert!(validate_key(&"x".repeat(MAX_KEY_LEN + 1)).is_err());
        assert!(validate_key("bad\0key").is_err());
    }

    #[test]
    fn test_validate_key_bounds_encoded_length() {
        // Short raw keys that triple in size when encoded
        assert!(matches!(
            validate_key(&"é".repeat(90)),
            Err(Error::InvalidKey(_))
        ));
        assert!(matches!(
            validate_key(&"/".repeat(180)),
            Err(Error::InvalidKey(_))
        ));
        assert!(validate_key(&"a b".repeat(60)).is_err());

        // 63 slashes encode to 189 bytes, one under the limit
        assert!(validate_key(&"/".repeat(63)).is_ok());
        assert!(validate_key(&"/".repeat(64)).is_err());
        assert!(validate_key(&"é".repeat(31)).is_ok());
        assert!(validate_key(&"é".repeat(32)).is_err());
    }

    #[test]
    fn test_reserved_keys_rejected() {
        assert!(matches!(validate_key("health"), Err(Error::InvalidKey(_))));
        assert!(matches!(validate_key("admin"), Err(Error::InvalidKey(_))));
        assert!(validate_key("health.txt").is_ok());
        assert!(validate_key("admin/notes").is_ok());
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512.00 B");
        assert_eq!(format_bytes(1536), "1.50 KB");
    }
}
