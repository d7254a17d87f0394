//! Object storage disks.
//!
//! Uploaded banners, media files and profile pictures are written to a
//! `Storage` implementation selected by `STORAGE_DRIVER`. Rows only keep the
//! object key; URLs are derived from the disk on every read.

pub mod local;
pub mod memory;
pub mod s3;

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use chrono::{Datelike, Utc};
use uuid::Uuid;

use crate::config::Config;

pub use local::LocalDisk;
pub use memory::MemoryDisk;
pub use s3::S3Disk;

/// Shared handle to the configured disk.
pub type SharedStorage = Arc<dyn Storage>;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{operation} {key} returned status {status}")]
    UnexpectedStatus {
        operation: &'static str,
        key: String,
        status: u16,
    },

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Storage configuration error: {0}")]
    Config(String),
}

/// A disk that stores objects by key.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write `bytes` under `key`, replacing any existing object.
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), StorageError>;

    /// Remove the object. Removing a missing object succeeds.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Public URL of the object.
    fn url(&self, key: &str) -> String;

    /// Bytes and content type of an object the app serves itself.
    ///
    /// Disks whose URLs point at another server return `None`.
    async fn read(&self, _key: &str) -> Result<Option<(Bytes, String)>, StorageError> {
        Ok(None)
    }
}

/// Build an object key of the form `{dir}/{YYYY}/{MM}/{uuid}.{ext}`.
pub fn object_key(dir: &str, extension: &str) -> String {
    let now = Utc::now();
    format!(
        "{}/{:04}/{:02}/{}.{}",
        dir,
        now.year(),
        now.month(),
        Uuid::new_v4(),
        extension
    )
}

/// Reject keys that could escape a disk root or form an odd URL.
pub(crate) fn check_key(key: &str) -> Result<(), StorageError> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|segment| segment.is_empty() || segment == "." || segment == "..");

    if bad {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Select and build the disk named by the configuration.
pub fn from_config(config: &Config) -> Result<SharedStorage, StorageError> {
    match config.storage_driver.as_str() {
        "local" => Ok(Arc::new(LocalDisk::new(
            &config.storage_root,
            config.local_public_url(),
        ))),
        "memory" => Ok(Arc::new(MemoryDisk::new(config.local_public_url()))),
        "s3" => Ok(Arc::new(S3Disk::from_config(config)?)),
        other => Err(StorageError::Config(format!(
            "unknown storage driver '{other}' (expected local, s3 or memory)"
        ))),
    }
}

/// Join a base URL and an object key with exactly one slash.
pub(crate) fn join_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_key_has_dated_layout() {
        let key = object_key("pages", "jpg");
        let parts: Vec<&str> = key.split('/').collect();

        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "pages");
        assert_eq!(parts[1].len(), 4);
        assert_eq!(parts[2].len(), 2);
        assert!(parts[3].ends_with(".jpg"));
        assert!(check_key(&key).is_ok());
    }

    #[test]
    fn traversal_keys_are_rejected() {
        for key in ["", "/abs", "a/../b", "a//b", "a\\b", "./a"] {
            assert!(check_key(key).is_err(), "{key} should be rejected");
        }
    }

    #[test]
    fn join_url_normalizes_slashes() {
        assert_eq!(
            join_url("http://cdn.test/storage/", "media/a.png"),
            "http://cdn.test/storage/media/a.png"
        );
    }
}
