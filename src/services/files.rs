//! Storing uploads and turning object keys into public URLs.

use crate::{
    error::AppError,
    storage::{SharedStorage, object_key},
    upload::{DetectedType, UploadedFile},
};

/// An upload written to the disk.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub key: String,
    pub detected: DetectedType,
    pub size: i64,
}

/// Write an accepted upload under `dir` and return its key.
pub async fn store(
    storage: &SharedStorage,
    dir: &str,
    file: UploadedFile,
    detected: DetectedType,
) -> Result<StoredFile, AppError> {
    let key = object_key(dir, detected.extension);
    let size = file.size() as i64;

    storage.put(&key, file.bytes, detected.mime).await?;
    tracing::debug!(%key, size, original = %file.file_name, "Stored upload");

    Ok(StoredFile {
        key,
        detected,
        size,
    })
}

/// Best-effort delete; failures are logged, never returned.
pub async fn discard(storage: &SharedStorage, key: &str) {
    match storage.exists(key).await {
        Ok(true) => {
            if let Err(e) = storage.delete(key).await {
                tracing::error!(%key, "Failed to delete stored file: {}", e);
            }
        }
        Ok(false) => tracing::warn!(%key, "Stored file already missing"),
        Err(e) => tracing::error!(%key, "Failed to check stored file: {}", e),
    }
}

/// Public URL of `key`, or `None` when the object is missing or the disk
/// cannot be reached.
pub async fn visible_url(storage: &SharedStorage, key: &str, owner: &str, id: i64) -> Option<String> {
    match storage.exists(key).await {
        Ok(true) => Some(storage.url(key)),
        Ok(false) => {
            tracing::warn!(%key, "File not found in storage for {} {}", owner, id);
            None
        }
        Err(e) => {
            tracing::error!(%key, "Storage error for {} {}: {}", owner, id, e);
            None
        }
    }
}
