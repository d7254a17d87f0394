//! Filesystem disk. Files are served back by the app under `/storage`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use axum::body::Bytes;

use super::{Storage, StorageError, check_key, join_url};

#[derive(Debug, Clone)]
pub struct LocalDisk {
    root: PathBuf,
    public_url: String,
}

impl LocalDisk {
    pub fn new(root: impl AsRef<Path>, public_url: impl Into<String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            public_url: public_url.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        check_key(key)?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl Storage for LocalDisk {
    async fn put(&self, key: &str, bytes: Bytes, _content_type: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &bytes).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.path_for(key)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    fn url(&self, key: &str) -> String {
        join_url(&self.public_url, key)
    }
}
