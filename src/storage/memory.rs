//! In-process disk. Contents are lost on restart.
//!
//! Objects are served by the app itself under `/storage`.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use axum::body::Bytes;

use super::{Storage, StorageError, check_key, join_url};

#[derive(Debug)]
pub struct MemoryDisk {
    objects: RwLock<HashMap<String, (Bytes, String)>>,
    public_url: String,
}

impl MemoryDisk {
    pub fn new(public_url: impl Into<String>) -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            public_url: public_url.into(),
        }
    }

    /// Stored bytes and content type of an object.
    pub fn get(&self, key: &str) -> Option<(Bytes, String)> {
        self.objects
            .read()
            .ok()
            .and_then(|objects| objects.get(key).cloned())
    }

    pub fn len(&self) -> usize {
        self.objects.read().map(|objects| objects.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> StorageError {
    StorageError::Config("memory disk lock poisoned".to_string())
}

#[async_trait]
impl Storage for MemoryDisk {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), StorageError> {
        check_key(key)?;
        self.objects
            .write()
            .map_err(|_| poisoned())?
            .insert(key.to_string(), (bytes, content_type.to_string()));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.objects.write().map_err(|_| poisoned())?.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.objects.read().map_err(|_| poisoned())?.contains_key(key))
    }

    fn url(&self, key: &str) -> String {
        join_url(&self.public_url, key)
    }

    async fn read(&self, key: &str) -> Result<Option<(Bytes, String)>, StorageError> {
        Ok(self.get(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_and_forgets_objects() {
        let disk = MemoryDisk::new("http://memory.test");
        disk.put("teams/2025/01/a.png", Bytes::from_static(b"x"), "image/png")
            .await
            .unwrap();

        assert!(disk.exists("teams/2025/01/a.png").await.unwrap());
        assert_eq!(disk.get("teams/2025/01/a.png").unwrap().1, "image/png");

        disk.delete("teams/2025/01/a.png").await.unwrap();
        assert!(disk.is_empty());
    }

    #[tokio::test]
    async fn objects_can_be_read_back() {
        let disk = MemoryDisk::new("http://memory.test");
        disk.put("media/2025/01/b.jpg", Bytes::from_static(b"jpeg"), "image/jpeg")
            .await
            .unwrap();

        let (bytes, content_type) = disk.read("media/2025/01/b.jpg").await.unwrap().unwrap();
        assert_eq!(&bytes[..], b"jpeg");
        assert_eq!(content_type, "image/jpeg");
        assert!(disk.read("media/2025/01/missing.jpg").await.unwrap().is_none());
    }
}
