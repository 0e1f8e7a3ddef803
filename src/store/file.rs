use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;

use super::BlobStore;
use crate::error::StorageError;

/// Keeps each collection as a JSON file under a base directory.
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn file_path(&self, key: &str) -> PathBuf {
        let safe_key = key.replace(['/', ':', '\\'], "_");
        self.base_path.join(format!("{}.json", safe_key))
    }
}

#[async_trait]
impl BlobStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.file_path(key)).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Backend(e.to_string())),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        let path = self.file_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Backend(e.to_string()))?;
        }

        // Write then rename so readers never see a half-written collection.
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, value)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        fs::rename(&temp_path, &path)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.file_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Backend(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_values_survive_a_new_handle() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.set("axle_orders", "[]".to_string()).await.unwrap();

        let reopened = FileStore::new(dir.path());
        assert_eq!(reopened.get("axle_orders").await.unwrap(), Some("[]".to_string()));
        assert!(dir.path().join("axle_orders.json").exists());
    }

    #[tokio::test]
    async fn test_missing_key_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));
        assert_eq!(store.get("axle_users").await.unwrap(), None);

        store.set("axle_users", "[]".to_string()).await.unwrap();
        store.remove("axle_users").await.unwrap();
        store.remove("axle_users").await.unwrap();
        assert_eq!(store.get("axle_users").await.unwrap(), None);
    }
}
