//! Persistence adapter.
//!
//! The core keeps four named collections in a key-value blob store, each one a
//! JSON array written back in full on every change. Backends only move strings
//! around; [`Collections`] adds typing and the fail-soft read policy: a missing,
//! unreadable or malformed collection is treated as empty so the application
//! keeps running and can re-initialize.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::User;
use crate::error::StorageError;

pub mod catalog;
pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Low-level key-value interface a storage backend must provide.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Returns the stored value, or `None` if the key was never written.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError>;

    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// The logical collections kept by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKey {
    Users,
    Orders,
    Restaurants,
    CurrentUser,
}

impl CollectionKey {
    pub fn storage_key(self) -> &'static str {
        match self {
            CollectionKey::Users => "axle_users",
            CollectionKey::Orders => "axle_orders",
            CollectionKey::Restaurants => "axle_restaurants",
            CollectionKey::CurrentUser => "axle_current_user",
        }
    }
}

impl std::fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.storage_key())
    }
}

/// Typed access to the collections on top of a [`BlobStore`].
#[derive(Clone)]
pub struct Collections {
    backend: Arc<dyn BlobStore>,
}

impl Collections {
    pub fn new(backend: Arc<dyn BlobStore>) -> Self {
        Self { backend }
    }

    /// Reads a collection, failing on backend or decode errors.
    pub async fn try_load_all<T: DeserializeOwned>(&self, key: CollectionKey) -> Result<Vec<T>, StorageError> {
        match self.backend.get(key.storage_key()).await? {
            Some(raw) => serde_json::from_str(&raw).map_err(|e| StorageError::Serialization(e.to_string())),
            None => Ok(Vec::new()),
        }
    }

    /// Reads a collection, falling back to empty when it cannot be read.
    pub async fn load_all<T: DeserializeOwned>(&self, key: CollectionKey) -> Vec<T> {
        match self.try_load_all(key).await {
            Ok(items) => {
                debug!(collection = %key, count = items.len(), "Loaded collection");
                items
            }
            Err(e) => {
                warn!(collection = %key, error = %e, "Collection unreadable, using empty fallback");
                Vec::new()
            }
        }
    }

    /// Replaces a collection with `items`.
    pub async fn save_all<T: Serialize>(&self, key: CollectionKey, items: &[T]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(items).map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.backend.set(key.storage_key(), raw).await?;
        debug!(collection = %key, count = items.len(), "Saved collection");
        Ok(())
    }

    /// Writes `defaults` unless the collection already holds readable data.
    ///
    /// Returns whether the defaults were written.
    pub async fn initialize_if_empty<T: Serialize + DeserializeOwned>(
        &self,
        key: CollectionKey,
        defaults: &[T],
    ) -> Result<bool, StorageError> {
        match self.backend.get(key.storage_key()).await? {
            Some(raw) if serde_json::from_str::<Vec<T>>(&raw).is_ok() => Ok(false),
            Some(_) => {
                warn!(collection = %key, "Collection corrupt, re-initializing");
                self.save_all(key, defaults).await?;
                Ok(true)
            }
            None => {
                self.save_all(key, defaults).await?;
                Ok(true)
            }
        }
    }

    /// Seeds the restaurant catalog and creates the empty user and order lists.
    pub async fn initialize(&self) -> Result<(), StorageError> {
        if self
            .initialize_if_empty(CollectionKey::Restaurants, &catalog::default_restaurants())
            .await?
        {
            debug!("Seeded default restaurant catalog");
        }
        self.initialize_if_empty::<crate::domain::Order>(CollectionKey::Orders, &[]).await?;
        self.initialize_if_empty::<User>(CollectionKey::Users, &[]).await?;
        Ok(())
    }

    pub async fn current_user(&self) -> Option<User> {
        let raw = match self.backend.get(CollectionKey::CurrentUser.storage_key()).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(error = %e, "Current user unreadable");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "Current user record corrupt");
                None
            }
        }
    }

    pub async fn set_current_user(&self, user: Option<&User>) -> Result<(), StorageError> {
        let key = CollectionKey::CurrentUser.storage_key();
        match user {
            Some(user) => {
                let raw = serde_json::to_string(user).map_err(|e| StorageError::Serialization(e.to_string()))?;
                self.backend.set(key, raw).await
            }
            None => self.backend.remove(key).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Restaurant;

    fn collections() -> (MemoryStore, Collections) {
        let store = MemoryStore::new();
        let collections = Collections::new(Arc::new(store.clone()));
        (store, collections)
    }

    #[tokio::test]
    async fn test_initialize_seeds_catalog_once() {
        let (_, collections) = collections();
        collections.initialize().await.unwrap();

        let restaurants: Vec<Restaurant> = collections.load_all(CollectionKey::Restaurants).await;
        assert_eq!(restaurants.len(), 3);

        collections
            .save_all(CollectionKey::Restaurants, &restaurants[..1])
            .await
            .unwrap();
        collections.initialize().await.unwrap();
        let restaurants: Vec<Restaurant> = collections.load_all(CollectionKey::Restaurants).await;
        assert_eq!(restaurants.len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_collection_falls_back_to_empty() {
        let (store, collections) = collections();
        store.insert_raw(CollectionKey::Users.storage_key(), "{not json");

        let users: Vec<User> = collections.load_all(CollectionKey::Users).await;
        assert!(users.is_empty());
        assert!(collections.try_load_all::<User>(CollectionKey::Users).await.is_err());

        assert!(collections.initialize_if_empty::<User>(CollectionKey::Users, &[]).await.unwrap());
        assert!(collections.try_load_all::<User>(CollectionKey::Users).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_current_user_round_trip_and_clear() {
        let (_, collections) = collections();
        assert!(collections.current_user().await.is_none());

        let admin = User::admin("admin_1", "Root");
        collections.set_current_user(Some(&admin)).await.unwrap();
        assert_eq!(collections.current_user().await, Some(admin));

        collections.set_current_user(None).await.unwrap();
        assert!(collections.current_user().await.is_none());
    }
}
