//! In-process blob store behaving like browser local storage.

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;

use crate::dao::{
    blob_store::BlobStore,
    storage::{StorageError, StorageResult},
};

/// Blob store backed by a concurrent map, with an optional quota over all keys.
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    entries: Arc<DashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryBlobStore {
    /// Empty store without a quota.
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the total number of bytes (keys and values) the store may hold.
    pub fn with_quota(mut self, limit: usize) -> Self {
        self.quota_bytes = Some(limit);
        self
    }

    /// Seed a raw value, bypassing the quota.
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Raw value currently stored for `key`.
    pub fn get_raw(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn used_bytes_excluding(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.key() != key)
            .map(|entry| entry.key().len() + entry.value().len())
            .sum()
    }
}

impl BlobStore for MemoryBlobStore {
    fn read(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let value = self.get_raw(key);
        Box::pin(async move { Ok(value) })
    }

    fn write(&self, key: &str, value: String) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let key = key.to_string();
        Box::pin(async move {
            if let Some(limit) = store.quota_bytes {
                if store.used_bytes_excluding(&key) + key.len() + value.len() > limit {
                    return Err(StorageError::QuotaExceeded {
                        key,
                        size: value.len(),
                        limit,
                    });
                }
            }
            store.entries.insert(key, value);
            Ok(())
        })
    }
}
