//! Blob store keeping one JSON file per key inside a data directory.

use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::future::BoxFuture;
use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

use crate::dao::{
    blob_store::BlobStore,
    storage::{StorageError, StorageResult},
};

/// Failures that can occur while touching the data directory.
#[derive(Debug, Error)]
pub enum FileStoreError {
    /// The data directory could not be created.
    #[error("failed to create data directory `{path}`")]
    CreateDir {
        /// Directory being created.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// Reading an existing blob failed.
    #[error("failed to read blob file `{path}`")]
    Read {
        /// File being touched.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// Writing the temporary blob file failed.
    #[error("failed to write blob file `{path}`")]
    Write {
        /// File being touched.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// Moving the temporary file over the previous blob failed.
    #[error("failed to replace blob file `{path}`")]
    Replace {
        /// File being touched.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}

impl From<FileStoreError> for StorageError {
    fn from(err: FileStoreError) -> Self {
        StorageError::unavailable(err.to_string(), err)
    }
}

/// Blob store writing `<key>.json` files under a root directory.
#[derive(Clone)]
pub struct FileBlobStore {
    root: Arc<Path>,
    quota_bytes: Option<usize>,
}

impl FileBlobStore {
    /// Build a store rooted at `root`; the directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Arc::from(root.into()),
            quota_bytes: None,
        }
    }

    /// Refuse blobs larger than `limit` bytes, mirroring browser storage quotas.
    pub fn with_quota(mut self, limit: usize) -> Self {
        self.quota_bytes = Some(limit);
        self
    }

    /// Directory holding the blob files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| match c {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
                _ => '_',
            })
            .collect();
        self.root.join(format!("{file_name}.json"))
    }

    async fn write_blob(&self, key: &str, value: String) -> StorageResult<()> {
        let size = value.len();
        if let Some(limit) = self.quota_bytes.filter(|limit| size > *limit) {
            return Err(StorageError::QuotaExceeded {
                key: key.to_string(),
                size,
                limit,
            });
        }

        fs::create_dir_all(&self.root)
            .await
            .map_err(|source| FileStoreError::CreateDir {
                path: self.root.to_path_buf(),
                source,
            })?;

        let path = self.path_for(key);
        let staging = path.with_extension(format!("json.{}.tmp", Uuid::new_v4().simple()));
        if let Err(source) = fs::write(&staging, value.as_bytes()).await {
            let _ = fs::remove_file(&staging).await;
            if source.kind() == ErrorKind::StorageFull {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    size,
                    limit: self.quota_bytes.unwrap_or(size),
                });
            }
            return Err(FileStoreError::Write {
                path: staging,
                source,
            }
            .into());
        }

        // Commit point. The rename runs inline, never on the blocking pool, so a
        // write dropped by its caller either completed in this poll or left the
        // previous blob in place.
        if let Err(source) = std::fs::rename(&staging, &path) {
            let _ = std::fs::remove_file(&staging);
            return Err(FileStoreError::Replace { path, source }.into());
        }

        Ok(())
    }
}

impl BlobStore for FileBlobStore {
    fn read(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let path = self.path_for(key);
        Box::pin(async move {
            match fs::read_to_string(&path).await {
                Ok(contents) => Ok(Some(contents)),
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
                Err(source) => Err(FileStoreError::Read { path, source }.into()),
            }
        })
    }

    fn write(&self, key: &str, value: String) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let key = key.to_string();
        Box::pin(async move { store.write_blob(&key, value).await })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn missing_blob_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBlobStore::new(dir.path().join("nested"));
        assert!(store.read("gameshow.app.v1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn write_then_read_returns_latest_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBlobStore::new(dir.path().join("data"));

        store.write("gameshow.app.v1", "{\"users\":[]}".into()).await.unwrap();
        store.write("gameshow.app.v1", "{\"users\":[\"sam\"]}".into()).await.unwrap();

        let stored = store.read("gameshow.app.v1").await.unwrap();
        assert_eq!(stored.as_deref(), Some("{\"users\":[\"sam\"]}"));
        assert!(dir.path().join("data/gameshow.app.v1.json").exists());
        assert_eq!(std::fs::read_dir(dir.path().join("data")).unwrap().count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn timed_out_write_never_lands_later() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBlobStore::new(dir.path());
        store.write("key", "v0".into()).await.unwrap();

        let mut committed = "v0".to_string();
        for attempt in 1..=40u64 {
            let value = format!("v{attempt}");
            let limit = Duration::from_micros(attempt * 25);
            if let Ok(result) = tokio::time::timeout(limit, store.write("key", value.clone())).await {
                result.unwrap();
                committed = value;
            }
            // Give any write left on the blocking pool time to finish.
            tokio::time::sleep(Duration::from_millis(10)).await;
            assert_eq!(store.read("key").await.unwrap().as_deref(), Some(committed.as_str()));
        }
    }

    #[tokio::test]
    async fn oversized_blob_is_rejected_with_quota_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBlobStore::new(dir.path()).with_quota(8);

        let err = store.write("key", "0123456789".into()).await.unwrap_err();
        assert!(err.is_quota_exceeded());
        assert!(store.read("key").await.unwrap().is_none());
    }

    #[test]
    fn keys_are_sanitized_into_file_names() {
        let store = FileBlobStore::new("/tmp/root");
        assert_eq!(
            store.path_for("../evil key"),
            PathBuf::from("/tmp/root/.._evil_key.json")
        );
    }
}
