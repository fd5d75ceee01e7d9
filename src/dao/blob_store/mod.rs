/// One file per key under a data directory.
pub mod file;
/// In-process store with a byte quota.
pub mod memory;

use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;

pub use file::FileBlobStore;
pub use memory::MemoryBlobStore;

/// Abstraction over the key-value medium holding the serialized application blob.
pub trait BlobStore: Send + Sync {
    /// Read the blob stored under `key`, `None` when nothing was ever written.
    fn read(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>>;
    /// Replace the blob stored under `key`.
    ///
    /// Dropping the returned future before it resolves must leave the previous
    /// blob in place: a write either completes while polled or never lands.
    fn write(&self, key: &str, value: String) -> BoxFuture<'static, StorageResult<()>>;
}
