use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by blob storage backends regardless of the underlying medium.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The medium failed or could not be reached.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// What was being attempted.
        message: String,
        /// Backend failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// Writing the blob would exceed the medium's capacity.
    #[error("storage quota exceeded for `{key}` ({size} bytes, limit {limit} bytes)")]
    QuotaExceeded {
        /// Key being written.
        key: String,
        /// Size of the rejected write in bytes.
        size: usize,
        /// Capacity of the medium in bytes.
        limit: usize,
    },
    /// Stored data under `key` was never loaded and would be lost by the write.
    #[error("stored data under `{key}` was not loaded; refusing to overwrite it")]
    Protected {
        /// Key being protected.
        key: String,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Whether the failure means the medium is full rather than unreachable.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, StorageError::QuotaExceeded { .. })
    }
}
