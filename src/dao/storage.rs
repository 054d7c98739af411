use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A stored record could not be mapped back to an entity.
    #[error("corrupted record `{key}`: {reason}")]
    Corrupted { key: String, reason: String },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Flag a record whose persisted shape no longer matches the entity.
    pub fn corrupted(key: impl Into<String>, reason: impl Into<String>) -> Self {
        StorageError::Corrupted {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
