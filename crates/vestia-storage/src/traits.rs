//! Storage abstraction trait.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("URL signing failed: {0}")]
    SigningFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable blob storage collaborator.
///
/// The pipeline only needs three operations; backends stay free of any
/// pipeline knowledge beyond the key format described at the crate root.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` under `storage_path`, overwriting any existing object.
    async fn upload(
        &self,
        storage_path: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<()>;

    /// Mint a time-limited read URL for `storage_path`, valid for exactly
    /// `ttl` from now. Callable repeatedly to refresh access.
    async fn create_signed_url(&self, storage_path: &str, ttl: Duration) -> StorageResult<String>;

    /// Delete the object. Removing a missing object is not an error.
    async fn remove(&self, storage_path: &str) -> StorageResult<()>;

    /// Whether an object exists under `storage_path`.
    async fn exists(&self, storage_path: &str) -> StorageResult<bool>;
}
