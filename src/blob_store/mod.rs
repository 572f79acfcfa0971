mod gcs;
mod local;

pub use gcs::GcsStore;
pub use local::LocalStore;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlobStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Blob not found: {0}")]
    NotFound(String),
    #[error("Invalid blob key: {0}")]
    InvalidKey(String),
    #[error("Backend error: {0}")]
    Backend(String),
}

/// File content together with its media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub data: Bytes,
    pub content_type: String,
}

/// Abstraction over blob storage backends.
/// Blobs are addressed by owner and file name, stored under `owner/file_name`.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, owner_id: &str, file_name: &str, blob: Blob) -> Result<(), BlobStoreError>;
    async fn get(&self, owner_id: &str, file_name: &str) -> Result<Blob, BlobStoreError>;
    /// Deleting a missing blob is not an error.
    async fn delete(&self, owner_id: &str, file_name: &str) -> Result<(), BlobStoreError>;
}

/// Storage key of a blob.
pub fn blob_key(owner_id: &str, file_name: &str) -> String {
    format!("{owner_id}/{file_name}")
}
