use thiserror::Error;

use crate::blob_store::BlobStoreError;
use crate::query::TokenError;
use crate::storage::DatabaseError;

/// Failure of a single file operation.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("Store failure: {0}")]
    Store(DatabaseError),
    #[error("Blob store failure: {0}")]
    Blob(BlobStoreError),
}

impl FileError {
    /// HTTP status of the failure. "Not found" is reported as 400.
    pub fn status(&self) -> u16 {
        match self {
            FileError::Validation(_) | FileError::NotFound(_) => 400,
            FileError::Unauthorized(_) => 401,
            FileError::Store(_) | FileError::Blob(_) => 500,
        }
    }

    pub fn is_upstream(&self) -> bool {
        matches!(self, FileError::Store(_) | FileError::Blob(_))
    }
}

impl From<DatabaseError> for FileError {
    fn from(e: DatabaseError) -> Self {
        match e {
            // Start keys come from caller-supplied tokens.
            DatabaseError::InvalidStartKey(msg) => {
                FileError::Validation(format!("Invalid continuation token: {msg}"))
            }
            other => FileError::Store(other),
        }
    }
}

impl From<BlobStoreError> for FileError {
    fn from(e: BlobStoreError) -> Self {
        match e {
            BlobStoreError::NotFound(key) => FileError::NotFound(format!("No content stored for {key}")),
            BlobStoreError::InvalidKey(key) => FileError::Validation(format!("Invalid file location {key}")),
            other => FileError::Blob(other),
        }
    }
}

impl From<TokenError> for FileError {
    fn from(e: TokenError) -> Self {
        FileError::Validation(e.to_string())
    }
}
