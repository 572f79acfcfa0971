use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};

use super::{blob_key, Blob, BlobStore, BlobStoreError};

/// Local filesystem blob store for development and testing.
///
/// Content types are not persisted; they are derived from the file extension
/// on read.
pub struct LocalStore {
    base_path: PathBuf,
}

impl LocalStore {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self, std::io::Error> {
        let base_path = base_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    /// Each key segment must be a single normal path component, so a blob
    /// can never land outside `base_path`.
    fn blob_path(&self, owner_id: &str, file_name: &str) -> Result<PathBuf, BlobStoreError> {
        for segment in [owner_id, file_name] {
            let mut components = Path::new(segment).components();
            let single_normal = matches!(components.next(), Some(Component::Normal(_)))
                && components.next().is_none()
                && !segment.contains(['/', '\\']);
            if !single_normal {
                return Err(BlobStoreError::InvalidKey(blob_key(owner_id, file_name)));
            }
        }
        Ok(self.base_path.join(owner_id).join(file_name))
    }
}

#[async_trait]
impl BlobStore for LocalStore {
    async fn put(&self, owner_id: &str, file_name: &str, blob: Blob) -> Result<(), BlobStoreError> {
        let path = self.blob_path(owner_id, file_name)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &blob.data).await?;
        Ok(())
    }

    async fn get(&self, owner_id: &str, file_name: &str) -> Result<Blob, BlobStoreError> {
        let path = self.blob_path(owner_id, file_name)?;
        if !path.exists() {
            return Err(BlobStoreError::NotFound(blob_key(owner_id, file_name)));
        }
        let data = tokio::fs::read(&path).await?;
        Ok(Blob {
            data: Bytes::from(data),
            content_type: mime_guess::from_path(file_name)
                .first_or_octet_stream()
                .to_string(),
        })
    }

    async fn delete(&self, owner_id: &str, file_name: &str) -> Result<(), BlobStoreError> {
        let path = self.blob_path(owner_id, file_name)?;
        if path.exists() {
            tokio::fs::remove_file(&path).await?;
        }
        Ok(())
    }
}
