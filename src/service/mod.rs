//! File operations over the record store and the blob store.
//!
//! Single-item operations return [`FileError`]; the batch variants run them
//! through [`run_batch`] and report each item's outcome instead.

mod error;
mod models;
pub mod validation;

pub use error::FileError;
pub use models::{DeleteFilesRequest, ListFilesRequest, ListFilesResponse, UploadItem};

use std::sync::Arc;

use crate::batch::{run_batch, BatchResult, FailedItem};
use crate::blob_store::{Blob, BlobStore};
use crate::query::{paginate, project, token, Strategy};
use crate::storage::{Attribute, FileRecord, FileStore, Index, IndexQuery, KeyCondition, KeyMap};
use validation::{validate_file_name, validate_owner_id};

/// Target of one batch delete item.
enum DeleteTarget {
    Id(String),
    Name(String),
}

#[derive(Clone)]
pub struct FileService {
    store: Arc<dyn FileStore>,
    blobs: Arc<dyn BlobStore>,
    default_limit: i64,
}

impl FileService {
    pub fn new(store: Arc<dyn FileStore>, blobs: Arc<dyn BlobStore>, default_limit: i64) -> Self {
        Self {
            store,
            blobs,
            default_limit,
        }
    }

    // ------------------------------------------------------------------
    // Listing
    // ------------------------------------------------------------------

    /// List the ids of `owner_id`'s files matching `request`, resuming after
    /// `next_token` when given.
    pub fn list(
        &self,
        owner_id: &str,
        request: &ListFilesRequest,
        next_token: Option<&str>,
    ) -> Result<ListFilesResponse, FileError> {
        validate_owner_id(owner_id)?;
        let filter = request.filter()?;
        let strategy = Strategy::select(&filter);
        let index = strategy.index();

        let cursor = next_token
            .map(|t| self.resume_from(owner_id, t))
            .transpose()?;
        let start_key = project(cursor.as_ref(), index.key_attributes());
        let limit = request.limit.unwrap_or(self.default_limit);

        let page = paginate(self.store.as_ref(), &strategy.plan(owner_id), start_key, limit)?;
        let next_token = page
            .next_cursor
            .map(|cursor| self.continuation_token(&cursor))
            .transpose()?;

        tracing::debug!(
            owner_id,
            index = index.name(),
            count = page.ids.len(),
            more = next_token.is_some(),
            "Listed files"
        );

        Ok(ListFilesResponse {
            file_ids: page.ids,
            next_token,
        })
    }

    fn resume_from(&self, owner_id: &str, next_token: &str) -> Result<KeyMap, FileError> {
        let cursor = token::decode(next_token)?;
        if cursor.get(&Attribute::OwnerId).map(String::as_str) != Some(owner_id) {
            return Err(FileError::Validation(
                "Continuation token was not issued for this owner".to_string(),
            ));
        }
        Ok(cursor)
    }

    /// Tokens carry the full key of the last returned record so that the next
    /// request can re-project it onto whichever index it ends up using.
    fn continuation_token(&self, cursor: &KeyMap) -> Result<String, FileError> {
        let record = match cursor.get(&Attribute::FileId) {
            Some(file_id) => self.store.get(file_id)?,
            None => None,
        };
        let key = match record {
            Some(record) => record.key_map(),
            None => {
                tracing::warn!("Cursor record vanished, encoding the index key instead");
                cursor.clone()
            }
        };
        Ok(token::encode(&key)?)
    }

    // ------------------------------------------------------------------
    // Single-item operations
    // ------------------------------------------------------------------

    /// Store `item` for `owner_id`: blob first, then the record.
    ///
    /// If the record write fails, the blob is removed again unless an earlier
    /// record of the same name still points at it.
    pub async fn upload(&self, owner_id: &str, item: UploadItem) -> Result<FileRecord, FileError> {
        validate_owner_id(owner_id)?;
        let file_name = item
            .file_name
            .ok_or_else(|| FileError::Validation("File part has no file name".to_string()))?;
        let content_type = validate_file_name(&file_name)?;

        let record = FileRecord::new(owner_id, &file_name);
        let replaces_existing = self.find_by_name(owner_id, &file_name)?.is_some();
        self.blobs
            .put(
                owner_id,
                &file_name,
                Blob {
                    data: item.data,
                    content_type: content_type.to_string(),
                },
            )
            .await?;

        if let Err(e) = self.store.put(&record) {
            // Best-effort cleanup of the uploaded blob
            if !replaces_existing {
                let _ = self.blobs.delete(owner_id, &file_name).await;
            }
            return Err(e.into());
        }

        tracing::debug!(file_id = %record.file_id, owner_id, file_name = %file_name, "Uploaded file");
        Ok(record)
    }

    /// Delete a file by id. The caller must own it.
    pub async fn delete_by_id(&self, owner_id: &str, file_id: &str) -> Result<FileRecord, FileError> {
        let record = self
            .store
            .get(file_id)?
            .ok_or_else(|| FileError::NotFound(format!("No file with id '{file_id}'")))?;

        if record.owner_id != owner_id {
            return Err(FileError::Unauthorized(format!(
                "File '{file_id}' does not belong to '{owner_id}'"
            )));
        }

        self.remove(record).await
    }

    pub async fn delete_by_name(&self, owner_id: &str, file_name: &str) -> Result<FileRecord, FileError> {
        validate_owner_id(owner_id)?;
        let record = self.find_by_name(owner_id, file_name)?.ok_or_else(|| {
            FileError::NotFound(format!("No file named '{file_name}' for '{owner_id}'"))
        })?;
        self.remove(record).await
    }

    /// Blob, then record. A failure between the two is not rolled back.
    async fn remove(&self, record: FileRecord) -> Result<FileRecord, FileError> {
        self.blobs.delete(&record.owner_id, &record.file_name).await?;
        if !self.store.delete(&record.file_id)? {
            tracing::warn!(file_id = %record.file_id, "Record disappeared during delete");
        }
        tracing::debug!(file_id = %record.file_id, "Deleted file");
        Ok(record)
    }

    pub async fn fetch_by_id(&self, file_id: &str) -> Result<(FileRecord, Blob), FileError> {
        let record = self
            .store
            .get(file_id)?
            .ok_or_else(|| FileError::NotFound(format!("No file with id '{file_id}'")))?;
        let blob = self.blobs.get(&record.owner_id, &record.file_name).await?;
        Ok((record, blob))
    }

    pub async fn fetch_by_name(
        &self,
        owner_id: &str,
        file_name: &str,
    ) -> Result<(FileRecord, Blob), FileError> {
        validate_owner_id(owner_id)?;
        let record = self.find_by_name(owner_id, file_name)?.ok_or_else(|| {
            FileError::NotFound(format!("No file named '{file_name}' for '{owner_id}'"))
        })?;
        let blob = self.blobs.get(owner_id, file_name).await?;
        Ok((record, blob))
    }

    /// First record of `owner_id` named exactly `file_name`, in name-index
    /// order.
    pub fn find_by_name(&self, owner_id: &str, file_name: &str) -> Result<Option<FileRecord>, FileError> {
        let page = self.store.query(&IndexQuery {
            index: Index::Name,
            key_condition: KeyCondition::NameEquals {
                owner_id: owner_id.to_string(),
                file_name: file_name.to_string(),
            },
            filter: None,
            limit: 1,
            start_key: None,
        })?;

        match page
            .items
            .into_iter()
            .next()
            .and_then(|mut entry| entry.remove(&Attribute::FileId))
        {
            Some(file_id) => Ok(self.store.get(&file_id)?),
            None => Ok(None),
        }
    }

    // ------------------------------------------------------------------
    // Batches
    // ------------------------------------------------------------------

    /// Upload each item in submission order. A failed item is identified by
    /// its file name, or by `file[<index>]` when it has none.
    pub async fn upload_many(&self, owner_id: &str, items: Vec<UploadItem>) -> BatchResult {
        run_batch(items.into_iter().enumerate(), |(index, item)| async move {
            let identifier = item
                .file_name
                .clone()
                .unwrap_or_else(|| format!("file[{index}]"));
            self.upload(owner_id, item)
                .await
                .map_err(|e| self.failed(identifier, e))
        })
        .await
    }

    /// Delete every listed id, then every listed name, each as its own item.
    pub async fn delete_many(&self, owner_id: &str, request: DeleteFilesRequest) -> BatchResult {
        let targets = request
            .file_ids
            .into_iter()
            .map(DeleteTarget::Id)
            .chain(request.file_names.into_iter().map(DeleteTarget::Name));

        run_batch(targets, |target| async move {
            match target {
                DeleteTarget::Id(file_id) => {
                    let outcome = self.delete_by_id(owner_id, &file_id).await;
                    outcome.map_err(|e| self.failed(file_id, e))
                }
                DeleteTarget::Name(file_name) => {
                    let outcome = self.delete_by_name(owner_id, &file_name).await;
                    outcome.map_err(|e| self.failed(file_name, e))
                }
            }
        })
        .await
    }

    fn failed(&self, identifier: String, error: FileError) -> FailedItem {
        if error.is_upstream() {
            tracing::error!(identifier = %identifier, error = %error, "Batch item hit an upstream failure");
        }
        FailedItem::new(identifier, error.status())
    }
}
