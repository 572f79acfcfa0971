use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::validation::timestamp_or;
use super::FileError;
use crate::query::{ListFilter, CREATED_AFTER_DEFAULT, CREATED_BEFORE_DEFAULT};

/// Filters and page size of a list request. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListFilesRequest {
    pub name_begins_with: Option<String>,
    pub created_after: Option<String>,
    pub created_before: Option<String>,
    pub limit: Option<i64>,
}

impl ListFilesRequest {
    /// Canonical filter, with absent time bounds replaced by the open-ended
    /// defaults.
    pub fn filter(&self) -> Result<ListFilter, FileError> {
        Ok(ListFilter {
            name_begins_with: self.name_begins_with.clone(),
            created_after: timestamp_or(
                "createdAfter",
                self.created_after.as_deref(),
                CREATED_AFTER_DEFAULT,
            )?,
            created_before: timestamp_or(
                "createdBefore",
                self.created_before.as_deref(),
                CREATED_BEFORE_DEFAULT,
            )?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilesResponse {
    pub file_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeleteFilesRequest {
    pub file_ids: Vec<String>,
    pub file_names: Vec<String>,
}

/// One submitted file of an upload batch.
#[derive(Debug, Clone)]
pub struct UploadItem {
    pub file_name: Option<String>,
    pub data: Bytes,
}

impl UploadItem {
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: Some(file_name.into()),
            data: data.into(),
        }
    }
}
