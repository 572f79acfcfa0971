use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, State};
use axum::Json;
use std::sync::Arc;

use crate::api::response::{ApiError, AppJson, JSend};
use crate::batch::BatchResult;
use crate::service::{DeleteFilesRequest, UploadItem};
use crate::AppState;

/// Multipart field name of an uploaded file. Repeat it once per file.
const FILE_FIELD: &str = "file";

/// Route: POST /uploadFile/:owner_id
///
/// The route's body limit caps the whole request; a body over it is rejected
/// with 413 before any file is stored.
pub async fn upload_files(
    State(state): State<Arc<AppState>>,
    Path(owner_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<JSend<BatchResult>>, ApiError> {
    let mut items = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Invalid multipart data", e))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(|s| s.to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error("Failed to read file", e))?;

        items.push(UploadItem { file_name, data });
    }

    if items.is_empty() {
        return Err(ApiError::bad_request(format!(
            "At least one '{FILE_FIELD}' part is required"
        )));
    }

    let result = state.files.upload_many(&owner_id, items).await;
    tracing::info!(
        owner_id = %owner_id,
        succeeded = result.successes.len(),
        failed = result.failures.len(),
        "Upload batch finished"
    );
    Ok(JSend::success(result))
}

/// Route: POST /deleteFiles/:owner_id
pub async fn delete_files(
    State(state): State<Arc<AppState>>,
    Path(owner_id): Path<String>,
    AppJson(request): AppJson<DeleteFilesRequest>,
) -> Result<Json<JSend<BatchResult>>, ApiError> {
    let result = state.files.delete_many(&owner_id, request).await;
    tracing::info!(
        owner_id = %owner_id,
        succeeded = result.successes.len(),
        failed = result.failures.len(),
        "Delete batch finished"
    );
    Ok(JSend::success(result))
}

/// Keeps the rejection's own status, so an oversized body stays a 413.
fn multipart_error(context: &str, e: MultipartError) -> ApiError {
    ApiError::Fail(e.status(), format!("{context}: {}", e.body_text()))
}
