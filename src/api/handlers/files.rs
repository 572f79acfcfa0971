use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;

use crate::api::response::{ApiError, JSend};
use crate::blob_store::Blob;
use crate::storage::FileRecord;
use crate::AppState;

/// Route: DELETE /deleteFile/:owner_id/:file_id
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path((owner_id, file_id)): Path<(String, String)>,
) -> Result<Json<JSend<FileRecord>>, ApiError> {
    let record = state.files.delete_by_id(&owner_id, &file_id).await?;
    Ok(JSend::success(record))
}

/// Route: GET /getFile/:file_id
pub async fn download_by_id(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
) -> Result<Response, ApiError> {
    let (record, blob) = state.files.fetch_by_id(&file_id).await?;
    Ok(attachment(&record, blob))
}

/// Route: GET /getFile/:owner_id/:file_name
pub async fn download_by_name(
    State(state): State<Arc<AppState>>,
    Path((owner_id, file_name)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let (record, blob) = state.files.fetch_by_name(&owner_id, &file_name).await?;
    Ok(attachment(&record, blob))
}

fn attachment(record: &FileRecord, blob: Blob) -> Response {
    let length = blob.data.len() as u64;
    let mut response = (StatusCode::OK, blob.data).into_response();
    let headers = response.headers_mut();

    headers.insert(
        header::CONTENT_TYPE,
        blob.content_type
            .parse()
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));

    // File names are validated on upload, so they are always header-safe.
    if let Ok(value) = format!("attachment; filename=\"{}\"", record.file_name).parse() {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    response
}
