use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use std::sync::Arc;

use crate::api::response::{ApiError, AppJson, AppQuery, JSend};
use crate::service::{ListFilesRequest, ListFilesResponse};
use crate::AppState;

/// Request header carrying the continuation token of the previous page.
pub const NEXT_TOKEN_HEADER: &str = "next-token";

/// Route: POST /listFiles/:owner_id
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    Path(owner_id): Path<String>,
    headers: HeaderMap,
    AppJson(request): AppJson<ListFilesRequest>,
) -> Result<Json<JSend<ListFilesResponse>>, ApiError> {
    list(&state, &owner_id, &headers, &request)
}

/// Route: GET /listFiles/:owner_id, filters in the query string.
pub async fn list_files_query(
    State(state): State<Arc<AppState>>,
    Path(owner_id): Path<String>,
    headers: HeaderMap,
    AppQuery(request): AppQuery<ListFilesRequest>,
) -> Result<Json<JSend<ListFilesResponse>>, ApiError> {
    list(&state, &owner_id, &headers, &request)
}

fn list(
    state: &AppState,
    owner_id: &str,
    headers: &HeaderMap,
    request: &ListFilesRequest,
) -> Result<Json<JSend<ListFilesResponse>>, ApiError> {
    let next_token = match headers.get(NEXT_TOKEN_HEADER) {
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| ApiError::bad_request("next-token header is not valid ASCII"))?,
        ),
        None => None,
    }
    .filter(|token| !token.trim().is_empty());

    let response = state.files.list(owner_id, request, next_token)?;
    Ok(JSend::success(response))
}
