use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.max_upload_size as usize;

    let mut router = Router::new()
        // Listing
        .route(
            "/listFiles/:owner_id",
            post(handlers::list_files).get(handlers::list_files_query),
        )
        // Batches
        .route(
            "/uploadFile/:owner_id",
            post(handlers::upload_files).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/deleteFiles/:owner_id", post(handlers::delete_files))
        // Single files
        .route("/deleteFile/:owner_id/:file_id", delete(handlers::delete_file))
        .route("/getFile/:file_id", get(handlers::download_by_id))
        .route("/getFile/:owner_id/:file_name", get(handlers::download_by_name))
        // Internal
        .route("/_internal/health", get(handlers::health));

    // Test-only routes
    if state.config.test_mode {
        tracing::warn!("Test mode enabled, purge route is available.");
        router = router.route("/admin/purge", delete(handlers::admin_purge));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
