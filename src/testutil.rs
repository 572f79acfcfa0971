//! Shared test helpers for unit tests.

use std::sync::Arc;

use crate::blob_store::LocalStore;
use crate::config::{Config, ServerConfig, StorageConfig};
use crate::service::FileService;
use crate::storage::Database;
use crate::AppState;

/// Create a test AppState with a temporary database and local blob store.
pub fn test_state(temp_dir: &tempfile::TempDir) -> Arc<AppState> {
    let data_dir = temp_dir.path().join("data");
    let files_dir = temp_dir.path().join("files");

    let config = Config {
        server: ServerConfig {
            bind_address: "127.0.0.1:0".to_string(),
            data_dir: data_dir.to_string_lossy().to_string(),
        },
        storage: StorageConfig::default(),
        test_mode: true,
        max_upload_size: 10 * 1024 * 1024, // 10MB for tests
        default_list_limit: 25,
    };

    let db = Database::open(&data_dir).expect("Failed to open test database");
    let blobs = LocalStore::new(&files_dir).expect("Failed to create test blob store");
    let files = FileService::new(
        Arc::new(db.clone()),
        Arc::new(blobs),
        config.default_list_limit,
    );

    Arc::new(AppState { config, db, files })
}
