//! file-queries - file metadata queries over a record store and a blob store
//!
//! This crate provides:
//! - Paginated listing by owner, creation time range, or file name prefix,
//!   with opaque continuation tokens
//! - Batch upload and delete with per-item failure reporting
//! - redb embedded database for records and their secondary indexes
//! - Swappable blob storage backends (local filesystem, GCS)

pub mod api;
pub mod batch;
pub mod blob_store;
pub mod config;
pub mod query;
pub mod service;
pub mod storage;
#[cfg(test)]
pub mod testutil;

use config::Config;
use service::FileService;
use storage::Database;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub files: FileService,
}
