mod admin;
mod batch;
mod files;
mod list;

pub use admin::{admin_purge, health};
pub use batch::{delete_files, upload_files};
pub use files::{delete_file, download_by_id, download_by_name};
pub use list::{list_files, list_files_query, NEXT_TOKEN_HEADER};
