pub mod db;
mod files;
pub mod index;
pub mod models;
pub mod query;
mod tables;

pub use db::{Database, DatabaseError};
pub use index::Index;
pub use models::{Attribute, FileRecord, KeyMap};
pub use query::{FilterCondition, IndexQuery, KeyCondition, QueryPage};
pub use tables::*;

/// The key-value store the query engine runs against: records keyed by file
/// id, queryable through the secondary indexes of [`Index`].
pub trait FileStore: Send + Sync {
    fn query(&self, query: &IndexQuery) -> Result<QueryPage, DatabaseError>;
    fn get(&self, file_id: &str) -> Result<Option<FileRecord>, DatabaseError>;
    fn put(&self, file: &FileRecord) -> Result<(), DatabaseError>;
    /// Returns false if no record had that id.
    fn delete(&self, file_id: &str) -> Result<bool, DatabaseError>;
}

impl FileStore for Database {
    fn query(&self, query: &IndexQuery) -> Result<QueryPage, DatabaseError> {
        self.query_index(query)
    }

    fn get(&self, file_id: &str) -> Result<Option<FileRecord>, DatabaseError> {
        self.get_file(file_id)
    }

    fn put(&self, file: &FileRecord) -> Result<(), DatabaseError> {
        self.put_file(file)
    }

    fn delete(&self, file_id: &str) -> Result<bool, DatabaseError> {
        self.delete_file(file_id)
    }
}
