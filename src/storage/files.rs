use redb::{ReadableTable, WriteTransaction};

use super::db::{Database, DatabaseError};
use super::index::Index;
use super::models::FileRecord;
use super::tables::*;

impl Database {
    // ========================================================================
    // File operations
    // ========================================================================

    /// Store a file record and its entries in every secondary index
    pub fn put_file(&self, file: &FileRecord) -> Result<(), DatabaseError> {
        debug_assert!(!file.file_id.is_empty(), "file id must not be empty");

        let write_txn = self.begin_write()?;

        // Replacing a record must not leave stale index entries behind
        let previous = read_record(&write_txn, &file.file_id)?;
        if let Some(ref old) = previous {
            remove_index_entries(&write_txn, old)?;
        }

        {
            let mut table = write_txn.open_table(FILES)?;
            let data = rmp_serde::to_vec_named(file)?;
            table.insert(file.file_id.as_str(), data.as_slice())?;
        }
        for index in Index::SECONDARY {
            let (Some(definition), Some(key)) = (index.table(), index.entry_key(&file.key_map()))
            else {
                continue;
            };
            let entry = rmp_serde::to_vec_named(&index.project_record(file))?;
            let mut table = write_txn.open_table(definition)?;
            table.insert(key.as_str(), entry.as_slice())?;
        }

        write_txn.commit()?;
        Ok(())
    }

    /// Get a file by its id
    pub fn get_file(&self, file_id: &str) -> Result<Option<FileRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(FILES)?;

        match table.get(file_id)? {
            Some(data) => {
                let file: FileRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(file))
            }
            None => Ok(None),
        }
    }

    /// Delete a file by its id and clean up the secondary indexes
    pub fn delete_file(&self, file_id: &str) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;

        let deleted = match read_record(&write_txn, file_id)? {
            Some(file) => {
                {
                    let mut table = write_txn.open_table(FILES)?;
                    table.remove(file_id)?;
                }
                remove_index_entries(&write_txn, &file)?;
                true
            }
            None => false,
        };

        write_txn.commit()?;
        Ok(deleted)
    }
}

fn read_record(
    write_txn: &WriteTransaction,
    file_id: &str,
) -> Result<Option<FileRecord>, DatabaseError> {
    let table = write_txn.open_table(FILES)?;
    let result = match table.get(file_id)? {
        Some(data) => Some(rmp_serde::from_slice(data.value())?),
        None => None,
    };
    Ok(result)
}

fn remove_index_entries(
    write_txn: &WriteTransaction,
    file: &FileRecord,
) -> Result<(), DatabaseError> {
    let keys = file.key_map();
    for index in Index::SECONDARY {
        if let (Some(definition), Some(key)) = (index.table(), index.entry_key(&keys)) {
            let mut table = write_txn.open_table(definition)?;
            table.remove(key.as_str())?;
        }
    }
    Ok(())
}
