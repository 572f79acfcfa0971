use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Attributes of a file record. Index keys, projections and continuation
/// cursors are all maps over this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Attribute {
    FileId,
    OwnerId,
    FileName,
    CreationDate,
}

impl Attribute {
    pub const ALL: [Attribute; 4] = [
        Attribute::FileId,
        Attribute::OwnerId,
        Attribute::FileName,
        Attribute::CreationDate,
    ];
}

/// A (possibly partial) attribute map, as returned by index queries and used
/// as a start-after key.
pub type KeyMap = BTreeMap<Attribute, String>;

/// A file record stored in redb
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub file_id: String,
    pub owner_id: String,
    pub file_name: String,
    /// RFC 3339, UTC, millisecond precision. See [`format_timestamp`].
    pub creation_date: String,
}

impl FileRecord {
    /// Build a fresh record with a generated id, created now.
    pub fn new(owner_id: &str, file_name: &str) -> Self {
        Self {
            file_id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            file_name: file_name.to_string(),
            creation_date: format_timestamp(Utc::now()),
        }
    }

    pub fn attribute(&self, attribute: Attribute) -> &str {
        match attribute {
            Attribute::FileId => &self.file_id,
            Attribute::OwnerId => &self.owner_id,
            Attribute::FileName => &self.file_name,
            Attribute::CreationDate => &self.creation_date,
        }
    }

    /// The full key map of the record (every attribute).
    pub fn key_map(&self) -> KeyMap {
        Attribute::ALL
            .iter()
            .map(|a| (*a, self.attribute(*a).to_string()))
            .collect()
    }
}

/// Canonical timestamp form. Lexicographic order of the output matches
/// chronological order, which the time index relies on.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an RFC 3339 timestamp and rewrite it in canonical form.
pub fn normalize_timestamp(raw: &str) -> Result<String, chrono::ParseError> {
    let parsed = DateTime::parse_from_rfc3339(raw.trim())?;
    Ok(format_timestamp(parsed.with_timezone(&Utc)))
}
