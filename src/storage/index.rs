use redb::TableDefinition;

use super::models::{Attribute, FileRecord, KeyMap};
use super::tables::*;

/// Separator between key segments in index table keys. Owner ids and file
/// names are validated to never contain it, so byte order of the joined key
/// equals tuple order of its segments.
pub const KEY_SEPARATOR: &str = "\0";

/// Access paths over the file records.
///
/// Each secondary index declares the attributes that identify a position in
/// it: its partition key, its sort key (if any), and the table's primary key
/// as tiebreaker. A start-after key must carry exactly these attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Index {
    Primary,
    Owner,
    Time,
    Name,
}

impl Index {
    pub const ALL: [Index; 4] = [Index::Primary, Index::Owner, Index::Time, Index::Name];
    pub const SECONDARY: [Index; 3] = [Index::Owner, Index::Time, Index::Name];

    pub fn name(self) -> &'static str {
        match self {
            Index::Primary => "primary",
            Index::Owner => "owner-index",
            Index::Time => "time-index",
            Index::Name => "name-index",
        }
    }

    /// Declared key attributes, in key order.
    pub fn key_attributes(self) -> &'static [Attribute] {
        match self {
            Index::Primary => &[Attribute::FileId],
            Index::Owner => &[Attribute::OwnerId, Attribute::FileId],
            Index::Time => &[
                Attribute::OwnerId,
                Attribute::CreationDate,
                Attribute::FileId,
            ],
            Index::Name => &[Attribute::OwnerId, Attribute::FileName, Attribute::FileId],
        }
    }

    /// Attributes materialized in the index entries.
    pub fn projected_attributes(self) -> &'static [Attribute] {
        match self {
            Index::Primary => &Attribute::ALL,
            Index::Name => &[
                Attribute::OwnerId,
                Attribute::FileName,
                Attribute::FileId,
                Attribute::CreationDate,
            ],
            other => other.key_attributes(),
        }
    }

    pub(crate) fn table(self) -> Option<TableDefinition<'static, &'static str, &'static [u8]>> {
        match self {
            Index::Primary => None,
            Index::Owner => Some(OWNER_INDEX),
            Index::Time => Some(TIME_INDEX),
            Index::Name => Some(NAME_INDEX),
        }
    }

    /// True when `key` carries exactly the declared key attributes.
    pub fn accepts_start_key(self, key: &KeyMap) -> bool {
        let declared = self.key_attributes();
        key.len() == declared.len() && declared.iter().all(|a| key.contains_key(a))
    }

    /// Table key for an entry, or `None` if a key attribute is missing.
    pub fn entry_key(self, keys: &KeyMap) -> Option<String> {
        let segments = self
            .key_attributes()
            .iter()
            .map(|a| keys.get(a).map(String::as_str))
            .collect::<Option<Vec<&str>>>()?;
        Some(segments.join(KEY_SEPARATOR))
    }

    /// The entry materialized for `record` in this index.
    pub fn project_record(self, record: &FileRecord) -> KeyMap {
        self.projected_attributes()
            .iter()
            .map(|a| (*a, record.attribute(*a).to_string()))
            .collect()
    }

    /// Reduce an index entry to its key attributes.
    pub fn key_of(self, entry: &KeyMap) -> KeyMap {
        self.key_attributes()
            .iter()
            .filter_map(|a| entry.get(a).map(|v| (*a, v.clone())))
            .collect()
    }
}
