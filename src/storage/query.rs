use std::ops::Bound;

use super::db::{Database, DatabaseError};
use super::index::{Index, KEY_SEPARATOR};
use super::models::{Attribute, KeyMap};

/// Condition on an index's key attributes. Always pins the partition
/// (`ownerId`); optionally narrows the sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyCondition {
    /// `ownerId = :owner`
    Owner { owner_id: String },
    /// `ownerId = :owner AND creationDate BETWEEN :after AND :before`
    CreatedBetween {
        owner_id: String,
        after: String,
        before: String,
    },
    /// `ownerId = :owner AND begins_with(fileName, :prefix)`
    NameBeginsWith { owner_id: String, prefix: String },
    /// `ownerId = :owner AND fileName = :name`
    NameEquals { owner_id: String, file_name: String },
}

impl KeyCondition {
    pub fn owner_id(&self) -> &str {
        match self {
            KeyCondition::Owner { owner_id }
            | KeyCondition::CreatedBetween { owner_id, .. }
            | KeyCondition::NameBeginsWith { owner_id, .. }
            | KeyCondition::NameEquals { owner_id, .. } => owner_id,
        }
    }

    /// Whether `index` has the sort key this condition constrains.
    pub fn supported_by(&self, index: Index) -> bool {
        match self {
            KeyCondition::Owner { .. } => index != Index::Primary,
            KeyCondition::CreatedBetween { .. } => index == Index::Time,
            KeyCondition::NameBeginsWith { .. } | KeyCondition::NameEquals { .. } => {
                index == Index::Name
            }
        }
    }

    /// Smallest table key that can satisfy the condition.
    fn lower_bound(&self) -> String {
        let partition = format!("{}{KEY_SEPARATOR}", self.owner_id());
        match self {
            KeyCondition::Owner { .. } => partition,
            KeyCondition::CreatedBetween { after, .. } => format!("{partition}{after}"),
            KeyCondition::NameBeginsWith { prefix, .. } => format!("{partition}{prefix}"),
            KeyCondition::NameEquals { file_name, .. } => format!("{partition}{file_name}"),
        }
    }

    /// Entries are visited in key order from [`Self::lower_bound`], so the
    /// first entry that fails this check ends the scan.
    fn matches(&self, entry: &KeyMap) -> bool {
        if entry.get(&Attribute::OwnerId).map(String::as_str) != Some(self.owner_id()) {
            return false;
        }
        match self {
            KeyCondition::Owner { .. } => true,
            KeyCondition::CreatedBetween { after, before, .. } => entry
                .get(&Attribute::CreationDate)
                .is_some_and(|d| d >= after && d <= before),
            KeyCondition::NameBeginsWith { prefix, .. } => entry
                .get(&Attribute::FileName)
                .is_some_and(|n| n.starts_with(prefix.as_str())),
            KeyCondition::NameEquals { file_name, .. } => {
                entry.get(&Attribute::FileName) == Some(file_name)
            }
        }
    }
}

/// Condition applied to evaluated entries after the key condition. Entries
/// that fail it still count against the query limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterCondition {
    CreatedBetween { after: String, before: String },
    NameBeginsWith { prefix: String },
}

impl FilterCondition {
    /// Entries missing the filtered attribute never match.
    pub fn matches(&self, entry: &KeyMap) -> bool {
        match self {
            FilterCondition::CreatedBetween { after, before } => entry
                .get(&Attribute::CreationDate)
                .is_some_and(|d| d >= after && d <= before),
            FilterCondition::NameBeginsWith { prefix } => entry
                .get(&Attribute::FileName)
                .is_some_and(|n| n.starts_with(prefix.as_str())),
        }
    }
}

/// One store-side query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexQuery {
    pub index: Index,
    pub key_condition: KeyCondition,
    pub filter: Option<FilterCondition>,
    /// Maximum number of entries to evaluate. Must be at least 1.
    pub limit: usize,
    /// Resume strictly after this position. Must carry exactly the index's
    /// declared key attributes.
    pub start_key: Option<KeyMap>,
}

/// One store-side page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPage {
    /// Projected entries that passed the filter, in index order.
    pub items: Vec<KeyMap>,
    pub count: usize,
    /// Key of the last evaluated entry. Present only when more entries
    /// satisfy the key condition.
    pub last_evaluated_key: Option<KeyMap>,
}

impl Database {
    /// Run one page of an index query.
    pub fn query_index(&self, query: &IndexQuery) -> Result<QueryPage, DatabaseError> {
        let index = query.index;
        let definition = index.table().ok_or_else(|| {
            DatabaseError::InvalidQuery(format!("{} does not support queries", index.name()))
        })?;
        if !query.key_condition.supported_by(index) {
            return Err(DatabaseError::InvalidQuery(format!(
                "key condition {:?} is not valid for {}",
                query.key_condition,
                index.name()
            )));
        }
        if query.limit == 0 {
            return Err(DatabaseError::InvalidQuery(
                "limit must be at least 1".to_string(),
            ));
        }

        let lower = query.key_condition.lower_bound();
        let resume = match &query.start_key {
            Some(key) => {
                if !index.accepts_start_key(key) {
                    return Err(DatabaseError::InvalidStartKey(format!(
                        "{} expects exactly {:?}, got {:?}",
                        index.name(),
                        index.key_attributes(),
                        key.keys().collect::<Vec<_>>()
                    )));
                }
                index.entry_key(key).filter(|k| *k > lower)
            }
            None => None,
        };
        let start = match &resume {
            Some(key) => Bound::Excluded(key.as_str()),
            None => Bound::Included(lower.as_str()),
        };

        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(definition)?;

        let mut page = QueryPage::default();
        let mut evaluated = 0usize;
        let mut last: Option<KeyMap> = None;
        let mut more = false;

        for result in table.range::<&str>((start, Bound::Unbounded))? {
            let (_, value) = result?;
            let entry: KeyMap = rmp_serde::from_slice(value.value())?;
            if !query.key_condition.matches(&entry) {
                break;
            }
            if evaluated == query.limit {
                more = true;
                break;
            }
            evaluated += 1;
            if query.filter.as_ref().is_none_or(|f| f.matches(&entry)) {
                page.items.push(entry.clone());
            }
            last = Some(entry);
        }

        page.count = page.items.len();
        if more {
            page.last_evaluated_key = last.map(|entry| index.key_of(&entry));
        }
        Ok(page)
    }
}
