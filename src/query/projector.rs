use crate::storage::{Attribute, KeyMap};

/// Reduce a cursor record to the attributes an index accepts as a start key.
///
/// An absent record means a fresh query and projects to an absent key.
/// Attributes missing from the record are left out, never synthesized.
pub fn project(record: Option<&KeyMap>, keep: &[Attribute]) -> Option<KeyMap> {
    record.map(|record| {
        record
            .iter()
            .filter(|(attribute, _)| keep.contains(attribute))
            .map(|(attribute, value)| (*attribute, value.clone()))
            .collect()
    })
}
