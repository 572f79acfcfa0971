use crate::storage::{Index, KeyCondition};

use super::paginate::QueryPlan;

/// Lower time bound of an unfiltered listing (epoch start).
pub const CREATED_AFTER_DEFAULT: &str = "1970-01-01T00:00:00.000Z";

/// Upper time bound of an unfiltered listing.
pub const CREATED_BEFORE_DEFAULT: &str = "9999-12-31T23:59:59.999Z";

/// Filters of a list request, with timestamps already in canonical form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFilter {
    pub name_begins_with: Option<String>,
    pub created_after: String,
    pub created_before: String,
}

impl Default for ListFilter {
    fn default() -> Self {
        Self {
            name_begins_with: None,
            created_after: CREATED_AFTER_DEFAULT.to_string(),
            created_before: CREATED_BEFORE_DEFAULT.to_string(),
        }
    }
}

impl ListFilter {
    fn has_time_range(&self) -> bool {
        self.created_after != CREATED_AFTER_DEFAULT || self.created_before != CREATED_BEFORE_DEFAULT
    }
}

/// How a listing is answered. Exactly one strategy applies per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    NamePrefix { prefix: String },
    TimeRange { after: String, before: String },
    OwnerOnly,
}

impl Strategy {
    /// Pick the strategy for `filter`. First match wins: name prefix, then a
    /// non-default time range, then owner only.
    ///
    /// Filters are prioritized, not combined: a request with both a name
    /// prefix and a time range is answered by prefix alone and the range is
    /// ignored.
    pub fn select(filter: &ListFilter) -> Self {
        match filter.name_begins_with.as_deref() {
            Some(prefix) if !prefix.is_empty() => Strategy::NamePrefix {
                prefix: prefix.to_string(),
            },
            _ if filter.has_time_range() => Strategy::TimeRange {
                after: filter.created_after.clone(),
                before: filter.created_before.clone(),
            },
            _ => Strategy::OwnerOnly,
        }
    }

    pub fn index(&self) -> Index {
        match self {
            Strategy::NamePrefix { .. } => Index::Name,
            Strategy::TimeRange { .. } => Index::Time,
            Strategy::OwnerOnly => Index::Owner,
        }
    }

    pub fn key_condition(&self, owner_id: &str) -> KeyCondition {
        let owner_id = owner_id.to_string();
        match self {
            Strategy::NamePrefix { prefix } => KeyCondition::NameBeginsWith {
                owner_id,
                prefix: prefix.clone(),
            },
            Strategy::TimeRange { after, before } => KeyCondition::CreatedBetween {
                owner_id,
                after: after.clone(),
                before: before.clone(),
            },
            Strategy::OwnerOnly => KeyCondition::Owner { owner_id },
        }
    }

    /// The store query this strategy issues for `owner_id`.
    pub fn plan(&self, owner_id: &str) -> QueryPlan {
        QueryPlan::new(self.index(), self.key_condition(owner_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(prefix: Option<&str>, after: &str, before: &str) -> ListFilter {
        ListFilter {
            name_begins_with: prefix.map(str::to_string),
            created_after: after.to_string(),
            created_before: before.to_string(),
        }
    }

    #[test]
    fn test_default_filter_selects_owner_only() {
        assert_eq!(Strategy::select(&ListFilter::default()), Strategy::OwnerOnly);
    }

    #[test]
    fn test_empty_prefix_is_not_a_prefix() {
        let f = filter(Some(""), CREATED_AFTER_DEFAULT, CREATED_BEFORE_DEFAULT);
        assert_eq!(Strategy::select(&f), Strategy::OwnerOnly);
    }

    #[test]
    fn test_prefix_selects_name_index() {
        let f = filter(Some("payload.p"), CREATED_AFTER_DEFAULT, CREATED_BEFORE_DEFAULT);
        let strategy = Strategy::select(&f);
        assert_eq!(
            strategy,
            Strategy::NamePrefix {
                prefix: "payload.p".to_string()
            }
        );
        assert_eq!(strategy.index(), Index::Name);
    }

    #[test]
    fn test_either_time_bound_selects_time_range() {
        let after_only = filter(None, "2024-01-01T00:00:00.000Z", CREATED_BEFORE_DEFAULT);
        assert_eq!(Strategy::select(&after_only).index(), Index::Time);

        let before_only = filter(None, CREATED_AFTER_DEFAULT, "2024-01-01T00:00:00.000Z");
        assert_eq!(Strategy::select(&before_only).index(), Index::Time);
    }

    #[test]
    fn test_prefix_wins_over_time_range() {
        let f = filter(
            Some("a"),
            "2024-01-01T00:00:00.000Z",
            "2024-02-01T00:00:00.000Z",
        );
        assert_eq!(Strategy::select(&f).index(), Index::Name);
    }

    #[test]
    fn test_selection_is_deterministic() {
        let f = filter(None, "2024-01-01T00:00:00.000Z", CREATED_BEFORE_DEFAULT);
        assert_eq!(Strategy::select(&f), Strategy::select(&f.clone()));
    }

    #[test]
    fn test_key_condition_matches_index() {
        for strategy in [
            Strategy::OwnerOnly,
            Strategy::NamePrefix {
                prefix: "x".to_string(),
            },
            Strategy::TimeRange {
                after: CREATED_AFTER_DEFAULT.to_string(),
                before: CREATED_BEFORE_DEFAULT.to_string(),
            },
        ] {
            let condition = strategy.key_condition("u1");
            assert_eq!(condition.owner_id(), "u1");
            assert!(condition.supported_by(strategy.index()));
        }
    }
}
