use crate::storage::{
    Attribute, DatabaseError, FileStore, FilterCondition, Index, IndexQuery, KeyCondition, KeyMap,
    QueryPage,
};

/// Everything about a store query except its paging parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    pub index: Index,
    pub key_condition: KeyCondition,
    pub filter: Option<FilterCondition>,
}

impl QueryPlan {
    pub fn new(index: Index, key_condition: KeyCondition) -> Self {
        Self {
            index,
            key_condition,
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: FilterCondition) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// Identifiers collected across store pages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageResult {
    pub ids: Vec<String>,
    /// The store's last evaluated key, when it still reports more entries.
    pub next_cursor: Option<KeyMap>,
}

/// Paging state between store calls.
///
/// The loop runs while the store reports more pages and the limit is not yet
/// reached. The start key after the first page is the store's own last
/// evaluated key, passed back unchanged.
#[derive(Debug)]
pub struct Paginator {
    remaining: usize,
    ids: Vec<String>,
    start_key: Option<KeyMap>,
    more_pages: bool,
}

impl Paginator {
    /// A non-positive `limit` yields an empty result without querying.
    pub fn new(limit: i64, start_key: Option<KeyMap>) -> Self {
        let remaining = usize::try_from(limit).unwrap_or(0);
        Self {
            remaining,
            ids: Vec::new(),
            start_key,
            more_pages: remaining > 0,
        }
    }

    pub fn should_continue(&self) -> bool {
        self.more_pages && self.remaining > 0
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn next_query(&self, plan: &QueryPlan) -> IndexQuery {
        IndexQuery {
            index: plan.index,
            key_condition: plan.key_condition.clone(),
            filter: plan.filter.clone(),
            limit: self.remaining,
            start_key: self.start_key.clone(),
        }
    }

    pub fn absorb(&mut self, page: QueryPage) {
        self.ids.extend(
            page.items
                .into_iter()
                .filter_map(|mut item| item.remove(&Attribute::FileId)),
        );
        self.remaining = self.remaining.saturating_sub(page.count);
        self.more_pages = page.last_evaluated_key.is_some();
        self.start_key = page.last_evaluated_key;
    }

    pub fn finish(self) -> PageResult {
        PageResult {
            ids: self.ids,
            next_cursor: if self.more_pages { self.start_key } else { None },
        }
    }
}

/// Query `store` page by page until `limit` identifiers are collected or the
/// store runs out of pages.
pub fn paginate(
    store: &dyn FileStore,
    plan: &QueryPlan,
    start_key: Option<KeyMap>,
    limit: i64,
) -> Result<PageResult, DatabaseError> {
    let mut state = Paginator::new(limit, start_key);
    let mut pages = 0usize;

    while state.should_continue() {
        let query = state.next_query(plan);
        let page = store.query(&query)?;
        pages += 1;
        tracing::debug!(
            index = plan.index.name(),
            page = pages,
            count = page.count,
            more = page.last_evaluated_key.is_some(),
            "Fetched index page"
        );
        state.absorb(page);
    }

    Ok(state.finish())
}
