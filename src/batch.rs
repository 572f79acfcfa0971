//! Runs independent single-item operations and reports each outcome.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::storage::FileRecord;

/// One item that did not go through, with the status it would have had as a
/// single-item request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedItem {
    pub identifier: String,
    pub status_code: u16,
}

impl FailedItem {
    pub fn new(identifier: impl Into<String>, status_code: u16) -> Self {
        Self {
            identifier: identifier.into(),
            status_code,
        }
    }
}

pub type ItemOutcome = Result<FileRecord, FailedItem>;

/// Outcomes of a batch, split by success, each side in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    #[serde(rename = "successfulFiles")]
    pub successes: Vec<FileRecord>,
    #[serde(rename = "failedFiles")]
    pub failures: Vec<FailedItem>,
}

impl BatchResult {
    pub fn record(&mut self, outcome: ItemOutcome) {
        match outcome {
            Ok(file) => self.successes.push(file),
            Err(failed) => self.failures.push(failed),
        }
    }

    /// Number of items the batch ran.
    pub fn len(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<ItemOutcome> for BatchResult {
    fn from_iter<I: IntoIterator<Item = ItemOutcome>>(iter: I) -> Self {
        let mut result = BatchResult::default();
        for outcome in iter {
            result.record(outcome);
        }
        result
    }
}

/// Run `operation` over `items` one at a time, in order. A failed item is
/// recorded and the next item still runs.
pub async fn run_batch<T, F, Fut>(items: impl IntoIterator<Item = T>, mut operation: F) -> BatchResult
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = ItemOutcome>,
{
    let mut result = BatchResult::default();
    for item in items {
        let outcome = operation(item).await;
        if let Err(ref failed) = outcome {
            tracing::warn!(
                identifier = %failed.identifier,
                status = failed.status_code,
                "Batch item failed"
            );
        }
        result.record(outcome);
    }
    result
}
