//! Statement results and update summaries.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::model::Value;

/// A single row in a statement result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub values: HashMap<String, Value>,
}

impl ResultRow {
    pub fn new(values: HashMap<String, Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}

/// Counters reported by the store after a statement completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCounters {
    pub nodes_created: u64,
    pub nodes_deleted: u64,
    pub relationships_created: u64,
    pub relationships_deleted: u64,
    pub properties_set: u64,
    pub labels_added: u64,
    pub labels_removed: u64,
}

impl UpdateCounters {
    pub fn contains_updates(&self) -> bool {
        self.nodes_created != 0
            || self.nodes_deleted != 0
            || self.relationships_created != 0
            || self.relationships_deleted != 0
            || self.properties_set != 0
            || self.labels_added != 0
            || self.labels_removed != 0
    }
}

/// Summary available once a result has been fully consumed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub statement_text: String,
    pub counters: UpdateCounters,
}

impl ResultSummary {
    /// Log the summary counters, skipping statements with no updates.
    pub fn log(&self) {
        if !self.counters.contains_updates() {
            return;
        }
        tracing::debug!(
            statement = %self.statement_text,
            nodes_created = self.counters.nodes_created,
            nodes_deleted = self.counters.nodes_deleted,
            relationships_created = self.counters.relationships_created,
            relationships_deleted = self.counters.relationships_deleted,
            properties_set = self.counters.properties_set,
            labels_added = self.counters.labels_added,
            labels_removed = self.counters.labels_removed,
            "statement executed"
        );
    }
}

/// Rows plus summary, as handed back by the transport.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementResult {
    pub rows: Vec<ResultRow>,
    pub summary: ResultSummary,
}

impl StatementResult {
    pub fn empty() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_updates() {
        let mut counters = UpdateCounters::default();
        assert!(!counters.contains_updates());
        counters.labels_added = 1;
        assert!(counters.contains_updates());
    }
}
