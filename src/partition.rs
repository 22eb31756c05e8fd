//! Logical partitions over a shared graph.
//!
//! A partition scopes reads to a sub-graph identified by reserved labels,
//! typically for multi-tenant isolation. The unit-of-work engine consults
//! the partition in three places: reserved-label protection on label
//! mutation, implicit labels injected into neighbor match patterns, and an
//! optional predicate conjoined to traversal WHERE clauses.

use hashbrown::HashSet;

use crate::statement::escape_labels;

/// Contract between the unit-of-work engine and the partition filter.
pub trait ReadPartition: Send + Sync {
    /// Whether the label is reserved for partition use and therefore
    /// off-limits to user label mutation.
    fn is_reserved_label(&self, label: &str) -> bool;

    /// Labels the partition injects into every vertex match pattern.
    ///
    /// Non-empty only for partitions where pattern labels alone are enough
    /// to constrain the match (all reserved labels required on every
    /// vertex).
    fn match_pattern_labels(&self) -> HashSet<String>;

    /// Predicate constraining `alias` to the partition, `None` when the
    /// match pattern labels already cover it.
    fn match_predicate(&self, alias: &str) -> Option<String>;
}

/// The whole graph: no reserved labels, no filtering.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReadPartition;

impl ReadPartition for NoReadPartition {
    fn is_reserved_label(&self, _label: &str) -> bool {
        false
    }

    fn match_pattern_labels(&self) -> HashSet<String> {
        HashSet::new()
    }

    fn match_predicate(&self, _alias: &str) -> Option<String> {
        None
    }
}

/// Partition requiring every reserved label on every vertex.
///
/// Vertices are matched by injecting all partition labels into the match
/// pattern, so no predicate is needed.
#[derive(Debug, Clone)]
pub struct AllLabelsReadPartition {
    labels: HashSet<String>,
}

impl AllLabelsReadPartition {
    pub fn new(labels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }
}

impl ReadPartition for AllLabelsReadPartition {
    fn is_reserved_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    fn match_pattern_labels(&self) -> HashSet<String> {
        self.labels.clone()
    }

    fn match_predicate(&self, _alias: &str) -> Option<String> {
        None
    }
}

/// Partition requiring at least one of the reserved labels on every vertex.
///
/// Cannot be expressed as pattern labels, so it contributes an OR predicate
/// instead.
#[derive(Debug, Clone)]
pub struct AnyLabelReadPartition {
    labels: Vec<String>,
}

impl AnyLabelReadPartition {
    pub fn new(labels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        labels.sort();
        labels.dedup();
        Self { labels }
    }
}

impl ReadPartition for AnyLabelReadPartition {
    fn is_reserved_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    fn match_pattern_labels(&self) -> HashSet<String> {
        // a single label constrains the pattern directly, otherwise the
        // alternation goes into the predicate
        if self.labels.len() == 1 {
            self.labels.iter().cloned().collect()
        } else {
            HashSet::new()
        }
    }

    fn match_predicate(&self, alias: &str) -> Option<String> {
        if self.labels.len() < 2 {
            return None;
        }
        let clauses: Vec<String> = self
            .labels
            .iter()
            .map(|label| format!("{alias}{}", escape_labels([label.as_str()])))
            .collect();
        Some(format!("({})", clauses.join(" OR ")))
    }
}
