//! Node row as returned by the store.

use serde::{Deserialize, Serialize};
use super::{PropertyMap, Value};

/// A node row materialized from a statement result.
///
/// This is the raw shape a vertex is loaded from: the full label set as
/// persisted (user labels plus graph-wide and partition labels) and the
/// property map including the identifier field. Splitting labels into
/// user/graph/partition sets happens in
/// [`Vertex::from_node`](crate::vertex::Vertex::from_node).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub labels: Vec<String>,
    pub properties: PropertyMap,
}

impl Node {
    pub fn new(labels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
            properties: PropertyMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}
