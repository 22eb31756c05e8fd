//! Opaque element identifier.

use serde::{Deserialize, Serialize};
use super::Value;

/// Identifier of a vertex or edge in the remote store.
///
/// The store may use numeric identifiers (native or sequence-generated) or
/// externally assigned string keys. Either way the identifier is opaque to
/// the unit-of-work engine: it is produced by an
/// [`ElementIdProvider`](crate::id::ElementIdProvider), never interpreted,
/// and immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ElementId {
    Int(i64),
    Text(String),
}

impl ElementId {
    /// The identifier as a statement parameter value.
    pub fn to_value(&self) -> Value {
        match self {
            ElementId::Int(i) => Value::Int(*i),
            ElementId::Text(s) => Value::String(s.clone()),
        }
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElementId::Int(i) => write!(f, "{i}"),
            ElementId::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i32> for ElementId {
    fn from(v: i32) -> Self {
        ElementId::Int(v as i64)
    }
}

impl From<i64> for ElementId {
    fn from(v: i64) -> Self {
        ElementId::Int(v)
    }
}

impl From<&str> for ElementId {
    fn from(v: &str) -> Self {
        ElementId::Text(v.to_owned())
    }
}

impl From<String> for ElementId {
    fn from(v: String) -> Self {
        ElementId::Text(v)
    }
}
