//! Element identifier providers.
//!
//! A provider owns everything about identity: the reserved property name
//! identifiers are stored under, client-side allocation of new identifiers,
//! and normalization of raw values coming back from the store.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::model::{ElementId, Node, Value};
use crate::{Error, Result};

/// Contract for identifier generation and normalization.
pub trait ElementIdProvider: Send + Sync {
    /// The reserved field name identifiers are stored under.
    fn id_field_name(&self) -> &str;

    /// Allocate a new identifier for a not-yet-persisted element.
    fn generate(&self) -> ElementId;

    /// Normalize a raw value into an identifier, converting the type
    /// if necessary.
    fn normalize(&self, raw: &Value) -> Result<ElementId>;

    /// Extract and normalize the identifier of a materialized node row.
    fn normalize_node(&self, node: &Node) -> Result<ElementId> {
        let raw = node.get(self.id_field_name()).ok_or_else(|| {
            Error::InvalidIdentifier(format!(
                "node row is missing identifier field `{}`",
                self.id_field_name()
            ))
        })?;
        self.normalize(raw)
    }

    /// The operand that references the identifier of `alias` in a
    /// match predicate, e.g. `n._id`.
    fn match_operand(&self, alias: &str) -> String {
        format!("{alias}.{}", self.id_field_name())
    }
}

/// Identifier provider backed by a numeric in-process sequence.
///
/// Stores identifiers under a caller-chosen field name (`_id` by default)
/// and allocates new ones from an atomic counter. Good enough for a single
/// writer; multi-writer deployments would swap in a database sequence
/// provider through the same trait.
pub struct SequenceIdProvider {
    field_name: String,
    sequence: AtomicI64,
}

impl SequenceIdProvider {
    pub const DEFAULT_FIELD_NAME: &'static str = "_id";

    pub fn new() -> Self {
        Self::with_field_name(Self::DEFAULT_FIELD_NAME)
    }

    pub fn with_field_name(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            sequence: AtomicI64::new(0),
        }
    }
}

impl Default for SequenceIdProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementIdProvider for SequenceIdProvider {
    fn id_field_name(&self) -> &str {
        &self.field_name
    }

    fn generate(&self) -> ElementId {
        ElementId::Int(self.sequence.fetch_add(1, Ordering::Relaxed) + 1)
    }

    fn normalize(&self, raw: &Value) -> Result<ElementId> {
        match raw {
            Value::Int(i) => Ok(ElementId::Int(*i)),
            // stores without a native integer type hand numbers back as text
            Value::String(s) => s
                .parse::<i64>()
                .map(ElementId::Int)
                .map_err(|_| Error::InvalidIdentifier(format!("not a numeric identifier: {s}"))),
            other => Err(Error::InvalidIdentifier(format!(
                "unsupported identifier type {}",
                other.type_name()
            ))),
        }
    }
}
