//! Cardinality-aware vertex property storage.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::model::{ElementId, PropertyMap, Value};
use crate::{Error, Result};

/// Declared multiplicity policy for a property name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cardinality {
    /// Exactly one value; setting replaces.
    Single,
    /// Ordered, duplicates allowed; setting appends.
    List,
    /// Unique by value; setting is a no-op on duplicates.
    Set,
}

impl std::fmt::Display for Cardinality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cardinality::Single => write!(f, "single"),
            Cardinality::List => write!(f, "list"),
            Cardinality::Set => write!(f, "set"),
        }
    }
}

/// Process-wide sequence for synthetic property identifiers.
///
/// Initialized once and shared by every store in a graph; identifiers are
/// monotonic and never reused, with no ordering semantics beyond
/// uniqueness. Injected into constructors rather than read from a global so
/// tests can run isolated sequences.
#[derive(Debug, Clone)]
pub struct PropertyIdSequence(Arc<AtomicU64>);

impl PropertyIdSequence {
    pub fn new() -> Self {
        Self(Arc::new(AtomicU64::new(0)))
    }

    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl Default for PropertyIdSequence {
    fn default() -> Self {
        Self::new()
    }
}

/// One stored property value, immutable once created.
///
/// The synthetic identifier distinguishes same-named, same-valued entries
/// under list and set cardinality and is the handle used for removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexProperty {
    id: u64,
    key: String,
    value: Value,
}

impl VertexProperty {
    fn new(id: u64, key: impl Into<String>, value: Value) -> Self {
        Self {
            id,
            key: key.into(),
            value,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl std::fmt::Display for VertexProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "vp[{}->{}]", self.key, self.value)
    }
}

/// Outcome of a property write.
#[derive(Debug)]
pub(crate) struct SetOutcome {
    pub property: VertexProperty,
    /// Whether store contents actually changed.
    pub changed: bool,
}

/// Per-vertex mapping from property name to one-or-many values, with a
/// declared cardinality per name.
///
/// Cloning a store copies the value collections but shares the identifier
/// sequence, which is what baseline snapshots need.
#[derive(Debug, Clone)]
pub struct PropertyStore {
    properties: HashMap<String, Vec<VertexProperty>>,
    cardinalities: HashMap<String, Cardinality>,
    sequence: PropertyIdSequence,
}

impl PropertyStore {
    pub fn new(sequence: PropertyIdSequence) -> Self {
        Self {
            properties: HashMap::new(),
            cardinalities: HashMap::new(),
            sequence,
        }
    }

    /// Build a store from a materialized node row, excluding the identifier
    /// field.
    ///
    /// LIST values ingest with list cardinality, one property per element.
    /// MAP values are a known unsupported case and fail deterministically.
    /// Everything else ingests with single cardinality.
    pub fn ingest(
        row_properties: &PropertyMap,
        id_field: &str,
        sequence: PropertyIdSequence,
    ) -> Result<Self> {
        let mut store = Self::new(sequence);
        for (key, value) in row_properties {
            if key == id_field {
                continue;
            }
            match value {
                Value::List(items) => {
                    let values = items
                        .iter()
                        .map(|item| {
                            VertexProperty::new(store.sequence.next(), key, item.clone())
                        })
                        .collect();
                    store.properties.insert(key.clone(), values);
                    store.cardinalities.insert(key.clone(), Cardinality::List);
                }
                Value::Map(_) => {
                    return Err(Error::UnsupportedValue {
                        key: key.clone(),
                        type_name: "MAP",
                    });
                }
                other => {
                    let property =
                        VertexProperty::new(store.sequence.next(), key, other.clone());
                    store.properties.insert(key.clone(), vec![property]);
                    store.cardinalities.insert(key.clone(), Cardinality::Single);
                }
            }
        }
        Ok(store)
    }

    /// The cardinality established for a name, if any.
    pub fn cardinality(&self, key: &str) -> Option<Cardinality> {
        self.cardinalities.get(key).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Store a value under the given name and cardinality.
    ///
    /// Fails without mutating when the name already has a different
    /// established cardinality. Under set cardinality a duplicate value is a
    /// no-op and the handle of the already-stored entry is returned.
    pub(crate) fn set(
        &mut self,
        key: &str,
        value: Value,
        cardinality: Cardinality,
    ) -> Result<SetOutcome> {
        if key.is_empty() {
            return Err(Error::InvalidArgument("property key cannot be empty".into()));
        }
        if value.is_null() {
            return Err(Error::InvalidArgument("property value cannot be null".into()));
        }
        if let Some(existing) = self.cardinalities.get(key) {
            if *existing != cardinality {
                return Err(Error::CardinalityConflict {
                    key: key.to_owned(),
                    existing: *existing,
                });
            }
        }
        match cardinality {
            Cardinality::Single => {
                let property = VertexProperty::new(self.sequence.next(), key, value);
                self.properties.insert(key.to_owned(), vec![property.clone()]);
                self.cardinalities.insert(key.to_owned(), Cardinality::Single);
                Ok(SetOutcome { property, changed: true })
            }
            Cardinality::List => {
                let property = VertexProperty::new(self.sequence.next(), key, value);
                self.properties
                    .entry(key.to_owned())
                    .or_default()
                    .push(property.clone());
                self.cardinalities.insert(key.to_owned(), Cardinality::List);
                Ok(SetOutcome { property, changed: true })
            }
            Cardinality::Set => {
                let values = self.properties.entry(key.to_owned()).or_default();
                self.cardinalities.insert(key.to_owned(), Cardinality::Set);
                // linear scan, set sizes are expected to stay small
                if let Some(existing) = values.iter().find(|p| p.value() == &value) {
                    return Ok(SetOutcome {
                        property: existing.clone(),
                        changed: false,
                    });
                }
                let property = VertexProperty::new(self.sequence.next(), key, value);
                values.push(property.clone());
                Ok(SetOutcome { property, changed: true })
            }
        }
    }

    /// The single value stored under a name.
    ///
    /// `Ok(None)` when the name is absent; fails when more than one value is
    /// stored.
    pub fn get(&self, key: &str) -> Result<Option<VertexProperty>> {
        match self.properties.get(key) {
            None => Ok(None),
            Some(values) if values.len() == 1 => Ok(values.first().cloned()),
            Some(_) => Err(Error::MultipleProperties(key.to_owned())),
        }
    }

    /// Snapshot of stored values.
    ///
    /// No names: every value in map iteration order. One name: that name's
    /// collection. Several names: concatenation in argument order. The
    /// returned vector is a copy, safe to hold across store mutation.
    pub fn get_all(&self, keys: &[&str]) -> Vec<VertexProperty> {
        match keys {
            [] => self
                .properties
                .values()
                .flat_map(|values| values.iter().cloned())
                .collect(),
            [key] => self
                .properties
                .get(*key)
                .map(|values| values.to_vec())
                .unwrap_or_default(),
            keys => keys
                .iter()
                .filter_map(|key| self.properties.get(*key))
                .flat_map(|values| values.iter().cloned())
                .collect(),
        }
    }

    /// Remove a stored value by handle.
    ///
    /// Single cardinality drops the whole entry; list and set drop the one
    /// instance, removing the entry and its cardinality record when the
    /// collection empties.
    pub(crate) fn remove(&mut self, property: &VertexProperty) {
        let Some(cardinality) = self.cardinalities.get(property.key()).copied() else {
            return;
        };
        if cardinality == Cardinality::Single {
            self.properties.remove(property.key());
            self.cardinalities.remove(property.key());
            return;
        }
        if let Some(values) = self.properties.get_mut(property.key()) {
            values.retain(|p| p.id() != property.id());
            if values.is_empty() {
                self.properties.remove(property.key());
                self.cardinalities.remove(property.key());
            }
        }
    }

    /// Project stored values into statement parameters: the raw value for
    /// single cardinality, an ordered sequence otherwise, plus the
    /// identifier field.
    pub fn statement_parameters(&self, id_field: &str, id: &ElementId) -> PropertyMap {
        let mut parameters = PropertyMap::new();
        for (key, values) in &self.properties {
            if self.cardinalities.get(key) == Some(&Cardinality::Single) {
                if let Some(property) = values.first() {
                    parameters.insert(key.clone(), property.value().clone());
                }
            } else {
                parameters.insert(
                    key.clone(),
                    Value::List(values.iter().map(|p| p.value().clone()).collect()),
                );
            }
        }
        parameters.insert(id_field.to_owned(), id.to_value());
        parameters
    }
}
