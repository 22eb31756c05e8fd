//! The vertex unit-of-work engine.
//!
//! A `Vertex` is the in-memory image of one node row: user labels, typed
//! properties, and two lazily loaded incident-edge collections. Every
//! mutation is tracked against the last committed baseline; at a
//! transaction boundary the session pulls the minimal persistence
//! statement and then either commits the new baseline or rolls back to the
//! old one.

use std::collections::BTreeSet;
use std::sync::Arc;

use hashbrown::HashSet;

use crate::adjacency::AdjacencyCache;
use crate::model::{Direction, EdgeRef, ElementId, Node, PropertyMap, Value};
use crate::property::{Cardinality, PropertyStore, VertexProperty};
use crate::session::{GraphScope, Session};
use crate::statement::{
    escape_labels, escape_relationship_labels, neighbor_pattern, vertex_pattern, Statement,
};
use crate::{Error, Result};

/// Separator used when rendering the user labels as one label string.
pub const LABEL_DELIMITER: &str = "::";

/// The per-entity transactional contract: dirty state, statement
/// generation, and baseline reconciliation. The edge entity mirrors this
/// surface.
pub trait UnitOfWork {
    /// Uncommitted changes present.
    fn is_dirty(&self) -> bool;

    /// Never successfully persisted.
    fn is_transient(&self) -> bool;

    /// Create statement for a transient entity.
    fn insert_statement(&mut self) -> Statement;

    /// Merge-update statement, `None` when nothing needs persisting.
    fn update_statement(&self) -> Option<Statement>;

    /// Detach-and-delete statement.
    fn delete_statement(&self) -> Statement;

    /// Snapshot current state as the new baseline.
    fn commit(&mut self);

    /// Restore the last committed baseline.
    fn rollback(&mut self);
}

/// A vertex in the mapped object graph.
pub struct Vertex {
    scope: Arc<GraphScope>,
    id: ElementId,
    /// User labels, sorted. Never contains graph-wide or partition labels.
    labels: BTreeSet<String>,
    /// Net label delta versus the baseline, disjoint by invariant.
    labels_added: BTreeSet<String>,
    labels_removed: BTreeSet<String>,
    /// Graph-wide and partition labels carried by the persisted row.
    graph_labels: HashSet<String>,
    /// Labels used to match the row in storage.
    match_labels: BTreeSet<String>,
    original_labels: BTreeSet<String>,
    properties: PropertyStore,
    original_properties: PropertyStore,
    adjacency: AdjacencyCache,
    dirty: bool,
}

impl Vertex {
    /// Create a transient vertex that has never been persisted.
    ///
    /// All adjacency is considered loaded: nothing exists in storage yet.
    pub fn new(
        scope: Arc<GraphScope>,
        id: ElementId,
        labels: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<Self> {
        let mut label_set = BTreeSet::new();
        for label in labels {
            let label = label.into();
            if label.is_empty() {
                return Err(Error::InvalidArgument("label cannot be empty".into()));
            }
            if scope.partition().is_reserved_label(&label) {
                return Err(Error::ReservedLabel(label));
            }
            if scope.vertex_labels().contains(&label) {
                return Err(Error::AdditionalLabel(label));
            }
            label_set.insert(label);
        }
        let properties = PropertyStore::new(scope.property_ids().clone());
        Ok(Self {
            graph_labels: scope.vertex_labels().clone(),
            id,
            labels: label_set,
            labels_added: BTreeSet::new(),
            labels_removed: BTreeSet::new(),
            match_labels: BTreeSet::new(),
            original_labels: BTreeSet::new(),
            original_properties: properties.clone(),
            properties,
            adjacency: AdjacencyCache::new(true),
            dirty: false,
            scope,
        })
    }

    /// Load a vertex from a materialized node row.
    ///
    /// Graph-wide and partition labels are split off into the match-label
    /// set; the user label set holds the rest. Adjacency starts unloaded.
    pub fn from_node(scope: Arc<GraphScope>, node: &Node) -> Result<Self> {
        let id = scope.id_provider().normalize_node(node)?;
        let graph_labels: HashSet<String> = node
            .labels
            .iter()
            .filter(|label| {
                scope.vertex_labels().contains(*label)
                    || scope.partition().is_reserved_label(label)
            })
            .cloned()
            .collect();
        let labels: BTreeSet<String> = node
            .labels
            .iter()
            .filter(|label| !graph_labels.contains(*label))
            .cloned()
            .collect();
        let properties = PropertyStore::ingest(
            &node.properties,
            scope.id_field_name(),
            scope.property_ids().clone(),
        )?;
        Ok(Self {
            id,
            original_labels: labels.clone(),
            match_labels: node.labels.iter().cloned().collect(),
            labels,
            labels_added: BTreeSet::new(),
            labels_removed: BTreeSet::new(),
            graph_labels,
            original_properties: properties.clone(),
            properties,
            adjacency: AdjacencyCache::new(false),
            dirty: false,
            scope,
        })
    }

    pub fn id(&self) -> &ElementId {
        &self.id
    }

    /// The user labels joined with `::`, deterministic by sort order.
    pub fn label(&self) -> String {
        self.labels
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(LABEL_DELIMITER)
    }

    /// Snapshot of the user label set.
    pub fn labels(&self) -> Vec<String> {
        self.labels.iter().cloned().collect()
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    // ========================================================================
    // Label mutation
    // ========================================================================

    /// Add a user label. Returns whether the label set changed.
    ///
    /// Partition and graph-wide labels are rejected: the user label set
    /// never holds either. Re-adding a label removed earlier in the same
    /// transaction cancels
    /// the removal instead of recording an addition, keeping the delta sets
    /// net against the baseline.
    pub fn add_label(&mut self, session: &mut dyn Session, label: &str) -> Result<bool> {
        if label.is_empty() {
            return Err(Error::InvalidArgument("label cannot be empty".into()));
        }
        if self.scope.partition().is_reserved_label(label) {
            return Err(Error::ReservedLabel(label.to_owned()));
        }
        if self.scope.vertex_labels().contains(label) {
            return Err(Error::AdditionalLabel(label.to_owned()));
        }
        if !self.labels.insert(label.to_owned()) {
            return Ok(false);
        }
        if !self.labels_removed.remove(label) {
            session.vertex_dirty(&self.id);
            self.labels_added.insert(label.to_owned());
        }
        Ok(true)
    }

    /// Remove a user label. Returns whether the label set changed.
    ///
    /// Partition and graph-wide labels are structurally protected. Removing
    /// a label added in the same transaction retracts the addition without
    /// a dirty notification.
    pub fn remove_label(&mut self, session: &mut dyn Session, label: &str) -> Result<bool> {
        if self.scope.partition().is_reserved_label(label) {
            return Err(Error::ReservedLabel(label.to_owned()));
        }
        if self.scope.vertex_labels().contains(label) {
            return Err(Error::AdditionalLabel(label.to_owned()));
        }
        if !self.labels.remove(label) {
            return Ok(false);
        }
        if !self.labels_added.remove(label) {
            session.vertex_dirty(&self.id);
            self.labels_removed.insert(label.to_owned());
        }
        Ok(true)
    }

    // ========================================================================
    // Properties
    // ========================================================================

    /// Set a single-cardinality property.
    pub fn set_property(
        &mut self,
        session: &mut dyn Session,
        key: &str,
        value: impl Into<Value>,
    ) -> Result<VertexProperty> {
        self.set_property_with(session, Cardinality::Single, key, value, &PropertyMap::new())
    }

    /// Set a property with an explicit cardinality.
    ///
    /// `meta_properties` must be empty; meta-properties on vertex
    /// properties are not supported by the store.
    pub fn set_property_with(
        &mut self,
        session: &mut dyn Session,
        cardinality: Cardinality,
        key: &str,
        value: impl Into<Value>,
        meta_properties: &PropertyMap,
    ) -> Result<VertexProperty> {
        if !meta_properties.is_empty() {
            return Err(Error::MetaPropertiesNotSupported);
        }
        if let Some(existing) = self.properties.cardinality(key) {
            if existing != cardinality {
                return Err(Error::CardinalityConflict {
                    key: key.to_owned(),
                    existing,
                });
            }
        }
        session.read_write()?;
        let outcome = self.properties.set(key, value.into(), cardinality)?;
        if outcome.changed {
            session.vertex_dirty(&self.id);
            self.dirty = true;
        }
        Ok(outcome.property)
    }

    /// The single value stored under a key; fails when several exist.
    pub fn property(&self, key: &str) -> Result<Option<VertexProperty>> {
        self.properties.get(key)
    }

    /// Snapshot of stored property values, filtered and ordered by the
    /// given keys (empty = all).
    pub fn properties(&self, keys: &[&str]) -> Vec<VertexProperty> {
        self.properties.get_all(keys)
    }

    /// Remove a stored property value by handle.
    pub fn remove_property(&mut self, property: &VertexProperty) {
        self.properties.remove(property);
    }

    // ========================================================================
    // Adjacency
    // ========================================================================

    /// Register an outgoing edge, e.g. after the session created one.
    pub fn add_out_edge(&mut self, edge: EdgeRef) {
        self.adjacency.insert(Direction::Outgoing, edge);
    }

    /// Register an incoming edge.
    pub fn add_in_edge(&mut self, edge: EdgeRef) {
        self.adjacency.insert(Direction::Incoming, edge);
    }

    /// Drop an edge from both adjacency sets. Previously obtained
    /// snapshots are unaffected.
    pub fn remove_edge(&mut self, id: &ElementId) {
        self.adjacency.remove(id);
    }

    /// Incident edges by direction and label filter (empty = all).
    ///
    /// Served from memory when the cache covers the request; otherwise one
    /// resolution query is issued, its result merged, and the resolved
    /// labels recorded. The returned vector is a defensive snapshot.
    pub fn edges(
        &mut self,
        session: &mut dyn Session,
        direction: Direction,
        labels: &[&str],
    ) -> Result<Vec<EdgeRef>> {
        session.read_write()?;
        let requested: HashSet<String> = labels.iter().map(|s| s.to_string()).collect();
        match direction {
            Direction::Outgoing | Direction::Incoming => {
                self.resolve_edges(session, direction, &requested)
            }
            Direction::Both => {
                let out_needs = self.adjacency.needs_query(Direction::Outgoing, &requested);
                let in_needs = self.adjacency.needs_query(Direction::Incoming, &requested);
                if out_needs && in_needs {
                    let statement =
                        self.resolution_statement(Direction::Both, &requested, "n, r, m");
                    let result = session.execute(statement)?;
                    let fresh = session.edges(&result)?;
                    result.summary.log();
                    self.merge_undirected(fresh);
                    self.adjacency.mark_resolved(Direction::Outgoing, &requested);
                    self.adjacency.mark_resolved(Direction::Incoming, &requested);
                    Ok(self.adjacency.snapshot(Direction::Both, &requested))
                } else {
                    let mut edges =
                        self.resolve_edges(session, Direction::Outgoing, &requested)?;
                    edges.extend(self.resolve_edges(session, Direction::Incoming, &requested)?);
                    Ok(edges)
                }
            }
        }
    }

    /// Neighbor vertices by direction and edge-label filter (empty = all).
    ///
    /// Shares the resolution logic of [`edges`](Self::edges) but returns
    /// neighbor identifiers and leaves the adjacency cache untouched: rows
    /// carry only the far endpoint, not the connecting edge.
    pub fn vertices(
        &mut self,
        session: &mut dyn Session,
        direction: Direction,
        labels: &[&str],
    ) -> Result<Vec<ElementId>> {
        session.read_write()?;
        let requested: HashSet<String> = labels.iter().map(|s| s.to_string()).collect();
        match direction {
            Direction::Outgoing | Direction::Incoming => {
                self.resolve_vertices(session, direction, &requested)
            }
            Direction::Both => {
                let out_needs = self.adjacency.needs_query(Direction::Outgoing, &requested);
                let in_needs = self.adjacency.needs_query(Direction::Incoming, &requested);
                if out_needs && in_needs {
                    let statement = self.resolution_statement(Direction::Both, &requested, "m");
                    let result = session.execute(statement)?;
                    let fresh = session.vertices(&result)?;
                    result.summary.log();
                    let mut neighbors = self.cached_neighbors(Direction::Both, &requested);
                    neighbors.extend(fresh);
                    Ok(neighbors)
                } else {
                    let mut neighbors =
                        self.resolve_vertices(session, Direction::Outgoing, &requested)?;
                    neighbors
                        .extend(self.resolve_vertices(session, Direction::Incoming, &requested)?);
                    Ok(neighbors)
                }
            }
        }
    }

    fn resolve_edges(
        &mut self,
        session: &mut dyn Session,
        direction: Direction,
        requested: &HashSet<String>,
    ) -> Result<Vec<EdgeRef>> {
        if self.adjacency.needs_query(direction, requested) {
            let missing = self.adjacency.missing_labels(direction, requested);
            let statement = self.resolution_statement(direction, &missing, "n, r, m");
            let result = session.execute(statement)?;
            let fresh = session.edges(&result)?;
            result.summary.log();
            for edge in fresh {
                self.adjacency.insert(direction, edge);
            }
            // only now is the cache allowed to claim these labels
            self.adjacency.mark_resolved(direction, requested);
        }
        Ok(self.adjacency.snapshot(direction, requested))
    }

    fn resolve_vertices(
        &mut self,
        session: &mut dyn Session,
        direction: Direction,
        requested: &HashSet<String>,
    ) -> Result<Vec<ElementId>> {
        if self.adjacency.needs_query(direction, requested) {
            let missing = self.adjacency.missing_labels(direction, requested);
            let statement = self.resolution_statement(direction, &missing, "m");
            let result = session.execute(statement)?;
            let fresh = session.vertices(&result)?;
            result.summary.log();
            let mut neighbors = self.cached_neighbors(direction, requested);
            neighbors.extend(fresh);
            return Ok(neighbors);
        }
        Ok(self.cached_neighbors(direction, requested))
    }

    /// Far endpoints of the cached edges for a direction.
    fn cached_neighbors(
        &self,
        direction: Direction,
        requested: &HashSet<String>,
    ) -> Vec<ElementId> {
        match direction {
            Direction::Outgoing => self
                .adjacency
                .snapshot(Direction::Outgoing, requested)
                .into_iter()
                .map(|edge| edge.in_vertex)
                .collect(),
            Direction::Incoming => self
                .adjacency
                .snapshot(Direction::Incoming, requested)
                .into_iter()
                .map(|edge| edge.out_vertex)
                .collect(),
            Direction::Both => {
                let mut neighbors = self.cached_neighbors(Direction::Outgoing, requested);
                neighbors.extend(self.cached_neighbors(Direction::Incoming, requested));
                neighbors
            }
        }
    }

    /// File freshly queried undirected edges under the side(s) they touch.
    /// A self-loop lands in both.
    fn merge_undirected(&mut self, edges: Vec<EdgeRef>) {
        for edge in edges {
            if edge.out_vertex == self.id {
                self.adjacency.insert(Direction::Outgoing, edge.clone());
            }
            if edge.in_vertex == self.id {
                self.adjacency.insert(Direction::Incoming, edge);
            }
        }
    }

    /// Build the adjacency resolution query: anchored at this vertex,
    /// relationship pattern restricted to `rel_labels` (empty =
    /// unrestricted), neighbor pattern carrying the partition labels, and a
    /// WHERE clause excluding edges already in memory plus any partition
    /// predicate.
    fn resolution_statement(
        &self,
        direction: Direction,
        rel_labels: &HashSet<String>,
        returns: &str,
    ) -> Statement {
        let mut parameters = PropertyMap::new();
        parameters.insert("id".into(), self.id.to_value());

        let (left, right) = match direction {
            Direction::Outgoing => ("-", "->"),
            Direction::Incoming => ("<-", "-"),
            Direction::Both => ("-", "-"),
        };
        let mut text = format!(
            "MATCH {}{left}[r{}]{right}{}",
            self.match_pattern(Some("n"), "id"),
            escape_relationship_labels(rel_labels.iter().map(String::as_str)),
            neighbor_pattern("m", &self.scope.partition().match_pattern_labels()),
        );

        let known = self.adjacency.ids(direction);
        let predicate = self.scope.partition().match_predicate("m");
        if !known.is_empty() {
            text.push_str(" WHERE NOT ");
            text.push_str(&self.scope.id_provider().match_operand("r"));
            text.push_str(" IN $ids");
            parameters.insert(
                "ids".into(),
                Value::List(known.iter().map(ElementId::to_value).collect()),
            );
            if let Some(predicate) = predicate {
                text.push_str(" AND ");
                text.push_str(&predicate);
            }
        } else if let Some(predicate) = predicate {
            text.push_str(" WHERE ");
            text.push_str(&predicate);
        }
        text.push_str(" RETURN ");
        text.push_str(returns);
        tracing::debug!(statement = %text, vertex = %self.id, "resolving adjacency");
        Statement::new(text, parameters)
    }

    // ========================================================================
    // Match patterns
    // ========================================================================

    /// Match pattern locating this row: `` (alias:`A`:`B`{_id: $id}) ``.
    pub fn match_pattern(&self, alias: Option<&str>, id_parameter: &str) -> String {
        vertex_pattern(
            alias,
            self.match_labels.iter().map(String::as_str),
            self.scope.id_field_name(),
            id_parameter,
        )
    }

    /// Partition predicate for this vertex, `None` when not required.
    pub fn match_predicate(&self, alias: &str) -> Option<String> {
        self.scope.partition().match_predicate(alias)
    }

    // ========================================================================
    // Removal
    // ========================================================================

    /// Logically destroy the vertex: detach all outgoing edges, then hand
    /// the entity to the session for deletion bookkeeping.
    pub fn remove(&mut self, session: &mut dyn Session) -> Result<()> {
        session.read_write()?;
        for edge in self.adjacency.snapshot(Direction::Outgoing, &HashSet::new()) {
            session.edge_removed(&edge);
        }
        session.vertex_removed(&self.id);
        Ok(())
    }

    fn rebuild_match_labels(&self) -> BTreeSet<String> {
        self.original_labels
            .iter()
            .chain(self.graph_labels.iter())
            .cloned()
            .collect()
    }
}

impl UnitOfWork for Vertex {
    fn is_dirty(&self) -> bool {
        self.dirty || !self.labels_added.is_empty() || !self.labels_removed.is_empty()
    }

    fn is_transient(&self) -> bool {
        self.original_labels.is_empty()
    }

    /// Only valid while transient. Creates the row with the user labels
    /// plus the graph-wide labels and the full property projection, and
    /// records the label set used so the row can be matched before the
    /// next commit.
    fn insert_statement(&mut self) -> Statement {
        let labels: BTreeSet<String> = self
            .labels
            .iter()
            .chain(self.scope.vertex_labels().iter())
            .cloned()
            .collect();
        let text = format!(
            "CREATE ({} $vp)",
            escape_labels(labels.iter().map(String::as_str))
        );
        let mut parameters = PropertyMap::new();
        parameters.insert(
            "vp".into(),
            Value::Map(
                self.properties
                    .statement_parameters(self.scope.id_field_name(), &self.id),
            ),
        );
        self.match_labels = labels;
        tracing::debug!(statement = %text, vertex = %self.id, "insert");
        Statement::new(text, parameters)
    }

    /// `None` when neither properties nor labels changed — a label added
    /// and removed again in the same transaction leaves nothing to do.
    fn update_statement(&self) -> Option<Statement> {
        if !self.is_dirty() {
            return None;
        }
        let mut text = format!("MERGE {}", self.match_pattern(Some("v"), "id"));
        let mut parameters = PropertyMap::new();
        parameters.insert("id".into(), self.id.to_value());
        if self.dirty {
            text.push_str(" ON MATCH SET v = $vp");
            parameters.insert(
                "vp".into(),
                Value::Map(
                    self.properties
                        .statement_parameters(self.scope.id_field_name(), &self.id),
                ),
            );
        }
        if !self.labels_added.is_empty() {
            text.push_str(if self.dirty { ", v" } else { " ON MATCH SET v" });
            text.push_str(&escape_labels(
                self.labels_added.iter().map(String::as_str),
            ));
        }
        if !self.labels_removed.is_empty() {
            text.push_str(" REMOVE v");
            text.push_str(&escape_labels(
                self.labels_removed.iter().map(String::as_str),
            ));
        }
        tracing::debug!(statement = %text, vertex = %self.id, "update");
        Some(Statement::new(text, parameters))
    }

    fn delete_statement(&self) -> Statement {
        let text = format!(
            "MATCH {} DETACH DELETE v",
            self.match_pattern(Some("v"), "id")
        );
        let mut parameters = PropertyMap::new();
        parameters.insert("id".into(), self.id.to_value());
        tracing::debug!(statement = %text, vertex = %self.id, "delete");
        Statement::new(text, parameters)
    }

    /// Snapshot current state as the new baseline. Already-loaded
    /// adjacency stays valid.
    fn commit(&mut self) {
        self.labels_added.clear();
        self.labels_removed.clear();
        self.original_labels = self.labels.clone();
        self.original_properties = self.properties.clone();
        self.match_labels = self.rebuild_match_labels();
        self.dirty = false;
    }

    /// Restore the baseline and withdraw adjacency trust: edges touched in
    /// the aborted transaction must be re-resolved.
    fn rollback(&mut self) {
        self.labels_added.clear();
        self.labels_removed.clear();
        self.labels = self.original_labels.clone();
        self.properties = self.original_properties.clone();
        self.match_labels = self.rebuild_match_labels();
        self.adjacency.reset_loaded();
        self.dirty = false;
    }
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Vertex {}

impl std::hash::Hash for Vertex {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Display for Vertex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v[{}]", self.id)
    }
}

impl std::fmt::Debug for Vertex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vertex")
            .field("id", &self.id)
            .field("labels", &self.labels)
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}
