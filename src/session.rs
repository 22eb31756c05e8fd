//! Session contract and per-graph scope.
//!
//! The unit-of-work engine never talks to the wire itself. Everything with
//! a side effect outside the vertex — executing a statement, materializing
//! result rows, transaction bookkeeping — goes through the [`Session`]
//! trait, which the transaction coordinator implements. Tests script it.

use std::sync::Arc;

use hashbrown::HashSet;

use crate::id::ElementIdProvider;
use crate::model::{EdgeRef, ElementId};
use crate::partition::ReadPartition;
use crate::property::PropertyIdSequence;
use crate::result::StatementResult;
use crate::statement::Statement;
use crate::Result;

/// The session/transaction coordinator as seen by a vertex.
pub trait Session {
    /// Execute a statement against the store. Blocking; store failures
    /// propagate verbatim.
    fn execute(&mut self, statement: Statement) -> Result<StatementResult>;

    /// Materialize the edges contained in a result, registering them in the
    /// session arena. Row shape is the session's concern.
    fn edges(&mut self, result: &StatementResult) -> Result<Vec<EdgeRef>>;

    /// Materialize the neighbor vertices contained in a result, returning
    /// their identifiers.
    fn vertices(&mut self, result: &StatementResult) -> Result<Vec<ElementId>>;

    /// Notify that a vertex has uncommitted changes. Idempotent; meaningful
    /// at most once per transaction per vertex.
    fn vertex_dirty(&mut self, id: &ElementId);

    /// Read-write barrier: must be crossed before any I/O-triggering
    /// operation, ensuring a transaction is active.
    fn read_write(&mut self) -> Result<()>;

    /// Deletion bookkeeping for an edge detached by a vertex removal.
    fn edge_removed(&mut self, edge: &EdgeRef);

    /// Deletion bookkeeping for a removed vertex.
    fn vertex_removed(&mut self, id: &ElementId);
}

/// Graph-wide configuration shared by every vertex of a graph: the
/// partition filter, the labels implicitly attached to all vertices, the
/// identifier provider, and the synthetic property-id sequence.
pub struct GraphScope {
    partition: Arc<dyn ReadPartition>,
    vertex_labels: HashSet<String>,
    id_provider: Arc<dyn ElementIdProvider>,
    property_ids: PropertyIdSequence,
}

impl GraphScope {
    pub fn new(
        partition: Arc<dyn ReadPartition>,
        vertex_labels: impl IntoIterator<Item = impl Into<String>>,
        id_provider: Arc<dyn ElementIdProvider>,
    ) -> Self {
        Self {
            partition,
            vertex_labels: vertex_labels.into_iter().map(Into::into).collect(),
            id_provider,
            property_ids: PropertyIdSequence::new(),
        }
    }

    pub fn partition(&self) -> &dyn ReadPartition {
        self.partition.as_ref()
    }

    /// Labels implicitly attached to every vertex of the graph.
    pub fn vertex_labels(&self) -> &HashSet<String> {
        &self.vertex_labels
    }

    pub fn id_provider(&self) -> &dyn ElementIdProvider {
        self.id_provider.as_ref()
    }

    pub fn id_field_name(&self) -> &str {
        self.id_provider.id_field_name()
    }

    pub fn property_ids(&self) -> &PropertyIdSequence {
        &self.property_ids
    }
}

impl std::fmt::Debug for GraphScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphScope")
            .field("vertex_labels", &self.vertex_labels)
            .field("id_field_name", &self.id_field_name())
            .finish_non_exhaustive()
    }
}
