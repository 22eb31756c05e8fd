//! # cypher-ogm
//!
//! Client-side unit-of-work engine for object-graph mapping over a remote
//! Cypher property-graph store.
//!
//! The crate keeps an in-memory image of graph vertices — labels, typed
//! properties, lazily loaded adjacency — tracks every mutation against the
//! last committed baseline, and turns the accumulated delta into minimal
//! parameterized Cypher statements at transaction boundaries.
//!
//! ## Architecture
//!
//! ```text
//!  user code
//!     │
//!     ▼
//!  Vertex ──────────────── unit-of-work state machine (vertex)
//!     │ labels, properties, adjacency
//!     ▼
//!  Session trait ───────── transaction coordinator seam (session)
//!     │ execute / materialize / bookkeeping
//!     ▼
//!  Statement ────────────── parameterized Cypher (statement, result)
//! ```
//!
//! Supporting layers: the data model ([`model`]), identifier providers
//! ([`id`]), logical partitions ([`partition`]), and cardinality-aware
//! property storage ([`property`]).
//!
//! ## Concurrency
//!
//! The engine is synchronous and single-threaded by design; callers get
//! isolation by handing out defensive snapshots at every API boundary.
//! Structured diagnostics go through [`tracing`].

pub mod adjacency;
pub mod id;
pub mod model;
pub mod partition;
pub mod property;
pub mod result;
pub mod session;
pub mod statement;
pub mod vertex;

pub use id::{ElementIdProvider, SequenceIdProvider};
pub use model::{Direction, EdgeRef, ElementId, Node, PropertyMap, Value};
pub use partition::{
    AllLabelsReadPartition, AnyLabelReadPartition, NoReadPartition, ReadPartition,
};
pub use property::{Cardinality, PropertyIdSequence, PropertyStore, VertexProperty};
pub use result::{ResultRow, ResultSummary, StatementResult, UpdateCounters};
pub use session::{GraphScope, Session};
pub use statement::Statement;
pub use vertex::{UnitOfWork, Vertex, LABEL_DELIMITER};

/// Errors surfaced by the unit-of-work engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A caller-supplied argument violated an API contract.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An element identifier was missing or had an unusable type.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// A property name already has a different established cardinality.
    #[error("property `{key}` already has {existing} cardinality")]
    CardinalityConflict {
        key: String,
        existing: Cardinality,
    },

    /// A single-value read hit a name with several stored values.
    #[error("property `{0}` has multiple values")]
    MultipleProperties(String),

    /// A materialized row carried a value type the store cannot map.
    #[error("property `{key}` has unsupported value type {type_name}")]
    UnsupportedValue {
        key: String,
        type_name: &'static str,
    },

    /// Meta-properties on vertex properties are not supported.
    #[error("meta-properties are not supported")]
    MetaPropertiesNotSupported,

    /// The label is reserved by the partition.
    #[error("label `{0}` is reserved by the graph partition")]
    ReservedLabel(String),

    /// The label is a graph-wide label and cannot be removed per vertex.
    #[error("label `{0}` is attached to every vertex of the graph")]
    AdditionalLabel(String),

    /// Transaction bookkeeping failed, e.g. no transaction could be made
    /// active at the read-write barrier.
    #[error("transaction error: {0}")]
    Tx(String),

    /// The remote store reported a failure; propagated verbatim.
    #[error("store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, Error>;
