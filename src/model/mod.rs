//! # Property Graph Model
//!
//! Clean DTOs that cross every boundary: store rows ↔ unit-of-work ↔ user.
//!
//! Design rule: no driver types, no session state here.
//! This module is pure data — no I/O, no statements, no dirty tracking.

pub mod element_id;
pub mod node;
pub mod edge_ref;
pub mod value;

pub use element_id::ElementId;
pub use node::Node;
pub use edge_ref::{Direction, EdgeRef};
pub use value::Value;

/// A flat map of property names to values, used for statement parameters
/// and materialized rows.
pub type PropertyMap = hashbrown::HashMap<String, Value>;
