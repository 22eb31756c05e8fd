//! Non-owning edge reference held in vertex adjacency.

use serde::{Deserialize, Serialize};
use super::ElementId;

/// Traversal direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Outgoing,
    Incoming,
    Both,
}

/// A relational reference to an edge: identifier, label and endpoint ids.
///
/// Vertices hold `EdgeRef`s in their adjacency cache instead of owning edge
/// entities — the session arena owns all entities, and endpoints are
/// addressed by identifier. This avoids cyclic ownership between a vertex
/// and its incident edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRef {
    pub id: ElementId,
    pub label: String,
    pub out_vertex: ElementId,
    pub in_vertex: ElementId,
}

impl EdgeRef {
    pub fn new(
        id: impl Into<ElementId>,
        label: impl Into<String>,
        out_vertex: impl Into<ElementId>,
        in_vertex: impl Into<ElementId>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            out_vertex: out_vertex.into(),
            in_vertex: in_vertex.into(),
        }
    }

    /// The endpoint on the far side of the edge from the given vertex.
    pub fn other_end(&self, from: &ElementId) -> Option<&ElementId> {
        if *from == self.out_vertex {
            Some(&self.in_vertex)
        } else if *from == self.in_vertex {
            Some(&self.out_vertex)
        } else {
            None
        }
    }
}

impl std::fmt::Display for EdgeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "e[{}][{}-{}->{}]",
            self.id, self.out_vertex, self.label, self.in_vertex
        )
    }
}
