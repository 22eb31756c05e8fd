//! Per-vertex incident-edge cache.
//!
//! Each direction is independently lazy: a boolean flag records that *all*
//! edges in that direction are in memory, and a label set records which
//! labels have been fully resolved even while the flag is false. The flag,
//! once set, supersedes the label set.

use hashbrown::{HashMap, HashSet};

use crate::model::{Direction, EdgeRef, ElementId};

#[derive(Debug, Clone, Default)]
struct DirectedCache {
    edges: HashMap<ElementId, EdgeRef>,
    resolved_labels: HashSet<String>,
    loaded: bool,
}

impl DirectedCache {
    fn needs_query(&self, requested: &HashSet<String>) -> bool {
        if self.loaded {
            return false;
        }
        requested.is_empty() || !requested.is_subset(&self.resolved_labels)
    }

    fn snapshot(&self, filter: &HashSet<String>) -> Vec<EdgeRef> {
        self.edges
            .values()
            .filter(|edge| filter.is_empty() || filter.contains(&edge.label))
            .cloned()
            .collect()
    }

    fn mark_resolved(&mut self, requested: &HashSet<String>) {
        if requested.is_empty() {
            self.loaded = true;
        }
        self.resolved_labels
            .extend(requested.iter().cloned());
    }
}

/// Both incident-edge collections of a vertex.
#[derive(Debug, Clone)]
pub struct AdjacencyCache {
    out: DirectedCache,
    incoming: DirectedCache,
}

impl AdjacencyCache {
    /// `loaded` is true for transient vertices: nothing is persisted, so
    /// everything is already in memory.
    pub fn new(loaded: bool) -> Self {
        let cache = DirectedCache {
            loaded,
            ..Default::default()
        };
        Self {
            out: cache.clone(),
            incoming: cache,
        }
    }

    fn side(&self, direction: Direction) -> &DirectedCache {
        match direction {
            Direction::Outgoing => &self.out,
            Direction::Incoming => &self.incoming,
            Direction::Both => unreachable!("combined direction resolved by the caller"),
        }
    }

    fn side_mut(&mut self, direction: Direction) -> &mut DirectedCache {
        match direction {
            Direction::Outgoing => &mut self.out,
            Direction::Incoming => &mut self.incoming,
            Direction::Both => unreachable!("combined direction resolved by the caller"),
        }
    }

    /// Whether every edge in the direction is already in memory.
    pub fn loaded(&self, direction: Direction) -> bool {
        self.side(direction).loaded
    }

    /// Labels already fully resolved for the direction.
    pub fn resolved(&self, direction: Direction, label: &str) -> bool {
        self.side(direction).resolved_labels.contains(label)
    }

    /// Whether a store query is required for the requested labels
    /// (empty = everything).
    pub fn needs_query(&self, direction: Direction, requested: &HashSet<String>) -> bool {
        self.side(direction).needs_query(requested)
    }

    /// `requested − resolved` for the direction.
    pub fn missing_labels(
        &self,
        direction: Direction,
        requested: &HashSet<String>,
    ) -> HashSet<String> {
        requested
            .difference(&self.side(direction).resolved_labels)
            .cloned()
            .collect()
    }

    /// Identifiers of edges already in memory for the direction, used to
    /// exclude known edges from resolution queries.
    pub fn ids(&self, direction: Direction) -> Vec<ElementId> {
        match direction {
            Direction::Both => self
                .out
                .edges
                .keys()
                .chain(self.incoming.edges.keys())
                .cloned()
                .collect(),
            other => self.side(other).edges.keys().cloned().collect(),
        }
    }

    pub fn insert(&mut self, direction: Direction, edge: EdgeRef) {
        self.side_mut(direction).edges.insert(edge.id.clone(), edge);
    }

    /// Drop an edge from both directions.
    pub fn remove(&mut self, id: &ElementId) {
        self.out.edges.remove(id);
        self.incoming.edges.remove(id);
    }

    /// Defensive copy of the in-memory edges for the direction, filtered to
    /// the given labels when non-empty.
    pub fn snapshot(&self, direction: Direction, filter: &HashSet<String>) -> Vec<EdgeRef> {
        match direction {
            Direction::Both => {
                let mut edges = self.out.snapshot(filter);
                edges.extend(self.incoming.snapshot(filter));
                edges
            }
            other => self.side(other).snapshot(filter),
        }
    }

    /// Record a successful resolution. Must only be called after the store
    /// query completed; an empty request marks the direction fully loaded.
    pub fn mark_resolved(&mut self, direction: Direction, requested: &HashSet<String>) {
        self.side_mut(direction).mark_resolved(requested);
    }

    /// Withdraw trust in both loaded flags. Rollback calls this so edges
    /// touched in the aborted transaction are re-resolved on next access.
    pub fn reset_loaded(&mut self) {
        self.out.loaded = false;
        self.incoming.loaded = false;
    }
}
