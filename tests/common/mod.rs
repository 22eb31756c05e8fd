//! Scripted session double shared by the integration tests.

use std::collections::VecDeque;
use std::sync::Arc;

use cypher_ogm::{
    EdgeRef, ElementId, Error, GraphScope, NoReadPartition, ReadPartition, Result,
    SequenceIdProvider, Session, Statement, StatementResult,
};

/// One scripted answer to an `execute` call: the payload the session would
/// materialize out of the result rows.
#[derive(Debug, Clone, Default)]
pub struct ScriptedResponse {
    pub edges: Vec<EdgeRef>,
    pub vertices: Vec<ElementId>,
}

/// Session double driven by a queue of scripted responses.
///
/// Every interaction is recorded so tests can assert on generated statement
/// text, query counts, dirty notifications, and deletion bookkeeping.
#[derive(Debug, Default)]
pub struct ScriptedSession {
    responses: VecDeque<ScriptedResponse>,
    current: ScriptedResponse,
    pub executed: Vec<Statement>,
    pub dirty_notifications: Vec<ElementId>,
    pub removed_edges: Vec<EdgeRef>,
    pub removed_vertices: Vec<ElementId>,
    pub barriers: usize,
}

impl ScriptedSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, response: ScriptedResponse) {
        self.responses.push_back(response);
    }

    pub fn enqueue_edges(&mut self, edges: Vec<EdgeRef>) {
        self.enqueue(ScriptedResponse {
            edges,
            vertices: Vec::new(),
        });
    }

    pub fn enqueue_vertices(&mut self, vertices: Vec<ElementId>) {
        self.enqueue(ScriptedResponse {
            vertices,
            edges: Vec::new(),
        });
    }

    pub fn query_count(&self) -> usize {
        self.executed.len()
    }

    pub fn last_statement(&self) -> &Statement {
        self.executed.last().expect("no statement executed")
    }
}

impl Session for ScriptedSession {
    fn execute(&mut self, statement: Statement) -> Result<StatementResult> {
        let response = self
            .responses
            .pop_front()
            .ok_or_else(|| Error::Store(format!("unscripted statement: {statement}")))?;
        self.executed.push(statement);
        self.current = response;
        Ok(StatementResult::empty())
    }

    fn edges(&mut self, _result: &StatementResult) -> Result<Vec<EdgeRef>> {
        Ok(std::mem::take(&mut self.current.edges))
    }

    fn vertices(&mut self, _result: &StatementResult) -> Result<Vec<ElementId>> {
        Ok(std::mem::take(&mut self.current.vertices))
    }

    fn vertex_dirty(&mut self, id: &ElementId) {
        self.dirty_notifications.push(id.clone());
    }

    fn read_write(&mut self) -> Result<()> {
        self.barriers += 1;
        Ok(())
    }

    fn edge_removed(&mut self, edge: &EdgeRef) {
        self.removed_edges.push(edge.clone());
    }

    fn vertex_removed(&mut self, id: &ElementId) {
        self.removed_vertices.push(id.clone());
    }
}

/// Scope over the whole graph: no partition, no graph-wide labels.
pub fn plain_scope() -> Arc<GraphScope> {
    scope_with(Arc::new(NoReadPartition), Vec::<String>::new())
}

pub fn scope_with(
    partition: Arc<dyn ReadPartition>,
    vertex_labels: impl IntoIterator<Item = impl Into<String>>,
) -> Arc<GraphScope> {
    Arc::new(GraphScope::new(
        partition,
        vertex_labels,
        Arc::new(SequenceIdProvider::new()),
    ))
}
