//! Lazy adjacency resolution: query counts, generated statements, partition
//! scoping, snapshot isolation.

mod common;

use common::{plain_scope, scope_with, ScriptedSession};

use std::sync::Arc;

use cypher_ogm::{
    AllLabelsReadPartition, AnyLabelReadPartition, Direction, EdgeRef, ElementId, GraphScope,
    Node, Value, Vertex,
};
use pretty_assertions::assert_eq;

fn person(scope: &Arc<GraphScope>, id: i64) -> Vertex {
    Vertex::from_node(
        scope.clone(),
        &Node::new(["Person"]).with_property("_id", id),
    )
    .expect("load vertex")
}

fn knows(id: i64, from: i64, to: i64) -> EdgeRef {
    EdgeRef::new(id, "KNOWS", from, to)
}

// ============================================================================
// Incremental resolution
// ============================================================================

#[test]
fn test_repeated_unrestricted_query_runs_once() {
    let scope = plain_scope();
    let mut session = ScriptedSession::new();
    let mut v = person(&scope, 1);

    session.enqueue_edges(vec![knows(10, 1, 2)]);
    v.edges(&mut session, Direction::Outgoing, &[]).unwrap();
    v.edges(&mut session, Direction::Outgoing, &[]).unwrap();
    v.edges(&mut session, Direction::Outgoing, &["KNOWS"]).unwrap();

    // one query loaded the direction; everything after came from memory
    assert_eq!(session.query_count(), 1);
    assert_eq!(
        session.last_statement().text,
        "MATCH (n:`Person`{_id: $id})-[r]->(m) RETURN n, r, m"
    );
}

#[test]
fn test_label_filtered_queries_converge() {
    let scope = plain_scope();
    let mut session = ScriptedSession::new();
    let mut v = person(&scope, 1);

    session.enqueue_edges(vec![knows(10, 1, 2)]);
    let edges = v
        .edges(&mut session, Direction::Outgoing, &["KNOWS"])
        .unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(session.query_count(), 1);
    assert_eq!(
        session.last_statement().text,
        "MATCH (n:`Person`{_id: $id})-[r:`KNOWS`]->(m) RETURN n, r, m"
    );

    // same label again: no query
    v.edges(&mut session, Direction::Outgoing, &["KNOWS"])
        .unwrap();
    assert_eq!(session.query_count(), 1);

    // wider filter: only the missing label is fetched, cached edges excluded
    session.enqueue_edges(vec![EdgeRef::new(11i64, "LIKES", 1i64, 3i64)]);
    let edges = v
        .edges(&mut session, Direction::Outgoing, &["KNOWS", "LIKES"])
        .unwrap();
    assert_eq!(edges.len(), 2);
    assert_eq!(session.query_count(), 2);
    let statement = session.last_statement();
    assert_eq!(
        statement.text,
        "MATCH (n:`Person`{_id: $id})-[r:`LIKES`]->(m) WHERE NOT r._id IN $ids RETURN n, r, m"
    );
    assert_eq!(
        statement.parameters.get("ids"),
        Some(&Value::List(vec![Value::Int(10)]))
    );

    // unrestricted request still needs one more query, then the direction
    // is fully loaded
    session.enqueue_edges(Vec::new());
    v.edges(&mut session, Direction::Outgoing, &[]).unwrap();
    assert_eq!(session.query_count(), 3);
    v.edges(&mut session, Direction::Outgoing, &["ANY"]).unwrap();
    assert_eq!(session.query_count(), 3);
}

#[test]
fn test_incoming_direction_reverses_the_arrow() {
    let scope = plain_scope();
    let mut session = ScriptedSession::new();
    let mut v = person(&scope, 1);

    session.enqueue_edges(vec![knows(12, 4, 1)]);
    let edges = v.edges(&mut session, Direction::Incoming, &[]).unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(
        session.last_statement().text,
        "MATCH (n:`Person`{_id: $id})<-[r]-(m) RETURN n, r, m"
    );
}

#[test]
fn test_transient_vertex_never_queries() {
    let scope = plain_scope();
    let mut session = ScriptedSession::new();
    let mut v = Vertex::new(scope, ElementId::Int(1), ["Person"]).unwrap();
    v.add_out_edge(knows(10, 1, 2));

    let edges = v.edges(&mut session, Direction::Both, &[]).unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(session.query_count(), 0);
}

// ============================================================================
// Combined direction
// ============================================================================

#[test]
fn test_both_directions_share_one_query_when_both_are_cold() {
    let scope = plain_scope();
    let mut session = ScriptedSession::new();
    let mut v = person(&scope, 1);

    // one undirected query; a self-loop counts for both sides
    session.enqueue_edges(vec![knows(10, 1, 2), knows(11, 3, 1), knows(12, 1, 1)]);
    let edges = v.edges(&mut session, Direction::Both, &[]).unwrap();
    assert_eq!(session.query_count(), 1);
    assert_eq!(
        session.last_statement().text,
        "MATCH (n:`Person`{_id: $id})-[r]-(m) RETURN n, r, m"
    );
    // 1 out + 1 in + the self-loop on both sides
    assert_eq!(edges.len(), 4);

    // both directions are now fully loaded
    v.edges(&mut session, Direction::Outgoing, &[]).unwrap();
    v.edges(&mut session, Direction::Incoming, &[]).unwrap();
    assert_eq!(session.query_count(), 1);
}

#[test]
fn test_both_directions_fall_back_to_the_cold_side_only() {
    let scope = plain_scope();
    let mut session = ScriptedSession::new();
    let mut v = person(&scope, 1);

    session.enqueue_edges(vec![knows(10, 1, 2)]);
    v.edges(&mut session, Direction::Outgoing, &[]).unwrap();
    assert_eq!(session.query_count(), 1);

    // outgoing is warm, so the combined request only queries incoming
    session.enqueue_edges(vec![knows(11, 3, 1)]);
    let edges = v.edges(&mut session, Direction::Both, &[]).unwrap();
    assert_eq!(edges.len(), 2);
    assert_eq!(session.query_count(), 2);
    assert!(session.last_statement().text.contains("<-[r]-"));
}

// ============================================================================
// Neighbor resolution
// ============================================================================

#[test]
fn test_vertices_combines_memory_and_store_without_caching() {
    let scope = plain_scope();
    let mut session = ScriptedSession::new();
    let mut v = person(&scope, 1);
    v.add_out_edge(knows(10, 1, 2));

    session.enqueue_vertices(vec![ElementId::Int(3)]);
    let neighbors = v.vertices(&mut session, Direction::Outgoing, &[]).unwrap();
    assert_eq!(neighbors, vec![ElementId::Int(2), ElementId::Int(3)]);
    assert_eq!(session.query_count(), 1);
    let statement = session.last_statement();
    assert_eq!(
        statement.text,
        "MATCH (n:`Person`{_id: $id})-[r]->(m) WHERE NOT r._id IN $ids RETURN m"
    );

    // neighbor resolution leaves the cache cold: it re-queries every time
    session.enqueue_vertices(vec![ElementId::Int(3)]);
    v.vertices(&mut session, Direction::Outgoing, &[]).unwrap();
    assert_eq!(session.query_count(), 2);
}

#[test]
fn test_incoming_neighbors_map_to_the_far_endpoint() {
    let scope = plain_scope();
    let mut session = ScriptedSession::new();
    let mut v = person(&scope, 1);
    v.add_in_edge(knows(11, 4, 1));

    session.enqueue_vertices(Vec::new());
    let neighbors = v.vertices(&mut session, Direction::Incoming, &[]).unwrap();
    assert_eq!(neighbors, vec![ElementId::Int(4)]);
}

#[test]
fn test_warm_cache_serves_neighbors_without_querying() {
    let scope = plain_scope();
    let mut session = ScriptedSession::new();
    let mut v = person(&scope, 1);

    session.enqueue_edges(vec![knows(10, 1, 2)]);
    v.edges(&mut session, Direction::Outgoing, &[]).unwrap();

    let neighbors = v.vertices(&mut session, Direction::Outgoing, &[]).unwrap();
    assert_eq!(neighbors, vec![ElementId::Int(2)]);
    assert_eq!(session.query_count(), 1);
}

// ============================================================================
// Partition scoping
// ============================================================================

#[test]
fn test_all_labels_partition_constrains_both_ends() {
    let scope = scope_with(
        Arc::new(AllLabelsReadPartition::new(["Tenant"])),
        Vec::<String>::new(),
    );
    let mut session = ScriptedSession::new();
    let mut v = Vertex::from_node(
        scope,
        &Node::new(["Person", "Tenant"]).with_property("_id", 1i64),
    )
    .unwrap();

    session.enqueue_edges(Vec::new());
    v.edges(&mut session, Direction::Outgoing, &[]).unwrap();
    assert_eq!(
        session.last_statement().text,
        "MATCH (n:`Person`:`Tenant`{_id: $id})-[r]->(m:`Tenant`) RETURN n, r, m"
    );
}

#[test]
fn test_any_label_partition_contributes_a_predicate() {
    let scope = scope_with(
        Arc::new(AnyLabelReadPartition::new(["TenantA", "TenantB"])),
        Vec::<String>::new(),
    );
    let mut session = ScriptedSession::new();
    let mut v = Vertex::from_node(
        scope,
        &Node::new(["Person", "TenantA"]).with_property("_id", 1i64),
    )
    .unwrap();

    session.enqueue_edges(Vec::new());
    v.edges(&mut session, Direction::Outgoing, &[]).unwrap();
    assert_eq!(
        session.last_statement().text,
        "MATCH (n:`Person`:`TenantA`{_id: $id})-[r]->(m) \
         WHERE (m:`TenantA` OR m:`TenantB`) RETURN n, r, m"
    );

    // with cached edges the predicate joins the exclusion clause
    v.add_out_edge(knows(10, 1, 2));
    session.enqueue_edges(Vec::new());
    v.edges(&mut session, Direction::Outgoing, &["KNOWS"]).unwrap();
    assert_eq!(
        session.last_statement().text,
        "MATCH (n:`Person`:`TenantA`{_id: $id})-[r:`KNOWS`]->(m) \
         WHERE NOT r._id IN $ids AND (m:`TenantA` OR m:`TenantB`) RETURN n, r, m"
    );
}

// ============================================================================
// Snapshot isolation
// ============================================================================

#[test]
fn test_snapshots_survive_later_mutation() {
    let scope = plain_scope();
    let mut session = ScriptedSession::new();
    let mut v = person(&scope, 1);

    session.enqueue_edges(vec![knows(10, 1, 2), knows(11, 1, 3)]);
    let snapshot = v.edges(&mut session, Direction::Outgoing, &[]).unwrap();
    assert_eq!(snapshot.len(), 2);

    v.remove_edge(&ElementId::Int(10));

    assert_eq!(snapshot.len(), 2);
    let after = v.edges(&mut session, Direction::Outgoing, &[]).unwrap();
    assert_eq!(after.len(), 1);
    assert_eq!(session.query_count(), 1);
}
