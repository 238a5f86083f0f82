use super::*;

fn snap(name: &str, checksum: &str, parents: &[&str]) -> NodeSnapshot {
    NodeSnapshot::new(name, ResourceType::Model, "analytics", checksum)
        .with_parents(parents.iter().map(|p| NodeId::new(*p)))
}

fn id(s: &str) -> NodeId {
    NodeId::new(s)
}

#[test]
fn test_build_merges_both_sides() {
    let mut set = SnapshotSet::new();
    set.base.insert(id("a"), snap("a", "h1", &[]));
    set.base.insert(id("b"), snap("b", "h2", &["a"]));
    set.current.insert(id("a"), snap("a", "h1", &[]));
    set.current.insert(id("b"), snap("b", "h2", &["a"]));

    let graph = LineageGraph::build(&set);

    assert_eq!(graph.len(), 2);
    assert_eq!(graph.edges().len(), 1);
    let a = graph.node(&id("a")).unwrap();
    assert_eq!(a.presence, Presence::Both);
    assert_eq!(a.change_status, None);
    let edge = graph.edges().values().next().unwrap();
    assert_eq!(edge.source, id("a"));
    assert_eq!(edge.target, id("b"));
    assert_eq!(edge.presence, Presence::Both);
}

#[test]
fn test_current_only_node_is_added() {
    let mut set = SnapshotSet::new();
    set.current.insert(id("x"), snap("x", "h1", &[]));

    let graph = LineageGraph::build(&set);

    let x = graph.node(&id("x")).unwrap();
    assert_eq!(x.presence, Presence::CurrentOnly);
    assert_eq!(x.change_status, Some(ChangeStatus::Added));
    assert!(graph.modified_set().contains(&id("x")));
}

#[test]
fn test_base_only_node_is_removed() {
    let mut set = SnapshotSet::new();
    set.base.insert(id("x"), snap("x", "h1", &[]));

    let graph = LineageGraph::build(&set);

    let x = graph.node(&id("x")).unwrap();
    assert_eq!(x.presence, Presence::BaseOnly);
    assert_eq!(x.change_status, Some(ChangeStatus::Removed));
}

#[test]
fn test_checksum_change_is_modified() {
    let mut set = SnapshotSet::new();
    set.base.insert(id("a"), snap("a", "h1", &[]));
    set.current.insert(id("a"), snap("a", "h2", &[]));

    let graph = LineageGraph::build(&set);

    let a = graph.node(&id("a")).unwrap();
    assert_eq!(a.change_status, Some(ChangeStatus::Modified));
    assert!(graph.modified_set().contains(&id("a")));
}

#[test]
fn test_equal_checksum_is_unset() {
    let mut set = SnapshotSet::new();
    set.base.insert(id("a"), snap("a", "same", &[]));
    set.current.insert(id("a"), snap("a", "same", &[]));

    let graph = LineageGraph::build(&set);

    assert_eq!(graph.node(&id("a")).unwrap().change_status, None);
    assert!(graph.modified_set().is_empty());
}

#[test]
fn test_modified_set_matches_status_count() {
    let mut set = SnapshotSet::new();
    set.base.insert(id("kept"), snap("kept", "h", &[]));
    set.current.insert(id("kept"), snap("kept", "h", &[]));
    set.base.insert(id("gone"), snap("gone", "h", &[]));
    set.current.insert(id("new"), snap("new", "h", &[]));
    set.base.insert(id("edited"), snap("edited", "h1", &[]));
    set.current.insert(id("edited"), snap("edited", "h2", &[]));

    let graph = LineageGraph::build(&set);

    let with_status = graph
        .nodes()
        .values()
        .filter(|n| n.change_status.is_some())
        .count();
    assert_eq!(graph.modified_set().len(), with_status);
    assert_eq!(graph.modified_set().len(), 3);
}

#[test]
fn test_edge_presence_tracks_adjacency_side() {
    let mut set = SnapshotSet::new();
    // base: a -> b; current: c -> b
    set.base.insert(id("a"), snap("a", "h", &[]));
    set.base.insert(id("b"), snap("b", "h", &["a"]));
    set.current.insert(id("b"), snap("b", "h", &["c"]));
    set.current.insert(id("c"), snap("c", "h", &[]));

    let graph = LineageGraph::build(&set);

    let ab = graph.edge(&EdgeId::for_pair(&id("a"), &id("b"))).unwrap();
    assert_eq!(ab.presence, Presence::BaseOnly);
    let cb = graph.edge(&EdgeId::for_pair(&id("c"), &id("b"))).unwrap();
    assert_eq!(cb.presence, Presence::CurrentOnly);
}

#[test]
fn test_dangling_edge_is_dropped_not_fatal() {
    let mut set = SnapshotSet::new();
    set.current
        .insert(id("b"), snap("b", "h", &["missing_parent"]));

    let graph = LineageGraph::build(&set);

    assert_eq!(graph.len(), 1);
    assert!(graph.edges().is_empty());
    assert!(graph.node(&id("b")).unwrap().parents.is_empty());
}

#[test]
fn test_parents_and_children_maps() {
    let mut set = SnapshotSet::new();
    set.current.insert(id("a"), snap("a", "h", &[]));
    set.current.insert(id("b"), snap("b", "h", &["a"]));
    set.current.insert(id("c"), snap("c", "h", &["a", "b"]));

    let graph = LineageGraph::build(&set);

    assert_eq!(graph.parents_of(&id("c")), vec![id("a"), id("b")]);
    assert_eq!(graph.children_of(&id("a")), vec![id("b"), id("c")]);
    let mut neighbors = graph.neighbors_of(&id("b"));
    neighbors.sort();
    assert_eq!(neighbors, vec![id("a"), id("c")]);
}

#[test]
fn test_topological_order() {
    let mut set = SnapshotSet::new();
    set.current.insert(id("raw"), snap("raw", "h", &[]));
    set.current.insert(id("stg"), snap("stg", "h", &["raw"]));
    set.current.insert(id("fct"), snap("fct", "h", &["stg"]));

    let graph = LineageGraph::build(&set);
    let order = graph.topological_order().unwrap();

    let pos = |n: &str| order.iter().position(|x| x == n).unwrap();
    assert!(pos("raw") < pos("stg"));
    assert!(pos("stg") < pos("fct"));
}

#[test]
fn test_cycle_across_snapshots_is_reported() {
    let mut set = SnapshotSet::new();
    // base: a -> b; current: b -> a. Each side is acyclic, the merge is not.
    set.base.insert(id("a"), snap("a", "h", &[]));
    set.base.insert(id("b"), snap("b", "h", &["a"]));
    set.current.insert(id("a"), snap("a", "h", &["b"]));
    set.current.insert(id("b"), snap("b", "h", &[]));

    let graph = LineageGraph::build(&set);
    let result = graph.topological_order();

    match result.unwrap_err() {
        LineageError::CircularLineage { cycle } => {
            // The reported path walks back into itself
            let hops: Vec<&str> = cycle.split(" -> ").collect();
            assert!(hops.len() >= 3);
            let last = *hops.last().unwrap();
            assert!(hops[..hops.len() - 1].contains(&last));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_summary_counts() {
    let mut set = SnapshotSet::new();
    set.base.insert(id("gone"), snap("gone", "h", &[]));
    set.current.insert(id("new"), snap("new", "h", &[]));
    set.base.insert(id("edited"), snap("edited", "h1", &[]));
    set.current.insert(id("edited"), snap("edited", "h2", &[]));
    set.base.insert(id("same"), snap("same", "h", &[]));
    set.current.insert(id("same"), snap("same", "h", &[]));

    let summary = LineageGraph::build(&set).summary();

    assert_eq!(summary.total, 4);
    assert_eq!(summary.added, 1);
    assert_eq!(summary.removed, 1);
    assert_eq!(summary.modified, 1);
}

#[test]
fn test_rebuild_is_full_replace() {
    let mut set = SnapshotSet::new();
    set.current.insert(id("a"), snap("a", "h", &[]));
    let first = LineageGraph::build(&set);
    assert_eq!(first.len(), 1);

    let mut set2 = SnapshotSet::new();
    set2.current.insert(id("b"), snap("b", "h", &[]));
    let second = LineageGraph::build(&set2);

    assert!(!second.contains(&id("a")));
    assert!(second.contains(&id("b")));
}
