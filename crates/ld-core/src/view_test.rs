use super::*;
use crate::snapshot::{NodeSnapshot, ResourceType, SnapshotSet};
use std::collections::HashMap;

fn id(s: &str) -> NodeId {
    NodeId::new(s)
}

fn snap(name: &str, package: &str, checksum: &str, parents: &[&str]) -> NodeSnapshot {
    NodeSnapshot::new(name, ResourceType::Model, package, checksum)
        .with_parents(parents.iter().map(|p| NodeId::new(*p)))
}

/// Chain in "analytics" plus one external node:
/// raw -> stg -> fct, ext (package "external"); stg is modified.
fn fixture() -> LineageGraph {
    let mut set = SnapshotSet::new();
    set.base.insert(id("raw"), snap("raw", "analytics", "h", &[]));
    set.base.insert(id("stg"), snap("stg", "analytics", "h1", &["raw"]));
    set.base.insert(id("fct"), snap("fct", "analytics", "h", &["stg"]));
    set.base.insert(id("ext"), snap("ext", "external", "h", &[]));
    set.current.insert(id("raw"), snap("raw", "analytics", "h", &[]));
    set.current.insert(id("stg"), snap("stg", "analytics", "h2", &["raw"]));
    set.current.insert(id("fct"), snap("fct", "analytics", "h", &["stg"]));
    set.current.insert(id("ext"), snap("ext", "external", "h", &[]));
    LineageGraph::build(&set)
}

/// Evaluator backed by a fixed expression -> node-set table.
struct TableEvaluator {
    table: HashMap<String, Vec<NodeId>>,
}

impl TableEvaluator {
    fn new(entries: &[(&str, &[&str])]) -> Self {
        let table = entries
            .iter()
            .map(|(expr, nodes)| {
                (
                    expr.to_string(),
                    nodes.iter().map(|n| NodeId::new(*n)).collect(),
                )
            })
            .collect();
        Self { table }
    }
}

impl SelectorEvaluator for TableEvaluator {
    fn evaluate(&self, expression: &str, _graph: &LineageGraph) -> LineageResult<HashSet<NodeId>> {
        self.table
            .get(expression)
            .map(|nodes| nodes.iter().cloned().collect())
            .ok_or_else(|| LineageError::InvalidSelector {
                selector: expression.to_string(),
                reason: "unknown expression".to_string(),
            })
    }
}

fn no_selectors() -> TableEvaluator {
    TableEvaluator::new(&[])
}

#[test]
fn test_default_package_filter() {
    let graph = fixture();
    let options = ViewOptions {
        view_mode: ViewMode::All,
        ..ViewOptions::default()
    };

    let visible = resolve_view(&graph, &options, &no_selectors(), "analytics").unwrap();

    assert!(visible.is_node_visible(&id("raw")));
    assert!(!visible.is_node_visible(&id("ext")));
    assert_eq!(visible.nodes.len(), 3);
}

#[test]
fn test_explicit_package_set() {
    let graph = fixture();
    let options = ViewOptions {
        view_mode: ViewMode::All,
        packages: Some(["external".to_string()].into_iter().collect()),
        ..ViewOptions::default()
    };

    let visible = resolve_view(&graph, &options, &no_selectors(), "analytics").unwrap();

    assert_eq!(visible.nodes.len(), 1);
    assert!(visible.is_node_visible(&id("ext")));
}

#[test]
fn test_select_minus_exclude() {
    let graph = fixture();
    let evaluator = TableEvaluator::new(&[
        ("+fct", &["raw", "stg", "fct"]),
        ("raw", &["raw"]),
    ]);
    let options = ViewOptions {
        view_mode: ViewMode::All,
        select: Some("+fct".to_string()),
        exclude: Some("raw".to_string()),
        ..ViewOptions::default()
    };

    let visible = resolve_view(&graph, &options, &evaluator, "analytics").unwrap();

    assert!(!visible.is_node_visible(&id("raw")));
    assert!(visible.is_node_visible(&id("stg")));
    assert!(visible.is_node_visible(&id("fct")));
}

#[test]
fn test_invalid_selector_is_an_error() {
    let graph = fixture();
    let options = ViewOptions {
        select: Some("nonsense(".to_string()),
        ..ViewOptions::default()
    };

    let result = resolve_view(&graph, &options, &no_selectors(), "analytics");

    assert!(matches!(
        result.unwrap_err(),
        LineageError::InvalidSelector { .. }
    ));
}

#[test]
fn test_changed_only_expands_one_hop() {
    let graph = fixture();
    let options = ViewOptions::default(); // changed-only

    let visible = resolve_view(&graph, &options, &no_selectors(), "analytics").unwrap();

    // stg is modified; raw and fct are its immediate neighbors
    assert!(visible.is_node_visible(&id("stg")));
    assert!(visible.is_node_visible(&id("raw")));
    assert!(visible.is_node_visible(&id("fct")));
    assert_eq!(visible.nodes.len(), 3);
}

#[test]
fn test_changed_only_hides_distant_unchanged() {
    let mut set = SnapshotSet::new();
    // a -> b -> c -> d, only a is modified; c and d are two+ hops away
    set.base.insert(id("a"), snap("a", "p", "h1", &[]));
    set.current.insert(id("a"), snap("a", "p", "h2", &[]));
    for (node, parent) in [("b", "a"), ("c", "b"), ("d", "c")] {
        set.base.insert(id(node), snap(node, "p", "h", &[parent]));
        set.current.insert(id(node), snap(node, "p", "h", &[parent]));
    }
    let graph = LineageGraph::build(&set);

    let visible = resolve_view(&graph, &ViewOptions::default(), &no_selectors(), "p").unwrap();

    assert!(visible.is_node_visible(&id("a")));
    assert!(visible.is_node_visible(&id("b")));
    assert!(!visible.is_node_visible(&id("c")));
    assert!(!visible.is_node_visible(&id("d")));
}

#[test]
fn test_expansion_stays_inside_filter_scope() {
    let mut set = SnapshotSet::new();
    // modified node in "mine" with a neighbor in "other"
    set.current.insert(id("m"), snap("m", "mine", "h", &[]));
    set.base.insert(id("o"), snap("o", "other", "h", &[]));
    set.current.insert(id("o"), snap("o", "other", "h", &[]));
    set.current
        .insert(id("m2"), snap("m2", "mine", "h", &["o", "m"]));
    set.base.insert(id("m2"), snap("m2", "mine", "h", &["o"]));
    let graph = LineageGraph::build(&set);

    let visible = resolve_view(&graph, &ViewOptions::default(), &no_selectors(), "mine").unwrap();

    assert!(!visible.is_node_visible(&id("o")));
}

#[test]
fn test_edge_visible_iff_both_endpoints() {
    let graph = fixture();
    let evaluator = TableEvaluator::new(&[("no_raw", &["stg", "fct"])]);
    let options = ViewOptions {
        view_mode: ViewMode::All,
        select: Some("no_raw".to_string()),
        ..ViewOptions::default()
    };

    let visible = resolve_view(&graph, &options, &evaluator, "analytics").unwrap();

    assert!(visible.is_edge_visible(&EdgeId::for_pair(&id("stg"), &id("fct"))));
    assert!(!visible.is_edge_visible(&EdgeId::for_pair(&id("raw"), &id("stg"))));
}

#[test]
fn test_order_is_topological() {
    let graph = fixture();
    let options = ViewOptions {
        view_mode: ViewMode::All,
        ..ViewOptions::default()
    };

    let visible = resolve_view(&graph, &options, &no_selectors(), "analytics").unwrap();

    let pos = |n: &str| visible.order.iter().position(|x| x == n).unwrap();
    assert!(pos("raw") < pos("stg"));
    assert!(pos("stg") < pos("fct"));
}

#[test]
fn test_validate_column_focus() {
    let mut set = SnapshotSet::new();
    set.current.insert(
        id("orders"),
        snap("orders", "p", "h", &[]).with_column("amount", "DECIMAL"),
    );
    let graph = LineageGraph::build(&set);

    let ok = ColumnFocus {
        node_id: id("orders"),
        column: Some("amount".to_string()),
    };
    assert!(validate_column_focus(&graph, &ok).is_ok());

    let bad_column = ColumnFocus {
        node_id: id("orders"),
        column: Some("missing".to_string()),
    };
    assert!(matches!(
        validate_column_focus(&graph, &bad_column).unwrap_err(),
        LineageError::ColumnNotFound { .. }
    ));

    let bad_node = ColumnFocus {
        node_id: id("nope"),
        column: None,
    };
    assert!(matches!(
        validate_column_focus(&graph, &bad_node).unwrap_err(),
        LineageError::NodeNotFound { .. }
    ));
}
