//! Declarative view options and their resolution into a visible subgraph.
//!
//! The resolver is a pure function: it never mutates the graph, and a
//! selector error leaves whatever the caller was previously displaying
//! untouched. Filters apply in a fixed order: package, selector expressions,
//! then view mode.

use crate::error::{LineageError, LineageResult};
use crate::graph::LineageGraph;
use crate::ids::{EdgeId, NodeId};
use crate::traversal::compute_neighbor_set;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Which nodes the lineage view shows by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// Only changed nodes plus their immediate neighbors
    #[default]
    ChangedOnly,
    /// Every node passing the package and selector filters
    All,
}

/// A focused `(node, column)` pair for column-level lineage display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnFocus {
    /// Node the column belongs to
    pub node_id: NodeId,

    /// Focused column; `None` focuses the node's whole column set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
}

/// Declarative options controlling the visible subgraph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewOptions {
    /// View mode, defaults to changed-only
    #[serde(default)]
    pub view_mode: ViewMode,

    /// Packages to show; `None` defaults to the project's own package
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packages: Option<HashSet<String>>,

    /// Opaque selector expression for inclusion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select: Option<String>,

    /// Opaque selector expression for exclusion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,

    /// Focused column for column-level highlighting
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_focus: Option<ColumnFocus>,
}

/// External selector-evaluation collaborator.
///
/// The selector grammar is out of scope here; the engine only requires that
/// invalid syntax surfaces as an error instead of an empty result set.
pub trait SelectorEvaluator: Send + Sync {
    /// Resolve an expression to the set of matching node ids.
    fn evaluate(&self, expression: &str, graph: &LineageGraph) -> LineageResult<HashSet<NodeId>>;
}

/// The resolved visible node and edge subset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisibleSubgraph {
    /// Visible node ids
    pub nodes: HashSet<NodeId>,

    /// Visible edge ids (both endpoints visible)
    pub edges: HashSet<EdgeId>,

    /// Visible nodes in render order (parents before children)
    pub order: Vec<NodeId>,
}

impl VisibleSubgraph {
    /// Whether a node survived the filters.
    pub fn is_node_visible(&self, id: &NodeId) -> bool {
        self.nodes.contains(id)
    }

    /// Whether an edge survived the filters.
    pub fn is_edge_visible(&self, id: &EdgeId) -> bool {
        self.edges.contains(id)
    }
}

/// Resolve view options against a graph into the visible subgraph.
///
/// `default_package` is used when `options.packages` is unset.
pub fn resolve_view(
    graph: &LineageGraph,
    options: &ViewOptions,
    evaluator: &dyn SelectorEvaluator,
    default_package: &str,
) -> LineageResult<VisibleSubgraph> {
    // 1. Package filter
    let mut filtered: HashSet<NodeId> = match &options.packages {
        Some(packages) => graph
            .nodes()
            .values()
            .filter(|n| packages.contains(&n.package_name))
            .map(|n| n.id.clone())
            .collect(),
        None => graph
            .nodes()
            .values()
            .filter(|n| n.package_name == default_package)
            .map(|n| n.id.clone())
            .collect(),
    };

    // 2. Selector expressions: evaluate(select) \ evaluate(exclude).
    // Errors propagate before any further narrowing so the caller can keep
    // its previous subgraph.
    if let Some(select) = &options.select {
        let selected = evaluator.evaluate(select, graph)?;
        filtered.retain(|id| selected.contains(id));
    }
    if let Some(exclude) = &options.exclude {
        let excluded = evaluator.evaluate(exclude, graph)?;
        filtered.retain(|id| !excluded.contains(id));
    }

    // 3. View mode
    let nodes: HashSet<NodeId> = match options.view_mode {
        ViewMode::All => filtered,
        ViewMode::ChangedOnly => {
            let changed: HashSet<NodeId> = filtered
                .iter()
                .filter(|id| graph.modified_set().contains(*id))
                .cloned()
                .collect();
            // One hop in both directions keeps changed nodes connected to
            // their immediate context; neighbors outside the filter scope
            // stay hidden.
            let expanded =
                compute_neighbor_set(changed, |id| graph.neighbors_of(id), Some(1));
            expanded
                .into_iter()
                .filter(|id| filtered.contains(id))
                .collect()
        }
    };

    let edges: HashSet<EdgeId> = graph
        .edges()
        .values()
        .filter(|e| nodes.contains(&e.source) && nodes.contains(&e.target))
        .map(|e| e.id.clone())
        .collect();

    let order = visible_order(graph, &nodes);

    Ok(VisibleSubgraph { nodes, edges, order })
}

/// Topological order restricted to the visible set, with a sorted fallback
/// when the merged graph has a cycle.
fn visible_order(graph: &LineageGraph, visible: &HashSet<NodeId>) -> Vec<NodeId> {
    match graph.topological_order() {
        Ok(order) => order.into_iter().filter(|id| visible.contains(id)).collect(),
        Err(e) => {
            log::warn!("falling back to name order for rendering: {}", e);
            let mut order: Vec<NodeId> = visible.iter().cloned().collect();
            order.sort();
            order
        }
    }
}

/// Validate that a column focus points at an existing node and column.
///
/// Checked against the current side first, then base, so a focus on a
/// removed node's column is still resolvable.
pub fn validate_column_focus(graph: &LineageGraph, focus: &ColumnFocus) -> LineageResult<()> {
    let node = graph
        .node(&focus.node_id)
        .ok_or_else(|| LineageError::NodeNotFound {
            id: focus.node_id.to_string(),
        })?;

    if let Some(column) = &focus.column {
        let has_column = node
            .latest()
            .map(|s| s.columns.contains_key(column))
            .unwrap_or(false)
            || node
                .base
                .as_ref()
                .map(|s| s.columns.contains_key(column))
                .unwrap_or(false);
        if !has_column {
            return Err(LineageError::ColumnNotFound {
                node: focus.node_id.to_string(),
                column: column.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "view_test.rs"]
mod tests;
