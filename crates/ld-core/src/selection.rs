//! Selection, focus, and highlight state for a lineage view session.
//!
//! Highlighting is purely a rendering concern: it decides which visible
//! nodes and edges are drawn emphasized, and never removes anything from the
//! visible subgraph the view resolver produced.

use crate::error::LineageResult;
use crate::graph::LineageGraph;
use crate::ids::NodeId;
use crate::traversal::compute_neighbor_set;
use crate::view::ColumnFocus;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Interaction mode of the view session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// No selection; hovering and focusing drive the display
    #[default]
    Browsing,
    /// One or more nodes checked for a batch action
    MultiSelect,
    /// A finished action's per-node outcomes drive the display
    ActionResult,
}

/// Selection and focus state owned by the engine.
///
/// Invariant: a non-empty selection and a defined focus are mutually
/// exclusive; each operation that sets one clears the other.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectionState {
    /// Current interaction mode
    pub mode: SelectionMode,

    /// Selected nodes in insertion order (display); membership is a set
    selected: Vec<NodeId>,

    /// Focused node, if any
    focused: Option<NodeId>,
}

impl SelectionState {
    /// Create a fresh browsing-mode state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle a node's selection membership and enter multi-select mode.
    ///
    /// Clears any focused node. Toggling the last selected node off keeps
    /// multi-select mode; only [`deselect_all`](Self::deselect_all) returns
    /// to browsing.
    pub fn select_node(&mut self, id: NodeId) {
        self.focused = None;
        self.mode = SelectionMode::MultiSelect;
        if let Some(pos) = self.selected.iter().position(|n| *n == id) {
            self.selected.remove(pos);
        } else {
            self.selected.push(id);
        }
    }

    /// Focus a single node, clearing the selection.
    pub fn focus_node(&mut self, id: NodeId) {
        self.selected.clear();
        self.mode = SelectionMode::Browsing;
        self.focused = Some(id);
    }

    /// Clear selection and focus, returning to browsing mode.
    pub fn deselect_all(&mut self) {
        self.selected.clear();
        self.focused = None;
        self.mode = SelectionMode::Browsing;
    }

    /// Replace the selection wholesale, preserving the given order.
    ///
    /// Used by the expansion helpers (select parents, select upstream) so
    /// the detail panel lists nodes in a meaningful order.
    pub fn set_selection(&mut self, ids: Vec<NodeId>) {
        self.focused = None;
        self.mode = SelectionMode::MultiSelect;
        self.selected.clear();
        let mut seen = HashSet::new();
        for id in ids {
            if seen.insert(id.clone()) {
                self.selected.push(id);
            }
        }
    }

    /// Switch to action-result mode, keeping the selection for display.
    pub fn enter_action_result(&mut self) {
        self.mode = SelectionMode::ActionResult;
    }

    /// Selected nodes in insertion order.
    pub fn selected(&self) -> &[NodeId] {
        &self.selected
    }

    /// The focused node, if any.
    pub fn focused(&self) -> Option<&NodeId> {
        self.focused.as_ref()
    }

    /// Whether a node is currently selected.
    pub fn is_selected(&self, id: &NodeId) -> bool {
        self.selected.iter().any(|n| n == id)
    }
}

/// External column-dependency collaborator for column-focus highlighting.
pub trait ColumnDependencyResolver: Send + Sync {
    /// Columns contributing to or depending on `(node, column)`.
    fn contributing_columns(
        &self,
        node: &NodeId,
        column: &str,
        graph: &LineageGraph,
    ) -> LineageResult<HashSet<(NodeId, String)>>;
}

/// Which nodes are drawn highlighted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HighlightScope {
    /// Every visible node (browsing with nothing focused)
    All,
    /// Exactly this set
    Nodes(HashSet<NodeId>),
}

impl HighlightScope {
    /// Whether a node is highlighted under this scope.
    pub fn contains(&self, id: &NodeId) -> bool {
        match self {
            HighlightScope::All => true,
            HighlightScope::Nodes(set) => set.contains(id),
        }
    }

    /// An edge is highlighted iff both endpoints are.
    pub fn edge_highlighted(&self, source: &NodeId, target: &NodeId) -> bool {
        self.contains(source) && self.contains(target)
    }
}

/// Derive the highlight scope for the current selection state.
///
/// - multi-select: exact selection membership, no expansion
/// - focus: impact radius (parents and children, unlimited depth), with the
///   column-dependency set unioned in when a column is focused
/// - column focus with no focused node: impact radius of the column's
///   owning node, plus the column-dependency set
/// - browsing without any focus: everything
pub fn highlight_scope(
    state: &SelectionState,
    graph: &LineageGraph,
    column_focus: Option<&ColumnFocus>,
    column_resolver: Option<&dyn ColumnDependencyResolver>,
) -> LineageResult<HighlightScope> {
    if state.mode == SelectionMode::MultiSelect || state.mode == SelectionMode::ActionResult {
        return Ok(HighlightScope::Nodes(
            state.selected().iter().cloned().collect(),
        ));
    }

    // A focused column narrows the scope even without a focused node; the
    // radius is seeded from the column's owning node.
    let seed = state
        .focused()
        .cloned()
        .or_else(|| column_focus.map(|f| f.node_id.clone()));
    let Some(seed) = seed else {
        return Ok(HighlightScope::All);
    };

    let mut radius =
        compute_neighbor_set(std::iter::once(seed), |id| graph.neighbors_of(id), None);

    if let (Some(focus), Some(resolver)) = (column_focus, column_resolver) {
        if let Some(column) = &focus.column {
            let contributions = resolver.contributing_columns(&focus.node_id, column, graph)?;
            radius.extend(contributions.into_iter().map(|(node, _col)| node));
        }
    }

    Ok(HighlightScope::Nodes(radius))
}

#[cfg(test)]
#[path = "selection_test.rs"]
mod tests;
