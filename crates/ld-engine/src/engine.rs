//! The `LineageEngine`: one object owning all mutable view-session state.
//!
//! Display components never share mutable context with the engine. They call
//! its operations and read immutable snapshots; the engine owns the graph,
//! the selection, the resolved visible subgraph, and the active action run.

use crate::error::{EngineError, EngineResult};
use ld_core::{
    compute_neighbor_set, diff_columns, highlight_scope, resolve_view, validate_column_focus,
    ColumnDependencyResolver, ColumnDiff, GraphSummary, HighlightScope, LineageError,
    LineageGraph, NodeId, SelectionState, SelectorEvaluator, SnapshotSet, ViewOptions,
    VisibleSubgraph,
};
use ld_jobs::{
    ActionMode, ActionParams, ActionState, ActionTarget, ActionType, DiffJobApi,
    OrchestratorHandle,
};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Static engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// The project's own package, used when no package filter is set
    pub project_package: String,

    /// Interval between job polls
    pub poll_interval: Duration,
}

impl EngineConfig {
    /// Config with the default half-second poll interval.
    pub fn new(project_package: impl Into<String>) -> Self {
        Self {
            project_package: project_package.into(),
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Immutable per-frame snapshot handed to render consumers.
#[derive(Debug, Clone, Serialize)]
pub struct EngineSnapshot {
    /// Aggregate change counts for the header
    pub summary: GraphSummary,

    /// The resolved visible subgraph
    pub visible: VisibleSubgraph,

    /// Selection and focus state
    pub selection: SelectionState,

    /// The latest orchestration run, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionState>,
}

/// The stateful lineage diff engine.
pub struct LineageEngine {
    config: EngineConfig,
    graph: LineageGraph,
    selection: SelectionState,
    view_options: ViewOptions,
    visible: VisibleSubgraph,
    selector: Arc<dyn SelectorEvaluator>,
    column_resolver: Arc<dyn ColumnDependencyResolver>,
    job_api: Arc<dyn DiffJobApi>,
    active_action: Option<OrchestratorHandle>,
}

impl LineageEngine {
    /// Create an engine with an empty graph.
    pub fn new(
        config: EngineConfig,
        selector: Arc<dyn SelectorEvaluator>,
        column_resolver: Arc<dyn ColumnDependencyResolver>,
        job_api: Arc<dyn DiffJobApi>,
    ) -> Self {
        Self {
            config,
            graph: LineageGraph::new(),
            selection: SelectionState::new(),
            view_options: ViewOptions::default(),
            visible: VisibleSubgraph::default(),
            selector,
            column_resolver,
            job_api,
            active_action: None,
        }
    }

    /// Replace the graph with a fresh merge of the given snapshots.
    ///
    /// Selection and any finished action run are discarded; the previous
    /// view options are re-resolved against the new graph. If a selector
    /// expression no longer evaluates, the expressions are dropped rather
    /// than leaving the session stuck on stale data.
    pub fn load_snapshots(&mut self, snapshots: &SnapshotSet) {
        self.graph = LineageGraph::build(snapshots);
        self.selection = SelectionState::new();
        self.active_action = None;

        match self.resolve(&self.view_options) {
            Ok(visible) => self.visible = visible,
            Err(e) => {
                log::warn!("view options no longer resolve after reload: {}", e);
                self.view_options.select = None;
                self.view_options.exclude = None;
                self.visible = self
                    .resolve(&self.view_options)
                    .expect("resolution without selectors cannot fail");
            }
        }
    }

    /// Apply new view options.
    ///
    /// On a selector or column-focus error the previous options and visible
    /// subgraph remain in effect; only the failed change is rejected.
    pub fn set_view_options(&mut self, options: ViewOptions) -> EngineResult<()> {
        if let Some(focus) = &options.column_focus {
            validate_column_focus(&self.graph, focus)?;
        }
        let visible = self.resolve(&options)?;
        self.view_options = options;
        self.visible = visible;
        Ok(())
    }

    fn resolve(&self, options: &ViewOptions) -> Result<VisibleSubgraph, LineageError> {
        resolve_view(
            &self.graph,
            options,
            self.selector.as_ref(),
            &self.config.project_package,
        )
    }

    /// The merged graph.
    pub fn graph(&self) -> &LineageGraph {
        &self.graph
    }

    /// The currently visible subgraph.
    pub fn visible(&self) -> &VisibleSubgraph {
        &self.visible
    }

    /// The current view options.
    pub fn view_options(&self) -> &ViewOptions {
        &self.view_options
    }

    /// Toggle a node in the multi-select.
    pub fn select_node(&mut self, id: &NodeId) -> EngineResult<()> {
        self.ensure_node(id)?;
        self.selection.select_node(id.clone());
        Ok(())
    }

    /// Focus a single node for impact-radius display.
    pub fn focus_node(&mut self, id: &NodeId) -> EngineResult<()> {
        self.ensure_node(id)?;
        self.selection.focus_node(id.clone());
        Ok(())
    }

    /// Clear selection and focus.
    pub fn deselect_all(&mut self) {
        self.selection.deselect_all();
    }

    /// Selection and focus state.
    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Replace the selection with the direct parents of the current seeds.
    pub fn select_parents(&mut self) {
        self.expand_selection(Direction::Upstream, Some(1));
    }

    /// Replace the selection with the direct children of the current seeds.
    pub fn select_children(&mut self) {
        self.expand_selection(Direction::Downstream, Some(1));
    }

    /// Replace the selection with everything upstream of the current seeds.
    pub fn select_upstream(&mut self) {
        self.expand_selection(Direction::Upstream, None);
    }

    /// Replace the selection with everything downstream of the current seeds.
    pub fn select_downstream(&mut self) {
        self.expand_selection(Direction::Downstream, None);
    }

    fn expand_selection(&mut self, direction: Direction, depth: Option<usize>) {
        let seeds: Vec<NodeId> = if self.selection.selected().is_empty() {
            self.selection.focused().cloned().into_iter().collect()
        } else {
            self.selection.selected().to_vec()
        };
        if seeds.is_empty() {
            return;
        }

        let graph = &self.graph;
        let expanded = match direction {
            Direction::Upstream => {
                compute_neighbor_set(seeds, |id| graph.parents_of(id), depth)
            }
            Direction::Downstream => {
                compute_neighbor_set(seeds, |id| graph.children_of(id), depth)
            }
        };

        self.selection.set_selection(self.ordered(&expanded));
    }

    /// Order a node set topologically for display, sorted as a fallback.
    fn ordered(&self, set: &HashSet<NodeId>) -> Vec<NodeId> {
        match self.graph.topological_order() {
            Ok(order) => order.into_iter().filter(|id| set.contains(id)).collect(),
            Err(_) => {
                let mut out: Vec<NodeId> = set.iter().cloned().collect();
                out.sort();
                out
            }
        }
    }

    /// Whether a node is drawn highlighted.
    ///
    /// Highlighting never shrinks visibility: a node outside the visible
    /// subgraph is simply not drawn, highlighted or not.
    pub fn is_node_highlighted(&self, id: &NodeId) -> EngineResult<bool> {
        Ok(self.visible.is_node_visible(id) && self.highlight()?.contains(id))
    }

    /// Whether the edge between two visible nodes is drawn highlighted.
    pub fn is_edge_highlighted(&self, source: &NodeId, target: &NodeId) -> EngineResult<bool> {
        Ok(self.visible.is_node_visible(source)
            && self.visible.is_node_visible(target)
            && self.highlight()?.edge_highlighted(source, target))
    }

    fn highlight(&self) -> EngineResult<HighlightScope> {
        Ok(highlight_scope(
            &self.selection,
            &self.graph,
            self.view_options.column_focus.as_ref(),
            Some(self.column_resolver.as_ref()),
        )?)
    }

    /// Column change summary for one node, computed on demand.
    pub fn column_diff(&self, id: &NodeId) -> EngineResult<ColumnDiff> {
        let node = self.ensure_node(id)?;
        Ok(diff_columns(node.base.as_ref(), node.current.as_ref()))
    }

    /// Run a comparison action over the current selection (or the focused
    /// node when nothing is selected).
    ///
    /// Returns the initial run state; progress is observed through
    /// [`action_snapshot`](Self::action_snapshot).
    pub fn run_action(
        &mut self,
        action_type: ActionType,
        params: ActionParams,
    ) -> EngineResult<ActionState> {
        if let Some(active) = &self.active_action {
            let state = active.snapshot();
            if !state.is_terminal() {
                return Err(EngineError::ActionInProgress { run_id: state.run_id });
            }
        }

        let (mode, ids): (ActionMode, Vec<NodeId>) = if !self.selection.selected().is_empty() {
            (ActionMode::MultiNode, self.selection.selected().to_vec())
        } else if let Some(focused) = self.selection.focused() {
            (ActionMode::PerNode, vec![focused.clone()])
        } else {
            return Err(EngineError::EmptySelection {
                action: action_type.to_string(),
            });
        };

        let mut targets = Vec::with_capacity(ids.len());
        for id in &ids {
            targets.push(ActionTarget::from_node(self.ensure_node(id)?));
        }

        let handle = OrchestratorHandle::start(
            Arc::clone(&self.job_api),
            action_type,
            mode,
            targets,
            params,
            self.config.poll_interval,
        );
        let initial = handle.snapshot();
        self.active_action = Some(handle);
        Ok(initial)
    }

    /// Request cancellation of the active run, if any.
    pub fn cancel_action(&self) {
        if let Some(active) = &self.active_action {
            active.cancel();
        }
    }

    /// Wait for the active run to wind down (used by tests and teardown).
    pub async fn wait_action(&self) {
        if let Some(active) = &self.active_action {
            active.wait().await;
        }
    }

    /// Snapshot the latest orchestration run.
    ///
    /// Once the run is terminal the selection switches to action-result
    /// mode so the display presents per-node outcomes.
    pub fn action_snapshot(&mut self) -> Option<ActionState> {
        let state = self.active_action.as_ref().map(|a| a.snapshot())?;
        if state.is_terminal() && !self.selection.selected().is_empty() {
            self.selection.enter_action_result();
        }
        Some(state)
    }

    /// Full immutable snapshot for render consumers.
    pub fn snapshot(&mut self) -> EngineSnapshot {
        EngineSnapshot {
            summary: self.graph.summary(),
            visible: self.visible.clone(),
            selection: self.selection.clone(),
            action: self.action_snapshot(),
        }
    }

    fn ensure_node(&self, id: &NodeId) -> EngineResult<&ld_core::Node> {
        self.graph.node(id).ok_or_else(|| {
            EngineError::Lineage(LineageError::NodeNotFound { id: id.to_string() })
        })
    }
}

enum Direction {
    Upstream,
    Downstream,
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
