//! Per-run orchestration state: one `ActionState` per orchestration run,
//! one `NodeAction` per target node.
//!
//! All transitions funnel through the methods here so the invariants hold
//! regardless of task completion order: `completed` never exceeds `total`,
//! terminal node entries are never overwritten, and the run reaches
//! `Completed` exactly when every node has.

use crate::api::{ActionResult, ActionType, JobId};
use chrono::{DateTime, Utc};
use ld_core::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Whether the run targets one node or the whole selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionMode {
    /// Single node from the detail panel
    PerNode,
    /// The current multi-select
    MultiNode,
}

/// Aggregate status of an orchestration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrchestrationStatus {
    /// At least one node has not reached a terminal status
    Running,
    /// Every node reached a terminal status
    Completed,
    /// The run was cancelled before completing
    Cancelled,
}

impl std::fmt::Display for OrchestrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrchestrationStatus::Running => write!(f, "running"),
            OrchestrationStatus::Completed => write!(f, "completed"),
            OrchestrationStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Status of one node's action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeActionStatus {
    /// Not yet submitted
    Pending,
    /// Never ran: not applicable, or cancelled before submission
    Skipped,
    /// Job submitted and in flight
    Running,
    /// Job finished with a result
    Success,
    /// Job failed
    Error,
}

impl NodeActionStatus {
    /// Terminal statuses count toward `completed` and are never overwritten.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            NodeActionStatus::Skipped | NodeActionStatus::Success | NodeActionStatus::Error
        )
    }
}

/// Why a node was skipped.
///
/// Kept distinct from [`NodeActionStatus::Error`] so aggregate reporting
/// never conflates "didn't finish because cancelled" with "failed".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SkipReason {
    /// The action does not apply to this node
    NotApplicable { reason: String },
    /// The run was cancelled before this node finished
    Cancelled,
}

/// Tracked state of one node's action within a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeAction {
    /// Current status
    pub status: NodeActionStatus,

    /// Why the node was skipped, when `status` is `Skipped`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<SkipReason>,

    /// Failure message, when `status` is `Error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Last reported completion fraction in `0..=1`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,

    /// Job id once submitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,

    /// Typed result, when `status` is `Success`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ActionResult>,
}

impl NodeAction {
    fn pending() -> Self {
        Self {
            status: NodeActionStatus::Pending,
            skip_reason: None,
            error: None,
            progress: None,
            job_id: None,
            result: None,
        }
    }

    /// Whether this node has reached a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// State of one orchestration run across all its target nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionState {
    /// Short unique identifier for this run
    pub run_id: String,

    /// What is being compared
    pub action_type: ActionType,

    /// Single node or batch
    pub mode: ActionMode,

    /// Aggregate run status
    pub status: OrchestrationStatus,

    /// Number of target nodes, skipped ones included
    pub total: usize,

    /// Nodes that reached a terminal status
    pub completed: usize,

    /// Per-node action state
    pub actions: BTreeMap<NodeId, NodeAction>,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the state last changed
    pub last_updated_at: DateTime<Utc>,
}

impl ActionState {
    /// Create a running state with every target pending.
    pub fn new(
        action_type: ActionType,
        mode: ActionMode,
        targets: impl IntoIterator<Item = NodeId>,
    ) -> Self {
        let actions: BTreeMap<NodeId, NodeAction> = targets
            .into_iter()
            .map(|id| (id, NodeAction::pending()))
            .collect();
        // A run with no targets has nothing left to do
        let status = if actions.is_empty() {
            OrchestrationStatus::Completed
        } else {
            OrchestrationStatus::Running
        };
        Self {
            run_id: Uuid::new_v4().to_string()[..8].to_string(),
            action_type,
            mode,
            status,
            total: actions.len(),
            completed: 0,
            actions,
            started_at: Utc::now(),
            last_updated_at: Utc::now(),
        }
    }

    /// Mark a node skipped. Counts toward `completed` immediately.
    pub fn mark_skipped(&mut self, node: &NodeId, reason: SkipReason) {
        self.apply_terminal(node, |action| {
            action.status = NodeActionStatus::Skipped;
            action.skip_reason = Some(reason);
        });
    }

    /// Record a submitted job and move the node to running.
    pub fn mark_started(&mut self, node: &NodeId, job_id: JobId) {
        let Some(action) = self.actions.get_mut(node) else {
            log::warn!("job started for unknown node {}", node);
            return;
        };
        if action.is_terminal() {
            log::debug!("ignoring start for terminal node {}", node);
            return;
        }
        action.status = NodeActionStatus::Running;
        action.job_id = Some(job_id);
        self.last_updated_at = Utc::now();
    }

    /// Record a progress update for a running node.
    pub fn update_progress(&mut self, node: &NodeId, fraction: f64) {
        let Some(action) = self.actions.get_mut(node) else {
            return;
        };
        if action.status != NodeActionStatus::Running {
            return;
        }
        action.progress = Some(fraction.clamp(0.0, 1.0));
        self.last_updated_at = Utc::now();
    }

    /// Record a successful result. Counts toward `completed`.
    pub fn mark_success(&mut self, node: &NodeId, result: ActionResult) {
        self.apply_terminal(node, |action| {
            action.status = NodeActionStatus::Success;
            action.progress = Some(1.0);
            action.result = Some(result);
        });
    }

    /// Record a failure. Counts toward `completed`; siblings are untouched.
    pub fn mark_error(&mut self, node: &NodeId, message: String) {
        self.apply_terminal(node, |action| {
            action.status = NodeActionStatus::Error;
            action.error = Some(message);
        });
    }

    /// Mark the run cancelled and skip every node not yet terminal.
    ///
    /// Terminal entries keep their recorded outcome; cancellation never
    /// rewrites a success or error.
    pub fn mark_run_cancelled(&mut self) {
        if self.status != OrchestrationStatus::Running {
            return;
        }
        self.status = OrchestrationStatus::Cancelled;
        let pending: Vec<NodeId> = self
            .actions
            .iter()
            .filter(|(_, a)| !a.is_terminal())
            .map(|(id, _)| id.clone())
            .collect();
        for node in pending {
            self.mark_skipped(&node, SkipReason::Cancelled);
        }
        self.last_updated_at = Utc::now();
    }

    fn apply_terminal(&mut self, node: &NodeId, f: impl FnOnce(&mut NodeAction)) {
        let Some(action) = self.actions.get_mut(node) else {
            log::warn!("terminal outcome for unknown node {}", node);
            return;
        };
        if action.is_terminal() {
            log::debug!("ignoring duplicate terminal outcome for {}", node);
            return;
        }
        f(action);
        self.completed += 1;
        self.last_updated_at = Utc::now();
        if self.status == OrchestrationStatus::Running && self.completed == self.total {
            self.status = OrchestrationStatus::Completed;
        }
    }

    /// Look up one node's action.
    pub fn action(&self, node: &NodeId) -> Option<&NodeAction> {
        self.actions.get(node)
    }

    /// Whether the run has reached a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            OrchestrationStatus::Completed | OrchestrationStatus::Cancelled
        )
    }
}

#[cfg(test)]
#[path = "action_test.rs"]
mod tests;
