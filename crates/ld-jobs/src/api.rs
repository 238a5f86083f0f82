//! Diff-job API contract and action typing.
//!
//! The engine never computes comparison results itself; it submits jobs to
//! an external service through [`DiffJobApi`] and polls them to completion.
//! Failed jobs are never retried here.

use crate::error::JobResult;
use async_trait::async_trait;
use ld_core::{Node, NodeId, Presence, ResourceType};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Identifier of a submitted diff job, assigned by the job service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Wrap a job id returned by the service.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return the underlying id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for JobId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The kinds of comparison jobs the engine can orchestrate.
///
/// A closed set, matched exhaustively; adding a kind is a compile-time
/// ripple through every match rather than a silent lookup miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Compare row counts between base and current
    RowCountDiff,
    /// Compare row contents keyed by a primary key
    ValueDiff,
    /// Compare column-level profiles (min/max/null counts, ...)
    ProfileDiff,
}

impl ActionType {
    /// Check whether this action makes sense for the given target.
    ///
    /// Returns a human-readable skip reason when it does not. Nodes missing
    /// from one snapshot have nothing to compare against, and non-relational
    /// resources (metrics, exposures, semantic models) have no table to
    /// query.
    pub fn applicable_to(&self, target: &ActionTarget) -> Result<(), String> {
        match target.presence {
            Presence::BaseOnly => {
                return Err(format!("{} was removed; nothing to compare in current", target.id))
            }
            Presence::CurrentOnly => {
                return Err(format!("{} was added; nothing to compare in base", target.id))
            }
            Presence::Both => {}
        }

        match self {
            ActionType::RowCountDiff | ActionType::ProfileDiff => {
                if !target.resource_type.is_relational() {
                    return Err(format!(
                        "{} is a {} and has no relation to compare",
                        target.id, target.resource_type
                    ));
                }
            }
            ActionType::ValueDiff => {
                // Value diff joins on a primary key, which only tabular
                // project-owned resources declare.
                if !matches!(
                    target.resource_type,
                    ResourceType::Model | ResourceType::Seed | ResourceType::Snapshot
                ) {
                    return Err(format!(
                        "{} is a {} and cannot be value-diffed",
                        target.id, target.resource_type
                    ));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionType::RowCountDiff => write!(f, "row_count_diff"),
            ActionType::ValueDiff => write!(f, "value_diff"),
            ActionType::ProfileDiff => write!(f, "profile_diff"),
        }
    }
}

/// The slice of node state the orchestrator needs per target.
///
/// Captured from the graph at submission time so the jobs crate does not
/// hold a reference to (or a lock on) the full graph while jobs run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionTarget {
    /// Target node id
    pub id: NodeId,

    /// Which snapshot(s) the node exists in
    pub presence: Presence,

    /// Resource kind
    pub resource_type: ResourceType,
}

impl ActionTarget {
    /// Capture the relevant fields from a graph node.
    pub fn from_node(node: &Node) -> Self {
        Self {
            id: node.id.clone(),
            presence: node.presence,
            resource_type: node.resource_type,
        }
    }
}

/// Caller-supplied parameters forwarded to the job service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionParams {
    /// Primary key column for value diffs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,

    /// Action-specific extras, passed through unexamined
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub extra: serde_json::Value,
}

/// Typed result of a finished comparison job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum ActionResult {
    /// Row counts on both sides
    RowCount { base: u64, current: u64 },
    /// Mismatched rows out of the compared total
    ValueDiff { mismatched: u64, total: u64 },
    /// Result too large to inline; fetch via the job service
    Reference { job_id: JobId },
}

/// Status of a job as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// One poll response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPoll {
    /// Current job status
    pub status: JobStatus,

    /// Completion fraction in `0..=1`, when the service reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,

    /// Typed result, present once `status` is `Completed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ActionResult>,

    /// Failure message, present once `status` is `Failed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// External diff-job service contract.
///
/// Implementations must be Send + Sync for async operation.
#[async_trait]
pub trait DiffJobApi: Send + Sync {
    /// Submit a comparison job for one node, returning its job id
    async fn submit(
        &self,
        action_type: ActionType,
        node: &NodeId,
        params: &ActionParams,
    ) -> JobResult<JobId>;

    /// Poll a job's status and progress
    async fn poll(&self, job_id: &JobId) -> JobResult<JobPoll>;

    /// Request cancellation of an in-flight job
    async fn cancel(&self, job_id: &JobId) -> JobResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(presence: Presence, resource_type: ResourceType) -> ActionTarget {
        ActionTarget {
            id: NodeId::new("model.proj.orders"),
            presence,
            resource_type,
        }
    }

    #[test]
    fn test_row_count_applicable_to_unchanged_model() {
        let t = target(Presence::Both, ResourceType::Model);
        assert!(ActionType::RowCountDiff.applicable_to(&t).is_ok());
    }

    #[test]
    fn test_added_node_not_applicable() {
        let t = target(Presence::CurrentOnly, ResourceType::Model);
        let reason = ActionType::RowCountDiff.applicable_to(&t).unwrap_err();
        assert!(reason.contains("added"));
    }

    #[test]
    fn test_removed_node_not_applicable() {
        let t = target(Presence::BaseOnly, ResourceType::Model);
        let reason = ActionType::ValueDiff.applicable_to(&t).unwrap_err();
        assert!(reason.contains("removed"));
    }

    #[test]
    fn test_metric_has_no_relation() {
        let t = target(Presence::Both, ResourceType::Metric);
        assert!(ActionType::RowCountDiff.applicable_to(&t).is_err());
        assert!(ActionType::ProfileDiff.applicable_to(&t).is_err());
    }

    #[test]
    fn test_value_diff_rejects_source() {
        let t = target(Presence::Both, ResourceType::Source);
        assert!(ActionType::ValueDiff.applicable_to(&t).is_err());
        // but a row count over a source is fine
        assert!(ActionType::RowCountDiff.applicable_to(&t).is_ok());
    }

    #[test]
    fn test_action_result_serde_tag() {
        let result = ActionResult::RowCount { base: 10, current: 12 };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains(r#""type":"row_count""#));
    }
}
