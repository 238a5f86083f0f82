//! ld-jobs - Comparison-job orchestration for lineagediff
//!
//! This crate owns everything asynchronous about running comparison actions:
//! the diff-job service contract, the per-run/per-node state machine, and
//! the orchestrator that fans jobs out across the selected nodes with
//! progress tracking, cancellation, and partial-failure isolation.

pub mod action;
pub mod api;
pub mod error;
pub mod orchestrator;

pub use action::{
    ActionMode, ActionState, NodeAction, NodeActionStatus, OrchestrationStatus, SkipReason,
};
pub use api::{
    ActionParams, ActionResult, ActionTarget, ActionType, DiffJobApi, JobId, JobPoll, JobStatus,
};
pub use error::{JobError, JobResult};
pub use orchestrator::OrchestratorHandle;
