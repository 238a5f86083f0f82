//! Error types for ld-engine

use ld_core::LineageError;
use ld_jobs::JobError;
use thiserror::Error;

/// Engine-level errors, wrapping the core and jobs taxonomies.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Graph, view, or selection error
    #[error(transparent)]
    Lineage(#[from] LineageError),

    /// Job API error
    #[error(transparent)]
    Job(#[from] JobError),

    /// G001: An action was requested with nothing to run it against
    #[error("[G001] No nodes selected for {action}")]
    EmptySelection { action: String },

    /// G002: A previous orchestration run is still in flight
    #[error("[G002] An action is already running (run {run_id})")]
    ActionInProgress { run_id: String },
}

/// Result type alias for EngineError
pub type EngineResult<T> = Result<T, EngineError>;
