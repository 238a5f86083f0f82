//! Error types for ld-jobs

use thiserror::Error;

/// Job API and orchestration errors
#[derive(Error, Debug)]
pub enum JobError {
    /// J001: Job submission rejected or unreachable
    #[error("[J001] Failed to submit {action} job for {node}: {message}")]
    SubmitFailed {
        action: String,
        node: String,
        message: String,
    },

    /// J002: Polling an in-flight job failed
    #[error("[J002] Failed to poll job {job_id}: {message}")]
    PollFailed { job_id: String, message: String },

    /// J003: Cancelling an in-flight job failed
    #[error("[J003] Failed to cancel job {job_id}: {message}")]
    CancelFailed { job_id: String, message: String },
}

/// Result type alias for JobError
pub type JobResult<T> = Result<T, JobError>;
