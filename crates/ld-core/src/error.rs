//! Error types for ld-core

use thiserror::Error;

/// Core error type for the lineage diff engine
#[derive(Error, Debug)]
pub enum LineageError {
    /// L001: Selector expression rejected by the evaluator
    #[error("[L001] Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// L002: Node id not present in the merged graph
    #[error("[L002] Node not found: {id}")]
    NodeNotFound { id: String },

    /// L003: Column focus names a column the node does not have
    #[error("[L003] Column '{column}' not found on node '{node}'")]
    ColumnNotFound { node: String, column: String },

    /// L004: Merged lineage contains a cycle
    #[error("[L004] Circular lineage detected: {cycle}")]
    CircularLineage { cycle: String },

    /// L005: Column dependency resolution failed
    #[error("[L005] Column dependency resolution failed for '{node}': {message}")]
    ColumnDependency { node: String, message: String },
}

/// Result type alias for LineageError
pub type LineageResult<T> = Result<T, LineageError>;
