//! ld-core - Core library for lineagediff
//!
//! This crate provides the pure parts of the lineage diff engine: merging
//! base and current snapshots into a change-annotated graph, column-level
//! diff summaries, bounded/unbounded reachability, declarative view
//! filtering, and selection/highlight state.

pub mod columns;
pub mod error;
pub mod graph;
pub mod ids;
mod newtype_string;
pub mod selection;
pub mod snapshot;
pub mod traversal;
pub mod view;

pub use columns::{diff_columns, ColumnChange, ColumnChangeStatus, ColumnDiff};
pub use error::{LineageError, LineageResult};
pub use graph::{ChangeStatus, Edge, GraphSummary, LineageGraph, Node, Presence};
pub use ids::{EdgeId, NodeId};
pub use selection::{
    highlight_scope, ColumnDependencyResolver, HighlightScope, SelectionMode, SelectionState,
};
pub use snapshot::{ColumnDef, NodeSnapshot, ResourceType, SnapshotSet};
pub use traversal::compute_neighbor_set;
pub use view::{
    resolve_view, validate_column_focus, ColumnFocus, SelectorEvaluator, ViewMode, ViewOptions,
    VisibleSubgraph,
};
