//! ld-engine - The stateful façade over the lineage diff engine
//!
//! One `LineageEngine` object owns all mutable session state: the merged
//! graph, view options and the resolved visible subgraph, selection and
//! focus, and the active comparison-action run. Display layers interact
//! through its operations and read immutable snapshots; nothing else in
//! the workspace holds mutable view state.

pub mod engine;
pub mod error;

pub use engine::{EngineConfig, EngineSnapshot, LineageEngine};
pub use error::{EngineError, EngineResult};
