//! Strongly-typed identifiers for graph entities.

use crate::newtype_string::define_id_string;

define_id_string! {
    /// Unique identifier of a lineage node.
    ///
    /// Node ids come from the snapshot provider (for dbt-style projects this
    /// is the manifest unique id, e.g. `model.jaffle_shop.orders`) and are
    /// stable across the base and current snapshots.
    pub struct NodeId;
}

define_id_string! {
    /// Unique identifier of a lineage edge.
    ///
    /// Edge ids are synthesized by the graph builder as `source->target` and
    /// are unique because at most one edge exists per ordered node pair.
    pub struct EdgeId;
}

impl EdgeId {
    /// Canonical edge id for the ordered pair `source -> target`.
    pub fn for_pair(source: &NodeId, target: &NodeId) -> Self {
        Self::new(format!("{}->{}", source, target))
    }
}
