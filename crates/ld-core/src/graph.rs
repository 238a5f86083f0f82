//! Merged lineage graph building and change classification.
//!
//! The builder takes the base and current snapshot maps and merges them into
//! a single graph where every node and edge is annotated with its presence
//! (base-only, current-only, both) and every node with its change status.
//! The graph is rebuilt wholesale whenever new snapshots arrive; there is no
//! incremental mutation.

use crate::error::{LineageError, LineageResult};
use crate::ids::{EdgeId, NodeId};
use crate::snapshot::{NodeSnapshot, ResourceType, SnapshotSet};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Which snapshot(s) a node or edge exists in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    /// Only in the base snapshot
    BaseOnly,
    /// Only in the current snapshot
    CurrentOnly,
    /// In both snapshots
    Both,
}

impl Presence {
    fn merge(self, other: Presence) -> Presence {
        if self == other {
            self
        } else {
            Presence::Both
        }
    }
}

/// Change classification of a node between the two snapshots.
///
/// Absence of a status (`None` on [`Node::change_status`]) means the node is
/// present in both snapshots with an unchanged definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeStatus {
    /// Present only in the current snapshot
    Added,
    /// Present only in the base snapshot
    Removed,
    /// Present in both with differing checksums
    Modified,
}

impl std::fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeStatus::Added => write!(f, "added"),
            ChangeStatus::Removed => write!(f, "removed"),
            ChangeStatus::Modified => write!(f, "modified"),
        }
    }
}

/// A node in the merged lineage graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique node id
    pub id: NodeId,

    /// Human-readable name
    pub name: String,

    /// Resource kind
    pub resource_type: ResourceType,

    /// Package the node belongs to
    pub package_name: String,

    /// Upstream neighbors, keyed by parent node id
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parents: BTreeMap<NodeId, EdgeId>,

    /// Downstream neighbors, keyed by child node id
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub children: BTreeMap<NodeId, EdgeId>,

    /// Which snapshot(s) the node exists in
    pub presence: Presence,

    /// Change classification, `None` when unchanged
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_status: Option<ChangeStatus>,

    /// Base-side snapshot, if present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<NodeSnapshot>,

    /// Current-side snapshot, if present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<NodeSnapshot>,
}

impl Node {
    /// The snapshot to display by default: current if present, else base.
    pub fn latest(&self) -> Option<&NodeSnapshot> {
        self.current.as_ref().or(self.base.as_ref())
    }
}

/// A directed edge from an upstream parent to a downstream child.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    /// Unique edge id (`source->target`)
    pub id: EdgeId,

    /// Upstream (parent) endpoint
    pub source: NodeId,

    /// Downstream (child) endpoint
    pub target: NodeId,

    /// Which snapshot's adjacency the edge appears in
    pub presence: Presence,
}

/// Aggregate change counts for display headers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub total: usize,
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
}

/// The merged, change-annotated lineage graph.
#[derive(Debug, Default)]
pub struct LineageGraph {
    /// All nodes, keyed by id
    nodes: HashMap<NodeId, Node>,

    /// All edges, keyed by id
    edges: HashMap<EdgeId, Edge>,

    /// Nodes with a defined change status
    modified_set: HashSet<NodeId>,

    /// Underlying topology for ordering queries
    graph: DiGraph<NodeId, EdgeId>,

    /// Map from node id to graph index
    node_map: HashMap<NodeId, NodeIndex>,
}

impl LineageGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a base and current snapshot map into an annotated graph.
    ///
    /// Edges referencing a missing endpoint are dropped with a warning;
    /// snapshot data is frequently partial and must never abort the build.
    pub fn build(snapshots: &SnapshotSet) -> Self {
        let mut graph = Self::new();

        // Union of key sets, ordered for deterministic node indices
        let ids: BTreeSet<&NodeId> = snapshots.base.keys().chain(snapshots.current.keys()).collect();

        for id in &ids {
            let base = snapshots.base.get(*id);
            let current = snapshots.current.get(*id);
            graph.insert_node((*id).clone(), base.cloned(), current.cloned());
        }

        // Edges from both adjacency lists; presence reflects which side(s)
        // referenced the pair.
        for id in &ids {
            if let Some(snap) = snapshots.base.get(*id) {
                for parent in &snap.depends_on {
                    graph.insert_edge(parent, id, Presence::BaseOnly);
                }
            }
            if let Some(snap) = snapshots.current.get(*id) {
                for parent in &snap.depends_on {
                    graph.insert_edge(parent, id, Presence::CurrentOnly);
                }
            }
        }

        graph
    }

    fn insert_node(&mut self, id: NodeId, base: Option<NodeSnapshot>, current: Option<NodeSnapshot>) {
        let (presence, change_status) = match (&base, &current) {
            (Some(_), None) => (Presence::BaseOnly, Some(ChangeStatus::Removed)),
            (None, Some(_)) => (Presence::CurrentOnly, Some(ChangeStatus::Added)),
            (Some(b), Some(c)) => {
                let status = if b.checksum != c.checksum {
                    Some(ChangeStatus::Modified)
                } else {
                    None
                };
                (Presence::Both, status)
            }
            (None, None) => unreachable!("node id came from the union of both key sets"),
        };

        // Display metadata comes from the current side when available
        let latest = current
            .as_ref()
            .or(base.as_ref())
            .expect("at least one snapshot present");

        let node = Node {
            id: id.clone(),
            name: latest.name.clone(),
            resource_type: latest.resource_type,
            package_name: latest.package_name.clone(),
            parents: BTreeMap::new(),
            children: BTreeMap::new(),
            presence,
            change_status,
            base,
            current,
        };

        if change_status.is_some() {
            self.modified_set.insert(id.clone());
        }
        let idx = self.graph.add_node(id.clone());
        self.node_map.insert(id.clone(), idx);
        self.nodes.insert(id, node);
    }

    fn insert_edge(&mut self, source: &NodeId, target: &NodeId, presence: Presence) {
        if !self.nodes.contains_key(source) {
            log::warn!(
                "dropping edge {} -> {}: source not in either snapshot",
                source,
                target
            );
            return;
        }
        if !self.nodes.contains_key(target) {
            log::warn!(
                "dropping edge {} -> {}: target not in either snapshot",
                source,
                target
            );
            return;
        }

        let id = EdgeId::for_pair(source, target);
        if let Some(existing) = self.edges.get_mut(&id) {
            existing.presence = existing.presence.merge(presence);
            return;
        }

        self.edges.insert(
            id.clone(),
            Edge {
                id: id.clone(),
                source: source.clone(),
                target: target.clone(),
                presence,
            },
        );

        let src_idx = self.node_map[source];
        let tgt_idx = self.node_map[target];
        self.graph.add_edge(src_idx, tgt_idx, id.clone());

        if let Some(node) = self.nodes.get_mut(target) {
            node.parents.insert(source.clone(), id.clone());
        }
        if let Some(node) = self.nodes.get_mut(source) {
            node.children.insert(target.clone(), id);
        }
    }

    /// Look up a node by id.
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Look up an edge by id.
    pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    /// All nodes, keyed by id.
    pub fn nodes(&self) -> &HashMap<NodeId, Node> {
        &self.nodes
    }

    /// All edges, keyed by id.
    pub fn edges(&self) -> &HashMap<EdgeId, Edge> {
        &self.edges
    }

    /// Nodes with a defined change status.
    pub fn modified_set(&self) -> &HashSet<NodeId> {
        &self.modified_set
    }

    /// Check if a node exists in the merged graph.
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of nodes in the merged graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the merged graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Direct upstream neighbors of a node.
    pub fn parents_of(&self, id: &NodeId) -> Vec<NodeId> {
        self.nodes
            .get(id)
            .map(|n| n.parents.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Direct downstream neighbors of a node.
    pub fn children_of(&self, id: &NodeId) -> Vec<NodeId> {
        self.nodes
            .get(id)
            .map(|n| n.children.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Direct neighbors in both directions, used for impact-radius seeds.
    pub fn neighbors_of(&self, id: &NodeId) -> Vec<NodeId> {
        let mut out = self.parents_of(id);
        out.extend(self.children_of(id));
        out
    }

    /// Nodes in topological order (parents before children).
    ///
    /// The merged topology of two acyclic project states is normally acyclic
    /// itself, but nothing guarantees it once edges from both sides are
    /// combined, so a cycle is reported rather than assumed away.
    pub fn topological_order(&self) -> LineageResult<Vec<NodeId>> {
        match toposort(&self.graph, None) {
            Ok(indices) => Ok(indices
                .into_iter()
                .map(|idx| self.graph[idx].clone())
                .collect()),
            Err(cycle) => {
                let start = self.graph[cycle.node_id()].clone();
                Err(LineageError::CircularLineage {
                    cycle: self.cycle_path_from(&start),
                })
            }
        }
    }

    /// Follow child links from `start` until a node repeats, for error
    /// reporting. The walk runs over the merged adjacency, so the reported
    /// path can mix edges that exist only on one snapshot side.
    fn cycle_path_from(&self, start: &NodeId) -> String {
        let mut path = vec![start.clone()];
        let mut seen: HashSet<NodeId> = path.iter().cloned().collect();
        let mut current = start.clone();

        while let Some(next) = self
            .nodes
            .get(&current)
            .and_then(|n| n.children.keys().next())
            .cloned()
        {
            let repeated = !seen.insert(next.clone());
            path.push(next.clone());
            if repeated {
                break;
            }
            current = next;
        }

        path.iter()
            .map(NodeId::as_str)
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    /// Aggregate change counts.
    pub fn summary(&self) -> GraphSummary {
        let mut summary = GraphSummary {
            total: self.nodes.len(),
            ..GraphSummary::default()
        };
        for node in self.nodes.values() {
            match node.change_status {
                Some(ChangeStatus::Added) => summary.added += 1,
                Some(ChangeStatus::Removed) => summary.removed += 1,
                Some(ChangeStatus::Modified) => summary.modified += 1,
                None => {}
            }
        }
        summary
    }
}

#[cfg(test)]
#[path = "graph_test.rs"]
mod tests;
