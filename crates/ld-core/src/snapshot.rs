//! Snapshot input types supplied by the external snapshot provider.
//!
//! A snapshot is a point-in-time capture of a project's node metadata: one
//! entry per node with its columns, parent adjacency, and an opaque checksum
//! used for modification detection. The engine receives a base and a current
//! snapshot and never parses project files itself.

use crate::ids::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Resource kind of a lineage node.
///
/// Mirrors the resource types a dbt-style project exposes in its manifest.
/// The set is closed; unknown kinds are a deserialization error rather than
/// a silently-accepted string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    /// SQL transformation model
    Model,
    /// External data source definition
    Source,
    /// CSV seed data
    Seed,
    /// Point-in-time snapshot table
    Snapshot,
    /// Metric definition
    Metric,
    /// Downstream exposure (dashboard, app)
    Exposure,
    /// Semantic-layer model
    SemanticModel,
}

impl ResourceType {
    /// Whether this resource materializes as a queryable relation.
    ///
    /// Metrics, exposures, and semantic models are definitions layered on
    /// top of relations; there is no table to run a comparison against.
    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            ResourceType::Model | ResourceType::Source | ResourceType::Seed | ResourceType::Snapshot
        )
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceType::Model => write!(f, "model"),
            ResourceType::Source => write!(f, "source"),
            ResourceType::Seed => write!(f, "seed"),
            ResourceType::Snapshot => write!(f, "snapshot"),
            ResourceType::Metric => write!(f, "metric"),
            ResourceType::Exposure => write!(f, "exposure"),
            ResourceType::SemanticModel => write!(f, "semantic_model"),
        }
    }
}

/// Column definition within a node snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Declared or inferred data type, as reported by the provider
    #[serde(rename = "type")]
    pub data_type: String,
}

/// Point-in-time metadata for a single node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    /// Human-readable name (not necessarily unique across packages)
    pub name: String,

    /// Resource kind
    pub resource_type: ResourceType,

    /// Package the node belongs to
    pub package_name: String,

    /// Opaque equality key over the node's definition.
    ///
    /// Two snapshots of the same node with equal checksums are treated as
    /// unmodified; the engine never inspects the checksum's contents.
    pub checksum: String,

    /// Columns keyed by name, ordered for stable serialization
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub columns: BTreeMap<String, ColumnDef>,

    /// Parent node ids (upstream dependencies)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<NodeId>,

    /// Resource-specific metadata, passed through unexamined
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub meta: serde_json::Value,
}

impl NodeSnapshot {
    /// Create a snapshot with no columns, dependencies, or metadata.
    pub fn new(
        name: impl Into<String>,
        resource_type: ResourceType,
        package_name: impl Into<String>,
        checksum: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            resource_type,
            package_name: package_name.into(),
            checksum: checksum.into(),
            columns: BTreeMap::new(),
            depends_on: Vec::new(),
            meta: serde_json::Value::Null,
        }
    }

    /// Builder-style helper to attach a column.
    pub fn with_column(mut self, name: impl Into<String>, data_type: impl Into<String>) -> Self {
        self.columns.insert(
            name.into(),
            ColumnDef {
                data_type: data_type.into(),
            },
        );
        self
    }

    /// Builder-style helper to attach parent dependencies.
    pub fn with_parents(mut self, parents: impl IntoIterator<Item = NodeId>) -> Self {
        self.depends_on.extend(parents);
        self
    }
}

/// The pair of snapshots a diff session operates on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotSet {
    /// Nodes as of the base (reference) state
    #[serde(default)]
    pub base: HashMap<NodeId, NodeSnapshot>,

    /// Nodes as of the current (working) state
    #[serde(default)]
    pub current: HashMap<NodeId, NodeSnapshot>,
}

impl SnapshotSet {
    /// Create an empty snapshot set.
    pub fn new() -> Self {
        Self::default()
    }
}
