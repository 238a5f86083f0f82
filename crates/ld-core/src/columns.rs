//! Column-level change summaries between two node snapshots.
//!
//! Computed on demand for the detail panel; never cached on the graph.

use crate::snapshot::NodeSnapshot;
use serde::{Deserialize, Serialize};

/// How a single column changed between base and current.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ColumnChangeStatus {
    /// Column exists only in the current snapshot
    Added,
    /// Column exists only in the base snapshot
    Removed,
    /// Column exists in both with a different type
    TypeChanged { old_type: String, new_type: String },
}

/// A changed column with its classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnChange {
    /// Column name
    pub name: String,

    /// Change classification
    #[serde(flatten)]
    pub status: ColumnChangeStatus,
}

/// Summary of column changes for one node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDiff {
    /// Count of columns added in current
    pub added: usize,

    /// Count of columns removed from base
    pub removed: usize,

    /// Count of columns whose type changed
    pub changed: usize,

    /// Every changed column, sorted by name
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<ColumnChange>,
}

impl ColumnDiff {
    /// Whether any column changed at all.
    pub fn has_changes(&self) -> bool {
        self.added + self.removed + self.changed > 0
    }
}

/// Diff the column maps of two optional snapshots by name.
///
/// A missing snapshot is treated as having no columns, so an added node
/// reports every column as added and a removed node every column as removed.
pub fn diff_columns(base: Option<&NodeSnapshot>, current: Option<&NodeSnapshot>) -> ColumnDiff {
    let mut diff = ColumnDiff::default();

    let empty = std::collections::BTreeMap::new();
    let base_cols = base.map(|s| &s.columns).unwrap_or(&empty);
    let curr_cols = current.map(|s| &s.columns).unwrap_or(&empty);

    for (name, base_def) in base_cols {
        match curr_cols.get(name) {
            None => {
                diff.removed += 1;
                diff.columns.push(ColumnChange {
                    name: name.clone(),
                    status: ColumnChangeStatus::Removed,
                });
            }
            Some(curr_def) if curr_def.data_type != base_def.data_type => {
                diff.changed += 1;
                diff.columns.push(ColumnChange {
                    name: name.clone(),
                    status: ColumnChangeStatus::TypeChanged {
                        old_type: base_def.data_type.clone(),
                        new_type: curr_def.data_type.clone(),
                    },
                });
            }
            Some(_) => {}
        }
    }

    for name in curr_cols.keys() {
        if !base_cols.contains_key(name) {
            diff.added += 1;
            diff.columns.push(ColumnChange {
                name: name.clone(),
                status: ColumnChangeStatus::Added,
            });
        }
    }

    diff.columns.sort_by(|a, b| a.name.cmp(&b.name));
    diff
}
