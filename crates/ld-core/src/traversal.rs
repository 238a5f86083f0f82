//! Bounded and unbounded multi-source reachability.
//!
//! One BFS primitive serves every expansion the engine needs: "select parent
//! nodes" (parents, depth 1), "select all downstream" (children, unbounded),
//! and impact-radius highlighting (parents and children, unbounded). The
//! adjacency is caller-supplied so the same routine works over the merged
//! graph, a visible subgraph, or a column-dependency projection.

use crate::ids::NodeId;
use std::collections::{HashSet, VecDeque};

/// Compute the set of nodes reachable from `seeds` via `neighbors_of`.
///
/// Multi-source BFS. Seeds are always included, even at `max_depth` zero.
/// Depth is counted per BFS layer, so a node reachable at depth 1 from one
/// seed and depth 3 from another is included whenever `max_depth >= 1`.
/// Visited nodes are never re-expanded, which guarantees termination on
/// cyclic adjacency. `None` means unbounded expansion.
pub fn compute_neighbor_set<I, F, N>(seeds: I, mut neighbors_of: F, max_depth: Option<usize>) -> HashSet<NodeId>
where
    I: IntoIterator<Item = NodeId>,
    F: FnMut(&NodeId) -> N,
    N: IntoIterator<Item = NodeId>,
{
    let mut visited: HashSet<NodeId> = HashSet::new();
    let mut queue: VecDeque<(NodeId, usize)> = VecDeque::new();

    for seed in seeds {
        if visited.insert(seed.clone()) {
            queue.push_back((seed, 0));
        }
    }

    while let Some((current, depth)) = queue.pop_front() {
        if let Some(limit) = max_depth {
            if depth >= limit {
                continue;
            }
        }
        for neighbor in neighbors_of(&current) {
            if visited.insert(neighbor.clone()) {
                queue.push_back((neighbor, depth + 1));
            }
        }
    }

    visited
}
