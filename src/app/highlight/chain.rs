use std::collections::{HashSet, VecDeque};

use crate::concept::EdgeKind;

use super::super::graph::ViewGraph;

/// Every ancestor of `selected` reachable backwards over prerequisite edges,
/// with the edges walked. The selected node itself is not included.
pub(super) fn prerequisite_chain(
    view: &ViewGraph,
    selected: usize,
) -> (HashSet<usize>, HashSet<usize>) {
    let mut chain_nodes = HashSet::new();
    let mut chain_edges = HashSet::new();
    if selected >= view.nodes.len() {
        return (chain_nodes, chain_edges);
    }

    let mut visited = vec![false; view.nodes.len()];
    visited[selected] = true;
    let mut queue = VecDeque::from([selected]);

    while let Some(node) = queue.pop_front() {
        for &edge_index in &view.incoming[node] {
            let edge = &view.edges[edge_index];
            if edge.kind != EdgeKind::Prerequisite {
                continue;
            }

            chain_edges.insert(edge_index);
            if !visited[edge.source] {
                visited[edge.source] = true;
                chain_nodes.insert(edge.source);
                queue.push_back(edge.source);
            }
        }
    }

    (chain_nodes, chain_edges)
}
