use std::collections::HashSet;

use super::model::{Category, ConceptEdge, ConceptGraph, ConceptNode};

pub const FIRST_ORDER_SIZE_THRESHOLD: f32 = 18.0;

/// Node and edge subset handed to layout and rendering.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConceptView<'a> {
    pub nodes: Vec<&'a ConceptNode>,
    pub edges: Vec<&'a ConceptEdge>,
}

impl ConceptView<'_> {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Top-level concepts: roots (never an edge target), prerequisites, or nodes
/// at least `size_threshold` large. Sorted by size, largest first, stable.
pub fn first_order_nodes(graph: &ConceptGraph, size_threshold: f32) -> Vec<&ConceptNode> {
    let targets = graph
        .edges()
        .iter()
        .map(|edge| edge.target.as_str())
        .collect::<HashSet<_>>();

    let mut ranked = graph
        .nodes()
        .iter()
        .filter(|node| {
            !targets.contains(node.id.as_str())
                || node.category == Category::Prerequisite
                || node.size >= size_threshold
        })
        .collect::<Vec<_>>();

    ranked.sort_by(|a, b| b.size.total_cmp(&a.size));
    ranked
}

pub fn filter_edges_within_node_set<'a, I>(edges: I, node_ids: &HashSet<&str>) -> Vec<&'a ConceptEdge>
where
    I: IntoIterator<Item = &'a ConceptEdge>,
{
    edges
        .into_iter()
        .filter(|edge| {
            node_ids.contains(edge.source.as_str()) && node_ids.contains(edge.target.as_str())
        })
        .collect()
}

pub fn overview(graph: &ConceptGraph, size_threshold: f32) -> ConceptView<'_> {
    let nodes = first_order_nodes(graph, size_threshold);
    let ids = nodes.iter().map(|node| node.id.as_str()).collect();
    let edges = filter_edges_within_node_set(graph.edges(), &ids);
    ConceptView { nodes, edges }
}

/// Two-hop expansion around `focus_id`, in either edge direction. Empty when
/// the focus is not part of the snapshot.
pub fn neighborhood<'a>(graph: &'a ConceptGraph, focus_id: &str) -> ConceptView<'a> {
    if !graph.contains(focus_id) {
        return ConceptView::default();
    }

    let mut hop_one = HashSet::from([focus_id]);
    hop_one.extend(graph.linked_ids(focus_id));

    let mut members = hop_one.clone();
    for id in &hop_one {
        members.extend(graph.linked_ids(id));
    }

    let nodes = graph
        .nodes()
        .iter()
        .filter(|node| members.contains(node.id.as_str()))
        .collect::<Vec<_>>();
    let edges = filter_edges_within_node_set(graph.edges(), &members);

    ConceptView { nodes, edges }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concept::model::EdgeKind;
    use crate::concept::model::tests::{edge, node};

    fn scenario_graph() -> ConceptGraph {
        ConceptGraph::new(
            vec![
                node("A", Category::Definition, 20.0),
                node("B", Category::Prerequisite, 10.0),
                node("C", Category::Example, 5.0),
            ],
            vec![edge("A", "C", EdgeKind::Example)],
        )
    }

    fn chain_graph() -> ConceptGraph {
        // a - b - c - d - e, plus an isolated f
        ConceptGraph::new(
            ["a", "b", "c", "d", "e", "f"]
                .into_iter()
                .map(|id| node(id, Category::Definition, 4.0))
                .collect(),
            vec![
                edge("a", "b", EdgeKind::Related),
                edge("c", "b", EdgeKind::Prerequisite),
                edge("c", "d", EdgeKind::Related),
                edge("d", "e", EdgeKind::Application),
            ],
        )
    }

    fn ids<'a>(nodes: &[&'a ConceptNode]) -> Vec<&'a str> {
        nodes.iter().map(|node| node.id.as_str()).collect()
    }

    #[test]
    fn first_order_scenario_excludes_linked_small_example() {
        let graph = scenario_graph();
        let view = overview(&graph, FIRST_ORDER_SIZE_THRESHOLD);

        assert_eq!(ids(&view.nodes), vec!["A", "B"]);
        assert!(view.edges.is_empty());
    }

    #[test]
    fn large_nodes_qualify_even_with_incoming_edges() {
        let graph = ConceptGraph::new(
            vec![
                node("root", Category::Definition, 2.0),
                node("big", Category::Application, 30.0),
                node("exact", Category::Example, 18.0),
                node("small", Category::Example, 17.9),
            ],
            vec![
                edge("root", "big", EdgeKind::Application),
                edge("root", "exact", EdgeKind::Example),
                edge("root", "small", EdgeKind::Example),
            ],
        );

        let first_order = first_order_nodes(&graph, FIRST_ORDER_SIZE_THRESHOLD);
        assert_eq!(ids(&first_order), vec!["big", "exact", "root"]);
    }

    #[test]
    fn first_order_ties_keep_snapshot_order() {
        let graph = ConceptGraph::new(
            vec![
                node("x", Category::Definition, 7.0),
                node("y", Category::Definition, 9.0),
                node("z", Category::Definition, 7.0),
            ],
            vec![],
        );

        assert_eq!(ids(&first_order_nodes(&graph, 18.0)), vec!["y", "x", "z"]);
    }

    #[test]
    fn first_order_is_idempotent_sorted_subset() {
        let graph = chain_graph();
        let first = first_order_nodes(&graph, FIRST_ORDER_SIZE_THRESHOLD);
        let second = first_order_nodes(&graph, FIRST_ORDER_SIZE_THRESHOLD);

        assert_eq!(first, second);
        assert!(first.iter().all(|node| graph.contains(&node.id)));
        assert!(first.windows(2).all(|pair| pair[0].size >= pair[1].size));
        assert_eq!(ids(&first), vec!["a", "c", "f"]);
    }

    #[test]
    fn neighborhood_stops_after_two_hops() {
        let graph = chain_graph();
        let view = neighborhood(&graph, "a");

        assert_eq!(ids(&view.nodes), vec!["a", "b", "c"]);
        assert_eq!(view.edges.len(), 2);

        let from_middle = neighborhood(&graph, "c");
        assert_eq!(ids(&from_middle.nodes), vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn neighborhood_of_isolated_node_is_itself() {
        let graph = chain_graph();
        let view = neighborhood(&graph, "f");

        assert_eq!(ids(&view.nodes), vec!["f"]);
        assert!(view.edges.is_empty());
    }

    #[test]
    fn missing_focus_yields_empty_view() {
        let graph = chain_graph();
        assert!(neighborhood(&graph, "nope").is_empty());
        assert!(neighborhood(&ConceptGraph::default(), "a").is_empty());
    }

    #[test]
    fn view_edges_never_dangle() {
        let graph = chain_graph();
        for view in [
            overview(&graph, FIRST_ORDER_SIZE_THRESHOLD),
            neighborhood(&graph, "b"),
            neighborhood(&graph, "e"),
        ] {
            let members = view
                .nodes
                .iter()
                .map(|node| node.id.as_str())
                .collect::<HashSet<_>>();
            assert!(view.edges.iter().all(|edge| {
                members.contains(edge.source.as_str()) && members.contains(edge.target.as_str())
            }));
        }
    }

    #[test]
    fn neighborhood_is_deterministic() {
        let graph = chain_graph();
        assert_eq!(neighborhood(&graph, "d"), neighborhood(&graph, "d"));
    }

    #[test]
    fn empty_graph_gives_empty_views() {
        let graph = ConceptGraph::default();
        assert!(overview(&graph, FIRST_ORDER_SIZE_THRESHOLD).is_empty());
        assert!(first_order_nodes(&graph, FIRST_ORDER_SIZE_THRESHOLD).is_empty());
    }
}
