use std::collections::HashSet;

mod chain;

use self::chain::prerequisite_chain;
use super::graph::ViewGraph;

/// Emphasis derived from the selection. Indices refer to the active view.
#[derive(Debug, Default, PartialEq)]
pub(in crate::app) struct HighlightState {
    pub related_nodes: HashSet<usize>,
    pub related_edges: HashSet<usize>,
    pub chain_nodes: HashSet<usize>,
    pub chain_edges: HashSet<usize>,
}

impl HighlightState {
    pub(in crate::app) fn is_empty(&self) -> bool {
        self.related_nodes.is_empty() && self.chain_nodes.is_empty()
    }
}

pub(in crate::app) fn build_highlight_state(view: &ViewGraph, selected: usize) -> HighlightState {
    let mut related_nodes = HashSet::new();
    let mut related_edges = HashSet::new();
    if selected >= view.nodes.len() {
        return HighlightState::default();
    }

    related_nodes.insert(selected);
    for &edge_index in view.outgoing[selected].iter().chain(&view.incoming[selected]) {
        let edge = &view.edges[edge_index];
        related_nodes.insert(edge.source);
        related_nodes.insert(edge.target);
        related_edges.insert(edge_index);
    }

    let (chain_nodes, chain_edges) = prerequisite_chain(view, selected);

    HighlightState {
        related_nodes,
        related_edges,
        chain_nodes,
        chain_edges,
    }
}

/// Highlight for a selected id, if that concept is part of the active view.
pub(in crate::app) fn build_highlight_state_for_selected_id(
    view: &ViewGraph,
    selected_id: &str,
) -> Option<HighlightState> {
    view.index_of(selected_id)
        .map(|selected| build_highlight_state(view, selected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::graph::LayoutSeed;
    use crate::app::physics::LayoutParams;
    use crate::concept::fixtures::{edge, node};
    use crate::concept::{Category, ConceptGraph, EdgeKind, neighborhood};

    fn view(focus: &str) -> ViewGraph {
        // basics -> algebra -> calculus -> limits, calculus -> example
        let graph = ConceptGraph::new(
            vec![
                node("basics", Category::Prerequisite, 8.0),
                node("algebra", Category::Prerequisite, 9.0),
                node("calculus", Category::Definition, 20.0),
                node("example", Category::Example, 5.0),
                node("limits", Category::Definition, 7.0),
            ],
            vec![
                edge("basics", "algebra", EdgeKind::Prerequisite),
                edge("algebra", "calculus", EdgeKind::Prerequisite),
                edge("calculus", "example", EdgeKind::Example),
                edge("calculus", "limits", EdgeKind::Related),
            ],
        );
        ViewGraph::build(
            &neighborhood(&graph, focus),
            LayoutParams::detail(),
            LayoutSeed::Focus { focus_id: focus },
            None,
            1,
        )
    }

    fn ids(view: &ViewGraph, indices: &HashSet<usize>) -> Vec<String> {
        let mut ids = indices
            .iter()
            .map(|&index| view.nodes[index].id.clone())
            .collect::<Vec<_>>();
        ids.sort();
        ids
    }

    #[test]
    fn direct_links_cover_both_directions() {
        let view = view("calculus");
        let state = build_highlight_state_for_selected_id(&view, "calculus").expect("in view");

        assert_eq!(
            ids(&view, &state.related_nodes),
            vec!["algebra", "calculus", "example", "limits"]
        );
        assert_eq!(state.related_edges.len(), 3);
    }

    #[test]
    fn prerequisite_chain_walks_all_ancestors() {
        let view = view("calculus");
        let state = build_highlight_state_for_selected_id(&view, "calculus").expect("in view");

        assert_eq!(ids(&view, &state.chain_nodes), vec!["algebra", "basics"]);
        assert_eq!(state.chain_edges.len(), 2);
    }

    #[test]
    fn non_prerequisite_links_do_not_extend_the_chain() {
        let view = view("calculus");
        let state = build_highlight_state_for_selected_id(&view, "limits").expect("in view");

        assert!(state.chain_nodes.is_empty());
        assert_eq!(ids(&view, &state.related_nodes), vec!["calculus", "limits"]);
    }

    #[test]
    fn selection_outside_view_has_no_highlight() {
        let view = view("example");
        assert!(build_highlight_state_for_selected_id(&view, "basics").is_none());
        assert!(build_highlight_state(&view, 99).is_empty());
    }
}
