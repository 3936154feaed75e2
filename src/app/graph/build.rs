use std::collections::HashMap;
use std::f32::consts::{PI, TAU};

use eframe::egui::{Vec2, vec2};

use crate::concept::{Category, ConceptView, EdgeKind};
use crate::util::stable_pair;

use super::super::physics::{Body, LayoutParams, Link, Simulation};

const SEED_JITTER: f32 = 12.0;
const PHYLLOTAXIS_SPACING: f32 = 34.0;
const RADIAL_BIAS_FRACTION: f32 = 0.3;

pub(in crate::app) struct ViewNode {
    pub id: String,
    pub label: String,
    pub category: Category,
    pub size: f32,
    pub timestamps: Vec<f64>,
    pub is_active: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct ViewEdge {
    pub source: usize,
    pub target: usize,
    pub kind: EdgeKind,
    pub strength: f32,
}

/// How a freshly built view places its bodies before the first tick.
pub(in crate::app) enum LayoutSeed<'a> {
    /// First-order nodes on a hub circle, in rank order.
    Hub { viewport_size: Vec2 },
    /// Focus at the origin, the rest spiralling outward.
    Focus { focus_id: &'a str },
}

/// Laid-out node/edge set of the active view.
pub(in crate::app) struct ViewGraph {
    pub nodes: Vec<ViewNode>,
    pub edges: Vec<ViewEdge>,
    pub index_by_id: HashMap<String, usize>,
    pub outgoing: Vec<Vec<usize>>,
    pub incoming: Vec<Vec<usize>>,
    pub simulation: Simulation,
    pub revision: u64,
}

impl ViewGraph {
    pub(in crate::app) fn build(
        view: &ConceptView<'_>,
        params: LayoutParams,
        seed: LayoutSeed<'_>,
        prior_positions: Option<&HashMap<String, Vec2>>,
        revision: u64,
    ) -> Self {
        let nodes = view
            .nodes
            .iter()
            .map(|node| ViewNode {
                id: node.id.clone(),
                label: node.label.clone(),
                category: node.category,
                size: node.size,
                timestamps: node.timestamps.clone(),
                is_active: false,
            })
            .collect::<Vec<_>>();

        let mut index_by_id = HashMap::with_capacity(nodes.len());
        for (index, node) in nodes.iter().enumerate() {
            index_by_id.insert(node.id.clone(), index);
        }

        let edges = view
            .edges
            .iter()
            .filter_map(|edge| {
                let source = *index_by_id.get(&edge.source)?;
                let target = *index_by_id.get(&edge.target)?;
                Some(ViewEdge {
                    source,
                    target,
                    kind: edge.kind,
                    strength: edge.strength,
                })
            })
            .collect::<Vec<_>>();

        let mut outgoing = vec![Vec::new(); nodes.len()];
        let mut incoming = vec![Vec::new(); nodes.len()];
        for (edge_index, edge) in edges.iter().enumerate() {
            outgoing[edge.source].push(edge_index);
            incoming[edge.target].push(edge_index);
        }

        let mut bodies = seed_bodies(&nodes, &seed);
        if let Some(prior) = prior_positions {
            for (body, node) in bodies.iter_mut().zip(&nodes) {
                if let Some(&position) = prior.get(&node.id) {
                    body.position = position;
                }
            }
        }

        let links = edges
            .iter()
            .map(|edge| Link {
                source: edge.source,
                target: edge.target,
                strength: edge.strength,
            })
            .collect();

        Self {
            simulation: Simulation::new(bodies, links, params),
            nodes,
            edges,
            index_by_id,
            outgoing,
            incoming,
            revision,
        }
    }

    pub(in crate::app) fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(in crate::app) fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub(in crate::app) fn position(&self, index: usize) -> Vec2 {
        self.simulation.position(index).unwrap_or(Vec2::ZERO)
    }

    pub(in crate::app) fn positions_by_id(&self) -> HashMap<String, Vec2> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.clone(), self.position(index)))
            .collect()
    }

    /// Moves the overview radial targets onto the hub circle of a resized
    /// canvas. Bodies without a radial target are left alone.
    pub(in crate::app) fn retarget_hub(&mut self, viewport_size: Vec2) -> bool {
        let count = self.nodes.len();
        let mut changed = false;
        for rank in 0..count {
            let Some(current) = self
                .simulation
                .bodies()
                .get(rank)
                .and_then(|body| body.radial_target_y)
            else {
                continue;
            };
            let target = hub_slot(rank, count, viewport_size).y;
            if (target - current).abs() > f32::EPSILON {
                self.simulation.set_radial_target(rank, Some(target));
                changed = true;
            }
        }
        changed
    }

    /// Render-time emphasis: an edge is active when either endpoint is.
    pub(in crate::app) fn edge_is_active(&self, edge: &ViewEdge) -> bool {
        self.nodes
            .get(edge.source)
            .is_some_and(|node| node.is_active)
            || self.nodes.get(edge.target).is_some_and(|node| node.is_active)
    }
}

fn jitter(id: &str) -> Vec2 {
    let (jx, jy) = stable_pair(id);
    vec2(jx, jy) * SEED_JITTER
}

fn hub_slot(rank: usize, count: usize, viewport_size: Vec2) -> Vec2 {
    let radius = RADIAL_BIAS_FRACTION * viewport_size.x.min(viewport_size.y).max(1.0);
    let angle = rank as f32 / count.max(1) as f32 * TAU;
    vec2(angle.cos(), angle.sin()) * radius
}

fn seed_bodies(nodes: &[ViewNode], seed: &LayoutSeed<'_>) -> Vec<Body> {
    match seed {
        LayoutSeed::Hub { viewport_size } => nodes
            .iter()
            .enumerate()
            .map(|(rank, node)| {
                let slot = hub_slot(rank, nodes.len(), *viewport_size);
                let mut body = Body::new(slot + jitter(&node.id), node.size);
                body.radial_target_y = Some(slot.y);
                body
            })
            .collect(),
        LayoutSeed::Focus { focus_id } => {
            let golden_angle = PI * (3.0 - 5.0_f32.sqrt());
            let mut ring = 0usize;
            nodes
                .iter()
                .map(|node| {
                    if node.id == *focus_id {
                        return Body::new(Vec2::ZERO, node.size);
                    }
                    ring += 1;
                    let radius = PHYLLOTAXIS_SPACING * (0.5 + ring as f32).sqrt();
                    let angle = ring as f32 * golden_angle;
                    Body::new(
                        vec2(angle.cos(), angle.sin()) * radius + jitter(&node.id),
                        node.size,
                    )
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concept::fixtures::{edge, node};
    use crate::concept::{ConceptGraph, neighborhood, overview};

    fn graph() -> ConceptGraph {
        ConceptGraph::new(
            vec![
                node("hub", Category::Definition, 30.0),
                node("pre", Category::Prerequisite, 12.0),
                node("leaf", Category::Example, 6.0),
                node("far", Category::Application, 4.0),
            ],
            vec![
                edge("pre", "hub", EdgeKind::Prerequisite),
                edge("hub", "leaf", EdgeKind::Example),
                edge("leaf", "far", EdgeKind::Application),
            ],
        )
    }

    #[test]
    fn overview_seeds_hub_circle_in_rank_order() {
        let graph = graph();
        let view = overview(&graph, 18.0);
        let size = vec2(1000.0, 600.0);
        let built = ViewGraph::build(
            &view,
            LayoutParams::overview(),
            LayoutSeed::Hub {
                viewport_size: size,
            },
            None,
            1,
        );

        let ids = built.nodes.iter().map(|node| node.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["hub", "pre"]);

        let bodies = built.simulation.bodies();
        assert_eq!(bodies[0].radial_target_y, Some(0.0));
        let second_target = bodies[1].radial_target_y.expect("radial target");
        assert!(second_target.abs() < 1e-3, "second slot sits opposite on the circle");
        assert!((bodies[0].position.x - 180.0).abs() <= SEED_JITTER + 1e-3);
        assert_eq!(built.edges.len(), 1);
    }

    #[test]
    fn retarget_hub_follows_canvas_size() {
        let graph = graph();
        let mut built = ViewGraph::build(
            &overview(&graph, 0.0),
            LayoutParams::overview(),
            LayoutSeed::Hub {
                viewport_size: vec2(1280.0, 800.0),
            },
            None,
            1,
        );
        assert!(built.retarget_hub(vec2(400.0, 300.0)));

        let targets = built
            .simulation
            .bodies()
            .iter()
            .map(|body| body.radial_target_y.expect("overview target"))
            .collect::<Vec<_>>();
        assert_eq!(targets.len(), 4);
        assert!(targets[0].abs() < 1e-3);
        assert!((targets[1] - 90.0).abs() < 1e-3);
        assert!((targets[3] + 90.0).abs() < 1e-3);
        assert!(!built.retarget_hub(vec2(400.0, 300.0)));
    }

    #[test]
    fn detail_seeds_focus_at_origin() {
        let graph = graph();
        let view = neighborhood(&graph, "leaf");
        let built = ViewGraph::build(
            &view,
            LayoutParams::detail(),
            LayoutSeed::Focus { focus_id: "leaf" },
            None,
            2,
        );

        let focus = built.index_of("leaf").expect("focus present");
        assert_eq!(built.position(focus), Vec2::ZERO);
        assert!(built.simulation.bodies().iter().all(|body| body.radial_target_y.is_none()));
        assert_eq!(built.nodes.len(), 4);
        assert_eq!(built.edges.len(), 3);
        assert_eq!(built.outgoing[focus].len(), 1);
        assert_eq!(built.incoming[focus].len(), 1);
    }

    #[test]
    fn prior_positions_seed_shared_nodes() {
        let graph = graph();
        let prior = HashMap::from([("pre".to_owned(), vec2(77.0, -33.0))]);
        let built = ViewGraph::build(
            &neighborhood(&graph, "hub"),
            LayoutParams::detail(),
            LayoutSeed::Focus { focus_id: "hub" },
            Some(&prior),
            3,
        );

        let pre = built.index_of("pre").expect("pre present");
        assert_eq!(built.position(pre), vec2(77.0, -33.0));
    }

    #[test]
    fn edge_emphasis_follows_either_endpoint() {
        let graph = graph();
        let mut built = ViewGraph::build(
            &neighborhood(&graph, "hub"),
            LayoutParams::detail(),
            LayoutSeed::Focus { focus_id: "hub" },
            None,
            4,
        );
        let edge = built.edges[0];
        assert!(!built.edge_is_active(&edge));

        built.nodes[edge.target].is_active = true;
        assert!(built.edge_is_active(&edge));
    }
}
