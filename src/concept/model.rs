use std::collections::{HashMap, HashSet};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

pub const DEFAULT_NODE_SIZE: f32 = 10.0;
pub const DEFAULT_EDGE_STRENGTH: f32 = 0.5;
pub const MIN_EDGE_STRENGTH: f32 = 0.05;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Definition,
    Example,
    Application,
    Prerequisite,
}

impl Category {
    pub const ALL: [Self; 4] = [
        Self::Definition,
        Self::Example,
        Self::Application,
        Self::Prerequisite,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Definition => "definition",
            Self::Example => "example",
            Self::Application => "application",
            Self::Prerequisite => "prerequisite",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.label().eq_ignore_ascii_case(value))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Prerequisite,
    Related,
    Example,
    Application,
}

impl EdgeKind {
    pub const ALL: [Self; 4] = [
        Self::Prerequisite,
        Self::Related,
        Self::Example,
        Self::Application,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Prerequisite => "prerequisite",
            Self::Related => "related",
            Self::Example => "example",
            Self::Application => "application",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(value))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConceptNode {
    pub id: String,
    pub label: String,
    pub description: String,
    pub category: Category,
    pub size: f32,
    /// Seconds into the video, in the order the payload listed them.
    pub timestamps: Vec<f64>,
}

impl ConceptNode {
    /// Playback target used when the node is clicked.
    pub fn seek_target(&self) -> Option<f64> {
        self.timestamps.first().copied()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConceptEdge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
    pub strength: f32,
}

/// One immutable graph snapshot. Edges always reference existing nodes.
#[derive(Clone, Debug, Default)]
pub struct ConceptGraph {
    nodes: Vec<ConceptNode>,
    edges: Vec<ConceptEdge>,
    index_by_id: HashMap<String, usize>,
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
}

impl ConceptGraph {
    pub fn new(nodes: Vec<ConceptNode>, edges: Vec<ConceptEdge>) -> Self {
        let mut index_by_id = HashMap::with_capacity(nodes.len());
        let mut kept_nodes = Vec::with_capacity(nodes.len());

        for mut node in nodes {
            if index_by_id.contains_key(&node.id) {
                warn!("dropping duplicate concept id {:?}", node.id);
                continue;
            }

            if !node.size.is_finite() {
                warn!("concept {:?} has non-finite size; using default", node.id);
            }
            node.size = sanitize_size(node.size);
            node.timestamps
                .retain(|timestamp| timestamp.is_finite() && *timestamp >= 0.0);
            index_by_id.insert(node.id.clone(), kept_nodes.len());
            kept_nodes.push(node);
        }

        let total_edges = edges.len();
        let mut kept_edges = Vec::with_capacity(edges.len());
        let mut outgoing = vec![Vec::new(); kept_nodes.len()];
        let mut incoming = vec![Vec::new(); kept_nodes.len()];

        for mut edge in edges {
            let (Some(&source), Some(&target)) =
                (index_by_id.get(&edge.source), index_by_id.get(&edge.target))
            else {
                debug!(
                    "dropping dangling edge {:?} -> {:?}",
                    edge.source, edge.target
                );
                continue;
            };

            edge.strength = sanitize_strength(edge.strength);
            outgoing[source].push(kept_edges.len());
            incoming[target].push(kept_edges.len());
            kept_edges.push(edge);
        }

        if kept_edges.len() < total_edges {
            debug!(
                "dropped {} of {} edges with unknown endpoints",
                total_edges - kept_edges.len(),
                total_edges
            );
        }

        Self {
            nodes: kept_nodes,
            edges: kept_edges,
            index_by_id,
            outgoing,
            incoming,
        }
    }

    pub fn nodes(&self) -> &[ConceptNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[ConceptEdge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&ConceptNode> {
        self.index_by_id.get(id).map(|&index| &self.nodes[index])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_by_id.contains_key(id)
    }

    pub fn outgoing_edges(&self, id: &str) -> impl Iterator<Item = &ConceptEdge> {
        self.edge_list(id, &self.outgoing)
    }

    pub fn incoming_edges(&self, id: &str) -> impl Iterator<Item = &ConceptEdge> {
        self.edge_list(id, &self.incoming)
    }

    /// Ids linked to `id` in either direction, without duplicates.
    pub fn linked_ids(&self, id: &str) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.outgoing_edges(id)
            .map(|edge| edge.target.as_str())
            .chain(self.incoming_edges(id).map(|edge| edge.source.as_str()))
            .filter(|linked| seen.insert(*linked))
            .collect()
    }

    pub fn latest_timestamp(&self) -> Option<f64> {
        self.nodes
            .iter()
            .flat_map(|node| node.timestamps.iter().copied())
            .reduce(f64::max)
    }

    fn edge_list<'a>(
        &'a self,
        id: &str,
        lists: &'a [Vec<usize>],
    ) -> impl Iterator<Item = &'a ConceptEdge> {
        self.index_by_id
            .get(id)
            .and_then(|&index| lists.get(index))
            .into_iter()
            .flatten()
            .map(|&edge_index| &self.edges[edge_index])
    }
}

fn sanitize_size(size: f32) -> f32 {
    if size.is_finite() {
        size.max(0.0)
    } else {
        DEFAULT_NODE_SIZE
    }
}

fn sanitize_strength(strength: f32) -> f32 {
    if strength.is_finite() && strength > 0.0 {
        strength.clamp(MIN_EDGE_STRENGTH, 1.0)
    } else {
        MIN_EDGE_STRENGTH
    }
}
