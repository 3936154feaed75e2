use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::util::parse_clock;

use super::model::{
    Category, ConceptEdge, ConceptGraph, ConceptNode, DEFAULT_EDGE_STRENGTH, DEFAULT_NODE_SIZE,
    EdgeKind,
};

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("graph payload is not valid JSON")]
    Json(#[from] serde_json::Error),
    #[error("graph payload must be a JSON object")]
    NotAnObject,
    #[error("graph payload has no `nodes` collection")]
    MissingNodes,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawNodes {
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

#[derive(Debug, Deserialize)]
struct RawNode {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    size: Option<f64>,
    #[serde(default)]
    timestamps: Vec<RawTimestamp>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Seconds(f64),
    Clock(String),
}

impl RawTimestamp {
    fn seconds(&self) -> Option<f64> {
        match self {
            Self::Seconds(value) => Some(*value),
            Self::Clock(value) => parse_clock(value),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawEdge {
    source: String,
    target: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    strength: Option<f64>,
}

pub fn parse_graph_payload(raw: &str) -> Result<ConceptGraph, PayloadError> {
    let parsed: Value = serde_json::from_str(raw)?;
    let object = parsed.as_object().ok_or(PayloadError::NotAnObject)?;

    let body = match object.get("graph") {
        Some(inner) if !object.contains_key("nodes") => {
            inner.as_object().ok_or(PayloadError::NotAnObject)?
        }
        _ => object,
    };

    let raw_nodes = body.get("nodes").ok_or(PayloadError::MissingNodes)?;
    let raw_nodes = RawNodes::deserialize(raw_nodes)?;

    let nodes = match raw_nodes {
        RawNodes::List(entries) => entries
            .iter()
            .enumerate()
            .filter_map(|(position, entry)| {
                let entry = raw_entry::<RawNode>(entry, "concept", position)?;
                let Some(id) = entry.id.clone().filter(|id| !id.trim().is_empty()) else {
                    warn!("skipping concept #{position} without an id");
                    return None;
                };
                Some(concept_node(id, entry))
            })
            .collect::<Vec<_>>(),
        RawNodes::Map(entries) => entries
            .iter()
            .enumerate()
            .filter_map(|(position, (key, entry))| {
                let entry = raw_entry::<RawNode>(entry, "concept", position)?;
                Some(concept_node(key.clone(), entry))
            })
            .collect::<Vec<_>>(),
    };

    let edges = match body.get("edges").and_then(Value::as_array) {
        Some(raw_edges) => raw_edges
            .iter()
            .enumerate()
            .filter_map(|(position, entry)| raw_entry::<RawEdge>(entry, "link", position))
            .map(concept_edge)
            .collect(),
        None => {
            if body.get("edges").is_some_and(|edges| !edges.is_null()) {
                warn!("ignoring `edges` that is not a list");
            }
            Vec::new()
        }
    };

    Ok(ConceptGraph::new(nodes, edges))
}

/// One list entry, or `None` with a warning when it does not have the expected shape.
fn raw_entry<T: DeserializeOwned>(entry: &Value, what: &str, position: usize) -> Option<T> {
    match T::deserialize(entry) {
        Ok(raw) => Some(raw),
        Err(error) => {
            warn!("skipping malformed {what} #{position}: {error}");
            None
        }
    }
}

pub fn load_graph_file(path: &Path) -> Result<ConceptGraph> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read graph payload {}", path.display()))?;
    let graph = parse_graph_payload(&raw)
        .with_context(|| format!("failed to parse graph payload {}", path.display()))?;

    info!(
        "loaded {} concepts and {} links from {}",
        graph.node_count(),
        graph.edge_count(),
        path.display()
    );
    Ok(graph)
}

fn concept_node(id: String, raw: RawNode) -> ConceptNode {
    let category = match raw.category.as_deref() {
        Some(value) => Category::parse(value).unwrap_or_else(|| {
            warn!("concept {id:?} has unknown category {value:?}; treating as definition");
            Category::Definition
        }),
        None => Category::Definition,
    };

    let timestamps = raw
        .timestamps
        .iter()
        .filter_map(RawTimestamp::seconds)
        .collect();

    let size = raw
        .size
        .map(|size| concept_size(&id, size))
        .unwrap_or(DEFAULT_NODE_SIZE);

    ConceptNode {
        label: raw
            .label
            .filter(|label| !label.trim().is_empty())
            .unwrap_or_else(|| id.clone()),
        id,
        description: raw.description,
        category,
        size,
        timestamps,
    }
}

fn concept_size(id: &str, size: f64) -> f32 {
    if size.is_finite() && size.abs() > f64::from(f32::MAX) {
        warn!("concept {id:?} has out-of-range size {size}; clamping");
        return f32::MAX.copysign(size as f32);
    }
    size as f32
}

fn concept_edge(raw: RawEdge) -> ConceptEdge {
    let kind = match raw.kind.as_deref() {
        Some(value) => EdgeKind::parse(value).unwrap_or(EdgeKind::Related),
        None => EdgeKind::Related,
    };

    ConceptEdge {
        source: raw.source,
        target: raw.target,
        kind,
        strength: raw
            .strength
            .map(|strength| strength as f32)
            .unwrap_or(DEFAULT_EDGE_STRENGTH),
    }
}
