//! Format-neutral export model.
//!
//! Graph-exchange formats (GraphML, GEXF, ...) want nodes and edges with flat
//! string attribute maps. `GraphExport` is that shape; writing a concrete file
//! format is left to whoever consumes it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::consolidate::WeightedGraph;
use crate::graph::InteractionGraph;
use crate::schema::{InteractionEdge, NodeAttributes, Role};

/// Value written for attributes that have no value.
pub const SENTINEL: &str = "None";

/// Timestamp layout used for edge `start` attributes.
pub const START_FORMAT: &str = "%Y/%m/%d-%H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphExport {
    pub nodes: Vec<ExportNode>,
    pub edges: Vec<ExportEdge>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportNode {
    pub id: String,
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportEdge {
    pub key: u64,
    pub source: String,
    pub target: String,
    pub attributes: BTreeMap<String, String>,
}

impl GraphExport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl From<&InteractionGraph> for GraphExport {
    fn from(graph: &InteractionGraph) -> Self {
        let nodes = graph
            .nodes()
            .map(|(actor, attributes)| ExportNode {
                id: actor.to_string(),
                attributes: node_attributes(&actor.to_string(), attributes),
            })
            .collect();

        let edges = graph.edges().iter().map(export_edge).collect();

        Self { nodes, edges }
    }
}

impl From<&WeightedGraph> for GraphExport {
    fn from(graph: &WeightedGraph) -> Self {
        let nodes = graph
            .nodes
            .iter()
            .map(|(actor, attributes)| ExportNode {
                id: actor.to_string(),
                attributes: node_attributes(&actor.to_string(), attributes),
            })
            .collect();

        let edges = graph
            .edges
            .iter()
            .enumerate()
            .map(|(index, edge)| ExportEdge {
                key: index as u64,
                source: edge.source.to_string(),
                target: edge.target.to_string(),
                attributes: BTreeMap::from([("weight".to_string(), edge.weight.to_string())]),
            })
            .collect();

        Self { nodes, edges }
    }
}

/// Flatten node attributes. Roles render as "Yes"/"No", missing fields as `SENTINEL`.
pub fn node_attributes(id: &str, attributes: &NodeAttributes) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    map.insert(
        "Label".to_string(),
        attributes.label.clone().unwrap_or_else(|| id.to_string()),
    );
    for (name, value) in [
        ("email", &attributes.email),
        ("full_name", &attributes.full_name),
        ("avatar_url", &attributes.avatar_url),
    ] {
        map.insert(name.to_string(), or_sentinel(value.as_deref()));
    }
    for role in Role::ALL {
        let flag = if attributes.has_role(role) { "Yes" } else { "No" };
        map.insert(role.as_str().to_string(), flag.to_string());
    }
    map
}

fn export_edge(edge: &InteractionEdge) -> ExportEdge {
    // Forwarded metadata first, so the fixed attributes win on collisions.
    let mut attributes = edge.metadata.clone();
    attributes.insert("type".to_string(), edge.kind.as_str().to_string());
    attributes.insert(
        "start".to_string(),
        edge.start
            .map(|start| start.format(START_FORMAT).to_string())
            .unwrap_or_else(|| SENTINEL.to_string()),
    );
    attributes.insert("endopen".to_string(), edge.observation_year.to_string());
    attributes.insert("node".to_string(), or_sentinel(edge.source_event_id.as_deref()));
    attributes.insert("msg".to_string(), or_sentinel(edge.message.as_deref()));
    attributes.insert("event_kind".to_string(), or_sentinel(edge.event_kind.as_deref()));

    ExportEdge {
        key: edge.key,
        source: edge.source.to_string(),
        target: edge.target.to_string(),
        attributes,
    }
}

fn or_sentinel(value: Option<&str>) -> String {
    value.unwrap_or(SENTINEL).to_string()
}
