//! JSON interchange format for layered graphs.
//!
//! Nodes and ports are addressed by string ids; `GraphDocument::build` resolves them to handles.

use crate::error::{Error, Result};
use crate::graph::{LGraph, PortId};
use crate::model::{Insets, NodeType, Point, PortSide};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDocument {
    pub layers: Vec<LayerDocument>,
    #[serde(default)]
    pub edges: Vec<EdgeDocument>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerDocument {
    #[serde(default)]
    pub nodes: Vec<NodeDocument>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDocument {
    pub id: String,
    #[serde(default, rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub margin: Insets,
    #[serde(default)]
    pub ports: Vec<PortDocument>,
    /// Edge id of the real edge a long-edge dummy stands in for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortDocument {
    pub id: String,
    #[serde(default)]
    pub side: PortSide,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub anchor: Point,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDocument {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle: Option<i32>,
}

impl GraphDocument {
    pub fn build(&self) -> Result<LGraph> {
        let mut g = LGraph::new();
        let mut port_by_id: FxHashMap<&str, PortId> = FxHashMap::default();

        for layer_doc in &self.layers {
            let layer = g.add_layer();
            for node_doc in &layer_doc.nodes {
                let node = g.add_node(layer, node_doc.id.as_str(), node_doc.node_type)?;
                {
                    let n = g.node_mut(node);
                    n.position = Point::new(node_doc.x, node_doc.y);
                    n.size = Point::new(node_doc.width, node_doc.height);
                    n.margin = node_doc.margin;
                }
                for port_doc in &node_doc.ports {
                    if port_by_id.contains_key(port_doc.id.as_str()) {
                        return Err(Error::DuplicateId {
                            kind: "port",
                            id: port_doc.id.clone(),
                        });
                    }
                    let port = g.add_port(node, port_doc.id.as_str(), port_doc.side)?;
                    let p = g.port_mut(port);
                    p.position = Point::new(port_doc.x, port_doc.y);
                    p.anchor = port_doc.anchor;
                    port_by_id.insert(port_doc.id.as_str(), port);
                }
            }
        }

        for edge_doc in &self.edges {
            let resolve = |port_id: &str| {
                port_by_id
                    .get(port_id)
                    .copied()
                    .ok_or_else(|| Error::MissingEndpoint {
                        edge_id: edge_doc.id.clone(),
                        port_id: port_id.to_string(),
                    })
            };
            let source = resolve(&edge_doc.source)?;
            let target = resolve(&edge_doc.target)?;
            let edge = g.add_edge(edge_doc.id.as_str(), source, target)?;
            g.edge_mut(edge).bundle_id = edge_doc.bundle;
        }

        for node_doc in self.layers.iter().flat_map(|l| l.nodes.iter()) {
            let Some(origin) = node_doc.origin.as_deref() else {
                continue;
            };
            let edge = g.find_edge(origin).ok_or_else(|| Error::MissingOrigin {
                node_id: node_doc.id.clone(),
                edge_id: origin.to_string(),
            })?;
            if let Some(node) = g.find_node(&node_doc.id) {
                g.node_mut(node).origin = Some(edge);
            }
        }

        Ok(g)
    }
}
