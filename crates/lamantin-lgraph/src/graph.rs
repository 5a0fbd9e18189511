//! Arena storage for layers, nodes, ports and edges.
//!
//! Entities live in plain `Vec`s and refer to each other through integer handles. Handles are
//! only minted by the graph itself, so indexing with a handle obtained from a different graph is
//! a programming error and panics like an out-of-bounds slice access.

use crate::error::{Error, Result};
use crate::model::{Insets, NodeType, Point, PortSide};
use rustc_hash::FxHashMap;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub usize);

        impl $name {
            pub const fn index(self) -> usize {
                self.0
            }
        }
    };
}

handle!(LayerId);
handle!(NodeId);
handle!(PortId);
handle!(EdgeId);

#[derive(Debug, Clone, Default)]
pub struct Layer {
    pub nodes: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct LNode {
    pub name: String,
    pub node_type: NodeType,
    pub layer: LayerId,
    /// Top-left corner, absolute.
    pub position: Point,
    pub size: Point,
    pub margin: Insets,
    pub ports: Vec<PortId>,
    /// The real edge a long-edge dummy was created for.
    pub origin: Option<EdgeId>,
}

#[derive(Debug, Clone)]
pub struct LPort {
    pub name: String,
    pub node: NodeId,
    pub side: PortSide,
    /// Relative to the owning node's position.
    pub position: Point,
    /// Relative to the port's position.
    pub anchor: Point,
    pub incoming: Vec<EdgeId>,
    pub outgoing: Vec<EdgeId>,
}

#[derive(Debug, Clone)]
pub struct LEdge {
    pub name: String,
    pub source: PortId,
    pub target: PortId,
    pub bend_points: Vec<Point>,
    pub junction_points: Vec<Point>,
    pub bundle_id: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct LGraph {
    layers: Vec<Layer>,
    nodes: Vec<LNode>,
    ports: Vec<LPort>,
    edges: Vec<LEdge>,
    node_by_name: FxHashMap<String, NodeId>,
    edge_by_name: FxHashMap<String, EdgeId>,
}

impl LGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_layer(&mut self) -> LayerId {
        let id = LayerId(self.layers.len());
        self.layers.push(Layer::default());
        id
    }

    pub fn add_node(
        &mut self,
        layer: LayerId,
        name: impl Into<String>,
        node_type: NodeType,
    ) -> Result<NodeId> {
        let name = name.into();
        if layer.0 >= self.layers.len() {
            return Err(Error::UnknownLayer { index: layer.0 });
        }
        if self.node_by_name.contains_key(&name) {
            return Err(Error::DuplicateId {
                kind: "node",
                id: name,
            });
        }
        let id = NodeId(self.nodes.len());
        self.node_by_name.insert(name.clone(), id);
        self.nodes.push(LNode {
            name,
            node_type,
            layer,
            position: Point::default(),
            size: Point::default(),
            margin: Insets::default(),
            ports: Vec::new(),
            origin: None,
        });
        self.layers[layer.0].nodes.push(id);
        Ok(id)
    }

    pub fn add_port(
        &mut self,
        node: NodeId,
        name: impl Into<String>,
        side: PortSide,
    ) -> Result<PortId> {
        if node.0 >= self.nodes.len() {
            return Err(Error::UnknownNode { index: node.0 });
        }
        let id = PortId(self.ports.len());
        self.ports.push(LPort {
            name: name.into(),
            node,
            side,
            position: Point::default(),
            anchor: Point::default(),
            incoming: Vec::new(),
            outgoing: Vec::new(),
        });
        self.nodes[node.0].ports.push(id);
        Ok(id)
    }

    pub fn add_edge(
        &mut self,
        name: impl Into<String>,
        source: PortId,
        target: PortId,
    ) -> Result<EdgeId> {
        let name = name.into();
        for port in [source, target] {
            if port.0 >= self.ports.len() {
                return Err(Error::UnknownPort { index: port.0 });
            }
        }
        if self.edge_by_name.contains_key(&name) {
            return Err(Error::DuplicateId {
                kind: "edge",
                id: name,
            });
        }
        let id = EdgeId(self.edges.len());
        self.edge_by_name.insert(name.clone(), id);
        self.edges.push(LEdge {
            name,
            source,
            target,
            bend_points: Vec::new(),
            junction_points: Vec::new(),
            bundle_id: None,
        });
        self.ports[source.0].outgoing.push(id);
        self.ports[target.0].incoming.push(id);
        Ok(id)
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn layer(&self, id: LayerId) -> &Layer {
        &self.layers[id.0]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node(&self, id: NodeId) -> &LNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut LNode {
        &mut self.nodes[id.0]
    }

    pub fn port(&self, id: PortId) -> &LPort {
        &self.ports[id.0]
    }

    pub fn port_mut(&mut self, id: PortId) -> &mut LPort {
        &mut self.ports[id.0]
    }

    pub fn edge(&self, id: EdgeId) -> &LEdge {
        &self.edges[id.0]
    }

    pub fn edge_mut(&mut self, id: EdgeId) -> &mut LEdge {
        &mut self.edges[id.0]
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        (0..self.edges.len()).map(EdgeId)
    }

    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.node_by_name.get(name).copied()
    }

    pub fn find_edge(&self, name: &str) -> Option<EdgeId> {
        self.edge_by_name.get(name).copied()
    }

    pub fn absolute_anchor(&self, port: PortId) -> Point {
        let p = &self.ports[port.0];
        self.nodes[p.node.0].position + p.position + p.anchor
    }

    /// Index of the port within its node's port list.
    pub fn port_index(&self, port: PortId) -> usize {
        let node = &self.nodes[self.ports[port.0].node.0];
        node.ports.iter().position(|&p| p == port).unwrap_or(0)
    }

    pub fn is_output_port(&self, port: PortId) -> bool {
        !self.ports[port.0].outgoing.is_empty()
    }

    /// Ports reachable over a single edge: targets of outgoing edges, then sources of incoming
    /// edges.
    pub fn connected_ports(&self, port: PortId) -> Vec<PortId> {
        let p = &self.ports[port.0];
        let mut out = Vec::with_capacity(p.outgoing.len() + p.incoming.len());
        out.extend(p.outgoing.iter().map(|e| self.edges[e.0].target));
        out.extend(p.incoming.iter().map(|e| self.edges[e.0].source));
        out
    }

    pub fn output_ports(&self, node: NodeId, side: PortSide) -> impl Iterator<Item = PortId> + '_ {
        self.nodes[node.0]
            .ports
            .iter()
            .copied()
            .filter(move |&p| self.ports[p.0].side == side && self.is_output_port(p))
    }

    pub fn source_node(&self, edge: EdgeId) -> NodeId {
        self.ports[self.edges[edge.0].source.0].node
    }

    pub fn target_node(&self, edge: EdgeId) -> NodeId {
        self.ports[self.edges[edge.0].target.0].node
    }

    pub fn outgoing_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.nodes[node.0]
            .ports
            .iter()
            .flat_map(move |p| self.ports[p.0].outgoing.iter().copied())
    }

    pub fn incoming_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        self.nodes[node.0]
            .ports
            .iter()
            .flat_map(move |p| self.ports[p.0].incoming.iter().copied())
    }

    pub fn is_normal(&self, node: NodeId) -> bool {
        self.nodes[node.0].node_type == NodeType::Normal
    }

    /// Drops every bend point and junction point, e.g. before routing a graph a second time.
    pub fn clear_routes(&mut self) {
        for edge in &mut self.edges {
            edge.bend_points.clear();
            edge.junction_points.clear();
        }
    }
}
