#![allow(dead_code)]

use lamantin_lgraph::{EdgeId, LGraph, LayerId, NodeId, NodeType, Point, PortId, PortSide};

/// Small builder for hand-placed layered graphs.
pub struct GraphSpec {
    pub g: LGraph,
    layers: Vec<LayerId>,
}

impl GraphSpec {
    pub fn new(layer_count: usize) -> Self {
        let mut g = LGraph::new();
        let layers = (0..layer_count).map(|_| g.add_layer()).collect();
        Self { g, layers }
    }

    pub fn node(&mut self, layer: usize, name: &str, x: f64, y: f64, w: f64, h: f64) -> NodeId {
        self.typed_node(layer, name, NodeType::Normal, x, y, w, h)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn typed_node(
        &mut self,
        layer: usize,
        name: &str,
        node_type: NodeType,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
    ) -> NodeId {
        let id = self.g.add_node(self.layers[layer], name, node_type).unwrap();
        let node = self.g.node_mut(id);
        node.position = Point::new(x, y);
        node.size = Point::new(w, h);
        id
    }

    /// Places a port on the node border for `side`; `offset` runs along that border.
    pub fn port(&mut self, node: NodeId, name: &str, side: PortSide, offset: f64) -> PortId {
        let size = self.g.node(node).size;
        let id = self.g.add_port(node, name, side).unwrap();
        self.g.port_mut(id).position = match side {
            PortSide::East => Point::new(size.x, offset),
            PortSide::West => Point::new(0.0, offset),
            PortSide::North => Point::new(offset, 0.0),
            PortSide::South => Point::new(offset, size.y),
            PortSide::Undefined => Point::new(0.0, 0.0),
        };
        id
    }

    pub fn edge(&mut self, name: &str, source: PortId, target: PortId) -> EdgeId {
        self.g.add_edge(name, source, target).unwrap()
    }

    pub fn bundled_edge(&mut self, name: &str, source: PortId, target: PortId, bundle: i32) -> EdgeId {
        let id = self.edge(name, source, target);
        self.g.edge_mut(id).bundle_id = Some(bundle);
        id
    }
}

/// Two nodes with `n` parallel edges, the source sitting 100 units below the target so every
/// edge runs upward.
pub fn parallel_upward_edges(n: usize) -> (GraphSpec, Vec<EdgeId>) {
    let height = 10.0 * (n as f64 + 1.0);
    let mut spec = GraphSpec::new(2);
    let a = spec.node(0, "a", 0.0, 100.0, 20.0, height);
    let b = spec.node(1, "b", 100.0, 0.0, 20.0, height);
    let mut edges = Vec::new();
    for i in 0..n {
        let offset = 10.0 * (i as f64 + 1.0);
        let pa = spec.port(a, &format!("a{i}"), PortSide::East, offset);
        let pb = spec.port(b, &format!("b{i}"), PortSide::West, offset);
        edges.push(spec.edge(&format!("e{i}"), pa, pb));
    }
    (spec, edges)
}

pub fn bend_xs(g: &LGraph, edge: EdgeId) -> Vec<f64> {
    g.edge(edge).bend_points.iter().map(|p| p.x).collect()
}
