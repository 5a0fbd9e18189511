//! One-dimensional compaction of trunk positions.
//!
//! Nodes and hypernodes become rectangles in a constraint graph. Edges `a -> b` with delta `d`
//! require `x(b) - x(a) >= d`; their weights say how strongly the solver should pull the pair
//! together. A scanline adds separation constraints between rectangles whose vertical extents
//! overlap, and network simplex solves the result.

pub mod network_simplex;
pub mod scanline;

use crate::error::Result;
use crate::hypernode::HyperNodeId;
use lamantin_lgraph::{NodeId, PortId};

pub use scanline::sweep_constraints;

pub const ROOT: usize = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompactionOrigin {
    Root,
    Node(NodeId),
    HyperNode { boundary: usize, id: HyperNodeId },
}

impl CompactionOrigin {
    pub fn is_hyper_node(self) -> bool {
        matches!(self, Self::HyperNode { .. })
    }

    /// Layer boundary of a hypernode rectangle.
    pub fn boundary(self) -> Option<usize> {
        match self {
            Self::HyperNode { boundary, .. } => Some(boundary),
            Self::Root | Self::Node(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompactionNode {
    pub origin: CompactionOrigin,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    /// Ports the rectangle touches; a node and a hypernode sharing one are connected.
    pub ports: Vec<PortId>,
}

impl CompactionNode {
    pub fn root() -> Self {
        Self {
            origin: CompactionOrigin::Root,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            margin_left: 0.0,
            margin_right: 0.0,
            ports: Vec::new(),
        }
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn shares_port_with(&self, other: &CompactionNode) -> bool {
        self.ports.iter().any(|p| other.ports.contains(p))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactionEdge {
    pub source: usize,
    pub target: usize,
    pub delta: i64,
    pub weight: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spacings {
    pub edge_edge: f64,
    pub edge_node: f64,
}

/// Constraint graph whose node 0 is the root every other position is measured from.
#[derive(Debug, Clone)]
pub struct CompactionGraph {
    pub nodes: Vec<CompactionNode>,
    pub edges: Vec<CompactionEdge>,
}

impl Default for CompactionGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl CompactionGraph {
    pub fn new() -> Self {
        Self {
            nodes: vec![CompactionNode::root()],
            edges: Vec::new(),
        }
    }

    pub fn add_node(&mut self, node: CompactionNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Adds `x(target) - x(source) >= delta`, rounding `delta` up to whole units.
    pub fn add_edge(&mut self, source: usize, target: usize, delta: f64, weight: i64) {
        self.edges.push(CompactionEdge {
            source,
            target,
            delta: delta.ceil() as i64,
            weight,
        });
    }

    /// Adds the scanline separation constraints.
    pub fn add_separation_constraints(&mut self, spacings: Spacings) {
        let constraints = sweep_constraints(&self.nodes, spacings);
        self.edges.extend(constraints);
    }

    /// Solves the graph; positions are relative to the root, which sits at 0.
    pub fn solve(&self) -> Result<Vec<i64>> {
        network_simplex::solve(self.nodes.len(), &self.edges)
    }
}
