//! A* over a small weighted search graph.

use lamantin_lgraph::{EdgeId, Point};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SearchNodeId(pub usize);

#[derive(Debug, Clone)]
pub struct SearchNode {
    pub position: Point,
    /// Graph edge this node stands for, if any.
    pub origin: Option<EdgeId>,
    pub g_score: f64,
    pub f_score: f64,
    pub predecessor: Option<SearchNodeId>,
    outgoing: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchEdge {
    pub source: SearchNodeId,
    pub target: SearchNodeId,
    pub weight: f64,
}

#[derive(Debug, Clone, Default)]
pub struct SearchGraph {
    nodes: Vec<SearchNode>,
    edges: Vec<SearchEdge>,
}

impl SearchGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, position: Point, origin: Option<EdgeId>) -> SearchNodeId {
        let id = SearchNodeId(self.nodes.len());
        self.nodes.push(SearchNode {
            position,
            origin,
            g_score: f64::INFINITY,
            f_score: f64::INFINITY,
            predecessor: None,
            outgoing: Vec::new(),
        });
        id
    }

    pub fn add_edge(&mut self, source: SearchNodeId, target: SearchNodeId, weight: f64) {
        self.nodes[source.0].outgoing.push(self.edges.len());
        self.edges.push(SearchEdge {
            source,
            target,
            weight,
        });
    }

    /// Adds an edge weighted by the distance between its endpoints.
    pub fn add_euclidean_edge(&mut self, source: SearchNodeId, target: SearchNodeId) {
        let weight = self.nodes[source.0]
            .position
            .distance(self.nodes[target.0].position);
        self.add_edge(source, target, weight);
    }

    pub fn node(&self, id: SearchNodeId) -> &SearchNode {
        &self.nodes[id.0]
    }

    pub fn nodes(&self) -> &[SearchNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[SearchEdge] {
        &self.edges
    }

    pub fn outgoing(&self, id: SearchNodeId) -> impl Iterator<Item = &SearchEdge> + '_ {
        self.nodes[id.0].outgoing.iter().map(|&e| &self.edges[e])
    }

    fn reset_scores(&mut self) {
        for node in &mut self.nodes {
            node.g_score = f64::INFINITY;
            node.f_score = f64::INFINITY;
            node.predecessor = None;
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct OpenEntry {
    f_score: f64,
    seq: u64,
    node: SearchNodeId,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl Ord for OpenEntry {
    // Reversed so `BinaryHeap` pops the smallest f-score, earliest insertion first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f_score
            .total_cmp(&self.f_score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn estimate(graph: &SearchGraph, node: SearchNodeId, goal: SearchNodeId) -> f64 {
    graph.nodes[node.0]
        .position
        .distance(graph.nodes[goal.0].position)
}

/// Returns the node sequence from `start` to `goal`, or `None` if `goal` is unreachable.
///
/// Scores and predecessors are written to the graph's nodes so the search can be inspected
/// afterwards.
pub fn find_shortest_path(
    graph: &mut SearchGraph,
    start: SearchNodeId,
    goal: SearchNodeId,
) -> Option<Vec<SearchNodeId>> {
    graph.reset_scores();

    let mut open: BinaryHeap<OpenEntry> = BinaryHeap::new();
    let mut latest_seq: Vec<Option<u64>> = vec![None; graph.nodes.len()];
    let mut seq: u64 = 0;

    graph.nodes[start.0].g_score = 0.0;
    graph.nodes[start.0].f_score = estimate(graph, start, goal);
    open.push(OpenEntry {
        f_score: graph.nodes[start.0].f_score,
        seq,
        node: start,
    });
    latest_seq[start.0] = Some(seq);

    while let Some(OpenEntry {
        seq: entry_seq,
        node: current,
        ..
    }) = open.pop()
    {
        if latest_seq[current.0] != Some(entry_seq) {
            continue;
        }
        latest_seq[current.0] = None;
        if current == goal {
            return Some(reconstruct_path(graph, start, goal));
        }

        let current_g = graph.nodes[current.0].g_score;
        for edge_ix in graph.nodes[current.0].outgoing.clone() {
            let SearchEdge { target, weight, .. } = graph.edges[edge_ix];
            let tentative = current_g + weight;
            if tentative >= graph.nodes[target.0].g_score {
                continue;
            }
            let f_score = tentative + estimate(graph, target, goal);
            let node = &mut graph.nodes[target.0];
            node.predecessor = Some(current);
            node.g_score = tentative;
            node.f_score = f_score;

            seq += 1;
            latest_seq[target.0] = Some(seq);
            open.push(OpenEntry {
                f_score,
                seq,
                node: target,
            });
        }
    }
    None
}

fn reconstruct_path(graph: &SearchGraph, start: SearchNodeId, goal: SearchNodeId) -> Vec<SearchNodeId> {
    let mut path = vec![goal];
    let mut current = goal;
    while current != start {
        let Some(prev) = graph.nodes[current.0].predecessor else {
            break;
        };
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}
