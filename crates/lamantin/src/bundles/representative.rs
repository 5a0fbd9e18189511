//! Picking the representative edge of each bundle.
//!
//! The representative is the member whose path is shortest when measured from the middle of the
//! bundle's source anchors to the middle of its target anchors. Its trunk is the one the other
//! members are merged into.

use super::shortest_path::{SearchGraph, SearchNodeId, find_shortest_path};
use super::{BundleContext, edge_boundary};
use crate::chain;
use crate::debug;
use crate::error::{Error, Result};
use lamantin_lgraph::{EdgeId, LGraph, NodeType, Point, PortId};

const COLUMN_SPACING: f64 = 20.0;
/// Base cost of walking along a member edge, on top of its trunk lengths.
const EDGE_BASE_WEIGHT: f64 = 20.0;

impl BundleContext {
    /// Chooses a representative for every bundle and records it at every boundary its chain
    /// crosses.
    pub fn calc_shortest_edges(&mut self, g: &LGraph) -> Result<()> {
        let bundles: Vec<(i32, Vec<EdgeId>)> = self
            .first_edges
            .iter()
            .map(|(&id, edges)| (id, edges.clone()))
            .collect();

        for (bundle, members) in bundles {
            let representative = self.find_shortest_edge(g, bundle, &members)?;
            tracing::debug!(
                bundle,
                edge = %g.edge(representative).name,
                "bundle representative"
            );
            for segment in chain::chain_segments(g, representative) {
                self.representatives
                    .insert((bundle, edge_boundary(g, segment)), segment);
            }
        }
        Ok(())
    }

    fn find_shortest_edge(&self, g: &LGraph, bundle: i32, members: &[EdgeId]) -> Result<EdgeId> {
        let sweep = |p: Point| self.direction.sweep(p);
        let sources: Vec<f64> = members
            .iter()
            .map(|&e| sweep(g.absolute_anchor(g.edge(e).source)))
            .collect();
        let targets: Vec<f64> = members
            .iter()
            .map(|&e| sweep(g.absolute_anchor(chain::real_target(g, e))))
            .collect();

        // Where each member enters and leaves its dummy chain; the real anchors without one.
        let chain_entries: Vec<f64> = members
            .iter()
            .zip(&sources)
            .map(|(&e, &s)| {
                let port = g.edge(e).target;
                if is_dummy_port(g, port) {
                    sweep(g.absolute_anchor(port))
                } else {
                    s
                }
            })
            .collect();
        let chain_exits: Vec<f64> = members
            .iter()
            .zip(&targets)
            .map(|(&e, &t)| {
                let last = chain::chain_segments(g, e).last().copied().unwrap_or(e);
                let port = g.edge(last).source;
                if is_dummy_port(g, port) {
                    sweep(g.absolute_anchor(port))
                } else {
                    t
                }
            })
            .collect();

        let mut sg = SearchGraph::new();
        let column = |ix: u32| f64::from(ix) * COLUMN_SPACING;
        let start = sg.add_node(Point::new(column(0), midpoint(&sources)), None);
        let goal = sg.add_node(Point::new(column(5), midpoint(&targets)), None);

        let mut source_ports = Vec::with_capacity(members.len());
        let mut source_edges = Vec::with_capacity(members.len());
        let mut target_edges = Vec::with_capacity(members.len());
        let mut target_ports = Vec::with_capacity(members.len());
        for (ix, &edge) in members.iter().enumerate() {
            let (s, t) = (sources[ix], targets[ix]);
            source_ports.push(sg.add_node(Point::new(column(1), s), Some(edge)));
            source_edges.push(sg.add_node(Point::new(column(2), chain_entries[ix]), Some(edge)));
            target_edges.push(sg.add_node(Point::new(column(3), chain_exits[ix]), Some(edge)));
            target_ports.push(sg.add_node(Point::new(column(4), t), Some(edge)));
        }

        for &port in &source_ports {
            sg.add_euclidean_edge(start, port);
        }
        connect_all(&mut sg, &source_ports, &source_edges);
        for (ix, &edge) in members.iter().enumerate() {
            let weight = EDGE_BASE_WEIGHT + self.inner_trunk_length(g, edge)?;
            sg.add_edge(source_edges[ix], target_edges[ix], weight);
        }
        connect_all(&mut sg, &target_edges, &target_ports);
        for &port in &target_ports {
            sg.add_euclidean_edge(port, goal);
        }

        let path = find_shortest_path(&mut sg, start, goal);
        debug::trace_search_graph(bundle, &sg, path.as_deref());
        let path =
            path.ok_or_else(|| Error::IllegalState(format!("no path through bundle {bundle}")))?;
        path.get(2)
            .and_then(|&id: &SearchNodeId| sg.node(id).origin)
            .ok_or_else(|| {
                Error::IllegalState(format!("search path of bundle {bundle} names no edge"))
            })
    }

    /// Summed trunk lengths of `edge` at the boundaries strictly between its first and last.
    fn inner_trunk_length(&self, g: &LGraph, edge: EdgeId) -> Result<f64> {
        let origin = chain::origin_edge(g, edge)?;
        let segments = chain::chain_segments(g, edge);
        let first = edge_boundary(g, edge);
        let last = segments
            .last()
            .map_or(first, |&segment| edge_boundary(g, segment));
        Ok(self
            .segments
            .for_edge(origin)
            .iter()
            .filter(|s| s.boundary != first && s.boundary != last)
            .map(|s| s.length())
            .sum())
    }
}

fn is_dummy_port(g: &LGraph, port: PortId) -> bool {
    g.node(g.port(port).node).node_type == NodeType::LongEdge
}

fn connect_all(sg: &mut SearchGraph, from: &[SearchNodeId], to: &[SearchNodeId]) {
    for &a in from {
        for &b in to {
            sg.add_euclidean_edge(a, b);
        }
    }
}

fn midpoint(values: &[f64]) -> f64 {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min.is_finite() && max.is_finite() {
        (min + max) / 2.0
    } else {
        0.0
    }
}
