//! Orthogonal routing of the edges crossing one layer boundary.

use crate::bundles::BundleHandler;
use crate::cycle_breaking::break_cycles;
use crate::debug;
use crate::direction::RoutingDirection;
use crate::error::Result;
use crate::hypernode::{
    HyperNode, HyperNodeGraph, HyperNodeId, TOLERANCE, create_dependencies, create_hyper_nodes,
};
use crate::random::RandomSource;
use crate::ranking::topological_numbering;
use lamantin_lgraph::{EdgeId, LGraph, LayerId, Point};
use rustc_hash::FxHashSet;

/// Fraction of the edge spacing below which two positions count as a conflict.
const CONFLICT_THRESHOLD_FACTOR: f64 = 0.2;

#[derive(Debug, Clone)]
pub struct OrthogonalRoutingGenerator {
    direction: RoutingDirection,
    edge_spacing: f64,
    conflict_threshold: f64,
    created_junction_points: FxHashSet<[u64; 2]>,
}

impl OrthogonalRoutingGenerator {
    pub fn new(direction: RoutingDirection, edge_spacing: f64) -> Self {
        Self {
            direction,
            edge_spacing,
            conflict_threshold: CONFLICT_THRESHOLD_FACTOR * edge_spacing,
            created_junction_points: FxHashSet::default(),
        }
    }

    pub fn direction(&self) -> RoutingDirection {
        self.direction
    }

    pub fn edge_spacing(&self) -> f64 {
        self.edge_spacing
    }

    pub fn conflict_threshold(&self) -> f64 {
        self.conflict_threshold
    }

    /// Routes the edges between `source_layer` and `target_layer`, either of which may be absent
    /// at the outer boundaries.
    ///
    /// Returns the number of slots the boundary needs. With an active bundle handler no bend
    /// points are written; the hypernodes are handed to the handler instead.
    #[allow(clippy::too_many_arguments)]
    pub fn route_edges(
        &mut self,
        g: &mut LGraph,
        boundary: usize,
        source_layer: Option<LayerId>,
        target_layer: Option<LayerId>,
        start_pos: f64,
        random: &mut dyn RandomSource,
        handler: &mut BundleHandler,
    ) -> Result<usize> {
        let mut hg = HyperNodeGraph::new();
        {
            let graph: &LGraph = g;
            if let Some(layer) = source_layer {
                create_hyper_nodes(
                    graph,
                    &graph.layer(layer).nodes,
                    self.direction.source_side(),
                    self.direction,
                    &mut hg,
                );
            }
            if let Some(layer) = target_layer {
                create_hyper_nodes(
                    graph,
                    &graph.layer(layer).nodes,
                    self.direction.target_side(),
                    self.direction,
                    &mut hg,
                );
            }
        }

        create_dependencies(&mut hg, self.conflict_threshold);
        debug::trace_dependency_graph(g, &hg, boundary, "full");
        break_cycles(&mut hg, random);
        debug::trace_dependency_graph(g, &hg, boundary, "acyclic");
        topological_numbering(&mut hg);

        let slots = slot_count(&hg);
        tracing::debug!(boundary, hyper_nodes = hg.len(), slots, "routed boundary");

        if let BundleHandler::Active(ctx) = &mut *handler {
            ctx.record_segments(g, boundary, &hg)?;
            ctx.save_hyper_nodes(boundary, start_pos, hg);
        } else {
            for id in hg.ids() {
                if !hg.node(id).is_straight() {
                    self.calculate_bend_points(g, &hg, id, start_pos, boundary, handler);
                }
            }
        }
        self.created_junction_points.clear();
        Ok(slots)
    }

    /// Writes the two bend points of every non-straight segment of hypernode `id`.
    pub fn calculate_bend_points(
        &mut self,
        g: &mut LGraph,
        hg: &HyperNodeGraph,
        id: HyperNodeId,
        start_pos: f64,
        boundary: usize,
        handler: &BundleHandler,
    ) {
        let hn = hg.node(id);
        let trunk = handler.hyper_node_position(hn, start_pos, self.edge_spacing, self.direction);

        for &port in &hn.ports {
            let source_pos = self.direction.sweep(handler.bundled_anchor(g, port));
            for edge in g.port(port).outgoing.clone() {
                let target = g.edge(edge).target;
                let target_pos = self.direction.sweep(handler.bundled_anchor(g, target));
                if (source_pos - target_pos).abs() <= TOLERANCE {
                    continue;
                }
                let toward_smaller = target_pos < source_pos;

                for (sweep, start_of_segment) in [(source_pos, true), (target_pos, false)] {
                    let mut point = self.direction.bend_point(trunk, sweep);
                    let allows_junction = handler.offset_bend_point(
                        g,
                        boundary,
                        id,
                        edge,
                        &mut point,
                        toward_smaller,
                        start_of_segment,
                    );
                    g.edge_mut(edge).bend_points.push(point);
                    if allows_junction {
                        self.add_junction_point_if_necessary(g, edge, hn, point);
                    }
                }
            }
        }
    }

    /// Forgets the junction points created so far; each boundary deduplicates on its own.
    pub fn clear_junction_points(&mut self) {
        self.created_junction_points.clear();
    }

    fn add_junction_point_if_necessary(
        &mut self,
        g: &mut LGraph,
        edge: EdgeId,
        hn: &HyperNode,
        point: Point,
    ) {
        let pos = self.direction.sweep(point);
        let inside = pos > hn.start && pos < hn.end;
        let near = |p: Option<&f64>| p.is_some_and(|&p| (p - pos).abs() < TOLERANCE);
        let (sources, targets) = (&hn.source_positions, &hn.target_positions);
        let joins = (near(sources.first()) && near(targets.first()))
            || (near(sources.last()) && near(targets.last()));

        if !(inside || joins) {
            return;
        }
        if self
            .created_junction_points
            .insert([point.x.to_bits(), point.y.to_bits()])
        {
            g.edge_mut(edge).junction_points.push(point);
        }
    }
}

/// Slots taken by the non-straight hypernodes of a ranked graph.
pub fn slot_count(hg: &HyperNodeGraph) -> usize {
    hg.nodes()
        .iter()
        .filter(|hn| !hn.is_straight())
        .map(|hn| hn.rank + 1)
        .max()
        .unwrap_or(0)
}
