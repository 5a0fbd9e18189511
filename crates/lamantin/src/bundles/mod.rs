//! Edge bundling.
//!
//! The lazy handler leaves routing untouched. The active handler collects every boundary's
//! hypernodes during the first routing pass, then picks one representative edge per bundle,
//! merges the members' hypernodes into the representative's, compacts trunk positions and only
//! then emits bend points.

mod grouping;
mod merge;
mod representative;
mod shift;
pub mod shortest_path;

use crate::chain;
use crate::direction::RoutingDirection;
use crate::error::Result;
use crate::hypernode::{HyperNode, HyperNodeGraph, HyperNodeId, TOLERANCE};
use crate::options::{BundlingStrategy, BundlingStyle, RoutingOptions};
use crate::report::{RoutingIssue, RoutingReport};
use crate::segments::{SegmentRegistry, VerticalSegment};
use indexmap::IndexMap;
use lamantin_lgraph::{EdgeId, LGraph, Point, PortId};
use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use std::collections::BTreeMap;

pub use shortest_path::{SearchGraph, SearchNode, SearchNodeId, find_shortest_path};

/// Bundle members per bundle id, in discovery order.
pub type BundleMap = IndexMap<i32, Vec<EdgeId>, FxBuildHasher>;

#[derive(Debug, Clone)]
pub enum BundleHandler {
    Lazy,
    Active(Box<BundleContext>),
}

impl BundleHandler {
    /// Picks the handler for `options`, grouping the graph's edges into bundles when bundling
    /// is requested and supported.
    pub fn for_graph(
        g: &LGraph,
        options: &RoutingOptions,
        report: &mut RoutingReport,
    ) -> Result<Self> {
        if options.bundling.strategy == BundlingStrategy::None {
            return Ok(Self::Lazy);
        }
        if options.direction != RoutingDirection::WestToEast {
            report.push_issue(RoutingIssue::warning(format!(
                "edge bundling is not supported for {:?} routing; edges are routed unbundled",
                options.direction
            )));
            return Ok(Self::Lazy);
        }

        let mut ctx = BundleContext::new(options);
        ctx.find_bundles(g)?;
        if ctx.first_edges.is_empty() {
            tracing::debug!("no bundles found");
            return Ok(Self::Lazy);
        }
        tracing::debug!(bundles = ctx.first_edges.len(), "bundles found");
        Ok(Self::Active(Box::new(ctx)))
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }

    pub fn context(&self) -> Option<&BundleContext> {
        match self {
            Self::Lazy => None,
            Self::Active(ctx) => Some(ctx),
        }
    }

    /// Trunk coordinate of a hypernode.
    pub fn hyper_node_position(
        &self,
        hn: &HyperNode,
        start_pos: f64,
        edge_spacing: f64,
        direction: RoutingDirection,
    ) -> f64 {
        match self {
            Self::Lazy => direction.slot_position(start_pos, hn.rank, edge_spacing),
            Self::Active(_) => hn.x + hn.width / 2.0,
        }
    }

    /// Anchor a port is routed from; bundled ports borrow their representative's anchor.
    pub fn bundled_anchor(&self, g: &LGraph, port: PortId) -> Point {
        match self {
            Self::Lazy => g.absolute_anchor(port),
            Self::Active(ctx) => ctx.bundled_anchor(g, port),
        }
    }

    /// Moves a bend point of a bundle member off the shared trunk. Returns whether the point
    /// may carry a junction point.
    #[allow(clippy::too_many_arguments)]
    pub fn offset_bend_point(
        &self,
        g: &LGraph,
        boundary: usize,
        hn: HyperNodeId,
        edge: EdgeId,
        point: &mut Point,
        toward_smaller: bool,
        start_of_segment: bool,
    ) -> bool {
        match self {
            Self::Lazy => true,
            Self::Active(ctx) => ctx.offset_bend_point(
                g,
                boundary,
                hn,
                edge,
                point,
                toward_smaller,
                start_of_segment,
            ),
        }
    }
}

/// Hypernodes of one boundary, kept until the bundle pipeline has run.
#[derive(Debug, Clone, Default)]
pub struct BoundaryState {
    pub hyper_nodes: HyperNodeGraph,
    pub start_pos: f64,
    /// Members of merged hypernodes, sorted by their real edge's source port index.
    pub members: FxHashMap<HyperNodeId, Vec<EdgeId>>,
}

#[derive(Debug, Clone)]
pub struct BundleContext {
    strategy: BundlingStrategy,
    style: BundlingStyle,
    bundle_spacing: f64,
    edge_edge_spacing: f64,
    edge_node_spacing: f64,
    direction: RoutingDirection,
    /// Edge segments crossing each boundary, per bundle.
    bundles_per_boundary: BTreeMap<usize, BundleMap>,
    /// Segments leaving a real node, per bundle.
    first_edges: BundleMap,
    representatives: FxHashMap<(i32, usize), EdgeId>,
    /// Boundaries at which a bundle stays unmerged for lack of a free slot.
    unmerged: FxHashSet<(i32, usize)>,
    boundaries: BTreeMap<usize, BoundaryState>,
    bundled_ports: FxHashMap<PortId, PortId>,
    segments: SegmentRegistry,
}

impl BundleContext {
    pub fn new(options: &RoutingOptions) -> Self {
        Self {
            strategy: options.bundling.strategy,
            style: options.bundling.style,
            bundle_spacing: options.bundling.bundle_spacing,
            edge_edge_spacing: options.edge_edge_spacing,
            edge_node_spacing: options.edge_node_spacing,
            direction: options.direction,
            bundles_per_boundary: BTreeMap::new(),
            first_edges: BundleMap::default(),
            representatives: FxHashMap::default(),
            unmerged: FxHashSet::default(),
            boundaries: BTreeMap::new(),
            bundled_ports: FxHashMap::default(),
            segments: SegmentRegistry::default(),
        }
    }

    pub fn first_edges(&self) -> &BundleMap {
        &self.first_edges
    }

    pub fn bundles_at(&self, boundary: usize) -> Option<&BundleMap> {
        self.bundles_per_boundary.get(&boundary)
    }

    pub fn representative(&self, bundle: i32, boundary: usize) -> Option<EdgeId> {
        self.representatives.get(&(bundle, boundary)).copied()
    }

    pub fn is_unmerged(&self, bundle: i32, boundary: usize) -> bool {
        self.unmerged.contains(&(bundle, boundary))
    }

    pub fn segments(&self) -> &SegmentRegistry {
        &self.segments
    }

    pub fn boundaries(&self) -> impl Iterator<Item = (usize, &BoundaryState)> + '_ {
        self.boundaries.iter().map(|(&b, s)| (b, s))
    }

    pub fn boundary(&self, boundary: usize) -> Option<&BoundaryState> {
        self.boundaries.get(&boundary)
    }

    pub fn bundled_port(&self, port: PortId) -> Option<PortId> {
        self.bundled_ports.get(&port).copied()
    }

    pub fn bundled_anchor(&self, g: &LGraph, port: PortId) -> Point {
        g.absolute_anchor(self.bundled_port(port).unwrap_or(port))
    }

    /// Records the trunk run of every edge segment of the non-straight hypernodes.
    pub(crate) fn record_segments(
        &mut self,
        g: &LGraph,
        boundary: usize,
        hg: &HyperNodeGraph,
    ) -> Result<()> {
        for hn in hg.nodes().iter().filter(|hn| !hn.is_straight()) {
            for &port in &hn.ports {
                let source_pos = self.direction.sweep(g.absolute_anchor(port));
                for &edge in &g.port(port).outgoing {
                    let target_pos = self.direction.sweep(g.absolute_anchor(g.edge(edge).target));
                    if (source_pos - target_pos).abs() > TOLERANCE {
                        let origin = chain::origin_edge(g, edge)?;
                        self.segments.record(VerticalSegment::new(
                            boundary, hn.rank, origin, source_pos, target_pos,
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    pub(crate) fn save_hyper_nodes(&mut self, boundary: usize, start_pos: f64, hg: HyperNodeGraph) {
        self.boundaries.insert(
            boundary,
            BoundaryState {
                hyper_nodes: hg,
                start_pos,
                members: FxHashMap::default(),
            },
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn offset_bend_point(
        &self,
        g: &LGraph,
        boundary: usize,
        hn: HyperNodeId,
        edge: EdgeId,
        point: &mut Point,
        toward_smaller: bool,
        start_of_segment: bool,
    ) -> bool {
        let Some(members) = self.boundaries.get(&boundary).and_then(|s| s.members.get(&hn)) else {
            return true;
        };
        let Some(index) = members.iter().position(|&m| m == edge) else {
            return false;
        };

        let centered = match self.style {
            BundlingStyle::Bundle => {
                (index as f64 - (members.len() - 1) as f64 / 2.0) * self.bundle_spacing
            }
            BundlingStyle::SingleLine => 0.0,
        };
        let trunk_shift = if toward_smaller { centered } else { -centered };
        let end_node = if start_of_segment {
            g.source_node(edge)
        } else {
            g.target_node(edge)
        };
        let sweep_shift = if g.is_normal(end_node) { 0.0 } else { centered };

        *point = self.direction.bend_point(
            self.direction.trunk(*point) + trunk_shift,
            self.direction.sweep(*point) + sweep_shift,
        );
        false
    }
}

/// Boundary crossed by an edge segment: the one right after its source layer.
pub(crate) fn edge_boundary(g: &LGraph, edge: EdgeId) -> usize {
    g.node(g.source_node(edge)).layer.index() + 1
}
