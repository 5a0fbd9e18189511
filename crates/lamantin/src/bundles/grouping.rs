//! Grouping edges into bundles.

use super::{BundleContext, edge_boundary};
use crate::chain;
use crate::error::Result;
use crate::options::BundlingStrategy;
use indexmap::IndexMap;
use lamantin_lgraph::{EdgeId, LGraph, NodeId};
use rustc_hash::FxBuildHasher;

impl BundleContext {
    /// Fills the per-boundary bundle maps and the first segment of every member.
    ///
    /// Only segments running from one layer to the next take part; in-layer and backward
    /// segments are never bundled.
    pub fn find_bundles(&mut self, g: &LGraph) -> Result<()> {
        match self.strategy {
            BundlingStrategy::None => {}
            BundlingStrategy::Manual => self.find_manual_bundles(g)?,
            BundlingStrategy::Automatic => self.find_automatic_bundles(g),
        }
        Ok(())
    }

    fn find_manual_bundles(&mut self, g: &LGraph) -> Result<()> {
        for edge in g.edge_ids() {
            if !is_forward(g, edge) {
                continue;
            }
            let origin = chain::origin_edge(g, edge)?;
            let Some(bundle) = g.edge(origin).bundle_id else {
                continue;
            };
            self.add_segment(g, bundle, edge);
            if g.is_normal(g.source_node(edge)) {
                self.first_edges.entry(bundle).or_default().push(edge);
            }
        }
        Ok(())
    }

    /// Every group of at least two edges leaving the same node for the same real target node
    /// becomes a bundle. Ids are handed out in node order.
    fn find_automatic_bundles(&mut self, g: &LGraph) {
        let mut next_id = 0;
        for layer in g.layers() {
            for &node in &layer.nodes {
                if !g.is_normal(node) {
                    continue;
                }
                let mut by_target: IndexMap<NodeId, Vec<EdgeId>, FxBuildHasher> =
                    IndexMap::default();
                for edge in g.outgoing_edges(node).filter(|&e| is_forward(g, e)) {
                    let target = g.port(chain::real_target(g, edge)).node;
                    by_target.entry(target).or_default().push(edge);
                }

                for group in by_target.into_values().filter(|group| group.len() >= 2) {
                    let bundle = next_id;
                    next_id += 1;
                    for &edge in &group {
                        for segment in chain::chain_segments(g, edge) {
                            self.add_segment(g, bundle, segment);
                        }
                    }
                    self.first_edges.insert(bundle, group);
                }
            }
        }
    }

    fn add_segment(&mut self, g: &LGraph, bundle: i32, segment: EdgeId) {
        self.bundles_per_boundary
            .entry(edge_boundary(g, segment))
            .or_default()
            .entry(bundle)
            .or_default()
            .push(segment);
    }
}

fn is_forward(g: &LGraph, edge: EdgeId) -> bool {
    let source = g.node(g.source_node(edge)).layer.index();
    let target = g.node(g.target_node(edge)).layer.index();
    target == source + 1
}
