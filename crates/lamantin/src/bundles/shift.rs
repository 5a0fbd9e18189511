//! Placing bundle trunks by compaction.

use super::BundleContext;
use crate::compaction::{
    CompactionGraph, CompactionNode, CompactionOrigin, ROOT, Spacings,
};
use crate::hypernode::HyperNodeId;
use crate::report::{RoutingIssue, RoutingReport};
use lamantin_lgraph::{LGraph, NodeId};
use rustc_hash::FxHashMap;

/// Keeps real nodes where they are.
const NODE_WEIGHT: i64 = 1000;
/// Pulls a bundle trunk toward the real node its members leave or enter.
const BUNDLE_WEIGHT: i64 = 1;

impl BundleContext {
    /// Assigns every saved hypernode its trunk coordinate `x`.
    ///
    /// Trunks start at their slot position and are then compacted against the real nodes and
    /// each other. If the constraints cannot be solved the slot positions stay and an error
    /// issue is reported; routing still completes.
    pub fn shift_hyper_nodes(&mut self, g: &LGraph, report: &mut RoutingReport) {
        let graph = self.build_compaction_graph(g);
        let positions = match graph.solve() {
            Ok(positions) => positions,
            Err(err) => {
                report.push_issue(RoutingIssue::error(format!(
                    "trunk compaction failed, keeping slot positions: {err}"
                )));
                return;
            }
        };

        for (ix, node) in graph.nodes.iter().enumerate() {
            if let CompactionOrigin::HyperNode { boundary, id } = node.origin {
                if let Some(state) = self.boundaries.get_mut(&boundary) {
                    state.hyper_nodes.node_mut(id).x = positions[ix] as f64;
                }
            }
        }
        tracing::debug!(
            nodes = graph.nodes.len(),
            constraints = graph.edges.len(),
            "compacted bundle trunks"
        );
    }

    fn build_compaction_graph(&mut self, g: &LGraph) -> CompactionGraph {
        let mut graph = CompactionGraph::new();
        let mut node_index: FxHashMap<NodeId, usize> = FxHashMap::default();

        for layer in g.layers() {
            for &id in &layer.nodes {
                if !g.is_normal(id) {
                    continue;
                }
                let node = g.node(id);
                let ix = graph.add_node(CompactionNode {
                    origin: CompactionOrigin::Node(id),
                    x: node.position.x,
                    y: node.position.y,
                    width: node.size.x,
                    height: node.size.y,
                    margin_left: node.margin.left,
                    margin_right: node.margin.right,
                    ports: node.ports.clone(),
                });
                graph.add_edge(ROOT, ix, node.position.x, NODE_WEIGHT);
                node_index.insert(id, ix);
            }
        }

        let spacings = Spacings {
            edge_edge: self.edge_edge_spacing,
            edge_node: self.edge_node_spacing,
        };
        for (&boundary, state) in &mut self.boundaries {
            let left_border = state.start_pos - spacings.edge_node;
            for ix in 0..state.hyper_nodes.len() {
                let id = HyperNodeId(ix);
                let hn = state.hyper_nodes.node_mut(id);
                if hn.is_straight() {
                    continue;
                }
                hn.x = state.start_pos + hn.rank as f64 * spacings.edge_edge;
                let hn_ix = graph.add_node(CompactionNode {
                    origin: CompactionOrigin::HyperNode { boundary, id },
                    x: hn.x,
                    y: hn.start,
                    width: hn.width,
                    height: hn.end - hn.start,
                    margin_left: 0.0,
                    margin_right: 0.0,
                    ports: hn.ports.iter().copied().collect(),
                });
                graph.add_edge(ROOT, hn_ix, left_border, 0);

                let width = hn.width;
                let Some(&first) = state.members.get(&id).and_then(|m| m.first()) else {
                    continue;
                };
                let (source, target) = (g.source_node(first), g.target_node(first));
                if let Some(&node_ix) = node_index.get(&source) {
                    let node = g.node(source);
                    graph.add_edge(
                        node_ix,
                        hn_ix,
                        node.size.x + node.margin.right,
                        BUNDLE_WEIGHT,
                    );
                } else if let Some(&node_ix) = node_index.get(&target) {
                    let node = g.node(target);
                    graph.add_edge(hn_ix, node_ix, width + node.margin.left, BUNDLE_WEIGHT);
                }
            }
        }

        graph.add_separation_constraints(spacings);
        graph
    }
}
