//! Merging bundle members into their representative's hypernode.

use super::{BundleContext, edge_boundary};
use crate::chain;
use crate::cycle_breaking::break_cycles;
use crate::direction::RoutingDirection;
use crate::error::{Error, Result};
use crate::hypernode::{HyperNodeGraph, HyperNodeId, create_dependencies};
use crate::random::RandomSource;
use crate::ranking::topological_numbering;
use crate::report::{RoutingIssue, RoutingReport};
use crate::routing::slot_count;
use crate::segments::VerticalSegment;
use lamantin_lgraph::{EdgeId, LGraph, PortId};
use rustc_hash::{FxHashMap, FxHashSet};

impl BundleContext {
    /// Checks that every bundle finds a slot for its merge trunk at its first boundary and for
    /// its split trunk at its last one. A bundle without a free slot stays unmerged at that
    /// boundary.
    pub fn check_free_slots(&mut self, g: &LGraph, report: &mut RoutingReport) -> Result<()> {
        let bundles: Vec<(i32, Vec<EdgeId>)> = self
            .first_edges
            .iter()
            .map(|(&id, edges)| (id, edges.clone()))
            .collect();

        for (bundle, firsts) in bundles {
            let Some(&first) = firsts.first() else {
                continue;
            };
            let merge_boundary = edge_boundary(g, first);
            if self.find_free_slot(g, bundle, merge_boundary, false)?.is_none() {
                self.unmerged.insert((bundle, merge_boundary));
                report.push_issue(
                    RoutingIssue::warning(format!(
                        "no free slot to merge bundle {bundle} at boundary {merge_boundary}"
                    ))
                    .with_edge(first),
                );
            }

            let split_boundary = chain::chain_segments(g, first)
                .last()
                .map_or(merge_boundary, |&segment| edge_boundary(g, segment));
            if self.find_free_slot(g, bundle, split_boundary, true)?.is_none() {
                self.unmerged.insert((bundle, split_boundary));
                report.push_issue(
                    RoutingIssue::warning(format!(
                        "no free slot to split bundle {bundle} at boundary {split_boundary}"
                    ))
                    .with_edge(first),
                );
            }
        }
        Ok(())
    }

    /// Lowest slot (highest when `split`) at `boundary` that no segment outside the bundle
    /// overlaps once the members' trunks are widened to reach their node-side anchors.
    pub fn find_free_slot(
        &self,
        g: &LGraph,
        bundle: i32,
        boundary: usize,
        split: bool,
    ) -> Result<Option<usize>> {
        let Some(members) = self.bundles_at(boundary).and_then(|b| b.get(&bundle)) else {
            return Ok(None);
        };
        let Some(&fallback) = members.first() else {
            return Ok(None);
        };

        let representative = self.representative(bundle, boundary).unwrap_or(fallback);
        let rep_port = if split {
            g.edge(representative).target
        } else {
            g.edge(representative).source
        };
        let pos = self.direction.sweep(g.absolute_anchor(rep_port));
        let mut trunk =
            VerticalSegment::new(boundary, 0, chain::origin_edge(g, representative)?, pos, pos);

        let mut own = FxHashSet::default();
        for &member in members {
            let origin = chain::origin_edge(g, member)?;
            own.insert(origin);
            if let Some(segment) = self
                .segments
                .for_edge(origin)
                .iter()
                .find(|s| s.boundary == boundary)
            {
                trunk.include_segment(segment);
                let port = if split {
                    g.edge(member).target
                } else {
                    g.edge(member).source
                };
                trunk.include(self.direction.sweep(g.absolute_anchor(port)));
            }
        }

        let highest = self.segments.highest_rank(boundary).unwrap_or(0);
        let free = |rank: &usize| {
            self.segments
                .in_slot(boundary, *rank)
                .iter()
                .all(|s| own.contains(&s.edge) || !trunk.overlaps(s))
        };
        Ok(if split {
            (0..=highest).rev().find(free)
        } else {
            (0..=highest).find(free)
        })
    }

    /// Merges every bundle's members into the representative's hypernode, then reranks each
    /// boundary. Returns the new slot count of every boundary.
    pub fn merge_hyper_nodes(
        &mut self,
        g: &LGraph,
        random: &mut dyn RandomSource,
        min_diff: f64,
    ) -> Result<Vec<(usize, usize)>> {
        let mut slots = Vec::with_capacity(self.boundaries.len());
        let boundaries: Vec<usize> = self.boundaries.keys().copied().collect();

        for boundary in boundaries {
            let bundles = self
                .bundles_per_boundary
                .get(&boundary)
                .cloned()
                .unwrap_or_default();
            let Some(mut state) = self.boundaries.remove(&boundary) else {
                continue;
            };

            let mut absorbed: FxHashSet<HyperNodeId> = FxHashSet::default();
            let mut members_by_node: FxHashMap<HyperNodeId, Vec<EdgeId>> = FxHashMap::default();
            for (bundle, members) in bundles {
                if members.len() < 2 || self.unmerged.contains(&(bundle, boundary)) {
                    continue;
                }
                let representative = self.representative(bundle, boundary).ok_or_else(|| {
                    Error::IllegalState(format!(
                        "bundle {bundle} has no representative at boundary {boundary}"
                    ))
                })?;
                let rep_port = g.edge(representative).source;
                let target = state.hyper_nodes.hyper_node_of(rep_port).ok_or_else(|| {
                    Error::IllegalState(format!(
                        "port `{}` of bundle {bundle} belongs to no hypernode",
                        g.port(rep_port).name
                    ))
                })?;

                let mut leftovers: Vec<PortId> = Vec::new();
                for &member in &members {
                    let source = g.edge(member).source;
                    let old = state.hyper_nodes.hyper_node_of(source);
                    if old == Some(target) {
                        continue;
                    }
                    if let Some(old) = old {
                        absorbed.insert(old);
                        let ports: Vec<PortId> =
                            state.hyper_nodes.node(old).ports.iter().copied().collect();
                        for &port in &ports {
                            state.hyper_nodes.unmap_port(port);
                        }
                        leftovers.extend(ports);
                    }
                    add_bundled_port_positions(
                        g,
                        &mut state.hyper_nodes,
                        target,
                        member,
                        representative,
                        self.direction,
                        &mut self.bundled_ports,
                    );
                }
                for port in leftovers {
                    if state.hyper_nodes.hyper_node_of(port).is_none() {
                        state.hyper_nodes.add_port_positions(g, target, port, self.direction);
                    }
                }

                // Bundles fanning out of one port share a hypernode.
                members_by_node
                    .entry(target)
                    .or_default()
                    .extend(members.iter().copied());
            }

            for (&id, members) in &mut members_by_node {
                members.sort_by_cached_key(|&m| {
                    chain::origin_edge(g, m)
                        .map(|origin| g.port_index(g.edge(origin).source))
                        .unwrap_or(usize::MAX)
                });
                state.hyper_nodes.node_mut(id).width =
                    members.len() as f64 * self.bundle_spacing;
            }

            if !absorbed.is_empty() || !members_by_node.is_empty() {
                let remap = state.hyper_nodes.retain(|id| !absorbed.contains(&id));
                state.members = members_by_node
                    .into_iter()
                    .filter_map(|(id, members)| remap[id.0].map(|new| (new, members)))
                    .collect();
                create_dependencies(&mut state.hyper_nodes, min_diff);
                break_cycles(&mut state.hyper_nodes, random);
                topological_numbering(&mut state.hyper_nodes);
                tracing::debug!(
                    boundary,
                    merged = absorbed.len(),
                    hyper_nodes = state.hyper_nodes.len(),
                    "merged bundle hypernodes"
                );
            }

            slots.push((boundary, slot_count(&state.hyper_nodes)));
            self.boundaries.insert(boundary, state);
        }
        Ok(slots)
    }
}

/// Moves the ports of `edge` into hypernode `id`. An end on a different node than the
/// representative's is recorded as bundled and takes the representative's position.
fn add_bundled_port_positions(
    g: &LGraph,
    hg: &mut HyperNodeGraph,
    id: HyperNodeId,
    edge: EdgeId,
    representative: EdgeId,
    direction: RoutingDirection,
    bundled_ports: &mut FxHashMap<PortId, PortId>,
) {
    let (source, target) = (g.edge(edge).source, g.edge(edge).target);
    let (rep_source, rep_target) = (g.edge(representative).source, g.edge(representative).target);

    let mut position_of = |port: PortId, rep_port: PortId| {
        let anchor = if g.port(port).node == g.port(rep_port).node {
            port
        } else {
            bundled_ports.insert(port, rep_port);
            rep_port
        };
        direction.port_position_on_hyper_node(g, anchor)
    };
    let source_pos = position_of(source, rep_source);
    let target_pos = position_of(target, rep_target);

    for port in [source, target] {
        hg.map_port(port, id);
    }
    let node = hg.node_mut(id);
    node.ports.insert(source);
    node.ports.insert(target);
    node.add_position(source_pos, true);
    node.add_position(target_pos, false);
}
