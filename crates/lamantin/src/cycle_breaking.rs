//! Greedy cycle breaking over the hypernode dependency graph.
//!
//! Sinks are pushed to the right end of a total order and sources to the left end; when neither
//! exists the node with maximal outflow is treated as a source. Dependencies that end up pointing
//! left are then dropped (weight zero) or reversed.

use crate::hypernode::{HyperNodeGraph, HyperNodeId};
use crate::random::RandomSource;
use std::collections::{BTreeSet, VecDeque};

pub fn break_cycles(hg: &mut HyperNodeGraph, random: &mut dyn RandomSource) {
    let n = hg.len();
    if n == 0 {
        return;
    }

    let mut sources: VecDeque<HyperNodeId> = VecDeque::new();
    let mut sinks: VecDeque<HyperNodeId> = VecDeque::new();

    for id in hg.ids() {
        let out_weight: i32 = hg
            .node(id)
            .outgoing()
            .iter()
            .map(|&d| hg.dependency(d).weight)
            .sum();
        let in_weight: i32 = hg
            .node(id)
            .incoming()
            .iter()
            .map(|&d| hg.dependency(d).weight)
            .sum();
        let node = hg.node_mut(id);
        node.mark = -(id.0 as i64) - 1;
        node.in_weight = in_weight;
        node.out_weight = out_weight;

        if out_weight == 0 {
            sinks.push_back(id);
        } else if in_weight == 0 {
            sources.push_back(id);
        }
    }

    let mut unprocessed: BTreeSet<HyperNodeId> = hg.ids().collect();
    let mark_base = n as i64;
    let mut next_right = mark_base - 1;
    let mut next_left = mark_base + 1;
    let mut max_nodes: Vec<HyperNodeId> = Vec::new();

    while !unprocessed.is_empty() {
        while let Some(sink) = sinks.pop_front() {
            if !unprocessed.remove(&sink) {
                continue;
            }
            hg.node_mut(sink).mark = next_right;
            next_right -= 1;
            update_neighbors(hg, sink, &unprocessed, &mut sources, &mut sinks);
        }

        while let Some(source) = sources.pop_front() {
            if !unprocessed.remove(&source) {
                continue;
            }
            hg.node_mut(source).mark = next_left;
            next_left += 1;
            update_neighbors(hg, source, &unprocessed, &mut sources, &mut sinks);
        }

        let mut max_outflow = i32::MIN;
        for &id in &unprocessed {
            let node = hg.node(id);
            let outflow = node.out_weight - node.in_weight;
            if outflow >= max_outflow {
                if outflow > max_outflow {
                    max_nodes.clear();
                    max_outflow = outflow;
                }
                max_nodes.push(id);
            }
        }

        if !max_nodes.is_empty() {
            let max_node = max_nodes[random.next_index(max_nodes.len())];
            unprocessed.remove(&max_node);
            hg.node_mut(max_node).mark = next_left;
            next_left += 1;
            update_neighbors(hg, max_node, &unprocessed, &mut sources, &mut sinks);
            max_nodes.clear();
        }
    }

    let shift = n as i64 + 1;
    for id in hg.ids() {
        let node = hg.node_mut(id);
        if node.mark < mark_base {
            node.mark += shift;
        }
    }

    for id in hg.ids() {
        let outgoing = hg.node(id).outgoing().to_vec();
        for dep_id in outgoing {
            let dep = *hg.dependency(dep_id);
            if hg.node(dep.source).mark > hg.node(dep.target).mark {
                if dep.weight > 0 {
                    hg.reverse_dependency(dep_id);
                } else {
                    hg.remove_dependency(dep_id);
                }
            }
        }
    }
}

fn update_neighbors(
    hg: &mut HyperNodeGraph,
    id: HyperNodeId,
    unprocessed: &BTreeSet<HyperNodeId>,
    sources: &mut VecDeque<HyperNodeId>,
    sinks: &mut VecDeque<HyperNodeId>,
) {
    let outgoing = hg.node(id).outgoing().to_vec();
    for dep_id in outgoing {
        let dep = *hg.dependency(dep_id);
        if dep.weight > 0 && unprocessed.contains(&dep.target) {
            let target = hg.node_mut(dep.target);
            target.in_weight -= dep.weight;
            if target.in_weight <= 0 && target.out_weight > 0 {
                sources.push_back(dep.target);
            }
        }
    }

    let incoming = hg.node(id).incoming().to_vec();
    for dep_id in incoming {
        let dep = *hg.dependency(dep_id);
        if dep.weight > 0 && unprocessed.contains(&dep.source) {
            let source = hg.node_mut(dep.source);
            source.out_weight -= dep.weight;
            if source.out_weight <= 0 && source.in_weight > 0 {
                sinks.push_back(dep.source);
            }
        }
    }
}
