//! Topological numbering of an acyclic dependency graph.

use crate::hypernode::{HyperNodeGraph, HyperNodeId};
use std::collections::VecDeque;

/// Assigns `rank(target) >= rank(source) + 1` for every dependency, then pulls hypernodes whose
/// horizontal segments all point right as far right as their dependencies allow.
pub fn topological_numbering(hg: &mut HyperNodeGraph) {
    let mut sources: VecDeque<HyperNodeId> = VecDeque::new();
    let mut rightward_targets: VecDeque<HyperNodeId> = VecDeque::new();

    for id in hg.ids() {
        let node = hg.node_mut(id);
        node.rank = 0;
        node.in_weight = node.incoming.len() as i32;
        node.out_weight = node.outgoing.len() as i32;
        if node.in_weight == 0 {
            sources.push_back(id);
        }
        if node.out_weight == 0 && node.source_positions.is_empty() {
            rightward_targets.push_back(id);
        }
    }

    let mut max_rank: Option<usize> = None;
    while let Some(id) = sources.pop_front() {
        let rank = hg.node(id).rank;
        let outgoing = hg.node(id).outgoing().to_vec();
        for dep_id in outgoing {
            let target_id = hg.dependency(dep_id).target;
            let target = hg.node_mut(target_id);
            target.rank = target.rank.max(rank + 1);
            max_rank = Some(max_rank.map_or(target.rank, |m| m.max(target.rank)));
            target.in_weight -= 1;
            if target.in_weight == 0 {
                sources.push_back(target_id);
            }
        }
    }

    let Some(max_rank) = max_rank else {
        return;
    };

    for &id in &rightward_targets {
        hg.node_mut(id).rank = max_rank;
    }

    while let Some(id) = rightward_targets.pop_front() {
        let incoming = hg.node(id).incoming().to_vec();
        for dep_id in incoming {
            let source_id = hg.dependency(dep_id).source;
            if !hg.node(source_id).source_positions.is_empty() {
                continue;
            }
            let source = hg.node_mut(source_id);
            source.out_weight -= 1;
            if source.out_weight == 0 {
                let pulled = hg
                    .node(source_id)
                    .outgoing()
                    .iter()
                    .map(|&d| hg.node(hg.dependency(d).target).rank.saturating_sub(1))
                    .min();
                let source = hg.node_mut(source_id);
                if let Some(pulled) = pulled {
                    source.rank = source.rank.max(pulled);
                }
                rightward_targets.push_back(source_id);
            }
        }
    }
}
