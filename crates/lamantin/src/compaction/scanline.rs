//! Scanline generation of separation constraints.
//!
//! Sweeping top to bottom, the rectangles cut by the scanline are kept ordered by their center.
//! Every rectangle remembers its current left neighbour as a candidate; if the two are still
//! neighbours when one of them leaves, they were horizontally adjacent for some stretch and get
//! a separation constraint.

use super::{CompactionEdge, CompactionNode, CompactionOrigin, Spacings};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::ops::Bound;

/// Weight pulling a node and a hypernode together when the hypernode routes one of its ports.
const CONNECTED_WEIGHT: i64 = 5;

#[derive(Debug, Clone, Copy)]
struct Event {
    y: f64,
    /// `true` for the top edge of a rectangle.
    top: bool,
    node: usize,
}

#[derive(Debug, Clone, Copy)]
struct Key {
    center: f64,
    node: usize,
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Key {}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        self.center
            .total_cmp(&other.center)
            .then_with(|| self.node.cmp(&other.node))
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Separation constraints between horizontally adjacent rectangles. Node pairs are skipped, as
/// are trunks of different boundaries; nodes never move.
pub fn sweep_constraints(nodes: &[CompactionNode], spacings: Spacings) -> Vec<CompactionEdge> {
    let mut events: Vec<Event> = Vec::with_capacity(nodes.len() * 2);
    for (ix, node) in nodes.iter().enumerate() {
        if node.origin == CompactionOrigin::Root || node.height <= 0.0 {
            continue;
        }
        events.push(Event {
            y: node.y,
            top: true,
            node: ix,
        });
        events.push(Event {
            y: node.y + node.height,
            top: false,
            node: ix,
        });
    }
    // Bottoms before tops at equal coordinates: touching rectangles do not overlap.
    events.sort_by(|a, b| a.y.total_cmp(&b.y).then_with(|| a.top.cmp(&b.top)));

    let key = |node: usize| Key {
        center: nodes[node].center_x(),
        node,
    };
    let mut active: BTreeSet<Key> = BTreeSet::new();
    let mut candidate: Vec<Option<usize>> = vec![None; nodes.len()];
    let mut out = Vec::new();

    for event in events {
        let k = key(event.node);
        let left = active.range(..k).next_back().map(|l| l.node);
        let right = active
            .range((Bound::Excluded(k), Bound::Unbounded))
            .next()
            .map(|r| r.node);

        if event.top {
            active.insert(k);
            candidate[event.node] = left;
            if let Some(right) = right {
                candidate[right] = Some(event.node);
            }
        } else {
            if let Some(left) = left.filter(|&l| candidate[event.node] == Some(l)) {
                push_constraint(nodes, left, event.node, spacings, &mut out);
            }
            if let Some(right) = right.filter(|&r| candidate[r] == Some(event.node)) {
                push_constraint(nodes, event.node, right, spacings, &mut out);
            }
            active.remove(&k);
        }
    }
    out
}

fn push_constraint(
    nodes: &[CompactionNode],
    left: usize,
    right: usize,
    spacings: Spacings,
    out: &mut Vec<CompactionEdge>,
) {
    let (l, r) = (&nodes[left], &nodes[right]);
    let (delta, weight) = match (l.origin.is_hyper_node(), r.origin.is_hyper_node()) {
        (false, false) => return,
        (true, true) if l.origin.boundary() == r.origin.boundary() => {
            (l.width + spacings.edge_edge, 0)
        }
        (true, true) => return,
        _ => {
            let weight = if l.shares_port_with(r) {
                CONNECTED_WEIGHT
            } else {
                0
            };
            (
                l.width + l.margin_right + spacings.edge_node + r.margin_left,
                weight,
            )
        }
    };
    out.push(CompactionEdge {
        source: left,
        target: right,
        delta: delta.ceil() as i64,
        weight,
    });
}
