//! Hypernodes and the dependency graph between them.
//!
//! A hypernode collects every port that is connected (transitively, over edges crossing one
//! layer boundary) into a single trunk. Dependencies are weighted ordering preferences between
//! two trunks; they live in the same arena and refer to hypernodes by index.

use crate::direction::RoutingDirection;
use indexmap::IndexSet;
use lamantin_lgraph::{LGraph, NodeId, PortId, PortSide};
use rustc_hash::{FxBuildHasher, FxHashMap};

/// Positions closer than this are considered equal.
pub const TOLERANCE: f64 = 1e-3;

/// Cost of a conflict (two segments meeting at the same position) relative to a crossing.
pub const CONFLICT_PENALTY: i32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HyperNodeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DependencyId(pub usize);

#[derive(Debug, Clone)]
pub struct HyperNode {
    pub ports: IndexSet<PortId, FxBuildHasher>,
    /// Slot index; the trunk sits `rank` spacings away from the first slot.
    pub rank: usize,
    pub start: f64,
    pub end: f64,
    /// Sorted, deduplicated positions of ports on the routing direction's source side.
    pub source_positions: Vec<f64>,
    /// Sorted, deduplicated positions of all other ports.
    pub target_positions: Vec<f64>,
    /// Extra room reserved for bundled members, zero for plain hypernodes.
    pub width: f64,
    /// Absolute trunk coordinate assigned by compaction.
    pub x: f64,
    pub(crate) mark: i64,
    pub(crate) in_weight: i32,
    pub(crate) out_weight: i32,
    pub(crate) outgoing: Vec<DependencyId>,
    pub(crate) incoming: Vec<DependencyId>,
}

impl Default for HyperNode {
    fn default() -> Self {
        Self::new()
    }
}

impl HyperNode {
    pub fn new() -> Self {
        Self {
            ports: IndexSet::default(),
            rank: 0,
            start: f64::NAN,
            end: f64::NAN,
            source_positions: Vec::new(),
            target_positions: Vec::new(),
            width: 0.0,
            x: 0.0,
            mark: 0,
            in_weight: 0,
            out_weight: 0,
            outgoing: Vec::new(),
            incoming: Vec::new(),
        }
    }

    /// A straight hypernode needs no trunk and takes up no slot.
    pub fn is_straight(&self) -> bool {
        (self.start - self.end).abs() < TOLERANCE
    }

    pub fn add_position(&mut self, pos: f64, source_side: bool) {
        self.start = if self.start.is_nan() {
            pos
        } else {
            self.start.min(pos)
        };
        self.end = if self.end.is_nan() {
            pos
        } else {
            self.end.max(pos)
        };
        if source_side {
            insert_sorted(&mut self.source_positions, pos);
        } else {
            insert_sorted(&mut self.target_positions, pos);
        }
    }

    pub fn outgoing(&self) -> &[DependencyId] {
        &self.outgoing
    }

    pub fn incoming(&self) -> &[DependencyId] {
        &self.incoming
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dependency {
    pub source: HyperNodeId,
    pub target: HyperNodeId,
    /// Zero marks one half of a true two-cycle.
    pub weight: i32,
}

#[derive(Debug, Clone, Default)]
pub struct HyperNodeGraph {
    nodes: Vec<HyperNode>,
    dependencies: Vec<Dependency>,
    port_map: FxHashMap<PortId, HyperNodeId>,
}

impl HyperNodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = HyperNodeId> + use<> {
        (0..self.nodes.len()).map(HyperNodeId)
    }

    pub fn nodes(&self) -> &[HyperNode] {
        &self.nodes
    }

    pub fn node(&self, id: HyperNodeId) -> &HyperNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: HyperNodeId) -> &mut HyperNode {
        &mut self.nodes[id.0]
    }

    pub fn push(&mut self, node: HyperNode) -> HyperNodeId {
        let id = HyperNodeId(self.nodes.len());
        for &port in &node.ports {
            self.port_map.insert(port, id);
        }
        self.nodes.push(node);
        id
    }

    pub fn hyper_node_of(&self, port: PortId) -> Option<HyperNodeId> {
        self.port_map.get(&port).copied()
    }

    pub(crate) fn map_port(&mut self, port: PortId, id: HyperNodeId) {
        self.port_map.insert(port, id);
    }

    pub(crate) fn unmap_port(&mut self, port: PortId) {
        self.port_map.remove(&port);
    }

    pub fn dependency(&self, id: DependencyId) -> &Dependency {
        &self.dependencies[id.0]
    }

    pub fn add_dependency(
        &mut self,
        source: HyperNodeId,
        target: HyperNodeId,
        weight: i32,
    ) -> DependencyId {
        let id = DependencyId(self.dependencies.len());
        self.dependencies.push(Dependency {
            source,
            target,
            weight,
        });
        self.nodes[source.0].outgoing.push(id);
        self.nodes[target.0].incoming.push(id);
        id
    }

    /// Detaches a dependency from both endpoints.
    pub(crate) fn remove_dependency(&mut self, id: DependencyId) {
        let Dependency { source, target, .. } = self.dependencies[id.0];
        self.nodes[source.0].outgoing.retain(|&d| d != id);
        self.nodes[target.0].incoming.retain(|&d| d != id);
    }

    pub(crate) fn reverse_dependency(&mut self, id: DependencyId) {
        self.remove_dependency(id);
        let dep = &mut self.dependencies[id.0];
        std::mem::swap(&mut dep.source, &mut dep.target);
        let Dependency { source, target, .. } = *dep;
        self.nodes[source.0].outgoing.push(id);
        self.nodes[target.0].incoming.push(id);
    }

    /// Dependencies still attached to their endpoints, in source order.
    pub fn live_dependencies(&self) -> impl Iterator<Item = (DependencyId, &Dependency)> + '_ {
        self.nodes
            .iter()
            .flat_map(|n| n.outgoing.iter())
            .map(|&id| (id, &self.dependencies[id.0]))
    }

    pub fn clear_dependencies(&mut self) {
        self.dependencies.clear();
        for node in &mut self.nodes {
            node.incoming.clear();
            node.outgoing.clear();
            node.in_weight = 0;
            node.out_weight = 0;
            node.mark = 0;
            node.rank = 0;
        }
    }

    /// Keeps the hypernodes for which `keep` returns true. Dependencies are dropped and the port
    /// map is rebuilt from the surviving hypernodes. Returns the new id of every old id.
    pub fn retain(&mut self, mut keep: impl FnMut(HyperNodeId) -> bool) -> Vec<Option<HyperNodeId>> {
        self.clear_dependencies();
        let old = std::mem::take(&mut self.nodes);
        let mut remap = Vec::with_capacity(old.len());
        for (ix, node) in old.into_iter().enumerate() {
            if keep(HyperNodeId(ix)) {
                remap.push(Some(HyperNodeId(self.nodes.len())));
                self.nodes.push(node);
            } else {
                remap.push(None);
            }
        }
        self.port_map.clear();
        for (ix, node) in self.nodes.iter().enumerate() {
            for &port in &node.ports {
                self.port_map.insert(port, HyperNodeId(ix));
            }
        }
        remap
    }

    /// Adds `port` and every port transitively connected to it that is not yet owned by a
    /// hypernode.
    pub fn add_port_positions(
        &mut self,
        g: &LGraph,
        id: HyperNodeId,
        port: PortId,
        direction: RoutingDirection,
    ) {
        let mut stack = vec![port];
        while let Some(p) = stack.pop() {
            if self.port_map.contains_key(&p) {
                continue;
            }
            self.port_map.insert(p, id);
            let pos = direction.port_position_on_hyper_node(g, p);
            let source_side = g.port(p).side == direction.source_side();
            let node = &mut self.nodes[id.0];
            node.ports.insert(p);
            node.add_position(pos, source_side);

            let connected = g.connected_ports(p);
            stack.extend(
                connected
                    .into_iter()
                    .rev()
                    .filter(|q| !self.port_map.contains_key(q)),
            );
        }
    }
}

/// Builds one hypernode per group of connected output ports on `side` of `nodes`.
pub fn create_hyper_nodes(
    g: &LGraph,
    nodes: &[NodeId],
    side: PortSide,
    direction: RoutingDirection,
    hyper_nodes: &mut HyperNodeGraph,
) {
    for &node in nodes {
        for port in g.output_ports(node, side) {
            if hyper_nodes.hyper_node_of(port).is_none() {
                let id = hyper_nodes.push(HyperNode::new());
                hyper_nodes.add_port_positions(g, id, port, direction);
            }
        }
    }
}

/// Creates dependencies between every pair of non-straight hypernodes.
pub fn create_dependencies(hyper_nodes: &mut HyperNodeGraph, min_diff: f64) {
    let n = hyper_nodes.len();
    for i in 0..n {
        for j in (i + 1)..n {
            create_dependency(hyper_nodes, HyperNodeId(i), HyperNodeId(j), min_diff);
        }
    }
}

fn create_dependency(hg: &mut HyperNodeGraph, a: HyperNodeId, b: HyperNodeId, min_diff: f64) {
    let (hn1, hn2) = (hg.node(a), hg.node(b));
    if hn1.is_straight() || hn2.is_straight() {
        return;
    }

    let conflicts1 = count_conflicts(&hn1.target_positions, &hn2.source_positions, min_diff);
    let conflicts2 = count_conflicts(&hn2.target_positions, &hn1.source_positions, min_diff);

    let crossings1 = count_crossings(&hn1.target_positions, hn2.start, hn2.end)
        + count_crossings(&hn2.source_positions, hn1.start, hn1.end);
    let crossings2 = count_crossings(&hn2.target_positions, hn1.start, hn1.end)
        + count_crossings(&hn1.source_positions, hn2.start, hn2.end);

    let cost1 = CONFLICT_PENALTY * conflicts1 as i32 + crossings1 as i32;
    let cost2 = CONFLICT_PENALTY * conflicts2 as i32 + crossings2 as i32;

    if cost1 < cost2 {
        hg.add_dependency(a, b, cost2 - cost1);
    } else if cost1 > cost2 {
        hg.add_dependency(b, a, cost1 - cost2);
    } else if cost1 > 0 {
        hg.add_dependency(a, b, 0);
        hg.add_dependency(b, a, 0);
    }
}

/// Counts position pairs from the two sorted lists that lie within `min_diff` of each other.
pub fn count_conflicts(posis1: &[f64], posis2: &[f64], min_diff: f64) -> usize {
    let (Some(&first1), Some(&first2)) = (posis1.first(), posis2.first()) else {
        return 0;
    };
    let (mut i, mut j) = (0usize, 0usize);
    let (mut pos1, mut pos2) = (first1, first2);
    let mut conflicts = 0;
    loop {
        if pos1 > pos2 - min_diff && pos1 < pos2 + min_diff {
            conflicts += 1;
        }
        if pos1 <= pos2 && i + 1 < posis1.len() {
            i += 1;
            pos1 = posis1[i];
        } else if pos2 <= pos1 && j + 1 < posis2.len() {
            j += 1;
            pos2 = posis2[j];
        } else {
            break;
        }
    }
    conflicts
}

/// Counts sorted positions inside the closed span `[start, end]`.
pub fn count_crossings(posis: &[f64], start: f64, end: f64) -> usize {
    let mut crossings = 0;
    for &pos in posis {
        if pos > end {
            break;
        }
        if pos >= start {
            crossings += 1;
        }
    }
    crossings
}

fn insert_sorted(list: &mut Vec<f64>, value: f64) {
    let mut at = list.len();
    for (ix, &next) in list.iter().enumerate() {
        if (next - value).abs() < TOLERANCE {
            return;
        }
        if next > value {
            at = ix;
            break;
        }
    }
    list.insert(at, value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_sorted_keeps_order_and_drops_near_duplicates() {
        let mut v = Vec::new();
        for x in [5.0, 1.0, 3.0, 1.0004, 7.0] {
            insert_sorted(&mut v, x);
        }
        assert_eq!(v, vec![1.0, 3.0, 5.0, 7.0]);
    }

    #[test]
    fn retain_rebuilds_port_map() {
        let mut hg = HyperNodeGraph::new();
        let mut a = HyperNode::new();
        a.ports.insert(PortId(3));
        let mut b = HyperNode::new();
        b.ports.insert(PortId(9));
        hg.push(a);
        hg.push(b);

        let remap = hg.retain(|id| id != HyperNodeId(0));
        assert_eq!(remap, vec![None, Some(HyperNodeId(0))]);
        assert_eq!(hg.hyper_node_of(PortId(3)), None);
        assert_eq!(hg.hyper_node_of(PortId(9)), Some(HyperNodeId(0)));
    }
}
