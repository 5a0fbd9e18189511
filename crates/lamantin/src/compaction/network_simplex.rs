//! Integer network simplex over difference constraints.
//!
//! Minimises `sum(weight * (x(target) - x(source)))` subject to
//! `x(target) - x(source) >= delta` for every edge.

use super::{CompactionEdge, ROOT};
use crate::error::{Error, Result};
use std::collections::VecDeque;

const MAX_ITERATIONS: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct DfsFrame {
    node: usize,
    next_neighbor: usize,
}

/// Spanning forest over the constraint graph, with postorder numbering for subtree tests.
#[derive(Debug, Clone)]
struct TreeState {
    in_tree: Vec<bool>,
    /// Parent node and connecting edge; `None` for roots.
    parent: Vec<Option<(usize, usize)>>,
    low: Vec<usize>,
    lim: Vec<usize>,
    preorder: Vec<usize>,
    neighbors: Vec<Vec<(usize, usize)>>,
}

impl TreeState {
    fn new(node_count: usize, in_tree: Vec<bool>) -> Self {
        Self {
            in_tree,
            parent: vec![None; node_count],
            low: vec![0; node_count],
            lim: vec![0; node_count],
            preorder: Vec::with_capacity(node_count),
            neighbors: vec![Vec::new(); node_count],
        }
    }

    fn rebuild(&mut self, edges: &[CompactionEdge]) {
        let n = self.parent.len();
        for list in &mut self.neighbors {
            list.clear();
        }
        for (ix, edge) in edges.iter().enumerate() {
            if self.in_tree[ix] {
                self.neighbors[edge.source].push((edge.target, ix));
                self.neighbors[edge.target].push((edge.source, ix));
            }
        }

        self.preorder.clear();
        self.parent.fill(None);
        let mut visited = vec![false; n];
        let mut next_lim = 1;
        let mut stack: Vec<DfsFrame> = Vec::new();
        let roots = std::iter::once(ROOT).chain(0..n);
        for root in roots {
            if root >= n || visited[root] {
                continue;
            }
            visited[root] = true;
            self.low[root] = next_lim;
            self.preorder.push(root);
            stack.push(DfsFrame {
                node: root,
                next_neighbor: 0,
            });

            while let Some(frame) = stack.last_mut() {
                let node = frame.node;
                match self.neighbors[node].get(frame.next_neighbor).copied() {
                    Some((next, edge)) => {
                        frame.next_neighbor += 1;
                        if visited[next] {
                            continue;
                        }
                        visited[next] = true;
                        self.parent[next] = Some((node, edge));
                        self.low[next] = next_lim;
                        self.preorder.push(next);
                        stack.push(DfsFrame {
                            node: next,
                            next_neighbor: 0,
                        });
                    }
                    None => {
                        self.lim[node] = next_lim;
                        next_lim += 1;
                        stack.pop();
                    }
                }
            }
        }
    }

    /// Whether `node` lies in the subtree hanging below `child`.
    fn in_subtree(&self, child: usize, node: usize) -> bool {
        self.low[child] <= self.lim[node] && self.lim[node] <= self.lim[child]
    }
}

/// Solves the constraint system. Positions are normalised so the root sits at 0.
///
/// Fails only when the constraints are cyclic; an iteration cap keeps the result feasible but
/// possibly not optimal.
pub fn solve(node_count: usize, edges: &[CompactionEdge]) -> Result<Vec<i64>> {
    if node_count == 0 {
        return Ok(Vec::new());
    }

    let mut pos = longest_path(node_count, edges)?;
    let in_tree = feasible_tree(node_count, edges, &mut pos);
    let mut tree = TreeState::new(node_count, in_tree);
    tree.rebuild(edges);

    let mut iterations = 0;
    while let Some((leave, child)) = leave_edge(&tree, edges) {
        let Some(enter) = enter_edge(&tree, edges, &pos, leave, child) else {
            break;
        };
        tree.in_tree[leave] = false;
        tree.in_tree[enter] = true;
        tree.rebuild(edges);
        update_positions(&tree, edges, &mut pos);

        iterations += 1;
        if iterations >= MAX_ITERATIONS {
            tracing::debug!(iterations, "network simplex stopped at iteration cap");
            break;
        }
    }
    tracing::trace!(iterations, nodes = node_count, edges = edges.len(), "network simplex");

    let base = pos[ROOT];
    for p in &mut pos {
        *p -= base;
    }
    Ok(pos)
}

/// Initial feasible positions: every node as far left as its incoming constraints allow.
fn longest_path(node_count: usize, edges: &[CompactionEdge]) -> Result<Vec<i64>> {
    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    let mut indegree = vec![0usize; node_count];
    for (ix, edge) in edges.iter().enumerate() {
        outgoing[edge.source].push(ix);
        indegree[edge.target] += 1;
    }

    let mut pos: Vec<Option<i64>> = vec![None; node_count];
    let mut queue: VecDeque<usize> = VecDeque::new();
    for (node, &deg) in indegree.iter().enumerate() {
        if deg == 0 {
            pos[node] = Some(0);
            queue.push_back(node);
        }
    }

    let mut processed = 0;
    while let Some(node) = queue.pop_front() {
        processed += 1;
        let here = pos[node].unwrap_or(0);
        for &ix in &outgoing[node] {
            let edge = edges[ix];
            let reach = here + edge.delta;
            pos[edge.target] = Some(pos[edge.target].map_or(reach, |p| p.max(reach)));
            indegree[edge.target] -= 1;
            if indegree[edge.target] == 0 {
                queue.push_back(edge.target);
            }
        }
    }

    if processed < node_count {
        return Err(Error::CyclicConstraints {
            node_count,
            unresolved: node_count - processed,
        });
    }
    Ok(pos.into_iter().map(|p| p.unwrap_or(0)).collect())
}

fn slack(edge: &CompactionEdge, pos: &[i64]) -> i64 {
    pos[edge.target] - pos[edge.source] - edge.delta
}

/// Grows a tree of tight edges, shifting it along the minimum-slack edge whenever it gets
/// stuck and starting a new component when no edge leaves it.
fn feasible_tree(node_count: usize, edges: &[CompactionEdge], pos: &mut [i64]) -> Vec<bool> {
    let mut incident: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    for (ix, edge) in edges.iter().enumerate() {
        incident[edge.source].push(ix);
        incident[edge.target].push(ix);
    }

    let mut in_tree_node = vec![false; node_count];
    let mut in_tree_edge = vec![false; edges.len()];
    let mut tree_nodes: Vec<usize> = vec![ROOT];
    in_tree_node[ROOT] = true;

    loop {
        // Tight tree: extend from every tree node over zero-slack edges.
        let mut stack = tree_nodes.clone();
        while let Some(node) = stack.pop() {
            for &ix in &incident[node] {
                let edge = &edges[ix];
                let other = if edge.source == node {
                    edge.target
                } else {
                    edge.source
                };
                if in_tree_node[other] || slack(edge, pos) != 0 {
                    continue;
                }
                in_tree_node[other] = true;
                in_tree_edge[ix] = true;
                tree_nodes.push(other);
                stack.push(other);
            }
        }
        if tree_nodes.len() >= node_count {
            break;
        }

        let mut best: Option<(i64, bool)> = None;
        for edge in edges {
            let (in_source, in_target) = (in_tree_node[edge.source], in_tree_node[edge.target]);
            if in_source == in_target {
                continue;
            }
            let s = slack(edge, pos);
            if best.is_none_or(|(b, _)| s < b) {
                best = Some((s, in_source));
            }
        }

        match best {
            Some((s, in_source)) => {
                let delta = if in_source { s } else { -s };
                for &node in &tree_nodes {
                    pos[node] += delta;
                }
            }
            None => {
                let Some(next_root) = (0..node_count).find(|&n| !in_tree_node[n]) else {
                    break;
                };
                in_tree_node[next_root] = true;
                tree_nodes.push(next_root);
            }
        }
    }
    in_tree_edge
}

/// Cut value of the tree edge `ix` connecting `child` to its parent: total weight of edges
/// crossing from the edge's tail component to its head component, minus the reverse.
fn cut_value(tree: &TreeState, edges: &[CompactionEdge], ix: usize, child: usize) -> i64 {
    let tail_is_subtree = edges[ix].source == child;
    let mut cut = 0;
    for edge in edges {
        let source_in = tree.in_subtree(child, edge.source);
        let target_in = tree.in_subtree(child, edge.target);
        if source_in == target_in {
            continue;
        }
        if source_in == tail_is_subtree {
            cut += edge.weight;
        } else {
            cut -= edge.weight;
        }
    }
    cut
}

/// First tree edge, in preorder of its child, with a negative cut value.
fn leave_edge(tree: &TreeState, edges: &[CompactionEdge]) -> Option<(usize, usize)> {
    tree.preorder.iter().find_map(|&child| {
        let (_, ix) = tree.parent[child]?;
        (cut_value(tree, edges, ix, child) < 0).then_some((ix, child))
    })
}

/// Minimum-slack edge running from the head component of `leave` back to its tail component.
fn enter_edge(
    tree: &TreeState,
    edges: &[CompactionEdge],
    pos: &[i64],
    leave: usize,
    child: usize,
) -> Option<usize> {
    let tail_is_subtree = edges[leave].source == child;
    let mut best: Option<(i64, usize)> = None;
    for (ix, edge) in edges.iter().enumerate() {
        let source_in_tail = tree.in_subtree(child, edge.source) == tail_is_subtree;
        let target_in_tail = tree.in_subtree(child, edge.target) == tail_is_subtree;
        if source_in_tail || !target_in_tail {
            continue;
        }
        let s = slack(edge, pos);
        if best.is_none_or(|(b, _)| s < b) {
            best = Some((s, ix));
        }
    }
    best.map(|(_, ix)| ix)
}

/// Makes every tree edge tight again, walking down from the roots.
fn update_positions(tree: &TreeState, edges: &[CompactionEdge], pos: &mut [i64]) {
    for &node in &tree.preorder {
        let Some((parent, ix)) = tree.parent[node] else {
            continue;
        };
        let edge = &edges[ix];
        pos[node] = if edge.source == node {
            pos[parent] - edge.delta
        } else {
            pos[parent] + edge.delta
        };
    }
}
