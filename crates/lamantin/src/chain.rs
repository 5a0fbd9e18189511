//! Walking long-edge dummy chains.

use crate::error::{Error, Result};
use lamantin_lgraph::{EdgeId, LGraph, NodeType, PortId};

/// The real edge a (possibly split) edge segment belongs to.
pub fn origin_edge(g: &LGraph, edge: EdgeId) -> Result<EdgeId> {
    let mut current = edge;
    for _ in 0..=g.edge_count() {
        let source = g.node(g.source_node(current));
        if source.node_type != NodeType::LongEdge {
            return Ok(current);
        }
        current = source.origin.ok_or_else(|| {
            Error::IllegalState(format!(
                "long-edge dummy `{}` has no origin edge",
                source.name
            ))
        })?;
    }
    Err(Error::IllegalState(format!(
        "origin chain of edge `{}` does not terminate",
        g.edge(edge).name
    )))
}

/// The first edge leaving the target of `edge`, if that target is a long-edge dummy.
pub fn successor_edge(g: &LGraph, edge: EdgeId) -> Option<EdgeId> {
    let target = g.target_node(edge);
    if g.node(target).node_type != NodeType::LongEdge {
        return None;
    }
    g.outgoing_edges(target).next()
}

/// Follows `edge` through long-edge dummies to the first port on a non-dummy node.
pub fn real_target(g: &LGraph, edge: EdgeId) -> PortId {
    let mut current = edge;
    for _ in 0..=g.edge_count() {
        match successor_edge(g, current) {
            Some(next) => current = next,
            None => break,
        }
    }
    g.edge(current).target
}

/// Every segment of a chain, starting at `edge` and ending at the segment entering a non-dummy
/// node.
pub fn chain_segments(g: &LGraph, edge: EdgeId) -> Vec<EdgeId> {
    let mut out = vec![edge];
    let mut current = edge;
    while let Some(next) = successor_edge(g, current) {
        if out.len() > g.edge_count() {
            break;
        }
        out.push(next);
        current = next;
    }
    out
}
