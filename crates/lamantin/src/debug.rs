//! JSON dumps of intermediate routing structures, emitted at `TRACE` level.
//!
//! Both dumps use the ELK JSON graph shape so they can be pasted into an ELK viewer.

use crate::bundles::{SearchGraph, SearchNodeId};
use crate::hypernode::HyperNodeGraph;
use lamantin_lgraph::LGraph;
use serde_json::{Value, json};

const NODE_WIDTH: f64 = 50.0;
const NODE_HEIGHT: f64 = 15.0;
/// Search graph coordinates are small; spread them out for viewing.
const SEARCH_GRAPH_SCALE: f64 = 5.0;

/// Hypernodes labelled with their ports, and live dependencies with their weights.
pub fn dependency_graph_json(g: &LGraph, hg: &HyperNodeGraph) -> Value {
    let children: Vec<Value> = hg
        .nodes()
        .iter()
        .enumerate()
        .map(|(ix, hn)| {
            let ports: Vec<&str> = hn.ports.iter().map(|&p| g.port(p).name.as_str()).collect();
            json!({
                "id": format!("h{ix}"),
                "width": NODE_WIDTH,
                "height": NODE_HEIGHT,
                "labels": [{ "text": ports.join(", ") }],
                "properties": {
                    "rank": hn.rank,
                    "start": finite_or_null(hn.start),
                    "end": finite_or_null(hn.end),
                },
            })
        })
        .collect();

    let edges: Vec<Value> = hg
        .live_dependencies()
        .map(|(id, dep)| {
            json!({
                "id": format!("d{}", id.0),
                "sources": [format!("h{}", dep.source.0)],
                "targets": [format!("h{}", dep.target.0)],
                "labels": [{ "text": dep.weight.to_string() }],
            })
        })
        .collect();

    json!({
        "id": "root",
        "properties": { "algorithm": "layered" },
        "children": children,
        "edges": edges,
    })
}

/// Search nodes at their (scaled) positions, labelled with their g-scores. Edges on `path` are
/// marked.
pub fn search_graph_json(sg: &SearchGraph, path: Option<&[SearchNodeId]>) -> Value {
    let on_path = |a: SearchNodeId, b: SearchNodeId| {
        path.is_some_and(|p| p.windows(2).any(|w| w[0] == a && w[1] == b))
    };

    let children: Vec<Value> = sg
        .nodes()
        .iter()
        .enumerate()
        .map(|(ix, node)| {
            let score = if node.g_score.is_finite() {
                format!("{:.2}", node.g_score)
            } else {
                "inf".to_string()
            };
            json!({
                "id": format!("n{ix}"),
                "width": NODE_WIDTH,
                "height": NODE_HEIGHT,
                "x": node.position.x * SEARCH_GRAPH_SCALE,
                "y": node.position.y * SEARCH_GRAPH_SCALE,
                "labels": [{ "text": score }],
            })
        })
        .collect();

    let edges: Vec<Value> = sg
        .edges()
        .iter()
        .enumerate()
        .map(|(ix, e)| {
            json!({
                "id": format!("e{ix}"),
                "sources": [format!("n{}", e.source.0)],
                "targets": [format!("n{}", e.target.0)],
                "labels": [{ "text": format!("{:.2}", e.weight) }],
                "properties": { "onPath": on_path(e.source, e.target) },
            })
        })
        .collect();

    json!({
        "id": "root",
        "properties": { "algorithm": "fixed" },
        "children": children,
        "edges": edges,
    })
}

pub(crate) fn trace_dependency_graph(g: &LGraph, hg: &HyperNodeGraph, boundary: usize, stage: &str) {
    if tracing::enabled!(tracing::Level::TRACE) {
        let graph = dependency_graph_json(g, hg);
        tracing::trace!(boundary, stage, %graph, "dependency graph");
    }
}

pub(crate) fn trace_search_graph(bundle: i32, sg: &SearchGraph, path: Option<&[SearchNodeId]>) {
    if tracing::enabled!(tracing::Level::TRACE) {
        let graph = search_graph_json(sg, path);
        tracing::trace!(bundle, %graph, "representative search graph");
    }
}

fn finite_or_null(v: f64) -> Value {
    if v.is_finite() { json!(v) } else { Value::Null }
}
