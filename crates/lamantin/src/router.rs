//! Routing a whole layered graph.

use crate::bundles::BundleHandler;
use crate::error::Result;
use crate::options::RoutingOptions;
use crate::random::XorShift64Star;
use crate::report::RoutingReport;
use crate::routing::OrthogonalRoutingGenerator;
use lamantin_lgraph::{LGraph, LayerId};

/// Routes every edge of `g` orthogonally, replacing any previous bend and junction points.
///
/// Boundary `b` lies between layers `b - 1` and `b`; boundaries `0` and `layer_count` route the
/// edges leaving the outer layers on their far sides. Routing is deterministic for a given
/// graph and `options.random_seed`.
pub fn route_graph(g: &mut LGraph, options: &RoutingOptions) -> Result<RoutingReport> {
    g.clear_routes();
    let mut report = RoutingReport::default();
    let mut random = XorShift64Star::new(options.random_seed);
    let mut handler = BundleHandler::for_graph(g, options, &mut report)?;
    let mut generator =
        OrthogonalRoutingGenerator::new(options.direction, options.edge_edge_spacing);

    let layer_count = g.layer_count();
    for boundary in 0..=layer_count {
        let source = boundary.checked_sub(1).map(LayerId);
        let target = (boundary < layer_count).then_some(LayerId(boundary));
        let start_pos = options
            .direction
            .first_slot_position(g, source, options.edge_node_spacing);
        let slots = generator.route_edges(
            g,
            boundary,
            source,
            target,
            start_pos,
            &mut random,
            &mut handler,
        )?;
        report.slots_per_boundary.push(slots);
    }

    if let BundleHandler::Active(ctx) = &mut handler {
        ctx.calc_shortest_edges(g)?;
        ctx.check_free_slots(g, &mut report)?;
        for (boundary, slots) in
            ctx.merge_hyper_nodes(g, &mut random, generator.conflict_threshold())?
        {
            if let Some(entry) = report.slots_per_boundary.get_mut(boundary) {
                *entry = slots;
            }
        }
        ctx.shift_hyper_nodes(g, &mut report);
    }

    if let Some(ctx) = handler.context() {
        for (boundary, state) in ctx.boundaries() {
            let hg = &state.hyper_nodes;
            for id in hg.ids() {
                if !hg.node(id).is_straight() {
                    generator.calculate_bend_points(g, hg, id, state.start_pos, boundary, &handler);
                }
            }
            generator.clear_junction_points();
        }
    }

    tracing::debug!(
        layers = layer_count,
        edges = g.edge_count(),
        issues = report.issues.len(),
        "routed graph"
    );
    Ok(report)
}
