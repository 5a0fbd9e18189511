mod common;

use common::{GraphSpec, bend_xs, parallel_upward_edges};
use lamantin::{
    BundleHandler, BundlingOptions, BundlingStrategy, BundlingStyle, OrthogonalRoutingGenerator,
    RoutingDirection, RoutingOptions, RoutingReport, Severity, XorShift64Star, route_graph,
};
use lamantin_lgraph::{EdgeId, LayerId, NodeType, Point, PortId, PortSide};

fn bundling(strategy: BundlingStrategy, style: BundlingStyle) -> RoutingOptions {
    RoutingOptions {
        bundling: BundlingOptions {
            strategy,
            style,
            bundle_spacing: 5.0,
        },
        ..Default::default()
    }
}

struct FirstPass {
    handler: BundleHandler,
    report: RoutingReport,
    random: XorShift64Star,
    generator: OrthogonalRoutingGenerator,
}

/// Routes every boundary once; the active handler's pipeline is left to the caller.
fn first_pass(spec: &mut GraphSpec, options: &RoutingOptions) -> FirstPass {
    let mut report = RoutingReport::default();
    let mut random = XorShift64Star::new(options.random_seed);
    let mut handler = BundleHandler::for_graph(&spec.g, options, &mut report).unwrap();
    let mut generator =
        OrthogonalRoutingGenerator::new(options.direction, options.edge_edge_spacing);
    let layers = spec.g.layer_count();
    for boundary in 0..=layers {
        let source = boundary.checked_sub(1).map(LayerId);
        let target = (boundary < layers).then_some(LayerId(boundary));
        generator
            .route_edges(&mut spec.g, boundary, source, target, 30.0, &mut random, &mut handler)
            .unwrap();
    }
    FirstPass {
        handler,
        report,
        random,
        generator,
    }
}

/// Edges from `a` (layer 0) to `c` (layer 2), each split by one long-edge dummy. Every route is
/// `(source offset on a, dummy y, target offset on c)`.
fn long_edges(routes: &[(f64, f64, f64)]) -> (GraphSpec, Vec<(EdgeId, EdgeId)>) {
    let mut spec = GraphSpec::new(3);
    let a = spec.node(0, "a", 0.0, 0.0, 20.0, 40.0);
    let c = spec.node(2, "c", 200.0, 0.0, 20.0, 40.0);
    let mut chains = Vec::new();
    for (i, &(source, dummy, target)) in routes.iter().enumerate() {
        let d = spec.typed_node(1, &format!("d{i}"), NodeType::LongEdge, 100.0, dummy, 0.0, 0.0);
        let from = spec.port(a, &format!("a{i}"), PortSide::East, source);
        let d_in = spec.port(d, &format!("d{i}_in"), PortSide::West, 0.0);
        let d_out = spec.port(d, &format!("d{i}_out"), PortSide::East, 0.0);
        let to = spec.port(c, &format!("c{i}"), PortSide::West, target);
        let first = spec.edge(&format!("e{i}a"), from, d_in);
        let second = spec.edge(&format!("e{i}b"), d_out, to);
        spec.g.node_mut(d).origin = Some(first);
        chains.push((first, second));
    }
    (spec, chains)
}

#[test]
fn automatic_bundle_shares_one_slot_with_centered_offsets() {
    let (mut spec, edges) = parallel_upward_edges(3);
    let options = bundling(BundlingStrategy::Automatic, BundlingStyle::Bundle);

    let report = route_graph(&mut spec.g, &options).unwrap();

    assert!(report.issues.is_empty(), "{:?}", report.issues);
    assert_eq!(report.slots_per_boundary[1], 1);

    let trunks: Vec<f64> = edges
        .iter()
        .map(|&e| {
            let xs = bend_xs(&spec.g, e);
            assert_eq!(xs.len(), 2);
            assert_eq!(xs[0], xs[1]);
            xs[0]
        })
        .collect();
    let mean = trunks.iter().sum::<f64>() / trunks.len() as f64;
    let offsets: Vec<f64> = trunks.iter().map(|x| x - mean).collect();
    assert_eq!(offsets, vec![-5.0, 0.0, 5.0]);

    for &x in &trunks {
        assert!(x > 20.0 && x < 100.0, "trunk {x} leaves the gap between the layers");
    }
}

#[test]
fn bundled_members_keep_their_own_anchors_between_the_same_nodes() {
    let (mut spec, edges) = parallel_upward_edges(3);
    let options = bundling(BundlingStrategy::Automatic, BundlingStyle::Bundle);

    route_graph(&mut spec.g, &options).unwrap();

    for &e in &edges {
        let edge = spec.g.edge(e);
        let source = spec.g.absolute_anchor(edge.source);
        let target = spec.g.absolute_anchor(edge.target);
        assert_eq!(edge.bend_points[0].y, source.y);
        assert_eq!(edge.bend_points[1].y, target.y);
        assert!(edge.junction_points.is_empty());
    }
}

#[test]
fn single_line_style_draws_members_on_one_trunk() {
    let (mut spec, edges) = parallel_upward_edges(3);
    let options = bundling(BundlingStrategy::Automatic, BundlingStyle::SingleLine);

    route_graph(&mut spec.g, &options).unwrap();

    let xs: Vec<f64> = edges.iter().flat_map(|&e| bend_xs(&spec.g, e)).collect();
    assert!(xs.windows(2).all(|w| w[0] == w[1]), "{xs:?}");
}

#[test]
fn manual_bundle_leaves_unbundled_edges_alone() {
    let mut spec = GraphSpec::new(2);
    let a = spec.node(0, "a", 0.0, 100.0, 20.0, 40.0);
    let b = spec.node(1, "b", 100.0, 0.0, 20.0, 40.0);
    let mut ports = Vec::new();
    for i in 0..3 {
        let offset = 10.0 * (i as f64 + 1.0);
        ports.push((
            spec.port(a, &format!("a{i}"), PortSide::East, offset),
            spec.port(b, &format!("b{i}"), PortSide::West, offset),
        ));
    }
    let first = spec.bundled_edge("first", ports[0].0, ports[0].1, 7);
    let middle = spec.edge("middle", ports[1].0, ports[1].1);
    let last = spec.bundled_edge("last", ports[2].0, ports[2].1, 7);

    let options = bundling(BundlingStrategy::Manual, BundlingStyle::Bundle);
    let report = route_graph(&mut spec.g, &options).unwrap();

    assert!(report.issues.is_empty(), "{:?}", report.issues);
    assert_eq!(report.slots_per_boundary[1], 2);
    let (x_first, x_last) = (bend_xs(&spec.g, first)[0], bend_xs(&spec.g, last)[0]);
    assert_eq!(x_last - x_first, 5.0);
    assert_eq!(spec.g.edge(middle).bend_points.len(), 2);
}

#[test]
fn bundling_is_deterministic_for_a_seed() {
    let route = || {
        let (mut spec, edges) = parallel_upward_edges(4);
        let options = bundling(BundlingStrategy::Automatic, BundlingStyle::Bundle);
        route_graph(&mut spec.g, &options).unwrap();
        edges
            .iter()
            .map(|&e| spec.g.edge(e).bend_points.clone())
            .collect::<Vec<Vec<Point>>>()
    };
    assert_eq!(route(), route());
}

#[test]
fn bundling_outside_west_to_east_falls_back_with_a_warning() {
    let mut spec = GraphSpec::new(2);
    let a = spec.node(0, "a", 0.0, 0.0, 40.0, 20.0);
    let b = spec.node(1, "b", 100.0, 100.0, 40.0, 20.0);
    for i in 0..2 {
        let offset = 10.0 * (i as f64 + 1.0);
        let pa = spec.port(a, &format!("a{i}"), PortSide::South, offset);
        let pb = spec.port(b, &format!("b{i}"), PortSide::North, offset);
        spec.edge(&format!("e{i}"), pa, pb);
    }

    let options = RoutingOptions {
        direction: RoutingDirection::NorthToSouth,
        ..bundling(BundlingStrategy::Automatic, BundlingStyle::Bundle)
    };
    let report = route_graph(&mut spec.g, &options).unwrap();

    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].severity, Severity::Warning);
    assert_eq!(report.slots_per_boundary[1], 2);
    for e in spec.g.edge_ids() {
        assert_eq!(spec.g.edge(e).bend_points.len(), 2);
    }
}

#[test]
fn automatic_bundling_without_parallel_edges_matches_plain_routing() {
    let build = || {
        let mut spec = GraphSpec::new(2);
        let a = spec.node(0, "a", 0.0, 0.0, 20.0, 40.0);
        let b1 = spec.node(1, "b1", 100.0, 0.0, 20.0, 20.0);
        let b2 = spec.node(1, "b2", 100.0, 40.0, 20.0, 20.0);
        let p0 = spec.port(a, "p0", PortSide::East, 10.0);
        let p1 = spec.port(a, "p1", PortSide::East, 30.0);
        let q1 = spec.port(b1, "q1", PortSide::West, 5.0);
        let q2 = spec.port(b2, "q2", PortSide::West, 15.0);
        spec.edge("e0", p0, q2);
        spec.edge("e1", p1, q1);
        spec
    };

    let mut plain = build();
    route_graph(&mut plain.g, &RoutingOptions::default()).unwrap();
    let mut bundled = build();
    let options = bundling(BundlingStrategy::Automatic, BundlingStyle::Bundle);
    route_graph(&mut bundled.g, &options).unwrap();

    for e in plain.g.edge_ids() {
        assert_eq!(plain.g.edge(e).bend_points, bundled.g.edge(e).bend_points);
    }
}

#[test]
fn merged_hyper_node_owns_every_member_port_once() {
    let (mut spec, edges) = parallel_upward_edges(3);
    let options = bundling(BundlingStrategy::Automatic, BundlingStyle::Bundle);
    let FirstPass {
        mut handler,
        mut report,
        mut random,
        generator,
    } = first_pass(&mut spec, &options);
    // Bend points wait for the bundle pipeline.
    assert!(spec.g.edge_ids().all(|e| spec.g.edge(e).bend_points.is_empty()));

    let BundleHandler::Active(ctx) = &mut handler else {
        panic!("bundling stayed lazy");
    };
    ctx.calc_shortest_edges(&spec.g).unwrap();
    ctx.check_free_slots(&spec.g, &mut report).unwrap();
    let slots = ctx
        .merge_hyper_nodes(&spec.g, &mut random, generator.conflict_threshold())
        .unwrap();

    assert!(report.issues.is_empty(), "{:?}", report.issues);
    assert!(slots.contains(&(1, 1)), "{slots:?}");
    let state = ctx.boundary(1).unwrap();
    assert_eq!(state.hyper_nodes.len(), 1);
    let hn = &state.hyper_nodes.nodes()[0];
    assert_eq!(hn.width, 15.0);

    let mut expected: Vec<PortId> = edges
        .iter()
        .flat_map(|&e| [spec.g.edge(e).source, spec.g.edge(e).target])
        .collect();
    expected.sort();
    let mut ports: Vec<PortId> = hn.ports.iter().copied().collect();
    ports.sort();
    assert_eq!(ports, expected);
    assert_eq!(state.members.values().next(), Some(&edges));
}

#[test]
fn representative_follows_the_chain_that_stays_near_the_bundle() {
    // The middle chain detours far below the others through its dummy.
    let (mut spec, chains) =
        long_edges(&[(10.0, 15.0, 10.0), (20.0, 500.0, 20.0), (30.0, 25.0, 30.0)]);
    let options = bundling(BundlingStrategy::Automatic, BundlingStyle::Bundle);
    let FirstPass { mut handler, .. } = first_pass(&mut spec, &options);

    let BundleHandler::Active(ctx) = &mut handler else {
        panic!("bundling stayed lazy");
    };
    ctx.calc_shortest_edges(&spec.g).unwrap();

    let first = ctx.representative(0, 1).unwrap();
    assert_ne!(first, chains[1].0);
    let (_, second) = chains
        .iter()
        .copied()
        .find(|&(head, _)| head == first)
        .unwrap();
    assert_eq!(ctx.representative(0, 2), Some(second));
}

#[test]
fn bundle_through_dummies_shares_one_slot_per_boundary() {
    let (mut spec, chains) =
        long_edges(&[(10.0, 15.0, 10.0), (20.0, 60.0, 20.0), (30.0, 25.0, 30.0)]);
    let options = bundling(BundlingStrategy::Automatic, BundlingStyle::Bundle);

    let report = route_graph(&mut spec.g, &options).unwrap();

    assert!(report.issues.is_empty(), "{:?}", report.issues);
    assert_eq!(report.slots_per_boundary, vec![0, 1, 1, 0]);

    for (i, &(first, second)) in chains.iter().enumerate() {
        let anchor = 10.0 * (i as f64 + 1.0);
        let first = &spec.g.edge(first).bend_points;
        let second = &spec.g.edge(second).bend_points;
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 2);
        // Real nodes keep their anchors, the dummy layer carries the offsets.
        assert_eq!(first[0].y, anchor);
        assert_eq!(second[1].y, anchor);
        assert_eq!(second[0].y, first[1].y);
    }

    let through_dummies: Vec<f64> = chains
        .iter()
        .map(|&(first, _)| spec.g.edge(first).bend_points[1].y)
        .collect();
    let shared = through_dummies[1];
    assert!(shared == 15.0 || shared == 25.0, "{through_dummies:?}");
    assert_eq!(through_dummies, vec![shared - 5.0, shared, shared + 5.0]);
    assert!(
        spec.g
            .edge_ids()
            .all(|e| spec.g.edge(e).junction_points.is_empty())
    );
}

#[test]
fn manual_bundle_id_on_first_segment_covers_the_dummy_chain() {
    // Without bundling the second boundary needs two slots for the crossing pair.
    let (mut spec, chains) = long_edges(&[(10.0, 15.0, 20.0), (20.0, 25.0, 10.0)]);
    for &(first, _) in &chains {
        spec.g.edge_mut(first).bundle_id = Some(3);
    }
    let mut plain = spec.g.clone();
    let plain_report = route_graph(&mut plain, &RoutingOptions::default()).unwrap();
    assert_eq!(plain_report.slots_per_boundary[2], 2);

    let options = bundling(BundlingStrategy::Manual, BundlingStyle::Bundle);
    let report = route_graph(&mut spec.g, &options).unwrap();

    assert!(report.issues.is_empty(), "{:?}", report.issues);
    assert_eq!(report.slots_per_boundary[1], 1);
    assert_eq!(report.slots_per_boundary[2], 1);
    let leaving: Vec<f64> = chains
        .iter()
        .map(|&(_, second)| spec.g.edge(second).bend_points[0].y)
        .collect();
    assert_eq!(leaving[1] - leaving[0], 5.0);
}

#[test]
fn bundle_without_a_free_slot_routes_its_members_alone() {
    let mut spec = GraphSpec::new(2);
    let a = spec.node(0, "a", 0.0, 0.0, 20.0, 80.0);
    let b = spec.node(1, "b", 100.0, 0.0, 20.0, 80.0);
    let mut edge = |name: &str, from: f64, to: f64, bundle: Option<i32>| {
        let source = spec.port(a, &format!("{name}_out"), PortSide::East, from);
        let target = spec.port(b, &format!("{name}_in"), PortSide::West, to);
        match bundle {
            Some(bundle) => spec.bundled_edge(name, source, target, bundle),
            None => spec.edge(name, source, target),
        }
    };
    let top = edge("top", 10.0, 20.0, Some(1));
    // Sits in the same slot, inside the span the bundle's trunk would cover.
    let between = edge("between", 30.0, 40.0, None);
    let bottom = edge("bottom", 60.0, 70.0, Some(1));
    let options = bundling(BundlingStrategy::Manual, BundlingStyle::Bundle);

    let report = route_graph(&mut spec.g, &options).unwrap();

    assert_eq!(report.issues.len(), 2, "{:?}", report.issues);
    for issue in &report.issues {
        assert_eq!(issue.severity, Severity::Warning);
        assert_eq!(issue.edge, Some(top));
        assert!(issue.message.contains("no free slot"), "{}", issue.message);
    }
    assert_eq!(report.slots_per_boundary[1], 1);
    for (e, from, to) in [(top, 10.0, 20.0), (between, 30.0, 40.0), (bottom, 60.0, 70.0)] {
        let ys: Vec<f64> = spec.g.edge(e).bend_points.iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![from, to]);
        assert!(spec.g.edge(e).junction_points.is_empty());
    }
}

#[test]
fn bundles_fanning_out_of_one_port_keep_distinct_offsets() {
    let mut spec = GraphSpec::new(2);
    let a = spec.node(0, "a", 0.0, 0.0, 20.0, 100.0);
    let c = spec.node(1, "c", 100.0, 0.0, 20.0, 30.0);
    let e = spec.node(1, "e", 100.0, 70.0, 20.0, 30.0);
    let p = spec.port(a, "p", PortSide::East, 50.0);
    let q0 = spec.port(c, "q0", PortSide::West, 10.0);
    let q1 = spec.port(c, "q1", PortSide::West, 20.0);
    let r0 = spec.port(e, "r0", PortSide::West, 10.0);
    let r1 = spec.port(e, "r1", PortSide::West, 20.0);
    let c0 = spec.edge("c0", p, q0);
    let c1 = spec.edge("c1", p, q1);
    let e0 = spec.edge("e0", p, r0);
    let e1 = spec.edge("e1", p, r1);
    let options = bundling(BundlingStrategy::Automatic, BundlingStyle::Bundle);

    let report = route_graph(&mut spec.g, &options).unwrap();

    assert!(report.issues.is_empty(), "{:?}", report.issues);
    assert_eq!(report.slots_per_boundary[1], 1);
    let trunk = |edge: EdgeId| {
        let xs = bend_xs(&spec.g, edge);
        assert_eq!(xs.len(), 2);
        assert_eq!(xs[0], xs[1]);
        xs[0]
    };
    assert_eq!(trunk(c1) - trunk(c0), 5.0);
    assert_eq!(trunk(e0) - trunk(e1), 5.0);
    for edge in [c0, c1, e0, e1] {
        assert_eq!(spec.g.edge(edge).bend_points[0].y, 50.0);
    }
}
