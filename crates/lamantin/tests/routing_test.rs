mod common;

use common::GraphSpec;
use lamantin::{RoutingDirection, RoutingOptions, route_graph};
use lamantin_lgraph::{Point, PortSide};

#[test]
fn single_edge_gets_two_bend_points_in_first_slot() {
    let mut spec = GraphSpec::new(2);
    let a = spec.node(0, "a", 0.0, 0.0, 20.0, 20.0);
    let b = spec.node(1, "b", 100.0, 40.0, 20.0, 20.0);
    let pa = spec.port(a, "pa", PortSide::East, 5.0);
    let pb = spec.port(b, "pb", PortSide::West, 5.0);
    let e = spec.edge("e", pa, pb);

    let report = route_graph(&mut spec.g, &RoutingOptions::default()).unwrap();

    assert_eq!(
        spec.g.edge(e).bend_points,
        vec![Point::new(30.0, 5.0), Point::new(30.0, 45.0)]
    );
    assert!(spec.g.edge(e).junction_points.is_empty());
    assert_eq!(report.slots_per_boundary, vec![0, 1, 0]);
    assert!(report.issues.is_empty());
}

#[test]
fn straight_edges_take_no_slot_and_no_bend_points() {
    let mut spec = GraphSpec::new(2);
    let a = spec.node(0, "a", 0.0, 0.0, 20.0, 20.0);
    let b = spec.node(1, "b", 100.0, 0.0, 20.0, 20.0);
    let pa = spec.port(a, "pa", PortSide::East, 10.0);
    let pb = spec.port(b, "pb", PortSide::West, 10.0);
    let e = spec.edge("e", pa, pb);

    let report = route_graph(&mut spec.g, &RoutingOptions::default()).unwrap();

    assert!(spec.g.edge(e).bend_points.is_empty());
    assert_eq!(report.slots_per_boundary, vec![0, 0, 0]);
}

#[test]
fn fan_out_gets_one_junction_point_at_the_split() {
    let mut spec = GraphSpec::new(2);
    let a = spec.node(0, "a", 0.0, 0.0, 20.0, 40.0);
    let b1 = spec.node(1, "b1", 100.0, -10.0, 20.0, 20.0);
    let b2 = spec.node(1, "b2", 100.0, 30.0, 20.0, 20.0);
    let pa = spec.port(a, "pa", PortSide::East, 20.0);
    let pb1 = spec.port(b1, "pb1", PortSide::West, 10.0);
    let pb2 = spec.port(b2, "pb2", PortSide::West, 10.0);
    let up = spec.edge("up", pa, pb1);
    let down = spec.edge("down", pa, pb2);

    let report = route_graph(&mut spec.g, &RoutingOptions::default()).unwrap();

    assert_eq!(report.slots_per_boundary[1], 1);
    assert_eq!(
        spec.g.edge(up).bend_points,
        vec![Point::new(30.0, 20.0), Point::new(30.0, 0.0)]
    );
    assert_eq!(
        spec.g.edge(down).bend_points,
        vec![Point::new(30.0, 20.0), Point::new(30.0, 40.0)]
    );
    assert_eq!(spec.g.edge(up).junction_points, vec![Point::new(30.0, 20.0)]);
    assert!(spec.g.edge(down).junction_points.is_empty());
}

#[test]
fn overlapping_edges_are_ordered_to_avoid_crossings() {
    let mut spec = GraphSpec::new(2);
    let a = spec.node(0, "a", 0.0, 0.0, 20.0, 40.0);
    let b = spec.node(1, "b", 100.0, 0.0, 20.0, 40.0);
    let p0 = spec.port(a, "p0", PortSide::East, 0.0);
    let p1 = spec.port(a, "p1", PortSide::East, 10.0);
    let q0 = spec.port(b, "q0", PortSide::West, 20.0);
    let q1 = spec.port(b, "q1", PortSide::West, 30.0);
    let upper = spec.edge("upper", p0, q0);
    let lower = spec.edge("lower", p1, q1);

    let report = route_graph(&mut spec.g, &RoutingOptions::default()).unwrap();

    assert_eq!(report.slots_per_boundary[1], 2);
    // The lower edge's trunk goes left so the upper edge's right run passes above it.
    assert_eq!(
        spec.g.edge(lower).bend_points,
        vec![Point::new(30.0, 10.0), Point::new(30.0, 30.0)]
    );
    assert_eq!(
        spec.g.edge(upper).bend_points,
        vec![Point::new(40.0, 0.0), Point::new(40.0, 20.0)]
    );
}

#[test]
fn north_to_south_routes_horizontal_trunks_below_the_layer() {
    let mut spec = GraphSpec::new(2);
    let a = spec.node(0, "a", 0.0, 0.0, 20.0, 20.0);
    let b = spec.node(1, "b", 40.0, 100.0, 20.0, 20.0);
    let pa = spec.port(a, "pa", PortSide::South, 5.0);
    let pb = spec.port(b, "pb", PortSide::North, 5.0);
    let e = spec.edge("e", pa, pb);

    let options = RoutingOptions {
        direction: RoutingDirection::NorthToSouth,
        ..Default::default()
    };
    route_graph(&mut spec.g, &options).unwrap();

    assert_eq!(
        spec.g.edge(e).bend_points,
        vec![Point::new(5.0, 30.0), Point::new(45.0, 30.0)]
    );
}

#[test]
fn south_to_north_counts_slots_upward() {
    let mut spec = GraphSpec::new(2);
    let a = spec.node(0, "a", 0.0, 100.0, 20.0, 20.0);
    let b = spec.node(1, "b", 40.0, 0.0, 20.0, 20.0);
    let pa = spec.port(a, "pa", PortSide::North, 5.0);
    let pb = spec.port(b, "pb", PortSide::South, 5.0);
    let e = spec.edge("e", pa, pb);

    let options = RoutingOptions {
        direction: RoutingDirection::SouthToNorth,
        ..Default::default()
    };
    route_graph(&mut spec.g, &options).unwrap();

    assert_eq!(
        spec.g.edge(e).bend_points,
        vec![Point::new(5.0, 90.0), Point::new(45.0, 90.0)]
    );
}

#[test]
fn routing_twice_replaces_previous_routes() {
    let mut spec = GraphSpec::new(2);
    let a = spec.node(0, "a", 0.0, 0.0, 20.0, 20.0);
    let b = spec.node(1, "b", 100.0, 40.0, 20.0, 20.0);
    let pa = spec.port(a, "pa", PortSide::East, 5.0);
    let pb = spec.port(b, "pb", PortSide::West, 5.0);
    let e = spec.edge("e", pa, pb);

    route_graph(&mut spec.g, &RoutingOptions::default()).unwrap();
    let first = spec.g.edge(e).bend_points.clone();
    route_graph(&mut spec.g, &RoutingOptions::default()).unwrap();

    assert_eq!(spec.g.edge(e).bend_points, first);
    assert_eq!(first.len(), 2);
}

#[test]
fn long_edge_is_routed_at_every_boundary_it_crosses() {
    use lamantin_lgraph::NodeType;

    let mut spec = GraphSpec::new(3);
    let a = spec.node(0, "a", 0.0, 0.0, 20.0, 20.0);
    let d = spec.typed_node(1, "d", NodeType::LongEdge, 100.0, 50.0, 0.0, 0.0);
    let b = spec.node(2, "b", 200.0, 0.0, 20.0, 20.0);
    let pa = spec.port(a, "pa", PortSide::East, 10.0);
    let d_in = spec.port(d, "d_in", PortSide::West, 0.0);
    let d_out = spec.port(d, "d_out", PortSide::East, 0.0);
    let pb = spec.port(b, "pb", PortSide::West, 10.0);
    let first = spec.edge("a-d", pa, d_in);
    let second = spec.edge("d-b", d_out, pb);
    spec.g.node_mut(d).origin = Some(first);

    let report = route_graph(&mut spec.g, &RoutingOptions::default()).unwrap();

    assert_eq!(report.slots_per_boundary, vec![0, 1, 1, 0]);
    assert_eq!(
        spec.g.edge(first).bend_points,
        vec![Point::new(30.0, 10.0), Point::new(30.0, 50.0)]
    );
    assert_eq!(
        spec.g.edge(second).bend_points,
        vec![Point::new(110.0, 50.0), Point::new(110.0, 10.0)]
    );
}
