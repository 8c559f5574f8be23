//! Planner properties checked against the demo airspace and brute force.

use airway_core::{
    find_alternative_path, find_path, haversine_nm, scenario, FlightTrajectory, PathPlanner,
    PlanStrategy, PlannerConfig, RouteDirection, WaypointGraph,
};

fn flight(level: i32) -> FlightTrajectory {
    FlightTrajectory::new(
        "OWN1",
        vec!["A".to_string(), "C".to_string()],
        450.0,
        level,
        scenario::base_time(),
    )
}

/// Test airspace coordinates with every edge at least as long as the
/// great-circle distance between its endpoints.
fn admissible_airspace() -> WaypointGraph {
    let coordinates = scenario::test_airspace();
    let mut graph = WaypointGraph::new();
    for waypoint in coordinates.waypoints() {
        graph.add_waypoint(waypoint.clone());
    }
    let edges = [
        ("A", "B", 1.10),
        ("B", "C", 1.00),
        ("A", "D", 1.25),
        ("D", "E", 1.05),
        ("C", "F", 1.30),
        ("E", "F", 1.15),
        ("B", "D", 1.40),
        ("A", "E", 1.02),
        ("D", "F", 1.20),
    ];
    for (from, to, factor) in edges {
        let distance = coordinates.great_circle_nm(from, to).unwrap() * factor;
        graph.add_route(from, to, distance, "ADM", RouteDirection::Bidirectional);
    }
    graph
}

fn shortest_by_enumeration(graph: &WaypointGraph, start: &str, goal: &str) -> Option<f64> {
    fn walk(
        graph: &WaypointGraph,
        node: &str,
        goal: &str,
        visited: &mut Vec<String>,
        cost: f64,
        best: &mut Option<f64>,
    ) {
        if node == goal {
            if best.map_or(true, |b| cost < b) {
                *best = Some(cost);
            }
            return;
        }
        for edge in graph.neighbors(node) {
            if visited.contains(&edge.neighbor) {
                continue;
            }
            visited.push(edge.neighbor.clone());
            walk(graph, &edge.neighbor, goal, visited, cost + edge.distance_nm, best);
            visited.pop();
        }
    }

    let mut best = None;
    let mut visited = vec![start.to_string()];
    walk(graph, start, goal, &mut visited, 0.0, &mut best);
    best
}

#[test]
fn trivial_path_for_same_start_and_goal() {
    let graph = scenario::test_airspace();
    let result = find_path(&graph, "C", "C", &flight(330), &[]).unwrap();
    assert_eq!(result.path, vec!["C"]);
    assert_eq!(result.distance_nm, 0.0);
}

#[test]
fn unknown_or_unreachable_goal_has_no_path() {
    let mut graph = scenario::test_airspace();
    assert!(find_path(&graph, "A", "ZZZ", &flight(330), &[]).is_none());
    assert!(find_path(&graph, "ZZZ", "A", &flight(330), &[]).is_none());
    assert!(find_alternative_path(&graph, &flight(330), "ZZZ", "A", &[], 5).is_none());

    graph.add_waypoint(airway_core::Waypoint::new("ISLAND", 12.0, 108.0));
    assert!(find_path(&graph, "A", "ISLAND", &flight(330), &[]).is_none());
    assert!(find_alternative_path(&graph, &flight(330), "A", "ISLAND", &[], 5).is_none());
}

#[test]
fn unconstrained_cost_matches_exhaustive_search() {
    let graph = admissible_airspace();
    let config = PlannerConfig {
        enforce_turn_limit: false,
        avoid_traffic: false,
        ..PlannerConfig::default()
    };
    let planner = PathPlanner::new(&graph, config);
    let names: Vec<String> = graph.waypoints().iter().map(|w| w.name.clone()).collect();

    for start in &names {
        for goal in &names {
            let expected = shortest_by_enumeration(&graph, start, goal).unwrap();
            let found = planner.find_path(start, goal, &flight(330), &[]).unwrap();
            assert!(
                (found.distance_nm - expected).abs() < 1e-6,
                "{start}->{goal}: planner {} vs exhaustive {}",
                found.distance_nm,
                expected
            );
            // path cost is the sum of its edges
            let summed: f64 = found
                .path
                .windows(2)
                .map(|pair| graph.edge_distance(&pair[0], &pair[1]).unwrap())
                .sum();
            assert!((summed - found.distance_nm).abs() < 1e-6);
        }
    }
}

#[test]
fn heuristic_never_overestimates_in_admissible_airspace() {
    let graph = admissible_airspace();
    for edge in graph.edges() {
        let from = graph.waypoint(&edge.from).unwrap();
        let to = graph.waypoint(&edge.to).unwrap();
        let straight = haversine_nm(from.latitude, from.longitude, to.latitude, to.longitude);
        assert!(edge.distance + 1e-9 >= straight);
    }
}

#[test]
fn ladder_leaves_caller_flight_untouched() {
    let graph = scenario::test_airspace();
    let own = flight(330);
    // every route out of A is used at the filed level
    let traffic: Vec<FlightTrajectory> = [("T1", "B"), ("T2", "D")]
        .iter()
        .map(|(callsign, to)| {
            FlightTrajectory::new(
                *callsign,
                vec!["A".to_string(), to.to_string()],
                450.0,
                330,
                scenario::base_time(),
            )
        })
        .collect();

    let result = find_alternative_path(&graph, &own, "A", "C", &traffic, 5).unwrap();
    assert_eq!(result.strategy, PlanStrategy::LevelChange { attempt: 1 });
    assert_eq!(result.flight_level, 340);
    assert_eq!(result.path.first().map(String::as_str), Some("A"));
    assert_eq!(result.path.last().map(String::as_str), Some("C"));
    assert_eq!(own.flight_level, 330);
}
