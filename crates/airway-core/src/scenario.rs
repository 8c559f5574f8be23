//! Built-in demo airspace and conflict test flights.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::graph::WaypointGraph;
use crate::models::{FlightTrajectory, RouteDirection, Waypoint};
use crate::trajectory::SegmentDistances;

/// Distance used for every segment of the demo flights.
pub const DEMO_SEGMENT_NM: f64 = 50.0;

const TEST_WAYPOINTS: [(&str, f64, f64); 6] = [
    ("A", 10.0, 106.0),
    ("B", 10.5, 106.5),
    ("C", 11.0, 107.0),
    ("D", 10.8, 106.8),
    ("E", 11.2, 106.2),
    ("F", 10.2, 107.2),
];

const TEST_ROUTES: [(&str, &str, f64); 6] = [
    ("A", "B", 50.0),
    ("B", "C", 60.0),
    ("A", "D", 40.0),
    ("D", "E", 45.0),
    ("C", "F", 55.0),
    ("E", "F", 35.0),
];

// callsign, route, speed (kts), flight level, minutes after base time
const TEST_FLIGHTS: [(&str, &[&str], f64, i32, i64); 8] = [
    // crossing at B
    ("TEST001", &["A", "B", "C"], 450.0, 330, 0),
    ("TEST002", &["D", "B", "E"], 460.0, 340, 5),
    // head-on on A-B
    ("TEST003", &["A", "B"], 440.0, 350, 10),
    ("TEST004", &["B", "A"], 450.0, 360, 12),
    // overtake on A-B-C
    ("TEST005", &["A", "B", "C"], 400.0, 370, 15),
    ("TEST006", &["A", "B", "C"], 500.0, 380, 16),
    // lateral: D and C are about 17 NM apart, passed about 10 s apart
    ("TEST007", &["A", "D"], 430.0, 390, 20),
    ("TEST008", &["B", "C"], 440.0, 400, 20),
];

/// 2025-01-19T08:00:00Z
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 19, 8, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Six waypoints joined by bidirectional `TEST` routes.
pub fn test_airspace() -> WaypointGraph {
    let mut graph = WaypointGraph::new();
    for (name, lat, lon) in TEST_WAYPOINTS {
        graph.add_waypoint(Waypoint::new(name, lat, lon));
    }
    for (from, to, distance) in TEST_ROUTES {
        graph.add_route(from, to, distance, "TEST", RouteDirection::Bidirectional);
    }
    graph
}

/// Eight flights arranged in crossing, head-on, overtake and lateral pairs.
pub fn test_flights() -> Vec<FlightTrajectory> {
    let base = base_time();
    TEST_FLIGHTS
        .iter()
        .map(|&(callsign, route, speed, level, offset_min)| {
            let route: Vec<String> = route.iter().map(|name| name.to_string()).collect();
            let distances = SegmentDistances::uniform(&route, DEMO_SEGMENT_NM);
            FlightTrajectory::new(
                callsign,
                route,
                speed,
                level,
                base + Duration::minutes(offset_min),
            )
            .with_estimated_times(&distances)
        })
        .collect()
}

/// Four waypoints in a chain, used when no airspace file is available.
pub fn default_airspace() -> WaypointGraph {
    let mut graph = WaypointGraph::new();
    for (name, lat, lon) in &TEST_WAYPOINTS[..4] {
        graph.add_waypoint(Waypoint::new(*name, *lat, *lon));
    }
    for pair in ["A", "B", "C", "D"].windows(2) {
        let distance = graph.great_circle_nm(pair[0], pair[1]).unwrap_or_default();
        graph.add_route(pair[0], pair[1], distance, "DEFAULT", RouteDirection::Bidirectional);
    }
    graph
}
