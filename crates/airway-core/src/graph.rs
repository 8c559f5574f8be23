//! Waypoint graph (airspace model).
//!
//! Named waypoints plus a directed, weighted adjacency list. Built once per
//! session and read-only afterwards, so it can be shared freely between
//! concurrent readers.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{RouteDirection, RouteEdge, Waypoint};
use crate::spatial::haversine_nm;
use crate::trajectory::{DistanceLookup, SegmentDistances};

/// Flat view of one directed edge, as exposed to front ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteListing {
    pub from: String,
    pub to: String,
    pub distance: f64,
    pub airway: String,
    pub direction: RouteDirection,
}

#[derive(Debug, Clone, Default)]
pub struct WaypointGraph {
    waypoints: HashMap<String, Waypoint>,
    routes: HashMap<String, Vec<RouteEdge>>,
}

impl WaypointGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a waypoint by name and make sure it has an edge list.
    pub fn add_waypoint(&mut self, waypoint: Waypoint) {
        self.routes.entry(waypoint.name.clone()).or_default();
        self.waypoints.insert(waypoint.name.clone(), waypoint);
    }

    /// Append a directed edge, plus the reverse edge when bidirectional.
    ///
    /// Endpoints are expected to exist already; the loader enforces that.
    pub fn add_route(
        &mut self,
        from: &str,
        to: &str,
        distance_nm: f64,
        airway: &str,
        direction: RouteDirection,
    ) {
        self.routes.entry(from.to_string()).or_default().push(RouteEdge {
            neighbor: to.to_string(),
            distance_nm,
            airway: airway.to_string(),
            direction,
        });
        if direction == RouteDirection::Bidirectional {
            self.routes.entry(to.to_string()).or_default().push(RouteEdge {
                neighbor: from.to_string(),
                distance_nm,
                airway: airway.to_string(),
                direction,
            });
        }
    }

    /// Outgoing edges of a waypoint; empty for unknown names.
    pub fn neighbors(&self, name: &str) -> &[RouteEdge] {
        self.routes.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn waypoint(&self, name: &str) -> Option<&Waypoint> {
        self.waypoints.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.waypoints.contains_key(name)
    }

    pub fn waypoint_count(&self) -> usize {
        self.waypoints.len()
    }

    /// Number of directed edges (a bidirectional route counts twice).
    pub fn route_count(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    /// All waypoints ordered by name.
    pub fn waypoints(&self) -> Vec<&Waypoint> {
        let mut list: Vec<&Waypoint> = self.waypoints.values().collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        list
    }

    /// Every directed edge, ordered by source name then insertion order.
    pub fn edges(&self) -> Vec<RouteListing> {
        let mut sources: Vec<&String> = self.routes.keys().collect();
        sources.sort();
        sources
            .into_iter()
            .flat_map(|from| {
                self.routes[from].iter().map(move |edge| RouteListing {
                    from: from.clone(),
                    to: edge.neighbor.clone(),
                    distance: edge.distance_nm,
                    airway: edge.airway.clone(),
                    direction: edge.direction,
                })
            })
            .collect()
    }

    /// Distance of the first edge `from -> to`, if any.
    pub fn edge_distance(&self, from: &str, to: &str) -> Option<f64> {
        self.neighbors(from)
            .iter()
            .find(|edge| edge.neighbor == to)
            .map(|edge| edge.distance_nm)
    }

    /// Great-circle distance between two known waypoints.
    pub fn great_circle_nm(&self, from: &str, to: &str) -> Option<f64> {
        let a = self.waypoints.get(from)?;
        let b = self.waypoints.get(to)?;
        Some(haversine_nm(a.latitude, a.longitude, b.latitude, b.longitude))
    }

    /// Distance table for a route from waypoint coordinates.
    ///
    /// Pairs with an unknown endpoint are left out, which leaves a gap in
    /// any ETA map computed from the table.
    pub fn great_circle_distances(&self, route: &[String]) -> SegmentDistances {
        let mut distances = SegmentDistances::new();
        for pair in route.windows(2) {
            if let Some(distance) = self.great_circle_nm(&pair[0], &pair[1]) {
                distances.insert(&pair[0], &pair[1], distance);
            }
        }
        distances
    }
}

impl DistanceLookup for WaypointGraph {
    fn distance_nm(&self, from: &str, to: &str) -> Option<f64> {
        self.edge_distance(from, to)
            .or_else(|| self.edge_distance(to, from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> WaypointGraph {
        let mut graph = WaypointGraph::new();
        graph.add_waypoint(Waypoint::new("A", 10.0, 106.0));
        graph.add_waypoint(Waypoint::new("B", 10.5, 106.5));
        graph.add_waypoint(Waypoint::new("C", 11.0, 107.0));
        graph
    }

    #[test]
    fn bidirectional_route_inserts_reverse_edge() {
        let mut graph = graph();
        graph.add_route("A", "B", 50.0, "W1", RouteDirection::Bidirectional);

        assert_eq!(graph.neighbors("A").len(), 1);
        assert_eq!(graph.neighbors("B").len(), 1);
        let reverse = &graph.neighbors("B")[0];
        assert_eq!(reverse.neighbor, "A");
        assert_eq!(reverse.distance_nm, 50.0);
        assert_eq!(reverse.airway, "W1");
        assert_eq!(graph.route_count(), 2);
    }

    #[test]
    fn oneway_route_inserts_forward_edge_only() {
        let mut graph = graph();
        graph.add_route("B", "C", 60.0, "W2", RouteDirection::Oneway);

        assert_eq!(graph.neighbors("B").len(), 1);
        assert!(graph.neighbors("C").is_empty());
        assert_eq!(graph.edge_distance("B", "C"), Some(60.0));
        assert_eq!(graph.edge_distance("C", "B"), None);
        // distance lookups ignore orientation
        assert_eq!(graph.distance_nm("C", "B"), Some(60.0));
    }

    #[test]
    fn upsert_keeps_existing_edges() {
        let mut graph = graph();
        graph.add_route("A", "B", 50.0, "W1", RouteDirection::Bidirectional);
        graph.add_waypoint(Waypoint::new("A", 10.1, 106.1));

        assert_eq!(graph.waypoint_count(), 3);
        assert_eq!(graph.waypoint("A").unwrap().latitude, 10.1);
        assert_eq!(graph.neighbors("A").len(), 1);
    }

    #[test]
    fn unknown_waypoint_has_no_neighbors() {
        let graph = graph();
        assert!(graph.neighbors("ZZZ").is_empty());
    }

    #[test]
    fn great_circle_table_skips_unknown_waypoints() {
        let graph = graph();
        let route = vec!["A".to_string(), "B".to_string(), "X".to_string()];
        let table = graph.great_circle_distances(&route);
        assert!(table.distance_nm("A", "B").is_some());
        assert!(table.distance_nm("B", "X").is_none());
    }

    #[test]
    fn edge_listing_is_sorted_by_source() {
        let mut graph = graph();
        graph.add_route("B", "C", 60.0, "W2", RouteDirection::Bidirectional);
        graph.add_route("A", "B", 50.0, "W1", RouteDirection::Oneway);
        let listing = graph.edges();
        let sources: Vec<&str> = listing.iter().map(|r| r.from.as_str()).collect();
        assert_eq!(sources, vec!["A", "B", "C"]);
    }
}
