//! Core data models for the airway system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::trajectory::{estimate_times, DistanceLookup};

/// Kind of navigational fix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WaypointCategory {
    /// VHF Omnidirectional Range
    Vor,
    /// Non-Directional Beacon
    Ndb,
    /// Fixed point
    #[default]
    Fix,
}

/// A named navigational fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, rename = "type")]
    pub category: WaypointCategory,
}

impl Waypoint {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            category: WaypointCategory::Fix,
        }
    }

    pub fn with_category(mut self, category: WaypointCategory) -> Self {
        self.category = category;
        self
    }

    pub fn coordinates(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

/// Direction tag of an airway segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteDirection {
    #[default]
    Bidirectional,
    Oneway,
}

/// Directed edge stored in the adjacency list of a waypoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteEdge {
    pub neighbor: String,
    pub distance_nm: f64,
    pub airway: String,
    pub direction: RouteDirection,
}

/// A planned flight through the waypoint network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightTrajectory {
    pub callsign: String,
    /// Ordered waypoint names of the flight plan
    pub route: Vec<String>,
    /// Ground speed in knots
    pub speed_kts: f64,
    /// Flight level in hundreds of feet (330 = 33,000 ft)
    pub flight_level: i32,
    /// Instant the flight starts traversing `route[0]`
    pub entry_time: DateTime<Utc>,
    /// Estimated arrival per waypoint. Sparse: a waypoint whose inbound
    /// segment distance was unknown has no entry.
    #[serde(default)]
    pub estimated_times: BTreeMap<String, DateTime<Utc>>,
}

impl FlightTrajectory {
    pub fn new(
        callsign: impl Into<String>,
        route: Vec<String>,
        speed_kts: f64,
        flight_level: i32,
        entry_time: DateTime<Utc>,
    ) -> Self {
        Self {
            callsign: callsign.into(),
            route,
            speed_kts,
            flight_level,
            entry_time,
            estimated_times: BTreeMap::new(),
        }
    }

    /// Recompute the estimated-time map from a distance table.
    pub fn calculate_estimated_times(&mut self, distances: &impl DistanceLookup) {
        self.estimated_times = estimate_times(&self.route, self.speed_kts, self.entry_time, distances);
    }

    /// Builder-style variant of [`Self::calculate_estimated_times`].
    pub fn with_estimated_times(mut self, distances: &impl DistanceLookup) -> Self {
        self.calculate_estimated_times(distances);
        self
    }

    /// Copy of this flight at another level. The original is left untouched.
    pub fn at_flight_level(&self, flight_level: i32) -> Self {
        Self {
            flight_level,
            ..self.clone()
        }
    }

    pub fn eta(&self, waypoint: &str) -> Option<DateTime<Utc>> {
        self.estimated_times.get(waypoint).copied()
    }

    /// Directed segments `(route[i], route[i+1])` in flight order.
    pub fn segments(&self) -> impl Iterator<Item = (&str, &str)> {
        self.route
            .windows(2)
            .map(|pair| (pair[0].as_str(), pair[1].as_str()))
    }

    /// Earliest and latest known ETA.
    pub fn time_span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let min = self.estimated_times.values().min()?;
        let max = self.estimated_times.values().max()?;
        Some((*min, *max))
    }

    /// Vertical distance to another flight in feet.
    pub fn vertical_separation_ft(&self, other: &FlightTrajectory) -> f64 {
        vertical_separation_ft(self.flight_level, other.flight_level)
    }
}

/// Vertical distance between two flight levels in feet.
pub fn vertical_separation_ft(level1: i32, level2: i32) -> f64 {
    level1.abs_diff(level2) as f64 * 100.0
}
