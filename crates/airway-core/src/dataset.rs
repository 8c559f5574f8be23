//! Dataset ingestion: airspace and flight-plan JSON.
//!
//! Turns loader payloads into a [`WaypointGraph`] and a set of
//! [`FlightTrajectory`] values with computed ETAs.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use crate::error::DatasetError;
use crate::graph::WaypointGraph;
use crate::models::{FlightTrajectory, RouteDirection, Waypoint, WaypointCategory};

pub const DEFAULT_AIRWAY: &str = "AUTO";

/// Accepted ground speeds in knots.
pub const SPEED_RANGE_KTS: RangeInclusive<f64> = 1.0..=2000.0;

/// Accepted flight levels (hundreds of feet).
pub const FLIGHT_LEVEL_RANGE: RangeInclusive<i32> = 0..=999;

/// Airspace payload: waypoints plus edges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirspaceData {
    pub waypoints: WaypointEntries,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

/// Waypoints as an array of records or as an object keyed by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WaypointEntries {
    List(Vec<WaypointRecord>),
    Map(BTreeMap<String, WaypointCoords>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaypointRecord {
    pub name: String,
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "longitude")]
    pub lon: f64,
    #[serde(default, rename = "type")]
    pub category: WaypointCategory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaypointCoords {
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "longitude")]
    pub lon: f64,
    #[serde(default, rename = "type")]
    pub category: WaypointCategory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub distance_nm: f64,
    #[serde(default)]
    pub direction: RouteDirection,
    #[serde(default = "default_airway")]
    pub airway: String,
}

fn default_airway() -> String {
    DEFAULT_AIRWAY.to_string()
}

impl AirspaceData {
    pub fn from_json(json: &str) -> Result<Self, DatasetError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build the graph. Edges referencing an unknown waypoint are skipped.
    pub fn build_graph(&self) -> WaypointGraph {
        let mut graph = WaypointGraph::new();
        match &self.waypoints {
            WaypointEntries::List(records) => {
                for record in records {
                    graph.add_waypoint(
                        Waypoint::new(&record.name, record.lat, record.lon)
                            .with_category(record.category),
                    );
                }
            }
            WaypointEntries::Map(records) => {
                for (name, coords) in records {
                    graph.add_waypoint(
                        Waypoint::new(name, coords.lat, coords.lon).with_category(coords.category),
                    );
                }
            }
        }

        for edge in &self.edges {
            if !graph.contains(&edge.source) || !graph.contains(&edge.target) {
                tracing::warn!(
                    source = %edge.source,
                    target = %edge.target,
                    "skipping edge with unknown endpoint"
                );
                continue;
            }
            graph.add_route(
                &edge.source,
                &edge.target,
                edge.distance_nm,
                &edge.airway,
                edge.direction,
            );
        }

        tracing::info!(
            waypoints = graph.waypoint_count(),
            routes = graph.route_count(),
            "airspace loaded"
        );
        graph
    }
}

/// Route as an array of names or a single `A → B → C` / `A-B-C` string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RouteSpec {
    Waypoints(Vec<String>),
    Text(String),
}

/// Value given either as a JSON number or as text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(f64),
    Text(String),
}

/// One flight-plan entry. The original dataset's Vietnamese column names are
/// accepted as aliases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightPlanRecord {
    #[serde(alias = "Tên tàu bay")]
    pub callsign: String,
    #[serde(alias = "Tuyến bay (từ - đến)", alias = "ordered_waypoints")]
    pub route: RouteSpec,
    #[serde(alias = "Tốc độ (Kts)", alias = "speed_knots")]
    pub speed: NumberOrText,
    #[serde(alias = "Mực bay")]
    pub flight_level: NumberOrText,
    #[serde(alias = "Giờ vào FIR")]
    pub entry_time: String,
}

impl FlightPlanRecord {
    /// Convert to a flight with ETAs from great-circle segment distances.
    pub fn to_flight(
        &self,
        graph: &WaypointGraph,
        base_date: NaiveDate,
    ) -> Result<FlightTrajectory, DatasetError> {
        let route = match &self.route {
            RouteSpec::Waypoints(names) => names
                .iter()
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
            RouteSpec::Text(text) => parse_route(text),
        };
        if route.is_empty() {
            return Err(DatasetError::EmptyRoute(self.callsign.clone()));
        }

        let speed = match &self.speed {
            NumberOrText::Number(value) => *value,
            NumberOrText::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| DatasetError::InvalidSpeed(text.clone()))?,
        };
        if !SPEED_RANGE_KTS.contains(&speed) {
            return Err(DatasetError::InvalidSpeed(speed.to_string()));
        }

        let flight_level = match &self.flight_level {
            NumberOrText::Number(value)
                if value.fract() == 0.0
                    && (*FLIGHT_LEVEL_RANGE.start() as f64..=*FLIGHT_LEVEL_RANGE.end() as f64)
                        .contains(value) =>
            {
                *value as i32
            }
            NumberOrText::Number(value) => {
                return Err(DatasetError::InvalidFlightLevel(value.to_string()))
            }
            NumberOrText::Text(text) => parse_flight_level(text)?,
        };
        if !FLIGHT_LEVEL_RANGE.contains(&flight_level) {
            return Err(DatasetError::InvalidFlightLevel(flight_level.to_string()));
        }
        let entry_time = parse_entry_time(&self.entry_time, base_date)?;

        let distances = graph.great_circle_distances(&route);
        Ok(
            FlightTrajectory::new(&self.callsign, route, speed, flight_level, entry_time)
                .with_estimated_times(&distances),
        )
    }
}

/// Result of converting a batch of flight-plan records.
#[derive(Debug, Default)]
pub struct LoadedFlights {
    pub flights: Vec<FlightTrajectory>,
    /// Records that could not be converted, by callsign
    pub errors: Vec<(String, DatasetError)>,
}

/// Convert every record; a bad record is reported and skipped.
pub fn load_flights(
    graph: &WaypointGraph,
    records: &[FlightPlanRecord],
    base_date: NaiveDate,
) -> LoadedFlights {
    let mut loaded = LoadedFlights::default();
    for record in records {
        match record.to_flight(graph, base_date) {
            Ok(flight) => loaded.flights.push(flight),
            Err(e) => {
                tracing::warn!("Error loading flight {}: {}", record.callsign, e);
                loaded.errors.push((record.callsign.clone(), e));
            }
        }
    }
    tracing::info!(
        flights = loaded.flights.len(),
        rejected = loaded.errors.len(),
        "flight plans loaded"
    );
    loaded
}

pub fn parse_flight_plans(json: &str) -> Result<Vec<FlightPlanRecord>, DatasetError> {
    Ok(serde_json::from_str(json)?)
}

/// Split a route string on `→`, or on `-` / `,` when no arrow is present.
pub fn parse_route(text: &str) -> Vec<String> {
    let parts: Vec<&str> = if text.contains('→') {
        text.split('→').collect()
    } else {
        text.split(['-', ',']).collect()
    };
    parts
        .into_iter()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `FL330` or `330`.
pub fn parse_flight_level(text: &str) -> Result<i32, DatasetError> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix("FL")
        .or_else(|| trimmed.strip_prefix("fl"))
        .unwrap_or(trimmed);
    digits
        .trim()
        .parse()
        .map_err(|_| DatasetError::InvalidFlightLevel(text.to_string()))
}

/// Parse RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS` timestamp (taken as UTC),
/// or `HH:MM` on `base_date`.
pub fn parse_entry_time(text: &str, base_date: NaiveDate) -> Result<DateTime<Utc>, DatasetError> {
    let trimmed = text.trim();
    if let Ok(time) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(time.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc());
        }
    }
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .map(|time| base_date.and_time(time).and_utc())
        .map_err(|_| DatasetError::InvalidEntryTime(text.to_string()))
}

pub fn parse_base_date(text: &str) -> Result<NaiveDate, DatasetError> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|_| DatasetError::InvalidBaseDate(text.to_string()))
}

/// Check that every waypoint of a route exists in the graph.
pub fn validate_route(graph: &WaypointGraph, route: &[String]) -> Result<(), DatasetError> {
    match route.iter().find(|name| !graph.contains(name)) {
        Some(missing) => Err(DatasetError::UnknownWaypoint(missing.clone())),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn base_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 19).unwrap()
    }

    #[test]
    fn airspace_from_list_and_map_forms() {
        let list = r#"{
            "waypoints": [
                {"name": "A", "lat": 10.0, "lon": 106.0},
                {"name": "B", "latitude": 10.5, "longitude": 106.5, "type": "VOR"}
            ],
            "edges": [
                {"source": "A", "target": "B", "distance_nm": 42.0},
                {"source": "A", "target": "Q", "distance_nm": 10.0}
            ]
        }"#;
        let graph = AirspaceData::from_json(list).unwrap().build_graph();
        assert_eq!(graph.waypoint_count(), 2);
        assert_eq!(graph.waypoint("B").unwrap().category, WaypointCategory::Vor);
        // unknown endpoint skipped, known edge inserted both ways
        assert_eq!(graph.route_count(), 2);
        assert_eq!(graph.neighbors("B")[0].airway, DEFAULT_AIRWAY);

        let map = r#"{"waypoints": {"A": {"lat": 10.0, "lon": 106.0}}}"#;
        let graph = AirspaceData::from_json(map).unwrap().build_graph();
        assert!(graph.contains("A"));
        assert_eq!(graph.route_count(), 0);
    }

    #[test]
    fn oneway_edge_from_json() {
        let json = r#"{
            "waypoints": [
                {"name": "A", "lat": 10.0, "lon": 106.0},
                {"name": "B", "lat": 10.5, "lon": 106.5}
            ],
            "edges": [{"source": "A", "target": "B", "direction": "ONEWAY"}]
        }"#;
        let graph = AirspaceData::from_json(json).unwrap().build_graph();
        assert_eq!(graph.route_count(), 1);
        assert_eq!(graph.edge_distance("A", "B"), Some(0.0));
    }

    #[test]
    fn route_strings() {
        assert_eq!(parse_route("A → B → C"), vec!["A", "B", "C"]);
        assert_eq!(parse_route("A-B - C"), vec!["A", "B", "C"]);
        assert_eq!(parse_route("A, B,C"), vec!["A", "B", "C"]);
        assert!(parse_route("  ").is_empty());
    }

    #[test]
    fn flight_levels() {
        assert_eq!(parse_flight_level("FL330").unwrap(), 330);
        assert_eq!(parse_flight_level(" 290 ").unwrap(), 290);
        assert!(matches!(
            parse_flight_level("FLX"),
            Err(DatasetError::InvalidFlightLevel(_))
        ));
    }

    #[test]
    fn entry_times() {
        let expected = Utc.with_ymd_and_hms(2025, 1, 19, 8, 5, 0).unwrap();
        assert_eq!(parse_entry_time("08:05", base_date()).unwrap(), expected);
        assert_eq!(
            parse_entry_time("2025-01-19T08:05:00", base_date()).unwrap(),
            expected
        );
        assert_eq!(
            parse_entry_time("2025-01-19T15:05:00+07:00", base_date()).unwrap(),
            expected
        );
        assert!(parse_entry_time("soon", base_date()).is_err());
    }

    #[test]
    fn record_with_original_column_names() {
        let json = r#"[{
            "Tên tàu bay": "VN123",
            "Tuyến bay (từ - đến)": "A → B",
            "Tốc độ (Kts)": "450",
            "Mực bay": "FL330",
            "Giờ vào FIR": "08:00"
        }]"#;
        let records = parse_flight_plans(json).unwrap();
        let mut graph = WaypointGraph::new();
        // 0.5 degrees of latitude apart, about 30 NM
        graph.add_waypoint(Waypoint::new("A", 10.0, 106.0));
        graph.add_waypoint(Waypoint::new("B", 10.5, 106.0));

        let loaded = load_flights(&graph, &records, base_date());
        assert!(loaded.errors.is_empty());
        let flight = &loaded.flights[0];
        assert_eq!(flight.callsign, "VN123");
        assert_eq!(flight.flight_level, 330);
        assert_eq!(flight.speed_kts, 450.0);
        let entry = Utc.with_ymd_and_hms(2025, 1, 19, 8, 0, 0).unwrap();
        let at_b = flight.eta("B").unwrap();
        assert!(at_b > entry + Duration::minutes(3) && at_b < entry + Duration::minutes(5));
    }

    #[test]
    fn bad_records_are_reported_not_fatal() {
        let json = r#"[
            {"callsign": "OK1", "route": ["A"], "speed": 450, "flight_level": 330, "entry_time": "08:00"},
            {"callsign": "BAD", "route": [], "speed": 450, "flight_level": 330, "entry_time": "08:00"},
            {"callsign": "BAD2", "route": ["A"], "speed": 450, "flight_level": "high", "entry_time": "08:00"}
        ]"#;
        let records = parse_flight_plans(json).unwrap();
        let loaded = load_flights(&WaypointGraph::new(), &records, base_date());
        assert_eq!(loaded.flights.len(), 1);
        assert_eq!(loaded.errors.len(), 2);
        assert!(matches!(loaded.errors[0].1, DatasetError::EmptyRoute(_)));
    }

    #[test]
    fn out_of_range_speed_and_level_are_rejected() {
        let record = |speed: &str, level: &str| {
            let json = format!(
                r#"{{"callsign": "X1", "route": ["A"], "speed": {speed}, "flight_level": {level}, "entry_time": "08:00"}}"#
            );
            serde_json::from_str::<FlightPlanRecord>(&json)
                .unwrap()
                .to_flight(&WaypointGraph::new(), base_date())
        };

        assert!(record("450", "330").is_ok());
        for speed in ["0", "-450", "1e-12", "1e9", "\"0\""] {
            assert!(
                matches!(record(speed, "330"), Err(DatasetError::InvalidSpeed(_))),
                "speed {speed} accepted"
            );
        }
        for level in ["-5", "1000", "2147483647", "1e12", "\"FL-10\"", "\"2147483647\""] {
            assert!(
                matches!(record("450", level), Err(DatasetError::InvalidFlightLevel(_))),
                "level {level} accepted"
            );
        }
    }

    #[test]
    fn route_validation_names_missing_waypoint() {
        let mut graph = WaypointGraph::new();
        graph.add_waypoint(Waypoint::new("A", 10.0, 106.0));
        let route = vec!["A".to_string(), "Z".to_string()];
        match validate_route(&graph, &route) {
            Err(DatasetError::UnknownWaypoint(name)) => assert_eq!(name, "Z"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
