//! Conflict detection module.
//!
//! Compares every unordered pair of planned flights and reports separation
//! violations in four categories: crossing, head-on, overtake and lateral.
//! Results are computed fresh on every call; nothing is cached.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::graph::WaypointGraph;
use crate::models::FlightTrajectory;
use crate::rules::SeparationRules;

/// Separation-violation category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictKind {
    /// Both flights over the same waypoint within the crossing window
    Crossing,
    /// Same segment flown in opposite directions with overlapping transit
    HeadOn,
    /// Same segment flown in the same direction with close entry times
    Overtake,
    /// Two distinct waypoints passed at nearly the same time
    Lateral,
}

/// Where a conflict happens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "location", rename_all = "snake_case")]
pub enum ConflictLocation {
    Waypoint { waypoint: String },
    /// Directed segment as flown by `flight1`
    Segment { segment: (String, String) },
    WaypointPair { wp1: String, wp2: String },
}

impl ConflictLocation {
    fn sort_key(&self) -> (&str, &str) {
        match self {
            ConflictLocation::Waypoint { waypoint } => (waypoint.as_str(), ""),
            ConflictLocation::Segment { segment } => (segment.0.as_str(), segment.1.as_str()),
            ConflictLocation::WaypointPair { wp1, wp2 } => (wp1.as_str(), wp2.as_str()),
        }
    }
}

/// Detected violation between two flights.
///
/// `flight1` is always the lexicographically smaller callsign, so a record
/// does not depend on the order flights were supplied in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    #[serde(rename = "type")]
    pub kind: ConflictKind,
    pub flight1: String,
    pub flight2: String,
    #[serde(flatten)]
    pub location: ConflictLocation,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub flight_level1: i32,
    pub flight_level2: i32,
    /// Crossing/overtake/lateral: time between the compared instants
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_diff_minutes: Option<f64>,
    /// Lateral: great-circle distance between the two waypoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_nm: Option<f64>,
}

/// Count of conflicts per kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConflictSummary {
    pub total: usize,
    pub by_kind: BTreeMap<ConflictKind, usize>,
}

impl ConflictSummary {
    pub fn from_conflicts(conflicts: &[Conflict]) -> Self {
        let mut by_kind = BTreeMap::new();
        for conflict in conflicts {
            *by_kind.entry(conflict.kind).or_insert(0) += 1;
        }
        Self {
            total: conflicts.len(),
            by_kind,
        }
    }
}

/// Pairwise conflict detection engine.
///
/// Stateless apart from its thresholds; safe to share and call concurrently.
#[derive(Debug, Clone, Default)]
pub struct ConflictDetector {
    pub rules: SeparationRules,
}

impl ConflictDetector {
    pub fn new(rules: SeparationRules) -> Self {
        Self { rules }
    }

    /// Check all flights for conflicts.
    ///
    /// `airspace` supplies waypoint coordinates for the lateral distance gate.
    /// A lateral candidate whose distance cannot be computed while the gate is
    /// enabled is not reported.
    pub fn detect(&self, flights: &[FlightTrajectory], airspace: &WaypointGraph) -> Vec<Conflict> {
        let mut conflicts = Vec::new();
        let max_window_min = self.rules.max_window_min();
        let mut pruned = 0usize;

        for i in 0..flights.len() {
            for j in (i + 1)..flights.len() {
                let (flight1, flight2) = if flights[j].callsign < flights[i].callsign {
                    (&flights[j], &flights[i])
                } else {
                    (&flights[i], &flights[j])
                };

                // Every rule is gated on vertical separation.
                if !self
                    .rules
                    .levels_too_close(flight1.flight_level, flight2.flight_level)
                {
                    pruned += 1;
                    continue;
                }

                // No rule can fire when the ETA spans are disjoint and further
                // apart than the widest window. Overlapping spans are always
                // checked, since head-on has no window.
                let (Some(span1), Some(span2)) = (flight1.time_span(), flight2.time_span()) else {
                    pruned += 1;
                    continue;
                };
                let gap = if span1.1 < span2.0 {
                    minutes_between(span1.1, span2.0)
                } else if span2.1 < span1.0 {
                    minutes_between(span2.1, span1.0)
                } else {
                    0.0
                };
                if gap > 0.0 && gap >= max_window_min {
                    pruned += 1;
                    continue;
                }

                self.check_crossing(flight1, flight2, &mut conflicts);
                self.check_head_on(flight1, flight2, &mut conflicts);
                self.check_overtake(flight1, flight2, &mut conflicts);
                self.check_lateral(flight1, flight2, airspace, &mut conflicts);
            }
        }

        conflicts.sort_by(|a, b| {
            a.kind
                .cmp(&b.kind)
                .then_with(|| a.flight1.cmp(&b.flight1))
                .then_with(|| a.flight2.cmp(&b.flight2))
                .then_with(|| a.location.sort_key().cmp(&b.location.sort_key()))
                .then_with(|| a.start_time.cmp(&b.start_time))
                .then_with(|| a.end_time.cmp(&b.end_time))
        });

        tracing::debug!(
            flights = flights.len(),
            pruned_pairs = pruned,
            conflicts = conflicts.len(),
            "conflict detection complete"
        );
        conflicts
    }

    /// Rule 1: both flights over a shared waypoint within the crossing window.
    fn check_crossing(&self, f1: &FlightTrajectory, f2: &FlightTrajectory, out: &mut Vec<Conflict>) {
        let route1: BTreeSet<&String> = f1.route.iter().collect();
        let route2: BTreeSet<&String> = f2.route.iter().collect();

        for waypoint in route1.intersection(&route2) {
            let (Some(t1), Some(t2)) = (f1.eta(waypoint), f2.eta(waypoint)) else {
                continue;
            };
            let time_diff = minutes_between(t1, t2);
            if time_diff < self.rules.crossing_window_min {
                out.push(Conflict {
                    kind: ConflictKind::Crossing,
                    flight1: f1.callsign.clone(),
                    flight2: f2.callsign.clone(),
                    location: ConflictLocation::Waypoint {
                        waypoint: (*waypoint).clone(),
                    },
                    start_time: t1.min(t2),
                    end_time: t1.max(t2),
                    flight_level1: f1.flight_level,
                    flight_level2: f2.flight_level,
                    time_diff_minutes: Some(time_diff),
                    distance_nm: None,
                });
            }
        }
    }

    /// Rule 2: flight 2 flies `(q, p)` while flight 1 flies `(p, q)` and the
    /// two transit intervals overlap.
    fn check_head_on(&self, f1: &FlightTrajectory, f2: &FlightTrajectory, out: &mut Vec<Conflict>) {
        for (p, q) in f1.segments() {
            for (r, s) in f2.segments() {
                if r != q || s != p {
                    continue;
                }
                // Flight 2 enters at q and leaves at p.
                let (Some(t1_start), Some(t1_end), Some(t2_start), Some(t2_end)) =
                    (f1.eta(p), f1.eta(q), f2.eta(q), f2.eta(p))
                else {
                    continue;
                };
                if t1_start < t2_end && t2_start < t1_end {
                    out.push(Conflict {
                        kind: ConflictKind::HeadOn,
                        flight1: f1.callsign.clone(),
                        flight2: f2.callsign.clone(),
                        location: ConflictLocation::Segment {
                            segment: (p.to_string(), q.to_string()),
                        },
                        start_time: t1_start.max(t2_start),
                        end_time: t1_end.min(t2_end),
                        flight_level1: f1.flight_level,
                        flight_level2: f2.flight_level,
                        time_diff_minutes: None,
                        distance_nm: None,
                    });
                }
            }
        }
    }

    /// Rule 3: same directed segment entered within the overtake window.
    fn check_overtake(&self, f1: &FlightTrajectory, f2: &FlightTrajectory, out: &mut Vec<Conflict>) {
        for (p, q) in f1.segments() {
            for (r, s) in f2.segments() {
                if r != p || s != q {
                    continue;
                }
                let (Some(t1_start), Some(t1_end), Some(t2_start), Some(t2_end)) =
                    (f1.eta(p), f1.eta(q), f2.eta(p), f2.eta(q))
                else {
                    continue;
                };
                let time_diff = minutes_between(t1_start, t2_start);
                if time_diff < self.rules.overtake_window_min {
                    out.push(Conflict {
                        kind: ConflictKind::Overtake,
                        flight1: f1.callsign.clone(),
                        flight2: f2.callsign.clone(),
                        location: ConflictLocation::Segment {
                            segment: (p.to_string(), q.to_string()),
                        },
                        start_time: t1_start.min(t2_start),
                        end_time: t1_end.max(t2_end),
                        flight_level1: f1.flight_level,
                        flight_level2: f2.flight_level,
                        time_diff_minutes: Some(time_diff),
                        distance_nm: None,
                    });
                }
            }
        }
    }

    /// Rule 4: two distinct waypoints passed within the lateral window and,
    /// when the gate is enabled, close enough on the ground.
    fn check_lateral(
        &self,
        f1: &FlightTrajectory,
        f2: &FlightTrajectory,
        airspace: &WaypointGraph,
        out: &mut Vec<Conflict>,
    ) {
        for (wp1, t1) in &f1.estimated_times {
            for (wp2, t2) in &f2.estimated_times {
                if wp1 == wp2 {
                    continue;
                }
                let time_diff = minutes_between(*t1, *t2);
                if time_diff >= self.rules.lateral_window_min {
                    continue;
                }

                let distance = airspace.great_circle_nm(wp1, wp2);
                if let Some(limit) = self.rules.lateral_distance_nm {
                    match distance {
                        Some(d) if d < limit => {}
                        _ => continue,
                    }
                }

                out.push(Conflict {
                    kind: ConflictKind::Lateral,
                    flight1: f1.callsign.clone(),
                    flight2: f2.callsign.clone(),
                    location: ConflictLocation::WaypointPair {
                        wp1: wp1.clone(),
                        wp2: wp2.clone(),
                    },
                    start_time: (*t1).min(*t2),
                    end_time: (*t1).max(*t2),
                    flight_level1: f1.flight_level,
                    flight_level2: f2.flight_level,
                    time_diff_minutes: Some(time_diff),
                    distance_nm: distance,
                });
            }
        }
    }
}

/// Detect conflicts with the given thresholds.
pub fn detect_conflicts(
    flights: &[FlightTrajectory],
    airspace: &WaypointGraph,
    rules: &SeparationRules,
) -> Vec<Conflict> {
    ConflictDetector::new(rules.clone()).detect(flights, airspace)
}

/// Absolute time between two instants in minutes.
fn minutes_between(t1: DateTime<Utc>, t2: DateTime<Utc>) -> f64 {
    (t1 - t2)
        .num_microseconds()
        .map(|us| us.unsigned_abs() as f64 / 60_000_000.0)
        .unwrap_or(f64::INFINITY)
}
