//! Conflict-aware path planner.
//!
//! Best-first (A*) search over the waypoint graph that rejects sharp turns and
//! segments already flown by nearby traffic, wrapped in a retry ladder:
//! plain search, then searches at progressively higher flight levels, then a
//! minimal-conflict search that accepts the least-conflicted path.
//!
//! The ladder never mutates the caller's flight. Each level attempt runs on a
//! candidate copy and the result reports the level it was found at; whether
//! to commit that level is up to the caller.

use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::time::{Duration, Instant};

use crate::graph::WaypointGraph;
use crate::models::{vertical_separation_ft, FlightTrajectory};
use crate::spatial::{haversine_nm, turn_angle_deg};

/// What to do when a turn angle cannot be computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnFailurePolicy {
    /// Fail open: accept the edge
    Permit,
    /// Fail closed: reject the edge
    #[default]
    Reject,
}

/// Upper bound on retry-ladder rungs, whatever the caller asks for.
pub const MAX_LADDER_ATTEMPTS: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub max_turn_angle_deg: f64,
    /// Traffic closer than this vertically blocks a shared segment
    pub vertical_separation_ft: f64,
    /// Level increase per retry attempt
    pub level_step_ft: f64,
    pub max_attempts: usize,
    pub turn_failure_policy: TurnFailurePolicy,
    pub enforce_turn_limit: bool,
    pub avoid_traffic: bool,
    /// Stop a single search after this many node expansions
    pub max_expansions: Option<usize>,
    /// Stop a single search after this much wall-clock time
    pub time_limit_ms: Option<u64>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_turn_angle_deg: 90.0,
            vertical_separation_ft: 1000.0,
            level_step_ft: 1000.0,
            max_attempts: 5,
            turn_failure_policy: TurnFailurePolicy::Reject,
            enforce_turn_limit: true,
            avoid_traffic: true,
            max_expansions: Some(100_000),
            time_limit_ms: None,
        }
    }
}

impl PlannerConfig {
    /// Level step in flight-level units (hundreds of feet).
    fn level_step(&self) -> i32 {
        (self.level_step_ft / 100.0).round() as i32
    }
}

/// Which rung of the retry ladder produced a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum PlanStrategy {
    /// Constrained search at the filed level
    Direct,
    /// Constrained search at a raised level
    LevelChange { attempt: usize },
    /// Least-conflicted path at the filed level
    MinimalConflict { conflicts: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedPath {
    pub path: Vec<String>,
    /// Sum of edge distances along the path
    pub distance_nm: f64,
    /// Level the path was planned at
    pub flight_level: i32,
    #[serde(flatten)]
    pub strategy: PlanStrategy,
    pub nodes_expanded: usize,
}

/// Other flights' use of each undirected segment.
///
/// Built once per search so the per-edge check is a map lookup instead of a
/// scan over every other flight's route.
#[derive(Debug, Clone, Default)]
pub struct TrafficIndex {
    segments: HashMap<String, HashMap<String, Vec<i32>>>,
}

impl TrafficIndex {
    pub fn build(flights: &[FlightTrajectory]) -> Self {
        let mut index = Self::default();
        for flight in flights {
            for (from, to) in flight.segments() {
                index.record(from, to, flight.flight_level);
                if from != to {
                    index.record(to, from, flight.flight_level);
                }
            }
        }
        index
    }

    fn record(&mut self, from: &str, to: &str, flight_level: i32) {
        self.segments
            .entry(from.to_string())
            .or_default()
            .entry(to.to_string())
            .or_default()
            .push(flight_level);
    }

    /// Number of segment uses (either orientation, any time) by flights
    /// closer than `separation_ft` to `flight_level`.
    pub fn conflicts_on(&self, from: &str, to: &str, flight_level: i32, separation_ft: f64) -> usize {
        self.segments
            .get(from)
            .and_then(|targets| targets.get(to))
            .map(|levels| {
                levels
                    .iter()
                    .filter(|level| vertical_separation_ft(flight_level, **level) < separation_ft)
                    .count()
            })
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Open-set entry. Ordered by the primary key, then distance, then insertion
/// sequence; the path itself never takes part in the ordering.
#[derive(Debug, Clone)]
struct OpenPath {
    primary: FloatOrd,
    g_score: FloatOrd,
    seq: u64,
    conflicts: usize,
    path: Vec<String>,
}

impl PartialEq for OpenPath {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenPath {}

impl PartialOrd for OpenPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenPath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.primary
            .cmp(&other.primary)
            .then_with(|| self.g_score.cmp(&other.g_score))
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

struct SearchResult {
    path: Vec<String>,
    distance_nm: f64,
    conflicts: usize,
    nodes_expanded: usize,
}

struct SearchBudget {
    max_expansions: Option<usize>,
    deadline: Option<Instant>,
}

impl SearchBudget {
    fn start(config: &PlannerConfig) -> Self {
        Self {
            max_expansions: config.max_expansions,
            deadline: config
                .time_limit_ms
                .map(|ms| Instant::now() + Duration::from_millis(ms)),
        }
    }

    fn exhausted(&self, expanded: usize) -> bool {
        if self.max_expansions.is_some_and(|max| expanded >= max) {
            return true;
        }
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// Conflict-aware planner over a read-only waypoint graph.
pub struct PathPlanner<'a> {
    graph: &'a WaypointGraph,
    config: PlannerConfig,
}

impl<'a> PathPlanner<'a> {
    pub fn new(graph: &'a WaypointGraph, config: PlannerConfig) -> Self {
        Self { graph, config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Constrained search at the flight's filed level.
    ///
    /// Returns `None` when start or goal is unknown, when no edge sequence
    /// satisfies the constraints, or when the search budget runs out.
    pub fn find_path(
        &self,
        start: &str,
        goal: &str,
        flight: &FlightTrajectory,
        other_flights: &[FlightTrajectory],
    ) -> Option<PlannedPath> {
        let traffic = TrafficIndex::build(other_flights);
        self.constrained_search(start, goal, flight.flight_level, &traffic)
            .map(|found| planned(found, flight.flight_level, PlanStrategy::Direct))
    }

    /// Retry ladder: direct search, up to `max_attempts` raised levels, then
    /// the minimal-conflict fallback. `max_attempts` is capped at
    /// [`MAX_LADDER_ATTEMPTS`] and the ladder ends early if a raised level
    /// would overflow.
    pub fn find_alternative_path(
        &self,
        flight: &FlightTrajectory,
        start: &str,
        goal: &str,
        other_flights: &[FlightTrajectory],
        max_attempts: usize,
    ) -> Option<PlannedPath> {
        if !self.graph.contains(start) || !self.graph.contains(goal) {
            return None;
        }
        let traffic = TrafficIndex::build(other_flights);

        if let Some(found) = self.constrained_search(start, goal, flight.flight_level, &traffic) {
            return Some(planned(found, flight.flight_level, PlanStrategy::Direct));
        }

        let step = self.config.level_step();
        for attempt in 1..=max_attempts.min(MAX_LADDER_ATTEMPTS) {
            let Some(level) = i32::try_from(attempt)
                .ok()
                .and_then(|rung| rung.checked_mul(step))
                .and_then(|raise| flight.flight_level.checked_add(raise))
            else {
                tracing::debug!(
                    callsign = %flight.callsign,
                    attempt,
                    "raised level out of range, ending ladder"
                );
                break;
            };
            let candidate = flight.at_flight_level(level);
            tracing::debug!(
                callsign = %flight.callsign,
                attempt,
                flight_level = candidate.flight_level,
                "retrying path search at raised level"
            );
            if let Some(found) =
                self.constrained_search(start, goal, candidate.flight_level, &traffic)
            {
                return Some(planned(
                    found,
                    candidate.flight_level,
                    PlanStrategy::LevelChange { attempt },
                ));
            }
        }

        tracing::debug!(
            callsign = %flight.callsign,
            "level changes exhausted, falling back to minimal-conflict search"
        );
        self.minimal_conflict_search(start, goal, flight.flight_level, &traffic)
            .map(|found| {
                let conflicts = found.conflicts;
                planned(found, flight.flight_level, PlanStrategy::MinimalConflict { conflicts })
            })
    }

    fn constrained_search(
        &self,
        start: &str,
        goal: &str,
        flight_level: i32,
        traffic: &TrafficIndex,
    ) -> Option<SearchResult> {
        if !self.graph.contains(start) || !self.graph.contains(goal) {
            return None;
        }

        let budget = SearchBudget::start(&self.config);
        let mut open_set: BinaryHeap<Reverse<OpenPath>> = BinaryHeap::new();
        let mut closed_set: HashSet<String> = HashSet::new();
        let mut g_score: HashMap<String, f64> = HashMap::new();
        let mut seq = 0u64;
        let mut nodes_expanded = 0usize;

        g_score.insert(start.to_string(), 0.0);
        open_set.push(Reverse(OpenPath {
            primary: FloatOrd(self.heuristic(start, goal)),
            g_score: FloatOrd(0.0),
            seq,
            conflicts: 0,
            path: vec![start.to_string()],
        }));

        while let Some(Reverse(current)) = open_set.pop() {
            let Some(node) = current.path.last() else {
                continue;
            };
            if node == goal {
                return Some(SearchResult {
                    distance_nm: current.g_score.0,
                    conflicts: 0,
                    nodes_expanded,
                    path: current.path,
                });
            }
            if closed_set.contains(node) {
                continue;
            }
            if budget.exhausted(nodes_expanded) {
                tracing::warn!(start, goal, nodes_expanded, "path search budget exhausted");
                return None;
            }

            closed_set.insert(node.clone());
            nodes_expanded += 1;
            let current_g = current.g_score.0;

            for edge in self.graph.neighbors(node) {
                if closed_set.contains(&edge.neighbor) {
                    continue;
                }
                if self.config.enforce_turn_limit && !self.turn_allowed(&current.path, &edge.neighbor) {
                    continue;
                }
                if self.config.avoid_traffic
                    && traffic.conflicts_on(
                        node,
                        &edge.neighbor,
                        flight_level,
                        self.config.vertical_separation_ft,
                    ) > 0
                {
                    continue;
                }

                let tentative_g = current_g + edge.distance_nm;
                let best = g_score.get(&edge.neighbor).copied().unwrap_or(f64::INFINITY);
                if tentative_g < best {
                    g_score.insert(edge.neighbor.clone(), tentative_g);
                    let mut path = current.path.clone();
                    path.push(edge.neighbor.clone());
                    seq += 1;
                    open_set.push(Reverse(OpenPath {
                        primary: FloatOrd(tentative_g + self.heuristic(&edge.neighbor, goal)),
                        g_score: FloatOrd(tentative_g),
                        seq,
                        conflicts: 0,
                        path,
                    }));
                }
            }
        }

        tracing::debug!(start, goal, flight_level, nodes_expanded, "no constrained path");
        None
    }

    /// Same traversal without rejecting conflicting edges: the open set is
    /// ordered by accumulated conflict count, then distance. Turn limits do
    /// not apply to this last-resort search.
    fn minimal_conflict_search(
        &self,
        start: &str,
        goal: &str,
        flight_level: i32,
        traffic: &TrafficIndex,
    ) -> Option<SearchResult> {
        if !self.graph.contains(start) || !self.graph.contains(goal) {
            return None;
        }

        let budget = SearchBudget::start(&self.config);
        let mut open_set: BinaryHeap<Reverse<OpenPath>> = BinaryHeap::new();
        let mut closed_set: HashSet<String> = HashSet::new();
        let mut seq = 0u64;
        let mut nodes_expanded = 0usize;

        open_set.push(Reverse(OpenPath {
            primary: FloatOrd(0.0),
            g_score: FloatOrd(0.0),
            seq,
            conflicts: 0,
            path: vec![start.to_string()],
        }));

        while let Some(Reverse(current)) = open_set.pop() {
            let Some(node) = current.path.last() else {
                continue;
            };
            if node == goal {
                return Some(SearchResult {
                    distance_nm: current.g_score.0,
                    conflicts: current.conflicts,
                    nodes_expanded,
                    path: current.path,
                });
            }
            if closed_set.contains(node) {
                continue;
            }
            if budget.exhausted(nodes_expanded) {
                tracing::warn!(start, goal, nodes_expanded, "minimal-conflict search budget exhausted");
                return None;
            }

            closed_set.insert(node.clone());
            nodes_expanded += 1;

            for edge in self.graph.neighbors(node) {
                if closed_set.contains(&edge.neighbor) {
                    continue;
                }
                let segment_conflicts = traffic.conflicts_on(
                    node,
                    &edge.neighbor,
                    flight_level,
                    self.config.vertical_separation_ft,
                );
                let conflicts = current.conflicts + segment_conflicts;
                let distance = current.g_score.0 + edge.distance_nm;
                let mut path = current.path.clone();
                path.push(edge.neighbor.clone());
                seq += 1;
                open_set.push(Reverse(OpenPath {
                    primary: FloatOrd(conflicts as f64),
                    g_score: FloatOrd(distance),
                    seq,
                    conflicts,
                    path,
                }));
            }
        }

        None
    }

    /// Great-circle distance to the goal; zero when coordinates are unknown.
    fn heuristic(&self, from: &str, goal: &str) -> f64 {
        self.graph.great_circle_nm(from, goal).unwrap_or(0.0)
    }

    /// Turn-angle constraint for extending `path` to `next`.
    fn turn_allowed(&self, path: &[String], next: &str) -> bool {
        let [.., prev, current] = path else {
            return true;
        };
        let angle = match (
            self.graph.waypoint(prev),
            self.graph.waypoint(current),
            self.graph.waypoint(next),
        ) {
            (Some(a), Some(b), Some(c)) => {
                turn_angle_deg(a.coordinates(), b.coordinates(), c.coordinates())
            }
            _ => None,
        };

        match angle {
            Some(angle) => angle <= self.config.max_turn_angle_deg,
            None => {
                tracing::warn!(
                    prev = %prev,
                    current = %current,
                    next,
                    policy = ?self.config.turn_failure_policy,
                    "turn angle could not be computed"
                );
                self.config.turn_failure_policy == TurnFailurePolicy::Permit
            }
        }
    }
}

fn planned(found: SearchResult, flight_level: i32, strategy: PlanStrategy) -> PlannedPath {
    PlannedPath {
        path: found.path,
        distance_nm: found.distance_nm,
        flight_level,
        strategy,
        nodes_expanded: found.nodes_expanded,
    }
}

/// Constrained search with the default planner configuration.
pub fn find_path(
    graph: &WaypointGraph,
    start: &str,
    goal: &str,
    flight: &FlightTrajectory,
    other_flights: &[FlightTrajectory],
) -> Option<PlannedPath> {
    PathPlanner::new(graph, PlannerConfig::default()).find_path(start, goal, flight, other_flights)
}

/// Retry ladder with the default planner configuration.
pub fn find_alternative_path(
    graph: &WaypointGraph,
    flight: &FlightTrajectory,
    start: &str,
    goal: &str,
    other_flights: &[FlightTrajectory],
    max_attempts: usize,
) -> Option<PlannedPath> {
    PathPlanner::new(graph, PlannerConfig::default()).find_alternative_path(
        flight,
        start,
        goal,
        other_flights,
        max_attempts,
    )
}
