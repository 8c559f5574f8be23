//! Trajectory calculator: estimated time of arrival per waypoint.

use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, HashMap};

const MICROS_PER_HOUR: f64 = 3_600_000_000.0;

/// Source of segment distances for ETA computation.
pub trait DistanceLookup {
    /// Distance between two waypoints in nautical miles, either orientation.
    fn distance_nm(&self, from: &str, to: &str) -> Option<f64>;
}

/// Explicit table of segment distances keyed by waypoint pair.
#[derive(Debug, Clone, Default)]
pub struct SegmentDistances {
    table: HashMap<(String, String), f64>,
}

impl SegmentDistances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, from: &str, to: &str, distance_nm: f64) {
        self.table.insert((from.to_string(), to.to_string()), distance_nm);
    }

    /// Table assigning the same distance to every consecutive pair of a route.
    pub fn uniform(route: &[String], distance_nm: f64) -> Self {
        let mut distances = Self::new();
        for pair in route.windows(2) {
            distances.insert(&pair[0], &pair[1], distance_nm);
        }
        distances
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl DistanceLookup for SegmentDistances {
    fn distance_nm(&self, from: &str, to: &str) -> Option<f64> {
        self.table
            .get(&(from.to_string(), to.to_string()))
            .or_else(|| self.table.get(&(to.to_string(), from.to_string())))
            .copied()
    }
}

/// Time needed to fly `distance_nm` at `speed_kts`, to the microsecond.
///
/// `None` when the result is not finite or does not fit in a `Duration`.
pub fn travel_time(distance_nm: f64, speed_kts: f64) -> Option<Duration> {
    let micros = (distance_nm / speed_kts * MICROS_PER_HOUR).round();
    if !micros.is_finite() || micros.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(Duration::microseconds(micros as i64))
}

/// Walk a route and derive the arrival instant at every waypoint whose
/// inbound segment distance is known.
///
/// The map always holds `route[0] -> entry_time`. A segment without a known
/// distance records nothing for its second waypoint and the accumulator keeps
/// the last known instant, so the result is sparse. An arrival that falls
/// outside the representable time range ends the walk. Pure and deterministic.
pub fn estimate_times(
    route: &[String],
    speed_kts: f64,
    entry_time: DateTime<Utc>,
    distances: &impl DistanceLookup,
) -> BTreeMap<String, DateTime<Utc>> {
    let mut times = BTreeMap::new();
    let Some(first) = route.first() else {
        return times;
    };
    times.insert(first.clone(), entry_time);

    if !speed_kts.is_finite() || speed_kts <= 0.0 {
        tracing::warn!(speed_kts, "non-positive speed, only entry time is known");
        return times;
    }

    let mut current = entry_time;
    for pair in route.windows(2) {
        let Some(distance) = distances.distance_nm(&pair[0], &pair[1]) else {
            tracing::debug!(from = %pair[0], to = %pair[1], "no segment distance, ETA gap");
            continue;
        };
        let Some(next) = travel_time(distance, speed_kts)
            .and_then(|elapsed| current.checked_add_signed(elapsed))
        else {
            tracing::warn!(
                from = %pair[0],
                to = %pair[1],
                speed_kts,
                "arrival time out of range, remaining ETAs unknown"
            );
            break;
        };
        current = next;
        times.insert(pair[1].clone(), current);
    }

    times
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn route(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn entry() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 19, 8, 0, 0).unwrap()
    }

    #[test]
    fn accumulates_along_route() {
        let mut distances = SegmentDistances::new();
        distances.insert("A", "B", 75.0);
        distances.insert("B", "C", 150.0);

        let times = estimate_times(&route(&["A", "B", "C"]), 450.0, entry(), &distances);
        assert_eq!(times["A"], entry());
        assert_eq!(times["B"], entry() + Duration::minutes(10));
        assert_eq!(times["C"], entry() + Duration::minutes(30));
    }

    #[test]
    fn reversed_pair_is_found() {
        let mut distances = SegmentDistances::new();
        distances.insert("B", "A", 45.0);

        let times = estimate_times(&route(&["A", "B"]), 450.0, entry(), &distances);
        assert_eq!(times["B"], entry() + Duration::minutes(6));
    }

    #[test]
    fn missing_distance_leaves_gap() {
        let mut distances = SegmentDistances::new();
        distances.insert("A", "B", 75.0);
        distances.insert("C", "D", 75.0);

        let times = estimate_times(&route(&["A", "B", "C", "D"]), 450.0, entry(), &distances);
        assert!(times.contains_key("B"));
        assert!(!times.contains_key("C"));
        // D continues from the last known instant at B
        assert_eq!(times["D"], entry() + Duration::minutes(20));
    }

    #[test]
    fn zero_speed_keeps_entry_only() {
        let distances = SegmentDistances::uniform(&route(&["A", "B"]), 50.0);
        let times = estimate_times(&route(&["A", "B"]), 0.0, entry(), &distances);
        assert_eq!(times.len(), 1);
        assert_eq!(times["A"], entry());
    }

    #[test]
    fn tiny_speed_stops_at_unrepresentable_arrival() {
        let distances = SegmentDistances::uniform(&route(&["A", "B", "C"]), 50.0);
        let times = estimate_times(&route(&["A", "B", "C"]), 1e-12, entry(), &distances);
        assert_eq!(times.len(), 1);
        assert_eq!(times["A"], entry());
    }

    #[test]
    fn travel_time_rejects_overflow() {
        assert_eq!(travel_time(75.0, 450.0), Some(Duration::minutes(10)));
        assert_eq!(travel_time(50.0, 1e-12), None);
        assert_eq!(travel_time(f64::NAN, 450.0), None);
    }

    #[test]
    fn identical_inputs_give_identical_maps() {
        let distances = SegmentDistances::uniform(&route(&["A", "B", "C"]), 53.7);
        let first = estimate_times(&route(&["A", "B", "C"]), 437.0, entry(), &distances);
        let second = estimate_times(&route(&["A", "B", "C"]), 437.0, entry(), &distances);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_route_gives_empty_map() {
        let times = estimate_times(&[], 450.0, entry(), &SegmentDistances::new());
        assert!(times.is_empty());
    }
}
