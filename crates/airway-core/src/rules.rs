//! Separation rules and thresholds for conflict detection.

use serde::{Deserialize, Serialize};

/// Thresholds used by the conflict detector.
///
/// Every rule is gated on `vertical_separation_ft`: two flights closer than
/// this vertically are candidates, anything further apart never conflicts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeparationRules {
    /// Minimum vertical separation in feet
    pub vertical_separation_ft: f64,
    /// Crossing: max time between both flights over a shared waypoint (minutes)
    pub crossing_window_min: f64,
    /// Overtake: max offset between segment entry instants (minutes)
    pub overtake_window_min: f64,
    /// Lateral: max time between two distinct waypoints' ETAs (minutes)
    pub lateral_window_min: f64,
    /// Lateral: max great-circle distance between the two waypoints (NM).
    /// `None` disables the distance gate.
    pub lateral_distance_nm: Option<f64>,
}

impl Default for SeparationRules {
    fn default() -> Self {
        Self {
            vertical_separation_ft: 2000.0,
            crossing_window_min: 15.0,
            overtake_window_min: 20.0,
            lateral_window_min: 5.0,
            lateral_distance_nm: Some(20.0),
        }
    }
}

impl SeparationRules {
    /// Widest time window of any rule, in minutes.
    pub fn max_window_min(&self) -> f64 {
        self.crossing_window_min
            .max(self.overtake_window_min)
            .max(self.lateral_window_min)
    }

    pub fn levels_too_close(&self, level1: i32, level2: i32) -> bool {
        crate::models::vertical_separation_ft(level1, level2) < self.vertical_separation_ft
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_gate_is_two_thousand_feet() {
        let rules = SeparationRules::default();
        assert!(rules.levels_too_close(330, 340));
        assert!(!rules.levels_too_close(330, 350));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let rules: SeparationRules =
            serde_json::from_str(r#"{"vertical_separation_ft": 1000.0}"#).unwrap();
        assert_eq!(rules.vertical_separation_ft, 1000.0);
        assert_eq!(rules.crossing_window_min, 15.0);
        assert_eq!(rules.max_window_min(), 20.0);
    }
}
