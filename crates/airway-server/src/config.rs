//! Server configuration from environment.

use airway_core::{parse_base_date, PlannerConfig, SeparationRules};
use chrono::NaiveDate;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_BASE_DATE: &str = "2025-01-19";

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub data_dir: PathBuf,
    pub airspace_file: String,
    pub flights_file: String,
    /// Date that `HH:MM` entry times are anchored to
    pub base_date: NaiveDate,
    pub rules: SeparationRules,
    pub planner: PlannerConfig,
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = SeparationRules::default();
        let rules = SeparationRules {
            vertical_separation_ft: env_parse("AIRWAY_VERTICAL_SEPARATION_FT")
                .unwrap_or(defaults.vertical_separation_ft),
            crossing_window_min: env_parse("AIRWAY_CROSSING_WINDOW_MIN")
                .unwrap_or(defaults.crossing_window_min),
            overtake_window_min: env_parse("AIRWAY_OVERTAKE_WINDOW_MIN")
                .unwrap_or(defaults.overtake_window_min),
            lateral_window_min: env_parse("AIRWAY_LATERAL_WINDOW_MIN")
                .unwrap_or(defaults.lateral_window_min),
            lateral_distance_nm: match env::var("AIRWAY_LATERAL_DISTANCE_NM") {
                Ok(value) if value.eq_ignore_ascii_case("off") => None,
                Ok(value) => value.parse().ok().or(defaults.lateral_distance_nm),
                Err(_) => defaults.lateral_distance_nm,
            },
        };

        let mut planner = PlannerConfig::default();
        if let Some(max_attempts) = env_parse("AIRWAY_PLANNER_MAX_ATTEMPTS") {
            planner.max_attempts = max_attempts;
        }

        let base_date = env::var("AIRWAY_BASE_DATE")
            .ok()
            .and_then(|s| parse_base_date(&s).ok())
            .or_else(|| parse_base_date(DEFAULT_BASE_DATE).ok())
            .unwrap_or_default();

        Self {
            server_port: env_parse("AIRWAY_PORT").unwrap_or(3000),
            data_dir: env::var("AIRWAY_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            airspace_file: env::var("AIRWAY_AIRSPACE_FILE")
                .unwrap_or_else(|_| "airspace_data.json".to_string()),
            flights_file: env::var("AIRWAY_FLIGHTS_FILE")
                .unwrap_or_else(|_| "flight_plans.json".to_string()),
            base_date,
            rules,
            planner,
        }
    }

    pub fn airspace_path(&self) -> PathBuf {
        self.data_dir.join(&self.airspace_file)
    }

    pub fn flights_path(&self) -> PathBuf {
        self.data_dir.join(&self.flights_file)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}
