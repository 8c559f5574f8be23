//! Offline front end: load a dataset, run the detector or the planner, and
//! render the result as JSON.

use airway_core::{
    load_flights, parse_base_date, parse_flight_plans, scenario, AirspaceData, ConflictDetector,
    ConflictSummary, FlightTrajectory, PathPlanner, PlannerConfig, SeparationRules, WaypointGraph,
    MAX_LADDER_ATTEMPTS,
};
use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Airspace JSON (waypoints and edges); the demo scenario when omitted
    #[arg(long, global = true)]
    pub airspace: Option<PathBuf>,

    /// Flight-plan JSON
    #[arg(long, global = true)]
    pub flights: Option<PathBuf>,

    /// Date for `HH:MM` entry times
    #[arg(long, global = true, default_value = "2025-01-19")]
    pub base_date: String,

    #[command(flatten)]
    pub thresholds: ThresholdArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List separation conflicts between all flights
    Conflicts,
    /// Suggest a conflict-aware path for one flight
    SuggestPath {
        #[arg(long)]
        callsign: String,
        #[arg(long)]
        start: String,
        #[arg(long)]
        goal: String,
        #[arg(long)]
        max_attempts: Option<usize>,
    },
    /// Waypoint, route, flight and conflict counts
    Stats,
    /// Run the detector on the built-in demo scenario
    Demo,
}

/// Overrides for the detector thresholds.
#[derive(Args, Debug, Default)]
pub struct ThresholdArgs {
    #[arg(long, global = true)]
    pub vertical_separation_ft: Option<f64>,
    #[arg(long, global = true)]
    pub crossing_window_min: Option<f64>,
    #[arg(long, global = true)]
    pub overtake_window_min: Option<f64>,
    #[arg(long, global = true)]
    pub lateral_window_min: Option<f64>,
    #[arg(long, global = true, conflicts_with = "no_lateral_gate")]
    pub lateral_distance_nm: Option<f64>,
    /// Report lateral conflicts at any distance
    #[arg(long, global = true)]
    pub no_lateral_gate: bool,
}

impl ThresholdArgs {
    pub fn rules(&self) -> SeparationRules {
        let defaults = SeparationRules::default();
        SeparationRules {
            vertical_separation_ft: self
                .vertical_separation_ft
                .unwrap_or(defaults.vertical_separation_ft),
            crossing_window_min: self.crossing_window_min.unwrap_or(defaults.crossing_window_min),
            overtake_window_min: self.overtake_window_min.unwrap_or(defaults.overtake_window_min),
            lateral_window_min: self.lateral_window_min.unwrap_or(defaults.lateral_window_min),
            lateral_distance_nm: if self.no_lateral_gate {
                None
            } else {
                self.lateral_distance_nm.or(defaults.lateral_distance_nm)
            },
        }
    }
}

pub struct Dataset {
    pub airspace: WaypointGraph,
    pub flights: Vec<FlightTrajectory>,
}

impl Dataset {
    pub fn demo() -> Self {
        Self {
            airspace: scenario::test_airspace(),
            flights: scenario::test_flights(),
        }
    }

    pub fn load(airspace: &Path, flights: Option<&Path>, base_date: NaiveDate) -> Result<Self> {
        let json = fs::read_to_string(airspace)
            .with_context(|| format!("reading {}", airspace.display()))?;
        let graph = AirspaceData::from_json(&json)
            .with_context(|| format!("parsing {}", airspace.display()))?
            .build_graph();

        let flights = match flights {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                let records = parse_flight_plans(&json)
                    .with_context(|| format!("parsing {}", path.display()))?;
                let loaded = load_flights(&graph, &records, base_date);
                if !loaded.errors.is_empty() {
                    tracing::warn!(
                        "{} of {} flight plans skipped",
                        loaded.errors.len(),
                        records.len()
                    );
                }
                loaded.flights
            }
            None => Vec::new(),
        };

        Ok(Self {
            airspace: graph,
            flights,
        })
    }
}

/// Execute a parsed command line and return the JSON to print.
pub fn run(cli: &Cli) -> Result<Value> {
    let rules = cli.thresholds.rules();
    let dataset = match (&cli.command, &cli.airspace) {
        (Command::Demo, _) => Dataset::demo(),
        (_, Some(airspace)) => {
            let base_date = parse_base_date(&cli.base_date)?;
            Dataset::load(airspace, cli.flights.as_deref(), base_date)?
        }
        (_, None) => {
            if let Some(flights) = &cli.flights {
                bail!(
                    "--flights {} needs --airspace to resolve its waypoints",
                    flights.display()
                );
            }
            Dataset::demo()
        }
    };

    match &cli.command {
        Command::Conflicts | Command::Demo => conflicts_report(&dataset, rules),
        Command::Stats => Ok(stats_report(&dataset, rules)),
        Command::SuggestPath {
            callsign,
            start,
            goal,
            max_attempts,
        } => suggest_path_report(
            &dataset,
            PlannerConfig::default(),
            callsign,
            start,
            goal,
            *max_attempts,
        ),
    }
}

pub fn conflicts_report(dataset: &Dataset, rules: SeparationRules) -> Result<Value> {
    let conflicts = ConflictDetector::new(rules).detect(&dataset.flights, &dataset.airspace);
    Ok(serde_json::to_value(conflicts)?)
}

pub fn stats_report(dataset: &Dataset, rules: SeparationRules) -> Value {
    let conflicts = ConflictDetector::new(rules).detect(&dataset.flights, &dataset.airspace);
    let summary = ConflictSummary::from_conflicts(&conflicts);
    json!({
        "waypoints_count": dataset.airspace.waypoint_count(),
        "routes_count": dataset.airspace.route_count(),
        "flights_count": dataset.flights.len(),
        "conflicts_count": summary.total,
        "conflict_types": summary.by_kind,
    })
}

pub fn suggest_path_report(
    dataset: &Dataset,
    config: PlannerConfig,
    callsign: &str,
    start: &str,
    goal: &str,
    max_attempts: Option<usize>,
) -> Result<Value> {
    if !dataset.airspace.contains(start) || !dataset.airspace.contains(goal) {
        bail!("invalid start or goal waypoint: {} -> {}", start, goal);
    }
    let flight = dataset
        .flights
        .iter()
        .find(|f| f.callsign == callsign)
        .ok_or_else(|| anyhow!("flight {} not found", callsign))?;
    let others: Vec<FlightTrajectory> = dataset
        .flights
        .iter()
        .filter(|f| f.callsign != callsign)
        .cloned()
        .collect();

    let attempts = max_attempts
        .unwrap_or(config.max_attempts)
        .min(MAX_LADDER_ATTEMPTS);
    let planner = PathPlanner::new(&dataset.airspace, config);
    let planned = planner
        .find_alternative_path(flight, start, goal, &others, attempts)
        .ok_or_else(|| anyhow!("no alternative path found for {}", callsign))?;
    Ok(serde_json::to_value(planned)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subcommands_and_global_flags() {
        let cli = Cli::try_parse_from([
            "airway",
            "suggest-path",
            "--callsign",
            "TEST001",
            "--start",
            "A",
            "--goal",
            "C",
            "--vertical-separation-ft",
            "1000",
            "--no-lateral-gate",
        ])
        .unwrap();

        match &cli.command {
            Command::SuggestPath {
                callsign,
                max_attempts,
                ..
            } => {
                assert_eq!(callsign, "TEST001");
                assert_eq!(*max_attempts, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
        let rules = cli.thresholds.rules();
        assert_eq!(rules.vertical_separation_ft, 1000.0);
        assert_eq!(rules.lateral_distance_nm, None);
        assert_eq!(rules.crossing_window_min, 15.0);
    }

    #[test]
    fn lateral_gate_flags_conflict() {
        let parsed = Cli::try_parse_from([
            "airway",
            "conflicts",
            "--lateral-distance-nm",
            "10",
            "--no-lateral-gate",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn demo_reports_conflicts() {
        let cli = Cli::try_parse_from(["airway", "demo"]).unwrap();
        let report = run(&cli).unwrap();
        let conflicts = report.as_array().unwrap();
        assert!(conflicts
            .iter()
            .any(|c| c["type"] == "overtake" && c["flight1"] == "TEST005"));
    }

    #[test]
    fn flights_without_airspace_is_an_error() {
        let cli = Cli::try_parse_from(["airway", "--flights", "plans.json", "conflicts"]).unwrap();
        let err = run(&cli).unwrap_err();
        assert!(err.to_string().contains("--airspace"));

        // The demo command ignores dataset flags
        let demo = Cli::try_parse_from(["airway", "--flights", "plans.json", "demo"]).unwrap();
        assert!(run(&demo).is_ok());
    }

    #[test]
    fn stats_counts_demo_dataset() {
        let report = stats_report(&Dataset::demo(), SeparationRules::default());
        assert_eq!(report["waypoints_count"], 6);
        assert_eq!(report["routes_count"], 12);
        assert_eq!(report["flights_count"], 8);
    }

    #[test]
    fn suggest_path_reports_strategy() {
        let report = suggest_path_report(
            &Dataset::demo(),
            PlannerConfig::default(),
            "TEST001",
            "A",
            "C",
            None,
        )
        .unwrap();
        assert_eq!(report["path"], json!(["A", "B", "C"]));
        assert_eq!(report["strategy"], "direct");

        let unbounded = suggest_path_report(
            &Dataset::demo(),
            PlannerConfig::default(),
            "TEST001",
            "A",
            "C",
            Some(usize::MAX),
        )
        .unwrap();
        assert_eq!(unbounded["strategy"], "direct");

        let missing = suggest_path_report(
            &Dataset::demo(),
            PlannerConfig::default(),
            "NOPE",
            "A",
            "C",
            None,
        );
        assert!(missing.is_err());
    }
}
