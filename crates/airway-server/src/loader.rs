//! Startup dataset loading from the data directory.

use airway_core::{
    load_flights, parse_flight_plans, scenario, AirspaceData, FlightTrajectory, WaypointGraph,
};
use anyhow::{Context, Result};
use std::fs;

use crate::config::Config;

/// Read the airspace and flight-plan files named by the config.
pub fn load_dataset(config: &Config) -> Result<(WaypointGraph, Vec<FlightTrajectory>)> {
    let airspace_path = config.airspace_path();
    let airspace_json = fs::read_to_string(&airspace_path)
        .with_context(|| format!("reading {}", airspace_path.display()))?;
    let airspace = AirspaceData::from_json(&airspace_json)
        .with_context(|| format!("parsing {}", airspace_path.display()))?
        .build_graph();

    let flights_path = config.flights_path();
    let flights_json = fs::read_to_string(&flights_path)
        .with_context(|| format!("reading {}", flights_path.display()))?;
    let records = parse_flight_plans(&flights_json)
        .with_context(|| format!("parsing {}", flights_path.display()))?;
    let loaded = load_flights(&airspace, &records, config.base_date);

    tracing::info!(
        "Loaded {} waypoints and {} flights from {}",
        airspace.waypoint_count(),
        loaded.flights.len(),
        config.data_dir.display()
    );
    Ok((airspace, loaded.flights))
}

/// Load the configured dataset, falling back to the built-in default airspace.
pub fn load_or_default(config: &Config) -> (WaypointGraph, Vec<FlightTrajectory>) {
    match load_dataset(config) {
        Ok(dataset) => dataset,
        Err(e) => {
            tracing::warn!("Error loading data: {:#}; using default airspace", e);
            (scenario::default_airspace(), Vec::new())
        }
    }
}
