//! Alternative path suggestions.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use airway_core::{FlightTrajectory, PathPlanner, PlanStrategy, MAX_LADDER_ATTEMPTS};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SuggestPathRequest {
    pub callsign: String,
    pub start: String,
    pub goal: String,
    pub max_attempts: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuggestPathResponse {
    pub new_path: Vec<String>,
    /// Great-circle length of the path, rounded to 0.01 NM
    pub total_distance_nm: f64,
    pub waypoints_count: usize,
    pub original_start: String,
    pub original_goal: String,
    pub flight_level: i32,
    #[serde(flatten)]
    pub strategy: PlanStrategy,
}

type ApiError = (StatusCode, Json<Value>);

fn api_error(status: StatusCode, message: &str) -> ApiError {
    (status, Json(json!({ "error": message })))
}

/// Run the retry ladder for one flight against every other flight.
///
/// The planner works on a copy of the stored flight; a suggested level
/// change is reported, not applied.
pub async fn suggest_path(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SuggestPathRequest>,
) -> Result<Json<SuggestPathResponse>, ApiError> {
    let snapshot = state.snapshot();
    let airspace = snapshot.airspace;
    if !airspace.contains(&req.start) || !airspace.contains(&req.goal) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Invalid start or goal waypoint",
        ));
    }

    let (own, others): (Vec<FlightTrajectory>, Vec<FlightTrajectory>) = snapshot
        .flights
        .into_iter()
        .partition(|flight| flight.callsign == req.callsign);
    let flight = own
        .into_iter()
        .next()
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Flight not found"))?;

    let config = state.planner_config().clone();
    let max_attempts = req
        .max_attempts
        .unwrap_or(config.max_attempts)
        .min(MAX_LADDER_ATTEMPTS);
    let search_airspace = airspace.clone();
    let (start, goal) = (req.start.clone(), req.goal.clone());

    let planned = tokio::task::spawn_blocking(move || {
        PathPlanner::new(&search_airspace, config).find_alternative_path(
            &flight,
            &start,
            &goal,
            &others,
            max_attempts,
        )
    })
    .await
    .map_err(|err| {
        tracing::error!("Path search task failed: {}", err);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "Path search failed")
    })?
    .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "No alternative path found"))?;

    let total_distance_nm: f64 = planned
        .path
        .windows(2)
        .filter_map(|pair| airspace.great_circle_nm(&pair[0], &pair[1]))
        .sum();

    tracing::info!(
        callsign = %req.callsign,
        strategy = ?planned.strategy,
        "Suggested path {}",
        planned.path.join(" → ")
    );

    Ok(Json(SuggestPathResponse {
        waypoints_count: planned.path.len(),
        new_path: planned.path,
        total_distance_nm: (total_distance_nm * 100.0).round() / 100.0,
        original_start: req.start,
        original_goal: req.goal,
        flight_level: planned.flight_level,
        strategy: planned.strategy,
    }))
}
