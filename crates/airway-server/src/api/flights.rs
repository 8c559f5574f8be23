//! Flight listing and submission.

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use airway_core::{validate_route, FlightPlanRecord, FlightTrajectory};

use crate::state::AppState;

/// All flights with their ETA timelines.
pub async fn list_flights(State(state): State<Arc<AppState>>) -> Json<Vec<FlightTrajectory>> {
    Json(state.get_flights())
}

/// Add a flight. Every route waypoint must exist in the airspace; ETAs come
/// from great-circle segment distances.
pub async fn add_flight(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<FlightPlanRecord>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let airspace = state.airspace();
    let flight = payload
        .to_flight(&airspace, state.base_date())
        .and_then(|flight| validate_route(&airspace, &flight.route).map(|_| flight))
        .map_err(|err| {
            tracing::warn!("Rejected flight {}: {}", payload.callsign, err);
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": err.to_string() })),
            )
        })?;

    let callsign = flight.callsign.clone();
    match state.upsert_flight(&airspace, flight) {
        Some(true) => tracing::info!("Replaced flight {}", callsign),
        Some(false) => tracing::info!("Added flight {}", callsign),
        None => {
            tracing::warn!("Airspace reloaded while adding flight {}", callsign);
            return Err((
                StatusCode::CONFLICT,
                Json(json!({ "error": "Airspace was reloaded, resubmit the flight" })),
            ));
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Flight added successfully",
            "callsign": callsign,
        })),
    ))
}
