//! REST API routes.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

use airway_core::{scenario, Conflict, ConflictKind, ConflictSummary, RouteListing, Waypoint};

use crate::api::{flights, planning};
use crate::state::AppState;

/// Create the API router.
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/v1/airspace", get(get_airspace))
        .route(
            "/v1/flights",
            get(flights::list_flights).post(flights::add_flight),
        )
        .route("/v1/conflicts", get(list_conflicts))
        .route("/v1/suggest_path", post(planning::suggest_path))
        .route("/v1/load_test_data", post(load_test_data))
        .route("/v1/stats", get(get_stats))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AirspaceResponse {
    pub waypoints: Vec<Waypoint>,
    pub routes: Vec<RouteListing>,
}

async fn get_airspace(State(state): State<Arc<AppState>>) -> Json<AirspaceResponse> {
    let airspace = state.airspace();
    Json(AirspaceResponse {
        waypoints: airspace.waypoints().into_iter().cloned().collect(),
        routes: airspace.edges(),
    })
}

async fn list_conflicts(State(state): State<Arc<AppState>>) -> Json<Vec<Conflict>> {
    Json(state.detect_conflicts())
}

async fn load_test_data(State(state): State<Arc<AppState>>) -> Json<Value> {
    state.replace_dataset(scenario::test_airspace(), scenario::test_flights());
    let snapshot = state.snapshot();
    tracing::info!("Loaded demo scenario with {} flights", snapshot.flights.len());

    Json(json!({
        "message": "Test data loaded successfully",
        "waypoints_count": snapshot.airspace.waypoint_count(),
        "flights_count": snapshot.flights.len(),
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub waypoints_count: usize,
    pub flights_count: usize,
    pub routes_count: usize,
    pub conflicts_count: usize,
    pub conflict_types: BTreeMap<ConflictKind, usize>,
}

async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let snapshot = state.snapshot();
    let summary = ConflictSummary::from_conflicts(&state.detect_conflicts_in(&snapshot));

    Json(StatsResponse {
        waypoints_count: snapshot.airspace.waypoint_count(),
        flights_count: snapshot.flights.len(),
        routes_count: snapshot.airspace.route_count(),
        conflicts_count: summary.total,
        conflict_types: summary.by_kind,
    })
}
