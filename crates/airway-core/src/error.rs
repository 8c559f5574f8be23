//! Error types for dataset ingestion.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("flight {0} has an empty route")]
    EmptyRoute(String),

    #[error("invalid flight level: {0}")]
    InvalidFlightLevel(String),

    #[error("invalid speed: {0}")]
    InvalidSpeed(String),

    #[error("invalid entry time: {0}")]
    InvalidEntryTime(String),

    #[error("invalid base date: {0}")]
    InvalidBaseDate(String),

    #[error("waypoint {0} not found in airspace")]
    UnknownWaypoint(String),
}
