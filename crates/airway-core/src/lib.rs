pub mod conflict;
pub mod dataset;
pub mod error;
pub mod graph;
pub mod models;
pub mod planner;
pub mod rules;
pub mod scenario;
pub mod spatial;
pub mod trajectory;

pub use conflict::{
    detect_conflicts, Conflict, ConflictDetector, ConflictKind, ConflictLocation, ConflictSummary,
};
pub use dataset::{
    load_flights, parse_base_date, parse_flight_plans, validate_route, AirspaceData,
    FlightPlanRecord, LoadedFlights,
};
pub use error::DatasetError;
pub use graph::{RouteListing, WaypointGraph};
pub use models::{FlightTrajectory, RouteDirection, RouteEdge, Waypoint, WaypointCategory};
pub use planner::{
    find_alternative_path, find_path, PathPlanner, PlanStrategy, PlannedPath, PlannerConfig,
    TrafficIndex, TurnFailurePolicy, MAX_LADDER_ATTEMPTS,
};
pub use rules::SeparationRules;
pub use spatial::{haversine_nm, turn_angle_deg};
pub use trajectory::{estimate_times, DistanceLookup, SegmentDistances};
