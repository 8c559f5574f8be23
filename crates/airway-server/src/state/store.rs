//! In-memory state store using DashMap.

use airway_core::{
    Conflict, ConflictDetector, FlightTrajectory, PlannerConfig, SeparationRules, WaypointGraph,
};
use chrono::NaiveDate;
use dashmap::DashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::Config;

/// Application state: one airspace snapshot plus flights keyed by callsign.
///
/// The airspace lock also guards the flight map as a whole: a dataset reload
/// holds it for writing while both are swapped, and multi-flight readers hold
/// it for reading, so nobody sees the new airspace with the old flights.
/// Detection and path search run on a [`DatasetSnapshot`] after the lock is
/// released.
pub struct AppState {
    airspace: RwLock<Arc<WaypointGraph>>,
    flights: DashMap<String, FlightTrajectory>,
    detector: ConflictDetector,
    planner: PlannerConfig,
    base_date: NaiveDate,
}

/// Airspace and flights captured under one read lock.
#[derive(Debug, Clone)]
pub struct DatasetSnapshot {
    pub airspace: Arc<WaypointGraph>,
    /// Ordered by callsign
    pub flights: Vec<FlightTrajectory>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self::with_settings(config.rules.clone(), config.planner.clone(), config.base_date)
    }

    pub fn with_settings(rules: SeparationRules, planner: PlannerConfig, base_date: NaiveDate) -> Self {
        Self {
            airspace: RwLock::new(Arc::new(WaypointGraph::new())),
            flights: DashMap::new(),
            detector: ConflictDetector::new(rules),
            planner,
            base_date,
        }
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, Arc<WaypointGraph>> {
        match self.airspace.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, Arc<WaypointGraph>> {
        match self.airspace.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Replace the airspace and the whole flight set in one step.
    pub fn replace_dataset(&self, airspace: WaypointGraph, flights: Vec<FlightTrajectory>) {
        let mut guard = self.write_guard();
        self.flights.clear();
        for flight in flights {
            self.flights.insert(flight.callsign.clone(), flight);
        }
        *guard = Arc::new(airspace);
    }

    /// Current airspace snapshot.
    pub fn airspace(&self) -> Arc<WaypointGraph> {
        self.read_guard().clone()
    }

    /// Airspace and flights that belong to the same dataset.
    pub fn snapshot(&self) -> DatasetSnapshot {
        let guard = self.read_guard();
        DatasetSnapshot {
            airspace: guard.clone(),
            flights: self.sorted_flights(),
        }
    }

    /// All flights ordered by callsign.
    pub fn get_flights(&self) -> Vec<FlightTrajectory> {
        let _guard = self.read_guard();
        self.sorted_flights()
    }

    fn sorted_flights(&self) -> Vec<FlightTrajectory> {
        let mut flights: Vec<FlightTrajectory> =
            self.flights.iter().map(|r| r.value().clone()).collect();
        flights.sort_by(|a, b| a.callsign.cmp(&b.callsign));
        flights
    }

    pub fn get_flight(&self, callsign: &str) -> Option<FlightTrajectory> {
        self.flights.get(callsign).map(|r| r.value().clone())
    }

    /// Insert a flight that was validated against `airspace`.
    ///
    /// Returns `None` without storing anything when the airspace has been
    /// replaced since, otherwise whether a flight with the same callsign
    /// was replaced.
    pub fn upsert_flight(
        &self,
        airspace: &Arc<WaypointGraph>,
        flight: FlightTrajectory,
    ) -> Option<bool> {
        let guard = self.read_guard();
        if !Arc::ptr_eq(&guard, airspace) {
            return None;
        }
        Some(self.flights.insert(flight.callsign.clone(), flight).is_some())
    }

    pub fn flight_count(&self) -> usize {
        let _guard = self.read_guard();
        self.flights.len()
    }

    /// Run the detector over the current flights. Nothing is cached.
    pub fn detect_conflicts(&self) -> Vec<Conflict> {
        self.detect_conflicts_in(&self.snapshot())
    }

    pub fn detect_conflicts_in(&self, snapshot: &DatasetSnapshot) -> Vec<Conflict> {
        self.detector.detect(&snapshot.flights, &snapshot.airspace)
    }

    pub fn planner_config(&self) -> &PlannerConfig {
        &self.planner
    }

    pub fn base_date(&self) -> NaiveDate {
        self.base_date
    }
}
