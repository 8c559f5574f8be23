//! Shared library surface for the airway server and its tests.

pub mod api;
pub mod config;
pub mod loader;
pub mod state;
