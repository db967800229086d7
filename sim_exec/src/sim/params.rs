//! Simulation parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use crate::{track::TrackParams, vehicle::VehicleParams};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for a simulation run, normally loaded from `sim.toml`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SimParams {
    /// Fixed simulated time between two ticks.
    ///
    /// Units: seconds
    #[serde(default = "default_tick_period_s")]
    pub tick_period_s: f64,

    /// The track followed by every vehicle
    pub track: TrackParams,

    /// The vehicles, each running independently on the same track
    pub vehicles: Vec<VehicleParams>
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// 60 Hz
fn default_tick_period_s() -> f64 {
    1.0 / 60.0
}
