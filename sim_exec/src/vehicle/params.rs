//! Vehicle parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use crate::{pid::PidParams, sensor::SensorParams};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for a single simulated vehicle.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VehicleParams {
    /// Display name of the vehicle, also used to name its archive.
    pub name: String,

    /// Position of the vehicle at the start of the run and after a reset.
    pub start_position: [f64; 2],

    /// Heading of the vehicle at the start of the run and after a reset.
    ///
    /// Units: radians
    #[serde(default)]
    pub start_heading_rad: f64,

    /// Constant forward speed.
    ///
    /// Units: track units/second
    pub speed: f64,

    /// Multiplier converting the controller output into a heading rate.
    pub steering_scale: f64,

    /// Optional limit on the magnitude of the heading rate.
    ///
    /// Units: radians/second
    #[serde(default)]
    pub max_turn_rate_rads: Option<f64>,

    /// Number of positions kept in the trajectory.
    #[serde(default = "default_trajectory_capacity")]
    pub trajectory_capacity: usize,

    pub pid: PidParams,

    pub sensors: SensorParams
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn default_trajectory_capacity() -> usize {
    1000
}
