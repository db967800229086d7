//! # Vehicle module
//!
//! A vehicle drives forward at constant speed while a PID controller steers it
//! to keep the line under the centre of its sensor array.
//!
//! Each call to [`Vehicle::update`] is one tick:
//!
//! 1. The sensor positions are computed from the current pose and sampled
//!    against the track.
//! 2. The readings are reduced to a lateral error.
//! 3. The PID controller turns the error into a correction.
//! 4. The correction is integrated into the heading, which is then used to
//!    advance the position.
//!
//! The tick is atomic: if the controller rejects the time step no state is
//! changed.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::VehicleParams;
pub use state::*;

use crate::{pid::PidError, sensor::SensorError};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum VehicleError {
    #[error("The tick period must be finite and strictly positive, found {0} s")]
    InvalidTickPeriod(f64),

    #[error("The speed must be finite, found {0}")]
    InvalidSpeed(f64),

    #[error("The steering scale must be finite, found {0}")]
    InvalidSteeringScale(f64),

    #[error("The maximum turn rate must be finite and strictly positive, found {0} rad/s")]
    InvalidMaxTurnRate(f64),

    #[error("The start pose must be finite")]
    InvalidStartPose,

    #[error("The {0} capacity must be non-zero")]
    ZeroCapacity(&'static str),

    #[error("Invalid sensor parameters: {0}")]
    SensorError(#[from] SensorError),

    #[error("PID controller error: {0}")]
    PidError(#[from] PidError)
}
