//! # Simulation module
//!
//! Owns the track and the vehicles running on it. One call to `proc` is one
//! tick of the simulation: any tuning commands are applied first, then every
//! vehicle is updated in turn.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;
pub mod tuning;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::SimParams;
pub use state::*;
pub use tuning::TuningCmd;

use crate::{track::TrackError, vehicle::VehicleError};
use util::archive::ArchiveError;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during the simulation.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("The simulation must contain at least one vehicle")]
    NoVehicles,

    #[error("Could not build the track: {0}")]
    TrackError(#[from] TrackError),

    #[error("Vehicle {0} error: {1}")]
    VehicleError(usize, VehicleError),

    #[error("No vehicle with index {0}, there are {1} vehicles")]
    InvalidVehicleIndex(usize, usize),

    #[error("Invalid tuning command: {0:?}")]
    InvalidTuningCmd(TuningCmd),

    #[error("Archive error: {0}")]
    ArchiveError(#[from] ArchiveError)
}
