//! Gain tuning commands
//!
//! Tuning commands change the controller of a vehicle between ticks. They are
//! normally read from a script with lines such as:
//!
//! ```text
//! 2.0: {"AdjustGain": {"vehicle": 0, "gain": "Kp", "delta": 0.1}};
//! 4.0: {"SetGains": {"vehicle": 1, "gains": {"kp": 1.5, "ki": 0.01, "kd": 0.5}}};
//! 6.0: "Reset";
//! ```

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use serde::{Deserialize, Serialize};

// Internal
use super::SimError;
use crate::{
    pid::{Gain, PidGains},
    vehicle::Vehicle
};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A command changing the controllers of the simulated vehicles.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum TuningCmd {
    /// Add `delta` to one gain of one vehicle. The gain cannot go below zero.
    AdjustGain {
        vehicle: usize,
        gain: Gain,
        delta: f64
    },

    /// Replace all gains of one vehicle.
    SetGains {
        vehicle: usize,
        gains: PidGains
    },

    /// Return every vehicle to its start pose.
    Reset
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TuningCmd {
    /// Apply the command to the given vehicles.
    ///
    /// Nothing is modified if the command is rejected.
    pub fn apply(&self, vehicles: &mut [Vehicle]) -> Result<(), SimError> {
        let num_vehicles = vehicles.len();

        match *self {
            TuningCmd::AdjustGain { vehicle, gain, delta } => {
                if !delta.is_finite() {
                    return Err(SimError::InvalidTuningCmd(self.clone()))
                }

                let v = vehicles.get_mut(vehicle)
                    .ok_or(SimError::InvalidVehicleIndex(vehicle, num_vehicles))?;
                v.pid_mut().adjust_gain(gain, delta);

                debug!("{}: gains now {:?}", v.name(), v.pid().gains());
            },
            TuningCmd::SetGains { vehicle, gains } => {
                if !(gains.kp.is_finite() && gains.ki.is_finite() && gains.kd.is_finite()) {
                    return Err(SimError::InvalidTuningCmd(self.clone()))
                }

                let v = vehicles.get_mut(vehicle)
                    .ok_or(SimError::InvalidVehicleIndex(vehicle, num_vehicles))?;
                v.pid_mut().set_gains(gains);

                debug!("{}: gains set to {:?}", v.name(), gains);
            },
            TuningCmd::Reset => {
                for v in vehicles.iter_mut() {
                    v.reset();
                }
            }
        }

        Ok(())
    }
}
