//! PID controller parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for a PID controller
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PidParams {
    /// Initial proportional gain
    pub kp: f64,

    /// Initial integral gain
    pub ki: f64,

    /// Initial derivative gain
    pub kd: f64,

    /// Symmetric limit applied to the integral accumulator.
    #[serde(default = "default_integral_limit")]
    pub integral_limit: f64,

    /// Number of samples kept in the error and output histories.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidParams {
    /// Gains only, with the default integral limit and history capacity.
    pub fn with_gains(kp: f64, ki: f64, kd: f64) -> Self {
        Self {
            kp, ki, kd,
            integral_limit: default_integral_limit(),
            history_capacity: default_history_capacity()
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn default_integral_limit() -> f64 {
    10.0
}

/// 5 seconds at 60 Hz
fn default_history_capacity() -> usize {
    300
}
