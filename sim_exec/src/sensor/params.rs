//! Sensor array parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use super::NUM_SENSORS;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of a vehicle's infrared sensor array.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SensorParams {
    /// Position of each sensor in the vehicle frame as `[forward, left]`,
    /// ordered from the rightmost sensor to the leftmost.
    pub offsets: [[f64; 2]; NUM_SENSORS],

    /// Signed weight of each sensor in the error estimate.
    #[serde(default = "default_weights")]
    pub weights: [f64; NUM_SENSORS],

    /// Distance from the centreline within which a sensor reads fully on the
    /// line.
    pub line_half_width: f64,

    /// Distance beyond `line_half_width` over which the reading falls
    /// linearly from fully on to fully off the line.
    pub falloff: f64,

    /// Total normalised activation below which the line is considered lost.
    #[serde(default = "default_line_lost_threshold")]
    pub line_lost_threshold: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SensorParams {
    /// An evenly spaced row of sensors `forward` ahead of the vehicle centre,
    /// with the default weights and thresholds.
    pub fn row(forward: f64, spacing: f64, line_half_width: f64, falloff: f64) -> Self {
        let mut offsets = [[0f64; 2]; NUM_SENSORS];
        let centre = (NUM_SENSORS / 2) as f64;

        for (i, o) in offsets.iter_mut().enumerate() {
            *o = [forward, (i as f64 - centre) * spacing];
        }

        Self {
            offsets,
            weights: default_weights(),
            line_half_width,
            falloff,
            line_lost_threshold: default_line_lost_threshold()
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn default_weights() -> [f64; NUM_SENSORS] {
    [-2.0, -1.0, 0.0, 1.0, 2.0]
}

fn default_line_lost_threshold() -> f64 {
    0.1
}
