//! # Sensor module
//!
//! Simulates the row of infrared line sensors on the front of a vehicle and
//! reduces their readings to a single lateral error.
//!
//! ## Readings
//!
//! Each sensor reading is an intensity in `[0, MAX_READING]`, where zero is
//! fully off the line and `MAX_READING` fully on it. Readings are computed
//! geometrically from the shortest distance `d` between the sensor and the
//! track centreline:
//!
//! ```text
//! reading = MAX_READING * clamp(1 - (d - line_half_width) / falloff, 0, 1)
//! ```
//!
//! A sensor outside of the track's bounds reads `MAX_READING`: if we can't
//! see the surface we assume the worst case.
//!
//! ## Error
//!
//! Readings are normalised to `[0, 1]` and the error is the activation
//! weighted centroid of the sensor weights, `sum(w_i * r_i) / sum(r_i)`, so it
//! lies between the smallest and largest weight. If the total activation is
//! below `line_lost_threshold` the line is lost and the error is
//! `LINE_LOST_ERROR`, i.e. keep going straight.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

pub use params::SensorParams;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;
use serde::Serialize;

// Internal
use crate::{pose::Pose, track::Track};
use util::maths::lin_map_sat;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of sensors on a vehicle
pub const NUM_SENSORS: usize = 5;

/// Reading of a sensor fully on the line
pub const MAX_READING: f64 = 1024.0;

/// Error reported when the line has been lost
pub const LINE_LOST_ERROR: f64 = 0.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A validated sensor array.
#[derive(Debug, Clone)]
pub struct SensorArray {
    params: SensorParams,

    /// Sensor offsets in the vehicle frame
    offsets: [Vector2<f64>; NUM_SENSORS]
}

/// The result of sampling every sensor at one pose.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct SensorSample {
    /// Sensor positions in the track frame
    pub positions: [Vector2<f64>; NUM_SENSORS],

    /// Sensor readings in `[0, MAX_READING]`
    pub readings: [f64; NUM_SENSORS],

    /// True for each sensor that fell outside the track bounds
    pub out_of_bounds: [bool; NUM_SENSORS]
}

/// The error derived from one set of readings.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct ErrorEstimate {
    /// Weighted lateral error, positive when the line is to the left
    pub error: f64,

    /// Sum of the normalised readings
    pub activation: f64,

    /// True if the activation was below the line lost threshold
    pub line_lost: bool
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SensorError {
    #[error("Sensor {0} has a non-finite offset")]
    NonFiniteOffset(usize),

    #[error("Sensor {0} has a non-finite weight")]
    NonFiniteWeight(usize),

    #[error("The line half width must be finite and non-negative, found {0}")]
    InvalidLineHalfWidth(f64),

    #[error("The reading falloff must be finite and strictly positive, found {0}")]
    InvalidFalloff(f64),

    #[error("The line lost threshold must be finite and non-negative, found {0}")]
    InvalidLineLostThreshold(f64)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SensorArray {
    /// Create a new sensor array, validating the parameters.
    pub fn new(params: SensorParams) -> Result<Self, SensorError> {
        let mut offsets = [Vector2::zeros(); NUM_SENSORS];

        for (i, o) in params.offsets.iter().enumerate() {
            if !(o[0].is_finite() && o[1].is_finite()) {
                return Err(SensorError::NonFiniteOffset(i))
            }
            offsets[i] = Vector2::new(o[0], o[1]);
        }

        if let Some(i) = params.weights.iter().position(|w| !w.is_finite()) {
            return Err(SensorError::NonFiniteWeight(i))
        }
        if !(params.line_half_width.is_finite() && params.line_half_width >= 0.0) {
            return Err(SensorError::InvalidLineHalfWidth(params.line_half_width))
        }
        if !(params.falloff.is_finite() && params.falloff > 0.0) {
            return Err(SensorError::InvalidFalloff(params.falloff))
        }
        if !(params.line_lost_threshold.is_finite() && params.line_lost_threshold >= 0.0) {
            return Err(SensorError::InvalidLineLostThreshold(params.line_lost_threshold))
        }

        Ok(Self { params, offsets })
    }

    pub fn params(&self) -> &SensorParams {
        &self.params
    }

    /// Get the track frame position of every sensor for the given pose.
    pub fn world_positions(&self, pose: &Pose) -> [Vector2<f64>; NUM_SENSORS] {
        let mut positions = [Vector2::zeros(); NUM_SENSORS];

        for (p, o) in positions.iter_mut().zip(self.offsets.iter()) {
            *p = pose.to_world(o);
        }

        positions
    }

    /// Read a single sensor at the given track frame position.
    ///
    /// Returns the reading and whether the position was outside the track
    /// bounds.
    pub fn read(&self, position: &Vector2<f64>, track: &Track) -> (f64, bool) {
        if !track.in_bounds(position) {
            return (MAX_READING, true)
        }

        let reading = intensity(
            track.distance_to(position), 
            self.params.line_half_width, 
            self.params.falloff
        );

        (reading, false)
    }

    /// Sample every sensor against the track at the given pose.
    ///
    /// The sensor positions are always computed from `pose`, so the sample is
    /// only valid for that pose.
    pub fn sample(&self, pose: &Pose, track: &Track) -> SensorSample {
        let positions = self.world_positions(pose);
        let mut readings = [0f64; NUM_SENSORS];
        let mut out_of_bounds = [false; NUM_SENSORS];

        for (i, p) in positions.iter().enumerate() {
            let (r, oob) = self.read(p, track);
            readings[i] = r;
            out_of_bounds[i] = oob;
        }

        SensorSample {
            positions,
            readings,
            out_of_bounds
        }
    }

    /// Reduce readings to an error using this array's weights and threshold.
    pub fn reduce(&self, readings: &[f64; NUM_SENSORS]) -> ErrorEstimate {
        reduce(readings, &self.params.weights, self.params.line_lost_threshold)
    }
}

impl SensorSample {
    pub fn num_out_of_bounds(&self) -> usize {
        self.out_of_bounds.iter().filter(|o| **o).count()
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert a distance from the centreline into a sensor reading.
pub fn intensity(distance: f64, line_half_width: f64, falloff: f64) -> f64 {
    lin_map_sat(
        (line_half_width, line_half_width + falloff), 
        (MAX_READING, 0.0), 
        distance
    )
}

/// Reduce a set of readings to a single weighted error.
///
/// The error is the activation weighted centroid of the weights. If the total
/// normalised activation is below `line_lost_threshold` the line is lost and
/// `LINE_LOST_ERROR` is returned instead.
pub fn reduce(
    readings: &[f64; NUM_SENSORS], 
    weights: &[f64; NUM_SENSORS], 
    line_lost_threshold: f64
) -> ErrorEstimate {
    let mut weighted_sum = 0f64;
    let mut activation = 0f64;

    for (r, w) in readings.iter().zip(weights.iter()) {
        let norm = r / MAX_READING;
        weighted_sum += w * norm;
        activation += norm;
    }

    // Written so that a NaN activation also counts as lost
    let line_lost = !(activation >= line_lost_threshold && activation > 0.0);

    let error = if line_lost {
        LINE_LOST_ERROR
    }
    else {
        weighted_sum / activation
    };

    ErrorEstimate {
        error,
        activation,
        line_lost
    }
}
