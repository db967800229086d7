//! Track parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters describing the track to follow.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TrackParams {
    /// The shape of the centreline
    pub shape: TrackSpec,

    /// Extent of the sampled surface. Sensors outside of it read as fully
    /// on the line. If `None` the surface is unbounded.
    #[serde(default)]
    pub bounds: Option<Bounds>
}

/// An axis aligned rectangle.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Minimum corner
    pub min: [f64; 2],

    /// Maximum corner
    pub max: [f64; 2]
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Specification of a track centreline.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum TrackSpec {
    /// An explicit ordered list of waypoints
    Waypoints {
        points: Vec<[f64; 2]>
    },

    /// A single straight segment
    Straight {
        start: [f64; 2],
        end: [f64; 2]
    },

    /// The closed-form moose test: a straight run in, a full-period S-curve
    /// lane change, a decaying three half-period recovery and a straight run
    /// out. Sampled every `step` along X starting at zero.
    MooseTest {
        length: f64,
        centre_y: f64,
        #[serde(default = "default_lane_change_amplitude")]
        lane_change_amplitude: f64,
        #[serde(default = "default_recovery_amplitude")]
        recovery_amplitude: f64,
        #[serde(default = "default_step")]
        step: f64
    },

    /// Sum of sines about `centre_y`, each term given as
    /// `[amplitude, angular frequency]`.
    Sinusoid {
        length: f64,
        centre_y: f64,
        #[serde(default = "default_sine_terms")]
        terms: Vec<[f64; 2]>,
        #[serde(default = "default_step")]
        step: f64
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Bounds {
    /// Returns true if the point lies inside the bounds (edges inclusive).
    pub fn contains(&self, point: &Vector2<f64>) -> bool {
        point[0] >= self.min[0] && point[0] <= self.max[0]
            && point[1] >= self.min[1] && point[1] <= self.max[1]
    }
}

impl TrackSpec {
    /// The double lane change used by default, as nine waypoints about
    /// `centre_y`.
    pub fn moose_waypoints(centre_y: f64) -> Self {
        let layout = [
            (50.0, 0.0),
            (150.0, 0.0),
            (250.0, -50.0),
            (350.0, -50.0),
            (450.0, 0.0),
            (550.0, 50.0),
            (650.0, 50.0),
            (750.0, 0.0),
            (950.0, 0.0)
        ];

        TrackSpec::Waypoints {
            points: layout.iter().map(|(x, dy)| [*x, centre_y + dy]).collect()
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn default_lane_change_amplitude() -> f64 {
    120.0
}

fn default_recovery_amplitude() -> f64 {
    80.0
}

fn default_step() -> f64 {
    2.0
}

fn default_sine_terms() -> Vec<[f64; 2]> {
    vec![[80.0, 0.005], [30.0, 0.03]]
}
