//! # Track module
//!
//! The track is the line the vehicles follow. It is stored as an ordered
//! sequence of waypoints, each pair of neighbouring points forming one
//! straight segment of the centreline. The track is read-only from the
//! vehicles' point of view.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

pub use params::*;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::f64::consts::PI;
use nalgebra::Vector2;
use serde::Serialize;

// Internal
use util::maths::dist_point_to_polyline;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Maximum number of points a closed-form track may be sampled into.
pub const MAX_TRACK_SAMPLES: usize = 1_000_000;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A line to follow.
#[derive(Debug, Clone, Serialize)]
pub struct Track {
    /// Centreline waypoints
    points: Vec<Vector2<f64>>,

    /// Extent of the sampled surface
    bounds: Option<Bounds>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TrackError {
    #[error("A track needs at least two points, found {0}")]
    TooFewPoints(usize),

    #[error("Track point {0} is not finite")]
    NonFinitePoint(usize),

    #[error("Invalid track specification: {0}")]
    InvalidSpec(String),

    #[error("Invalid track bounds: min {0:?} is not below max {1:?}")]
    InvalidBounds([f64; 2], [f64; 2])
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Track {
    /// Create a new track from a list of waypoints.
    pub fn new(
        points: Vec<Vector2<f64>>, 
        bounds: Option<Bounds>
    ) -> Result<Self, TrackError> {
        validate_points(&points)?;

        if let Some(b) = bounds {
            if !(b.min[0] < b.max[0] && b.min[1] < b.max[1]) {
                return Err(TrackError::InvalidBounds(b.min, b.max))
            }
        }

        Ok(Self { points, bounds })
    }

    /// Build the track described by the parameters.
    pub fn from_params(params: &TrackParams) -> Result<Self, TrackError> {
        Self::new(params.shape.generate()?, params.bounds)
    }

    /// Get the centreline waypoints in order.
    pub fn get_points(&self) -> &[Vector2<f64>] {
        &self.points
    }

    /// Replace the centreline.
    ///
    /// The current points are kept if the new ones are invalid.
    pub fn set_track_points(&mut self, points: Vec<Vector2<f64>>) -> Result<(), TrackError> {
        validate_points(&points)?;
        self.points = points;
        Ok(())
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    /// Returns true if the point lies on the sampled surface.
    pub fn in_bounds(&self, point: &Vector2<f64>) -> bool {
        match self.bounds {
            Some(b) => b.contains(point),
            None => true
        }
    }

    /// Shortest distance from the point to the centreline.
    pub fn distance_to(&self, point: &Vector2<f64>) -> f64 {
        // At least two points are guaranteed by construction
        dist_point_to_polyline(point, &self.points).unwrap_or(std::f64::INFINITY)
    }

    /// Total length of the centreline.
    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| (w[1] - w[0]).norm()).sum()
    }
}

impl TrackSpec {
    /// Generate the waypoints for this specification.
    pub fn generate(&self) -> Result<Vec<Vector2<f64>>, TrackError> {
        match self {
            TrackSpec::Waypoints { points } => Ok(
                points.iter().map(|p| Vector2::new(p[0], p[1])).collect()
            ),
            TrackSpec::Straight { start, end } => Ok(vec![
                Vector2::new(start[0], start[1]),
                Vector2::new(end[0], end[1])
            ]),
            TrackSpec::MooseTest { 
                length, centre_y, lane_change_amplitude, recovery_amplitude, step 
            } => sample_x(*length, *step, |x| {
                centre_y + moose_offset(x, *lane_change_amplitude, *recovery_amplitude)
            }),
            TrackSpec::Sinusoid { length, centre_y, terms, step } => sample_x(*length, *step, |x| {
                centre_y + terms.iter().map(|t| t[0] * (t[1] * x).sin()).sum::<f64>()
            })
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn validate_points(points: &[Vector2<f64>]) -> Result<(), TrackError> {
    if points.len() < 2 {
        return Err(TrackError::TooFewPoints(points.len()))
    }

    if let Some(i) = points.iter().position(|p| !(p[0].is_finite() && p[1].is_finite())) {
        return Err(TrackError::NonFinitePoint(i))
    }

    Ok(())
}

/// Sample `f(x)` from zero to `length` (inclusive) every `step`.
fn sample_x<F>(length: f64, step: f64, f: F) -> Result<Vec<Vector2<f64>>, TrackError> 
where
    F: Fn(f64) -> f64
{
    if !(step > 0.0) || !(length > 0.0) || !(length / step).is_finite() {
        return Err(TrackError::InvalidSpec(format!(
            "length ({}) and step ({}) must be strictly positive", length, step
        )))
    }

    let num_steps = (length / step).floor();
    if num_steps >= MAX_TRACK_SAMPLES as f64 {
        return Err(TrackError::InvalidSpec(format!(
            "length ({}) and step ({}) give more than {} samples", 
            length, step, MAX_TRACK_SAMPLES
        )))
    }
    let num_steps = num_steps as usize;
    let mut points: Vec<Vector2<f64>> = (0..=num_steps)
        .map(|i| {
            let x = i as f64 * step;
            Vector2::new(x, f(x))
        })
        .collect();

    // Always finish exactly at the requested length
    if (num_steps as f64) * step < length {
        points.push(Vector2::new(length, f(length)));
    }

    Ok(points)
}

/// Lateral offset of the moose test centreline at `x`.
fn moose_offset(x: f64, lane_change_amplitude: f64, recovery_amplitude: f64) -> f64 {
    if x < 150.0 {
        0.0
    }
    else if x < 300.0 {
        let progress = (x - 150.0) / 150.0;
        lane_change_amplitude * (progress * 2.0 * PI).sin()
    }
    else if x < 500.0 {
        let progress = (x - 300.0) / 200.0;
        recovery_amplitude * (1.0 - progress) * (progress * 3.0 * PI).sin()
    }
    else {
        0.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_track_validation() {
        assert_eq!(
            Track::new(vec![Vector2::new(0.0, 0.0)], None).unwrap_err(),
            TrackError::TooFewPoints(1)
        );
        assert_eq!(
            Track::new(vec![Vector2::new(0.0, 0.0), Vector2::new(f64::NAN, 1.0)], None).unwrap_err(),
            TrackError::NonFinitePoint(1)
        );
        assert!(matches!(
            Track::new(
                vec![Vector2::new(0.0, 0.0), Vector2::new(1.0, 0.0)],
                Some(Bounds { min: [10.0, 0.0], max: [0.0, 10.0] })
            ),
            Err(TrackError::InvalidBounds(_, _))
        ));
    }

    #[test]
    fn test_set_track_points() {
        let mut track = Track::new(
            vec![Vector2::new(0.0, 0.0), Vector2::new(10.0, 0.0)], None
        ).unwrap();

        assert!(track.set_track_points(vec![]).is_err());
        assert_eq!(track.get_points().len(), 2);

        track.set_track_points(vec![
            Vector2::new(0.0, 0.0), Vector2::new(3.0, 4.0), Vector2::new(3.0, 10.0)
        ]).unwrap();
        assert_eq!(track.get_points()[1], Vector2::new(3.0, 4.0));
        assert_eq!(track.length(), 11.0);
    }

    #[test]
    fn test_distance_and_bounds() {
        let track = Track::new(
            vec![Vector2::new(0.0, 0.0), Vector2::new(100.0, 0.0)],
            Some(Bounds { min: [0.0, -50.0], max: [100.0, 50.0] })
        ).unwrap();

        assert_eq!(track.distance_to(&Vector2::new(50.0, 7.0)), 7.0);
        assert!(track.in_bounds(&Vector2::new(100.0, 50.0)));
        assert!(!track.in_bounds(&Vector2::new(100.5, 0.0)));
        assert!(!track.in_bounds(&Vector2::new(10.0, -51.0)));
    }

    #[test]
    fn test_moose_waypoints() {
        let points = TrackSpec::moose_waypoints(325.0).generate().unwrap();
        assert_eq!(points.len(), 9);
        assert_eq!(points[0], Vector2::new(50.0, 325.0));
        assert_eq!(points[3], Vector2::new(350.0, 275.0));
        assert_eq!(points[6], Vector2::new(650.0, 375.0));
        assert_eq!(points[8], Vector2::new(950.0, 325.0));
    }

    #[test]
    fn test_closed_form_shapes() {
        let moose = TrackSpec::MooseTest {
            length: 800.0,
            centre_y: 350.0,
            lane_change_amplitude: 120.0,
            recovery_amplitude: 80.0,
            step: 2.0
        }.generate().unwrap();

        assert_eq!(moose.len(), 401);
        assert_eq!(moose[0], Vector2::new(0.0, 350.0));
        assert!((moose_offset(187.5, 120.0, 80.0) - 120.0).abs() < 1e-9);
        assert_eq!(moose_offset(600.0, 120.0, 80.0), 0.0);
        assert_eq!(moose[400], Vector2::new(800.0, 350.0));

        let sine = TrackSpec::Sinusoid {
            length: 5.0,
            centre_y: 10.0,
            terms: vec![[2.0, PI / 2.0]],
            step: 2.0
        }.generate().unwrap();

        // Sampled at 0, 2, 4 and the end point 5
        assert_eq!(sine.len(), 4);
        assert!((sine[3][1] - 12.0).abs() < 1e-9);

        assert!(matches!(
            TrackSpec::Sinusoid { length: 5.0, centre_y: 0.0, terms: vec![], step: 0.0 }.generate(),
            Err(TrackError::InvalidSpec(_))
        ));
    }

    #[test]
    fn test_sample_count_limit() {
        assert!(matches!(
            TrackSpec::Sinusoid { length: 1e12, centre_y: 0.0, terms: vec![], step: 1e-9 }.generate(),
            Err(TrackError::InvalidSpec(_))
        ));

        // Just inside the limit still generates
        let points = TrackSpec::Straight { start: [0.0, 0.0], end: [1.0, 0.0] }.generate().unwrap();
        assert_eq!(points.len(), 2);
        let points = TrackSpec::MooseTest {
            length: 999_999.0,
            centre_y: 0.0,
            lane_change_amplitude: 120.0,
            recovery_amplitude: 80.0,
            step: 1.0
        }.generate().unwrap();
        assert_eq!(points.len(), MAX_TRACK_SAMPLES);
    }
}
