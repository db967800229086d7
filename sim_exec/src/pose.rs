//! # Pose
//!
//! Planar pose of a vehicle.
//!
//! Headings are in radians, zero along the +X axis and increasing
//! counter-clockwise (towards +Y). The vehicle's local frame has X pointing
//! forward and Y pointing to the vehicle's left.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Rotation2, Vector2};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The position and heading of a vehicle in the track frame.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Pose {
    /// Position in the track frame
    pub position: Vector2<f64>,

    /// Heading angle in radians
    pub heading_rad: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose {
    pub fn new(x: f64, y: f64, heading_rad: f64) -> Self {
        Self {
            position: Vector2::new(x, y),
            heading_rad
        }
    }

    /// Unit vector pointing in the direction of travel.
    pub fn forward(&self) -> Vector2<f64> {
        Vector2::new(self.heading_rad.cos(), self.heading_rad.sin())
    }

    /// Transform a point from the vehicle's local frame into the track frame.
    pub fn to_world(&self, local: &Vector2<f64>) -> Vector2<f64> {
        self.position + Rotation2::new(self.heading_rad) * local
    }
}
