//! # Simulator library.
//!
//! Core of the moose test line following simulator. This library allows other
//! crates (and front ends) to drive the simulation one tick at a time.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// PID controller - turns the sensor error into a steering correction
pub mod pid;

/// Vehicle pose and frame transforms
pub mod pose;

/// Sensor model - samples the line sensors and reduces them to an error
pub mod sensor;

/// Track - the centreline the vehicles follow
pub mod track;

/// Vehicle - sensing, control and kinematics of a single vehicle
pub mod vehicle;

/// Simulation - the track and all vehicles, advanced one tick at a time
pub mod sim;
