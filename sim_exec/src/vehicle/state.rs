//! Implementations for the vehicle state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::collections::VecDeque;
use log::{debug, trace, warn};
use nalgebra::Vector2;
use serde::Serialize;

// Internal
use super::{VehicleError, VehicleParams};
use crate::{
    pid::{PidController, push_bounded},
    pose::Pose,
    sensor::{ErrorEstimate, SensorArray, SensorSample, NUM_SENSORS},
    track::Track
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A simulated line following vehicle.
#[derive(Debug, Clone)]
pub struct Vehicle {
    params: VehicleParams,

    /// Tick period
    dt_s: f64,

    start_pose: Pose,
    pose: Pose,

    sensors: SensorArray,
    pid: PidController,

    /// Sample taken on the last tick
    sample: SensorSample,

    /// Error estimate from the last tick
    estimate: ErrorEstimate,

    /// Controller output from the last tick
    correction: f64,

    /// Recent positions, oldest first
    trajectory: VecDeque<Vector2<f64>>,

    report: StatusReport
}

/// Status report for a single vehicle tick.
#[derive(Clone, Copy, Default, Serialize, Debug, PartialEq)]
pub struct StatusReport {
    /// True if the sensors could not see the line
    pub line_lost: bool,

    /// Number of sensors which were outside the track bounds
    pub num_out_of_bounds: usize,

    /// True if the heading increment was limited by the maximum turn rate
    pub turn_limited: bool
}

/// One row of vehicle telemetry.
///
/// Kept flat so that it can be written directly as a CSV record.
#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct VehicleTelemetry {
    pub name: String,
    pub tick: u64,
    pub sim_time_s: f64,
    pub x: f64,
    pub y: f64,
    pub heading_rad: f64,
    pub error: f64,
    pub correction: f64,
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub integral: f64,
    pub reading_0: f64,
    pub reading_1: f64,
    pub reading_2: f64,
    pub reading_3: f64,
    pub reading_4: f64,
    pub line_lost: bool,
    pub num_out_of_bounds: usize,
    pub turn_limited: bool
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Vehicle {
    /// Create a new vehicle at its start pose.
    ///
    /// `dt_s` is the fixed tick period used by every call to `update`.
    pub fn new(params: VehicleParams, dt_s: f64) -> Result<Self, VehicleError> {
        if !(dt_s.is_finite() && dt_s > 0.0) {
            return Err(VehicleError::InvalidTickPeriod(dt_s))
        }
        if !params.speed.is_finite() {
            return Err(VehicleError::InvalidSpeed(params.speed))
        }
        if !params.steering_scale.is_finite() {
            return Err(VehicleError::InvalidSteeringScale(params.steering_scale))
        }
        if let Some(r) = params.max_turn_rate_rads {
            if !(r.is_finite() && r > 0.0) {
                return Err(VehicleError::InvalidMaxTurnRate(r))
            }
        }
        if params.trajectory_capacity == 0 {
            return Err(VehicleError::ZeroCapacity("trajectory"))
        }

        let start_pose = Pose::new(
            params.start_position[0], 
            params.start_position[1], 
            params.start_heading_rad
        );
        if !(start_pose.position.iter().all(|v| v.is_finite()) 
            && start_pose.heading_rad.is_finite()) 
        {
            return Err(VehicleError::InvalidStartPose)
        }

        let sensors = SensorArray::new(params.sensors.clone())?;
        let pid = PidController::new(&params.pid)?;

        Ok(Self {
            sample: blank_sample(&sensors, &start_pose),
            estimate: blank_estimate(),
            correction: 0.0,
            trajectory: VecDeque::with_capacity(params.trajectory_capacity),
            report: StatusReport::default(),
            dt_s,
            start_pose,
            pose: start_pose,
            sensors,
            pid,
            params
        })
    }

    /// Advance the vehicle by one tick along the given track.
    pub fn update(&mut self, track: &Track) -> Result<StatusReport, VehicleError> {
        // Sensor positions come from the current pose, so sample before
        // moving
        let sample = self.sensors.sample(&self.pose, track);
        let estimate = self.sensors.reduce(&sample.readings);

        // Nothing has been modified yet, so an error here leaves the vehicle
        // as it was
        let correction = self.pid.compute(estimate.error, self.dt_s)?;

        if estimate.line_lost && !self.estimate.line_lost {
            warn!(
                "{}: line lost at ({:.2}, {:.2}), holding heading", 
                self.params.name, self.pose.position[0], self.pose.position[1]
            );
        }
        else if !estimate.line_lost && self.estimate.line_lost {
            debug!("{}: line reacquired", self.params.name);
        }

        if sample.num_out_of_bounds() > self.sample.num_out_of_bounds() {
            debug!(
                "{}: {} sensor(s) outside the track bounds", 
                self.params.name, sample.num_out_of_bounds()
            );
        }

        self.sample = sample;
        self.estimate = estimate;
        self.correction = correction;

        let turn_limited = self.step(correction, self.dt_s);

        self.report = StatusReport {
            line_lost: estimate.line_lost,
            num_out_of_bounds: sample.num_out_of_bounds(),
            turn_limited
        };

        trace!(
            "{}: error {:.4}, correction {:.4}, pose ({:.2}, {:.2}, {:.4})",
            self.params.name,
            estimate.error,
            correction,
            self.pose.position[0],
            self.pose.position[1],
            self.pose.heading_rad
        );

        Ok(self.report)
    }

    /// Integrate a correction into the pose over `dt_s` seconds.
    ///
    /// The heading is updated first and the new heading is used to advance
    /// the position. Returns `true` if the heading increment was limited by
    /// the maximum turn rate.
    pub fn step(&mut self, correction: f64, dt_s: f64) -> bool {
        let mut increment = correction * self.params.steering_scale * dt_s;
        let mut limited = false;

        if let Some(rate) = self.params.max_turn_rate_rads {
            let max_inc = rate * dt_s.abs();
            if increment.abs() > max_inc {
                increment = max_inc.copysign(increment);
                limited = true;
            }
        }

        self.pose.heading_rad += increment;

        let dist = self.params.speed * dt_s;
        self.pose.position += self.pose.forward() * dist;

        push_bounded(
            &mut self.trajectory, 
            self.pose.position, 
            self.params.trajectory_capacity
        );

        limited
    }

    /// Return the vehicle to its start pose.
    ///
    /// The trajectory, the last error and the controller state are cleared,
    /// the gains are kept.
    pub fn reset(&mut self) {
        self.pose = self.start_pose;
        self.trajectory.clear();
        self.pid.reset();
        self.sample = blank_sample(&self.sensors, &self.pose);
        self.estimate = blank_estimate();
        self.correction = 0.0;
        self.report = StatusReport::default();

        debug!("{}: reset to start pose", self.params.name);
    }

    /// Build a telemetry record of the vehicle's current state.
    pub fn telemetry(&self, tick: u64, sim_time_s: f64) -> VehicleTelemetry {
        let r = &self.sample.readings;

        VehicleTelemetry {
            name: self.params.name.clone(),
            tick,
            sim_time_s,
            x: self.pose.position[0],
            y: self.pose.position[1],
            heading_rad: self.pose.heading_rad,
            error: self.estimate.error,
            correction: self.correction,
            kp: self.pid.kp,
            ki: self.pid.ki,
            kd: self.pid.kd,
            integral: self.pid.integral(),
            reading_0: r[0],
            reading_1: r[1],
            reading_2: r[2],
            reading_3: r[3],
            reading_4: r[4],
            line_lost: self.report.line_lost,
            num_out_of_bounds: self.report.num_out_of_bounds,
            turn_limited: self.report.turn_limited
        }
    }

    pub fn name(&self) -> &str {
        &self.params.name
    }

    pub fn params(&self) -> &VehicleParams {
        &self.params
    }

    pub fn tick_period_s(&self) -> f64 {
        self.dt_s
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn position(&self) -> Vector2<f64> {
        self.pose.position
    }

    /// Heading in radians
    pub fn heading(&self) -> f64 {
        self.pose.heading_rad
    }

    /// Error computed on the last tick
    pub fn current_error(&self) -> f64 {
        self.estimate.error
    }

    /// Correction computed on the last tick
    pub fn current_correction(&self) -> f64 {
        self.correction
    }

    /// Sensor positions at the current pose.
    pub fn sensor_positions(&self) -> [Vector2<f64>; NUM_SENSORS] {
        self.sensors.world_positions(&self.pose)
    }

    /// Readings taken on the last tick
    pub fn sensor_readings(&self) -> [f64; NUM_SENSORS] {
        self.sample.readings
    }

    pub fn trajectory(&self) -> &VecDeque<Vector2<f64>> {
        &self.trajectory
    }

    pub fn status_report(&self) -> StatusReport {
        self.report
    }

    pub fn pid(&self) -> &PidController {
        &self.pid
    }

    pub fn pid_mut(&mut self) -> &mut PidController {
        &mut self.pid
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn blank_sample(sensors: &SensorArray, pose: &Pose) -> SensorSample {
    SensorSample {
        positions: sensors.world_positions(pose),
        readings: [0.0; NUM_SENSORS],
        out_of_bounds: [false; NUM_SENSORS]
    }
}

fn blank_estimate() -> ErrorEstimate {
    ErrorEstimate {
        error: 0.0,
        activation: 0.0,
        line_lost: false
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        pid::{PidError, PidParams}, 
        sensor::{SensorParams, LINE_LOST_ERROR},
        track::Bounds
    };

    fn params(kp: f64, ki: f64, kd: f64) -> VehicleParams {
        VehicleParams {
            name: String::from("test"),
            start_position: [0.0, 0.0],
            start_heading_rad: 0.0,
            speed: 2.0,
            steering_scale: 0.05,
            max_turn_rate_rads: None,
            trajectory_capacity: 1000,
            pid: PidParams::with_gains(kp, ki, kd),
            sensors: SensorParams::row(10.0, 8.0, 3.0, 12.0)
        }
    }

    fn straight(x0: f64, x1: f64) -> Track {
        Track::new(vec![Vector2::new(x0, 0.0), Vector2::new(x1, 0.0)], None).unwrap()
    }

    #[test]
    fn test_straight_track() {
        let mut p = params(2.0, 0.05, 0.2);
        // Wide line so that every sensor is fully on it
        p.sensors = SensorParams::row(10.0, 8.0, 20.0, 12.0);

        let mut v = Vehicle::new(p, 1.0).unwrap();
        let track = straight(0.0, 1000.0);

        for _ in 0..100 {
            let report = v.update(&track).unwrap();
            assert!(!report.line_lost);
            assert_eq!(v.current_error(), 0.0);
            assert_eq!(v.current_correction(), 0.0);
        }

        assert_eq!(v.position(), Vector2::new(200.0, 0.0));
        assert_eq!(v.heading(), 0.0);
        assert_eq!(v.pid().integral(), 0.0);
        assert_eq!(v.trajectory().len(), 100);
        assert_eq!(v.sensor_readings(), [1024.0; NUM_SENSORS]);
    }

    #[test]
    fn test_converges_from_lateral_offset() {
        let mut p = params(0.5, 0.0, 0.0);
        p.start_position = [0.0, -10.0];

        let mut v = Vehicle::new(p, 1.0).unwrap();
        let track = straight(-100.0, 2000.0);

        let mut last = v.position()[1].abs();
        for _ in 0..20 {
            v.update(&track).unwrap();
            let dev = v.position()[1].abs();
            assert!(dev < last, "deviation grew from {} to {}", last, dev);
            last = dev;
        }

        assert!(last < 2.0);
        assert!(v.heading() > 0.0);
    }

    #[test]
    fn test_line_lost_holds_heading() {
        let mut p = params(2.0, 0.05, 0.2);
        p.start_position = [0.0, 500.0];

        let mut v = Vehicle::new(p, 1.0).unwrap();
        let track = straight(0.0, 1000.0);

        for _ in 0..10 {
            let report = v.update(&track).unwrap();
            assert!(report.line_lost);
            assert_eq!(v.current_error(), LINE_LOST_ERROR);
        }

        assert_eq!(v.heading(), 0.0);
        assert_eq!(v.position(), Vector2::new(20.0, 500.0));
    }

    #[test]
    fn test_step() {
        let mut p = params(1.0, 0.0, 0.0);
        p.steering_scale = 1.0;
        p.speed = 10.0;
        let mut v = Vehicle::new(p, 0.1).unwrap();

        let limited = v.step(std::f64::consts::FRAC_PI_2 * 10.0, 0.1);
        assert!(!limited);
        assert!((v.heading() - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert!((v.position() - Vector2::new(0.0, 1.0)).norm() < 1e-12);
        assert_eq!(v.trajectory().len(), 1);
    }

    #[test]
    fn test_turn_rate_limit() {
        let mut p = params(1.0, 0.0, 0.0);
        p.steering_scale = 1.0;
        p.max_turn_rate_rads = Some(2.0);
        let mut v = Vehicle::new(p, 0.5).unwrap();

        assert!(v.step(100.0, 0.5));
        assert_eq!(v.heading(), 1.0);

        assert!(v.step(-100.0, 0.5));
        assert_eq!(v.heading(), 0.0);

        assert!(!v.step(1.0, 0.5));
        assert_eq!(v.heading(), 0.5);
    }

    #[test]
    fn test_trajectory_bounded() {
        let mut p = params(1.0, 0.0, 0.0);
        p.trajectory_capacity = 5;
        let mut v = Vehicle::new(p, 1.0).unwrap();

        for _ in 0..8 {
            v.step(0.0, 1.0);
        }

        assert_eq!(v.trajectory().len(), 5);
        assert_eq!(v.trajectory()[0], Vector2::new(8.0, 0.0));
        assert_eq!(v.trajectory()[4], Vector2::new(16.0, 0.0));
    }

    #[test]
    fn test_reset() {
        let mut p = params(0.5, 0.1, 0.1);
        p.start_position = [0.0, -10.0];
        p.start_heading_rad = 0.1;

        let mut v = Vehicle::new(p, 1.0).unwrap();
        let track = straight(-100.0, 2000.0);

        for _ in 0..15 {
            v.update(&track).unwrap();
        }
        v.pid_mut().kp = 0.7;
        v.reset();

        assert_eq!(v.pose(), Pose::new(0.0, -10.0, 0.1));
        assert!(v.trajectory().is_empty());
        assert_eq!(v.current_error(), 0.0);
        assert_eq!(v.current_correction(), 0.0);
        assert_eq!(v.pid().integral(), 0.0);
        assert_eq!(v.pid().previous_error(), 0.0);
        assert!(v.pid().error_history().is_empty());
        assert_eq!(v.pid().kp, 0.7);
    }

    #[test]
    fn test_invalid_params() {
        assert_eq!(
            Vehicle::new(params(1.0, 0.0, 0.0), 0.0).unwrap_err(), 
            VehicleError::InvalidTickPeriod(0.0)
        );

        let mut p = params(1.0, 0.0, 0.0);
        p.trajectory_capacity = 0;
        assert_eq!(
            Vehicle::new(p, 1.0).unwrap_err(), 
            VehicleError::ZeroCapacity("trajectory")
        );

        let mut p = params(1.0, 0.0, 0.0);
        p.sensors.falloff = -1.0;
        assert!(matches!(
            Vehicle::new(p, 1.0).unwrap_err(), 
            VehicleError::SensorError(_)
        ));
    }

    #[test]
    fn test_invalid_pid_params() {
        // A non-finite limit would disable the integral clamp
        let mut p = params(0.5, 1.0, 0.0);
        p.pid.integral_limit = f64::NAN;
        assert!(matches!(
            Vehicle::new(p, 1.0).unwrap_err(), 
            VehicleError::PidError(PidError::InvalidIntegralLimit(_))
        ));

        let mut p = params(0.5, 1.0, 0.0);
        p.pid.integral_limit = f64::INFINITY;
        assert_eq!(
            Vehicle::new(p, 1.0).unwrap_err(), 
            VehicleError::PidError(PidError::InvalidIntegralLimit(f64::INFINITY))
        );

        let mut p = params(0.5, 1.0, 0.0);
        p.pid.kp = f64::NAN;
        assert!(matches!(
            Vehicle::new(p, 1.0).unwrap_err(), 
            VehicleError::PidError(PidError::NonFiniteGain(_))
        ));

        let mut p = params(0.5, 1.0, 0.0);
        p.pid.history_capacity = 0;
        assert_eq!(
            Vehicle::new(p, 1.0).unwrap_err(), 
            VehicleError::PidError(PidError::ZeroHistoryCapacity)
        );
    }

    #[test]
    fn test_integral_stays_clamped() {
        let mut p = params(0.5, 1.0, 0.0);
        p.start_position = [0.0, -10.0];
        let mut v = Vehicle::new(p, 1.0).unwrap();
        let track = straight(-100.0, 2000.0);

        for _ in 0..50 {
            v.update(&track).unwrap();
            assert!(v.pid().integral().abs() <= 10.0);
        }
    }

    #[test]
    fn test_sensor_positions_follow_pose() {
        let mut p = params(0.5, 0.0, 0.0);
        p.start_position = [0.0, -10.0];
        let sensors = SensorArray::new(p.sensors.clone()).unwrap();
        let offsets = p.sensors.offsets;

        let mut v = Vehicle::new(p, 1.0).unwrap();
        let track = straight(-100.0, 2000.0);

        for _ in 0..10 {
            let before = v.sensor_positions();
            v.update(&track).unwrap();

            let pose = v.pose();
            let positions = v.sensor_positions();
            assert_eq!(positions, sensors.world_positions(&pose));
            assert_ne!(positions, before);

            // Rotated by the current heading and moved to the current position
            let (sin, cos) = pose.heading_rad.sin_cos();
            for (w, o) in positions.iter().zip(offsets.iter()) {
                let expected = Vector2::new(
                    pose.position[0] + o[0] * cos - o[1] * sin,
                    pose.position[1] + o[0] * sin + o[1] * cos
                );
                assert!((w - expected).norm() < 1e-9);
            }
        }
    }

    #[test]
    fn test_out_of_bounds_reported() {
        let mut p = params(2.0, 0.05, 0.2);
        p.start_position = [50.0, 0.0];
        let mut v = Vehicle::new(p, 1.0).unwrap();

        // The outer sensors sit 16 either side of the line, beyond the bounds
        let track = Track::new(
            vec![Vector2::new(-100.0, 0.0), Vector2::new(1000.0, 0.0)],
            Some(Bounds { min: [-200.0, -12.0], max: [2000.0, 12.0] })
        ).unwrap();

        for _ in 0..5 {
            let report = v.update(&track).unwrap();
            assert_eq!(report.num_out_of_bounds, 2);
            assert!(!report.line_lost);
            assert_eq!(v.sensor_readings()[0], 1024.0);
            assert_eq!(v.sensor_readings()[4], 1024.0);
            assert!(v.current_error().abs() < 1e-12);
        }

        assert_eq!(v.telemetry(5, 5.0).num_out_of_bounds, 2);
        assert!((v.position() - Vector2::new(60.0, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn test_telemetry() {
        let mut v = Vehicle::new(params(0.5, 0.0, 0.0), 1.0).unwrap();
        let track = straight(-100.0, 2000.0);
        v.update(&track).unwrap();

        let t = v.telemetry(1, 1.0);
        assert_eq!(t.name, "test");
        assert_eq!(t.x, v.position()[0]);
        assert_eq!(t.reading_2, 1024.0);
        assert_eq!(t.kp, 0.5);
    }
}
