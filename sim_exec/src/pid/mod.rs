//! # PID controller module
//!
//! This module provides the PID controller used to turn the weighted sensor
//! error of a vehicle into a steering correction.
//!
//! The controller works in explicit time: every call to
//! [`PidController::compute`] takes the time step `dt` in seconds. The
//! integral term is clamped to a symmetric limit to bound windup under a
//! persistent one-sided error.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

pub use params::PidParams;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::collections::VecDeque;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A PID controller
#[derive(Debug, Serialize, Clone)]
pub struct PidController {
    /// Proportional gain
    pub kp: f64,

    /// Integral gain
    pub ki: f64,

    /// Derivative gain
    pub kd: f64,

    /// Symmetric limit on the integral accumulation
    integral_limit: f64,

    /// The integral accumulation
    integral: f64,

    /// Error passed into the most recent call to `compute`
    previous_error: f64,

    /// Maximum length of the histories
    history_capacity: usize,

    /// Recent errors, oldest first
    error_history: VecDeque<f64>,

    /// Recent outputs, oldest first
    output_history: VecDeque<f64>
}

/// The three gains of a controller.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Selects one of the controller gains.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Gain {
    Kp,
    Ki,
    Kd
}

/// Errors which can occur while computing the controller output.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PidError {
    /// The time step must be finite and strictly positive, otherwise the
    /// derivative term is undefined.
    #[error("Invalid time step: {0} s (must be finite and strictly positive)")]
    InvalidTimeStep(f64),

    #[error("Invalid integral limit: {0} (must be finite and strictly positive)")]
    InvalidIntegralLimit(f64),

    #[error("Gains must be finite, found {0:?}")]
    NonFiniteGain(PidGains),

    #[error("The history capacity must be non-zero")]
    ZeroHistoryCapacity
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidController {

    /// Create a new controller from the given parameters.
    pub fn new(params: &PidParams) -> Result<Self, PidError> {
        let gains = PidGains {
            kp: params.kp,
            ki: params.ki,
            kd: params.kd
        };
        if !(gains.kp.is_finite() && gains.ki.is_finite() && gains.kd.is_finite()) {
            return Err(PidError::NonFiniteGain(gains))
        }
        if !(params.integral_limit.is_finite() && params.integral_limit > 0.0) {
            return Err(PidError::InvalidIntegralLimit(params.integral_limit))
        }
        if params.history_capacity == 0 {
            return Err(PidError::ZeroHistoryCapacity)
        }

        Ok(Self {
            kp: params.kp,
            ki: params.ki,
            kd: params.kd,
            integral_limit: params.integral_limit,
            integral: 0.0,
            previous_error: 0.0,
            history_capacity: params.history_capacity,
            error_history: VecDeque::with_capacity(params.history_capacity),
            output_history: VecDeque::with_capacity(params.history_capacity)
        })
    }

    /// Get the value of the controller for the given error and time step.
    ///
    /// On error the controller state is left untouched.
    pub fn compute(&mut self, error: f64, dt: f64) -> Result<f64, PidError> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(PidError::InvalidTimeStep(dt))
        }

        // Accumulate and clamp the integral
        self.integral = (self.integral + error * dt)
            .max(-self.integral_limit)
            .min(self.integral_limit);

        let derivative = (error - self.previous_error) / dt;

        let output = 
            self.kp * error 
            + self.ki * self.integral 
            + self.kd * derivative;

        self.previous_error = error;

        push_bounded(&mut self.error_history, error, self.history_capacity);
        push_bounded(&mut self.output_history, output, self.history_capacity);

        Ok(output)
    }

    /// Clear the accumulated state of the controller.
    ///
    /// The gains are not modified.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.previous_error = 0.0;
        self.error_history.clear();
        self.output_history.clear();
    }

    /// Add `delta` to one of the gains. Gains are floored at zero.
    pub fn adjust_gain(&mut self, gain: Gain, delta: f64) {
        let g = match gain {
            Gain::Kp => &mut self.kp,
            Gain::Ki => &mut self.ki,
            Gain::Kd => &mut self.kd
        };

        *g = (*g + delta).max(0.0);
    }

    /// Replace all three gains.
    pub fn set_gains(&mut self, gains: PidGains) {
        self.kp = gains.kp;
        self.ki = gains.ki;
        self.kd = gains.kd;
    }

    pub fn gains(&self) -> PidGains {
        PidGains {
            kp: self.kp,
            ki: self.ki,
            kd: self.kd
        }
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn integral_limit(&self) -> f64 {
        self.integral_limit
    }

    pub fn previous_error(&self) -> f64 {
        self.previous_error
    }

    /// Recent errors, oldest first.
    pub fn error_history(&self) -> &VecDeque<f64> {
        &self.error_history
    }

    /// Recent outputs, oldest first.
    pub fn output_history(&self) -> &VecDeque<f64> {
        &self.output_history
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Push onto the back of the buffer, evicting from the front beyond `capacity`.
pub(crate) fn push_bounded<T>(buf: &mut VecDeque<T>, value: T, capacity: usize) {
    buf.push_back(value);
    while buf.len() > capacity {
        buf.pop_front();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_identity_gain() {
        let mut pid = PidController::new(&PidParams::with_gains(1.0, 0.0, 0.0)).unwrap();

        for e in [0.0, 1.5, -2.0, 0.25, 1e6, -3.75].iter() {
            assert_eq!(pid.compute(*e, 1.0 / 60.0).unwrap(), *e);
            assert_eq!(pid.previous_error(), *e);
        }
    }

    #[test]
    fn test_anti_windup() {
        let mut pid = PidController::new(&PidParams::with_gains(0.0, 1.0, 0.0)).unwrap();
        assert_eq!(pid.integral_limit(), 10.0);

        // Positive error grows the integral by 0.5 per call until the limit
        let mut last = pid.integral();
        for i in 0..40 {
            let out = pid.compute(1.0, 0.5).unwrap();
            assert!(pid.integral() >= last);
            assert!(pid.integral() <= 10.0);
            if i >= 19 {
                assert_eq!(pid.integral(), 10.0);
                assert_eq!(out, 10.0);
            }
            last = pid.integral();
        }

        // Negative error drives it all the way down to the other limit
        for _ in 0..80 {
            pid.compute(-2.0, 0.5).unwrap();
            assert!(pid.integral() <= last);
            last = pid.integral();
        }
        assert_eq!(pid.integral(), -10.0);
    }

    #[test]
    fn test_derivative() {
        let mut pid = PidController::new(&PidParams::with_gains(0.0, 0.0, 2.0)).unwrap();

        // First call differentiates against a zero previous error
        assert_eq!(pid.compute(1.0, 0.5).unwrap(), 4.0);
        assert_eq!(pid.compute(1.0, 0.5).unwrap(), 0.0);
        assert_eq!(pid.compute(0.0, 0.5).unwrap(), -4.0);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let params = PidParams::with_gains(0.8, 0.3, 0.2);
        let mut used = PidController::new(&params).unwrap();

        for e in [0.5, -1.0, 2.0, 1.0].iter() {
            used.compute(*e, 0.1).unwrap();
        }
        used.reset();
        used.reset();

        assert_eq!(used.integral(), 0.0);
        assert_eq!(used.previous_error(), 0.0);
        assert!(used.error_history().is_empty());
        assert!(used.output_history().is_empty());
        assert_eq!(used.gains(), PidGains { kp: 0.8, ki: 0.3, kd: 0.2 });

        let mut fresh = PidController::new(&params).unwrap();
        assert_eq!(used.compute(0.7, 0.1), fresh.compute(0.7, 0.1));
    }

    #[test]
    fn test_invalid_time_step() {
        let mut pid = PidController::new(&PidParams::with_gains(1.0, 1.0, 1.0)).unwrap();
        pid.compute(1.0, 1.0).unwrap();

        assert_eq!(pid.compute(1.0, 0.0), Err(PidError::InvalidTimeStep(0.0)));
        assert_eq!(pid.compute(1.0, -0.1), Err(PidError::InvalidTimeStep(-0.1)));
        assert!(pid.compute(1.0, f64::NAN).is_err());
        assert!(pid.compute(1.0, f64::INFINITY).is_err());

        // Rejected calls don't touch the state
        assert_eq!(pid.integral(), 1.0);
        assert_eq!(pid.error_history().len(), 1);
    }

    #[test]
    fn test_history_eviction() {
        let mut params = PidParams::with_gains(2.0, 0.0, 0.0);
        params.history_capacity = 3;
        let mut pid = PidController::new(&params).unwrap();

        for e in 1..=5 {
            pid.compute(e as f64, 1.0).unwrap();
        }

        assert_eq!(pid.error_history().iter().copied().collect::<Vec<_>>(), vec![3.0, 4.0, 5.0]);
        assert_eq!(pid.output_history().iter().copied().collect::<Vec<_>>(), vec![6.0, 8.0, 10.0]);
    }

    #[test]
    fn test_invalid_params() {
        let mut params = PidParams::with_gains(1.0, 1.0, 0.0);

        params.integral_limit = f64::NAN;
        assert!(matches!(
            PidController::new(&params), 
            Err(PidError::InvalidIntegralLimit(l)) if l.is_nan()
        ));

        params.integral_limit = f64::INFINITY;
        assert_eq!(
            PidController::new(&params).unwrap_err(), 
            PidError::InvalidIntegralLimit(f64::INFINITY)
        );

        params.integral_limit = -5.0;
        assert_eq!(
            PidController::new(&params).unwrap_err(), 
            PidError::InvalidIntegralLimit(-5.0)
        );

        params.integral_limit = 10.0;
        params.kd = f64::INFINITY;
        assert!(matches!(PidController::new(&params), Err(PidError::NonFiniteGain(_))));

        params.kd = 0.0;
        params.history_capacity = 0;
        assert_eq!(PidController::new(&params).unwrap_err(), PidError::ZeroHistoryCapacity);
    }

    #[test]
    fn test_gain_adjust() {
        let mut pid = PidController::new(&PidParams::with_gains(0.1, 0.01, 0.05)).unwrap();

        pid.adjust_gain(Gain::Kp, 0.1);
        pid.adjust_gain(Gain::Ki, -0.05);
        pid.adjust_gain(Gain::Kd, -0.01);

        assert!((pid.kp - 0.2).abs() < 1e-12);
        assert_eq!(pid.ki, 0.0);
        assert!((pid.kd - 0.04).abs() < 1e-12);

        // Gains are plain fields and can be written directly
        pid.kp = 3.0;
        assert_eq!(pid.gains().kp, 3.0);
    }
}
