//! # PID controller module
//!
//! This module provides the PID controller used to close loops in the control core. The
//! controller optionally treats its input as continuous: for a compass heading with a range of
//! `[-180, 180)` the error between a setpoint of 179 and a measurement of -179 is -2 (a short
//! turn back across the wrap), not 358.
//!
//! The controller is driven by the control cycle, so the time step is passed in on each call
//! rather than measured, which keeps the output a pure function of the inputs and the internal
//! state.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;

// Internal
pub use params::PidParams;
use util::maths::{clamp, wrapped_diff};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A PID controller
#[derive(Debug, Serialize, Clone)]
pub struct PidController {
    /// Proportional gain
    k_p: f64,

    /// Integral gain
    k_i: f64,

    /// Dervative gain
    k_d: f64,

    /// Width of the wrapping range, if the input is continuous
    continuous_width: Option<f64>,

    /// At-setpoint tolerance
    tolerance: f64,

    /// Bound on `|k_i * integral|`
    integral_limit: f64,

    /// Error from the most recent calculation, `None` until the first calculation after a reset
    prev_error: Option<f64>,

    /// The integral accumulation
    integral: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Configuration errors for a PID controller.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PidError {
    #[error("Gain {0} must be a finite, non-negative number, got {1}")]
    InvalidGain(&'static str, f64),

    #[error("Continuous input range must satisfy min < max, got [{0}, {1})")]
    InvalidContinuousRange(f64, f64),

    #[error("Tolerance must be a finite, positive number, got {0}")]
    InvalidTolerance(f64),

    #[error("Integral limit must be positive, got {0}")]
    InvalidIntegralLimit(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidController {
    /// Create a new controller from the given parameters.
    pub fn new(params: &PidParams) -> Result<Self, PidError> {
        params.validate()?;

        Ok(Self {
            k_p: params.k_p,
            k_i: params.k_i,
            k_d: params.k_d,
            continuous_width: params.continuous_input.map(|[min, max]| max - min),
            tolerance: params.tolerance,
            integral_limit: params.integral_limit,
            prev_error: None,
            integral: 0.0,
        })
    }

    /// Signed error between the setpoint and the measurement.
    ///
    /// With continuous input this is the shortest signed distance around the range, in
    /// `[-width/2, width/2)`.
    pub fn error(&self, setpoint: f64, measurement: f64) -> f64 {
        match self.continuous_width {
            Some(width) => wrapped_diff(setpoint, measurement, width),
            None => setpoint - measurement,
        }
    }

    /// Get the controller output for the given measurement and setpoint, `dt_s` seconds after
    /// the previous calculation.
    pub fn calculate(&mut self, measurement: f64, setpoint: f64, dt_s: f64) -> f64 {
        let error = self.error(setpoint, measurement);

        // Without a positive time step neither the integral nor the derivative can be formed, so
        // both are left alone for this calculation.
        let valid_dt = dt_s.is_finite() && dt_s > 0.0;

        // Integral only accumulates while the integral gain is enabled, and is bounded so that
        // its contribution never exceeds the integral limit.
        if valid_dt && self.k_i > 0.0 {
            let bound = self.integral_limit / self.k_i;
            self.integral = clamp(self.integral + error * dt_s, -bound, bound);
        }

        let deriv = match (self.prev_error, valid_dt) {
            (Some(prev), true) => {
                let delta = match self.continuous_width {
                    Some(width) => wrapped_diff(error, prev, width),
                    None => error - prev,
                };
                delta / dt_s
            }
            _ => 0.0,
        };

        let out = self.k_p * error + self.k_i * self.integral + self.k_d * deriv;

        trace!(
            "PID error: {:.3}, integral: {:.3}, deriv: {:.3}, output: {:.3}",
            error,
            self.integral,
            deriv,
            out
        );

        self.prev_error = Some(error);

        out
    }

    /// `true` if the error from the last calculation is within tolerance (inclusive).
    ///
    /// Always `false` before the first calculation after a reset.
    pub fn at_setpoint(&self) -> bool {
        match self.prev_error {
            Some(e) => e.abs() <= self.tolerance,
            None => false,
        }
    }

    /// Error from the last calculation.
    pub fn last_error(&self) -> Option<f64> {
        self.prev_error
    }

    /// Clear the integral accumulation and the previous error.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = None;
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
