//! PID controller parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use super::PidError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for a PID controller
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct PidParams {
    /// Proportional gain
    pub k_p: f64,

    /// Integral gain
    pub k_i: f64,

    /// Derivative gain
    pub k_d: f64,

    /// Wrapping range `[min, max)` of the input, if the input is continuous (like a compass
    /// heading). `None` for an ordinary linear input.
    #[serde(default)]
    pub continuous_input: Option<[f64; 2]>,

    /// Largest error magnitude that still counts as being at the setpoint (inclusive).
    pub tolerance: f64,

    /// Bound on the magnitude of the integral term's contribution to the output, `|k_i * ∫e|`.
    #[serde(default = "default_integral_limit")]
    pub integral_limit: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidParams {
    /// Check the parameters describe a usable controller.
    pub fn validate(&self) -> Result<(), PidError> {
        for &(name, gain) in [("k_p", self.k_p), ("k_i", self.k_i), ("k_d", self.k_d)].iter() {
            if !gain.is_finite() || gain < 0.0 {
                return Err(PidError::InvalidGain(name, gain));
            }
        }

        if let Some([min, max]) = self.continuous_input {
            if !min.is_finite() || !max.is_finite() || min >= max {
                return Err(PidError::InvalidContinuousRange(min, max));
            }
        }

        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(PidError::InvalidTolerance(self.tolerance));
        }

        if self.integral_limit.is_nan() || self.integral_limit <= 0.0 {
            return Err(PidError::InvalidIntegralLimit(self.integral_limit));
        }

        Ok(())
    }
}

fn default_integral_limit() -> f64 {
    1.0
}
