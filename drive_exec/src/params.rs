//! # Drive Executable Parameters
//!
//! This module provides parameters for the drive executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecParams {
    /// Period of the control cycle in seconds
    pub cycle_period_s: f64,

    /// Minimum log level, as understood by `util::logger::level_from_str`
    pub log_level: String,

    /// Angle the bumper bindings turn the robot by, in degrees
    pub turn_angle_deg: f64,

    /// Time allowed for a bumper turn, in seconds
    pub turn_timeout_s: f64,

    /// Turn rate of the simulated robot at full rotation demand, in degrees per second
    pub sim_max_turn_rate_degs: f64,

    /// Encoder counts per second of the simulated controllers at full output
    pub sim_counts_per_s: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ExecParamsError {
    #[error("Parameter {0} must be a finite, positive number, got {1}")]
    NotPositive(&'static str, f64),

    #[error("Turn angle must be finite, got {0}")]
    InvalidTurnAngle(f64),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ExecParams {
    pub fn validate(&self) -> Result<(), ExecParamsError> {
        let positive = [
            ("cycle_period_s", self.cycle_period_s),
            ("turn_timeout_s", self.turn_timeout_s),
            ("sim_max_turn_rate_degs", self.sim_max_turn_rate_degs),
            ("sim_counts_per_s", self.sim_counts_per_s),
        ];

        for &(name, value) in positive.iter() {
            if !value.is_finite() || value <= 0.0 {
                return Err(ExecParamsError::NotPositive(name, value));
            }
        }

        if !self.turn_angle_deg.is_finite() {
            return Err(ExecParamsError::InvalidTurnAngle(self.turn_angle_deg));
        }

        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
