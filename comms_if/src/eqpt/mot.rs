//! # Motor Controller Interface

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Largest duty cycle magnitude accepted by [`MotorDriver::set_duty_cycle`].
pub const MAX_DUTY_CYCLE: f64 = 1.0;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Unified API over a bus of smart motor controllers.
///
/// Every operation addresses one controller by its [`MotId`]. Configuration operations
/// (everything except [`MotorDriver::set_duty_cycle`] and [`MotorDriver::sensor_position`]) are
/// expected to be called once at start-up.
pub trait MotorDriver {
    /// Reset the controller to its factory configuration.
    fn config_factory_default(&mut self, id: MotId) -> Result<(), MotError>;

    /// Set what the controller does when commanded to zero output.
    fn set_neutral_mode(&mut self, id: MotId, mode: NeutralMode) -> Result<(), MotError>;

    /// Invert the direction of the controller's output.
    fn set_inverted(&mut self, id: MotId, inverted: bool) -> Result<(), MotError>;

    /// Bind `follower` so that it mirrors the last output commanded to `master`.
    ///
    /// After this call `follower` must not be commanded directly.
    fn follow(&mut self, follower: MotId, master: MotId) -> Result<(), MotError>;

    /// Select which feedback sensor the controller reads for closed-loop and telemetry.
    fn select_feedback_sensor(&mut self, id: MotId, device: FeedbackDevice)
        -> Result<(), MotError>;

    /// Command a duty cycle.
    ///
    /// ## Arguments
    /// - `id` - The controller to command
    /// - `duty_cycle` - The duty cycle to set. Must be a value between -1.0 and 1.0. Values
    ///   outside this range will be rejected.
    fn set_duty_cycle(&mut self, id: MotId, duty_cycle: f64) -> Result<(), MotError>;

    /// Read the position of the selected feedback sensor, in raw sensor counts.
    fn sensor_position(&mut self, id: MotId) -> Result<i64, MotError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Identifier of a motor controller on the bus.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Copy, Clone)]
pub struct MotId(pub u8);

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Behaviour of a controller when commanded to zero output.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Copy, Clone)]
pub enum NeutralMode {
    /// Short the motor windings so the robot holds position.
    Brake,
    /// Let the motor spin freely.
    Coast,
}

/// Feedback sensors a controller can read.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Copy, Clone)]
pub enum FeedbackDevice {
    None,
    QuadEncoder,
    Analog,
    PulseWidth,
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum MotError {
    #[error("No motor controller with id {0} on the bus")]
    UnknownMotor(MotId),

    #[error("Duty cycle must be between -1.0 and 1.0, got {0}")]
    InvalidDutyCycle(f64),

    #[error("Motor controller {0} is following {1} and cannot be commanded directly")]
    FollowerCommanded(MotId, MotId),

    #[error("Motor controller {0} cannot follow itself")]
    SelfFollow(MotId),

    #[error("Bus error: {0}")]
    Bus(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl fmt::Display for MotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl Default for NeutralMode {
    fn default() -> Self {
        NeutralMode::Coast
    }
}

impl Default for FeedbackDevice {
    fn default() -> Self {
        FeedbackDevice::None
    }
}
