//! Parameters structure for the Drivetrain

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::mot::{FeedbackDevice, MotId, NeutralMode};
use serde::Deserialize;

use super::DrivetrainError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the Drivetrain.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DrivetrainParams {
    // ---- MOTOR MAP ----
    /// Controller commanded for the left side.
    pub left_master_id: MotId,

    /// Controller mirroring the left master.
    pub left_follower_id: MotId,

    /// Controller commanded for the right side.
    pub right_master_id: MotId,

    /// Controller mirroring the right master.
    pub right_follower_id: MotId,

    // ---- CONFIGURATION ----
    /// Side whose gearboxes are mounted mirrored, both of its controllers are set inverted.
    pub hardware_inverted_side: Side,

    /// Negate the right side demand before it is sent to the right master.
    #[serde(default)]
    pub right_side_inverted: bool,

    /// Neutral behaviour of every drive controller.
    pub neutral_mode: NeutralMode,

    /// Feedback sensor selected on every drive controller.
    pub feedback_device: FeedbackDevice,

    // ---- INPUT SHAPING ----
    /// Arcade inputs with a magnitude below this are treated as zero, the remaining range is
    /// rescaled to [0, 1].
    #[serde(default)]
    pub deadband: f64,

    /// Square the arcade inputs (keeping their sign) for finer control at low demands.
    #[serde(default)]
    pub square_inputs: bool,
}

/// A side of the drivetrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Side {
    Left,
    Right,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DrivetrainParams {
    /// Check the motor map has no repeated ids and the input shaping is sane.
    pub fn validate(&self) -> Result<(), DrivetrainError> {
        let ids = [
            self.left_master_id,
            self.left_follower_id,
            self.right_master_id,
            self.right_follower_id,
        ];

        for (i, id) in ids.iter().enumerate() {
            if ids[i + 1..].contains(id) {
                return Err(DrivetrainError::DuplicateMotId(*id));
            }
        }

        if !(0.0..1.0).contains(&self.deadband) {
            return Err(DrivetrainError::InvalidDeadband(self.deadband));
        }

        Ok(())
    }
}
