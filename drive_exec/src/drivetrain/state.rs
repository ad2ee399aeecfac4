//! Implementations for the Drivetrain state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace};
use serde::Serialize;

// Internal
use super::{DrivetrainError, DrivetrainParams, MotGroup, Side};
use crate::scheduler::Subsystem;
use comms_if::eqpt::{
    imu::HeadingSensor,
    mot::{MotError, MotId, MotorDriver},
};
use util::maths::clamp;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Differential drivetrain.
pub struct Drivetrain {
    params: DrivetrainParams,

    driver: Box<dyn MotorDriver>,

    imu: Box<dyn HeadingSensor>,

    last_output: SideOutputs,
}

/// Duty cycles sent to the master controller of each side.
#[derive(Clone, Copy, Default, Serialize, Debug, PartialEq)]
pub struct SideOutputs {
    pub left: f64,
    pub right: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Drivetrain {
    /// Create the drivetrain and perform the one-off configuration of its motor controllers.
    ///
    /// Every controller is reset to factory defaults and set to the configured neutral mode, the
    /// followers are bound to their side's master, the mirrored side is inverted and the feedback
    /// sensor is selected.
    pub fn new(
        driver: Box<dyn MotorDriver>,
        imu: Box<dyn HeadingSensor>,
        params: DrivetrainParams,
    ) -> Result<Self, DrivetrainError> {
        params.validate()?;

        let mut drivetrain = Self {
            params,
            driver,
            imu,
            last_output: SideOutputs::default(),
        };

        drivetrain.configure()?;

        Ok(drivetrain)
    }

    /// Mix a forward and a rotation demand into side demands and send them to the masters.
    ///
    /// Both demands are dimensionless in [-1, 1], positive rotation turns clockwise. The left side
    /// receives `forward + rotation` and the right `forward - rotation`, each clamped to [-1, 1].
    pub fn arcade_drive(
        &mut self,
        forward: f64,
        rotation: f64,
    ) -> Result<SideOutputs, DrivetrainError> {
        if !forward.is_finite() || !rotation.is_finite() {
            return Err(DrivetrainError::NonFiniteDemand(forward, rotation));
        }

        let forward = self.shape_input(forward);
        let rotation = self.shape_input(rotation);

        let mut output = arcade_mix(forward, rotation);

        if self.params.right_side_inverted {
            output.right = -output.right;
        }

        self.set_side_outputs(output)?;

        Ok(output)
    }

    /// Command both sides to zero.
    pub fn stop(&mut self) -> Result<(), DrivetrainError> {
        self.set_side_outputs(SideOutputs::default())
    }

    /// Current heading in degrees, straight from the heading sensor.
    pub fn heading_deg(&mut self) -> f64 {
        self.imu.heading_deg()
    }

    /// The side outputs most recently sent to the masters.
    pub fn last_output(&self) -> SideOutputs {
        self.last_output
    }

    /// Raw feedback sensor positions of the left and right masters.
    pub fn encoder_positions(&mut self) -> Result<(i64, i64), DrivetrainError> {
        let left_id = self.params.left_master_id;
        let right_id = self.params.right_master_id;

        let left = self
            .driver
            .sensor_position(left_id)
            .map_err(|e| DrivetrainError::Mot(left_id, e))?;
        let right = self
            .driver
            .sensor_position(right_id)
            .map_err(|e| DrivetrainError::Mot(right_id, e))?;

        Ok((left, right))
    }

    /// Ids of the controllers in a group.
    pub fn group(&self, group: MotGroup) -> Vec<MotId> {
        let p = &self.params;
        match group {
            MotGroup::All => vec![
                p.left_master_id,
                p.left_follower_id,
                p.right_master_id,
                p.right_follower_id,
            ],
            MotGroup::Left => vec![p.left_master_id, p.left_follower_id],
            MotGroup::Right => vec![p.right_master_id, p.right_follower_id],
            MotGroup::Masters => vec![p.left_master_id, p.right_master_id],
            MotGroup::Followers => vec![p.left_follower_id, p.right_follower_id],
        }
    }

    /// Apply an action to every controller in a group, stopping at the first failure.
    fn apply_to_group<F>(&mut self, group: MotGroup, mut action: F) -> Result<(), DrivetrainError>
    where
        F: FnMut(&mut dyn MotorDriver, MotId) -> Result<(), MotError>,
    {
        for id in self.group(group) {
            action(self.driver.as_mut(), id).map_err(|e| DrivetrainError::Mot(id, e))?;
        }

        Ok(())
    }

    fn configure(&mut self) -> Result<(), DrivetrainError> {
        let neutral_mode = self.params.neutral_mode;
        let feedback_device = self.params.feedback_device;

        self.apply_to_group(MotGroup::All, |d, id| {
            d.config_factory_default(id)?;
            d.set_neutral_mode(id, neutral_mode)
        })?;

        let pairs = [
            (self.params.left_follower_id, self.params.left_master_id),
            (self.params.right_follower_id, self.params.right_master_id),
        ];
        for &(follower, master) in pairs.iter() {
            self.driver
                .follow(follower, master)
                .map_err(|e| DrivetrainError::Mot(follower, e))?;
        }

        let inverted_group = match self.params.hardware_inverted_side {
            Side::Left => MotGroup::Left,
            Side::Right => MotGroup::Right,
        };
        self.apply_to_group(inverted_group, |d, id| d.set_inverted(id, true))?;

        self.apply_to_group(MotGroup::All, |d, id| {
            d.select_feedback_sensor(id, feedback_device)
        })?;

        debug!(
            "Drivetrain configured: {:?} side inverted, {:?} neutral mode, {:?} feedback",
            self.params.hardware_inverted_side, neutral_mode, feedback_device
        );

        Ok(())
    }

    fn set_side_outputs(&mut self, output: SideOutputs) -> Result<(), DrivetrainError> {
        let left_id = self.params.left_master_id;
        let right_id = self.params.right_master_id;

        self.driver
            .set_duty_cycle(left_id, output.left)
            .map_err(|e| DrivetrainError::Mot(left_id, e))?;
        self.driver
            .set_duty_cycle(right_id, output.right)
            .map_err(|e| DrivetrainError::Mot(right_id, e))?;

        self.last_output = output;

        trace!("Drivetrain output: {:?}", output);

        Ok(())
    }

    fn shape_input(&self, value: f64) -> f64 {
        let value = clamp(value, -1.0, 1.0);
        let db = self.params.deadband;

        let value = if value.abs() < db {
            0.0
        } else if db > 0.0 {
            (value - db * value.signum()) / (1.0 - db)
        } else {
            value
        };

        if self.params.square_inputs {
            value * value.abs()
        } else {
            value
        }
    }
}

impl Subsystem for Drivetrain {
    fn name(&self) -> &str {
        "Drivetrain"
    }

    fn periodic(&mut self) {
        // Called once per cycle, reserved for telemetry and safety checks
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Arcade mixing of a forward and a rotation demand into side demands.
pub fn arcade_mix(forward: f64, rotation: f64) -> SideOutputs {
    SideOutputs {
        left: clamp(forward + rotation, -1.0, 1.0),
        right: clamp(forward - rotation, -1.0, 1.0),
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
