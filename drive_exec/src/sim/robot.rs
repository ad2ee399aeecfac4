//! Simulated differential drive robot

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

// Internal
use crate::drivetrain::{DrivetrainParams, Side};
use comms_if::eqpt::{
    imu::HeadingSensor,
    mot::{FeedbackDevice, MotError, MotId, MotorDriver, NeutralMode, MAX_DUTY_CYCLE},
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Time constant of the speed decay of an unpowered side in coast mode.
const COAST_TIME_CONSTANT_S: f64 = 0.25;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Simulated robot. Hands out equipment drivers that all act on the same model.
#[derive(Clone)]
pub struct SimRobot {
    state: Rc<RefCell<SimState>>,
}

/// Motor controller bus of a [`SimRobot`].
pub struct SimMotors {
    state: Rc<RefCell<SimState>>,
}

/// Heading sensor of a [`SimRobot`].
pub struct SimGyro {
    state: Rc<RefCell<SimState>>,
}

struct SimState {
    motors: BTreeMap<MotId, SimMot>,

    left_ids: Vec<MotId>,

    right_ids: Vec<MotId>,

    /// Side whose controllers are mounted mirrored, positive output drives it backwards.
    mirrored_side: Side,

    /// Speed of each side as a fraction of full speed, positive forwards.
    left_speed: f64,
    right_speed: f64,

    heading_deg: f64,

    /// Turn rate when the sides run at full speed in opposite directions.
    max_turn_rate_degs: f64,

    /// Encoder counts per second at full output.
    counts_per_s: f64,
}

#[derive(Default)]
struct SimMot {
    demand: f64,
    inverted: bool,
    neutral_mode: NeutralMode,
    master: Option<MotId>,
    feedback: FeedbackDevice,
    position: f64,
    direct_commands: usize,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimRobot {
    /// Create a new robot with the given controllers on each side, at rest with zero heading.
    pub fn new(
        left_ids: &[MotId],
        right_ids: &[MotId],
        mirrored_side: Side,
        max_turn_rate_degs: f64,
        counts_per_s: f64,
    ) -> Self {
        let motors = left_ids
            .iter()
            .chain(right_ids.iter())
            .map(|&id| (id, SimMot::default()))
            .collect();

        Self {
            state: Rc::new(RefCell::new(SimState {
                motors,
                left_ids: left_ids.to_vec(),
                right_ids: right_ids.to_vec(),
                mirrored_side,
                left_speed: 0.0,
                right_speed: 0.0,
                heading_deg: 0.0,
                max_turn_rate_degs,
                counts_per_s,
            })),
        }
    }

    /// Create a robot matching the drivetrain's motor map.
    pub fn from_drivetrain_params(
        params: &DrivetrainParams,
        max_turn_rate_degs: f64,
        counts_per_s: f64,
    ) -> Self {
        Self::new(
            &[params.left_master_id, params.left_follower_id],
            &[params.right_master_id, params.right_follower_id],
            params.hardware_inverted_side,
            max_turn_rate_degs,
            counts_per_s,
        )
    }

    pub fn motor_driver(&self) -> SimMotors {
        SimMotors {
            state: self.state.clone(),
        }
    }

    pub fn gyro(&self) -> SimGyro {
        SimGyro {
            state: self.state.clone(),
        }
    }

    /// Advance the model by `dt_s` seconds.
    pub fn step(&self, dt_s: f64) {
        self.state.borrow_mut().step(dt_s);
    }

    pub fn heading_deg(&self) -> f64 {
        self.state.borrow().heading_deg
    }

    pub fn set_heading(&self, heading_deg: f64) {
        self.state.borrow_mut().heading_deg = heading_deg;
    }

    /// Current (left, right) side speeds.
    pub fn side_speeds(&self) -> (f64, f64) {
        let s = self.state.borrow();
        (s.left_speed, s.right_speed)
    }

    // ---- CONTROLLER INSPECTION ----

    /// Last duty cycle commanded directly to the controller.
    pub fn demand(&self, id: MotId) -> Option<f64> {
        self.state.borrow().motors.get(&id).map(|m| m.demand)
    }

    /// Duty cycle actually applied by the controller, after following and inversion.
    pub fn output(&self, id: MotId) -> Option<f64> {
        self.state.borrow().output(id)
    }

    /// Number of times the controller has been commanded directly.
    pub fn num_direct_commands(&self, id: MotId) -> usize {
        self.state
            .borrow()
            .motors
            .get(&id)
            .map_or(0, |m| m.direct_commands)
    }

    pub fn neutral_mode(&self, id: MotId) -> Option<NeutralMode> {
        self.state.borrow().motors.get(&id).map(|m| m.neutral_mode)
    }

    pub fn feedback_device(&self, id: MotId) -> Option<FeedbackDevice> {
        self.state.borrow().motors.get(&id).map(|m| m.feedback)
    }

    pub fn is_inverted(&self, id: MotId) -> Option<bool> {
        self.state.borrow().motors.get(&id).map(|m| m.inverted)
    }

    /// Controller the given one is following, if any.
    pub fn master_of(&self, id: MotId) -> Option<MotId> {
        self.state.borrow().motors.get(&id).and_then(|m| m.master)
    }
}

impl SimState {
    fn motor(&mut self, id: MotId) -> Result<&mut SimMot, MotError> {
        self.motors.get_mut(&id).ok_or(MotError::UnknownMotor(id))
    }

    fn output(&self, id: MotId) -> Option<f64> {
        let mot = self.motors.get(&id)?;
        let demand = match mot.master {
            Some(master) => self.motors.get(&master)?.demand,
            None => mot.demand,
        };

        Some(if mot.inverted { -demand } else { demand })
    }

    /// Forward speed of one side commanded by its controllers.
    fn side_target(&self, ids: &[MotId], side: Side) -> f64 {
        if ids.is_empty() {
            return 0.0;
        }

        let mean =
            ids.iter().filter_map(|&id| self.output(id)).sum::<f64>() / ids.len() as f64;

        if side == self.mirrored_side {
            -mean
        } else {
            mean
        }
    }

    fn side_speed(&self, current: f64, target: f64, ids: &[MotId], dt_s: f64) -> f64 {
        let coasting = target == 0.0
            && ids
                .first()
                .and_then(|id| self.motors.get(id))
                .map_or(false, |m| m.neutral_mode == NeutralMode::Coast);

        if coasting {
            current * (-dt_s / COAST_TIME_CONSTANT_S).exp()
        } else {
            target
        }
    }

    fn step(&mut self, dt_s: f64) {
        if !(dt_s > 0.0) {
            return;
        }

        let left_target = self.side_target(&self.left_ids, Side::Left);
        let right_target = self.side_target(&self.right_ids, Side::Right);

        self.left_speed = self.side_speed(self.left_speed, left_target, &self.left_ids, dt_s);
        self.right_speed = self.side_speed(self.right_speed, right_target, &self.right_ids, dt_s);

        // Clockwise positive
        self.heading_deg +=
            0.5 * (self.left_speed - self.right_speed) * self.max_turn_rate_degs * dt_s;

        let outputs: Vec<(MotId, f64)> = self
            .motors
            .keys()
            .filter_map(|&id| self.output(id).map(|o| (id, o)))
            .collect();
        for (id, output) in outputs {
            if let Some(mot) = self.motors.get_mut(&id) {
                if mot.feedback != FeedbackDevice::None {
                    mot.position += output * self.counts_per_s * dt_s;
                }
            }
        }

        trace!(
            "Sim: speeds ({:.3}, {:.3}), heading {:.2} deg",
            self.left_speed,
            self.right_speed,
            self.heading_deg
        );
    }
}

impl MotorDriver for SimMotors {
    fn config_factory_default(&mut self, id: MotId) -> Result<(), MotError> {
        let mut state = self.state.borrow_mut();
        let mot = state.motor(id)?;
        let direct_commands = mot.direct_commands;

        *mot = SimMot {
            direct_commands,
            ..SimMot::default()
        };

        Ok(())
    }

    fn set_neutral_mode(&mut self, id: MotId, mode: NeutralMode) -> Result<(), MotError> {
        self.state.borrow_mut().motor(id)?.neutral_mode = mode;
        Ok(())
    }

    fn set_inverted(&mut self, id: MotId, inverted: bool) -> Result<(), MotError> {
        self.state.borrow_mut().motor(id)?.inverted = inverted;
        Ok(())
    }

    fn follow(&mut self, follower: MotId, master: MotId) -> Result<(), MotError> {
        if follower == master {
            return Err(MotError::SelfFollow(follower));
        }

        let mut state = self.state.borrow_mut();
        state.motor(master)?;
        let mot = state.motor(follower)?;
        mot.master = Some(master);
        mot.demand = 0.0;

        Ok(())
    }

    fn select_feedback_sensor(
        &mut self,
        id: MotId,
        device: FeedbackDevice,
    ) -> Result<(), MotError> {
        let mut state = self.state.borrow_mut();
        let mot = state.motor(id)?;
        mot.feedback = device;
        mot.position = 0.0;
        Ok(())
    }

    fn set_duty_cycle(&mut self, id: MotId, duty_cycle: f64) -> Result<(), MotError> {
        if !duty_cycle.is_finite() || duty_cycle.abs() > MAX_DUTY_CYCLE {
            return Err(MotError::InvalidDutyCycle(duty_cycle));
        }

        let mut state = self.state.borrow_mut();
        let mot = state.motor(id)?;

        if let Some(master) = mot.master {
            return Err(MotError::FollowerCommanded(id, master));
        }

        mot.demand = duty_cycle;
        mot.direct_commands += 1;

        Ok(())
    }

    fn sensor_position(&mut self, id: MotId) -> Result<i64, MotError> {
        let mut state = self.state.borrow_mut();
        let mot = state.motor(id)?;

        match mot.feedback {
            FeedbackDevice::None => Err(MotError::Bus(format!(
                "Controller {} has no feedback sensor selected",
                id
            ))),
            _ => Ok(mot.position.round() as i64),
        }
    }
}

impl HeadingSensor for SimGyro {
    fn heading_deg(&mut self) -> f64 {
        self.state.borrow().heading_deg
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
