//! Turn the drivetrain on the spot to a heading

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use std::{cell::Cell, rc::Rc};

// Internal
use super::{CmdError, Command, PidCommand, TickCtx};
use crate::{
    drivetrain::Drivetrain,
    pid_ctrl::{PidController, PidParams},
    scheduler::{Resource, ResourceId},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Rotates the drivetrain with zero forward demand until its heading is within tolerance of a
/// target.
///
/// The heading is fed to a continuous-input [`PidController`] whose output is used as the arcade
/// rotation demand. The command finishes when the controller is at its setpoint, so combine it
/// with [`with_timeout`](super::CommandExt::with_timeout) to bound turns that never converge.
pub struct TurnToAngle {
    inner: PidCommand,
    target_deg: Rc<Cell<f64>>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TurnToAngle {
    /// Turn to a fixed heading.
    pub fn absolute(
        target_deg: f64,
        drivetrain: &Resource<Drivetrain>,
        params: &PidParams,
    ) -> Result<Self, CmdError> {
        Self::build(
            &format!("TurnToAngle({:.1})", target_deg),
            Rc::new(Cell::new(target_deg)),
            None,
            drivetrain,
            params,
        )
    }

    /// Turn by `delta_deg` from whatever the heading is when the command starts.
    pub fn relative(
        delta_deg: f64,
        drivetrain: &Resource<Drivetrain>,
        params: &PidParams,
    ) -> Result<Self, CmdError> {
        Self::build(
            &format!("TurnBy({:+.1})", delta_deg),
            Rc::new(Cell::new(0.0)),
            Some(delta_deg),
            drivetrain,
            params,
        )
    }

    /// The heading currently being turned to.
    pub fn target_deg(&self) -> f64 {
        self.target_deg.get()
    }

    /// The heading controller.
    pub fn controller(&self) -> &PidController {
        self.inner.controller()
    }

    fn build(
        name: &str,
        target_deg: Rc<Cell<f64>>,
        delta_deg: Option<f64>,
        drivetrain: &Resource<Drivetrain>,
        params: &PidParams,
    ) -> Result<Self, CmdError> {
        let controller = PidController::new(params)?;

        let meas_dt = drivetrain.clone();
        let out_dt = drivetrain.clone();
        let sp_target = target_deg.clone();

        let mut inner = PidCommand::new(
            name,
            controller,
            move || meas_dt.borrow_mut().heading_deg(),
            move || sp_target.get(),
            move |rotation| {
                out_dt.borrow_mut().arcade_drive(0.0, rotation)?;
                Ok(())
            },
        )
        .requiring(drivetrain.id())
        .finish_at_setpoint(true);

        if let Some(delta) = delta_deg {
            let init_dt = drivetrain.clone();
            let init_target = target_deg.clone();
            let init_name = String::from(name);

            inner = inner.on_initialise(move || {
                let heading = init_dt.borrow_mut().heading_deg();
                init_target.set(heading + delta);
                debug!(
                    "{}: turning from {:.1} to {:.1} deg",
                    init_name,
                    heading,
                    heading + delta
                );
            });
        }

        Ok(Self { inner, target_deg })
    }
}

impl Command for TurnToAngle {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn requirements(&self) -> &[ResourceId] {
        self.inner.requirements()
    }

    fn initialise(&mut self, ctx: &TickCtx) -> Result<(), CmdError> {
        self.inner.initialise(ctx)
    }

    fn execute(&mut self, ctx: &TickCtx) -> Result<(), CmdError> {
        self.inner.execute(ctx)
    }

    fn is_finished(&mut self, ctx: &TickCtx) -> bool {
        self.inner.is_finished(ctx)
    }

    fn end(&mut self, interrupted: bool) {
        self.inner.end(interrupted)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{scheduler::Scheduler, sim::SimRobot};

    fn setup() -> (Scheduler, Resource<Drivetrain>, SimRobot, PidParams) {
        let dt_params =
            util::params::from_str(include_str!("../../../params/drivetrain.toml")).unwrap();
        let pid_params: PidParams =
            util::params::from_str(include_str!("../../../params/turn_pid.toml")).unwrap();

        let sim = SimRobot::from_drivetrain_params(&dt_params, 360.0, 4096.0);
        let dt = Drivetrain::new(
            Box::new(sim.motor_driver()),
            Box::new(sim.gyro()),
            dt_params,
        )
        .unwrap();

        let mut sched = Scheduler::new(0.02).unwrap();
        let res = sched.register_subsystem(dt);

        (sched, res, sim, pid_params)
    }

    fn ctx(cycle: u64) -> TickCtx {
        TickCtx {
            cycle,
            period_s: 0.02,
        }
    }

    #[test]
    fn test_turn_direction_and_stop() {
        let (_sched, dt, sim, params) = setup();
        sim.set_heading(0.0);

        let mut cmd = TurnToAngle::absolute(90.0, &dt, &params).unwrap();
        assert_eq!(cmd.requirements(), &[dt.id()]);

        cmd.initialise(&ctx(0)).unwrap();
        cmd.execute(&ctx(1)).unwrap();

        // Positive error turns clockwise: left side forward, right side back, no forward demand
        let out = dt.borrow().last_output();
        assert!(out.left > 0.0);
        assert!((out.left + out.right).abs() < 1e-9);

        cmd.end(true);
        assert_eq!(dt.borrow().last_output().left, 0.0);
        assert_eq!(dt.borrow().last_output().right, 0.0);
    }

    #[test]
    fn test_short_way_round() {
        let (_sched, dt, sim, params) = setup();
        sim.set_heading(-179.0);

        let mut cmd = TurnToAngle::absolute(90.0, &dt, &params).unwrap();
        cmd.initialise(&ctx(0)).unwrap();
        cmd.execute(&ctx(1)).unwrap();

        // 90 from -179 is 91 degrees anticlockwise
        assert!((cmd.controller().last_error().unwrap() + 91.0).abs() < 1e-9);
        assert!(dt.borrow().last_output().left < 0.0);
    }

    #[test]
    fn test_relative_target_latched_on_start() {
        let (_sched, dt, sim, params) = setup();
        let mut cmd = TurnToAngle::relative(-90.0, &dt, &params).unwrap();

        sim.set_heading(30.0);
        cmd.initialise(&ctx(0)).unwrap();
        assert_eq!(cmd.target_deg(), -60.0);

        // Moving doesn't change the target of a running turn
        sim.set_heading(10.0);
        cmd.execute(&ctx(1)).unwrap();
        assert_eq!(cmd.target_deg(), -60.0);

        sim.set_heading(400.0);
        cmd.initialise(&ctx(2)).unwrap();
        assert_eq!(cmd.target_deg(), 310.0);
    }

    #[test]
    fn test_converges_in_sim() {
        let (_sched, dt, sim, params) = setup();
        sim.set_heading(0.0);

        let mut cmd = TurnToAngle::absolute(90.0, &dt, &params).unwrap();
        cmd.initialise(&ctx(0)).unwrap();

        let mut finished_at = None;
        for cycle in 1..500 {
            if cmd.is_finished(&ctx(cycle)) {
                cmd.end(false);
                finished_at = Some(cycle);
                break;
            }
            cmd.execute(&ctx(cycle)).unwrap();
            sim.step(0.02);
        }

        assert!(finished_at.is_some());
        assert!((dt.borrow_mut().heading_deg() - 90.0).abs() <= params.tolerance + 1.0);
    }
}
