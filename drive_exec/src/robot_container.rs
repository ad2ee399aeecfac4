//! # Robot container
//!
//! Wires the drivetrain, the operator's gamepad and the commands into a scheduler:
//!
//! - The drivetrain's default command drives it in arcade mode, forward from the left stick's Y
//!   axis and rotation from the right stick's X axis.
//! - Pressing the left bumper turns the robot anticlockwise by the configured angle, the right
//!   bumper clockwise. Both turns are relative to the heading when the button is pressed and are
//!   abandoned if they haven't converged within the configured timeout.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::info;
use std::rc::Rc;

// Internal
use crate::{
    cmd::{CmdError, CommandExt, RunCommand, TurnToAngle},
    drivetrain::Drivetrain,
    params::ExecParams,
    pid_ctrl::PidParams,
    scheduler::{ButtonTrigger, CmdId, Resource, Scheduler, SchedulerError},
};
use comms_if::eqpt::hid::{Axis, Button, InputDevice};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Handles to everything wired into the scheduler.
pub struct RobotContainer {
    pub drivetrain: Resource<Drivetrain>,

    pub drive_cmd: CmdId,

    pub turn_left_cmd: CmdId,

    pub turn_right_cmd: CmdId,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("Could not build a command: {0}")]
    Cmd(#[from] CmdError),

    #[error("Could not add to the schedule: {0}")]
    Scheduler(#[from] SchedulerError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RobotContainer {
    pub fn new(
        scheduler: &mut Scheduler,
        drivetrain: Drivetrain,
        hid: Rc<dyn InputDevice>,
        turn_params: &PidParams,
        exec_params: &ExecParams,
    ) -> Result<Self, ContainerError> {
        let drivetrain = scheduler.register_subsystem(drivetrain);

        // ---- DEFAULT DRIVE ----

        let drive_dt = drivetrain.clone();
        let drive_hid = hid.clone();
        let drive_cmd = scheduler.add_command(RunCommand::new(
            "ArcadeDrive",
            &[drivetrain.id()],
            move |_| {
                drive_dt
                    .borrow_mut()
                    .arcade_drive(drive_hid.axis(Axis::LeftY), drive_hid.axis(Axis::RightX))?;
                Ok(())
            },
        ))?;
        scheduler.set_default_command(drivetrain.id(), drive_cmd)?;

        // ---- BUMPER TURNS ----

        let turn_left_cmd = scheduler.add_command(
            TurnToAngle::relative(-exec_params.turn_angle_deg, &drivetrain, turn_params)?
                .with_timeout(exec_params.turn_timeout_s)?,
        )?;
        scheduler.on_trigger(
            ButtonTrigger::new(hid.clone(), Button::BumperLeft),
            turn_left_cmd,
        )?;

        let turn_right_cmd = scheduler.add_command(
            TurnToAngle::relative(exec_params.turn_angle_deg, &drivetrain, turn_params)?
                .with_timeout(exec_params.turn_timeout_s)?,
        )?;
        scheduler.on_trigger(ButtonTrigger::new(hid, Button::BumperRight), turn_right_cmd)?;

        info!(
            "Bindings: default {}, left bumper {}, right bumper {}",
            scheduler.command_name(drive_cmd).unwrap_or("?"),
            scheduler.command_name(turn_left_cmd).unwrap_or("?"),
            scheduler.command_name(turn_right_cmd).unwrap_or("?"),
        );

        Ok(Self {
            drivetrain,
            drive_cmd,
            turn_left_cmd,
            turn_right_cmd,
        })
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        drivetrain::{DrivetrainParams, SideOutputs},
        scheduler::EndReason,
        sim::{ScriptedHid, SimRobot},
    };
    use comms_if::tc::Tc;

    struct Rig {
        sched: Scheduler,
        container: RobotContainer,
        sim: SimRobot,
        hid: ScriptedHid,
    }

    fn rig(mut turn_params: PidParams) -> Rig {
        let exec_params: ExecParams =
            util::params::from_str(include_str!("../../params/drive_exec.toml")).unwrap();
        let dt_params: DrivetrainParams =
            util::params::from_str(include_str!("../../params/drivetrain.toml")).unwrap();
        turn_params.continuous_input = Some([-180.0, 180.0]);

        let sim = SimRobot::from_drivetrain_params(
            &dt_params,
            exec_params.sim_max_turn_rate_degs,
            exec_params.sim_counts_per_s,
        );
        let dt = Drivetrain::new(
            Box::new(sim.motor_driver()),
            Box::new(sim.gyro()),
            dt_params,
        )
        .unwrap();

        let hid = ScriptedHid::new();
        let mut sched = Scheduler::new(exec_params.cycle_period_s).unwrap();
        let container = RobotContainer::new(
            &mut sched,
            dt,
            Rc::new(hid.clone()),
            &turn_params,
            &exec_params,
        )
        .unwrap();

        Rig {
            sched,
            container,
            sim,
            hid,
        }
    }

    fn shipped_pid() -> PidParams {
        util::params::from_str(include_str!("../../params/turn_pid.toml")).unwrap()
    }

    fn tick(rig: &mut Rig) {
        rig.sched.run();
        rig.sim.step(rig.sched.period_s());
    }

    fn press(rig: &mut Rig, button: Button) {
        rig.hid.apply(&Tc::Press { button });
        tick(rig);
        rig.hid.apply(&Tc::Release { button });
    }

    #[test]
    fn test_default_drive() {
        let mut rig = rig(shipped_pid());
        let dt_id = rig.container.drivetrain.id();

        tick(&mut rig);
        assert_eq!(rig.sched.owner(dt_id), Some(rig.container.drive_cmd));

        rig.hid.apply(&Tc::Axis {
            axis: Axis::LeftY,
            value: 0.5,
        });
        rig.hid.apply(&Tc::Axis {
            axis: Axis::RightX,
            value: 0.25,
        });
        tick(&mut rig);

        assert_eq!(
            rig.container.drivetrain.borrow().last_output(),
            SideOutputs {
                left: 0.75,
                right: 0.25
            }
        );
    }

    #[test]
    fn test_right_bumper_turns_clockwise() {
        let mut rig = rig(shipped_pid());
        rig.sim.set_heading(10.0);

        tick(&mut rig);
        press(&mut rig, Button::BumperRight);
        assert!(rig.sched.is_running(rig.container.turn_right_cmd));
        assert_eq!(
            rig.sched.last_end(rig.container.drive_cmd),
            Some(EndReason::Interrupted)
        );

        let mut ticks = 0;
        while rig.sched.is_running(rig.container.turn_right_cmd) && ticks < 300 {
            tick(&mut rig);
            ticks += 1;
        }

        assert_eq!(
            rig.sched.last_end(rig.container.turn_right_cmd),
            Some(EndReason::Finished)
        );
        assert!((rig.sim.heading_deg() - 100.0).abs() < 3.0);

        // Drive resumes
        tick(&mut rig);
        assert!(rig.sched.is_running(rig.container.drive_cmd));
    }

    #[test]
    fn test_left_bumper_interrupts_right() {
        let mut rig = rig(shipped_pid());

        tick(&mut rig);
        press(&mut rig, Button::BumperRight);
        tick(&mut rig);
        press(&mut rig, Button::BumperLeft);

        assert_eq!(
            rig.sched.last_end(rig.container.turn_right_cmd),
            Some(EndReason::Interrupted)
        );
        assert!(rig.sched.is_running(rig.container.turn_left_cmd));
        assert!(rig.container.drivetrain.borrow().last_output().left < 0.0);
    }

    #[test]
    fn test_turn_times_out() {
        // No gains, the turn can never converge
        let mut pid = shipped_pid();
        pid.k_p = 0.0;
        pid.k_d = 0.0;
        pid.k_i = 0.0;
        let mut rig = rig(pid);

        tick(&mut rig);
        press(&mut rig, Button::BumperLeft);

        for _ in 0..249 {
            tick(&mut rig);
        }
        assert!(rig.sched.is_running(rig.container.turn_left_cmd));

        tick(&mut rig);
        assert!(!rig.sched.is_running(rig.container.turn_left_cmd));
        assert_eq!(
            rig.sched.last_end(rig.container.turn_left_cmd),
            Some(EndReason::Finished)
        );
        assert!(rig.sched.is_running(rig.container.drive_cmd));
    }
}
