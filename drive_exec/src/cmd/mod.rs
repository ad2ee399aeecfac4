//! # Command module
//!
//! A command is a unit of behaviour that needs exclusive use of some resources (subsystems) while
//! it runs. Commands never run themselves, the [`Scheduler`](crate::scheduler::Scheduler) drives
//! their lifecycle:
//!
//! ```text
//! Idle -> initialise -> execute (once per tick) -> end(false)   when is_finished
//!                                              \-> end(true)    when interrupted
//! ```
//!
//! The variants provided here are built by composition: [`RunCommand`] wraps a closure,
//! [`PidCommand`] closes a loop over injected measurement, setpoint and output functions,
//! [`TurnToAngle`] is a [`PidCommand`] over the drivetrain heading and [`Timeout`] bounds the run
//! time of any other command.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod pid_cmd;
mod run_cmd;
mod timeout;
mod turn_to_angle;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use crate::{drivetrain::DrivetrainError, pid_ctrl::PidError, scheduler::ResourceId};

pub use pid_cmd::PidCommand;
pub use run_cmd::RunCommand;
pub use timeout::Timeout;
pub use turn_to_angle::TurnToAngle;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Timing information for the tick being processed, handed to every lifecycle call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickCtx {
    /// Number of the tick, starting at zero.
    pub cycle: u64,

    /// Period between ticks in seconds.
    pub period_s: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors raised by commands. The scheduler turns these into interruptions.
#[derive(Debug, thiserror::Error)]
pub enum CmdError {
    #[error("Drivetrain error: {0}")]
    Drivetrain(#[from] DrivetrainError),

    #[error("Controller configuration error: {0}")]
    Pid(#[from] PidError),

    #[error("Timeout must be a finite, positive number of seconds, got {0}")]
    InvalidTimeout(f64),

    #[error("{0}")]
    Failed(String),
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A schedulable unit of behaviour.
pub trait Command {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Resources this command needs exclusive use of while running.
    fn requirements(&self) -> &[ResourceId];

    /// Called once each time the command is (re)started, before the first execute.
    fn initialise(&mut self, _ctx: &TickCtx) -> Result<(), CmdError> {
        Ok(())
    }

    /// Called once per tick while the command is running.
    fn execute(&mut self, ctx: &TickCtx) -> Result<(), CmdError>;

    /// Completion predicate, checked at the start of every tick before execute.
    ///
    /// Commands that return `false` forever only stop when interrupted.
    fn is_finished(&mut self, _ctx: &TickCtx) -> bool {
        false
    }

    /// Called exactly once when the command stops, `interrupted` is `false` if it finished on
    /// its own.
    fn end(&mut self, _interrupted: bool) {}
}

/// Decorators available on every command.
pub trait CommandExt: Command + Sized {
    /// Bound the run time of this command. The command finishes when either its own completion
    /// predicate holds or `timeout_s` has elapsed since it was initialised.
    fn with_timeout(self, timeout_s: f64) -> Result<Timeout<Self>, CmdError> {
        Timeout::new(self, timeout_s)
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TickCtx {
    /// Time of this tick in seconds since the scheduler started.
    pub fn now_s(&self) -> f64 {
        self.cycle as f64 * self.period_s
    }
}

impl<C: Command> CommandExt for C {}

impl Command for Box<dyn Command> {
    fn name(&self) -> &str {
        self.as_ref().name()
    }

    fn requirements(&self) -> &[ResourceId] {
        self.as_ref().requirements()
    }

    fn initialise(&mut self, ctx: &TickCtx) -> Result<(), CmdError> {
        self.as_mut().initialise(ctx)
    }

    fn execute(&mut self, ctx: &TickCtx) -> Result<(), CmdError> {
        self.as_mut().execute(ctx)
    }

    fn is_finished(&mut self, ctx: &TickCtx) -> bool {
        self.as_mut().is_finished(ctx)
    }

    fn end(&mut self, interrupted: bool) {
        self.as_mut().end(interrupted)
    }
}
