//! Command closing a PID loop over injected functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{trace, warn};

// Internal
use super::{CmdError, Command, TickCtx};
use crate::{pid_ctrl::PidController, scheduler::ResourceId};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Closes a loop with a [`PidController`] every tick.
///
/// Each execute reads the measurement and the setpoint, calculates the controller output and
/// hands it to the output function. The controller is reset every time the command is
/// initialised, and the output function is given zero when the command ends, whatever the reason.
pub struct PidCommand {
    name: String,
    requirements: Vec<ResourceId>,
    controller: PidController,
    measurement: Box<dyn FnMut() -> f64>,
    setpoint: Box<dyn FnMut() -> f64>,
    output: Box<dyn FnMut(f64) -> Result<(), CmdError>>,
    on_initialise: Option<Box<dyn FnMut()>>,
    finish_at_setpoint: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidCommand {
    /// Create a new command. By default it has no requirements and never finishes on its own.
    pub fn new<M, S, O>(
        name: &str,
        controller: PidController,
        measurement: M,
        setpoint: S,
        output: O,
    ) -> Self
    where
        M: FnMut() -> f64 + 'static,
        S: FnMut() -> f64 + 'static,
        O: FnMut(f64) -> Result<(), CmdError> + 'static,
    {
        Self {
            name: String::from(name),
            requirements: Vec::new(),
            controller,
            measurement: Box::new(measurement),
            setpoint: Box::new(setpoint),
            output: Box::new(output),
            on_initialise: None,
            finish_at_setpoint: false,
        }
    }

    /// Add a resource requirement.
    pub fn requiring(mut self, resource: ResourceId) -> Self {
        if !self.requirements.contains(&resource) {
            self.requirements.push(resource);
        }
        self
    }

    /// Run `f` on every (re)start, after the controller has been reset.
    pub fn on_initialise<F>(mut self, f: F) -> Self
    where
        F: FnMut() + 'static,
    {
        self.on_initialise = Some(Box::new(f));
        self
    }

    /// Finish once the controller reports it is at the setpoint.
    pub fn finish_at_setpoint(mut self, finish: bool) -> Self {
        self.finish_at_setpoint = finish;
        self
    }

    /// The controller driven by this command.
    pub fn controller(&self) -> &PidController {
        &self.controller
    }
}

impl Command for PidCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &[ResourceId] {
        &self.requirements
    }

    fn initialise(&mut self, _ctx: &TickCtx) -> Result<(), CmdError> {
        self.controller.reset();

        if let Some(ref mut f) = self.on_initialise {
            f();
        }

        Ok(())
    }

    fn execute(&mut self, ctx: &TickCtx) -> Result<(), CmdError> {
        let measurement = (self.measurement)();
        let setpoint = (self.setpoint)();

        let output = self.controller.calculate(measurement, setpoint, ctx.period_s);

        trace!(
            "{}: setpoint {:.3}, measurement {:.3}, output {:.3}",
            self.name,
            setpoint,
            measurement,
            output
        );

        (self.output)(output)
    }

    fn is_finished(&mut self, _ctx: &TickCtx) -> bool {
        self.finish_at_setpoint && self.controller.at_setpoint()
    }

    fn end(&mut self, _interrupted: bool) {
        if let Err(e) = (self.output)(0.0) {
            warn!("{}: could not zero the output: {}", self.name, e);
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
