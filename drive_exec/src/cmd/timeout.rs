//! Timeout decorator

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::info;

// Internal
use super::{CmdError, Command, TickCtx};
use crate::scheduler::ResourceId;
use util::time::cycles_in;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Wraps a command so that it finishes after a fixed time at the latest.
///
/// The timeout is converted into a whole number of ticks when the command initialises, so a
/// command started on tick `n` with a 5 s timeout at a 20 ms period finishes on tick `n + 250` at
/// the latest. Timing out is a normal finish, not an interruption.
pub struct Timeout<C> {
    inner: C,
    timeout_s: f64,
    budget_cycles: u64,
    start_cycle: u64,
    timed_out: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<C: Command> Timeout<C> {
    pub fn new(inner: C, timeout_s: f64) -> Result<Self, CmdError> {
        if !timeout_s.is_finite() || timeout_s <= 0.0 {
            return Err(CmdError::InvalidTimeout(timeout_s));
        }

        Ok(Self {
            inner,
            timeout_s,
            budget_cycles: 0,
            start_cycle: 0,
            timed_out: false,
        })
    }

    /// `true` if the last run ended because the timeout elapsed.
    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    pub fn timeout_s(&self) -> f64 {
        self.timeout_s
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C: Command> Command for Timeout<C> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn requirements(&self) -> &[ResourceId] {
        self.inner.requirements()
    }

    fn initialise(&mut self, ctx: &TickCtx) -> Result<(), CmdError> {
        self.budget_cycles = cycles_in(self.timeout_s, ctx.period_s);
        self.start_cycle = ctx.cycle;
        self.timed_out = false;

        self.inner.initialise(ctx)
    }

    fn execute(&mut self, ctx: &TickCtx) -> Result<(), CmdError> {
        self.inner.execute(ctx)
    }

    fn is_finished(&mut self, ctx: &TickCtx) -> bool {
        if self.inner.is_finished(ctx) {
            return true;
        }

        if ctx.cycle.saturating_sub(self.start_cycle) >= self.budget_cycles {
            info!(
                "{} did not complete within {:.2} s, stopping",
                self.inner.name(),
                self.timeout_s
            );
            self.timed_out = true;
            return true;
        }

        false
    }

    fn end(&mut self, interrupted: bool) {
        self.inner.end(interrupted)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
