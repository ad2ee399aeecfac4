//! Command running a closure every tick

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::{CmdError, Command, TickCtx};
use crate::scheduler::ResourceId;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Runs an action once per tick and never finishes on its own.
///
/// This is the usual shape of a default command, for example driving from live operator input.
pub struct RunCommand<F> {
    name: String,
    requirements: Vec<ResourceId>,
    action: F,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<F> RunCommand<F>
where
    F: FnMut(&TickCtx) -> Result<(), CmdError>,
{
    pub fn new(name: &str, requirements: &[ResourceId], action: F) -> Self {
        Self {
            name: String::from(name),
            requirements: requirements.to_vec(),
            action,
        }
    }
}

impl<F> Command for RunCommand<F>
where
    F: FnMut(&TickCtx) -> Result<(), CmdError>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn requirements(&self) -> &[ResourceId] {
        &self.requirements
    }

    fn execute(&mut self, ctx: &TickCtx) -> Result<(), CmdError> {
        (self.action)(ctx)
    }
}
