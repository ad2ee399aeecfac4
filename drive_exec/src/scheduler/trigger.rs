//! Triggers, sources of command start events

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::hid::{Button, InputDevice};
use std::rc::Rc;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// An event source polled once per tick by the scheduler.
pub trait Trigger {
    /// Returns `true` on the ticks where the bound command should be started.
    fn poll(&mut self) -> bool;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Fires once each time a button goes from released to pressed.
pub struct ButtonTrigger {
    hid: Rc<dyn InputDevice>,
    button: Button,
    last: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ButtonTrigger {
    /// Create a trigger on `button`.
    ///
    /// The current button state is sampled immediately, so a button already held when the
    /// trigger is created has to be released and pressed again before it fires.
    pub fn new(hid: Rc<dyn InputDevice>, button: Button) -> Self {
        let last = hid.button(button);
        Self { hid, button, last }
    }
}

impl Trigger for ButtonTrigger {
    fn poll(&mut self) -> bool {
        let pressed = self.hid.button(self.button);
        let rising = pressed && !self.last;
        self.last = pressed;
        rising
    }
}

impl<F> Trigger for F
where
    F: FnMut() -> bool,
{
    fn poll(&mut self) -> bool {
        self()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
