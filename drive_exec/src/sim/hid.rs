//! Gamepad driven by telecommands

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::{
    eqpt::hid::{Axis, Button, InputDevice},
    tc::Tc,
};
use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    rc::Rc,
};
use util::maths::clamp;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An input device whose state is set by applying [`Tc`]s.
///
/// Clones share the same state, so one clone can be handed to the control core while another is
/// fed from a script.
#[derive(Clone, Default)]
pub struct ScriptedHid {
    state: Rc<RefCell<HidState>>,
}

#[derive(Default)]
struct HidState {
    axes: HashMap<Axis, f64>,
    pressed: HashSet<Button>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptedHid {
    /// A gamepad with all axes centred and no buttons pressed.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&self, tc: &Tc) {
        let mut state = self.state.borrow_mut();

        match *tc {
            Tc::None => (),
            Tc::Axis { axis, value } => {
                state.axes.insert(axis, clamp(value, -1.0, 1.0));
            }
            Tc::Press { button } => {
                state.pressed.insert(button);
            }
            Tc::Release { button } => {
                state.pressed.remove(&button);
            }
        }
    }
}

impl InputDevice for ScriptedHid {
    fn axis(&self, axis: Axis) -> f64 {
        self.state.borrow().axes.get(&axis).copied().unwrap_or(0.0)
    }

    fn button(&self, button: Button) -> bool {
        self.state.borrow().pressed.contains(&button)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply() {
        let hid = ScriptedHid::new();
        let reader = hid.clone();

        assert_eq!(reader.axis(Axis::LeftY), 0.0);
        assert!(!reader.button(Button::A));

        hid.apply(&Tc::Axis {
            axis: Axis::LeftY,
            value: -0.75,
        });
        hid.apply(&Tc::Press { button: Button::A });
        hid.apply(&Tc::None);

        assert_eq!(reader.axis(Axis::LeftY), -0.75);
        assert_eq!(reader.axis(Axis::RightX), 0.0);
        assert!(reader.button(Button::A));

        hid.apply(&Tc::Release { button: Button::A });
        assert!(!reader.button(Button::A));
    }
}
