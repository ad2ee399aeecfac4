//! # Input Device Interface
//!
//! Level reads of a gamepad. Edge detection (press transitions) is done by the triggers in the
//! control core, which poll [`InputDevice::button`] once per cycle.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

pub trait InputDevice {
    /// Position of an axis, between -1.0 and 1.0.
    fn axis(&self, axis: Axis) -> f64;

    /// `true` while the button is held down.
    fn button(&self, button: Button) -> bool;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Analog axes of the gamepad.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum Axis {
    LeftX,
    LeftY,
    RightX,
    RightY,
}

/// Digital buttons of the gamepad.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum Button {
    A,
    B,
    X,
    Y,
    BumperLeft,
    BumperRight,
    Back,
    Start,
}
