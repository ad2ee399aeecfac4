//! # Simulated equipment
//!
//! Stand-ins for the motor controller bus, the heading sensor and the operator's gamepad, so the
//! control core can be run and tested without hardware. The robot model is a first order
//! differential drive: each side moves at the mean output of its controllers and the heading
//! changes at a rate proportional to the difference between the sides.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod hid;
mod robot;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use hid::ScriptedHid;
pub use robot::{SimGyro, SimMotors, SimRobot};
