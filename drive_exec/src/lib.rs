//! # Drive library.
//!
//! This library allows other crates in the workspace (and the benchmarks) to access items defined
//! inside the drive crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Commands - units of behaviour run by the scheduler
pub mod cmd;

/// Drivetrain - differential drive subsystem over the motor controller bus
pub mod drivetrain;

/// Executable parameters
pub mod params;

/// PID controller with continuous input support
pub mod pid_ctrl;

/// Robot container - binds the operator's inputs to commands
pub mod robot_container;

/// Scheduler - runs commands and arbitrates the subsystems they need
pub mod scheduler;

/// Simulated equipment
pub mod sim;
