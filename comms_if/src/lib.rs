//! # Communications interface crate.
//!
//! Provides the interfaces shared between the control core and the equipment it talks to: the
//! motor driver, the heading sensor and the operator's input device, plus the operator-input
//! telecommands that scripts deliver.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Operator-input telecommands
pub mod tc;

/// Equipment interfaces (motors, IMU, input device)
pub mod eqpt;
