//! Differential drivetrain module
//!
//! Owns the four drive motor controllers (a master and a follower per side) and the heading
//! sensor. The controllers are configured once when the drivetrain is built, after which only the
//! masters are ever commanded, through [`Drivetrain::arcade_drive`].

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use comms_if::eqpt::mot::{MotError, MotId};

// Internal
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Logical groups of the drive motor controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotGroup {
    All,
    Left,
    Right,
    Masters,
    Followers,
}

/// Possible errors that can occur during Drivetrain operation.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DrivetrainError {
    #[error("Motor id {0} is assigned to more than one drive motor")]
    DuplicateMotId(MotId),

    #[error("Deadband must be in [0, 1), got {0}")]
    InvalidDeadband(f64),

    #[error("Arcade demands must be finite, got forward {0}, rotation {1}")]
    NonFiniteDemand(f64, f64),

    #[error("Motor controller {0} failed: {1}")]
    Mot(MotId, MotError),
}
