//! # Equipment interfaces
//!
//! Each submodule describes one external collaborator of the control core as a trait, along with
//! the plain data types that cross that boundary. Implementations live elsewhere (vendor driver
//! glue, or the simulation equipment in `drive_lib::sim`).

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Input device (gamepad) interface
pub mod hid;

/// Heading sensor interface
pub mod imu;

/// Motor controller interface
pub mod mot;
