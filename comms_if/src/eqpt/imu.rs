//! # Heading Sensor Interface

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// An orientation sensor reporting the robot's heading.
pub trait HeadingSensor {
    /// Current signed heading in degrees.
    ///
    /// The value is neither filtered nor wrapped; positive direction is chosen by the integrator.
    /// Readings are assumed to be honest, fault detection is the driver's business.
    fn heading_deg(&mut self) -> f64;
}
