//! Sensor mount trait

use crate::error::Result;

/// Rotating mount carrying the distance sensor
pub trait SweepActuator: Send {
    /// Move to an absolute angle (degrees, 0 = robot forward, CCW positive).
    ///
    /// Blocks until the mount reports arrival.
    fn move_to(&mut self, angle_deg: f32) -> Result<()>;

    /// Current mount angle (degrees)
    fn position_deg(&self) -> f32;

    /// Return the mount to 0°
    fn home(&mut self) -> Result<()> {
        self.move_to(0.0)
    }
}
