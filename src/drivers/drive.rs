//! Drive motor trait

use crate::error::Result;

/// Two stepper-driven drive wheels
pub trait DriveActuator: Send {
    /// Move the wheels by relative step counts (positive = forward).
    ///
    /// Blocks until both wheels have finished their steps. Opposite signs turn
    /// the robot in place: left backward with right forward is a CCW turn.
    fn rotate_steps(&mut self, left: i32, right: i32) -> Result<()>;
}
