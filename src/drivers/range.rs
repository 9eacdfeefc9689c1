//! Distance sensor trait

use crate::types::RangeReading;

/// Single-beam distance sensor (time-of-flight)
pub trait RangeSource: Send {
    /// Take one reading.
    ///
    /// Never fails: a sensor that does not answer within its own timeout
    /// reports [`RangeReading::Timeout`].
    fn read(&mut self) -> RangeReading;
}
