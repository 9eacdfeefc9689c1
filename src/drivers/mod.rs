//! Capability traits for the robot's sensor and actuators

pub mod drive;
pub mod range;
pub mod sweep;

pub use drive::DriveActuator;
pub use range::RangeSource;
pub use sweep::SweepActuator;
