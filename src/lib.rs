//! DishaNav - scan-and-advance navigation for a small radar robot
//!
//! The robot sweeps a distance sensor around itself, turns toward the most
//! open direction and drives most of the way there, then repeats. Every
//! reading it accepts is placed in a bounded obstacle map that a small HTTP
//! status server can show while the robot moves.
//!
//! ## Threads
//!
//! - **navigation**: runs [`NavigationCycle`] and writes [`SharedMap`]
//! - **scan** (spin mode only): reads the sensor at each angle the spinning
//!   chassis reports and writes the resulting obstacles
//! - **status-server**: sole reader of [`SharedMap`]; also accepts WiFi
//!   credentials

pub mod config;
pub mod credentials;
pub mod devices;
pub mod drivers;
pub mod error;
pub mod navigation;
pub mod network;
pub mod pose;
pub mod scan;
pub mod shared;
pub mod status;
pub mod types;
pub mod utils;

pub use config::{Config, NavigationMode};
pub use error::{Error, Result};
pub use navigation::{CycleReport, NavigationCycle};
pub use pose::PoseTracker;
pub use scan::ScanCycle;
pub use shared::{MapSnapshot, SharedMap};
pub use types::{LastReading, NavPhase, ObstaclePoint, Pose, RangeReading, SamplePoint, ScanResult};
