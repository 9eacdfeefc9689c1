//! Dead-reckoning pose tracker
//!
//! Open-loop: the pose only changes when an actuator has confirmed that a
//! turn or advance completed, and nothing ever corrects it.

use crate::types::{ObstaclePoint, Pose, SamplePoint};
use crate::utils::normalize_degrees;

/// Robot pose maintained from completed motions
#[derive(Debug, Clone, Default)]
pub struct PoseTracker {
    pose: Pose,
}

impl PoseTracker {
    /// Create a tracker at the given pose
    pub fn new(start: Pose) -> Self {
        Self { pose: start }
    }

    /// Current pose
    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Apply a completed in-place rotation (degrees, CCW positive, any magnitude).
    ///
    /// Non-finite deltas leave the pose untouched.
    pub fn on_turn_completed(&mut self, delta_deg: f32) -> Pose {
        if !delta_deg.is_finite() {
            return self.pose;
        }
        self.pose.heading_deg = normalize_degrees(self.pose.heading_deg + delta_deg);
        self.pose
    }

    /// Apply a completed forward advance along the current heading.
    ///
    /// Non-positive distances leave the pose untouched.
    pub fn on_advance_completed(&mut self, distance_mm: f32) -> Pose {
        if distance_mm <= 0.0 || !distance_mm.is_finite() {
            return self.pose;
        }
        let heading = self.pose.heading_deg.to_radians();
        self.pose.x += distance_mm * heading.cos();
        self.pose.y += distance_mm * heading.sin();
        self.pose
    }

    /// Resolve a sample against the current pose
    pub fn resolve(&self, sample: &SamplePoint) -> ObstaclePoint {
        self.pose.resolve(sample)
    }
}
