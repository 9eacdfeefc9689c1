//! Scan, pose and map data types

use serde::Serialize;

/// One accepted reading from a sweep.
///
/// The angle is relative to the robot heading at the time the sweep started.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SamplePoint {
    /// Angle relative to robot heading (degrees, CCW positive)
    pub relative_angle_deg: f32,
    /// Measured distance (mm)
    pub distance_mm: u16,
}

impl SamplePoint {
    /// Create new sample point
    pub fn new(relative_angle_deg: f32, distance_mm: u16) -> Self {
        Self {
            relative_angle_deg,
            distance_mm,
        }
    }
}

/// A sample resolved into world coordinates (mm)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ObstaclePoint {
    pub world_x: f32,
    pub world_y: f32,
}

/// Believed robot position (mm) and heading (degrees, always in [0, 360))
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    pub heading_deg: f32,
}

impl Pose {
    /// Create new pose
    pub fn new(x: f32, y: f32, heading_deg: f32) -> Self {
        Self {
            x,
            y,
            heading_deg: crate::utils::normalize_degrees(heading_deg),
        }
    }

    /// Origin, facing +X
    pub fn origin() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            heading_deg: 0.0,
        }
    }

    /// Resolve a robot-relative sample into world coordinates.
    ///
    /// Both coordinates are computed from the same pose value and returned as
    /// one pair.
    pub fn resolve(&self, sample: &SamplePoint) -> ObstaclePoint {
        let angle = (sample.relative_angle_deg + self.heading_deg).to_radians();
        let distance = sample.distance_mm as f32;
        ObstaclePoint {
            world_x: self.x + distance * angle.cos(),
            world_y: self.y + distance * angle.sin(),
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::origin()
    }
}

/// Raw outcome of one range measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "mm", rename_all = "lowercase")]
pub enum RangeReading {
    /// Sensor returned a distance (mm); may still be out of the accepted band
    Distance(u16),
    /// Sensor did not answer within its timeout
    Timeout,
}

impl RangeReading {
    /// Distance if the sensor answered
    pub fn distance_mm(&self) -> Option<u16> {
        match self {
            RangeReading::Distance(mm) => Some(*mm),
            RangeReading::Timeout => None,
        }
    }
}

/// Most recent reading of the sweep, valid or not (live status display)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LastReading {
    pub angle_deg: f32,
    pub reading: RangeReading,
}

/// Output of one sweep
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScanResult {
    /// Angle of the farthest accepted reading, normalized to [0, 360)
    pub best_heading_deg: i32,
    /// Farthest accepted reading (mm); 0 means no open direction was found
    pub best_distance_mm: u16,
    /// Accepted samples in sweep order
    pub samples: Vec<SamplePoint>,
}

impl ScanResult {
    /// Whether the sweep found any usable direction
    pub fn has_direction(&self) -> bool {
        self.best_distance_mm > 0
    }
}

/// Navigation state machine phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum NavPhase {
    #[default]
    Idle = 0,
    Scanning = 1,
    Selecting = 2,
    Turning = 3,
    Advancing = 4,
}

impl NavPhase {
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => NavPhase::Scanning,
            2 => NavPhase::Selecting,
            3 => NavPhase::Turning,
            4 => NavPhase::Advancing,
            _ => NavPhase::Idle,
        }
    }
}
