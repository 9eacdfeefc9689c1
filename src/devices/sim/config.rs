//! Simulated room and device parameters
//!
//! ```text
//! SimulationConfig
//! ├── room_width_mm, room_height_mm      # Rectangular room, origin in a corner
//! ├── start_x/y_mm, start_heading_deg    # True starting pose in the room
//! ├── obstacles                          # Circular obstacles
//! ├── range_stddev_mm, timeout_rate      # Range sensor noise
//! ├── mount_deg_per_sec                  # Sensor mount speed
//! ├── wheel_steps_per_sec                # Drive speed
//! ├── visible_networks                   # Joinable WiFi networks
//! └── time_scale, random_seed            # Simulation control
//! ```
//!
//! The room frame is independent of the robot's dead-reckoning frame, which
//! always starts at the origin facing +X.

use serde::{Deserialize, Serialize};

/// Circular obstacle in room coordinates (mm)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CircleObstacle {
    pub x_mm: f32,
    pub y_mm: f32,
    pub radius_mm: f32,
}

/// A network the simulated radio can join
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SimNetwork {
    pub ssid: String,
    pub password: String,
}

/// Simulation configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationConfig {
    #[serde(default = "default_room_width_mm")]
    pub room_width_mm: f32,

    #[serde(default = "default_room_height_mm")]
    pub room_height_mm: f32,

    #[serde(default = "default_start_x_mm")]
    pub start_x_mm: f32,

    #[serde(default = "default_start_y_mm")]
    pub start_y_mm: f32,

    #[serde(default)]
    pub start_heading_deg: f32,

    #[serde(default = "default_obstacles")]
    pub obstacles: Vec<CircleObstacle>,

    /// Chassis radius used for collision checks (mm)
    #[serde(default = "default_robot_radius_mm")]
    pub robot_radius_mm: f32,

    /// Farthest distance the sensor reports before answering "no target" (mm)
    #[serde(default = "default_sensor_range_mm")]
    pub sensor_range_mm: f32,

    /// Range noise standard deviation (mm)
    #[serde(default = "default_range_stddev_mm")]
    pub range_stddev_mm: f32,

    /// Probability that a reading times out (0.0-1.0)
    #[serde(default = "default_timeout_rate")]
    pub timeout_rate: f32,

    #[serde(default = "default_mount_deg_per_sec")]
    pub mount_deg_per_sec: f32,

    #[serde(default = "default_wheel_steps_per_sec")]
    pub wheel_steps_per_sec: f32,

    #[serde(default)]
    pub visible_networks: Vec<SimNetwork>,

    /// Speed-up factor for simulated delays (0 = no delays)
    #[serde(default = "default_time_scale")]
    pub time_scale: f32,

    /// Random seed (0 = random)
    #[serde(default)]
    pub random_seed: u64,
}

fn default_room_width_mm() -> f32 {
    4000.0
}
fn default_room_height_mm() -> f32 {
    3000.0
}
fn default_start_x_mm() -> f32 {
    1000.0
}
fn default_start_y_mm() -> f32 {
    1500.0
}
fn default_obstacles() -> Vec<CircleObstacle> {
    vec![
        CircleObstacle {
            x_mm: 2500.0,
            y_mm: 1000.0,
            radius_mm: 250.0,
        },
        CircleObstacle {
            x_mm: 3000.0,
            y_mm: 2300.0,
            radius_mm: 150.0,
        },
    ]
}
fn default_robot_radius_mm() -> f32 {
    90.0
}
fn default_sensor_range_mm() -> f32 {
    2000.0
}
fn default_range_stddev_mm() -> f32 {
    8.0
}
fn default_timeout_rate() -> f32 {
    0.01
}
fn default_mount_deg_per_sec() -> f32 {
    360.0
}
fn default_wheel_steps_per_sec() -> f32 {
    800.0
}
fn default_time_scale() -> f32 {
    1.0
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            room_width_mm: default_room_width_mm(),
            room_height_mm: default_room_height_mm(),
            start_x_mm: default_start_x_mm(),
            start_y_mm: default_start_y_mm(),
            start_heading_deg: 0.0,
            obstacles: default_obstacles(),
            robot_radius_mm: default_robot_radius_mm(),
            sensor_range_mm: default_sensor_range_mm(),
            range_stddev_mm: default_range_stddev_mm(),
            timeout_rate: default_timeout_rate(),
            mount_deg_per_sec: default_mount_deg_per_sec(),
            wheel_steps_per_sec: default_wheel_steps_per_sec(),
            visible_networks: Vec::new(),
            time_scale: default_time_scale(),
            random_seed: 0,
        }
    }
}
