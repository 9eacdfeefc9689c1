//! Simulated robot for bench runs and tests
//!
//! All simulated devices share one [`SimBody`] holding the true chassis pose
//! and the sensor mount angle. The drive moves the body, the mount turns the
//! sensor, and the range sensor ray-casts from wherever the body currently is.
//! Nothing here knows about the navigation stack's own pose estimate.

pub mod config;
pub mod drive;
pub mod link;
pub mod mount;
pub mod noise;
pub mod range;
pub mod world;

pub use config::{CircleObstacle, SimNetwork, SimulationConfig};
pub use drive::SimDrive;
pub use link::SimLink;
pub use mount::SimSweepMount;
pub use range::SimRangeSensor;
pub use world::SimWorld;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::RobotConfig;
use crate::types::Pose;
use crate::utils::normalize_degrees;

/// True physical state of the simulated robot (room frame)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimBody {
    pub x: f32,
    pub y: f32,
    pub heading_deg: f32,
    /// Sensor mount angle relative to the chassis
    pub mount_deg: f32,
}

impl SimBody {
    /// Direction the sensor is facing in the room frame
    pub fn beam_deg(&self) -> f32 {
        normalize_degrees(self.heading_deg + self.mount_deg)
    }
}

/// Handle that builds devices sharing one body and one world
#[derive(Clone)]
pub struct Simulation {
    config: SimulationConfig,
    robot: RobotConfig,
    world: Arc<SimWorld>,
    body: Arc<Mutex<SimBody>>,
}

impl Simulation {
    pub fn new(config: &SimulationConfig, robot: &RobotConfig) -> Self {
        let body = SimBody {
            x: config.start_x_mm,
            y: config.start_y_mm,
            heading_deg: normalize_degrees(config.start_heading_deg),
            mount_deg: 0.0,
        };
        log::info!(
            "Simulated room {:.0}x{:.0} mm, {} obstacles, start ({:.0}, {:.0}, {:.0}°)",
            config.room_width_mm,
            config.room_height_mm,
            config.obstacles.len(),
            body.x,
            body.y,
            body.heading_deg
        );
        Self {
            config: config.clone(),
            robot: robot.clone(),
            world: Arc::new(SimWorld::from_config(config)),
            body: Arc::new(Mutex::new(body)),
        }
    }

    pub fn range_sensor(&self) -> SimRangeSensor {
        SimRangeSensor::new(&self.config, Arc::clone(&self.world), Arc::clone(&self.body))
    }

    pub fn sweep_mount(&self) -> SimSweepMount {
        SimSweepMount::new(&self.config, Arc::clone(&self.body))
    }

    pub fn drive(&self) -> SimDrive {
        SimDrive::new(
            &self.config,
            &self.robot,
            Arc::clone(&self.world),
            Arc::clone(&self.body),
        )
    }

    pub fn link(&self) -> SimLink {
        SimLink::new(self.config.visible_networks.clone())
    }

    pub fn body(&self) -> SimBody {
        *self.body.lock()
    }

    /// True pose in the room frame
    pub fn true_pose(&self) -> Pose {
        let body = self.body();
        Pose::new(body.x, body.y, body.heading_deg)
    }
}

/// Sleep for a simulated duration, scaled down by `time_scale`
pub(crate) fn sim_sleep(seconds: f32, time_scale: f32) {
    if time_scale <= 0.0 || seconds <= 0.0 {
        return;
    }
    thread::sleep(Duration::from_secs_f32(seconds / time_scale));
}
