//! Simulated differential stepper drive
//!
//! Step commands are converted back into rotation and translation with the
//! same calibration the navigation cycle uses, then applied to the body in
//! small increments. A translation increment that would put the chassis into
//! a wall or obstacle stops the motion and reports a stall.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use super::config::SimulationConfig;
use super::world::SimWorld;
use super::{sim_sleep, SimBody};
use crate::config::RobotConfig;
use crate::drivers::DriveActuator;
use crate::error::{Error, Result};
use crate::utils::normalize_degrees;

/// Wheel steps applied per simulation increment
const STEPS_PER_INCREMENT: i32 = 16;

pub struct SimDrive {
    world: Arc<SimWorld>,
    body: Arc<Mutex<SimBody>>,
    steps_per_degree: f32,
    steps_per_mm: f32,
    robot_radius_mm: f32,
    steps_per_sec: f32,
    time_scale: f32,
}

impl SimDrive {
    pub fn new(
        config: &SimulationConfig,
        robot: &RobotConfig,
        world: Arc<SimWorld>,
        body: Arc<Mutex<SimBody>>,
    ) -> Self {
        Self {
            world,
            body,
            steps_per_degree: robot.steps_per_degree,
            steps_per_mm: robot.steps_per_mm,
            robot_radius_mm: config.robot_radius_mm,
            steps_per_sec: config.wheel_steps_per_sec,
            time_scale: config.time_scale,
        }
    }
}

impl DriveActuator for SimDrive {
    fn rotate_steps(&mut self, left: i32, right: i32) -> Result<()> {
        let started = Instant::now();
        let total = left.abs().max(right.abs());
        if total == 0 {
            return Ok(());
        }

        // Split into common (forward) and differential (CCW turn) components
        let forward_mm = (left + right) as f32 / 2.0 / self.steps_per_mm;
        let turn_deg = (right - left) as f32 / 2.0 / self.steps_per_degree;

        let increments = (total + STEPS_PER_INCREMENT - 1) / STEPS_PER_INCREMENT;
        let step_forward = forward_mm / increments as f32;
        let step_turn = turn_deg / increments as f32;
        let increment_secs = if self.steps_per_sec > 0.0 {
            total as f32 / self.steps_per_sec / increments as f32
        } else {
            0.0
        };

        for _ in 0..increments {
            sim_sleep(increment_secs, self.time_scale);

            let mut body = self.body.lock();
            let heading = body.heading_deg.to_radians();
            let x = body.x + step_forward * heading.cos();
            let y = body.y + step_forward * heading.sin();

            if step_forward != 0.0 && self.world.collides(x, y, self.robot_radius_mm) {
                log::debug!("Simulated chassis blocked at ({:.0}, {:.0})", body.x, body.y);
                return Err(Error::MotionTimeout {
                    what: "drive",
                    waited_ms: started.elapsed().as_millis() as u64,
                });
            }

            body.x = x;
            body.y = y;
            body.heading_deg = normalize_degrees(body.heading_deg + step_turn);
        }

        Ok(())
    }
}
