//! Simulated sensor mount

use std::sync::Arc;

use parking_lot::Mutex;

use super::config::SimulationConfig;
use super::{sim_sleep, SimBody};
use crate::drivers::SweepActuator;
use crate::error::{Error, Result};

pub struct SimSweepMount {
    body: Arc<Mutex<SimBody>>,
    deg_per_sec: f32,
    time_scale: f32,
}

impl SimSweepMount {
    pub fn new(config: &SimulationConfig, body: Arc<Mutex<SimBody>>) -> Self {
        Self {
            body,
            deg_per_sec: config.mount_deg_per_sec,
            time_scale: config.time_scale,
        }
    }
}

impl SweepActuator for SimSweepMount {
    fn move_to(&mut self, angle_deg: f32) -> Result<()> {
        if !angle_deg.is_finite() {
            return Err(Error::InvalidParameter(format!(
                "mount angle {} is not finite",
                angle_deg
            )));
        }

        let travel = (angle_deg - self.position_deg()).abs();
        if self.deg_per_sec > 0.0 {
            sim_sleep(travel / self.deg_per_sec, self.time_scale);
        }
        // The mount is a continuous-turn stepper; 360° is kept as-is, not wrapped
        self.body.lock().mount_deg = angle_deg;
        Ok(())
    }

    fn position_deg(&self) -> f32 {
        self.body.lock().mount_deg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_and_home() {
        let config = SimulationConfig {
            time_scale: 0.0,
            ..Default::default()
        };
        let body = Arc::new(Mutex::new(SimBody {
            x: 0.0,
            y: 0.0,
            heading_deg: 0.0,
            mount_deg: 0.0,
        }));
        let mut mount = SimSweepMount::new(&config, Arc::clone(&body));

        mount.move_to(275.0).unwrap();
        assert_eq!(body.lock().mount_deg, 275.0);
        mount.home().unwrap();
        assert_eq!(mount.position_deg(), 0.0);
        assert!(mount.move_to(f32::NAN).is_err());
    }
}
