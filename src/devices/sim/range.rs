//! Simulated time-of-flight range sensor

use std::sync::Arc;

use parking_lot::Mutex;

use super::config::SimulationConfig;
use super::noise::RangeNoise;
use super::world::SimWorld;
use super::SimBody;
use crate::drivers::RangeSource;
use crate::types::RangeReading;

/// Value the sensor reports when nothing is within range
pub const NO_TARGET_MM: u16 = 8190;

pub struct SimRangeSensor {
    world: Arc<SimWorld>,
    body: Arc<Mutex<SimBody>>,
    noise: RangeNoise,
    max_range_mm: f32,
}

impl SimRangeSensor {
    pub fn new(config: &SimulationConfig, world: Arc<SimWorld>, body: Arc<Mutex<SimBody>>) -> Self {
        Self {
            world,
            body,
            noise: RangeNoise::new(config.random_seed, config.range_stddev_mm, config.timeout_rate),
            max_range_mm: config.sensor_range_mm,
        }
    }
}

impl RangeSource for SimRangeSensor {
    fn read(&mut self) -> RangeReading {
        if self.noise.timed_out() {
            return RangeReading::Timeout;
        }

        let body = *self.body.lock();
        let distance = self.world.ray_cast(
            body.x,
            body.y,
            body.beam_deg().to_radians(),
            self.max_range_mm,
        );
        if distance >= self.max_range_mm {
            return RangeReading::Distance(NO_TARGET_MM);
        }

        let measured = self.noise.apply(distance).round().clamp(0.0, (NO_TARGET_MM - 1) as f32);
        RangeReading::Distance(measured as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sensor(heading_deg: f32, mount_deg: f32) -> SimRangeSensor {
        let config = SimulationConfig {
            obstacles: Vec::new(),
            range_stddev_mm: 0.0,
            timeout_rate: 0.0,
            random_seed: 1,
            ..Default::default()
        };
        let world = Arc::new(SimWorld::from_config(&config));
        let body = Arc::new(Mutex::new(SimBody {
            x: 1000.0,
            y: 1500.0,
            heading_deg,
            mount_deg,
        }));
        SimRangeSensor::new(&config, world, body)
    }

    #[test]
    fn test_reads_along_heading_plus_mount() {
        // Wall to the left (+Y) is 1500 mm away
        assert_eq!(sensor(90.0, 0.0).read(), RangeReading::Distance(1500));
        assert_eq!(sensor(0.0, 90.0).read(), RangeReading::Distance(1500));
        // Wall behind (-X) is 1000 mm away
        assert_eq!(sensor(90.0, 90.0).read(), RangeReading::Distance(1000));
    }

    #[test]
    fn test_out_of_range_reports_no_target() {
        // Wall ahead is 3000 mm away, beyond the 2000 mm sensor range
        assert_eq!(sensor(0.0, 0.0).read(), RangeReading::Distance(NO_TARGET_MM));
    }
}
