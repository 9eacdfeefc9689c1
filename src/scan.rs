//! Sweep orchestration: read the distance field around the robot and pick the
//! most open direction.
//!
//! Two ways of producing a sweep are supported:
//!
//! - **Stepped**: a sweep actuator turns the sensor mount to each angle
//!   (0° → 360°, then optionally back to 0°) while the chassis stays put.
//!   Without a mount the readings are taken back to back, all facing forward.
//! - **Tracked**: the sensor is fixed and the chassis spins underneath it.
//!   The spinning side reports the angle it has actually reached on a
//!   channel; one reading is taken per report and acknowledged before the
//!   chassis moves on.
//!
//! Every accepted reading is resolved to a world point immediately, using the
//! pose the caller captured before the sweep started, and appended to the
//! shared map.

use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};

use crate::config::ScanConfig;
use crate::drivers::{RangeSource, SweepActuator};
use crate::shared::SharedMap;
use crate::types::{LastReading, Pose, RangeReading, SamplePoint, ScanResult};

/// Sweep runner owning the range sensor and (optionally) the sensor mount
pub struct ScanCycle {
    config: ScanConfig,
    range: Box<dyn RangeSource>,
    sweep: Option<Box<dyn SweepActuator>>,
}

impl ScanCycle {
    /// Create a scan cycle with a fixed sensor (no mount)
    pub fn new(config: ScanConfig, range: Box<dyn RangeSource>) -> Self {
        Self {
            config,
            range,
            sweep: None,
        }
    }

    /// Step the sweep with a sensor mount
    pub fn with_sweep(mut self, sweep: Box<dyn SweepActuator>) -> Self {
        self.sweep = Some(sweep);
        self
    }

    pub fn has_sweep(&self) -> bool {
        self.sweep.is_some()
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Angles visited by one sweep, in order
    pub fn sweep_angles(&self) -> Vec<u16> {
        let step = self.config.step_deg.max(1) as usize;
        if self.sweep.is_some() {
            let mut angles: Vec<u16> = (0..=360u16).step_by(step).collect();
            if self.config.return_sweep {
                let back: Vec<u16> = angles.iter().rev().copied().collect();
                angles.extend(back);
            }
            angles
        } else {
            (0..360u16).step_by(step).collect()
        }
    }

    /// Distance of a reading if it falls strictly inside the accepted band
    pub fn accept(&self, reading: RangeReading) -> Option<u16> {
        let mm = reading.distance_mm()?;
        let min = self.config.min_range_mm;
        let max = self.config.max_range_mm;
        (mm > min && mm < max).then_some(mm)
    }

    /// Run one full stepped sweep.
    ///
    /// `origin` is the pose at the moment the sweep starts; when given, each
    /// accepted sample is resolved against it and appended to `map` right away.
    pub fn run_sweep(&mut self, origin: Option<Pose>, map: &SharedMap) -> ScanResult {
        let angles = self.sweep_angles();
        let mut result = ScanResult {
            samples: Vec::with_capacity(angles.len()),
            ..Default::default()
        };
        let mut timeouts = 0usize;

        self.home_mount();
        for angle in angles.iter().copied() {
            if !self.move_mount(angle) {
                continue;
            }
            if self.sample_at(angle as f32, origin, map, &mut result) == RangeReading::Timeout {
                timeouts += 1;
            }
        }
        self.home_mount();

        log_sweep(&result, timeouts, angles.len());
        result
    }

    /// Run one sweep while the chassis spins under a fixed sensor.
    ///
    /// Every angle received on `progress` (degrees turned since the sweep
    /// started) gets one reading, acknowledged on `taken`. The sweep ends when
    /// the sending side hangs up.
    pub fn run_tracked_sweep(
        &mut self,
        origin: Option<Pose>,
        map: &SharedMap,
        progress: &Receiver<f32>,
        taken: &Sender<()>,
    ) -> ScanResult {
        let mut result = ScanResult::default();
        let mut timeouts = 0usize;
        let mut steps = 0usize;

        for angle in progress.iter() {
            steps += 1;
            if self.sample_at(angle, origin, map, &mut result) == RangeReading::Timeout {
                timeouts += 1;
            }
            if taken.send(()).is_err() {
                break;
            }
        }

        log_sweep(&result, timeouts, steps);
        result
    }

    /// Read once at `angle_deg` and fold the reading into `result`
    fn sample_at(
        &mut self,
        angle_deg: f32,
        origin: Option<Pose>,
        map: &SharedMap,
        result: &mut ScanResult,
    ) -> RangeReading {
        let reading = self.range.read();
        log::debug!("Sweep {:>5.1}°: {:?}", angle_deg, reading);

        map.record_reading(LastReading { angle_deg, reading });

        let Some(distance_mm) = self.accept(reading) else {
            return reading;
        };

        let sample = SamplePoint::new(angle_deg, distance_mm);
        result.samples.push(sample);
        if let Some(pose) = origin {
            map.push_obstacle(pose.resolve(&sample));
        }

        // Strictly greater: the first angle to reach a distance keeps it
        if distance_mm > result.best_distance_mm {
            result.best_distance_mm = distance_mm;
            result.best_heading_deg = (angle_deg.round() as i32).rem_euclid(360);
        }
        reading
    }

    /// Bring the mount to `angle`. Returns false if the angle has to be
    /// skipped.
    fn move_mount(&mut self, angle: u16) -> bool {
        let Some(sweep) = self.sweep.as_mut() else {
            return true;
        };
        if let Err(e) = sweep.move_to(angle as f32) {
            log::warn!("Sensor mount failed to reach {}°: {}", angle, e);
            return false;
        }
        sleep_ms(self.config.settle_ms);
        true
    }

    fn home_mount(&mut self) {
        if let Some(sweep) = self.sweep.as_mut() {
            if let Err(e) = sweep.home() {
                log::warn!("Sensor mount failed to home: {}", e);
            }
            sleep_ms(self.config.home_settle_ms);
        }
    }
}

fn log_sweep(result: &ScanResult, timeouts: usize, steps: usize) {
    if timeouts > 0 {
        log::warn!("Sweep had {} sensor timeouts out of {} steps", timeouts, steps);
    }
    log::info!(
        "Sweep done: {} samples, best {}° at {} mm",
        result.samples.len(),
        result.best_heading_deg,
        result.best_distance_mm
    );
}

fn sleep_ms(ms: u64) {
    if ms > 0 {
        thread::sleep(Duration::from_millis(ms));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use std::collections::VecDeque;

    /// Replays a fixed list of readings, then times out
    struct Scripted(VecDeque<RangeReading>);

    impl Scripted {
        fn new(readings: &[RangeReading]) -> Box<Self> {
            Box::new(Self(readings.iter().copied().collect()))
        }
    }

    impl RangeSource for Scripted {
        fn read(&mut self) -> RangeReading {
            self.0.pop_front().unwrap_or(RangeReading::Timeout)
        }
    }

    struct Mount {
        angle: f32,
        fail_at: Option<f32>,
    }

    impl SweepActuator for Mount {
        fn move_to(&mut self, angle_deg: f32) -> Result<()> {
            if self.fail_at == Some(angle_deg) {
                return Err(Error::MotionTimeout {
                    what: "sensor mount",
                    waited_ms: 0,
                });
            }
            self.angle = angle_deg;
            Ok(())
        }

        fn position_deg(&self) -> f32 {
            self.angle
        }
    }

    fn fast_config() -> ScanConfig {
        ScanConfig {
            step_deg: 90,
            return_sweep: false,
            settle_ms: 0,
            home_settle_ms: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_stepped_angles_include_return() {
        let config = ScanConfig {
            step_deg: 90,
            return_sweep: true,
            ..fast_config()
        };
        let scan = ScanCycle::new(config, Scripted::new(&[])).with_sweep(Box::new(Mount {
            angle: 0.0,
            fail_at: None,
        }));
        assert_eq!(
            scan.sweep_angles(),
            vec![0, 90, 180, 270, 360, 360, 270, 180, 90, 0]
        );
    }

    #[test]
    fn test_fixed_sensor_angles_single_pass() {
        let scan = ScanCycle::new(fast_config(), Scripted::new(&[]));
        assert_eq!(scan.sweep_angles(), vec![0, 90, 180, 270]);
    }

    #[test]
    fn test_accept_band() {
        let scan = ScanCycle::new(fast_config(), Scripted::new(&[]));
        assert_eq!(scan.accept(RangeReading::Timeout), None);
        assert_eq!(scan.accept(RangeReading::Distance(0)), None);
        assert_eq!(scan.accept(RangeReading::Distance(30)), None);
        assert_eq!(scan.accept(RangeReading::Distance(31)), Some(31));
        assert_eq!(scan.accept(RangeReading::Distance(1999)), Some(1999));
        assert_eq!(scan.accept(RangeReading::Distance(2000)), None);
        assert_eq!(scan.accept(RangeReading::Distance(8190)), None);
    }

    #[test]
    fn test_accept_without_near_field_filter() {
        let config = ScanConfig {
            min_range_mm: 0,
            ..fast_config()
        };
        let scan = ScanCycle::new(config, Scripted::new(&[]));
        assert_eq!(scan.accept(RangeReading::Distance(0)), None);
        assert_eq!(scan.accept(RangeReading::Distance(1)), Some(1));
    }

    #[test]
    fn test_first_maximum_wins() {
        let map = SharedMap::new(16);
        let mut scan = ScanCycle::new(
            fast_config(),
            Scripted::new(&[
                RangeReading::Distance(500),
                RangeReading::Distance(500),
                RangeReading::Distance(200),
                RangeReading::Timeout,
            ]),
        );
        let result = scan.run_sweep(None, &map);
        assert_eq!(result.best_heading_deg, 0);
        assert_eq!(result.best_distance_mm, 500);
        assert_eq!(result.samples.len(), 3);
    }

    #[test]
    fn test_no_valid_samples_gives_sentinel() {
        let map = SharedMap::new(16);
        let mut scan = ScanCycle::new(
            fast_config(),
            Scripted::new(&[
                RangeReading::Timeout,
                RangeReading::Distance(5000),
                RangeReading::Distance(10),
                RangeReading::Timeout,
            ]),
        );
        let result = scan.run_sweep(Some(Pose::origin()), &map);
        assert!(!result.has_direction());
        assert_eq!(result.best_heading_deg, 0);
        assert_eq!(result.best_distance_mm, 0);
        assert!(result.samples.is_empty());
        assert_eq!(map.obstacle_count(), 0);

        // Last reading is still published even though it was rejected
        let last = map.snapshot().last_reading.unwrap();
        assert_eq!(last.angle_deg, 270.0);
        assert_eq!(last.reading, RangeReading::Timeout);
    }

    #[test]
    fn test_obstacles_only_with_pose() {
        let readings = [RangeReading::Distance(400); 4];

        let map = SharedMap::new(16);
        let mut scan = ScanCycle::new(fast_config(), Scripted::new(&readings));
        scan.run_sweep(None, &map);
        assert_eq!(map.obstacle_count(), 0);

        let mut scan = ScanCycle::new(fast_config(), Scripted::new(&readings));
        scan.run_sweep(Some(Pose::origin()), &map);
        assert_eq!(map.obstacle_count(), 4);
    }

    #[test]
    fn test_maximum_at_360_reported_as_zero() {
        let config = ScanConfig {
            step_deg: 180,
            return_sweep: false,
            ..fast_config()
        };
        let map = SharedMap::new(16);
        let mut scan = ScanCycle::new(
            config,
            Scripted::new(&[
                RangeReading::Distance(100),
                RangeReading::Distance(200),
                RangeReading::Distance(900),
            ]),
        )
        .with_sweep(Box::new(Mount {
            angle: 0.0,
            fail_at: None,
        }));
        let result = scan.run_sweep(None, &map);
        assert_eq!(result.best_distance_mm, 900);
        assert_eq!(result.best_heading_deg, 0);
    }

    #[test]
    fn test_mount_failure_skips_angle() {
        let map = SharedMap::new(16);
        let mut scan = ScanCycle::new(
            fast_config(),
            Scripted::new(&[
                RangeReading::Distance(300),
                RangeReading::Distance(400),
                RangeReading::Distance(500),
                RangeReading::Distance(600),
            ]),
        )
        .with_sweep(Box::new(Mount {
            angle: 0.0,
            fail_at: Some(90.0),
        }));
        let result = scan.run_sweep(None, &map);
        // 0, 180, 270, 360 read; 90 skipped without consuming a reading
        let angles: Vec<f32> = result.samples.iter().map(|s| s.relative_angle_deg).collect();
        assert_eq!(angles, vec![0.0, 180.0, 270.0, 360.0]);
        assert_eq!(result.best_distance_mm, 600);
        assert_eq!(result.best_heading_deg, 0);
    }

    #[test]
    fn test_tracked_sweep_labels_reported_angles() {
        let map = SharedMap::new(16);
        let mut scan = ScanCycle::new(
            fast_config(),
            Scripted::new(&[
                RangeReading::Distance(300),
                RangeReading::Distance(900),
                RangeReading::Timeout,
            ]),
        );
        let (progress_tx, progress_rx) = crossbeam_channel::bounded(0);
        let (taken_tx, taken_rx) = crossbeam_channel::bounded(0);

        let spinner = thread::spawn(move || {
            for angle in [0.0, 87.9, 181.2] {
                progress_tx.send(angle).unwrap();
                taken_rx.recv().unwrap();
            }
        });
        let result = scan.run_tracked_sweep(Some(Pose::origin()), &map, &progress_rx, &taken_tx);
        spinner.join().unwrap();

        let angles: Vec<f32> = result.samples.iter().map(|s| s.relative_angle_deg).collect();
        assert_eq!(angles, vec![0.0, 87.9]);
        assert_eq!(result.best_distance_mm, 900);
        assert_eq!(result.best_heading_deg, 88);
        assert_eq!(map.obstacle_count(), 2);
        assert_eq!(map.snapshot().last_reading.unwrap().angle_deg, 181.2);
    }
}
