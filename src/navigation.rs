//! Scan / select / turn / advance navigation cycle
//!
//! ```text
//! IDLE ─▶ SCANNING ─▶ SELECTING ─▶ TURNING ─▶ ADVANCING ─▶ (settle) ─▶ IDLE
//! ```
//!
//! In spin mode the SCANNING phase runs on two threads: a `scan` worker reads
//! the sensor while this thread spins the chassis through 360° in `step_deg`
//! increments. After each increment the angle actually reached is handed to
//! the worker, which reads once and hands back. The cycle only moves on once
//! both have finished, so every obstacle point of the sweep is written
//! against the pose captured before the sweep and before any turn of this
//! cycle.
//!
//! The pose tracker is only told about a motion after the drive reports it
//! complete. A failed motion leaves the pose where it was.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};

use crate::config::{Config, NavigationConfig, NavigationMode, RobotConfig};
use crate::drivers::DriveActuator;
use crate::error::{Error, Result};
use crate::pose::PoseTracker;
use crate::scan::ScanCycle;
use crate::shared::SharedMap;
use crate::types::{NavPhase, Pose, ScanResult};

/// Granularity of the interruptible inter-cycle pause
const PAUSE_SLICE: Duration = Duration::from_millis(50);

/// What happened during one cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub scan: ScanResult,
    /// Commanded in-place rotation (degrees, CCW)
    pub turn_deg: f32,
    pub turn_completed: bool,
    /// Commanded forward travel, None when there was nothing to do
    pub advance_mm: Option<f32>,
    pub advance_completed: bool,
    /// Pose at the end of the cycle
    pub pose: Pose,
}

/// Top-level navigation state machine
pub struct NavigationCycle {
    robot: RobotConfig,
    nav: NavigationConfig,
    scanner: ScanCycle,
    drive: Box<dyn DriveActuator>,
    tracker: PoseTracker,
    map: Arc<SharedMap>,
}

impl NavigationCycle {
    /// Create a navigation cycle starting from the pose currently in `map`.
    ///
    /// Spin mode needs a fixed sensor; a scanner with a mount is rejected.
    pub fn new(
        config: &Config,
        scanner: ScanCycle,
        drive: Box<dyn DriveActuator>,
        map: Arc<SharedMap>,
    ) -> Result<Self> {
        match config.navigation.mode {
            NavigationMode::Spin if scanner.has_sweep() => {
                return Err(Error::Config(
                    "spin navigation needs a fixed sensor, but the scanner has a sweep mount"
                        .to_string(),
                ));
            }
            NavigationMode::Stepped if !scanner.has_sweep() => {
                log::warn!("Stepped navigation without a sensor mount: every reading faces forward");
            }
            _ => {}
        }

        let tracker = PoseTracker::new(map.pose());
        Ok(Self {
            robot: config.robot.clone(),
            nav: config.navigation.clone(),
            scanner,
            drive,
            tracker,
            map,
        })
    }

    pub fn pose(&self) -> Pose {
        self.tracker.pose()
    }

    pub fn map(&self) -> &Arc<SharedMap> {
        &self.map
    }

    /// Wheel steps for an in-place rotation
    pub fn turn_steps(&self, angle_deg: f32) -> i32 {
        (angle_deg * self.robot.steps_per_degree).round() as i32
    }

    /// Wheel steps for a straight advance
    pub fn advance_steps(&self, distance_mm: f32) -> i32 {
        (distance_mm * self.robot.steps_per_mm).round() as i32
    }

    /// Run until `running` is cleared or `max_cycles` is reached.
    ///
    /// Returns the number of cycles started.
    pub fn run(&mut self, running: &AtomicBool) -> u64 {
        let mut cycles = 0u64;
        log::info!(
            "Navigation started in {:?} mode at {:?}",
            self.nav.mode,
            self.tracker.pose()
        );

        while running.load(Ordering::Relaxed) {
            if self.nav.max_cycles.is_some_and(|max| cycles >= max) {
                log::info!("Reached max_cycles ({})", cycles);
                break;
            }

            cycles += 1;
            if let Err(e) = self.run_cycle() {
                log::error!("Navigation cycle {} aborted: {}", cycles, e);
            }

            self.pause(running);
        }

        self.map.set_phase(NavPhase::Idle);
        log::info!("Navigation stopped after {} cycles", cycles);
        cycles
    }

    /// One scan, select, turn, advance pass (without the settle pause)
    pub fn run_cycle(&mut self) -> Result<CycleReport> {
        // SCANNING
        self.map.set_phase(NavPhase::Scanning);
        let scan = match self.scan() {
            Ok(scan) => scan,
            Err(e) => {
                self.map.set_phase(NavPhase::Idle);
                return Err(e);
            }
        };

        // SELECTING
        self.map.set_phase(NavPhase::Selecting);
        let turn_deg = scan.best_heading_deg as f32;
        let advance_mm = if scan.has_direction() {
            let distance = scan.best_distance_mm as f32 - self.robot.safety_margin_mm;
            (distance > 0.0).then_some(distance)
        } else {
            log::info!("No open direction found; staying put this cycle");
            None
        };

        // TURNING
        self.map.set_phase(NavPhase::Turning);
        let turn_completed = self.turn(turn_deg);

        // ADVANCING
        let mut advance_completed = false;
        if let Some(distance) = advance_mm {
            if turn_completed {
                self.map.set_phase(NavPhase::Advancing);
                advance_completed = self.advance(distance);
            } else {
                log::warn!("Skipping advance: heading unknown after failed turn");
            }
        }

        let pose = self.tracker.pose();
        log::info!(
            "Cycle done: turn {:.0}°, advance {:?} mm, pose ({:.1}, {:.1}, {:.1}°), {} obstacles",
            turn_deg,
            advance_mm.filter(|_| advance_completed),
            pose.x,
            pose.y,
            pose.heading_deg,
            self.map.obstacle_count()
        );

        self.map.increment_cycle_count();
        self.map.set_phase(NavPhase::Idle);

        Ok(CycleReport {
            scan,
            turn_deg,
            turn_completed,
            advance_mm,
            advance_completed,
            pose,
        })
    }

    fn scan(&mut self) -> Result<ScanResult> {
        let origin = self.tracker.pose();
        match self.nav.mode {
            NavigationMode::Stepped => Ok(self.scanner.run_sweep(Some(origin), &self.map)),
            NavigationMode::Spin => self.scan_while_spinning(origin),
        }
    }

    /// Sweep on a worker thread while this thread spins the chassis 360°.
    fn scan_while_spinning(&mut self, origin: Pose) -> Result<ScanResult> {
        let step_deg = u32::from(self.scanner.config().step_deg.max(1));
        let steps_per_degree = self.robot.steps_per_degree;
        let scanner = &mut self.scanner;
        let drive = &mut self.drive;
        let map: &SharedMap = &self.map;

        // Rendezvous channels: the chassis holds still while a reading is taken
        let (progress_tx, progress_rx) = crossbeam_channel::bounded::<f32>(0);
        let (taken_tx, taken_rx) = crossbeam_channel::bounded::<()>(0);

        let (scan, spin) = thread::scope(|s| -> Result<(ScanResult, SpinOutcome)> {
            let scan_task = thread::Builder::new()
                .name("scan".to_string())
                .spawn_scoped(s, move || {
                    scanner.run_tracked_sweep(Some(origin), map, &progress_rx, &taken_tx)
                })?;

            let spin = spin_in_increments(
                drive.as_mut(),
                steps_per_degree,
                step_deg,
                progress_tx,
                &taken_rx,
            );

            // Both units must be done before anything reads the pose or turns
            let scan = scan_task
                .join()
                .map_err(|_| Error::Other("scan thread panicked".to_string()))?;
            Ok((scan, spin))
        })?;

        let turned_deg = match spin.error {
            None => 360.0,
            Some(e) => {
                let partial = spin.steps as f32 / steps_per_degree;
                log::warn!("Spin stopped after {:.1}°: {}", partial, e);
                partial
            }
        };
        let pose = self.tracker.on_turn_completed(turned_deg);
        self.map.set_pose(pose);

        Ok(scan)
    }

    /// Rotate in place; returns whether the drive confirmed completion
    fn turn(&mut self, angle_deg: f32) -> bool {
        let steps = self.turn_steps(angle_deg);
        if steps != 0 {
            log::info!("Turning {:.0}° ({} steps)", angle_deg, steps);
            if let Err(e) = self.drive.rotate_steps(-steps, steps) {
                log::warn!("Turn of {:.0}° failed: {}", angle_deg, e);
                return false;
            }
        }
        let pose = self.tracker.on_turn_completed(angle_deg);
        self.map.set_pose(pose);
        true
    }

    /// Drive straight; returns whether the drive confirmed completion
    fn advance(&mut self, distance_mm: f32) -> bool {
        let steps = self.advance_steps(distance_mm);
        if steps <= 0 {
            return false;
        }
        log::info!("Advancing {:.0} mm ({} steps)", distance_mm, steps);
        if let Err(e) = self.drive.rotate_steps(steps, steps) {
            log::warn!("Advance of {:.0} mm failed: {}", distance_mm, e);
            return false;
        }
        let pose = self.tracker.on_advance_completed(distance_mm);
        self.map.set_pose(pose);
        true
    }

    /// Inter-cycle settle pause, cut short on shutdown
    fn pause(&self, running: &AtomicBool) {
        let deadline = Instant::now() + Duration::from_millis(self.nav.inter_cycle_delay_ms);
        while running.load(Ordering::Relaxed) {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep(PAUSE_SLICE.min(deadline - now));
        }
    }
}

/// How far a spin got, and why it stopped early if it did
struct SpinOutcome {
    /// Wheel steps of completed rotation increments
    steps: i32,
    error: Option<Error>,
}

/// Spin one full turn CCW in `step_deg` increments, reporting the angle
/// reached before each increment and waiting for the reading to be taken.
///
/// Increments are rounded against the running total so the spin adds up to
/// exactly one turn of wheel steps.
fn spin_in_increments(
    drive: &mut dyn DriveActuator,
    steps_per_degree: f32,
    step_deg: u32,
    progress: Sender<f32>,
    taken: &Receiver<()>,
) -> SpinOutcome {
    let to_steps = |deg: u32| (deg as f32 * steps_per_degree).round() as i32;
    let mut outcome = SpinOutcome {
        steps: 0,
        error: None,
    };

    let targets = (0..360).step_by(step_deg as usize).chain(std::iter::once(360));
    for target in targets {
        let increment = to_steps(target) - outcome.steps;
        if increment != 0 {
            if let Err(e) = drive.rotate_steps(-increment, increment) {
                outcome.error = Some(e);
                return outcome;
            }
            outcome.steps += increment;
        }

        if target < 360 {
            let reached = outcome.steps as f32 / steps_per_degree;
            if progress.send(reached).is_err() || taken.recv().is_err() {
                outcome.error = Some(Error::Other("scan worker stopped mid-spin".to_string()));
                return outcome;
            }
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::{RangeSource, SweepActuator};
    use crate::types::RangeReading;
    use parking_lot::Mutex;

    struct Fixed(u16);

    impl RangeSource for Fixed {
        fn read(&mut self) -> RangeReading {
            RangeReading::Distance(self.0)
        }
    }

    /// Open at 90°, close everywhere else
    struct Farthest90 {
        index: usize,
    }

    impl RangeSource for Farthest90 {
        fn read(&mut self) -> RangeReading {
            let mm = if self.index == 1 { 1500 } else { 200 };
            self.index += 1;
            RangeReading::Distance(mm)
        }
    }

    /// Records commands; fails every rotation when `fail_turns` is set
    struct Recorder {
        commands: Arc<Mutex<Vec<(i32, i32)>>>,
        fail_turns: bool,
    }

    impl DriveActuator for Recorder {
        fn rotate_steps(&mut self, left: i32, right: i32) -> Result<()> {
            self.commands.lock().push((left, right));
            if self.fail_turns && left != right {
                return Err(Error::MotionTimeout {
                    what: "turn",
                    waited_ms: 0,
                });
            }
            Ok(())
        }
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.scan.step_deg = 90;
        config.scan.return_sweep = false;
        config.scan.settle_ms = 0;
        config.scan.home_settle_ms = 0;
        config.navigation.inter_cycle_delay_ms = 0;
        config
    }

    fn cycle(config: &Config, fail_turns: bool) -> (NavigationCycle, Arc<Mutex<Vec<(i32, i32)>>>) {
        let commands = Arc::new(Mutex::new(Vec::new()));
        let scanner = ScanCycle::new(config.scan.clone(), Box::new(Fixed(1000)));
        let drive = Box::new(Recorder {
            commands: Arc::clone(&commands),
            fail_turns,
        });
        let map = Arc::new(SharedMap::new(config.map.capacity));
        let nav = NavigationCycle::new(config, scanner, drive, map).unwrap();
        (nav, commands)
    }

    #[test]
    fn test_step_conversion() {
        let (nav, _) = cycle(&Config::default(), false);
        assert_eq!(nav.turn_steps(180.0), 1024);
        assert_eq!(nav.turn_steps(0.0), 0);
        assert_eq!(nav.advance_steps(300.0), 2048);
    }

    #[test]
    fn test_straight_ahead_needs_no_turn() {
        // All readings tie at 1000 mm, the first (0°) wins
        let (mut nav, commands) = cycle(&config(), true);
        let report = nav.run_cycle().unwrap();
        assert_eq!(report.turn_deg, 0.0);
        assert!(report.turn_completed);
        assert_eq!(report.advance_mm, Some(900.0));
        assert!(report.advance_completed);
        assert_eq!(*commands.lock(), vec![(6144, 6144)]);
    }

    #[test]
    fn test_failed_turn_skips_advance() {
        let config = config();
        let commands = Arc::new(Mutex::new(Vec::new()));
        let scanner = ScanCycle::new(config.scan.clone(), Box::new(Farthest90 { index: 0 }));
        let drive = Box::new(Recorder {
            commands: Arc::clone(&commands),
            fail_turns: true,
        });
        let map = Arc::new(SharedMap::new(16));
        let mut nav = NavigationCycle::new(&config, scanner, drive, Arc::clone(&map)).unwrap();

        let report = nav.run_cycle().unwrap();
        assert_eq!(report.turn_deg, 90.0);
        assert!(!report.turn_completed);
        assert!(!report.advance_completed);
        assert_eq!(report.pose, Pose::origin());
        assert_eq!(map.pose(), Pose::origin());
        // Only the turn was attempted
        assert_eq!(commands.lock().len(), 1);
    }

    #[test]
    fn test_run_stops_at_max_cycles() {
        let mut config = config();
        config.navigation.max_cycles = Some(3);
        let (mut nav, _) = cycle(&config, false);
        let running = AtomicBool::new(true);
        assert_eq!(nav.run(&running), 3);
        assert_eq!(nav.map().cycle_count(), 3);
        assert_eq!(nav.map().phase(), NavPhase::Idle);
    }

    #[test]
    fn test_run_returns_immediately_when_stopped() {
        let (mut nav, commands) = cycle(&config(), false);
        let running = AtomicBool::new(false);
        assert_eq!(nav.run(&running), 0);
        assert!(commands.lock().is_empty());
    }

    struct StillMount;

    impl SweepActuator for StillMount {
        fn move_to(&mut self, _angle_deg: f32) -> Result<()> {
            Ok(())
        }

        fn position_deg(&self) -> f32 {
            0.0
        }
    }

    #[test]
    fn test_spin_rejects_sweep_mount() {
        let mut config = config();
        config.navigation.mode = NavigationMode::Spin;
        let scanner =
            ScanCycle::new(config.scan.clone(), Box::new(Fixed(1000))).with_sweep(Box::new(StillMount));
        let drive = Box::new(Recorder {
            commands: Arc::new(Mutex::new(Vec::new())),
            fail_turns: false,
        });
        let map = Arc::new(SharedMap::new(16));
        let result = NavigationCycle::new(&config, scanner, drive, map);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_spin_increments_add_up_to_one_turn() {
        let mut config = config();
        config.scan.step_deg = 7;
        config.navigation.mode = NavigationMode::Spin;
        let (mut nav, commands) = cycle(&config, false);
        let report = nav.run_cycle().unwrap();

        // 0, 7, .., 357 read; the spin ends with a 3° increment
        assert_eq!(report.scan.samples.len(), 52);
        let spin: i32 = commands.lock()[..52].iter().map(|&(_, right)| right).sum();
        assert_eq!(spin, nav.turn_steps(360.0));
    }

    #[test]
    fn test_failed_spin_credits_completed_increments() {
        let mut config = config();
        config.navigation.mode = NavigationMode::Spin;
        let (mut nav, commands) = cycle(&config, true);
        let report = nav.run_cycle().unwrap();

        // The first increment fails: one reading at 0°, no heading change
        assert_eq!(report.scan.samples.len(), 1);
        assert_eq!(commands.lock()[0], (-512, 512));
        assert_eq!(report.turn_deg, 0.0);
        assert_eq!(report.pose.heading_deg, 0.0);
    }
}
