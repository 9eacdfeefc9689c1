//! Shared map state between the navigation cycle and the status server.
//!
//! The navigation thread is the only writer. The status server only reads,
//! through [`SharedMap::snapshot`], which copies pose, last reading and the
//! obstacle history under one lock so the reader never sees a count that
//! disagrees with the sequence it got.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use parking_lot::Mutex;
use serde::Serialize;

use crate::types::{LastReading, NavPhase, ObstaclePoint, Pose};

/// Consistent copy of the shared map, ready for serialization
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapSnapshot {
    pub pose: Pose,
    pub last_reading: Option<LastReading>,
    pub obstacles: Vec<ObstaclePoint>,
    pub obstacle_count: usize,
    pub capacity: usize,
    /// Obstacle points dropped to make room since boot
    pub evicted: u64,
    pub phase: NavPhase,
    pub cycle: u64,
}

#[derive(Debug)]
struct MapState {
    pose: Pose,
    last_reading: Option<LastReading>,
    /// Oldest first
    obstacles: VecDeque<ObstaclePoint>,
    evicted: u64,
}

/// Bounded obstacle history plus current pose
#[derive(Debug)]
pub struct SharedMap {
    state: Mutex<MapState>,
    capacity: usize,
    /// Current [`NavPhase`] as u8 (status only, lock-free)
    phase: AtomicU8,
    /// Completed navigation cycles
    cycle_count: AtomicU64,
}

impl SharedMap {
    /// Create an empty map holding at most `capacity` obstacle points.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Mutex::new(MapState {
                pose: Pose::origin(),
                last_reading: None,
                obstacles: VecDeque::with_capacity(capacity),
                evicted: 0,
            }),
            capacity,
            phase: AtomicU8::new(NavPhase::Idle as u8),
            cycle_count: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Publish a new pose
    pub fn set_pose(&self, pose: Pose) {
        self.state.lock().pose = pose;
    }

    pub fn pose(&self) -> Pose {
        self.state.lock().pose
    }

    /// Record the latest reading, valid or not
    pub fn record_reading(&self, reading: LastReading) {
        self.state.lock().last_reading = Some(reading);
    }

    /// Append an obstacle point, evicting the oldest when full.
    ///
    /// Returns true if an older point was evicted.
    pub fn push_obstacle(&self, point: ObstaclePoint) -> bool {
        let mut state = self.state.lock();
        let evicted = if state.obstacles.len() >= self.capacity {
            state.obstacles.pop_front();
            state.evicted += 1;
            true
        } else {
            false
        };
        state.obstacles.push_back(point);
        evicted
    }

    pub fn obstacle_count(&self) -> usize {
        self.state.lock().obstacles.len()
    }

    /// Copy the whole map under one lock
    pub fn snapshot(&self) -> MapSnapshot {
        let state = self.state.lock();
        let obstacles: Vec<ObstaclePoint> = state.obstacles.iter().copied().collect();
        MapSnapshot {
            pose: state.pose,
            last_reading: state.last_reading,
            obstacle_count: obstacles.len(),
            obstacles,
            capacity: self.capacity,
            evicted: state.evicted,
            phase: self.phase(),
            cycle: self.cycle_count(),
        }
    }

    pub fn set_phase(&self, phase: NavPhase) {
        self.phase.store(phase as u8, Ordering::Release);
    }

    pub fn phase(&self) -> NavPhase {
        NavPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    pub fn increment_cycle_count(&self) {
        self.cycle_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cycle_count(&self) -> u64 {
        self.cycle_count.load(Ordering::Relaxed)
    }
}
