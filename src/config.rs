//! Configuration loading for DishaNav
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration for the bench robot. The step calibration values are
//! measured per robot build and are expected to be overridden.

use crate::devices::sim::SimulationConfig;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub robot: RobotConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Drive calibration and body dimensions
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RobotConfig {
    /// Wheel steps for one degree of in-place rotation (28BYJ-48: 1024 steps per 180°)
    #[serde(default = "default_steps_per_degree")]
    pub steps_per_degree: f32,

    /// Wheel steps for one millimeter of forward travel (2048 steps per 300 mm)
    #[serde(default = "default_steps_per_mm")]
    pub steps_per_mm: f32,

    /// Clearance subtracted from the chosen travel distance (robot radius, mm)
    #[serde(default = "default_safety_margin_mm")]
    pub safety_margin_mm: f32,
}

/// Sweep parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanConfig {
    /// Angular increment between readings (degrees)
    #[serde(default = "default_step_deg")]
    pub step_deg: u16,

    /// Sweep back from 360° to 0° after the forward traversal
    #[serde(default = "default_true")]
    pub return_sweep: bool,

    /// Readings at or below this are treated as near-field noise (mm, 0 = off)
    #[serde(default = "default_min_range_mm")]
    pub min_range_mm: u16,

    /// Readings at or above this are treated as "nothing seen" (mm)
    #[serde(default = "default_max_range_mm")]
    pub max_range_mm: u16,

    /// Pause after each mount step before reading (ms)
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Pause after homing the mount before and after a sweep (ms)
    #[serde(default = "default_home_settle_ms")]
    pub home_settle_ms: u64,
}

/// How a sweep is physically produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationMode {
    /// Sensor mount steps through the sweep while the chassis stays still
    #[default]
    Stepped,
    /// Chassis spins 360° in place while the fixed sensor reads concurrently
    Spin,
}

/// Navigation cycle parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NavigationConfig {
    #[serde(default)]
    pub mode: NavigationMode,

    /// Pause after advancing before the next scan (ms)
    #[serde(default = "default_inter_cycle_delay_ms")]
    pub inter_cycle_delay_ms: u64,

    /// Stop after this many cycles (None = run until shutdown)
    #[serde(default)]
    pub max_cycles: Option<u64>,
}

/// Obstacle history
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MapConfig {
    /// Maximum retained obstacle points; oldest are evicted first
    #[serde(default = "default_map_capacity")]
    pub capacity: usize,
}

/// WiFi and status server
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    #[serde(default = "default_ap_ssid")]
    pub ap_ssid: String,

    #[serde(default = "default_ap_password")]
    pub ap_password: String,

    /// Status server bind address
    #[serde(default = "default_http_bind")]
    pub http_bind: String,

    /// Link polls per remembered network at boot
    #[serde(default = "default_boot_join_attempts")]
    pub boot_join_attempts: u32,

    /// Link polls after a credential submission
    #[serde(default = "default_submit_join_attempts")]
    pub submit_join_attempts: u32,

    /// Delay between link polls (ms)
    #[serde(default = "default_join_poll_ms")]
    pub join_poll_ms: u64,
}

/// Credential image location
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_credentials_path")]
    pub credentials_path: String,

    /// Size of the emulated EEPROM image (bytes)
    #[serde(default = "default_image_size")]
    pub image_size: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_steps_per_degree() -> f32 {
    1024.0 / 180.0
}
fn default_steps_per_mm() -> f32 {
    2048.0 / 300.0
}
fn default_safety_margin_mm() -> f32 {
    100.0
}
fn default_step_deg() -> u16 {
    5
}
fn default_true() -> bool {
    true
}
fn default_min_range_mm() -> u16 {
    30
}
fn default_max_range_mm() -> u16 {
    2000
}
fn default_settle_ms() -> u64 {
    10
}
fn default_home_settle_ms() -> u64 {
    200
}
fn default_inter_cycle_delay_ms() -> u64 {
    3000
}
fn default_map_capacity() -> usize {
    512
}
fn default_ap_ssid() -> String {
    "espgroup1".to_string()
}
fn default_ap_password() -> String {
    "12341243".to_string()
}
fn default_http_bind() -> String {
    "0.0.0.0:8080".to_string()
}
fn default_boot_join_attempts() -> u32 {
    5
}
fn default_submit_join_attempts() -> u32 {
    8
}
fn default_join_poll_ms() -> u64 {
    1000
}
fn default_credentials_path() -> String {
    "disha-credentials.bin".to_string()
}
fn default_image_size() -> usize {
    512
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            steps_per_degree: default_steps_per_degree(),
            steps_per_mm: default_steps_per_mm(),
            safety_margin_mm: default_safety_margin_mm(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            step_deg: default_step_deg(),
            return_sweep: true,
            min_range_mm: default_min_range_mm(),
            max_range_mm: default_max_range_mm(),
            settle_ms: default_settle_ms(),
            home_settle_ms: default_home_settle_ms(),
        }
    }
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            mode: NavigationMode::default(),
            inter_cycle_delay_ms: default_inter_cycle_delay_ms(),
            max_cycles: None,
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            capacity: default_map_capacity(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            ap_ssid: default_ap_ssid(),
            ap_password: default_ap_password(),
            http_bind: default_http_bind(),
            boot_join_attempts: default_boot_join_attempts(),
            submit_join_attempts: default_submit_join_attempts(),
            join_poll_ms: default_join_poll_ms(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            credentials_path: default_credentials_path(),
            image_size: default_image_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Reject values the navigation cycle cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.scan.step_deg == 0 || self.scan.step_deg > 360 {
            return Err(Error::Config(format!(
                "scan.step_deg must be in 1..=360, got {}",
                self.scan.step_deg
            )));
        }
        if self.scan.min_range_mm >= self.scan.max_range_mm {
            return Err(Error::Config(format!(
                "scan.min_range_mm ({}) must be below scan.max_range_mm ({})",
                self.scan.min_range_mm, self.scan.max_range_mm
            )));
        }
        if self.robot.steps_per_degree <= 0.0 || self.robot.steps_per_mm <= 0.0 {
            return Err(Error::Config(
                "robot step calibration must be positive".to_string(),
            ));
        }
        if self.map.capacity == 0 {
            return Err(Error::Config("map.capacity must be at least 1".to_string()));
        }
        Ok(())
    }
}
