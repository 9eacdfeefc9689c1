//! WiFi bring-up and credential submission
//!
//! At boot every remembered network is tried in slot order. If none answers,
//! the robot opens its own access point so credentials can be submitted from
//! the status page. Submitted credentials are only persisted once they have
//! been shown to work.

use std::thread;
use std::time::Duration;

use crate::config::NetworkConfig;
use crate::credentials::CredentialStore;
use crate::error::Result;

/// Radio link operations
pub trait NetworkLink: Send {
    /// Start joining a network; completion is observed with [`is_connected`]
    ///
    /// [`is_connected`]: NetworkLink::is_connected
    fn begin(&mut self, ssid: &str, password: &str) -> Result<()>;

    fn is_connected(&self) -> bool;

    fn disconnect(&mut self);

    /// Host an access point
    fn start_access_point(&mut self, ssid: &str, password: &str) -> Result<()>;
}

/// How the robot is reachable
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkMode {
    /// Not brought up yet
    Down,
    /// Joined an existing network
    Client(String),
    /// Hosting its own access point
    AccessPoint(String),
}

pub struct NetworkManager {
    config: NetworkConfig,
    link: Box<dyn NetworkLink>,
    store: Box<dyn CredentialStore>,
    mode: NetworkMode,
}

impl NetworkManager {
    pub fn new(
        config: NetworkConfig,
        link: Box<dyn NetworkLink>,
        store: Box<dyn CredentialStore>,
    ) -> Self {
        Self {
            config,
            link,
            store,
            mode: NetworkMode::Down,
        }
    }

    pub fn mode(&self) -> &NetworkMode {
        &self.mode
    }

    /// Join a remembered network, or fall back to hosting the access point
    pub fn bring_up(&mut self) -> Result<&NetworkMode> {
        let remembered = self.store.read_credentials();
        log::info!("{} remembered network(s)", remembered.len());

        for creds in remembered {
            if self.try_join(&creds.ssid, &creds.password, self.config.boot_join_attempts) {
                log::info!("Joined remembered network '{}'", creds.ssid);
                self.mode = NetworkMode::Client(creds.ssid);
                return Ok(&self.mode);
            }
            log::info!("Remembered network '{}' not reachable", creds.ssid);
        }

        let ssid = self.config.ap_ssid.clone();
        self.link.start_access_point(&ssid, &self.config.ap_password)?;
        log::info!("Access point '{}' started", ssid);
        self.mode = NetworkMode::AccessPoint(ssid);
        Ok(&self.mode)
    }

    /// Try new credentials; persist them only if the link comes up.
    ///
    /// Returns whether the connection was established.
    pub fn submit_credentials(&mut self, ssid: &str, password: &str) -> Result<bool> {
        log::info!("Trying submitted network '{}'", ssid);
        if !self.try_join(ssid, password, self.config.submit_join_attempts) {
            log::warn!("Could not join '{}'", ssid);
            return Ok(false);
        }

        self.store.write_credentials(ssid, password)?;
        self.mode = NetworkMode::Client(ssid.to_string());
        Ok(true)
    }

    /// Disconnect, begin joining and poll the link up to `attempts` times
    fn try_join(&mut self, ssid: &str, password: &str, attempts: u32) -> bool {
        self.link.disconnect();
        if let Err(e) = self.link.begin(ssid, password) {
            log::warn!("Join of '{}' failed to start: {}", ssid, e);
            return false;
        }

        for _ in 0..attempts {
            if self.link.is_connected() {
                return true;
            }
            thread::sleep(Duration::from_millis(self.config.join_poll_ms));
        }
        self.link.is_connected()
    }
}
