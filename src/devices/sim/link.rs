//! Simulated WiFi radio

use super::config::SimNetwork;
use crate::error::Result;
use crate::network::NetworkLink;

/// Joins any network listed as visible when the password matches
#[derive(Debug, Clone, Default)]
pub struct SimLink {
    visible: Vec<SimNetwork>,
    connected: Option<String>,
    access_point: Option<String>,
}

impl SimLink {
    pub fn new(visible: Vec<SimNetwork>) -> Self {
        Self {
            visible,
            connected: None,
            access_point: None,
        }
    }

    pub fn connected_ssid(&self) -> Option<&str> {
        self.connected.as_deref()
    }

    pub fn access_point(&self) -> Option<&str> {
        self.access_point.as_deref()
    }
}

impl NetworkLink for SimLink {
    fn begin(&mut self, ssid: &str, password: &str) -> Result<()> {
        self.connected = self
            .visible
            .iter()
            .find(|n| n.ssid == ssid && n.password == password)
            .map(|n| n.ssid.clone());
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.is_some()
    }

    fn disconnect(&mut self) {
        self.connected = None;
    }

    fn start_access_point(&mut self, ssid: &str, _password: &str) -> Result<()> {
        self.access_point = Some(ssid.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_requires_matching_password() {
        let mut link = SimLink::new(vec![SimNetwork {
            ssid: "lab".to_string(),
            password: "pw".to_string(),
        }]);
        link.begin("lab", "nope").unwrap();
        assert!(!link.is_connected());
        link.begin("lab", "pw").unwrap();
        assert_eq!(link.connected_ssid(), Some("lab"));
        link.disconnect();
        assert!(!link.is_connected());
    }

    #[test]
    fn test_access_point_is_hosted() {
        let mut link = SimLink::default();
        assert_eq!(link.access_point(), None);
        link.start_access_point("espgroup1", "12341243").unwrap();
        assert_eq!(link.access_point(), Some("espgroup1"));
        assert!(!link.is_connected());
    }
}
