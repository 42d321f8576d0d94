//! Service configuration, loaded from TOML.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::manager::PROBE_TIMEOUT_DEFAULT;
use crate::wpa::hostapd::COMMAND_TIMEOUT_DEFAULT;
use crate::{Error, Result};

/// Default location of the AP daemon's per-interface control sockets.
pub const CONTROL_SOCKET_DIR_DEFAULT: &str = "/var/run/hostapd";

/// Runtime configuration of the control service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Directory holding one control socket per managed interface.
    pub control_socket_dir: PathBuf,
    /// Upper bound for one command/response exchange with the daemon.
    pub command_timeout: Duration,
    /// Upper bound for the initial enumeration when registering an agent.
    pub probe_timeout: Duration,
    /// Static attribute bags attached to access points by interface name.
    pub static_attributes: HashMap<String, HashMap<String, String>>,
}

impl Default for ServiceConfig {
    fn default() -> ServiceConfig {
        ServiceConfig {
            control_socket_dir: PathBuf::from(CONTROL_SOCKET_DIR_DEFAULT),
            command_timeout: COMMAND_TIMEOUT_DEFAULT,
            probe_timeout: PROBE_TIMEOUT_DEFAULT,
            static_attributes: HashMap::new(),
        }
    }
}

#[derive(Deserialize)]
struct ServiceConfigFile {
    control_socket_dir: Option<PathBuf>,
    command_timeout_ms: Option<u64>,
    probe_timeout_ms: Option<u64>,
    #[serde(default)]
    access_points: HashMap<String, HashMap<String, String>>,
}

impl From<ServiceConfigFile> for ServiceConfig {
    fn from(file: ServiceConfigFile) -> ServiceConfig {
        let defaults = ServiceConfig::default();
        ServiceConfig {
            control_socket_dir: file.control_socket_dir.unwrap_or(defaults.control_socket_dir),
            command_timeout: file
                .command_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.command_timeout),
            probe_timeout: file
                .probe_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.probe_timeout),
            static_attributes: file.access_points,
        }
    }
}

/// Parses a service configuration from TOML; absent keys take defaults.
pub fn service_config_from_toml_str(raw: &str) -> Result<ServiceConfig> {
    let parsed: ServiceConfigFile =
        toml::from_str(raw).map_err(|e| Error::Config(e.to_string()))?;
    Ok(ServiceConfig::from(parsed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = service_config_from_toml_str("").unwrap();
        assert_eq!(
            config.control_socket_dir,
            PathBuf::from(CONTROL_SOCKET_DIR_DEFAULT)
        );
        assert_eq!(config.command_timeout, Duration::from_secs(2));
        assert_eq!(config.probe_timeout, Duration::from_secs(3));
        assert!(config.static_attributes.is_empty());
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = service_config_from_toml_str(
            r#"
            control_socket_dir = "/run/hostapd"
            command_timeout_ms = 500
            probe_timeout_ms = 1000

            [access_points.wlan0]
            site = "lab"
            rack = "b2"
            "#,
        )
        .unwrap();

        assert_eq!(config.control_socket_dir, PathBuf::from("/run/hostapd"));
        assert_eq!(config.command_timeout, Duration::from_millis(500));
        assert_eq!(config.probe_timeout, Duration::from_millis(1000));
        let wlan0 = &config.static_attributes["wlan0"];
        assert_eq!(wlan0["site"], "lab");
        assert_eq!(wlan0["rack"], "b2");
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let result = service_config_from_toml_str("control_socket_dir = [");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
