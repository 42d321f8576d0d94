//! Per-interface handle for the AP daemon.
//!
//! Owns the command session (serialized by a mutex so callers observe
//! command/response atomicity) and the event-listener session, and exposes
//! one method per daemon operation. Multi-property operations defer the
//! configuration reload to a single trailing `RELOAD`.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::debug;

use crate::ieee80211::{
    AkmSuite, AuthenticationAlgorithm, CipherSuite, PreSharedKey, RadiusEndpoint, SaePassword,
    SecurityProtocol,
};
use crate::wpa::events::{WpaEventHandler, WpaEventListener};
use crate::wpa::parser::{BssConfiguration, HostapdStatus};
use crate::wpa::protocol::{
    self, AUTH_ALGS_SUPPORTED, NAS_IDENTIFIER_LENGTH, WpaAuthAlgs, WpaSecurityProtocols,
};
use crate::wpa::socket::ControlConnection;
use crate::wpa::{Result, WpaError};

/// Default command timeout for control-socket requests.
pub const COMMAND_TIMEOUT_DEFAULT: Duration = Duration::from_secs(2);

/// Whether a property write is followed by an immediate configuration reload
/// or leaves the reload to a later operation in the same batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnforceConfigurationChange {
    Now,
    Defer,
}

/// Handle to the AP daemon instance managing one interface.
pub struct Hostapd {
    interface_name: String,
    command: Mutex<ControlConnection>,
    command_timeout: Duration,
    events: Arc<WpaEventHandler>,
    own_ip_address: IpAddr,
}

impl Hostapd {
    /// Path of the daemon control socket for an interface.
    pub fn control_socket_path(control_dir: &Path, interface_name: &str) -> PathBuf {
        control_dir.join(interface_name)
    }

    /// Whether the daemon manages `interface_name`: its control socket
    /// exists. Connectability is verified by [`Hostapd::connect`].
    pub fn is_managing_interface(control_dir: &Path, interface_name: &str) -> bool {
        Self::control_socket_path(control_dir, interface_name).exists()
    }

    /// Connects the command and event sessions for `interface_name` and
    /// starts the event listener.
    pub async fn connect(
        interface_name: &str,
        control_dir: &Path,
        command_timeout: Duration,
    ) -> Result<Hostapd> {
        let command = ControlConnection::connect(interface_name, control_dir)?;
        let event_connection = ControlConnection::connect(interface_name, control_dir)?;

        let events = WpaEventHandler::new(interface_name);
        events.start(event_connection, command_timeout).await?;

        Ok(Hostapd {
            interface_name: interface_name.to_string(),
            command: Mutex::new(command),
            command_timeout,
            events,
            own_ip_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
        })
    }

    pub fn interface_name(&self) -> &str {
        &self.interface_name
    }

    /// The local IP address advertised to RADIUS servers via `own_ip_addr`.
    pub fn own_ip_address(&self) -> IpAddr {
        self.own_ip_address
    }

    /// Registers a listener on the daemon's unsolicited-event stream.
    pub fn register_event_listener(&self, listener: Weak<dyn WpaEventListener>) -> u64 {
        self.events.register(listener)
    }

    pub fn unregister_event_listener(&self, token: u64) {
        self.events.unregister(token)
    }

    /// Tears down the event listener. Safe to call multiple times.
    pub async fn close(&self) {
        self.events.stop().await;
    }

    async fn send_command(&self, payload: &str) -> Result<String> {
        let connection = self.command.lock().await;
        connection.request(payload, self.command_timeout).await
    }

    async fn send_checked(&self, payload: &str) -> Result<()> {
        let response = self.send_command(payload).await?;
        if !protocol::is_response_ok(&response) {
            return Err(WpaError::CommandFailed {
                command: payload.to_string(),
                response,
            });
        }
        Ok(())
    }

    /// Health check. The response must begin with `PONG`.
    pub async fn ping(&self) -> Result<()> {
        let response = self.send_command(protocol::CMD_PING).await?;
        if !response.starts_with(protocol::RESPONSE_PONG) {
            return Err(WpaError::Protocol(format!(
                "unexpected ping response '{response}'"
            )));
        }
        Ok(())
    }

    /// Reloads the daemon configuration, applying deferred property writes.
    pub async fn reload(&self) -> Result<()> {
        self.send_checked(protocol::CMD_RELOAD).await
    }

    /// Enables the interface. A `FAIL` response is cross-checked against the
    /// reported state: "already operational" counts as success.
    pub async fn enable(&self) -> Result<()> {
        match self.send_checked(protocol::CMD_ENABLE).await {
            Ok(()) => Ok(()),
            Err(original) => {
                let Ok(status) = self.status().await else {
                    return Err(original);
                };
                if status.state.is_operational() {
                    Ok(())
                } else {
                    Err(original)
                }
            }
        }
    }

    /// Disables the interface, with the symmetric cross-check to
    /// [`Hostapd::enable`].
    pub async fn disable(&self) -> Result<()> {
        match self.send_checked(protocol::CMD_DISABLE).await {
            Ok(()) => Ok(()),
            Err(original) => {
                let Ok(status) = self.status().await else {
                    return Err(original);
                };
                if !status.state.is_operational() {
                    Ok(())
                } else {
                    Err(original)
                }
            }
        }
    }

    /// Asks the daemon process to exit. Subsequent commands will fail.
    pub async fn terminate(&self) -> Result<()> {
        self.send_checked(protocol::CMD_TERMINATE).await
    }

    /// Fetches and parses the `STATUS` response.
    pub async fn status(&self) -> Result<HostapdStatus> {
        let response = self.send_command(protocol::CMD_STATUS).await?;
        HostapdStatus::parse(&response)
    }

    /// Fetches and parses the `GET_CONFIG` response.
    pub async fn get_configuration(&self) -> Result<BssConfiguration> {
        let response = self.send_command(protocol::CMD_GET_CONFIG).await?;
        BssConfiguration::parse(&response)
    }

    /// Reads a single property value. The payload is the raw value, or
    /// `FAIL` when the property is unknown or unset.
    pub async fn get_property(&self, name: &str) -> Result<String> {
        let command = format!("{} {name}", protocol::CMD_GET);
        let response = self.send_command(&command).await?;
        if protocol::is_response_fail(&response) {
            return Err(WpaError::CommandFailed { command, response });
        }
        Ok(response)
    }

    /// Writes a single property, optionally reloading the configuration to
    /// enforce it immediately.
    pub async fn set_property(
        &self,
        name: &str,
        value: &str,
        enforce: EnforceConfigurationChange,
    ) -> Result<()> {
        debug!(
            interface = %self.interface_name,
            property = name,
            value,
            "setting daemon property"
        );

        let command = format!("{} {name} {value}", protocol::CMD_SET);
        let response = self.send_command(&command).await?;
        if !protocol::is_response_ok(&response) {
            return Err(WpaError::PropertyRejected {
                property: name.to_string(),
                value: value.to_string(),
                response,
            });
        }

        if enforce == EnforceConfigurationChange::Now {
            self.reload().await?;
        }
        Ok(())
    }

    pub async fn set_ssid(&self, ssid: &str, enforce: EnforceConfigurationChange) -> Result<()> {
        self.set_property(protocol::PROP_SSID, ssid, enforce).await
    }

    /// OR-combines the authentication algorithms into the `auth_algs`
    /// bitmask. Values outside the daemon-supported mask are rejected before
    /// any traffic.
    pub async fn set_authentication_algorithms(
        &self,
        algorithms: &[AuthenticationAlgorithm],
        enforce: EnforceConfigurationChange,
    ) -> Result<()> {
        if algorithms.is_empty() {
            return Err(WpaError::InvalidParameter(
                "no authentication algorithms provided".into(),
            ));
        }

        let mut combined = WpaAuthAlgs::empty();
        for algorithm in algorithms {
            let bits = WpaAuthAlgs::from_algorithm(*algorithm);
            if bits.is_empty() || !AUTH_ALGS_SUPPORTED.contains(bits) {
                return Err(WpaError::InvalidParameter(format!(
                    "authentication algorithm {algorithm:?} not supported by daemon"
                )));
            }
            combined |= bits;
        }
        combined &= AUTH_ALGS_SUPPORTED;

        self.set_property(
            protocol::PROP_AUTH_ALGS,
            &combined.bits().to_string(),
            enforce,
        )
        .await
    }

    /// OR-combines security protocols into the `wpa` bitmask.
    pub async fn set_security_protocols(
        &self,
        protocols: &[SecurityProtocol],
        enforce: EnforceConfigurationChange,
    ) -> Result<()> {
        if protocols.is_empty() {
            return Err(WpaError::InvalidParameter(
                "no security protocols provided".into(),
            ));
        }

        let mut combined = WpaSecurityProtocols::empty();
        for protocol_value in protocols {
            combined |= WpaSecurityProtocols::from_protocol(*protocol_value);
        }

        self.set_property(protocol::PROP_WPA, &combined.bits().to_string(), enforce)
            .await
    }

    /// Writes `wpa_key_mgmt` as a space-separated symbolic list. Side
    /// effects applied first: a fresh NAS identifier when any suite is in
    /// the fast-transition family, and `ieee8021x=1` when any suite is in
    /// the IEEE 802.1X family.
    pub async fn set_key_management(
        &self,
        akm_suites: &[AkmSuite],
        enforce: EnforceConfigurationChange,
    ) -> Result<()> {
        if akm_suites.is_empty() {
            return Err(WpaError::InvalidParameter("no AKM suites provided".into()));
        }

        let mut values = Vec::with_capacity(akm_suites.len());
        for akm in akm_suites {
            let value = protocol::akm_suite_property_value(*akm).ok_or_else(|| {
                WpaError::InvalidParameter(format!("AKM suite {akm:?} not supported by daemon"))
            })?;
            values.push(value);
        }

        if akm_suites
            .iter()
            .any(|akm| protocol::is_akm_suite_fast_transition(*akm))
        {
            self.set_network_access_server_id(&protocol::generate_nas_identifier(
                NAS_IDENTIFIER_LENGTH,
            ))
            .await?;
        }

        if akm_suites
            .iter()
            .any(|akm| protocol::is_akm_suite_ieee8021x(*akm))
        {
            self.set_property(
                protocol::PROP_IEEE8021X,
                protocol::PROP_VALUE_ENABLED,
                EnforceConfigurationChange::Defer,
            )
            .await?;
        }

        self.set_property(protocol::PROP_WPA_KEY_MGMT, &values.join(" "), enforce)
            .await
    }

    /// Writes the pairwise cipher list for each security protocol in the
    /// map (`wpa_pairwise` or `rsn_pairwise`), reloading once at the end.
    pub async fn set_pairwise_cipher_suites(
        &self,
        suites: &HashMap<SecurityProtocol, Vec<CipherSuite>>,
        enforce: EnforceConfigurationChange,
    ) -> Result<()> {
        if suites.is_empty() {
            return Err(WpaError::InvalidParameter(
                "no pairwise cipher suites provided".into(),
            ));
        }

        for (security_protocol, ciphers) in suites {
            if ciphers.is_empty() {
                return Err(WpaError::InvalidParameter(format!(
                    "no cipher suites provided for {security_protocol}"
                )));
            }

            let mut values = Vec::with_capacity(ciphers.len());
            for cipher in ciphers {
                let value = protocol::cipher_suite_property_value(*cipher).ok_or_else(|| {
                    WpaError::InvalidParameter(format!(
                        "cipher suite {cipher:?} not supported by daemon"
                    ))
                })?;
                values.push(value);
            }

            self.set_property(
                protocol::cipher_property_name(*security_protocol),
                &values.join(" "),
                EnforceConfigurationChange::Defer,
            )
            .await?;
        }

        if enforce == EnforceConfigurationChange::Now {
            self.reload().await?;
        }
        Ok(())
    }

    /// Writes a pre-shared key under `wpa_passphrase` or `wpa_psk`.
    pub async fn set_pre_shared_key(
        &self,
        psk: &PreSharedKey,
        enforce: EnforceConfigurationChange,
    ) -> Result<()> {
        let (name, value) = protocol::psk_property(psk).map_err(WpaError::InvalidParameter)?;
        self.set_property(name, &value, enforce).await
    }

    /// Replaces the stored SAE passwords: a clear sentinel first, then one
    /// write per entry, then a single reload if requested.
    pub async fn set_sae_passwords(
        &self,
        passwords: &[SaePassword],
        enforce: EnforceConfigurationChange,
    ) -> Result<()> {
        self.set_property(
            protocol::PROP_SAE_PASSWORD,
            protocol::SAE_PASSWORD_CLEAR_ALL,
            EnforceConfigurationChange::Defer,
        )
        .await?;

        for password in passwords {
            self.set_property(
                protocol::PROP_SAE_PASSWORD,
                &protocol::sae_password_property_value(password),
                EnforceConfigurationChange::Defer,
            )
            .await?;
        }

        if enforce == EnforceConfigurationChange::Now {
            self.reload().await?;
        }
        Ok(())
    }

    pub async fn set_bridge_interface(
        &self,
        bridge: &str,
        enforce: EnforceConfigurationChange,
    ) -> Result<()> {
        self.set_property(protocol::PROP_BRIDGE, bridge, enforce).await
    }

    /// Writes address, shared secret and (when present) port for each RADIUS
    /// endpoint, deferring the reload to the caller's batch.
    pub async fn add_radius_endpoints(
        &self,
        endpoints: &[RadiusEndpoint],
        enforce: EnforceConfigurationChange,
    ) -> Result<()> {
        for endpoint in endpoints {
            if endpoint.shared_secret.is_empty() {
                return Err(WpaError::InvalidParameter(
                    "RADIUS endpoint shared secret is empty".into(),
                ));
            }

            let (address_property, port_property, secret_property) =
                protocol::radius_endpoint_property_names(endpoint.endpoint_type);

            self.set_property(
                address_property,
                &endpoint.address.to_string(),
                EnforceConfigurationChange::Defer,
            )
            .await?;
            self.set_property(
                secret_property,
                &endpoint.shared_secret,
                EnforceConfigurationChange::Defer,
            )
            .await?;
            if let Some(port) = endpoint.port {
                self.set_property(
                    port_property,
                    &port.to_string(),
                    EnforceConfigurationChange::Defer,
                )
                .await?;
            }
        }

        if enforce == EnforceConfigurationChange::Now {
            self.reload().await?;
        }
        Ok(())
    }

    /// Sets the NAS identifier used in RADIUS messages. No reload: the value
    /// takes effect with the key-management change it accompanies.
    pub async fn set_network_access_server_id(&self, nas_identifier: &str) -> Result<()> {
        self.set_property(
            protocol::PROP_NAS_IDENTIFIER,
            nas_identifier,
            EnforceConfigurationChange::Defer,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wpa::testing::{FakeDaemon, status_payload};

    #[tokio::test]
    async fn ping_accepts_pong_only() {
        let daemon = FakeDaemon::spawn(|command| match command {
            "PING" => "PONG\n".to_string(),
            _ => "FAIL\n".to_string(),
        });
        let hostapd = daemon.client().await;
        hostapd.ping().await.unwrap();
        hostapd.close().await;
    }

    #[tokio::test]
    async fn ping_rejects_unexpected_payload() {
        let daemon = FakeDaemon::spawn(|_| "NOPE\n".to_string());
        let hostapd = daemon.client().await;
        assert!(matches!(hostapd.ping().await, Err(WpaError::Protocol(_))));
        hostapd.close().await;
    }

    #[tokio::test]
    async fn set_property_now_issues_reload() {
        let daemon = FakeDaemon::spawn(|_| "OK\n".to_string());
        let hostapd = daemon.client().await;
        hostapd
            .set_ssid("lab-ap", EnforceConfigurationChange::Now)
            .await
            .unwrap();
        hostapd.close().await;
        assert_eq!(daemon.commands(), vec!["SET ssid lab-ap", "RELOAD"]);
    }

    #[tokio::test]
    async fn set_property_defer_skips_reload() {
        let daemon = FakeDaemon::spawn(|_| "OK\n".to_string());
        let hostapd = daemon.client().await;
        hostapd
            .set_ssid("lab-ap", EnforceConfigurationChange::Defer)
            .await
            .unwrap();
        hostapd.close().await;
        assert_eq!(daemon.commands(), vec!["SET ssid lab-ap"]);
    }

    #[tokio::test]
    async fn rejected_set_carries_property_and_value() {
        let daemon = FakeDaemon::spawn(|command| {
            if command.starts_with("SET") {
                "FAIL\n".to_string()
            } else {
                "OK\n".to_string()
            }
        });
        let hostapd = daemon.client().await;
        let error = hostapd
            .set_ssid("lab-ap", EnforceConfigurationChange::Now)
            .await
            .unwrap_err();
        match error {
            WpaError::PropertyRejected { property, value, .. } => {
                assert_eq!(property, "ssid");
                assert_eq!(value, "lab-ap");
            }
            other => panic!("unexpected error {other:?}"),
        }
        hostapd.close().await;
    }

    #[tokio::test]
    async fn enable_fail_with_operational_state_is_success() {
        let daemon = FakeDaemon::spawn(|command| match command {
            "ENABLE" => "FAIL\n".to_string(),
            "STATUS" => status_payload("ENABLED"),
            _ => "OK\n".to_string(),
        });
        let hostapd = daemon.client().await;
        hostapd.enable().await.unwrap();
        hostapd.close().await;
    }

    #[tokio::test]
    async fn enable_fail_with_disabled_state_is_error() {
        let daemon = FakeDaemon::spawn(|command| match command {
            "ENABLE" => "FAIL\n".to_string(),
            "STATUS" => status_payload("DISABLED"),
            _ => "OK\n".to_string(),
        });
        let hostapd = daemon.client().await;
        assert!(matches!(
            hostapd.enable().await,
            Err(WpaError::CommandFailed { .. })
        ));
        hostapd.close().await;
    }

    #[tokio::test]
    async fn disable_fail_with_disabled_state_is_success() {
        let daemon = FakeDaemon::spawn(|command| match command {
            "DISABLE" => "FAIL\n".to_string(),
            "STATUS" => status_payload("DISABLED"),
            _ => "OK\n".to_string(),
        });
        let hostapd = daemon.client().await;
        hostapd.disable().await.unwrap();
        hostapd.close().await;
    }

    #[tokio::test]
    async fn get_property_returns_raw_value_or_fails() {
        let daemon = FakeDaemon::spawn(|command| match command {
            "GET version" => "2.10-hostap_2_10\n".to_string(),
            _ => "FAIL\n".to_string(),
        });
        let hostapd = daemon.client().await;
        assert_eq!(
            hostapd.get_property("version").await.unwrap(),
            "2.10-hostap_2_10"
        );
        assert!(matches!(
            hostapd.get_property("bogus").await,
            Err(WpaError::CommandFailed { .. })
        ));
        hostapd.close().await;
    }

    #[tokio::test]
    async fn terminate_requires_ok() {
        let daemon = FakeDaemon::spawn(|command| match command {
            "TERMINATE" => "OK\n".to_string(),
            _ => "FAIL\n".to_string(),
        });
        let hostapd = daemon.client().await;
        hostapd.terminate().await.unwrap();
        hostapd.close().await;
    }

    #[tokio::test]
    async fn auth_algs_are_or_combined() {
        let daemon = FakeDaemon::spawn(|_| "OK\n".to_string());
        let hostapd = daemon.client().await;
        hostapd
            .set_authentication_algorithms(
                &[
                    AuthenticationAlgorithm::OpenSystem,
                    AuthenticationAlgorithm::SharedKey,
                ],
                EnforceConfigurationChange::Now,
            )
            .await
            .unwrap();
        hostapd.close().await;
        assert_eq!(daemon.commands(), vec!["SET auth_algs 3", "RELOAD"]);
    }

    #[tokio::test]
    async fn auth_algs_outside_mask_are_rejected_before_traffic() {
        let daemon = FakeDaemon::spawn(|_| "OK\n".to_string());
        let hostapd = daemon.client().await;
        let result = hostapd
            .set_authentication_algorithms(
                &[AuthenticationAlgorithm::Sae],
                EnforceConfigurationChange::Now,
            )
            .await;
        assert!(matches!(result, Err(WpaError::InvalidParameter(_))));
        hostapd.close().await;
        assert!(daemon.commands().is_empty());
    }

    #[tokio::test]
    async fn ft_key_management_sets_nas_identifier_first() {
        let daemon = FakeDaemon::spawn(|_| "OK\n".to_string());
        let hostapd = daemon.client().await;
        hostapd
            .set_key_management(&[AkmSuite::FtPsk], EnforceConfigurationChange::Now)
            .await
            .unwrap();
        hostapd.close().await;

        let commands = daemon.commands();
        assert_eq!(commands.len(), 3);
        assert!(commands[0].starts_with("SET nas_identifier "));
        let nas_identifier = commands[0].rsplit(' ').next().unwrap();
        assert_eq!(nas_identifier.len(), NAS_IDENTIFIER_LENGTH);
        assert_eq!(commands[1], "SET wpa_key_mgmt FT-PSK");
        assert_eq!(commands[2], "RELOAD");
    }

    #[tokio::test]
    async fn dot1x_key_management_enables_ieee8021x_first() {
        let daemon = FakeDaemon::spawn(|_| "OK\n".to_string());
        let hostapd = daemon.client().await;
        hostapd
            .set_key_management(
                &[AkmSuite::Ieee8021xSha256],
                EnforceConfigurationChange::Now,
            )
            .await
            .unwrap();
        hostapd.close().await;

        let commands = daemon.commands();
        assert_eq!(
            commands,
            vec![
                "SET ieee8021x 1",
                "SET wpa_key_mgmt WPA-EAP-SHA256",
                "RELOAD"
            ]
        );
    }

    #[tokio::test]
    async fn sae_passwords_clear_then_set_each() {
        let daemon = FakeDaemon::spawn(|_| "OK\n".to_string());
        let hostapd = daemon.client().await;
        hostapd
            .set_sae_passwords(
                &[
                    SaePassword::new("first-password"),
                    SaePassword {
                        credential: "second-password".into(),
                        vlan_id: Some(2),
                        ..Default::default()
                    },
                ],
                EnforceConfigurationChange::Now,
            )
            .await
            .unwrap();
        hostapd.close().await;

        assert_eq!(
            daemon.commands(),
            vec![
                "SET sae_password ",
                "SET sae_password first-password",
                "SET sae_password second-password|vlanid=2",
                "RELOAD"
            ]
        );
    }

    #[tokio::test]
    async fn radius_endpoints_write_addr_secret_then_port() {
        use crate::ieee80211::{RadiusEndpoint, RadiusEndpointType};
        use std::net::{IpAddr, Ipv4Addr};

        let daemon = FakeDaemon::spawn(|_| "OK\n".to_string());
        let hostapd = daemon.client().await;
        hostapd
            .add_radius_endpoints(
                &[RadiusEndpoint {
                    endpoint_type: RadiusEndpointType::Authentication,
                    address: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
                    port: Some(1845),
                    shared_secret: "radius-secret".into(),
                }],
                EnforceConfigurationChange::Now,
            )
            .await
            .unwrap();
        hostapd.close().await;

        assert_eq!(
            daemon.commands(),
            vec![
                "SET auth_server_addr 10.0.0.1",
                "SET auth_server_shared_secret radius-secret",
                "SET auth_server_port 1845",
                "RELOAD"
            ]
        );
    }
}
