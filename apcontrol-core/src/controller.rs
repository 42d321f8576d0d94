//! Access-point controller: translates one high-level operation into the
//! right sequence of daemon commands and returns a uniform status.
//!
//! Controllers never return `Err`; every failure is folded into the
//! [`OperationStatus`] of the operation that hit it. Partial property writes
//! are not rolled back: the daemon's state stays authoritative and callers
//! can read it back.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::Error;
use crate::ieee80211::{
    AkmSuite, AuthenticationAlgorithm, AuthenticationData, Capabilities, CipherSuite,
    FrequencyBand, OperationalState, PhyType, RadiusConfiguration, SecurityProtocol,
};
use crate::wpa::hostapd::{EnforceConfigurationChange, Hostapd};
use crate::wpa::protocol::{self, HwMode, ManagementFrameProtection};
use crate::wpa::WpaError;

/// Uniform status code for controller operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatusCode {
    Succeeded,
    InvalidAccessPoint,
    InvalidParameter,
    OperationNotSupported,
    AccessPointNotEnabled,
    InternalError,
}

impl fmt::Display for OperationStatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationStatusCode::Succeeded => "succeeded",
            OperationStatusCode::InvalidAccessPoint => "invalid access point",
            OperationStatusCode::InvalidParameter => "invalid parameter",
            OperationStatusCode::OperationNotSupported => "operation not supported",
            OperationStatusCode::AccessPointNotEnabled => "access point not enabled",
            OperationStatusCode::InternalError => "internal error",
        };
        f.write_str(name)
    }
}

/// Outcome of one controller operation, carrying the target interface and
/// the operation name for diagnostics.
#[derive(Debug, Clone)]
pub struct OperationStatus {
    pub interface_name: String,
    pub operation: String,
    pub code: OperationStatusCode,
    pub details: String,
}

impl OperationStatus {
    pub fn succeeded(interface_name: &str, operation: &str) -> OperationStatus {
        OperationStatus {
            interface_name: interface_name.to_string(),
            operation: operation.to_string(),
            code: OperationStatusCode::Succeeded,
            details: String::new(),
        }
    }

    pub fn failed(
        interface_name: &str,
        operation: &str,
        code: OperationStatusCode,
        details: impl Into<String>,
    ) -> OperationStatus {
        OperationStatus {
            interface_name: interface_name.to_string(),
            operation: operation.to_string(),
            code,
            details: details.into(),
        }
    }

    pub fn is_succeeded(&self) -> bool {
        self.code == OperationStatusCode::Succeeded
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.interface_name, self.operation, self.code)?;
        if !self.details.is_empty() {
            write!(f, " ({})", self.details)?;
        }
        Ok(())
    }
}

/// One method per configurable dimension of an access point.
#[async_trait]
pub trait AccessPointController: Send + Sync {
    async fn get_capabilities(&self) -> (OperationStatus, Option<Capabilities>);

    async fn get_operational_state(&self) -> (OperationStatus, Option<OperationalState>);

    async fn set_operational_state(&self, state: OperationalState) -> OperationStatus;

    async fn set_phy_type(&self, phy_type: PhyType) -> OperationStatus;

    async fn set_frequency_bands(&self, bands: &[FrequencyBand]) -> OperationStatus;

    async fn set_ssid(&self, ssid: &str) -> OperationStatus;

    async fn set_network_bridge(&self, bridge: &str) -> OperationStatus;

    async fn set_authentication_algorithms(
        &self,
        algorithms: &[AuthenticationAlgorithm],
    ) -> OperationStatus;

    async fn set_authentication_data(&self, data: &AuthenticationData) -> OperationStatus;

    async fn set_akm_suites(&self, akm_suites: &[AkmSuite]) -> OperationStatus;

    async fn set_pairwise_cipher_suites(
        &self,
        suites: &HashMap<SecurityProtocol, Vec<CipherSuite>>,
    ) -> OperationStatus;

    async fn set_radius_configuration(&self, configuration: &RadiusConfiguration)
    -> OperationStatus;
}

/// Creates controllers for access points. Construction failing is how the
/// manager decides an interface is not controllable.
#[async_trait]
pub trait ControllerFactory: Send + Sync {
    async fn create_controller(
        &self,
        interface_name: &str,
        capabilities: &Capabilities,
    ) -> Result<Box<dyn AccessPointController>, Error>;
}

/// Controller backed by the AP daemon's control socket.
pub struct HostapdController {
    interface_name: String,
    capabilities: Capabilities,
    hostapd: Hostapd,
}

impl HostapdController {
    fn status_code_for(error: &WpaError) -> OperationStatusCode {
        match error {
            WpaError::InvalidParameter(_) => OperationStatusCode::InvalidParameter,
            _ => OperationStatusCode::InternalError,
        }
    }

    fn failure(&self, operation: &str, error: &WpaError) -> OperationStatus {
        OperationStatus::failed(
            &self.interface_name,
            operation,
            Self::status_code_for(error),
            error.to_string(),
        )
    }
}

#[async_trait]
impl AccessPointController for HostapdController {
    async fn get_capabilities(&self) -> (OperationStatus, Option<Capabilities>) {
        (
            OperationStatus::succeeded(&self.interface_name, "get_capabilities"),
            Some(self.capabilities.clone()),
        )
    }

    async fn get_operational_state(&self) -> (OperationStatus, Option<OperationalState>) {
        const OPERATION: &str = "get_operational_state";

        match self.hostapd.status().await {
            Ok(status) => {
                let state = if status.state == protocol::InterfaceState::Enabled {
                    OperationalState::Enabled
                } else {
                    OperationalState::Disabled
                };
                (
                    OperationStatus::succeeded(&self.interface_name, OPERATION),
                    Some(state),
                )
            }
            Err(error) => (self.failure(OPERATION, &error), None),
        }
    }

    async fn set_operational_state(&self, state: OperationalState) -> OperationStatus {
        const OPERATION: &str = "set_operational_state";

        let result = match state {
            OperationalState::Enabled => self.hostapd.enable().await,
            OperationalState::Disabled => self.hostapd.disable().await,
        };
        if let Err(error) = result {
            return self.failure(OPERATION, &error);
        }

        // Confirm the daemon landed in the requested state; the outcome is
        // logged but does not change the operation status.
        let (verify_status, observed) = self.get_operational_state().await;
        if verify_status.is_succeeded() && observed == Some(state) {
            info!(
                interface = %self.interface_name,
                state = ?state,
                "operational state changed"
            );
        }

        OperationStatus::succeeded(&self.interface_name, OPERATION)
    }

    async fn set_phy_type(&self, phy_type: PhyType) -> OperationStatus {
        const OPERATION: &str = "set_phy_type";

        let Some(hw_mode) = HwMode::from_phy_type(phy_type) else {
            return OperationStatus::failed(
                &self.interface_name,
                OPERATION,
                OperationStatusCode::InvalidParameter,
                format!("invalid PHY type {phy_type}"),
            );
        };

        // hw_mode first, then the amendment flags: AX implies AC implies N.
        let mut properties: Vec<(&str, &str)> =
            vec![(protocol::PROP_HW_MODE, hw_mode.property_value())];
        if matches!(phy_type, PhyType::AX) {
            properties.push((protocol::PROP_IEEE80211AX, protocol::PROP_VALUE_ENABLED));
            properties.push((protocol::PROP_DISABLE_11AX, protocol::PROP_VALUE_DISABLED));
        }
        if matches!(phy_type, PhyType::AX | PhyType::AC) {
            properties.push((protocol::PROP_IEEE80211AC, protocol::PROP_VALUE_ENABLED));
            properties.push((protocol::PROP_DISABLE_11AC, protocol::PROP_VALUE_DISABLED));
        }
        if matches!(phy_type, PhyType::AX | PhyType::AC | PhyType::N) {
            properties.push((protocol::PROP_WMM_ENABLED, protocol::PROP_VALUE_ENABLED));
            properties.push((protocol::PROP_IEEE80211N, protocol::PROP_VALUE_ENABLED));
            properties.push((protocol::PROP_DISABLE_11N, protocol::PROP_VALUE_DISABLED));
        }

        for (name, value) in properties {
            if let Err(error) = self
                .hostapd
                .set_property(name, value, EnforceConfigurationChange::Defer)
                .await
            {
                return self.failure(OPERATION, &error);
            }
        }

        if let Err(error) = self.hostapd.reload().await {
            return self.failure(OPERATION, &error);
        }

        // The daemon only reports the N/AC/AX amendment flags, so the audit
        // covers those PHY types.
        if let Ok(status) = self.hostapd.status().await {
            let n_active = status.ieee80211n == 1 && status.disable_11n == 0;
            let ac_active = status.ieee80211ac == 1 && status.disable_11ac == 0;
            let ax_active = status.ieee80211ax == 1 && status.disable_11ax == 0;
            let consistent = match phy_type {
                PhyType::AX => ax_active && ac_active && n_active,
                PhyType::AC => ac_active && n_active,
                PhyType::N => n_active,
                _ => true,
            };
            if consistent {
                info!(
                    interface = %self.interface_name,
                    phy_type = %phy_type,
                    "PHY type applied"
                );
            } else {
                debug!(
                    interface = %self.interface_name,
                    phy_type = %phy_type,
                    "daemon state does not yet reflect requested PHY type"
                );
            }
        }

        OperationStatus::succeeded(&self.interface_name, OPERATION)
    }

    async fn set_frequency_bands(&self, bands: &[FrequencyBand]) -> OperationStatus {
        const OPERATION: &str = "set_frequency_bands";

        if bands.is_empty() {
            return OperationStatus::failed(
                &self.interface_name,
                OPERATION,
                OperationStatusCode::InvalidParameter,
                "no frequency bands specified",
            );
        }

        let mut values = Vec::with_capacity(bands.len());
        for band in bands {
            let Some(value) = protocol::band_property_value(*band) else {
                return OperationStatus::failed(
                    &self.interface_name,
                    OPERATION,
                    OperationStatusCode::InvalidParameter,
                    format!("invalid frequency band {band}"),
                );
            };
            if !self.capabilities.frequency_bands.contains(band) {
                return OperationStatus::failed(
                    &self.interface_name,
                    OPERATION,
                    OperationStatusCode::OperationNotSupported,
                    format!("frequency band {band} not supported by this radio"),
                );
            }
            values.push(value);
        }

        // Band changes take effect without a configuration reload.
        if let Err(error) = self
            .hostapd
            .set_property(
                protocol::PROP_SET_BAND,
                &values.join(","),
                EnforceConfigurationChange::Defer,
            )
            .await
        {
            return self.failure(OPERATION, &error);
        }

        // 6 GHz operation mandates protected management frames.
        if bands.contains(&FrequencyBand::SixGhz) {
            if let Err(error) = self
                .hostapd
                .set_property(
                    protocol::PROP_IEEE80211W,
                    ManagementFrameProtection::Required.property_value(),
                    EnforceConfigurationChange::Defer,
                )
                .await
            {
                return self.failure(OPERATION, &error);
            }
        }

        OperationStatus::succeeded(&self.interface_name, OPERATION)
    }

    async fn set_ssid(&self, ssid: &str) -> OperationStatus {
        const OPERATION: &str = "set_ssid";

        if ssid.is_empty() {
            return OperationStatus::failed(
                &self.interface_name,
                OPERATION,
                OperationStatusCode::InvalidParameter,
                "empty SSID specified",
            );
        }
        if ssid.len() > 32 {
            return OperationStatus::failed(
                &self.interface_name,
                OPERATION,
                OperationStatusCode::InvalidParameter,
                format!("SSID length {} exceeds 32 octets", ssid.len()),
            );
        }

        if let Err(error) = self
            .hostapd
            .set_ssid(ssid, EnforceConfigurationChange::Now)
            .await
        {
            return self.failure(OPERATION, &error);
        }

        match self.hostapd.get_configuration().await {
            Ok(configuration) if configuration.ssid == ssid => {
                info!(interface = %self.interface_name, ssid, "SSID applied");
            }
            Ok(configuration) => {
                debug!(
                    interface = %self.interface_name,
                    requested = ssid,
                    current = %configuration.ssid,
                    "daemon reports a different SSID"
                );
            }
            Err(error) => return self.failure(OPERATION, &error),
        }

        OperationStatus::succeeded(&self.interface_name, OPERATION)
    }

    async fn set_network_bridge(&self, bridge: &str) -> OperationStatus {
        const OPERATION: &str = "set_network_bridge";

        match self
            .hostapd
            .set_bridge_interface(bridge, EnforceConfigurationChange::Now)
            .await
        {
            Ok(()) => OperationStatus::succeeded(&self.interface_name, OPERATION),
            Err(error) => self.failure(OPERATION, &error),
        }
    }

    async fn set_authentication_algorithms(
        &self,
        algorithms: &[AuthenticationAlgorithm],
    ) -> OperationStatus {
        const OPERATION: &str = "set_authentication_algorithms";

        if algorithms.is_empty() {
            return OperationStatus::failed(
                &self.interface_name,
                OPERATION,
                OperationStatusCode::InvalidParameter,
                "no authentication algorithms specified",
            );
        }

        match self
            .hostapd
            .set_authentication_algorithms(algorithms, EnforceConfigurationChange::Now)
            .await
        {
            Ok(()) => OperationStatus::succeeded(&self.interface_name, OPERATION),
            Err(error) => self.failure(OPERATION, &error),
        }
    }

    async fn set_authentication_data(&self, data: &AuthenticationData) -> OperationStatus {
        const OPERATION: &str = "set_authentication_data";

        if data.psk.is_none() && data.sae_passwords.is_none() {
            return OperationStatus::failed(
                &self.interface_name,
                OPERATION,
                OperationStatusCode::InvalidParameter,
                "no authentication data specified",
            );
        }

        if let Some(psk) = &data.psk {
            if let Err(error) = self
                .hostapd
                .set_pre_shared_key(psk, EnforceConfigurationChange::Now)
                .await
            {
                return self.failure(OPERATION, &error);
            }
        }

        if let Some(passwords) = &data.sae_passwords {
            if let Err(error) = self
                .hostapd
                .set_sae_passwords(passwords, EnforceConfigurationChange::Now)
                .await
            {
                return self.failure(OPERATION, &error);
            }
        }

        OperationStatus::succeeded(&self.interface_name, OPERATION)
    }

    async fn set_akm_suites(&self, akm_suites: &[AkmSuite]) -> OperationStatus {
        const OPERATION: &str = "set_akm_suites";

        if akm_suites.is_empty() {
            return OperationStatus::failed(
                &self.interface_name,
                OPERATION,
                OperationStatusCode::InvalidParameter,
                "no AKM suites specified",
            );
        }

        if let Err(error) = self
            .hostapd
            .set_key_management(akm_suites, EnforceConfigurationChange::Now)
            .await
        {
            return self.failure(OPERATION, &error);
        }

        match self.hostapd.get_configuration().await {
            Ok(configuration) if configuration.key_mgmt == akm_suites => {
                info!(interface = %self.interface_name, ?akm_suites, "AKM suites applied");
            }
            Ok(configuration) => {
                debug!(
                    interface = %self.interface_name,
                    requested = ?akm_suites,
                    current = ?configuration.key_mgmt,
                    "daemon reports different AKM suites"
                );
            }
            Err(error) => return self.failure(OPERATION, &error),
        }

        OperationStatus::succeeded(&self.interface_name, OPERATION)
    }

    async fn set_pairwise_cipher_suites(
        &self,
        suites: &HashMap<SecurityProtocol, Vec<CipherSuite>>,
    ) -> OperationStatus {
        const OPERATION: &str = "set_pairwise_cipher_suites";

        if suites.is_empty() {
            return OperationStatus::failed(
                &self.interface_name,
                OPERATION,
                OperationStatusCode::InvalidParameter,
                "no pairwise cipher suites specified",
            );
        }

        // The security-protocol set is implied by the map keys; write the
        // `wpa` bitmask before the per-protocol cipher lists.
        let protocols: Vec<SecurityProtocol> = suites.keys().copied().collect();
        if let Err(error) = self
            .hostapd
            .set_security_protocols(&protocols, EnforceConfigurationChange::Defer)
            .await
        {
            return self.failure(OPERATION, &error);
        }

        match self
            .hostapd
            .set_pairwise_cipher_suites(suites, EnforceConfigurationChange::Now)
            .await
        {
            Ok(()) => OperationStatus::succeeded(&self.interface_name, OPERATION),
            Err(error) => self.failure(OPERATION, &error),
        }
    }

    async fn set_radius_configuration(
        &self,
        configuration: &RadiusConfiguration,
    ) -> OperationStatus {
        const OPERATION: &str = "set_radius_configuration";

        let mut endpoints = Vec::with_capacity(2 + configuration.fallback_servers.len());
        endpoints.push(configuration.authentication_server.clone());
        if let Some(accounting) = &configuration.accounting_server {
            endpoints.push(accounting.clone());
        }
        endpoints.extend(configuration.fallback_servers.iter().cloned());

        if let Err(error) = self
            .hostapd
            .add_radius_endpoints(&endpoints, EnforceConfigurationChange::Defer)
            .await
        {
            return self.failure(OPERATION, &error);
        }

        // External RADIUS implies the internal EAP server must be off, and
        // the daemon needs its own address for the NAS-IP attribute.
        if let Err(error) = self
            .hostapd
            .set_property(
                protocol::PROP_EAP_SERVER,
                protocol::PROP_VALUE_DISABLED,
                EnforceConfigurationChange::Defer,
            )
            .await
        {
            return self.failure(OPERATION, &error);
        }
        if let Err(error) = self
            .hostapd
            .set_property(
                protocol::PROP_OWN_IP_ADDR,
                &self.hostapd.own_ip_address().to_string(),
                EnforceConfigurationChange::Defer,
            )
            .await
        {
            return self.failure(OPERATION, &error);
        }

        if let Err(error) = self.hostapd.reload().await {
            return self.failure(OPERATION, &error);
        }

        OperationStatus::succeeded(&self.interface_name, OPERATION)
    }
}

/// Factory creating [`HostapdController`] instances. Creation fails when the
/// daemon does not manage the interface or does not answer a ping.
pub struct HostapdControllerFactory {
    control_dir: PathBuf,
    command_timeout: Duration,
}

impl HostapdControllerFactory {
    pub fn new(control_dir: PathBuf, command_timeout: Duration) -> HostapdControllerFactory {
        HostapdControllerFactory {
            control_dir,
            command_timeout,
        }
    }
}

#[async_trait]
impl ControllerFactory for HostapdControllerFactory {
    async fn create_controller(
        &self,
        interface_name: &str,
        capabilities: &Capabilities,
    ) -> Result<Box<dyn AccessPointController>, Error> {
        if !Hostapd::is_managing_interface(&self.control_dir, interface_name) {
            return Err(Error::NotControllable(interface_name.to_string()));
        }

        let hostapd =
            Hostapd::connect(interface_name, &self.control_dir, self.command_timeout).await?;
        if let Err(error) = hostapd.ping().await {
            hostapd.close().await;
            debug!(interface = interface_name, %error, "daemon did not answer ping");
            return Err(Error::NotControllable(interface_name.to_string()));
        }

        Ok(Box::new(HostapdController {
            interface_name: interface_name.to_string(),
            capabilities: capabilities.clone(),
            hostapd,
        }))
    }
}
