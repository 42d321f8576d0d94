//! Wire-level protocol data for the AP daemon control socket: command
//! payloads, property names, value encodings and their inverses.
//!
//! Everything here is a pure value conversion; no I/O happens in this module.

use bitflags::bitflags;
use rand::Rng;
use rand::distributions::Alphanumeric;

use crate::ieee80211::{
    AkmSuite, AuthenticationAlgorithm, CipherSuite, FrequencyBand, PhyType, PreSharedKey,
    RadiusEndpointType, SaePassword, SecurityProtocol,
};

// Command payloads.
pub const CMD_PING: &str = "PING";
pub const CMD_ENABLE: &str = "ENABLE";
pub const CMD_DISABLE: &str = "DISABLE";
pub const CMD_RELOAD: &str = "RELOAD";
pub const CMD_TERMINATE: &str = "TERMINATE";
pub const CMD_STATUS: &str = "STATUS";
pub const CMD_GET_CONFIG: &str = "GET_CONFIG";
pub const CMD_GET: &str = "GET";
pub const CMD_SET: &str = "SET";
pub const CMD_ATTACH: &str = "ATTACH";
pub const CMD_DETACH: &str = "DETACH";

// Response payloads.
pub const RESPONSE_OK: &str = "OK";
pub const RESPONSE_FAIL: &str = "FAIL";
pub const RESPONSE_PONG: &str = "PONG";

// Property names for "SET" commands.
pub const PROP_SSID: &str = "ssid";
pub const PROP_HW_MODE: &str = "hw_mode";
pub const PROP_SET_BAND: &str = "setband";
pub const PROP_AUTH_ALGS: &str = "auth_algs";
pub const PROP_WPA: &str = "wpa";
pub const PROP_IEEE80211N: &str = "ieee80211n";
pub const PROP_DISABLE_11N: &str = "disable_11n";
pub const PROP_IEEE80211AC: &str = "ieee80211ac";
pub const PROP_DISABLE_11AC: &str = "disable_11ac";
pub const PROP_IEEE80211AX: &str = "ieee80211ax";
pub const PROP_DISABLE_11AX: &str = "disable_11ax";
pub const PROP_WMM_ENABLED: &str = "wmm_enabled";
pub const PROP_IEEE80211W: &str = "ieee80211w";
pub const PROP_BRIDGE: &str = "bridge";
pub const PROP_STATE: &str = "state";
pub const PROP_WPA_KEY_MGMT: &str = "wpa_key_mgmt";
pub const PROP_WPA_PAIRWISE: &str = "wpa_pairwise";
pub const PROP_RSN_PAIRWISE: &str = "rsn_pairwise";
pub const PROP_WPA_PASSPHRASE: &str = "wpa_passphrase";
pub const PROP_WPA_PSK: &str = "wpa_psk";
pub const PROP_SAE_PASSWORD: &str = "sae_password";
pub const PROP_IEEE8021X: &str = "ieee8021x";
pub const PROP_EAP_SERVER: &str = "eap_server";
pub const PROP_OWN_IP_ADDR: &str = "own_ip_addr";
pub const PROP_NAS_IDENTIFIER: &str = "nas_identifier";

// RADIUS endpoint properties, keyed by endpoint type.
pub const PROP_AUTH_SERVER_ADDR: &str = "auth_server_addr";
pub const PROP_AUTH_SERVER_PORT: &str = "auth_server_port";
pub const PROP_AUTH_SERVER_SHARED_SECRET: &str = "auth_server_shared_secret";
pub const PROP_ACCT_SERVER_ADDR: &str = "acct_server_addr";
pub const PROP_ACCT_SERVER_PORT: &str = "acct_server_port";
pub const PROP_ACCT_SERVER_SHARED_SECRET: &str = "acct_server_shared_secret";

// Response properties for "GET_CONFIG".
pub const PROP_BSSID: &str = "bssid";
pub const PROP_KEY_MGMT: &str = "key_mgmt";
pub const PROP_GROUP_CIPHER: &str = "group_cipher";
pub const PROP_RSN_PAIRWISE_CIPHER: &str = "rsn_pairwise_cipher";
pub const PROP_WPA_PAIRWISE_CIPHER: &str = "wpa_pairwise_cipher";

// Generic enabled/disabled property values.
pub const PROP_VALUE_ENABLED: &str = "1";
pub const PROP_VALUE_DISABLED: &str = "0";

/// Special `sae_password` value that clears all stored passwords.
pub const SAE_PASSWORD_CLEAR_ALL: &str = "";

/// Maximum control message size, matching the upper bound used by the
/// official daemon command-line clients.
pub const MESSAGE_SIZE_MAX: usize = 4096;

/// Length of the generated `nas_identifier` value.
pub const NAS_IDENTIFIER_LENGTH: usize = 48;

/// Whether a response payload indicates success.
pub fn is_response_ok(response: &str) -> bool {
    response.starts_with(RESPONSE_OK)
}

/// Whether a response payload indicates failure.
pub fn is_response_fail(response: &str) -> bool {
    response.starts_with(RESPONSE_FAIL)
}

bitflags! {
    /// Daemon encoding of initial authentication algorithms (`auth_algs`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WpaAuthAlgs: u32 {
        const OPEN_SYSTEM = 1 << 0;
        const SHARED_KEY  = 1 << 1;
        const LEAP        = 1 << 2;
        const FT          = 1 << 3;
        const SAE         = 1 << 4;
        const FILS        = 1 << 5;
        const FILS_SK_PFS = 1 << 6;
    }

    /// Daemon encoding of security protocols (`wpa`). WPA3 shares the RSN
    /// bit with WPA2; only key management distinguishes them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WpaSecurityProtocols: u32 {
        const WPA = 1 << 0;
        const RSN = 1 << 1;
    }
}

/// Bitmask of authentication algorithms the daemon accepts over the control
/// socket. Anything outside this mask is rejected before writing.
pub const AUTH_ALGS_SUPPORTED: WpaAuthAlgs =
    WpaAuthAlgs::OPEN_SYSTEM.union(WpaAuthAlgs::SHARED_KEY);

impl WpaAuthAlgs {
    pub fn from_algorithm(algorithm: AuthenticationAlgorithm) -> WpaAuthAlgs {
        match algorithm {
            AuthenticationAlgorithm::OpenSystem => WpaAuthAlgs::OPEN_SYSTEM,
            AuthenticationAlgorithm::SharedKey => WpaAuthAlgs::SHARED_KEY,
            AuthenticationAlgorithm::Leap => WpaAuthAlgs::LEAP,
            AuthenticationAlgorithm::FastTransition => WpaAuthAlgs::FT,
            AuthenticationAlgorithm::Sae => WpaAuthAlgs::SAE,
            AuthenticationAlgorithm::Fils => WpaAuthAlgs::FILS,
            AuthenticationAlgorithm::FilsSkPfs => WpaAuthAlgs::FILS_SK_PFS,
            AuthenticationAlgorithm::Unknown => WpaAuthAlgs::empty(),
        }
    }
}

impl WpaSecurityProtocols {
    pub fn from_protocol(protocol: SecurityProtocol) -> WpaSecurityProtocols {
        match protocol {
            SecurityProtocol::Wpa => WpaSecurityProtocols::WPA,
            SecurityProtocol::Wpa2 | SecurityProtocol::Wpa3 => WpaSecurityProtocols::RSN,
        }
    }
}

/// Interface state as reported under the `state` key of a `STATUS` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceState {
    Uninitialized,
    Disabled,
    Enabled,
    CountryUpdate,
    Acs,
    HtScan,
    Dfs,
    NoIr,
    Unknown,
}

impl InterfaceState {
    /// Parses a state string. Uses prefix matching to tolerate unparsed
    /// payload remainders after the state token.
    pub fn from_payload(state: &str) -> InterfaceState {
        if state.starts_with("UNINITIALIZED") {
            InterfaceState::Uninitialized
        } else if state.starts_with("DISABLED") {
            InterfaceState::Disabled
        } else if state.starts_with("ENABLED") {
            InterfaceState::Enabled
        } else if state.starts_with("COUNTRY_UPDATE") {
            InterfaceState::CountryUpdate
        } else if state.starts_with("ACS") {
            InterfaceState::Acs
        } else if state.starts_with("HT_SCAN") {
            InterfaceState::HtScan
        } else if state.starts_with("DFS") {
            InterfaceState::Dfs
        } else if state.starts_with("NO_IR") {
            InterfaceState::NoIr
        } else {
            InterfaceState::Unknown
        }
    }

    /// Whether the state describes an operational interface. Transitional
    /// states (ACS, DFS scan, etc.) count as operational.
    pub fn is_operational(self) -> bool {
        !matches!(
            self,
            InterfaceState::Uninitialized | InterfaceState::Disabled | InterfaceState::Unknown
        )
    }
}

/// `hw_mode` property values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwMode {
    B,
    G,
    A,
    Ad,
    Any,
}

impl HwMode {
    pub fn property_value(self) -> &'static str {
        match self {
            HwMode::B => "b",
            HwMode::G => "g",
            HwMode::A => "a",
            HwMode::Ad => "ad",
            HwMode::Any => "any",
        }
    }

    /// The base `hw_mode` selected for a PHY type. Higher generations ride on
    /// mode `a` and enable their amendment flags separately.
    pub fn from_phy_type(phy_type: PhyType) -> Option<HwMode> {
        match phy_type {
            PhyType::B => Some(HwMode::B),
            PhyType::G => Some(HwMode::G),
            PhyType::AD => Some(HwMode::Ad),
            PhyType::A | PhyType::N | PhyType::AC | PhyType::AX | PhyType::BE => Some(HwMode::A),
            PhyType::Unknown => None,
        }
    }
}

/// Management-frame protection levels for the `ieee80211w` property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagementFrameProtection {
    None,
    Optional,
    Required,
}

impl ManagementFrameProtection {
    pub fn property_value(self) -> &'static str {
        match self {
            ManagementFrameProtection::None => "0",
            ManagementFrameProtection::Optional => "1",
            ManagementFrameProtection::Required => "2",
        }
    }
}

/// `setband` value for a frequency band.
pub fn band_property_value(band: FrequencyBand) -> Option<&'static str> {
    match band {
        FrequencyBand::TwoPointFourGhz => Some("2G"),
        FrequencyBand::FiveGhz => Some("5G"),
        FrequencyBand::SixGhz => Some("6G"),
        FrequencyBand::Unknown => None,
    }
}

/// Symbolic `wpa_key_mgmt` value for an AKM suite. Returns `None` for suites
/// the daemon does not accept over the control socket.
pub fn akm_suite_property_value(akm: AkmSuite) -> Option<&'static str> {
    match akm {
        AkmSuite::Ieee8021x => Some("WPA-EAP"),
        AkmSuite::Psk => Some("WPA-PSK"),
        AkmSuite::FtIeee8021x => Some("FT-EAP"),
        AkmSuite::FtPsk => Some("FT-PSK"),
        AkmSuite::Ieee8021xSha256 => Some("WPA-EAP-SHA256"),
        AkmSuite::PskSha256 => Some("WPA-PSK-SHA256"),
        AkmSuite::Sae => Some("SAE"),
        AkmSuite::FtSae => Some("FT-SAE"),
        AkmSuite::Osen => Some("OSEN"),
        AkmSuite::Ieee8021xSuiteB => Some("WPA-EAP-SUITE-B"),
        AkmSuite::Ieee8021xSuiteB192 => Some("WPA-EAP-SUITE-B-192"),
        AkmSuite::FilsSha256 => Some("FILS-SHA256"),
        AkmSuite::FilsSha384 => Some("FILS-SHA384"),
        AkmSuite::FtFilsSha256 => Some("FT-FILS-SHA256"),
        AkmSuite::FtFilsSha384 => Some("FT-FILS-SHA384"),
        AkmSuite::Owe => Some("OWE"),
        AkmSuite::Dpp => Some("DPP"),
        AkmSuite::FtIeee8021xSha384 => Some("FT-EAP-SHA384"),
        AkmSuite::Pasn => Some("PASN"),
        AkmSuite::Unknown => None,
    }
}

/// Inverse of [`akm_suite_property_value`]; unknown tokens map to the
/// `Unknown` sentinel.
pub fn akm_suite_from_property_value(value: &str) -> AkmSuite {
    match value {
        "WPA-EAP" => AkmSuite::Ieee8021x,
        "WPA-PSK" => AkmSuite::Psk,
        "FT-EAP" => AkmSuite::FtIeee8021x,
        "FT-PSK" => AkmSuite::FtPsk,
        "WPA-EAP-SHA256" => AkmSuite::Ieee8021xSha256,
        "WPA-PSK-SHA256" => AkmSuite::PskSha256,
        "SAE" => AkmSuite::Sae,
        "FT-SAE" => AkmSuite::FtSae,
        "OSEN" => AkmSuite::Osen,
        "WPA-EAP-SUITE-B" => AkmSuite::Ieee8021xSuiteB,
        "WPA-EAP-SUITE-B-192" => AkmSuite::Ieee8021xSuiteB192,
        "FILS-SHA256" => AkmSuite::FilsSha256,
        "FILS-SHA384" => AkmSuite::FilsSha384,
        "FT-FILS-SHA256" => AkmSuite::FtFilsSha256,
        "FT-FILS-SHA384" => AkmSuite::FtFilsSha384,
        "OWE" => AkmSuite::Owe,
        "DPP" => AkmSuite::Dpp,
        "FT-EAP-SHA384" => AkmSuite::FtIeee8021xSha384,
        "PASN" => AkmSuite::Pasn,
        _ => AkmSuite::Unknown,
    }
}

/// AKM suites that belong to the fast-transition (FT) family. Selecting any
/// of these requires a NAS identifier to be set first.
pub fn is_akm_suite_fast_transition(akm: AkmSuite) -> bool {
    matches!(
        akm,
        AkmSuite::Ieee8021x
            | AkmSuite::FtIeee8021x
            | AkmSuite::FtPsk
            | AkmSuite::FtIeee8021xSha384
            | AkmSuite::FtSae
            | AkmSuite::FtFilsSha256
            | AkmSuite::FtFilsSha384
    )
}

/// AKM suites that belong to the IEEE 802.1X family. Selecting any of these
/// requires `ieee8021x=1` to be set first.
pub fn is_akm_suite_ieee8021x(akm: AkmSuite) -> bool {
    matches!(
        akm,
        AkmSuite::Ieee8021x
            | AkmSuite::FtIeee8021x
            | AkmSuite::FtIeee8021xSha384
            | AkmSuite::Osen
            | AkmSuite::Ieee8021xSha256
            | AkmSuite::Ieee8021xSuiteB
            | AkmSuite::Ieee8021xSuiteB192
            | AkmSuite::FilsSha256
            | AkmSuite::FilsSha384
            | AkmSuite::FtFilsSha256
            | AkmSuite::FtFilsSha384
    )
}

/// Symbolic cipher value for `wpa_pairwise` / `rsn_pairwise`. Returns `None`
/// for ciphers the daemon does not accept.
pub fn cipher_suite_property_value(cipher: CipherSuite) -> Option<&'static str> {
    match cipher {
        CipherSuite::Tkip => Some("TKIP"),
        CipherSuite::Ccmp128 => Some("CCMP"),
        CipherSuite::Ccmp256 => Some("CCMP-256"),
        CipherSuite::Gcmp128 => Some("GCMP"),
        CipherSuite::Gcmp256 => Some("GCMP-256"),
        CipherSuite::BipCmac128 => Some("AES-128-CMAC"),
        CipherSuite::BipCmac256 => Some("BIP-CMAC-256"),
        CipherSuite::BipGmac128 => Some("BIP-GMAC-128"),
        CipherSuite::BipGmac256 => Some("BIP-GMAC-256"),
        CipherSuite::GroupAddressedTrafficNotAllowed => Some("GTK_NOT_USED"),
        CipherSuite::UseGroup | CipherSuite::Wep40 | CipherSuite::Wep104 | CipherSuite::Unknown => {
            None
        }
    }
}

/// Inverse of [`cipher_suite_property_value`]; unknown tokens map to the
/// `Unknown` sentinel.
pub fn cipher_suite_from_property_value(value: &str) -> CipherSuite {
    match value {
        "TKIP" => CipherSuite::Tkip,
        "CCMP" => CipherSuite::Ccmp128,
        "CCMP-256" => CipherSuite::Ccmp256,
        "GCMP" => CipherSuite::Gcmp128,
        "GCMP-256" => CipherSuite::Gcmp256,
        "AES-128-CMAC" => CipherSuite::BipCmac128,
        "BIP-CMAC-256" => CipherSuite::BipCmac256,
        "BIP-GMAC-128" => CipherSuite::BipGmac128,
        "BIP-GMAC-256" => CipherSuite::BipGmac256,
        "GTK_NOT_USED" => CipherSuite::GroupAddressedTrafficNotAllowed,
        _ => CipherSuite::Unknown,
    }
}

/// The cipher list property name for a security protocol. The daemon uses
/// `wpa_pairwise` for WPA and `rsn_pairwise` for WPA2/WPA3.
pub fn cipher_property_name(protocol: SecurityProtocol) -> &'static str {
    match protocol {
        SecurityProtocol::Wpa => PROP_WPA_PAIRWISE,
        SecurityProtocol::Wpa2 | SecurityProtocol::Wpa3 => PROP_RSN_PAIRWISE,
    }
}

pub const PSK_PASSPHRASE_LENGTH_MIN: usize = 8;
pub const PSK_PASSPHRASE_LENGTH_MAX: usize = 63;
pub const PSK_HEX_LENGTH: usize = 64;

/// Property name and value for a pre-shared key. Validates the length rules
/// for both encodings.
pub fn psk_property(psk: &PreSharedKey) -> Result<(&'static str, String), String> {
    match psk {
        PreSharedKey::Passphrase(passphrase) => {
            let length = passphrase.len();
            if !(PSK_PASSPHRASE_LENGTH_MIN..=PSK_PASSPHRASE_LENGTH_MAX).contains(&length) {
                return Err(format!(
                    "PSK passphrase length {length} outside {PSK_PASSPHRASE_LENGTH_MIN}..={PSK_PASSPHRASE_LENGTH_MAX}"
                ));
            }
            Ok((PROP_WPA_PASSPHRASE, passphrase.clone()))
        }
        PreSharedKey::Hex(value) => {
            if value.len() != PSK_HEX_LENGTH || !value.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(format!(
                    "PSK hex value must be exactly {PSK_HEX_LENGTH} hex characters"
                ));
            }
            Ok((PROP_WPA_PSK, value.clone()))
        }
    }
}

/// Encodes one SAE password entry with its optional `|id=`, `|mac=` and
/// `|vlanid=` qualifiers.
pub fn sae_password_property_value(password: &SaePassword) -> String {
    let mut value = password.credential.clone();
    if let Some(id) = &password.password_id {
        value.push_str("|id=");
        value.push_str(id);
    }
    if let Some(mac) = &password.peer_mac_address {
        value.push_str("|mac=");
        value.push_str(&mac.to_string());
    }
    if let Some(vlan_id) = password.vlan_id {
        value.push_str("|vlanid=");
        value.push_str(&vlan_id.to_string());
    }
    value
}

/// Address/port/shared-secret property names for a RADIUS endpoint type.
pub fn radius_endpoint_property_names(
    endpoint_type: RadiusEndpointType,
) -> (&'static str, &'static str, &'static str) {
    match endpoint_type {
        RadiusEndpointType::Authentication => (
            PROP_AUTH_SERVER_ADDR,
            PROP_AUTH_SERVER_PORT,
            PROP_AUTH_SERVER_SHARED_SECRET,
        ),
        RadiusEndpointType::Accounting => (
            PROP_ACCT_SERVER_ADDR,
            PROP_ACCT_SERVER_PORT,
            PROP_ACCT_SERVER_SHARED_SECRET,
        ),
    }
}

/// Generates a random printable NAS identifier for RADIUS messages. The
/// value is not secret and is not persisted.
pub fn generate_nas_identifier(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ieee80211::MacAddress;

    #[test]
    fn response_classification() {
        assert!(is_response_ok("OK"));
        assert!(is_response_ok("OK\n"));
        assert!(is_response_fail("FAIL"));
        assert!(!is_response_ok("FAIL"));
        assert!(!is_response_fail("OK"));
    }

    #[test]
    fn interface_state_parsing() {
        assert_eq!(InterfaceState::from_payload("ENABLED"), InterfaceState::Enabled);
        assert_eq!(InterfaceState::from_payload("DISABLED"), InterfaceState::Disabled);
        assert_eq!(InterfaceState::from_payload("HT_SCAN"), InterfaceState::HtScan);
        assert_eq!(InterfaceState::from_payload("bogus"), InterfaceState::Unknown);
    }

    #[test]
    fn transitional_states_are_operational() {
        assert!(InterfaceState::Enabled.is_operational());
        assert!(InterfaceState::Dfs.is_operational());
        assert!(InterfaceState::CountryUpdate.is_operational());
        assert!(!InterfaceState::Disabled.is_operational());
        assert!(!InterfaceState::Uninitialized.is_operational());
        assert!(!InterfaceState::Unknown.is_operational());
    }

    #[test]
    fn hw_mode_for_high_phy_types_is_a() {
        assert_eq!(HwMode::from_phy_type(PhyType::AX), Some(HwMode::A));
        assert_eq!(HwMode::from_phy_type(PhyType::AC), Some(HwMode::A));
        assert_eq!(HwMode::from_phy_type(PhyType::B), Some(HwMode::B));
        assert_eq!(HwMode::from_phy_type(PhyType::AD), Some(HwMode::Ad));
        assert_eq!(HwMode::from_phy_type(PhyType::Unknown), None);
    }

    #[test]
    fn akm_suite_round_trip() {
        for akm in [
            AkmSuite::Psk,
            AkmSuite::Sae,
            AkmSuite::FtSae,
            AkmSuite::Ieee8021xSuiteB192,
            AkmSuite::Pasn,
        ] {
            let value = akm_suite_property_value(akm).unwrap();
            assert_eq!(akm_suite_from_property_value(value), akm);
        }
        assert_eq!(akm_suite_from_property_value("NOT-AN-AKM"), AkmSuite::Unknown);
    }

    #[test]
    fn ft_and_8021x_families() {
        assert!(is_akm_suite_fast_transition(AkmSuite::FtPsk));
        assert!(is_akm_suite_fast_transition(AkmSuite::FtSae));
        assert!(!is_akm_suite_fast_transition(AkmSuite::Psk));
        assert!(is_akm_suite_ieee8021x(AkmSuite::Ieee8021x));
        assert!(is_akm_suite_ieee8021x(AkmSuite::FilsSha384));
        assert!(!is_akm_suite_ieee8021x(AkmSuite::Sae));
    }

    #[test]
    fn cipher_encoding_rejects_unsupported() {
        assert_eq!(cipher_suite_property_value(CipherSuite::Ccmp128), Some("CCMP"));
        assert_eq!(cipher_suite_property_value(CipherSuite::Wep40), None);
        assert_eq!(cipher_suite_property_value(CipherSuite::Unknown), None);
        assert_eq!(cipher_suite_from_property_value("GCMP-256"), CipherSuite::Gcmp256);
    }

    #[test]
    fn psk_passphrase_length_is_validated() {
        assert!(psk_property(&PreSharedKey::Passphrase("short".into())).is_err());
        assert!(psk_property(&PreSharedKey::Passphrase("a".repeat(64))).is_err());
        let (name, value) = psk_property(&PreSharedKey::Passphrase("abcdefgh".into())).unwrap();
        assert_eq!(name, PROP_WPA_PASSPHRASE);
        assert_eq!(value, "abcdefgh");
    }

    #[test]
    fn psk_hex_length_is_validated() {
        assert!(psk_property(&PreSharedKey::Hex("ab".repeat(16))).is_err());
        assert!(psk_property(&PreSharedKey::Hex("zz".repeat(32))).is_err());
        let (name, value) = psk_property(&PreSharedKey::Hex("ab".repeat(32))).unwrap();
        assert_eq!(name, PROP_WPA_PSK);
        assert_eq!(value.len(), PSK_HEX_LENGTH);
    }

    #[test]
    fn sae_password_qualifiers() {
        let mut password = SaePassword::new("hunter22");
        assert_eq!(sae_password_property_value(&password), "hunter22");

        password.password_id = Some("guest".into());
        password.peer_mac_address = Some(MacAddress([2, 0, 0, 0, 0, 1]));
        password.vlan_id = Some(7);
        assert_eq!(
            sae_password_property_value(&password),
            "hunter22|id=guest|mac=02:00:00:00:00:01|vlanid=7"
        );
    }

    #[test]
    fn nas_identifier_is_printable_and_sized() {
        let id = generate_nas_identifier(NAS_IDENTIFIER_LENGTH);
        assert_eq!(id.len(), NAS_IDENTIFIER_LENGTH);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(id, generate_nas_identifier(NAS_IDENTIFIER_LENGTH));
    }
}
