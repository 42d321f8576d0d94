//! IEEE 802.11 domain model shared by the controller, the daemon protocol
//! layer and the discovery path. These types carry no wire encoding; the
//! hostapd encodings live in [`crate::wpa::protocol`].

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// IEEE 802.11 generation (PHY type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhyType {
    Unknown,
    B,
    G,
    N,
    A,
    AC,
    AD,
    AX,
    BE,
}

impl fmt::Display for PhyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PhyType::Unknown => "unknown",
            PhyType::B => "B",
            PhyType::G => "G",
            PhyType::N => "N",
            PhyType::A => "A",
            PhyType::AC => "AC",
            PhyType::AD => "AD",
            PhyType::AX => "AX",
            PhyType::BE => "BE",
        };
        f.write_str(name)
    }
}

/// Radio frequency band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrequencyBand {
    Unknown,
    TwoPointFourGhz,
    FiveGhz,
    SixGhz,
}

impl fmt::Display for FrequencyBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FrequencyBand::Unknown => "unknown",
            FrequencyBand::TwoPointFourGhz => "2.4GHz",
            FrequencyBand::FiveGhz => "5GHz",
            FrequencyBand::SixGhz => "6GHz",
        };
        f.write_str(name)
    }
}

/// Initial (pre-RSNA) authentication algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthenticationAlgorithm {
    Unknown,
    OpenSystem,
    SharedKey,
    Leap,
    FastTransition,
    Sae,
    Fils,
    FilsSkPfs,
}

/// Authentication and key management (AKM) suite. The names mirror the
/// symbolic values accepted by the AP daemon for `wpa_key_mgmt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AkmSuite {
    Unknown,
    Ieee8021x,
    Psk,
    FtIeee8021x,
    FtPsk,
    Ieee8021xSha256,
    PskSha256,
    Sae,
    FtSae,
    Osen,
    Ieee8021xSuiteB,
    Ieee8021xSuiteB192,
    FilsSha256,
    FilsSha384,
    FtFilsSha256,
    FtFilsSha384,
    Owe,
    Dpp,
    FtIeee8021xSha384,
    Pasn,
}

/// Pairwise/group cipher suite, IEEE 802.11-2020 Table 9-149.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherSuite {
    Unknown,
    UseGroup,
    Wep40,
    Wep104,
    Tkip,
    Ccmp128,
    Ccmp256,
    Gcmp128,
    Gcmp256,
    BipCmac128,
    BipCmac256,
    BipGmac128,
    BipGmac256,
    GroupAddressedTrafficNotAllowed,
}

/// IEEE 802.11i security protocol family. WPA2 and WPA3 share a protocol bit
/// at the daemon; WPA3 is distinguished only by the active AKM suites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecurityProtocol {
    Wpa,
    Wpa2,
    Wpa3,
}

impl fmt::Display for SecurityProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SecurityProtocol::Wpa => "WPA",
            SecurityProtocol::Wpa2 => "WPA2",
            SecurityProtocol::Wpa3 => "WPA3",
        };
        f.write_str(name)
    }
}

/// Whether an access point is accepting associations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationalState {
    Enabled,
    Disabled,
}

/// Immutable radio capabilities, read from hardware at discovery time.
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    pub phy_types: Vec<PhyType>,
    pub frequency_bands: Vec<FrequencyBand>,
    pub akm_suites: Vec<AkmSuite>,
    pub cipher_suites: Vec<CipherSuite>,
    pub security_protocols: Vec<SecurityProtocol>,
}

/// A 48-bit IEEE 802 MAC address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress(pub [u8; 6]);

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            o[0], o[1], o[2], o[3], o[4], o[5]
        )
    }
}

impl MacAddress {
    /// Builds a MAC address from a raw attribute payload, if it has the
    /// expected length.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let octets: [u8; 6] = bytes.try_into().ok()?;
        Some(MacAddress(octets))
    }
}

impl FromStr for MacAddress {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut octets = [0u8; 6];
        let mut parts = s.split(':');
        for octet in octets.iter_mut() {
            let part = parts.next().ok_or_else(|| format!("short MAC address '{s}'"))?;
            *octet = u8::from_str_radix(part, 16).map_err(|e| format!("bad MAC octet '{part}': {e}"))?;
        }
        if parts.next().is_some() {
            return Err(format!("long MAC address '{s}'"));
        }
        Ok(MacAddress(octets))
    }
}

/// Pre-shared key: either a plain passphrase (8..=63 characters) or a
/// 64-character hex-encoded key value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreSharedKey {
    Passphrase(String),
    Hex(String),
}

/// One SAE password entry, with the optional qualifiers the daemon accepts.
#[derive(Debug, Clone, Default)]
pub struct SaePassword {
    pub credential: String,
    pub password_id: Option<String>,
    pub peer_mac_address: Option<MacAddress>,
    pub vlan_id: Option<i32>,
}

impl SaePassword {
    pub fn new(credential: impl Into<String>) -> Self {
        SaePassword {
            credential: credential.into(),
            ..Default::default()
        }
    }
}

/// Authentication data applied by `set_authentication_data`. At least one of
/// the members must be present.
#[derive(Debug, Clone, Default)]
pub struct AuthenticationData {
    pub psk: Option<PreSharedKey>,
    pub sae_passwords: Option<Vec<SaePassword>>,
}

/// RADIUS endpoint role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadiusEndpointType {
    Authentication,
    Accounting,
}

/// Default UDP port for RADIUS authentication servers.
pub const RADIUS_AUTHENTICATION_PORT_DEFAULT: u16 = 1812;

/// Default UDP port for RADIUS accounting servers.
pub const RADIUS_ACCOUNTING_PORT_DEFAULT: u16 = 1813;

/// One RADIUS server endpoint.
#[derive(Debug, Clone)]
pub struct RadiusEndpoint {
    pub endpoint_type: RadiusEndpointType,
    pub address: IpAddr,
    pub port: Option<u16>,
    pub shared_secret: String,
}

/// Complete RADIUS configuration: one required primary authentication
/// endpoint, an optional primary accounting endpoint, and ordered fallbacks.
#[derive(Debug, Clone)]
pub struct RadiusConfiguration {
    pub authentication_server: RadiusEndpoint,
    pub accounting_server: Option<RadiusEndpoint>,
    pub fallback_servers: Vec<RadiusEndpoint>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mac_address_round_trip() {
        let mac: MacAddress = "02:00:5e:10:00:01".parse().unwrap();
        assert_eq!(mac.0, [0x02, 0x00, 0x5e, 0x10, 0x00, 0x01]);
        assert_eq!(mac.to_string(), "02:00:5e:10:00:01");
    }

    #[test]
    fn mac_address_rejects_bad_input() {
        assert!("02:00:5e:10:00".parse::<MacAddress>().is_err());
        assert!("02:00:5e:10:00:01:02".parse::<MacAddress>().is_err());
        assert!("02:00:xx:10:00:01".parse::<MacAddress>().is_err());
    }

    #[test]
    fn mac_address_from_bytes_requires_six_octets() {
        assert!(MacAddress::from_bytes(&[1, 2, 3, 4, 5]).is_none());
        assert!(MacAddress::from_bytes(&[1, 2, 3, 4, 5, 6]).is_some());
    }
}
