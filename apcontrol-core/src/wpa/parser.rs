//! Typed parsers for `STATUS` and `GET_CONFIG` response payloads.
//!
//! Payloads are `key=value` lines. Each typed parser declares the keys it
//! needs and whether they are required; a missing required key fails the
//! whole parse. Numeric fields use locale-independent decimal conversion and
//! unknown enum tokens map to the `Unknown` sentinels of the domain model.

use std::collections::HashMap;

use crate::ieee80211::{AkmSuite, CipherSuite};
use crate::wpa::protocol::{
    self, InterfaceState, WpaSecurityProtocols, akm_suite_from_property_value,
    cipher_suite_from_property_value,
};
use crate::wpa::{Result, WpaError};

/// Whether a declared key must be present for the parse to succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
}

/// Splits a payload into a key/value map and verifies the declared keys.
/// Lines without a `=` separator are ignored.
pub fn parse_key_values<'a>(
    payload: &'a str,
    keys: &[(&str, Presence)],
) -> Result<HashMap<&'a str, &'a str>> {
    let mut properties = HashMap::new();
    for line in payload.lines() {
        if let Some((key, value)) = line.split_once('=') {
            properties.insert(key, value);
        }
    }

    for (key, presence) in keys {
        if *presence == Presence::Required && !properties.contains_key(key) {
            return Err(WpaError::Protocol(format!(
                "required key '{key}' missing from response"
            )));
        }
    }

    Ok(properties)
}

fn parse_int(properties: &HashMap<&str, &str>, key: &str) -> Result<i32> {
    let value = properties
        .get(key)
        .ok_or_else(|| WpaError::Protocol(format!("required key '{key}' missing from response")))?;
    value
        .parse::<i32>()
        .map_err(|e| WpaError::Protocol(format!("key '{key}' has non-numeric value '{value}': {e}")))
}

/// One BSS entry from the indexed `bss[i]`/`bssid[i]`/`ssid[i]`/`num_sta[i]`
/// lines of a `STATUS` response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BssInfo {
    pub index: usize,
    pub interface: String,
    pub bssid: String,
    pub ssid: String,
    pub num_stations: u32,
}

/// Parsed `STATUS` response.
#[derive(Debug, Clone)]
pub struct HostapdStatus {
    pub state: InterfaceState,
    pub ieee80211n: i32,
    pub ieee80211ac: i32,
    pub ieee80211ax: i32,
    pub disable_11n: i32,
    pub disable_11ac: i32,
    pub disable_11ax: i32,
    pub bss: Vec<BssInfo>,
}

impl HostapdStatus {
    const KEYS: &'static [(&'static str, Presence)] = &[
        (protocol::PROP_STATE, Presence::Required),
        (protocol::PROP_IEEE80211N, Presence::Required),
        (protocol::PROP_IEEE80211AC, Presence::Required),
        (protocol::PROP_IEEE80211AX, Presence::Required),
        (protocol::PROP_DISABLE_11N, Presence::Required),
        (protocol::PROP_DISABLE_11AC, Presence::Required),
        (protocol::PROP_DISABLE_11AX, Presence::Required),
    ];

    pub fn parse(payload: &str) -> Result<HostapdStatus> {
        let properties = parse_key_values(payload, Self::KEYS)?;

        Ok(HostapdStatus {
            state: InterfaceState::from_payload(properties[protocol::PROP_STATE]),
            ieee80211n: parse_int(&properties, protocol::PROP_IEEE80211N)?,
            ieee80211ac: parse_int(&properties, protocol::PROP_IEEE80211AC)?,
            ieee80211ax: parse_int(&properties, protocol::PROP_IEEE80211AX)?,
            disable_11n: parse_int(&properties, protocol::PROP_DISABLE_11N)?,
            disable_11ac: parse_int(&properties, protocol::PROP_DISABLE_11AC)?,
            disable_11ax: parse_int(&properties, protocol::PROP_DISABLE_11AX)?,
            bss: parse_bss_entries(&properties),
        })
    }
}

/// Collects the indexed BSS entries present in a `STATUS` property map.
/// Entries are keyed `name[i]`; indices need not be contiguous in the payload
/// but the result is sorted by index.
fn parse_bss_entries(properties: &HashMap<&str, &str>) -> Vec<BssInfo> {
    let mut entries: HashMap<usize, BssInfo> = HashMap::new();

    for (key, value) in properties {
        let Some((name, index)) = parse_indexed_key(key) else {
            continue;
        };

        let entry = entries.entry(index).or_insert_with(|| BssInfo {
            index,
            ..Default::default()
        });
        match name {
            "bss" => entry.interface = (*value).to_string(),
            "bssid" => entry.bssid = (*value).to_string(),
            "ssid" => entry.ssid = (*value).to_string(),
            "num_sta" => entry.num_stations = value.parse().unwrap_or(0),
            _ => {}
        }
    }

    let mut bss: Vec<BssInfo> = entries.into_values().collect();
    bss.sort_by_key(|entry| entry.index);
    bss
}

/// Splits `name[i]` into `(name, i)`.
fn parse_indexed_key(key: &str) -> Option<(&str, usize)> {
    let (name, rest) = key.split_once('[')?;
    let index = rest.strip_suffix(']')?.parse().ok()?;
    Some((name, index))
}

/// Parsed `GET_CONFIG` response.
#[derive(Debug, Clone)]
pub struct BssConfiguration {
    pub bssid: String,
    pub ssid: String,
    pub wpa: WpaSecurityProtocols,
    pub key_mgmt: Vec<AkmSuite>,
    pub group_cipher: CipherSuite,
    pub rsn_pairwise_cipher: CipherSuite,
    pub wpa_pairwise_cipher: CipherSuite,
}

impl BssConfiguration {
    const KEYS: &'static [(&'static str, Presence)] = &[
        (protocol::PROP_BSSID, Presence::Required),
        (protocol::PROP_SSID, Presence::Required),
        (protocol::PROP_WPA, Presence::Required),
        (protocol::PROP_KEY_MGMT, Presence::Required),
        (protocol::PROP_GROUP_CIPHER, Presence::Required),
        (protocol::PROP_RSN_PAIRWISE_CIPHER, Presence::Required),
        (protocol::PROP_WPA_PAIRWISE_CIPHER, Presence::Required),
    ];

    pub fn parse(payload: &str) -> Result<BssConfiguration> {
        let properties = parse_key_values(payload, Self::KEYS)?;

        let wpa_bits = parse_int(&properties, protocol::PROP_WPA)? as u32;
        let key_mgmt = properties[protocol::PROP_KEY_MGMT]
            .split_ascii_whitespace()
            .map(akm_suite_from_property_value)
            .collect();

        Ok(BssConfiguration {
            bssid: properties[protocol::PROP_BSSID].to_string(),
            ssid: properties[protocol::PROP_SSID].to_string(),
            wpa: WpaSecurityProtocols::from_bits_truncate(wpa_bits),
            key_mgmt,
            group_cipher: cipher_suite_from_property_value(properties[protocol::PROP_GROUP_CIPHER]),
            rsn_pairwise_cipher: cipher_suite_from_property_value(
                properties[protocol::PROP_RSN_PAIRWISE_CIPHER],
            ),
            wpa_pairwise_cipher: cipher_suite_from_property_value(
                properties[protocol::PROP_WPA_PAIRWISE_CIPHER],
            ),
        })
    }
}
