//! nl80211 discovery source: subscribes to the kernel Wi-Fi configuration
//! multicast group and translates interface arrival/departure/type-change
//! messages into presence events; enumerates existing interfaces on demand.
//!
//! The event worker is a dedicated thread blocking in `poll` over the
//! netlink socket and an eventfd wake descriptor; `stop` writes the eventfd,
//! the worker drains pending messages and exits.

use std::collections::HashSet;
use std::os::unix::io::{AsRawFd, RawFd};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use neli::consts::genl::{Cmd, NlAttrType};
use neli::consts::nl::{NlmF, NlmFFlags, Nlmsg};
use neli::genl::Genlmsghdr;
use neli::nl::{NlPayload, Nlmsghdr};
use neli::socket::NlSocketHandle;
use neli::types::GenlBuffer;
use neli_proc_macros::neli_enum;
use nix::fcntl::{FcntlArg, OFlag, fcntl};
use nix::poll::{PollFd, PollFlags, poll};
use nix::sys::eventfd::{EfdFlags, eventfd};
use tracing::{debug, error, info, warn};

use crate::Error;
use crate::access_point::{AccessPoint, AccessPointFactory};
use crate::discovery::{DiscoverySource, PresenceCallback, PresenceEvent};
use crate::ieee80211::{AkmSuite, Capabilities, CipherSuite, FrequencyBand, MacAddress, PhyType,
    SecurityProtocol};

const NL80211_FAMILY_NAME: &str = "nl80211";
const NL80211_MULTICAST_GROUP_CONFIG: &str = "config";
const NL80211_GENL_VERSION: u8 = 1;

/// nl80211 interface type for access points (`NL80211_IFTYPE_AP`).
const NL80211_IFTYPE_AP: u32 = 3;

// nl80211_band values; the band set of a wiphy is keyed by these.
const NL80211_BAND_2GHZ: u16 = 0;
const NL80211_BAND_5GHZ: u16 = 1;
const NL80211_BAND_6GHZ: u16 = 3;

// nl80211_band_attr values consumed from the nested band attributes.
const NL80211_BAND_ATTR_HT_CAPA: u16 = 4;
const NL80211_BAND_ATTR_VHT_CAPA: u16 = 8;

#[neli_enum(serialized_type = "u8")]
pub(crate) enum Nl80211Command {
    Unspecified = 0,
    GetWiphy = 1,
    GetInterface = 5,
    SetInterface = 6,
    NewInterface = 7,
    DelInterface = 8,
}
impl Cmd for Nl80211Command {}

#[neli_enum(serialized_type = "u16")]
pub(crate) enum Nl80211Attribute {
    Unspecified = 0,
    Wiphy = 1,
    WiphyName = 2,
    Ifindex = 3,
    Ifname = 4,
    Iftype = 5,
    Mac = 6,
    WiphyBands = 22,
    CipherSuites = 57,
    AkmSuites = 76,
}
impl NlAttrType for Nl80211Attribute {}

type Nl80211Message = Genlmsghdr<Nl80211Command, Nl80211Attribute>;

/// Attributes of one nl80211 interface message.
#[derive(Debug, Clone)]
pub(crate) struct InterfaceInfo {
    pub name: String,
    pub interface_type: u32,
    pub interface_index: u32,
    pub wiphy_index: u32,
    pub mac_address: Option<MacAddress>,
}

impl InterfaceInfo {
    pub(crate) fn is_access_point(&self) -> bool {
        self.interface_type == NL80211_IFTYPE_AP
    }
}

fn payload_u32(payload: &[u8]) -> Option<u32> {
    Some(u32::from_ne_bytes(payload.get(..4)?.try_into().ok()?))
}

fn payload_string(payload: &[u8]) -> String {
    String::from_utf8_lossy(payload)
        .trim_end_matches('\0')
        .to_string()
}

/// Extracts the interface attributes from an nl80211 message payload.
/// Returns `None` when the identifying attributes are absent.
fn parse_interface(message: &Nl80211Message) -> Option<InterfaceInfo> {
    let mut name = None;
    let mut interface_type = None;
    let mut interface_index = None;
    let mut wiphy_index = None;
    let mut mac_address = None;

    let attributes = message.get_attr_handle();
    for attribute in attributes.iter() {
        let payload = attribute.nla_payload.as_ref();
        match attribute.nla_type.nla_type {
            Nl80211Attribute::Ifname => name = Some(payload_string(payload)),
            Nl80211Attribute::Iftype => interface_type = payload_u32(payload),
            Nl80211Attribute::Ifindex => interface_index = payload_u32(payload),
            Nl80211Attribute::Wiphy => wiphy_index = payload_u32(payload),
            Nl80211Attribute::Mac => mac_address = MacAddress::from_bytes(payload),
            _ => {}
        }
    }

    Some(InterfaceInfo {
        name: name?,
        interface_type: interface_type?,
        interface_index: interface_index?,
        wiphy_index: wiphy_index?,
        mac_address,
    })
}

/// Derives the presence transition for one parsed message, updating the
/// "previously seen as AP" set keyed by interface name.
pub(crate) fn derive_presence(
    command: Nl80211Command,
    interface: &InterfaceInfo,
    seen_as_ap: &mut HashSet<String>,
) -> Option<PresenceEvent> {
    let event = match command {
        Nl80211Command::NewInterface | Nl80211Command::DelInterface => {
            if !interface.is_access_point() {
                return None;
            }
            if command == Nl80211Command::NewInterface {
                PresenceEvent::Arrived
            } else {
                PresenceEvent::Departed
            }
        }
        Nl80211Command::SetInterface => {
            if interface.is_access_point() {
                PresenceEvent::Arrived
            } else {
                PresenceEvent::Departed
            }
        }
        _ => return None,
    };

    match event {
        PresenceEvent::Arrived => {
            seen_as_ap.insert(interface.name.clone());
        }
        PresenceEvent::Departed => {
            if !seen_as_ap.remove(&interface.name) && command == Nl80211Command::SetInterface {
                // Type change on an interface never seen as AP; nothing to report.
                return None;
            }
        }
    }

    Some(event)
}

fn netlink_error(context: &str, error: impl std::fmt::Display) -> Error {
    Error::Netlink(format!("{context}: {error}"))
}

/// Connects a generic-netlink socket and resolves the nl80211 family id.
fn connect_nl80211() -> Result<(NlSocketHandle, u16), Error> {
    let mut socket = NlSocketHandle::connect(neli::consts::socket::NlFamily::Generic, None, &[])
        .map_err(|e| netlink_error("failed to connect netlink socket", e))?;
    let family_id = socket
        .resolve_genl_family(NL80211_FAMILY_NAME)
        .map_err(|e| netlink_error("failed to resolve nl80211 family", e))?;
    Ok((socket, family_id))
}

fn dump_request(family_id: u16, command: Nl80211Command) -> Nlmsghdr<u16, Nl80211Message> {
    let genl_header = Genlmsghdr::new(command, NL80211_GENL_VERSION, GenlBuffer::new());
    Nlmsghdr::new(
        None,
        family_id,
        NlmFFlags::new(&[NlmF::Request, NlmF::Dump]),
        None,
        None,
        NlPayload::Payload(genl_header),
    )
}

/// Enumerates all nl80211 interfaces through a kernel dump request.
pub(crate) fn enumerate_interfaces() -> Result<Vec<InterfaceInfo>, Error> {
    let (mut socket, family_id) = connect_nl80211()?;
    socket
        .send(dump_request(family_id, Nl80211Command::GetInterface))
        .map_err(|e| netlink_error("failed to send interface dump request", e))?;

    let mut interfaces = Vec::new();
    for message in socket.iter::<Nlmsg, Nl80211Message>(false) {
        let message = message.map_err(|e| netlink_error("interface dump receive failed", e))?;
        if let NlPayload::Payload(payload) = message.nl_payload {
            if let Some(interface) = parse_interface(&payload) {
                debug!(
                    interface = %interface.name,
                    interface_type = interface.interface_type,
                    "enumerated nl80211 interface"
                );
                interfaces.push(interface);
            }
        }
    }
    Ok(interfaces)
}

/// Reads the immutable capabilities of a wiphy. Anything the kernel does not
/// expose is reported as unsupported.
pub(crate) fn wiphy_capabilities(wiphy_index: u32) -> Result<Capabilities, Error> {
    let (mut socket, family_id) = connect_nl80211()?;
    socket
        .send(dump_request(family_id, Nl80211Command::GetWiphy))
        .map_err(|e| netlink_error("failed to send wiphy dump request", e))?;

    let mut capabilities = Capabilities::default();
    let mut found = false;

    for message in socket.iter::<Nlmsg, Nl80211Message>(false) {
        let message = message.map_err(|e| netlink_error("wiphy dump receive failed", e))?;
        let NlPayload::Payload(payload) = message.nl_payload else {
            continue;
        };

        let attributes = payload.get_attr_handle();
        let index = attributes.iter().find_map(|attribute| {
            (attribute.nla_type.nla_type == Nl80211Attribute::Wiphy)
                .then(|| payload_u32(attribute.nla_payload.as_ref()))
                .flatten()
        });
        if index != Some(wiphy_index) {
            continue;
        }
        found = true;

        for attribute in attributes.iter() {
            match attribute.nla_type.nla_type {
                Nl80211Attribute::CipherSuites => {
                    for selector in attribute.nla_payload.as_ref().chunks_exact(4) {
                        let selector = u32::from_ne_bytes(selector.try_into().unwrap());
                        let cipher = cipher_suite_from_selector(selector);
                        if cipher != CipherSuite::Unknown
                            && !capabilities.cipher_suites.contains(&cipher)
                        {
                            capabilities.cipher_suites.push(cipher);
                        }
                    }
                }
                Nl80211Attribute::AkmSuites => {
                    for selector in attribute.nla_payload.as_ref().chunks_exact(4) {
                        let selector = u32::from_ne_bytes(selector.try_into().unwrap());
                        let akm = akm_suite_from_selector(selector);
                        if akm != AkmSuite::Unknown && !capabilities.akm_suites.contains(&akm) {
                            capabilities.akm_suites.push(akm);
                        }
                    }
                }
                Nl80211Attribute::WiphyBands => {
                    let Ok(bands) = attribute.get_attr_handle::<u16>() else {
                        continue;
                    };
                    for band in bands.iter() {
                        let frequency_band = frequency_band_from_id(band.nla_type.nla_type);
                        if frequency_band != FrequencyBand::Unknown
                            && !capabilities.frequency_bands.contains(&frequency_band)
                        {
                            capabilities.frequency_bands.push(frequency_band);
                        }

                        let Ok(band_attributes) = band.get_attr_handle::<u16>() else {
                            continue;
                        };
                        for band_attribute in band_attributes.iter() {
                            let phy_type = match band_attribute.nla_type.nla_type {
                                NL80211_BAND_ATTR_HT_CAPA => PhyType::N,
                                NL80211_BAND_ATTR_VHT_CAPA => PhyType::AC,
                                _ => continue,
                            };
                            if !capabilities.phy_types.contains(&phy_type) {
                                capabilities.phy_types.push(phy_type);
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }

    if !found {
        return Err(Error::Netlink(format!("wiphy {wiphy_index} not found")));
    }

    // B and G are table stakes for any 2.4 GHz-era radio; HE/EHT support is
    // not yet read from the kernel so AX/BE stay unreported.
    capabilities.phy_types.insert(0, PhyType::G);
    capabilities.phy_types.insert(0, PhyType::B);
    capabilities.security_protocols = derive_security_protocols(&capabilities.cipher_suites);

    Ok(capabilities)
}

/// IEEE 802.11 AKM suite selectors (OUI 00-0F-AC).
pub(crate) fn akm_suite_from_selector(selector: u32) -> AkmSuite {
    match selector {
        0x000F_AC01 => AkmSuite::Ieee8021x,
        0x000F_AC02 => AkmSuite::Psk,
        0x000F_AC03 => AkmSuite::FtIeee8021x,
        0x000F_AC04 => AkmSuite::FtPsk,
        0x000F_AC05 => AkmSuite::Ieee8021xSha256,
        0x000F_AC06 => AkmSuite::PskSha256,
        0x000F_AC08 => AkmSuite::Sae,
        0x000F_AC09 => AkmSuite::FtSae,
        0x000F_AC0B => AkmSuite::Ieee8021xSuiteB,
        0x000F_AC0C => AkmSuite::Ieee8021xSuiteB192,
        0x000F_AC0D => AkmSuite::FtIeee8021xSha384,
        0x000F_AC0E => AkmSuite::FilsSha256,
        0x000F_AC0F => AkmSuite::FilsSha384,
        0x000F_AC10 => AkmSuite::FtFilsSha256,
        0x000F_AC11 => AkmSuite::FtFilsSha384,
        0x000F_AC12 => AkmSuite::Owe,
        _ => AkmSuite::Unknown,
    }
}

/// IEEE 802.11 cipher suite selectors (OUI 00-0F-AC).
pub(crate) fn cipher_suite_from_selector(selector: u32) -> CipherSuite {
    match selector {
        0x000F_AC00 => CipherSuite::UseGroup,
        0x000F_AC01 => CipherSuite::Wep40,
        0x000F_AC02 => CipherSuite::Tkip,
        0x000F_AC04 => CipherSuite::Ccmp128,
        0x000F_AC05 => CipherSuite::Wep104,
        0x000F_AC06 => CipherSuite::BipCmac128,
        0x000F_AC07 => CipherSuite::GroupAddressedTrafficNotAllowed,
        0x000F_AC08 => CipherSuite::Gcmp128,
        0x000F_AC09 => CipherSuite::Gcmp256,
        0x000F_AC0A => CipherSuite::Ccmp256,
        0x000F_AC0B => CipherSuite::BipGmac128,
        0x000F_AC0C => CipherSuite::BipGmac256,
        0x000F_AC0D => CipherSuite::BipCmac256,
        _ => CipherSuite::Unknown,
    }
}

pub(crate) fn frequency_band_from_id(band_id: u16) -> FrequencyBand {
    match band_id {
        NL80211_BAND_2GHZ => FrequencyBand::TwoPointFourGhz,
        NL80211_BAND_5GHZ => FrequencyBand::FiveGhz,
        NL80211_BAND_6GHZ => FrequencyBand::SixGhz,
        _ => FrequencyBand::Unknown,
    }
}

/// WPA needs TKIP for its pairwise cipher; CCMP-class ciphers carry RSN
/// (WPA2, and WPA3 via key management).
fn derive_security_protocols(cipher_suites: &[CipherSuite]) -> Vec<SecurityProtocol> {
    let mut protocols = Vec::new();
    if cipher_suites.contains(&CipherSuite::Tkip) {
        protocols.push(SecurityProtocol::Wpa);
    }
    if cipher_suites.iter().any(|cipher| {
        matches!(
            cipher,
            CipherSuite::Ccmp128 | CipherSuite::Ccmp256 | CipherSuite::Gcmp128 | CipherSuite::Gcmp256
        )
    }) {
        protocols.push(SecurityProtocol::Wpa2);
        protocols.push(SecurityProtocol::Wpa3);
    }
    protocols
}

struct Worker {
    wake_fd: RawFd,
    thread: JoinHandle<()>,
}

/// Discovery source backed by the nl80211 configuration multicast group.
pub struct NetlinkDiscovery {
    factory: Arc<AccessPointFactory>,
    worker: Mutex<Option<Worker>>,
}

impl NetlinkDiscovery {
    pub fn new(factory: Arc<AccessPointFactory>) -> Arc<NetlinkDiscovery> {
        Arc::new(NetlinkDiscovery {
            factory,
            worker: Mutex::new(None),
        })
    }

    fn build_access_point(factory: &AccessPointFactory, interface: &InterfaceInfo) -> Arc<AccessPoint> {
        let capabilities = match wiphy_capabilities(interface.wiphy_index) {
            Ok(capabilities) => capabilities,
            Err(error) => {
                debug!(
                    interface = %interface.name,
                    wiphy = interface.wiphy_index,
                    %error,
                    "failed to read wiphy capabilities; assuming none"
                );
                Capabilities::default()
            }
        };
        factory.create(&interface.name, interface.mac_address, capabilities)
    }

    /// Blocking event loop; runs on the worker thread until the wake fd is
    /// written or the netlink socket fails.
    fn event_loop(
        mut socket: NlSocketHandle,
        wake_fd: RawFd,
        factory: Arc<AccessPointFactory>,
        callback: PresenceCallback,
    ) {
        let netlink_fd = socket.as_raw_fd();
        let mut seen_as_ap: HashSet<String> = HashSet::new();

        info!("netlink discovery worker started");
        'outer: loop {
            let mut poll_fds = [
                PollFd::new(netlink_fd, PollFlags::POLLIN),
                PollFd::new(wake_fd, PollFlags::POLLIN),
            ];

            match poll(&mut poll_fds, -1) {
                Ok(_) => {}
                Err(nix::errno::Errno::EINTR) => continue,
                Err(error) => {
                    error!(%error, "netlink discovery poll failed");
                    break;
                }
            }

            if poll_fds[1]
                .revents()
                .is_some_and(|revents| revents.contains(PollFlags::POLLIN))
            {
                let mut value = [0u8; 8];
                let _ = nix::unistd::read(wake_fd, &mut value);
                debug!("netlink discovery worker stop requested");
                break;
            }

            if poll_fds[0]
                .revents()
                .is_some_and(|revents| revents.contains(PollFlags::POLLIN))
            {
                // Drain everything the socket has buffered; the socket is in
                // non-blocking mode so an empty read returns None.
                loop {
                    match socket.recv::<Nlmsg, Nl80211Message>() {
                        Ok(Some(message)) => {
                            let NlPayload::Payload(payload) = message.nl_payload else {
                                continue;
                            };
                            let command = payload.cmd.clone();
                            let Some(interface) = parse_interface(&payload) else {
                                continue;
                            };
                            let Some(event) = derive_presence(command, &interface, &mut seen_as_ap)
                            else {
                                continue;
                            };

                            info!(
                                interface = %interface.name,
                                event = ?event,
                                "interface presence changed"
                            );
                            let access_point = Self::build_access_point(&factory, &interface);
                            callback(event, access_point);
                        }
                        Ok(None) => break,
                        Err(error) => {
                            warn!(%error, "netlink receive failed; stopping discovery worker");
                            break 'outer;
                        }
                    }
                }
            }
        }
        info!("netlink discovery worker exited");
    }
}

impl DiscoverySource for NetlinkDiscovery {
    fn start(&self, callback: PresenceCallback) -> Result<(), Error> {
        let mut worker = self.worker.lock().expect("netlink worker slot poisoned");
        if worker.is_some() {
            return Ok(());
        }

        let (mut socket, _family_id) = connect_nl80211()?;
        let group = socket
            .resolve_nl_mcast_group(NL80211_FAMILY_NAME, NL80211_MULTICAST_GROUP_CONFIG)
            .map_err(|e| netlink_error("failed to resolve nl80211 config group", e))?;
        socket
            .add_mcast_membership(&[group])
            .map_err(|e| netlink_error("failed to join nl80211 config group", e))?;
        fcntl(socket.as_raw_fd(), FcntlArg::F_SETFL(OFlag::O_NONBLOCK))
            .map_err(|e| netlink_error("failed to set netlink socket non-blocking", e))?;

        let wake_fd = eventfd(0, EfdFlags::empty())
            .map_err(|e| netlink_error("failed to create wake eventfd", e))?;

        let factory = Arc::clone(&self.factory);
        let thread = std::thread::Builder::new()
            .name("nl80211-discovery".into())
            .spawn(move || Self::event_loop(socket, wake_fd, factory, callback))
            .map_err(|e| netlink_error("failed to spawn discovery worker", e))?;

        *worker = Some(Worker { wake_fd, thread });
        Ok(())
    }

    fn stop(&self) {
        let worker = self
            .worker
            .lock()
            .expect("netlink worker slot poisoned")
            .take();
        let Some(worker) = worker else {
            return;
        };

        if let Err(error) = nix::unistd::write(worker.wake_fd, &1u64.to_ne_bytes()) {
            error!(%error, "failed to signal discovery worker stop");
        }
        if worker.thread.join().is_err() {
            error!("discovery worker panicked");
        }
        let _ = nix::unistd::close(worker.wake_fd);
    }

    fn probe(&self) -> Result<Vec<Arc<AccessPoint>>, Error> {
        let interfaces = enumerate_interfaces()?;
        Ok(interfaces
            .iter()
            .filter(|interface| interface.is_access_point())
            .map(|interface| Self::build_access_point(&self.factory, interface))
            .collect())
    }
}

impl Drop for NetlinkDiscovery {
    fn drop(&mut self) {
        self.stop();
    }
}
