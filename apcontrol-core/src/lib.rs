//! Core library of the remote Wi-Fi access-point control service.
//!
//! Clients of this crate (the daemon binary and the RPC layer) resolve an
//! interface name through the [`manager::AccessPointManager`] to an
//! [`access_point::AccessPoint`], mint a controller from it and invoke one
//! typed operation; discovery agents feed the manager from the kernel's
//! nl80211 event stream, and the controller drives the external AP daemon
//! over its Unix control socket.

pub mod access_point;
pub mod config;
pub mod controller;
pub mod discovery;
pub mod ieee80211;
pub mod manager;
pub mod wpa;

use thiserror::Error as ThisError;

/// Shared error type for the fallible seams of this crate. Controller
/// operations do not surface it; they fold failures into an
/// [`controller::OperationStatus`].
#[derive(Debug, ThisError)]
pub enum Error {
    #[error("interface '{0}' is not controllable by the AP daemon")]
    NotControllable(String),

    #[error(transparent)]
    Wpa(#[from] wpa::WpaError),

    #[error("netlink failure: {0}")]
    Netlink(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

/// A specialized `Result` type for this crate's operations.
pub type Result<T> = std::result::Result<T, Error>;
