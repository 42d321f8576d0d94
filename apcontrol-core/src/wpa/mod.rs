//! Control channel to the AP daemon (hostapd): socket session, typed command
//! protocol, response parsers, unsolicited-event stream and the per-interface
//! daemon handle.

pub mod events;
pub mod hostapd;
pub mod parser;
pub mod protocol;
pub mod socket;

#[cfg(test)]
pub(crate) mod testing;

use std::path::PathBuf;

use thiserror::Error;

pub use events::{WpaEvent, WpaEventHandler, WpaEventListener};
pub use hostapd::{EnforceConfigurationChange, Hostapd};
pub use parser::{BssConfiguration, BssInfo, HostapdStatus};
pub use protocol::InterfaceState;
pub use socket::ControlConnection;

/// Errors produced by the control channel and protocol layers. The controller
/// is the only consumer that translates these into an operation status.
#[derive(Debug, Error)]
pub enum WpaError {
    #[error("failed to connect to control socket {path}: {source}")]
    ConnectFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("control socket send/receive failed: {0}")]
    SendFailed(#[from] std::io::Error),

    #[error("timed out waiting for command response")]
    Timeout,

    #[error("command '{command}' rejected by daemon: {response}")]
    CommandFailed { command: String, response: String },

    #[error("failed to set property '{property}' to '{value}': {response}")]
    PropertyRejected {
        property: String,
        value: String,
        response: String,
    },

    #[error("malformed daemon response: {0}")]
    Protocol(String),

    #[error("event stream already subscribed")]
    AlreadySubscribed,

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Specialized result type for the control channel layers.
pub type Result<T> = std::result::Result<T, WpaError>;
