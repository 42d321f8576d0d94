//! Unix datagram session with one AP-daemon control socket.
//!
//! The daemon exposes one datagram socket per interface under its control
//! directory, named after the interface. A client binds its own socket and
//! connects; framing is one message per socket operation with ASCII
//! payloads. Successfully connecting is the ground truth for "this interface
//! is managed by the daemon".

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::net::UnixDatagram;
use tracing::{debug, warn};

use crate::wpa::protocol::{self, MESSAGE_SIZE_MAX};
use crate::wpa::{Result, WpaError};

static LOCAL_SOCKET_COUNTER: AtomicU64 = AtomicU64::new(0);

/// One bidirectional control-socket session for one interface.
#[derive(Debug)]
pub struct ControlConnection {
    interface_name: String,
    socket: UnixDatagram,
    local_path: PathBuf,
}

impl ControlConnection {
    /// Connects to the control socket for `interface_name` under
    /// `control_dir`. Fails when the socket is absent or not connectable.
    pub fn connect(interface_name: &str, control_dir: &Path) -> Result<ControlConnection> {
        let remote_path = control_dir.join(interface_name);

        let local_path = std::env::temp_dir().join(format!(
            "apcontrol-{}-{}",
            std::process::id(),
            LOCAL_SOCKET_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        // A stale file from a crashed process would make bind() fail.
        let _ = std::fs::remove_file(&local_path);

        let socket = UnixDatagram::bind(&local_path).map_err(|source| WpaError::ConnectFailed {
            path: local_path.clone(),
            source,
        })?;
        socket
            .connect(&remote_path)
            .map_err(|source| WpaError::ConnectFailed {
                path: remote_path.clone(),
                source,
            })?;

        debug!(
            interface = interface_name,
            socket = %remote_path.display(),
            "connected to daemon control socket"
        );

        Ok(ControlConnection {
            interface_name: interface_name.to_string(),
            socket,
            local_path,
        })
    }

    pub fn interface_name(&self) -> &str {
        &self.interface_name
    }

    /// Sends one command and waits for its response. On timeout the session
    /// stays usable for subsequent commands.
    pub async fn request(&self, command: &str, timeout: Duration) -> Result<String> {
        self.socket.send(command.as_bytes()).await?;

        let mut buffer = vec![0u8; MESSAGE_SIZE_MAX];
        let received = tokio::time::timeout(timeout, self.socket.recv(&mut buffer))
            .await
            .map_err(|_| WpaError::Timeout)??;

        let response = String::from_utf8_lossy(&buffer[..received])
            .trim_end()
            .to_string();
        Ok(response)
    }

    /// Attaches this session to the daemon's unsolicited-event stream. After
    /// this, [`ControlConnection::receive`] yields event payloads.
    pub async fn attach(&self, timeout: Duration) -> Result<()> {
        let response = self.request(protocol::CMD_ATTACH, timeout).await?;
        if !protocol::is_response_ok(&response) {
            return Err(WpaError::CommandFailed {
                command: protocol::CMD_ATTACH.to_string(),
                response,
            });
        }
        Ok(())
    }

    /// Detaches from the event stream. Failure is tolerated: the daemon drops
    /// attached peers that disappear.
    pub async fn detach(&self, timeout: Duration) {
        match self.request(protocol::CMD_DETACH, timeout).await {
            Ok(response) if protocol::is_response_ok(&response) => {}
            Ok(response) => {
                debug!(
                    interface = self.interface_name,
                    response, "daemon did not acknowledge detach"
                );
            }
            Err(error) => {
                debug!(
                    interface = self.interface_name,
                    %error, "detach from event stream failed"
                );
            }
        }
    }

    /// Receives one raw message. Used by the event listener after
    /// [`ControlConnection::attach`].
    pub async fn receive(&self) -> Result<String> {
        let mut buffer = vec![0u8; MESSAGE_SIZE_MAX];
        let received = self.socket.recv(&mut buffer).await?;
        Ok(String::from_utf8_lossy(&buffer[..received])
            .trim_end()
            .to_string())
    }
}

impl Drop for ControlConnection {
    fn drop(&mut self) {
        if let Err(error) = std::fs::remove_file(&self.local_path) {
            warn!(
                path = %self.local_path.display(),
                %error,
                "failed to remove local control socket path"
            );
        }
    }
}
