//! Scripted fake AP daemon for tests: binds a control socket in a temporary
//! directory, logs every command and answers from a caller-supplied script.
//! `ATTACH`/`DETACH` are acknowledged transparently so event sessions come
//! up without showing in the log.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::{TempDir, tempdir};
use tokio::net::UnixDatagram;

use crate::wpa::hostapd::Hostapd;
use crate::wpa::protocol::MESSAGE_SIZE_MAX;

pub(crate) struct FakeDaemon {
    dir: TempDir,
    commands: Arc<Mutex<Vec<String>>>,
}

impl FakeDaemon {
    pub(crate) fn spawn<F>(respond: F) -> FakeDaemon
    where
        F: Fn(&str) -> String + Send + 'static,
    {
        let dir = tempdir().unwrap();
        let socket = UnixDatagram::bind(dir.path().join("wlan0")).unwrap();
        let commands = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&commands);
        tokio::spawn(async move {
            let mut buffer = vec![0u8; MESSAGE_SIZE_MAX];
            loop {
                let Ok((received, peer)) = socket.recv_from(&mut buffer).await else {
                    break;
                };
                let command = String::from_utf8_lossy(&buffer[..received]).to_string();
                let reply = match command.as_str() {
                    "ATTACH" | "DETACH" => "OK\n".to_string(),
                    other => {
                        log.lock().unwrap().push(other.to_string());
                        respond(other)
                    }
                };
                let Some(peer_path) = peer.as_pathname() else {
                    continue;
                };
                let _ = socket.send_to(reply.as_bytes(), peer_path).await;
            }
        });

        FakeDaemon { dir, commands }
    }

    pub(crate) fn path(&self) -> &Path {
        self.dir.path()
    }

    pub(crate) async fn client(&self) -> Hostapd {
        Hostapd::connect("wlan0", self.dir.path(), Duration::from_secs(2))
            .await
            .unwrap()
    }

    pub(crate) fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

/// `STATUS` payload with all amendment flags active and the given state.
pub(crate) fn status_payload(state: &str) -> String {
    format!(
        "state={state}\nieee80211n=1\nieee80211ac=1\nieee80211ax=1\n\
         disable_11n=0\ndisable_11ac=0\ndisable_11ax=0\n"
    )
}

/// `GET_CONFIG` payload reporting the given SSID with a WPA2-PSK setup.
pub(crate) fn get_config_payload(ssid: &str) -> String {
    format!(
        "bssid=02:00:00:00:00:01\nssid={ssid}\nwpa=2\nkey_mgmt=WPA-PSK\n\
         group_cipher=CCMP\nrsn_pairwise_cipher=CCMP\nwpa_pairwise_cipher=CCMP\n"
    )
}
