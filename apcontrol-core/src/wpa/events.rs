//! Unsolicited-event stream from the AP daemon.
//!
//! A dedicated session is attached to the daemon's event stream and drained
//! by a worker task. Listeners register weakly; dispatch copies the listener
//! table out under the lock and invokes callbacks without it, pruning dead
//! registrations opportunistically.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, SystemTime};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::wpa::socket::ControlConnection;
use crate::wpa::{Result, WpaError};

/// One event delivered by the daemon. The wire payload starts with a `<N>`
/// severity marker which is stripped into [`WpaEvent::level`]; levels follow
/// the daemon's MSGDUMP(0)..ERROR(5) scale.
#[derive(Debug, Clone)]
pub struct WpaEvent {
    pub level: u32,
    pub payload: String,
    pub timestamp: SystemTime,
}

impl WpaEvent {
    /// Splits the severity marker off a raw event payload. Payloads without a
    /// marker keep level 0.
    pub fn parse(raw: &str) -> WpaEvent {
        let (level, payload) = match raw.strip_prefix('<').and_then(|rest| rest.split_once('>')) {
            Some((level, payload)) => (level.parse().unwrap_or(0), payload),
            None => (0, raw),
        };

        WpaEvent {
            level,
            payload: payload.to_string(),
            timestamp: SystemTime::now(),
        }
    }
}

/// Receives events dispatched by a [`WpaEventHandler`]. Implementations must
/// not panic; dispatch happens on the listener task.
pub trait WpaEventListener: Send + Sync {
    fn on_event(&self, interface_name: &str, event: &WpaEvent);
}

type ListenerTable = HashMap<u64, Weak<dyn WpaEventListener>>;

/// Owns the event-listener worker task for one interface session.
pub struct WpaEventHandler {
    interface_name: String,
    listeners: Mutex<ListenerTable>,
    next_token: AtomicU64,
    worker: Mutex<Option<JoinHandle<()>>>,
    shutdown: watch::Sender<bool>,
}

impl WpaEventHandler {
    pub fn new(interface_name: impl Into<String>) -> Arc<WpaEventHandler> {
        let (shutdown, _) = watch::channel(false);
        Arc::new(WpaEventHandler {
            interface_name: interface_name.into(),
            listeners: Mutex::new(HashMap::new()),
            next_token: AtomicU64::new(0),
            worker: Mutex::new(None),
            shutdown,
        })
    }

    /// Registers a listener, returning a token for unregistration. Expired
    /// listeners are also pruned automatically during dispatch.
    pub fn register(&self, listener: Weak<dyn WpaEventListener>) -> u64 {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .expect("event listener table poisoned")
            .insert(token, listener);
        debug!(
            interface = %self.interface_name,
            token, "registered event listener"
        );
        token
    }

    pub fn unregister(&self, token: u64) {
        let removed = self
            .listeners
            .lock()
            .expect("event listener table poisoned")
            .remove(&token);
        if removed.is_none() {
            warn!(
                interface = %self.interface_name,
                token, "unregister of unknown event listener"
            );
        }
    }

    /// Attaches `connection` to the daemon's event stream and starts the
    /// worker task. May only be called once per handler.
    pub async fn start(self: &Arc<Self>, connection: ControlConnection, attach_timeout: Duration) -> Result<()> {
        if self
            .worker
            .lock()
            .expect("event worker slot poisoned")
            .is_some()
        {
            return Err(WpaError::AlreadySubscribed);
        }

        connection.attach(attach_timeout).await?;

        // The worker holds only a weak reference so that dropping the
        // handler (which drops the shutdown sender) tears the task down.
        let handler = Arc::downgrade(self);
        let interface_name = self.interface_name.clone();
        let mut shutdown = self.shutdown.subscribe();
        let worker = tokio::spawn(async move {
            debug!(interface = %interface_name, "event listener started");
            loop {
                tokio::select! {
                    _ = shutdown.changed() => {
                        connection.detach(attach_timeout).await;
                        break;
                    }
                    received = connection.receive() => {
                        match received {
                            Ok(raw) => {
                                let Some(handler) = handler.upgrade() else {
                                    break;
                                };
                                handler.dispatch(&WpaEvent::parse(&raw));
                            }
                            Err(error) => {
                                warn!(
                                    interface = %interface_name,
                                    %error,
                                    "event stream read failed; stopping listener"
                                );
                                break;
                            }
                        }
                    }
                }
            }
            debug!(interface = %interface_name, "event listener stopped");
        });

        *self.worker.lock().expect("event worker slot poisoned") = Some(worker);

        Ok(())
    }

    /// Signals the worker to stop and waits for it to finish. Safe to call
    /// multiple times.
    pub async fn stop(&self) {
        let worker = self
            .worker
            .lock()
            .expect("event worker slot poisoned")
            .take();
        if let Some(worker) = worker {
            let _ = self.shutdown.send(true);
            let _ = worker.await;
        }
    }

    fn dispatch(&self, event: &WpaEvent) {
        // Copy out under the lock; invoke without it. Listener callbacks may
        // take arbitrary locks of their own.
        let listeners: ListenerTable = self
            .listeners
            .lock()
            .expect("event listener table poisoned")
            .clone();

        let mut expired = Vec::new();
        for (token, listener) in &listeners {
            match listener.upgrade() {
                Some(listener) => listener.on_event(&self.interface_name, event),
                None => expired.push(*token),
            }
        }

        if !expired.is_empty() {
            let mut listeners = self
                .listeners
                .lock()
                .expect("event listener table poisoned");
            for token in expired {
                debug!(
                    interface = %self.interface_name,
                    token, "pruning expired event listener"
                );
                listeners.remove(&token);
            }
        }
    }
}
