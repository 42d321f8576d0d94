//! Interface-presence discovery: a long-running source translates kernel
//! events into a presence stream; the agent owns the source's lifecycle and
//! the probe path.

pub mod netlink;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use crate::Error;
use crate::access_point::AccessPoint;

/// Presence transition for one interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceEvent {
    Arrived,
    Departed,
}

/// Callback invoked from the discovery worker for each presence transition.
/// Implementations must not block for long and must not panic; they run on
/// the source's worker thread.
pub type PresenceCallback = Arc<dyn Fn(PresenceEvent, Arc<AccessPoint>) + Send + Sync>;

/// Operations backing a [`DiscoveryAgent`]: a live event stream plus an
/// on-demand enumeration of existing interfaces.
pub trait DiscoverySource: Send + Sync {
    /// Starts the event worker, delivering presence transitions to
    /// `callback` until [`DiscoverySource::stop`].
    fn start(&self, callback: PresenceCallback) -> Result<(), Error>;

    /// Stops the event worker and waits for it to exit. Idempotent.
    fn stop(&self);

    /// Enumerates all currently-present access points. Blocking; not
    /// serialized against the live event stream.
    fn probe(&self) -> Result<Vec<Arc<AccessPoint>>, Error>;
}

/// Thin lifecycle façade over one [`DiscoverySource`]. At most one worker
/// exists per agent; `start` on a running agent restarts it.
pub struct DiscoveryAgent {
    source: Arc<dyn DiscoverySource>,
    running: AtomicBool,
}

impl DiscoveryAgent {
    pub fn new(source: Arc<dyn DiscoverySource>) -> DiscoveryAgent {
        DiscoveryAgent {
            source,
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Starts (or restarts) discovery with the given presence callback.
    pub fn start(&self, callback: PresenceCallback) -> Result<(), Error> {
        if self.running.swap(false, Ordering::SeqCst) {
            debug!("discovery agent already running; restarting");
            self.source.stop();
        }

        self.source.start(callback)?;
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Stops discovery. No-op when not running.
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            self.source.stop();
        }
    }

    /// Asynchronously probes for all existing access points. A probe whose
    /// worker is torn down before completion resolves to an empty snapshot.
    pub async fn probe(&self) -> Result<Vec<Arc<AccessPoint>>, Error> {
        let source = Arc::clone(&self.source);
        match tokio::task::spawn_blocking(move || source.probe()).await {
            Ok(result) => result,
            Err(error) => {
                warn!(%error, "discovery probe worker did not complete");
                Ok(Vec::new())
            }
        }
    }
}

impl Drop for DiscoveryAgent {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use crate::access_point::AccessPointFactory;
    use crate::controller::{AccessPointController, ControllerFactory};
    use crate::ieee80211::Capabilities;
    use async_trait::async_trait;

    /// Controller factory that always succeeds with an inert controller.
    pub(crate) struct AlwaysControllable;

    pub(crate) struct InertController {
        interface_name: String,
    }

    #[async_trait]
    impl ControllerFactory for AlwaysControllable {
        async fn create_controller(
            &self,
            interface_name: &str,
            _capabilities: &Capabilities,
        ) -> Result<Box<dyn AccessPointController>, Error> {
            Ok(Box::new(InertController {
                interface_name: interface_name.to_string(),
            }))
        }
    }

    use crate::controller::OperationStatus;
    use crate::ieee80211::{
        AkmSuite, AuthenticationAlgorithm, AuthenticationData, CipherSuite, FrequencyBand,
        OperationalState, PhyType, RadiusConfiguration, SecurityProtocol,
    };

    #[async_trait]
    impl AccessPointController for InertController {
        async fn get_capabilities(&self) -> (OperationStatus, Option<Capabilities>) {
            (
                OperationStatus::succeeded(&self.interface_name, "get_capabilities"),
                Some(Capabilities::default()),
            )
        }
        async fn get_operational_state(&self) -> (OperationStatus, Option<OperationalState>) {
            (
                OperationStatus::succeeded(&self.interface_name, "get_operational_state"),
                Some(OperationalState::Disabled),
            )
        }
        async fn set_operational_state(&self, _state: OperationalState) -> OperationStatus {
            OperationStatus::succeeded(&self.interface_name, "set_operational_state")
        }
        async fn set_phy_type(&self, _phy_type: PhyType) -> OperationStatus {
            OperationStatus::succeeded(&self.interface_name, "set_phy_type")
        }
        async fn set_frequency_bands(&self, _bands: &[FrequencyBand]) -> OperationStatus {
            OperationStatus::succeeded(&self.interface_name, "set_frequency_bands")
        }
        async fn set_ssid(&self, _ssid: &str) -> OperationStatus {
            OperationStatus::succeeded(&self.interface_name, "set_ssid")
        }
        async fn set_network_bridge(&self, _bridge: &str) -> OperationStatus {
            OperationStatus::succeeded(&self.interface_name, "set_network_bridge")
        }
        async fn set_authentication_algorithms(
            &self,
            _algorithms: &[AuthenticationAlgorithm],
        ) -> OperationStatus {
            OperationStatus::succeeded(&self.interface_name, "set_authentication_algorithms")
        }
        async fn set_authentication_data(&self, _data: &AuthenticationData) -> OperationStatus {
            OperationStatus::succeeded(&self.interface_name, "set_authentication_data")
        }
        async fn set_akm_suites(&self, _akm_suites: &[AkmSuite]) -> OperationStatus {
            OperationStatus::succeeded(&self.interface_name, "set_akm_suites")
        }
        async fn set_pairwise_cipher_suites(
            &self,
            _suites: &HashMap<SecurityProtocol, Vec<CipherSuite>>,
        ) -> OperationStatus {
            OperationStatus::succeeded(&self.interface_name, "set_pairwise_cipher_suites")
        }
        async fn set_radius_configuration(
            &self,
            _configuration: &RadiusConfiguration,
        ) -> OperationStatus {
            OperationStatus::succeeded(&self.interface_name, "set_radius_configuration")
        }
    }

    /// In-memory discovery source for manager and agent tests. Events are
    /// injected with [`ScriptedSource::emit`]; the probe returns a fixed
    /// snapshot.
    pub(crate) struct ScriptedSource {
        factory: Arc<AccessPointFactory>,
        snapshot: Vec<String>,
        callback: Mutex<Option<PresenceCallback>>,
        stopped: AtomicBool,
    }

    impl ScriptedSource {
        pub(crate) fn new(factory: Arc<AccessPointFactory>, snapshot: Vec<String>) -> Arc<Self> {
            Arc::new(ScriptedSource {
                factory,
                snapshot,
                callback: Mutex::new(None),
                stopped: AtomicBool::new(false),
            })
        }

        pub(crate) fn emit(&self, event: PresenceEvent, interface_name: &str) {
            let callback = self.callback.lock().unwrap().clone();
            if let Some(callback) = callback {
                let access_point =
                    self.factory
                        .create(interface_name, None, Capabilities::default());
                callback(event, access_point);
            }
        }

        pub(crate) fn was_stopped(&self) -> bool {
            self.stopped.load(Ordering::SeqCst)
        }
    }

    impl DiscoverySource for ScriptedSource {
        fn start(&self, callback: PresenceCallback) -> Result<(), Error> {
            *self.callback.lock().unwrap() = Some(callback);
            Ok(())
        }

        fn stop(&self) {
            self.stopped.store(true, Ordering::SeqCst);
            *self.callback.lock().unwrap() = None;
        }

        fn probe(&self) -> Result<Vec<Arc<AccessPoint>>, Error> {
            Ok(self
                .snapshot
                .iter()
                .map(|name| self.factory.create(name, None, Capabilities::default()))
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{AlwaysControllable, ScriptedSource};
    use super::*;
    use crate::access_point::AccessPointFactory;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn factory() -> Arc<AccessPointFactory> {
        AccessPointFactory::new(Arc::new(AlwaysControllable), HashMap::new())
    }

    #[tokio::test]
    async fn probe_returns_snapshot() {
        let source = ScriptedSource::new(factory(), vec!["wlan0".into(), "wlan1".into()]);
        let agent = DiscoveryAgent::new(source);

        let snapshot = agent.probe().await.unwrap();
        let names: Vec<&str> = snapshot.iter().map(|ap| ap.interface_name()).collect();
        assert_eq!(names, vec!["wlan0", "wlan1"]);
    }

    #[tokio::test]
    async fn start_stop_lifecycle_is_idempotent() {
        let source = ScriptedSource::new(factory(), vec![]);
        let agent = DiscoveryAgent::new(Arc::clone(&source) as Arc<dyn DiscoverySource>);

        assert!(!agent.is_running());
        agent.start(Arc::new(|_, _| {})).unwrap();
        assert!(agent.is_running());

        // Restart replaces the worker rather than duplicating it.
        agent.start(Arc::new(|_, _| {})).unwrap();
        assert!(agent.is_running());
        assert!(source.was_stopped());

        agent.stop();
        assert!(!agent.is_running());
        agent.stop();
        assert!(!agent.is_running());
    }

    #[tokio::test]
    async fn events_reach_the_registered_callback() {
        let source = ScriptedSource::new(factory(), vec![]);
        let agent = DiscoveryAgent::new(Arc::clone(&source) as Arc<dyn DiscoverySource>);

        let seen: Arc<Mutex<Vec<(PresenceEvent, String)>>> = Arc::default();
        let sink = Arc::clone(&seen);
        agent
            .start(Arc::new(move |event, access_point| {
                sink.lock()
                    .unwrap()
                    .push((event, access_point.interface_name().to_string()));
            }))
            .unwrap();

        source.emit(PresenceEvent::Arrived, "wlan0");
        source.emit(PresenceEvent::Departed, "wlan0");

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                (PresenceEvent::Arrived, "wlan0".to_string()),
                (PresenceEvent::Departed, "wlan0".to_string()),
            ]
        );
    }
}
