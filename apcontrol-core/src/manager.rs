//! Central registry of live access points and fan-in point for discovery
//! agents.
//!
//! The registry maps interface names to owned access points; at most one
//! entry per name, and only access points whose controller can actually be
//! constructed are admitted. Lookups hand out weak references so callers can
//! observe removal instead of extending an access point's lifetime.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::Error;
use crate::access_point::AccessPoint;
use crate::discovery::{DiscoveryAgent, PresenceCallback, PresenceEvent};

/// Bounded wait for the initial enumeration when registering an agent.
pub const PROBE_TIMEOUT_DEFAULT: Duration = Duration::from_secs(3);

pub struct AccessPointManager {
    access_points: Mutex<HashMap<String, Arc<AccessPoint>>>,
    agents: std::sync::Mutex<Vec<Arc<DiscoveryAgent>>>,
    probe_timeout: Duration,
}

impl AccessPointManager {
    pub fn new(probe_timeout: Duration) -> Arc<AccessPointManager> {
        Arc::new(AccessPointManager {
            access_points: Mutex::new(HashMap::new()),
            agents: std::sync::Mutex::new(Vec::new()),
            probe_timeout,
        })
    }

    /// Admits an access point: it must be controllable and its interface
    /// name must be free. Either condition failing is a logged no-op.
    pub async fn add(&self, access_point: Arc<AccessPoint>) {
        let interface_name = access_point.interface_name().to_string();
        debug!(interface = %interface_name, "attempting to add access point");

        match access_point.create_controller().await {
            Ok(_controller) => {}
            Err(error) => {
                warn!(
                    interface = %interface_name,
                    %error,
                    "access point not added (not controllable)"
                );
                return;
            }
        }

        let mut access_points = self.access_points.lock().await;
        if access_points.contains_key(&interface_name) {
            warn!(interface = %interface_name, "access point not added (already exists)");
            return;
        }

        info!(interface = %interface_name, "access point added");
        access_points.insert(interface_name, access_point);
    }

    /// Removes an access point by interface name; no-op if absent.
    pub async fn remove(&self, interface_name: &str) {
        let mut access_points = self.access_points.lock().await;
        if access_points.remove(interface_name).is_some() {
            info!(interface = interface_name, "access point removed");
        } else {
            warn!(
                interface = interface_name,
                "access point not removed (not found)"
            );
        }
    }

    /// Looks up one access point by interface name.
    pub async fn get(&self, interface_name: &str) -> Option<Weak<AccessPoint>> {
        self.access_points
            .lock()
            .await
            .get(interface_name)
            .map(Arc::downgrade)
    }

    /// Snapshot of all registered access points; order unspecified.
    pub async fn get_all(&self) -> Vec<Weak<AccessPoint>> {
        self.access_points
            .lock()
            .await
            .values()
            .map(Arc::downgrade)
            .collect()
    }

    /// Applies one presence transition from a discovery agent.
    pub async fn on_presence_changed(&self, event: PresenceEvent, access_point: Arc<AccessPoint>) {
        info!(
            interface = access_point.interface_name(),
            event = ?event,
            "access point presence changed"
        );
        match event {
            PresenceEvent::Arrived => self.add(access_point).await,
            PresenceEvent::Departed => self.remove(access_point.interface_name()).await,
        }
    }

    /// Takes ownership of a discovery agent: installs the presence callback,
    /// starts the agent and folds in an initial probe, waiting at most the
    /// probe timeout for it.
    ///
    /// The callback holds only a weak reference back to this manager, so a
    /// manager mid-teardown is observed as gone rather than revived.
    pub async fn register_discovery_agent(
        self: &Arc<Self>,
        agent: Arc<DiscoveryAgent>,
    ) -> Result<(), Error> {
        let weak_manager = Arc::downgrade(self);
        let runtime = tokio::runtime::Handle::current();
        let callback: PresenceCallback = Arc::new(move |event, access_point| {
            let Some(manager) = weak_manager.upgrade() else {
                warn!(
                    interface = access_point.interface_name(),
                    "manager no longer valid; ignoring presence change"
                );
                return;
            };
            runtime.spawn(async move {
                manager.on_presence_changed(event, access_point).await;
            });
        });

        agent.start(callback)?;

        let probe = tokio::time::timeout(self.probe_timeout, agent.probe()).await;

        self.agents
            .lock()
            .expect("agent table poisoned")
            .push(agent);

        match probe {
            Ok(Ok(access_points)) => {
                for access_point in access_points {
                    self.add(access_point).await;
                }
            }
            Ok(Err(error)) => {
                error!(%error, "initial discovery probe failed");
            }
            Err(_) => {
                error!(
                    timeout = ?self.probe_timeout,
                    "initial discovery probe timed out"
                );
            }
        }

        Ok(())
    }

    /// Stops all registered discovery agents; part of graceful shutdown.
    pub fn stop_discovery_agents(&self) {
        let agents = self.agents.lock().expect("agent table poisoned");
        for agent in agents.iter() {
            agent.stop();
        }
    }
}

impl Drop for AccessPointManager {
    fn drop(&mut self) {
        self.stop_discovery_agents();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access_point::AccessPointFactory;
    use crate::controller::{AccessPointController, ControllerFactory};
    use crate::discovery::DiscoverySource;
    use crate::discovery::testing::{AlwaysControllable, ScriptedSource};
    use crate::ieee80211::Capabilities;
    use async_trait::async_trait;

    fn manager() -> Arc<AccessPointManager> {
        AccessPointManager::new(Duration::from_secs(3))
    }

    fn factory() -> Arc<AccessPointFactory> {
        AccessPointFactory::new(Arc::new(AlwaysControllable), HashMap::new())
    }

    struct NeverControllable;

    #[async_trait]
    impl ControllerFactory for NeverControllable {
        async fn create_controller(
            &self,
            interface_name: &str,
            _capabilities: &Capabilities,
        ) -> Result<Box<dyn AccessPointController>, Error> {
            Err(Error::NotControllable(interface_name.to_string()))
        }
    }

    #[tokio::test]
    async fn empty_manager_enumerates_nothing() {
        let manager = manager();
        assert!(manager.get_all().await.is_empty());
        assert!(manager.get("wlan0").await.is_none());
    }

    #[tokio::test]
    async fn add_then_get_returns_live_weak_handle() {
        let manager = manager();
        let access_point = factory().create("wlan0", None, Capabilities::default());
        manager.add(access_point).await;

        let handle = manager.get("wlan0").await.expect("registered");
        let strong = handle.upgrade().expect("still owned by manager");
        assert_eq!(strong.interface_name(), "wlan0");
        assert_eq!(manager.get_all().await.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_interface_names_are_rejected() {
        let manager = manager();
        let factory = factory();
        manager
            .add(factory.create("wlan0", None, Capabilities::default()))
            .await;
        manager
            .add(factory.create("wlan0", None, Capabilities::default()))
            .await;
        assert_eq!(manager.get_all().await.len(), 1);
    }

    #[tokio::test]
    async fn uncontrollable_access_points_are_not_admitted() {
        let manager = manager();
        let factory = AccessPointFactory::new(Arc::new(NeverControllable), HashMap::new());
        manager
            .add(factory.create("wlan0", None, Capabilities::default()))
            .await;
        assert!(manager.get_all().await.is_empty());
    }

    #[tokio::test]
    async fn remove_drops_ownership() {
        let manager = manager();
        manager
            .add(factory().create("wlan0", None, Capabilities::default()))
            .await;
        let handle = manager.get("wlan0").await.unwrap();

        manager.remove("wlan0").await;
        assert!(manager.get("wlan0").await.is_none());
        assert!(handle.upgrade().is_none());

        // Removing again is a no-op.
        manager.remove("wlan0").await;
    }

    #[tokio::test]
    async fn register_agent_folds_in_initial_probe() {
        let manager = manager();
        let source = ScriptedSource::new(factory(), vec!["wlan0".into(), "wlan1".into()]);
        let agent = Arc::new(DiscoveryAgent::new(source));

        manager.register_discovery_agent(agent).await.unwrap();

        let names: Vec<String> = manager
            .get_all()
            .await
            .iter()
            .filter_map(|weak| weak.upgrade())
            .map(|ap| ap.interface_name().to_string())
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"wlan0".to_string()));
        assert!(names.contains(&"wlan1".to_string()));
    }

    #[tokio::test]
    async fn arrived_event_adds_and_departed_removes() {
        let manager = manager();
        let source = ScriptedSource::new(factory(), vec![]);
        let agent = Arc::new(DiscoveryAgent::new(
            Arc::clone(&source) as Arc<dyn DiscoverySource>
        ));
        manager.register_discovery_agent(agent).await.unwrap();

        source.emit(PresenceEvent::Arrived, "wlan0");
        let mut arrived = false;
        for _ in 0..100 {
            if manager.get("wlan0").await.is_some() {
                arrived = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(arrived, "arrival was not applied to the registry");

        source.emit(PresenceEvent::Departed, "wlan0");
        let mut departed = false;
        for _ in 0..100 {
            if manager.get("wlan0").await.is_none() {
                departed = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(departed, "departure was not applied to the registry");
    }

    #[tokio::test]
    async fn agents_are_stopped_on_shutdown() {
        let manager = manager();
        let source = ScriptedSource::new(factory(), vec![]);
        let agent = Arc::new(DiscoveryAgent::new(
            Arc::clone(&source) as Arc<dyn DiscoverySource>
        ));
        manager.register_discovery_agent(agent).await.unwrap();

        manager.stop_discovery_agents();
        assert!(source.was_stopped());
    }
}
