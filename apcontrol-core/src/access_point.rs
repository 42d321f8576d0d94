//! Access-point value object and the factory that materializes one per
//! discovered interface.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::Error;
use crate::controller::{AccessPointController, ControllerFactory};
use crate::ieee80211::{Capabilities, MacAddress};

/// One Wi-Fi interface operated as an access point. The interface name is
/// the identity; everything else is fixed at discovery time.
pub struct AccessPoint {
    interface_name: String,
    mac_address: Option<MacAddress>,
    attributes: HashMap<String, String>,
    capabilities: Capabilities,
    controller_factory: Arc<dyn ControllerFactory>,
}

impl AccessPoint {
    pub fn new(
        interface_name: impl Into<String>,
        mac_address: Option<MacAddress>,
        attributes: HashMap<String, String>,
        capabilities: Capabilities,
        controller_factory: Arc<dyn ControllerFactory>,
    ) -> AccessPoint {
        AccessPoint {
            interface_name: interface_name.into(),
            mac_address,
            attributes,
            capabilities,
            controller_factory,
        }
    }

    pub fn interface_name(&self) -> &str {
        &self.interface_name
    }

    pub fn mac_address(&self) -> Option<MacAddress> {
        self.mac_address
    }

    /// Static attributes supplied at registration, e.g. deployment labels.
    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Mints a fresh controller for this access point. Failure means the
    /// interface is not (or no longer) controllable.
    pub async fn create_controller(&self) -> Result<Box<dyn AccessPointController>, Error> {
        self.controller_factory
            .create_controller(&self.interface_name, &self.capabilities)
            .await
    }
}

impl fmt::Debug for AccessPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessPoint")
            .field("interface_name", &self.interface_name)
            .field("mac_address", &self.mac_address)
            .field("attributes", &self.attributes)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

/// Builds [`AccessPoint`] instances for discovered interfaces, attaching the
/// per-interface static attributes and the shared controller factory.
pub struct AccessPointFactory {
    controller_factory: Arc<dyn ControllerFactory>,
    static_attributes: HashMap<String, HashMap<String, String>>,
}

impl AccessPointFactory {
    pub fn new(
        controller_factory: Arc<dyn ControllerFactory>,
        static_attributes: HashMap<String, HashMap<String, String>>,
    ) -> Arc<AccessPointFactory> {
        Arc::new(AccessPointFactory {
            controller_factory,
            static_attributes,
        })
    }

    pub fn create(
        &self,
        interface_name: &str,
        mac_address: Option<MacAddress>,
        capabilities: Capabilities,
    ) -> Arc<AccessPoint> {
        let attributes = self
            .static_attributes
            .get(interface_name)
            .cloned()
            .unwrap_or_default();

        Arc::new(AccessPoint::new(
            interface_name,
            mac_address,
            attributes,
            capabilities,
            Arc::clone(&self.controller_factory),
        ))
    }
}
