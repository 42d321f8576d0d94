//! Daemon binary: wires the access-point manager to an nl80211 discovery
//! agent and runs until SIGTERM/SIGINT trigger a graceful shutdown.

use std::sync::Arc;

use anyhow::Context;
use tokio::signal::unix::{SignalKind, signal};
use tracing::info;
use tracing_subscriber::EnvFilter;

use apcontrol_core::access_point::AccessPointFactory;
use apcontrol_core::config::{ServiceConfig, service_config_from_toml_str};
use apcontrol_core::controller::HostapdControllerFactory;
use apcontrol_core::discovery::DiscoveryAgent;
use apcontrol_core::discovery::netlink::NetlinkDiscovery;
use apcontrol_core::manager::AccessPointManager;

/// Environment variable naming an optional TOML configuration file.
const CONFIG_ENV_VAR: &str = "APCONTROL_CONFIG";

fn load_config() -> anyhow::Result<ServiceConfig> {
    match std::env::var(CONFIG_ENV_VAR) {
        Ok(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read configuration file {path}"))?;
            let config = service_config_from_toml_str(&raw)
                .with_context(|| format!("failed to parse configuration file {path}"))?;
            info!(path = %path, "loaded configuration");
            Ok(config)
        }
        Err(_) => Ok(ServiceConfig::default()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = load_config()?;
    info!(
        control_socket_dir = %config.control_socket_dir.display(),
        "starting access-point control service"
    );

    let controller_factory = Arc::new(HostapdControllerFactory::new(
        config.control_socket_dir.clone(),
        config.command_timeout,
    ));
    let access_point_factory =
        AccessPointFactory::new(controller_factory, config.static_attributes.clone());

    let manager = AccessPointManager::new(config.probe_timeout);
    let agent = Arc::new(DiscoveryAgent::new(NetlinkDiscovery::new(
        access_point_factory,
    )));
    manager
        .register_discovery_agent(agent)
        .await
        .context("failed to register netlink discovery agent")?;

    let mut sigterm = signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("SIGINT received"),
        _ = sigterm.recv() => info!("SIGTERM received"),
    }

    info!("stopping discovery and shutting down");
    manager.stop_discovery_agents();

    Ok(())
}
