use lottohunt_core::{Config, SanitizedConfig, SessionCoordinator};

use crate::api::BridgeHub;

/// Shared application state
pub struct AppState {
    config: Config,
    coordinator: SessionCoordinator,
    bridge: BridgeHub,
}

impl AppState {
    pub fn new(config: Config, coordinator: SessionCoordinator, bridge: BridgeHub) -> Self {
        Self {
            config,
            coordinator,
            bridge,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn coordinator(&self) -> &SessionCoordinator {
        &self.coordinator
    }

    pub fn bridge(&self) -> &BridgeHub {
        &self.bridge
    }
}
