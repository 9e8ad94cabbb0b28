//! Gateway state
//!
//! Application state shared by every route.

use crate::broadcast::IdleSweeper;
use crate::connection::TransportRegistry;
use changes_common::ChangesConfig;
use std::sync::Arc;

/// Gateway application state
#[derive(Clone)]
pub struct GatewayState {
    /// Sessions, subscriptions and fan-out
    registry: Arc<TransportRegistry>,
    /// Periodic expiry sweep over `registry`
    sweeper: Arc<IdleSweeper>,
    /// Engine tuning
    config: Arc<ChangesConfig>,
}

impl GatewayState {
    /// Create a new gateway state
    pub fn new(
        registry: Arc<TransportRegistry>,
        sweeper: Arc<IdleSweeper>,
        config: ChangesConfig,
    ) -> Self {
        Self {
            registry,
            sweeper,
            config: Arc::new(config),
        }
    }

    /// Get the transport registry
    pub fn registry(&self) -> &Arc<TransportRegistry> {
        &self.registry
    }

    /// Get the idle sweeper
    pub fn sweeper(&self) -> &Arc<IdleSweeper> {
        &self.sweeper
    }

    /// Get the engine configuration
    pub fn config(&self) -> &ChangesConfig {
        &self.config
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("registry", &self.registry)
            .field("sweeper", &self.sweeper)
            .field("config", &self.config)
            .finish()
    }
}
