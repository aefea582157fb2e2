//! Shared application state for the HTTP front door.

use std::sync::Arc;

use tracing::{error, info};

use crate::config::ServerConfig;
use crate::core::realtime::{GeminiLive, SharedRealtime};

/// Application state shared by all handlers.
///
/// The bridge is constructed once at startup. When construction fails the
/// error is kept so every chat request can report it, while the liveness
/// endpoint keeps answering.
pub struct AppState {
    pub config: ServerConfig,
    bridge: Option<SharedRealtime>,
    bridge_error: Option<String>,
}

impl AppState {
    /// Build the state and the Gemini Live bridge from configuration.
    pub fn new(config: ServerConfig) -> Arc<Self> {
        let bridge = config
            .realtime_config()
            .and_then(|realtime| GeminiLive::new(realtime).map_err(|e| e.to_string()));

        match bridge {
            Ok(bridge) => {
                info!(
                    model = bridge.model(),
                    voice = %bridge.voice(),
                    "Upstream session bridge initialized"
                );
                Self::with_bridge(config, Arc::new(bridge))
            }
            Err(e) => {
                error!("Failed to initialize upstream session bridge: {}", e);
                Arc::new(Self {
                    config,
                    bridge: None,
                    bridge_error: Some(e),
                })
            }
        }
    }

    /// Build the state around an already constructed bridge.
    pub fn with_bridge(config: ServerConfig, bridge: SharedRealtime) -> Arc<Self> {
        Arc::new(Self {
            config,
            bridge: Some(bridge),
            bridge_error: None,
        })
    }

    /// The bridge, or the reason it is unavailable.
    pub fn bridge(&self) -> Result<&SharedRealtime, &str> {
        match &self.bridge {
            Some(bridge) => Ok(bridge),
            None => Err(self
                .bridge_error
                .as_deref()
                .unwrap_or("upstream session bridge is not initialized")),
        }
    }

    pub fn is_bridge_ready(&self) -> bool {
        self.bridge.is_some()
    }
}
