use std::sync::Arc;
use tracing::info;

use crate::console::interceptor::ConsoleInterceptor;
use crate::kernel::config::{ConfigError, EngineConfig};
use crate::network::interceptor::NetworkInterceptor;
use crate::session::{ConsoleSession, NetworkSession};

/// Both sessions wired to a pair of interceptors, started per config.
pub struct Engine {
    pub config: EngineConfig,
    pub console: ConsoleSession,
    pub network: NetworkSession,
}

impl Engine {
    /// Uses the process-wide interceptors.
    pub fn start(config: EngineConfig) -> Result<Self, ConfigError> {
        Self::with_interceptors(config, ConsoleInterceptor::instance(), NetworkInterceptor::instance())
    }

    pub fn with_interceptors(
        config: EngineConfig,
        console: Arc<ConsoleInterceptor>,
        network: Arc<NetworkInterceptor>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let engine = Self {
            console: ConsoleSession::new(console, config.console_auto_enabled),
            network: NetworkSession::new(network, config.network_auto_enabled),
            config,
        };
        info!(
            "Engine started (console: {}, network: {})",
            engine.console.is_interceptor_enabled(),
            engine.network.is_interceptor_enabled()
        );
        Ok(engine)
    }
}
