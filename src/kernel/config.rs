use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::format::DEFAULT_CHAR_LIMIT;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid engine config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("char_limit must be greater than zero")]
    ZeroCharLimit,
}

/// Bootstrap settings for the engine and its demo driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Enable console interception as soon as the engine starts.
    pub console_auto_enabled: bool,
    /// Enable network interception as soon as the engine starts.
    pub network_auto_enabled: bool,
    /// Upper bound on characters rendered per payload.
    pub char_limit: usize,
    /// `tracing_subscriber::EnvFilter` directive.
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            console_auto_enabled: false,
            network_auto_enabled: false,
            char_limit: DEFAULT_CHAR_LIMIT,
            log_filter: "info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Missing keys fall back to defaults.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.char_limit == 0 {
            return Err(ConfigError::ZeroCharLimit);
        }
        Ok(())
    }
}
