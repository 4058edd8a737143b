//! Console configuration: a handful of knobs with sane defaults,
//! overridable from the environment. Embedders that carry a config file
//! can deserialize the same struct from it.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

const ENV_API_BASE: &str = "CONSOLE_API_BASE";
const ENV_DEBOUNCE_MS: &str = "CONSOLE_DEBOUNCE_MS";
const ENV_STORAGE_NAMESPACE: &str = "CONSOLE_STORAGE_NAMESPACE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid {ENV_DEBOUNCE_MS} value `{0}`, expected milliseconds")]
    InvalidDebounce(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Prefix for every API path.
    pub api_base: String,
    /// Trailing-edge debounce window for typed inputs.
    pub debounce_ms: u64,
    /// Namespace prefix for persisted per-user state.
    pub storage_namespace: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base: "/api".to_string(),
            debounce_ms: 300,
            storage_namespace: "console".to_string(),
        }
    }
}

impl ConsoleConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(base) = std::env::var(ENV_API_BASE) {
            config.api_base = base;
        }
        if let Ok(raw) = std::env::var(ENV_DEBOUNCE_MS) {
            config.debounce_ms = raw
                .parse()
                .map_err(|_| ConfigError::InvalidDebounce(raw.clone()))?;
        }
        if let Ok(namespace) = std::env::var(ENV_STORAGE_NAMESPACE) {
            config.storage_namespace = namespace;
        }
        Ok(config)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
