//! Engine configuration.
//!
//! A [`Config`] is layered by `ortho_config`: built-in defaults first, then
//! a TOML file named by `--config-path` or `PRISM_CONFIG_PATH`, then
//! `PRISM_*` environment variables, then command-line flags. Later layers
//! win.

use std::ffi::OsString;
use std::sync::Arc;
use std::time::Duration;

use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::defaults::{DEFAULT_DEBOUNCE_MS, default_log_filter_string, default_log_format};
use crate::logging::LogFormat;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// One or more configuration layers could not be read or merged.
    #[error("failed to load configuration: {0}")]
    Load(#[from] Arc<OrthoError>),
}

/// Settings shared by the matching engine and its host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(prefix = "PRISM")]
pub struct Config {
    log_filter: String,
    log_format: LogFormat,
    debounce_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl Config {
    /// Loads the layered configuration for the running process.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] when a layer is malformed. Failures in
    /// several layers are reported together.
    pub fn resolve() -> Result<Self, ConfigError> {
        Ok(Self::load()?)
    }

    /// Loads the layered configuration with `args` as the command line.
    ///
    /// The first argument is the program name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] when a layer is malformed.
    pub fn resolve_from<I>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = OsString>,
    {
        Ok(Self::load_from_iter(args)?)
    }

    /// Returns the log filter expression.
    #[must_use]
    pub const fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Returns the log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Returns the debounce delay in milliseconds.
    #[must_use]
    pub const fn debounce_ms(&self) -> u64 {
        self.debounce_ms
    }

    /// Returns the debounce delay.
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Replaces the log filter expression.
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Replaces the log output format.
    #[must_use]
    pub const fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    /// Replaces the debounce delay.
    #[must_use]
    pub const fn with_debounce_ms(mut self, millis: u64) -> Self {
        self.debounce_ms = millis;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::default_debounce;

    #[test]
    fn defaults_match_the_documented_values() {
        let config = Config::default();

        assert_eq!(config.log_filter(), "info");
        assert_eq!(config.log_format(), LogFormat::Json);
        assert_eq!(config.debounce(), default_debounce());
    }

    #[test]
    fn builders_replace_single_fields() {
        let config = Config::default()
            .with_log_filter("warn")
            .with_log_format(LogFormat::Compact)
            .with_debounce_ms(0);

        assert_eq!(config.log_filter(), "warn");
        assert_eq!(config.log_format(), LogFormat::Compact);
        assert_eq!(config.debounce(), Duration::ZERO);
    }
}
