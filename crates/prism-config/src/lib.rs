//! Configuration and telemetry for the prism matching engine.
//!
//! [`Config`] carries the settings a host passes to the engine: the log
//! filter, the log format and the debounce delay of the incremental
//! scheduler. [`telemetry::initialise`] installs a structured `tracing`
//! subscriber for them.
//!
//! ```rust,ignore
//! use prism_config::{Config, telemetry};
//!
//! let config = Config::resolve()?;
//! telemetry::initialise(&config)?;
//! ```

mod config;
pub mod defaults;
mod logging;
pub mod telemetry;

pub use config::{Config, ConfigError};
pub use defaults::{
    DEFAULT_DEBOUNCE_MS, DEFAULT_LOG_FILTER, default_debounce, default_log_filter,
    default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use telemetry::{TelemetryError, TelemetryHandle};
