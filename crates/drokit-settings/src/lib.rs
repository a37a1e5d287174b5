//! DROKit Settings Crate
//!
//! Handles readout configuration: defaults, validation and persistence.

pub mod config;
pub mod error;

pub use config::{default_config_path, parse_axes, DroConfig};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
