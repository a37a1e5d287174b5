//! Configuration for DROKit
//!
//! Provides configuration file handling and validation. Supports JSON and
//! TOML file formats; the default file lives in the platform config
//! directory (`<config_dir>/drokit/drokit.toml`).
//!
//! Axis labels may be written as a list (`["X", "Y", "Z"]`) or as a compact
//! string (`"XYZ"`), one letter per axis.

use crate::error::{ConfigError, SettingsError, SettingsResult};
use drokit_core::data::coordinate::LOCAL_SYSTEM_NAMES;
use drokit_core::{DisplayUnit, DroVariant, EngineOptions};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directory name under the platform config directory
pub const CONFIG_DIR_NAME: &str = "drokit";

/// Default config file name
pub const CONFIG_FILE_NAME: &str = "drokit.toml";

/// Upper bound for the poll period
pub const MAX_POLL_INTERVAL_MS: u64 = 10_000;

/// Split a compact axis string such as `"XYZ"` into labels
///
/// Whitespace and commas are ignored, so `"X, Y, Z"` works too.
pub fn parse_axes(compact: &str) -> Vec<String> {
    compact
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .map(|c| c.to_ascii_uppercase().to_string())
        .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AxesRepr {
    Compact(String),
    List(Vec<String>),
}

fn deserialize_axes<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match AxesRepr::deserialize(deserializer)? {
        AxesRepr::Compact(s) => parse_axes(&s),
        AxesRepr::List(v) => v,
    })
}

/// Complete readout configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DroConfig {
    /// Axis labels in feed order
    #[serde(deserialize_with = "deserialize_axes")]
    pub axes: Vec<String>,
    /// Local offsets or controller work offsets
    pub variant: DroVariant,
    /// Unit shown at startup
    pub display_unit: DisplayUnit,
    /// Unit of raw feed positions
    pub machine_unit: DisplayUnit,
    /// 0 = info, 1 = debug, 2+ = trace
    pub verbosity: u8,
    /// Tick period
    pub poll_interval_ms: u64,
    /// Local variant: table index active at startup (0 is the machine system)
    pub initial_system: usize,
    /// How long a controller mode switch may take
    pub mode_timeout_ms: u64,
}

impl Default for DroConfig {
    fn default() -> Self {
        Self {
            axes: parse_axes("XYZ"),
            variant: DroVariant::Local,
            display_unit: DisplayUnit::Inch,
            machine_unit: DisplayUnit::Inch,
            verbosity: 0,
            poll_interval_ms: 100,
            initial_system: 1,
            mode_timeout_ms: 5000,
        }
    }
}

enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> SettingsResult<Format> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Format::Json),
        Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(Format::Toml),
        other => Err(ConfigError::UnsupportedFormat(other.unwrap_or("").to_string()).into()),
    }
}

/// Default config file location
pub fn default_config_path() -> SettingsResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
        .ok_or_else(|| {
            SettingsError::ConfigDirectory("no platform config directory".to_string())
        })
}

impl DroConfig {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::LoadError {
            path: path.display().to_string(),
            source,
        })?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Load `path` if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            info!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML), creating parent directories
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        let write_err = |source| SettingsError::SaveError {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(path, content).map_err(write_err)?;

        debug!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.axes.is_empty() {
            return Err(ConfigError::InvalidSetting {
                key: "axes".to_string(),
                reason: "at least one axis is required".to_string(),
            });
        }
        if self.axes.len() > 9 {
            return Err(ConfigError::ValueOutOfRange {
                key: "axes".to_string(),
                value: self.axes.len().to_string(),
            });
        }

        let mut seen = HashSet::new();
        for label in &self.axes {
            let mut chars = label.chars();
            let single_letter = matches!(
                (chars.next(), chars.next()),
                (Some(c), None) if c.is_ascii_alphabetic()
            );
            if !single_letter {
                return Err(ConfigError::InvalidSetting {
                    key: "axes".to_string(),
                    reason: format!("label '{}' must be a single letter", label),
                });
            }
            if !seen.insert(label.to_ascii_uppercase()) {
                return Err(ConfigError::InvalidSetting {
                    key: "axes".to_string(),
                    reason: format!("duplicate label {}", label),
                });
            }
        }

        if self.poll_interval_ms == 0 || self.poll_interval_ms > MAX_POLL_INTERVAL_MS {
            return Err(ConfigError::ValueOutOfRange {
                key: "poll_interval_ms".to_string(),
                value: self.poll_interval_ms.to_string(),
            });
        }

        if self.initial_system >= LOCAL_SYSTEM_NAMES.len() {
            return Err(ConfigError::ValueOutOfRange {
                key: "initial_system".to_string(),
                value: self.initial_system.to_string(),
            });
        }

        if self.mode_timeout_ms == 0 {
            return Err(ConfigError::ValueOutOfRange {
                key: "mode_timeout_ms".to_string(),
                value: "0".to_string(),
            });
        }

        Ok(())
    }

    /// Engine construction options for this config
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            axes: self.axes.clone(),
            variant: self.variant,
            display_unit: self.display_unit,
            machine_unit: self.machine_unit,
            initial_system: self.initial_system,
        }
    }
}
