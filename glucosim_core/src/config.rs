//! Configuration file support for glucosim.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/glucosim/config.toml`.

use crate::format::DisplayZone;
use crate::{Error, Result, SimulationInput};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// Where exports and reports are written
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
        }
    }
}

/// Timestamp rendering
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct DisplayConfig {
    /// Fixed offset east of UTC; local time when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc_offset_minutes: Option<i32>,
}

/// Inputs used for the initial simulation of an interactive run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_carbs_grams")]
    pub carbs_grams: f64,

    #[serde(default = "default_walk_minutes")]
    pub walk_minutes: f64,

    #[serde(default = "default_sleep_hours")]
    pub sleep_hours: f64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            carbs_grams: default_carbs_grams(),
            walk_minutes: default_walk_minutes(),
            sleep_hours: default_sleep_hours(),
        }
    }
}

impl DefaultsConfig {
    pub fn input(&self) -> SimulationInput {
        SimulationInput::new(self.carbs_grams, self.walk_minutes, self.sleep_hours)
    }
}

// Default value functions
fn default_out_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("glucosim").join("exports")
}

fn default_carbs_grams() -> f64 {
    45.0
}

fn default_walk_minutes() -> f64 {
    30.0
}

fn default_sleep_hours() -> f64 {
    7.0
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("glucosim").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Reject values the simulator cannot work with
    pub fn validate(&self) -> Result<()> {
        if let Some(minutes) = self.display.utc_offset_minutes {
            if DisplayZone::from_offset_minutes(minutes).is_none() {
                return Err(Error::Config(format!(
                    "utc_offset_minutes out of range: {}",
                    minutes
                )));
            }
        }

        let defaults = [
            ("carbs_grams", self.defaults.carbs_grams),
            ("walk_minutes", self.defaults.walk_minutes),
            ("sleep_hours", self.defaults.sleep_hours),
        ];
        for (name, value) in defaults {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Config(format!(
                    "defaults.{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }

    /// Zone used when printing export dates and times
    pub fn display_zone(&self) -> DisplayZone {
        self.display
            .utc_offset_minutes
            .and_then(DisplayZone::from_offset_minutes)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.export.out_dir.ends_with("glucosim/exports"));
        assert_eq!(config.display.utc_offset_minutes, None);
        assert_eq!(config.display_zone(), DisplayZone::Local);
        assert_eq!(config.defaults.input(), SimulationInput::new(45.0, 30.0, 7.0));
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.display.utc_offset_minutes = Some(120);
        config.defaults.sleep_hours = 6.5;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.display.utc_offset_minutes, Some(120));
        assert_eq!(loaded.defaults.sleep_hours, 6.5);
        assert_eq!(loaded.export.out_dir, config.export.out_dir);
        assert_eq!(
            loaded.display_zone(),
            DisplayZone::from_offset_minutes(120).unwrap()
        );
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[defaults]
carbs_grams = 60.0
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.defaults.carbs_grams, 60.0);
        assert_eq!(config.defaults.walk_minutes, 30.0); // default
        assert_eq!(config.defaults.sleep_hours, 7.0); // default
    }

    #[test]
    fn test_invalid_offset_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[display]\nutc_offset_minutes = 1440\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_negative_default_rejected() {
        let toml_str = "[defaults]\nwalk_minutes = -5.0\n";
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_err());
    }
}
