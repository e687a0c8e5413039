//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the watchface.toml file.
//! It provides a centralized way to configure the face's fixed labels, message buffer
//! sizes, battery polling and the companion's weather source.

use crate::message::DEFAULT_BUFFER_SIZE;
use crate::weather::DEFAULT_INTERVAL_MINUTES;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default config file, relative to the working directory.
pub const CONFIG_FILE: &str = "watchface.toml";

/// Application configuration loaded from watchface.toml
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Fixed labels and placeholders
    pub face: FaceConfig,
    /// Message channel limits and request cadence
    pub messaging: MessagingConfig,
    /// Battery source settings
    pub battery: BatteryConfig,
    /// Weather source used by the companion
    pub companion: CompanionConfig,
}

/// Text shown before any live data arrives
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FaceConfig {
    /// Title label, never changes at runtime
    pub title: String,
    pub time_placeholder: String,
    pub weather_placeholder: String,
    pub value_placeholder: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MessagingConfig {
    /// Inbox buffer in bytes
    pub inbox_size: usize,
    /// Outbox buffer in bytes
    pub outbox_size: usize,
    /// Request weather on minutes divisible by this
    pub weather_interval_minutes: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BatteryConfig {
    /// Seconds between sysfs reads
    pub poll_seconds: u64,
    /// Reported when the host has no battery
    pub fallback_percent: u8,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompanionConfig {
    /// OpenWeatherMap API key; empty means the companion answers with the
    /// offline sample
    pub api_key: String,
    /// OpenWeatherMap location query, e.g. `q=Menlo Park,US` or `lat=..&lon=..`
    pub query: String,
    pub offline_temperature_f: i32,
    pub offline_conditions: String,
}

impl Default for FaceConfig {
    fn default() -> Self {
        FaceConfig {
            title: "facebook".to_string(),
            time_placeholder: "00:00".to_string(),
            weather_placeholder: "?? % ?? F".to_string(),
            value_placeholder: "FB Values".to_string(),
        }
    }
}

impl Default for MessagingConfig {
    fn default() -> Self {
        MessagingConfig {
            inbox_size: DEFAULT_BUFFER_SIZE,
            outbox_size: DEFAULT_BUFFER_SIZE,
            weather_interval_minutes: DEFAULT_INTERVAL_MINUTES,
        }
    }
}

impl Default for BatteryConfig {
    fn default() -> Self {
        BatteryConfig {
            poll_seconds: 60,
            fallback_percent: 100,
        }
    }
}

impl Default for CompanionConfig {
    fn default() -> Self {
        CompanionConfig {
            api_key: String::new(),
            query: "q=Menlo Park,US".to_string(),
            offline_temperature_f: 72,
            offline_conditions: "Clear".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!("Loaded configuration from {}", path.as_ref().display());
                    config
                }
                Err(e) => {
                    warn!("Invalid config file format: {}", e);
                    warn!("Using default configuration");
                    Self::default()
                }
            },
            Err(_) => {
                info!("No config file found, using default configuration");
                Self::default()
            }
        }
    }

    /// Save current configuration to `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents)?;
        info!("Configuration saved to {}", path.as_ref().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.face.title, "facebook");
        assert_eq!(config.face.weather_placeholder, "?? % ?? F");
        assert_eq!(config.messaging.inbox_size, 128);
        assert_eq!(config.messaging.outbox_size, 128);
        assert_eq!(config.messaging.weather_interval_minutes, 30);
        assert!(config.companion.api_key.is_empty());
    }

    #[test]
    fn test_config_roundtrip() {
        let file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.face.title = "values".to_string();
        config.battery.fallback_percent = 55;
        config.save(file.path()).unwrap();

        let loaded = Config::load_from_path(file.path());
        assert_eq!(loaded.face.title, "values");
        assert_eq!(loaded.battery.fallback_percent, 55);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[companion]\napi_key = \"abc\"\n").unwrap();
        assert_eq!(parsed.companion.api_key, "abc");
        assert_eq!(parsed.companion.query, "q=Menlo Park,US");
        assert_eq!(parsed.face.value_placeholder, "FB Values");
    }

    #[test]
    fn test_invalid_file_falls_back() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), "[messaging]\ninbox_size = \"big\"\n").unwrap();
        let config = Config::load_from_path(file.path());
        assert_eq!(config.messaging.inbox_size, 128);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let config = Config::load_from_path("/nonexistent/path");
        // Should fallback to default
        assert_eq!(config.face.title, "facebook");
    }
}
