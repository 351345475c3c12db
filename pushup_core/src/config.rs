//! Configuration file support for the push-up tracker.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/pushup/config.toml`.
//! It only seeds a brand-new state file; once state exists, the settings
//! stored there win.

use crate::types::{
    CountdownConfig, PersistedState, DEFAULT_DAILY_GOAL, DEFAULT_REST_DURATION_SECS,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl DataConfig {
    /// Location of the state snapshot inside `data_dir`
    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join("state.json")
    }
}

/// Initial values for a fresh install
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_daily_goal")]
    pub daily_goal: u32,

    #[serde(default = "default_rest_duration_secs")]
    pub rest_duration_secs: u32,

    #[serde(default = "default_countdown_minutes")]
    pub countdown_minutes: u32,

    #[serde(default)]
    pub countdown_seconds: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            daily_goal: default_daily_goal(),
            rest_duration_secs: default_rest_duration_secs(),
            countdown_minutes: default_countdown_minutes(),
            countdown_seconds: 0,
        }
    }
}

/// Logging configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|| PathBuf::from("."))
    });
    base.join("pushup")
}

fn default_daily_goal() -> u32 {
    DEFAULT_DAILY_GOAL
}

fn default_rest_duration_secs() -> u32 {
    DEFAULT_REST_DURATION_SECS
}

fn default_countdown_minutes() -> u32 {
    1
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("No config file found at {:?}, using defaults", config_path);
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
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|| PathBuf::from("."))
        });
        base.join("pushup").join("config.toml")
    }

    /// Reject values the engine cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.defaults.countdown_minutes > 59 || self.defaults.countdown_seconds > 59 {
            return Err(Error::Config(format!(
                "countdown default {}:{:02} out of range (max 59:59)",
                self.defaults.countdown_minutes, self.defaults.countdown_seconds
            )));
        }
        Ok(())
    }

    /// Snapshot used when no state file exists yet
    pub fn seed_state(&self) -> PersistedState {
        let mut state = PersistedState::default();
        state.settings.daily_goal = self.defaults.daily_goal;
        state.settings.rest_duration_secs = self.defaults.rest_duration_secs;
        state.countdown = CountdownConfig {
            minutes: self.defaults.countdown_minutes,
            seconds: self.defaults.countdown_seconds,
        };
        state.normalized()
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
