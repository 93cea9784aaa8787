//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/deskwatch/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/deskwatch/` (~/.config/deskwatch/)
//! - Data: `$XDG_DATA_HOME/deskwatch/` (~/.local/share/deskwatch/)
//! - State/Logs: `$XDG_STATE_HOME/deskwatch/` (~/.local/state/deskwatch/)

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Config {
    /// Tracker cadences and thresholds
    #[serde(default)]
    pub tracker: TrackerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Database location overrides
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Tracker cadences and thresholds
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TrackerConfig {
    /// Seconds of no input before the user counts as idle
    #[serde(default = "default_idle_threshold")]
    pub idle_threshold_secs: u64,

    /// Seconds between heartbeat writes
    #[serde(default = "default_heartbeat_every")]
    pub heartbeat_every_secs: u64,

    /// Seconds a window must stay focused before its real duration is
    /// recorded; 0 records every focus change
    #[serde(default)]
    pub window_event_interval_secs: u64,

    /// Milliseconds between scheduler ticks
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,

    /// Override for the tracked username (defaults to the OS account name)
    #[serde(default)]
    pub username: Option<String>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            idle_threshold_secs: default_idle_threshold(),
            heartbeat_every_secs: default_heartbeat_every(),
            window_event_interval_secs: 0,
            tick_interval_ms: default_tick_interval(),
            username: None,
        }
    }
}

fn default_idle_threshold() -> u64 {
    10
}

fn default_heartbeat_every() -> u64 {
    10
}

fn default_tick_interval() -> u64 {
    250
}

impl TrackerConfig {
    /// The username events are recorded under: the configured override, or
    /// the OS account name from the environment.
    pub fn username(&self) -> String {
        if let Some(name) = &self.username {
            return name.clone();
        }
        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string())
    }

    pub fn idle_threshold(&self) -> Duration {
        Duration::from_secs(self.idle_threshold_secs)
    }

    pub fn heartbeat_every(&self) -> Duration {
        Duration::from_secs(self.heartbeat_every_secs)
    }

    pub fn window_event_interval(&self) -> Duration {
        Duration::from_secs(self.window_event_interval_secs)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

/// Database location overrides
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct DatabaseConfig {
    /// Override path for the SQLite database file
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/deskwatch/config.toml` (~/.config/deskwatch/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("deskwatch").join("config.toml")
    }

    /// Returns the data directory path (for the SQLite database)
    ///
    /// `$XDG_DATA_HOME/deskwatch/` (~/.local/share/deskwatch/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("deskwatch")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/deskwatch/` (~/.local/state/deskwatch/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("deskwatch")
    }

    /// Returns the database file path: the configured override, or
    /// `$XDG_DATA_HOME/deskwatch/data.db`
    pub fn database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| Self::data_dir().join("data.db"))
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/deskwatch/deskwatch.log`
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("deskwatch.log")
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// This is mainly for CLI binaries that want explicit, stable path behavior
    /// before invoking other components that read these env vars.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_DATA_HOME").is_err() {
            std::env::set_var("XDG_DATA_HOME", home.join(".local/share"));
        }

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}
