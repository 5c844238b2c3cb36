//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/studydash/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/studydash/` (~/.config/studydash/)
//! - Data: `$XDG_DATA_HOME/studydash/` (~/.local/share/studydash/)
//! - State/Logs: `$XDG_STATE_HOME/studydash/` (~/.local/state/studydash/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

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
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Focus timer configuration
    #[serde(default)]
    pub timer: TimerConfig,

    /// Report rendering configuration
    #[serde(default)]
    pub report: ReportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Focus timer configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TimerConfig {
    /// Focus length used when none is given on the command line
    #[serde(default = "default_focus_minutes")]
    pub default_minutes: u32,

    /// Selectable focus lengths
    #[serde(default = "default_presets")]
    pub presets: Vec<u32>,

    /// Break length after a completed focus interval
    #[serde(default = "default_break_minutes")]
    pub break_minutes: u32,

    /// Start a break automatically after each focus interval
    #[serde(default = "default_auto_break")]
    pub auto_break: bool,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            default_minutes: default_focus_minutes(),
            presets: default_presets(),
            break_minutes: default_break_minutes(),
            auto_break: default_auto_break(),
        }
    }
}

impl TimerConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.default_minutes == 0 {
            return Err(Error::Config(
                "timer.default_minutes must be greater than 0".to_string(),
            ));
        }
        if self.break_minutes == 0 {
            return Err(Error::Config(
                "timer.break_minutes must be greater than 0".to_string(),
            ));
        }
        if self.presets.iter().any(|&p| p == 0) {
            return Err(Error::Config("timer.presets must not contain 0".to_string()));
        }
        if !self.presets.is_empty() && !self.presets.contains(&self.default_minutes) {
            return Err(Error::Config(format!(
                "timer.default_minutes ({}) must be one of the presets {:?}",
                self.default_minutes, self.presets
            )));
        }
        Ok(())
    }
}

fn default_focus_minutes() -> u32 {
    25
}

fn default_presets() -> Vec<u32> {
    vec![15, 25, 45, 60]
}

fn default_break_minutes() -> u32 {
    5
}

fn default_auto_break() -> bool {
    true
}

/// Report rendering configuration
#[derive(Debug, Deserialize, Default, Clone)]
pub struct ReportConfig {
    /// Export format used when `--export` is not given ("md" or "json")
    pub default_export: Option<String>,
}

/// Logging configuration
#[derive(Debug, Deserialize)]
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
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.timer.validate()?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/studydash/config.toml` (~/.config/studydash/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("studydash").join("config.toml")
    }

    /// Returns the data directory path (for SQLite database)
    ///
    /// `$XDG_DATA_HOME/studydash/` (~/.local/share/studydash/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("studydash")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/studydash/` (~/.local/state/studydash/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("studydash")
    }

    /// Returns the database file path
    ///
    /// `$XDG_DATA_HOME/studydash/studydash.db`
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("studydash.db")
    }
}
