//! Configuration management for Card Swipe Kit
//!
//! Detector options and UI settings, persisted as TOML in a
//! platform-specific config file.
//!
//! ## Config File Locations
//!
//! | Platform | Path |
//! |----------|------|
//! | Linux | `~/.config/cardswipe-kit/config.toml` |
//! | macOS | `~/Library/Application Support/cardswipe-kit/config.toml` |
//! | Windows | `%APPDATA%\cardswipe-kit\config.toml` |
//!
//! Callbacks and custom parsers cannot live in a file; attach them with
//! [`SwipeDetector::builder`](crate::swipe::SwipeDetector::builder).
//!
//! ## Example
//!
//! ```no_run
//! use cardswipe_kit::Config;
//!
//! let mut config = Config::load().unwrap_or_default();
//! config.swipe.interdigit_timeout_ms = 400;
//! config.save().expect("Failed to save config");
//! ```

pub use crate::error::ConfigError;

use crate::error::SwipeError;
use crate::keyboard::CharCode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default pause allowed between two keystrokes of one swipe
pub const DEFAULT_INTERDIGIT_TIMEOUT_MS: u64 = 250;

/// Returns the path to the config file.
///
/// Creates the config directory if it doesn't exist.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    let app_dir = config_dir.join("cardswipe-kit");

    if !app_dir.exists() {
        fs::create_dir_all(&app_dir)?;
    }

    Ok(app_dir.join("config.toml"))
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Swipe detector settings
    #[serde(default)]
    pub swipe: SwipeConfig,
    /// UI settings
    #[serde(default)]
    pub ui: UiConfig,
}

/// Swipe detector options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwipeConfig {
    /// Start intercepting keystrokes as soon as the detector is built
    pub enabled: bool,
    /// Maximum pause between keystrokes of one swipe, in milliseconds
    pub interdigit_timeout_ms: u64,
    /// Parser names, tried in order
    pub parsers: Vec<String>,
    /// Stop after the end sentinel of track 1 and discard the rest
    pub first_line_only: bool,
    /// Character some readers send before the start sentinel
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix_character: Option<String>,
    /// Verbose tracing of keystrokes and state transitions
    pub debug: bool,
}

impl Default for SwipeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interdigit_timeout_ms: DEFAULT_INTERDIGIT_TIMEOUT_MS,
            parsers: vec!["generic".to_string()],
            first_line_only: false,
            prefix_character: None,
            debug: false,
        }
    }
}

impl SwipeConfig {
    /// Interdigit timeout, rejecting zero
    pub fn interdigit_timeout(&self) -> Result<Duration, SwipeError> {
        match self.interdigit_timeout_ms {
            0 => Err(SwipeError::InvalidTimeout),
            ms => Ok(Duration::from_millis(ms)),
        }
    }

    /// Character code of the prefix, if one is configured.
    ///
    /// An empty string counts as "no prefix".
    pub fn prefix_code(&self) -> Result<Option<CharCode>, SwipeError> {
        let Some(prefix) = self.prefix_character.as_deref() else {
            return Ok(None);
        };

        let mut chars = prefix.chars();
        match (chars.next(), chars.next()) {
            (None, _) => Ok(None),
            (Some(c), None) => Ok(Some(CharCode::from(c))),
            (Some(_), Some(_)) => Err(SwipeError::InvalidPrefix(prefix.to_string())),
        }
    }
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Refresh rate for UI updates (in Hz)
    pub refresh_rate_hz: u32,
    /// How long a status bar message stays visible, in seconds
    pub status_duration_secs: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            refresh_rate_hz: 60,
            status_duration_secs: 3,
        }
    }
}

impl Config {
    /// Load configuration from the default config file.
    ///
    /// Returns the default configuration if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to the default config file.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Get UI refresh interval as Duration
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / self.ui.refresh_rate_hz.max(1) as u64)
    }
}
