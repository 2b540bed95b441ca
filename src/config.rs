//! # Configuration Management Module
//!
//! Settings that decide how diagnostics are emitted and where channel
//! toggles persist. Configuration is stored in TOML at a platform-appropriate
//! location.
//!
//! ## Design Philosophy
//!
//! 1. **Fail-safe defaults**: a missing or corrupt file yields the defaults
//! 2. **Partial files**: every field has a default, so a file may set only what it needs
//! 3. **Platform compliance**: files live in the OS configuration directory
//!
//! ## Configuration Storage Locations
//!
//! - **Windows**: `%APPDATA%\Verbosity\config.toml`
//! - **macOS**: `~/Library/Application Support/Verbosity/config.toml`
//! - **Linux**: `~/.config/verbosity/config.toml`
//!
//! Channel masks themselves are not part of this file. They live in the
//! preference file next to it (`preferences.toml`) unless
//! `preferences_path` points elsewhere.

use crate::constants::{DEFAULT_LOG_FILTER, PREF_KEY_PREFIX};
use crate::stamp::{ColorMarkup, StampSource};
use crate::store::{FilePreferences, ToggleStore};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct VerbosityConfig {
    /// Master gate. When false nothing is formatted or emitted.
    pub enabled: bool,

    /// Prefix of every preference key (`<prefix><identity>`)
    pub key_prefix: String,

    /// Preference file holding channel masks. `None` uses the platform default.
    pub preferences_path: Option<PathBuf>,

    /// How colored labels are rendered
    pub markup: ColorMarkup,

    /// What the leading tick of each line shows
    pub stamp: StampSource,

    /// Filter used by the tracing subscriber when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for VerbosityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            key_prefix: PREF_KEY_PREFIX.to_string(),
            preferences_path: None,
            markup: ColorMarkup::default(),
            stamp: StampSource::default(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl VerbosityConfig {
    /// Load configuration from the platform location, falling back to defaults
    pub fn load() -> Self {
        match Self::config_path() {
            Ok(path) => Self::load_from(&path),
            Err(e) => {
                warn!("Failed to get config path: {}", e);
                Self::default()
            }
        }
    }

    /// Load configuration from `path`. Missing or invalid files yield defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Failed to parse config {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Write this configuration to the platform location
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;

        tracing::debug!("Configuration saved to: {}", path.display());
        Ok(())
    }

    /// Platform-appropriate configuration file path
    pub fn config_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Preference file for channel masks: the configured path, or
    /// `preferences.toml` next to the configuration file
    pub fn resolved_preferences_path(&self) -> Result<PathBuf, Box<dyn std::error::Error>> {
        match &self.preferences_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::config_dir()?.join("preferences.toml")),
        }
    }

    /// Toggle store backed by the preference file.
    ///
    /// If the file cannot be opened the store starts degraded: toggles are
    /// kept in memory only and [`ToggleStore::is_degraded`] reports it.
    pub fn toggle_store(&self) -> ToggleStore {
        let opened = self
            .resolved_preferences_path()
            .map_err(|e| e.to_string())
            .and_then(|path| FilePreferences::open(path).map_err(|e| e.to_string()));

        match opened {
            Ok(prefs) => ToggleStore::with_prefix(Arc::new(prefs), self.key_prefix.clone()),
            Err(e) => {
                warn!("Preference file unavailable ({}); toggles will not persist", e);
                ToggleStore::degraded(self.key_prefix.clone())
            }
        }
    }

    fn config_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
        let base = dirs::config_dir().ok_or("Could not find config directory")?;
        let dir = if cfg!(target_os = "windows") || cfg!(target_os = "macos") {
            base.join("Verbosity")
        } else {
            // Linux and other Unix-like systems
            base.join("verbosity")
        };
        Ok(dir)
    }
}
