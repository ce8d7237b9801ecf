//! Application settings management
//!
//! Non-sensitive configuration in a plain JSON file next to the token file.
//! Every field is optional; a missing file means defaults.

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, VaultError};
use crate::storage::{StoreFormat, STORE_FILE_NAME};

/// Directory name under the user's config directory
pub const DEFAULT_APP_NAME: &str = "token-vault";

/// Settings file name inside the config directory
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// How passwords are collected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptBackend {
    /// GUI dialog when a display is available, terminal otherwise
    #[default]
    Auto,
    /// Always use a `zenity --password` dialog
    Zenity,
    /// Always read from the terminal without echo
    Terminal,
}

impl std::str::FromStr for PromptBackend {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "zenity" => Ok(Self::Zenity),
            "terminal" => Ok(Self::Terminal),
            other => Err(VaultError::Settings(format!("unknown prompt backend: {}", other))),
        }
    }
}

/// Remote API the token is sent to
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiSettings {
    /// Base URL; endpoints are appended to it (e.g. "https://api.example.com")
    pub base_url: Option<String>,
    /// Value for the `X-Client-Version` header, if the API wants one
    pub client_version: Option<String>,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Settings file version
    pub version: u32,
    /// Token file location (defaults to `<config dir>/api-token.enc`)
    pub store_path: Option<PathBuf>,
    /// Token file layout
    pub format: StoreFormat,
    /// Password prompt backend
    pub prompt: PromptBackend,
    pub api: ApiSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: 1,
            store_path: None,
            format: StoreFormat::default(),
            prompt: PromptBackend::default(),
            api: ApiSettings::default(),
        }
    }
}

/// Settings manager
pub struct SettingsManager {
    config_dir: PathBuf,
    settings_file: PathBuf,
    settings: Settings,
}

impl SettingsManager {
    /// Load settings from `<config_dir>/settings.json`
    pub fn new(config_dir: &Path) -> Result<Self> {
        Self::from_file(config_dir, config_dir.join(SETTINGS_FILE_NAME))
    }

    /// Load settings from an explicit file; the token file still defaults
    /// to `config_dir`
    pub fn from_file(config_dir: &Path, settings_file: PathBuf) -> Result<Self> {
        let settings = Self::load_from_file(&settings_file)?;

        Ok(Self {
            config_dir: config_dir.to_path_buf(),
            settings_file,
            settings,
        })
    }

    /// The per-user config directory for `app_name`
    /// (`~/.config/<app_name>` on Linux)
    pub fn default_config_dir(app_name: &str) -> Result<PathBuf> {
        BaseDirs::new()
            .map(|dirs| dirs.config_dir().join(app_name))
            .ok_or_else(|| {
                VaultError::Settings("Could not determine config directory".to_string())
            })
    }

    fn load_from_file(path: &Path) -> Result<Settings> {
        if !path.exists() {
            debug!("No settings file at {:?}, using defaults", path);
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
            VaultError::Settings(format!("invalid settings file {}: {}", path.display(), e))
        })?;
        debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Save settings to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.settings_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&self.settings)?;

        // Write atomically using temp file
        let temp_path = self.settings_file.with_extension("tmp");
        std::fs::write(&temp_path, &contents)?;
        std::fs::rename(&temp_path, &self.settings_file)?;

        debug!("Saved settings to {:?}", self.settings_file);
        Ok(())
    }

    /// Get current settings
    pub fn get(&self) -> &Settings {
        &self.settings
    }

    /// Get mutable settings
    pub fn get_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn settings_file(&self) -> &Path {
        &self.settings_file
    }

    /// Token file path: the configured one, or `api-token.enc` in the
    /// config directory
    pub fn store_path(&self) -> PathBuf {
        self.settings
            .store_path
            .clone()
            .unwrap_or_else(|| self.config_dir.join(STORE_FILE_NAME))
    }
}
