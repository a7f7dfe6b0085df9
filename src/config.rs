// Application configuration - RON file in the platform config directory

use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const APP_DIR: &str = "tempo_stack";
const CONFIG_FILE: &str = "config.ron";
const STACKS_FILE: &str = "stacks.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Failed to write config: {0}")]
    Write(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Settings loaded at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where the stack library lives
    pub stacks_path: PathBuf,
    /// Open an audio device for clicks. Off means silent playback.
    pub audio_enabled: bool,
    /// Click gain, 0.0 to 1.0
    pub click_volume: f32,
    pub notification_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            stacks_path: default_stacks_path(),
            audio_enabled: true,
            click_volume: 0.5,
            notification_capacity: 256,
        }
    }
}

fn default_stacks_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(STACKS_FILE)
}

/// Path of the config file, if the platform has a config directory
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

impl AppConfig {
    /// Load from the default location, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = default_config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}, using defaults", e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config: Self = ron::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Write(e.to_string()))?;
        }
        let text = ron::ser::to_string_pretty(self, PrettyConfig::default())
            .map_err(|e| ConfigError::Write(e.to_string()))?;
        fs::write(path, text).map_err(|e| ConfigError::Write(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.click_volume) {
            return Err(ConfigError::Invalid(format!(
                "click_volume must be between 0 and 1, got {}",
                self.click_volume
            )));
        }
        if self.notification_capacity == 0 {
            return Err(ConfigError::Invalid(
                "notification_capacity must be at least 1".to_string(),
            ));
        }
        if self.stacks_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("stacks_path is empty".to_string()));
        }
        Ok(())
    }
}
