//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Narration voice gender preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceGender {
    #[default]
    Female,
    Male,
}

impl std::fmt::Display for VoiceGender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VoiceGender::Female => write!(f, "Female"),
            VoiceGender::Male => write!(f, "Male"),
        }
    }
}

/// Narration delivery tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceTone {
    #[default]
    Friendly,
    Formal,
    Energetic,
}

impl std::fmt::Display for VoiceTone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VoiceTone::Friendly => write!(f, "Friendly"),
            VoiceTone::Formal => write!(f, "Formal"),
            VoiceTone::Energetic => write!(f, "Energetic"),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application version
    pub version: String,
    /// Data directory path
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// Narration voice settings
    pub voice: VoiceSettings,
    /// Tour behavior settings
    pub tour: TourSettings,
    /// Backend settings
    pub backend: BackendSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            data_dir: PathBuf::new(),
            voice: VoiceSettings::default(),
            tour: TourSettings::default(),
            backend: BackendSettings::default(),
        }
    }
}

/// Narration voice settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceSettings {
    /// Preferred voice gender
    pub gender: VoiceGender,
    /// Delivery tone
    pub tone: VoiceTone,
    /// Speech rate multiplier (0.5-2.0)
    pub rate: f32,
    /// Play ambient background audio under narration
    pub background_ambience: bool,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            gender: VoiceGender::Female,
            tone: VoiceTone::Friendly,
            rate: 1.0,
            background_ambience: false,
        }
    }
}

/// Tour behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourSettings {
    /// Trigger radius for POIs without their own, in meters
    pub default_radius_m: f64,
    /// Narration length for POIs without their own, in seconds
    pub default_audio_length_secs: f64,
    /// Playback tick interval in seconds
    pub tick_interval_secs: f64,
    /// Location poll interval in seconds
    pub location_poll_secs: f64,
    /// Use the built-in catalog instead of the backend
    pub offline_mode: bool,
}

impl Default for TourSettings {
    fn default() -> Self {
        Self {
            default_radius_m: crate::catalog::DEFAULT_RADIUS_M,
            default_audio_length_secs: crate::catalog::DEFAULT_AUDIO_LENGTH_SECS,
            tick_interval_secs: crate::session::ticker::DEFAULT_TICK_INTERVAL_SECS,
            location_poll_secs: 2.0,
            offline_mode: false,
        }
    }
}

/// Backend connection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendSettings {
    /// REST base URL; empty disables the backend
    pub base_url: String,
    /// API key sent with every request
    pub api_key: String,
}

impl BackendSettings {
    /// Whether the backend is configured at all.
    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty() && !self.api_key.is_empty()
    }
}

/// Get the application data directory.
pub fn get_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "providenceit", "WorldTour")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the configuration file path.
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("config.toml")
}

/// Load application configuration, falling back to defaults when the file
/// does not exist yet.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&get_config_path())
}

/// Load configuration from an explicit path.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        let config = AppConfig {
            data_dir: get_data_dir(),
            ..Default::default()
        };
        return Ok(config);
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

    let mut config: AppConfig =
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    config.data_dir = get_data_dir();

    Ok(config)
}

/// Save application configuration to file.
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(config, &get_config_path())
}

/// Save configuration to an explicit path.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
    }

    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

    Ok(())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
