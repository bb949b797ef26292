//! User configuration file handling
//!
//! Manages settings from <config dir>/linesetter/settings.json

use crate::layout::Alignment;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// User configuration from <config dir>/linesetter/settings.json
///
/// These settings override built-in defaults but are overridden by CLI arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ConfigFile {
    /// Glyph name `/?` stands for
    pub placeholder_glyph: Option<String>,
    /// Minimum interval between kerning previews while dragging
    pub kerning_throttle_ms: Option<u64>,
    pub default_align: Option<Alignment>,
    pub apply_kerning: Option<bool>,
    /// Line distance as a multiple of units per em
    pub line_spacing: Option<f64>,
    /// Log filter used when neither --log nor RUST_LOG is set
    pub log_filter: Option<String>,
}

impl ConfigFile {
    /// Get the path to the linesetter config directory
    pub fn config_dir() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")));
        config_dir.join("linesetter")
    }

    /// Get the path to the user config file
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("settings.json")
    }

    /// Get the path to the logs directory
    pub fn logs_dir() -> PathBuf {
        Self::config_dir().join("logs")
    }

    /// Load configuration from the user config file
    pub fn load() -> Option<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load a settings file; a missing or malformed file yields `None`.
    pub fn load_from(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    debug!("Loaded user settings from {:?}", path);
                    Some(config)
                }
                Err(e) => {
                    warn!("Failed to parse {:?}: {}", path, e);
                    None
                }
            },
            Err(e) => {
                warn!("Failed to read {:?}: {}", path, e);
                None
            }
        }
    }

    /// Save configuration to the user config file
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))?;

        debug!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Settings with every value spelled out at its default
    pub fn with_defaults() -> Self {
        Self {
            placeholder_glyph: Some(crate::text::DEFAULT_PLACEHOLDER_GLYPH.to_string()),
            kerning_throttle_ms: Some(crate::kerning::DEFAULT_THROTTLE.as_millis() as u64),
            default_align: Some(Alignment::Left),
            apply_kerning: Some(true),
            line_spacing: Some(crate::core::settings::DEFAULT_LINE_SPACING),
            log_filter: Some(crate::logging::DEFAULT_LOG_FILTER.to_string()),
        }
    }

    /// Create the settings file with default values, keeping an existing one.
    pub fn initialize_config_directory() -> anyhow::Result<PathBuf> {
        let settings_path = Self::config_path();
        if settings_path.exists() {
            println!("Settings file already exists: {:?}", settings_path);
        } else {
            Self::with_defaults().save_to(&settings_path)?;
            println!("Created settings file: {:?}", settings_path);
        }
        Ok(settings_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let config = ConfigFile::with_defaults();
        config.save_to(&path).unwrap();
        assert_eq!(ConfigFile::load_from(&path), Some(config));
    }

    #[test]
    fn test_partial_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        assert_eq!(ConfigFile::load_from(&path), None);

        fs::write(&path, r#"{ "default_align": "center" }"#).unwrap();
        let config = ConfigFile::load_from(&path).unwrap();
        assert_eq!(config.default_align, Some(Alignment::Center));
        assert_eq!(config.line_spacing, None);

        fs::write(&path, "{ not json").unwrap();
        assert_eq!(ConfigFile::load_from(&path), None);
    }
}
