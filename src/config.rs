//! # Configuration Module
//!
//! Tuning knobs for aggregation, layout physics and timeline playback, stored
//! as JSON in the platform-standard config directory:
//!
//! - Linux: `~/.config/musemap/config.json`
//! - macOS: `~/Library/Application Support/musemap/config.json`
//! - Windows: `%APPDATA%\musemap\config.json`
//!
//! Every field has a default, so a missing file or a partial one is fine.
//!
//! ```json
//! {
//!   "aggregation": { "top_n": 80 },
//!   "layout": { "hover_scale": 1.3, "sizing": { "min_radius": 6.0 } },
//!   "playback_rate": 86400000.0
//! }
//! ```

use crate::aggregate::AggregationConfig;
use crate::layout::LayoutConfig;
use crate::temporal::DEFAULT_PLAYBACK_RATE;
use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Returns the platform-appropriate config directory, creating it if needed.
///
/// # Errors
///
/// Fails when the system config directory cannot be determined or the
/// `musemap` subdirectory cannot be created.
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().ok_or_else(|| {
        anyhow::anyhow!(
            "Could not determine system config directory. Pass --config to point at a settings file."
        )
    })?;

    let dir = config_dir.join("musemap");
    fs::create_dir_all(&dir).with_context(|| {
        format!(
            "Failed to create musemap config directory at {}. Please check file permissions.",
            dir.display()
        )
    })?;
    Ok(dir)
}

/// Path of the default settings file.
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.json"))
}

/// All user-tunable settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub aggregation: AggregationConfig,
    pub layout: LayoutConfig,
    /// Timeline playback speed in library milliseconds per second
    pub playback_rate: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            aggregation: AggregationConfig::default(),
            layout: LayoutConfig::default(),
            playback_rate: DEFAULT_PLAYBACK_RATE,
        }
    }
}

impl Settings {
    /// Load from the default location, falling back to defaults when the
    /// file does not exist.
    pub fn load() -> Result<Self> {
        let path = get_config_path()?;
        if !path.exists() {
            debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let settings: Settings = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid settings JSON in {}", path.display()))?;
        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load from `path` when given, otherwise from the default location.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => Self::load(),
        }
    }

    /// Write to the default location.
    pub fn save(&self) -> Result<PathBuf> {
        let path = get_config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Write pretty JSON to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write settings file {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_file_keeps_defaults() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"aggregation":{"top_n":12},"layout":{"sizing":{"min_radius":9.0}}}"#)?;

        let settings = Settings::load_from(&path)?;
        assert_eq!(settings.aggregation.top_n, 12);
        assert_eq!(settings.layout.sizing.min_radius, 9.0);
        assert_eq!(settings.layout.hover_scale, LayoutConfig::default().hover_scale);
        assert_eq!(settings.playback_rate, DEFAULT_PLAYBACK_RATE);
        Ok(())
    }

    #[test]
    fn test_save_then_load() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("config.json");
        let mut settings = Settings::default();
        settings.layout.collision_margin = 5.5;
        settings.save_to(&path)?;

        assert_eq!(Settings::load_from(&path)?, settings);
        Ok(())
    }

    #[test]
    fn test_invalid_json_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ nope").unwrap();

        let err = Settings::load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("broken.json"));
    }

    #[test]
    fn test_resolve_prefers_explicit_path() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("custom.json");
        fs::write(&path, r#"{"playback_rate": 1000.0}"#)?;
        assert_eq!(Settings::resolve(Some(&path))?.playback_rate, 1000.0);
        Ok(())
    }
}
