// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command line settings, persisted as RON.

use riffbox_function::DEFAULT_INDENTATION_WIDTH;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// File looked up in the working directory when no path is given
pub const SETTINGS_FILE: &str = "riffbox.ron";

/// Log directive used when neither `RUST_LOG` nor the settings provide one
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Error loading or saving settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// File could not be read or written
    #[error("Settings file {}: {source}", path.display())]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File is not valid RON for [`Settings`]
    #[error("Invalid settings: {0}")]
    Parse(String),

    /// Settings could not be rendered as RON
    #[error("Failed to serialize settings: {0}")]
    Serialize(String),

    /// File was written by a newer version
    #[error("Settings version {found} is newer than supported version {}", SETTINGS_FORMAT_VERSION)]
    UnsupportedVersion {
        /// Version found in the file
        found: u32,
    },
}

/// Command line settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Format version
    pub version: u32,
    /// Pixels per nesting level for drop projection
    pub indentation_width: f32,
    /// Default log directive, overridden by `RUST_LOG`
    pub log_filter: String,
    /// Pretty-print JSON output
    pub pretty_output: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            indentation_width: DEFAULT_INDENTATION_WIDTH,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            pretty_output: true,
        }
    }
}

impl Settings {
    /// Parse settings from RON text
    pub fn from_ron(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings =
            ron::from_str(content).map_err(|e| SettingsError::Parse(e.to_string()))?;
        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(SettingsError::UnsupportedVersion {
                found: settings.version,
            });
        }
        Ok(settings)
    }

    /// Render settings as pretty RON
    pub fn to_ron(&self) -> Result<String, SettingsError> {
        let config = ron::ser::PrettyConfig::default().struct_names(true);
        ron::ser::to_string_pretty(self, config).map_err(|e| SettingsError::Serialize(e.to_string()))
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron(&content)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        std::fs::write(path, self.to_ron()?).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `explicit`, else from [`SETTINGS_FILE`] in the working
    /// directory, else fall back to defaults
    pub fn locate(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let local = Path::new(SETTINGS_FILE);
        if local.is_file() {
            return Self::load(local);
        }
        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.version, SETTINGS_FORMAT_VERSION);
        assert_eq!(settings.indentation_width, 50.0);
        assert_eq!(settings.log_filter, "info");
        assert!(settings.pretty_output);
    }

    #[test]
    fn test_serialization() {
        let settings = Settings {
            indentation_width: 24.0,
            pretty_output: false,
            ..Settings::default()
        };
        let ron_str = settings.to_ron().unwrap();
        assert_eq!(Settings::from_ron(&ron_str).unwrap(), settings);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings = Settings::from_ron("(indentation_width: 30.0)").unwrap();
        assert_eq!(settings.indentation_width, 30.0);
        assert_eq!(settings.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_rejects_newer_version() {
        assert!(matches!(
            Settings::from_ron("(version: 99)"),
            Err(SettingsError::UnsupportedVersion { found: 99 })
        ));
        assert!(matches!(
            Settings::from_ron("(indentation_width: \"wide\")"),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("riffbox-settings-{}.ron", std::process::id()));
        let settings = Settings {
            log_filter: "riffbox_function=trace".to_string(),
            ..Settings::default()
        };
        settings.save(&path).unwrap();
        let loaded = Settings::locate(Some(&path)).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, settings);
        assert!(Settings::load(&path).is_err());
    }
}
