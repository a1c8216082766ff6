// ZoneLens - app/settings.rs
//
// Persisted UI preferences, read once at startup and passed to whoever needs
// them.
//
// - Saved atomically (write temp, rename) so a crash mid-save never corrupts
//   the previous file.
// - Load never fails: a missing or malformed file yields defaults.

use crate::util::constants::{SETTINGS_FILE_NAME, TEMP_FILE_SUFFIX};
use crate::util::error::SettingsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Colour theme of the designer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => f.write_str("light"),
            Self::Dark => f.write_str("dark"),
        }
    }
}

/// User preferences stored as `settings.json` in the data directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub theme: Theme,
}

/// Location of the settings file inside `data_dir`.
pub fn settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SETTINGS_FILE_NAME)
}

impl Settings {
    /// Load settings from `data_dir`, falling back to defaults.
    pub fn load(data_dir: &Path) -> Self {
        let path = settings_path(data_dir);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::debug!(path = %path.display(), error = %e, "Cannot read settings file");
                }
                return Self::default();
            }
        };
        match serde_json::from_str(&content) {
            Ok(settings) => {
                tracing::debug!(path = %path.display(), "Settings loaded");
                settings
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Settings file is malformed; using defaults"
                );
                Self::default()
            }
        }
    }

    /// Save settings to `data_dir` atomically, creating the directory if needed.
    pub fn save(&self, data_dir: &Path) -> Result<(), SettingsError> {
        std::fs::create_dir_all(data_dir).map_err(|e| SettingsError::Io {
            path: data_dir.to_path_buf(),
            source: e,
        })?;

        let path = settings_path(data_dir);
        let json =
            serde_json::to_string_pretty(self).map_err(|e| SettingsError::Serialise { source: e })?;

        let mut tmp_name = path.clone().into_os_string();
        tmp_name.push(TEMP_FILE_SUFFIX);
        let tmp = PathBuf::from(tmp_name);

        std::fs::write(&tmp, json.as_bytes()).map_err(|e| SettingsError::Io {
            path: tmp.clone(),
            source: e,
        })?;
        std::fs::rename(&tmp, &path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp);
            SettingsError::Io {
                path: path.clone(),
                source: e,
            }
        })?;

        tracing::debug!(path = %path.display(), theme = %self.theme, "Settings saved");
        Ok(())
    }
}
