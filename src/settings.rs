/// Settings for completion filtering and usage rendering.
///
/// Every field has a default, so an empty (or missing) settings file is
/// valid. Example:
///
/// ```toml
/// [completion]
/// case_sensitive = false
/// max_suggestions = 20
///
/// [usage]
/// show_symbols = false
/// ```
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Root settings container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub completion: CompletionSettings,
    pub usage: UsageSettings,
}

/// How completion suggestions are filtered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionSettings {
    /// Match the partial token case-sensitively unless a completion opts out.
    pub case_sensitive: bool,
    /// Rank by fuzzy score when no suggestion has the typed prefix.
    pub fuzzy_fallback: bool,
    /// Cap on the number of suggestions returned.
    pub max_suggestions: Option<usize>,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            fuzzy_fallback: true,
            max_suggestions: None,
        }
    }
}

/// Which sections a rendered usage block contains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageSettings {
    pub show_arguments: bool,
    pub show_flags: bool,
    pub show_symbols: bool,
}

impl Default for UsageSettings {
    fn default() -> Self {
        Self {
            show_arguments: true,
            show_flags: true,
            show_symbols: true,
        }
    }
}

impl Settings {
    /// Parse settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Parse` on malformed TOML or unknown value types.
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(content)?)
    }

    /// Load settings from `path`.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Read` if the file cannot be read and
    /// `SettingsError::Parse` if it is not valid settings TOML.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }
}
