use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::ErrorKind;

/// Application-level constants
pub const APP_NAME: &str = "Crumbler";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Closed allow-list of input extensions (compared lowercase, with the dot).
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    ".txt", ".html", ".xml", ".md", ".markdown", ".pdf", ".mp3", ".wav",
];

pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024; // 50MB

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Directory (relative to the working directory) that holds projects.
pub const DEFAULT_OUTPUT_ROOT: &str = "output";

const SETTINGS_FILE: &str = "settings.json";

/// Get the application data directory
/// ~/Crumbler/ on all platforms. Falls back to the working directory when
/// no home directory can be determined.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "crumbler=debug,crumbler_lib=debug"
    } else {
        "crumbler=info,crumbler_lib=info"
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Read { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                ErrorKind::FileNotFound
            }
            Self::Read { .. } => ErrorKind::Processing,
            Self::Parse { .. } | Self::InvalidEnv { .. } => ErrorKind::Validation,
        }
    }
}

/// Runtime settings for the pipeline. Every field has a default, so a
/// settings file only needs the keys it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Parent directory of every project workspace.
    pub output_root: PathBuf,
    /// Largest accepted input file, in bytes.
    pub max_file_size: u64,
    /// Timeout for URL fetches.
    pub fetch_timeout_secs: u64,
    /// Accepted extensions, lowercase with the leading dot.
    pub supported_extensions: Vec<String>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            supported_extensions: SUPPORTED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl PipelineSettings {
    /// Load settings.
    ///
    /// Priority:
    /// 1. File named by `CRUMBLER_SETTINGS`
    /// 2. `~/Crumbler/settings.json` if it exists
    /// 3. Defaults
    ///
    /// `CRUMBLER_OUTPUT_DIR` and `CRUMBLER_MAX_FILE_SIZE` override the result.
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = match std::env::var("CRUMBLER_SETTINGS") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => {
                let default_path = app_data_dir().join(SETTINGS_FILE);
                if default_path.is_file() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };

        if let Ok(dir) = std::env::var("CRUMBLER_OUTPUT_DIR") {
            settings.output_root = PathBuf::from(dir);
        }
        if let Ok(raw) = std::env::var("CRUMBLER_MAX_FILE_SIZE") {
            settings.max_file_size = parse_size("CRUMBLER_MAX_FILE_SIZE", &raw)?;
        }

        tracing::debug!(
            output_root = %settings.output_root.display(),
            max_file_size = settings.max_file_size,
            "Pipeline settings loaded"
        );
        Ok(settings)
    }

    /// Read settings from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Whether `extension` (with or without the dot, any case) is accepted.
    pub fn is_supported_extension(&self, extension: &str) -> bool {
        let normalized = format!(".{}", extension.trim_start_matches('.').to_lowercase());
        self.supported_extensions.iter().any(|e| *e == normalized)
    }
}

fn parse_size(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnv {
        var,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_ends_with_app_name() {
        assert!(app_data_dir().ends_with("Crumbler"));
    }

    #[test]
    fn defaults_match_documented_limits() {
        let settings = PipelineSettings::default();
        assert_eq!(settings.max_file_size, 52_428_800);
        assert_eq!(settings.output_root, PathBuf::from("output"));
        assert_eq!(settings.supported_extensions.len(), 8);
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        let settings = PipelineSettings::default();
        assert!(settings.is_supported_extension("TXT"));
        assert!(settings.is_supported_extension(".Html"));
        assert!(settings.is_supported_extension("markdown"));
        assert!(!settings.is_supported_extension("docx"));
        assert!(!settings.is_supported_extension(""));
    }

    #[test]
    fn partial_settings_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"max_file_size": 1024}"#).unwrap();

        let settings = PipelineSettings::from_file(&path).unwrap();
        assert_eq!(settings.max_file_size, 1024);
        assert_eq!(settings.fetch_timeout_secs, DEFAULT_FETCH_TIMEOUT_SECS);
        assert_eq!(settings.output_root, PathBuf::from("output"));
    }

    #[test]
    fn malformed_settings_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = PipelineSettings::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn missing_settings_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = PipelineSettings::from_file(&dir.path().join("absent.json")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
    }

    #[test]
    fn size_override_must_be_numeric() {
        assert_eq!(parse_size("X", " 2048 ").unwrap(), 2048);
        assert!(matches!(
            parse_size("X", "lots"),
            Err(ConfigError::InvalidEnv { .. })
        ));
    }

    #[test]
    fn settings_serialize_round_trip_keys() {
        let json = serde_json::to_string(&PipelineSettings::default()).unwrap();
        assert!(json.contains("\"max_file_size\":52428800"));
        assert!(json.contains("\"output_root\":\"output\""));
    }
}
