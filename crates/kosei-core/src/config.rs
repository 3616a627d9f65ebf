use std::env;
use std::fs;
use std::path::PathBuf;

use dirs::config_dir;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::checker::DEFAULT_MAX_LINE_CHARS;
use crate::secret_store::{self, SecretReference, SecretStoreError};

const CONFIG_DIR_NAME: &str = "kosei";
const CONFIG_FILE_NAME: &str = "config.toml";
const CURRENT_SCHEMA_VERSION: u32 = 1;
const API_KEY_LABEL: &str = "openrouter";
const API_KEY_ENV_VAR: &str = "OPENROUTER_API_KEY";

pub const DEFAULT_OPENROUTER_MODEL: &str = "google/gemini-2.5-flash-lite";

/// Result returned by [`load_config`], capturing the source and any
/// non-fatal issues.
#[derive(Debug, Clone)]
pub struct ConfigLoadResult {
    pub config: FileConfig,
    pub warnings: Vec<String>,
    pub source: ConfigSource,
}

/// Indicates where the configuration was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// No persisted configuration was found or usable; defaults were synthesized.
    Default,
    /// Configuration was read from `config.toml`.
    File,
}

/// Errors that can occur when persisting configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML serialization error: {0}")]
    Ser(#[from] toml::ser::Error),
    #[error("secret storage error: {0}")]
    Secret(#[from] SecretStoreError),
}

/// Disk-backed configuration schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default = "FileConfig::schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub checks: CheckPreferences,
    #[serde(default)]
    pub review: ReviewPreferences,
}

impl FileConfig {
    const fn schema_version() -> u32 {
        CURRENT_SCHEMA_VERSION
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            checks: CheckPreferences::default(),
            review: ReviewPreferences::default(),
        }
    }
}

/// Which checks run by default and with what thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckPreferences {
    #[serde(default = "default_true")]
    pub local: bool,
    #[serde(default)]
    pub remote: bool,
    #[serde(default = "default_max_line_chars")]
    pub max_line_chars: usize,
}

impl Default for CheckPreferences {
    fn default() -> Self {
        Self {
            local: true,
            remote: false,
            max_line_chars: DEFAULT_MAX_LINE_CHARS,
        }
    }
}

/// AI review settings: model id plus the stored API-key reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewPreferences {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<SecretReference>,
}

impl Default for ReviewPreferences {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
        }
    }
}

impl ReviewPreferences {
    /// Store the API key and keep a reference to it in the config.
    pub fn set_api_key(&mut self, api_key: &str) -> Result<(), SecretStoreError> {
        if let Some(reference) = self.api_key.take() {
            let _ = secret_store::delete_secret(&reference);
        }
        self.api_key = Some(secret_store::store_secret(API_KEY_LABEL, api_key)?);
        Ok(())
    }

    /// Remove the stored API key from both the backing store and the config.
    pub fn clear_api_key(&mut self) -> Result<(), SecretStoreError> {
        if let Some(reference) = self.api_key.take() {
            secret_store::delete_secret(&reference)?;
        }
        Ok(())
    }

    /// Resolve the effective API key: the environment variable wins, then
    /// whatever the secret store holds.
    pub fn resolve_api_key(&self) -> Result<Option<String>, SecretStoreError> {
        if let Ok(value) = env::var(API_KEY_ENV_VAR) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Ok(Some(trimmed.to_string()));
            }
        }
        match &self.api_key {
            Some(reference) => secret_store::load_secret(reference),
            None => Ok(None),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

const fn default_true() -> bool {
    true
}

const fn default_max_line_chars() -> usize {
    DEFAULT_MAX_LINE_CHARS
}

fn default_model() -> String {
    DEFAULT_OPENROUTER_MODEL.to_string()
}

/// Platform config directory for kosei (e.g. `~/.config/kosei`).
pub fn config_directory() -> PathBuf {
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

pub fn config_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}

/// Load the configuration, degrading to defaults with warnings rather than
/// failing: a missing file is normal, a corrupt one is reported and ignored.
pub fn load_config() -> ConfigLoadResult {
    load_config_from(&config_path())
}

fn load_config_from(path: &PathBuf) -> ConfigLoadResult {
    let mut warnings = Vec::new();

    let raw = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return ConfigLoadResult {
                config: FileConfig::default(),
                warnings,
                source: ConfigSource::Default,
            };
        }
        Err(err) => {
            warnings.push(format!(
                "Could not read {}: {err}. Using defaults.",
                path.display()
            ));
            return ConfigLoadResult {
                config: FileConfig::default(),
                warnings,
                source: ConfigSource::Default,
            };
        }
    };

    match toml::from_str::<FileConfig>(&raw) {
        Ok(config) => {
            if config.schema_version > CURRENT_SCHEMA_VERSION {
                warnings.push(format!(
                    "Config schema version {} is newer than supported version {}; unknown fields were ignored.",
                    config.schema_version, CURRENT_SCHEMA_VERSION
                ));
            }
            ConfigLoadResult {
                config,
                warnings,
                source: ConfigSource::File,
            }
        }
        Err(err) => {
            warnings.push(format!(
                "Could not parse {}: {err}. Using defaults.",
                path.display()
            ));
            ConfigLoadResult {
                config: FileConfig::default(),
                warnings,
                source: ConfigSource::Default,
            }
        }
    }
}

/// Persist the configuration to `config.toml`, creating the directory if
/// needed.
pub fn save_config(config: &FileConfig) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let encoded = toml::to_string_pretty(config)?;
    fs::write(path, encoded)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::tempdir;

    #[test]
    fn defaults_enable_local_checks_only() {
        let config = FileConfig::default();
        assert!(config.checks.local);
        assert!(!config.checks.remote);
        assert_eq!(config.checks.max_line_chars, DEFAULT_MAX_LINE_CHARS);
        assert_eq!(config.review.model, DEFAULT_OPENROUTER_MODEL);
        assert!(!config.review.has_api_key());
    }

    #[test]
    fn missing_file_loads_defaults_without_warnings() {
        let temp = tempdir().expect("tempdir");
        let result = load_config_from(&temp.path().join("config.toml"));
        assert_eq!(result.source, ConfigSource::Default);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn partial_file_fills_missing_fields_from_defaults() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        let mut file = fs::File::create(&path).expect("create");
        writeln!(file, "[checks]\nremote = true").expect("write");

        let result = load_config_from(&path);
        assert_eq!(result.source, ConfigSource::File);
        assert!(result.config.checks.remote);
        assert!(result.config.checks.local);
        assert_eq!(result.config.review.model, DEFAULT_OPENROUTER_MODEL);
    }

    #[test]
    fn corrupt_file_warns_and_uses_defaults() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "checks = 「not toml」").expect("write");

        let result = load_config_from(&path);
        assert_eq!(result.source, ConfigSource::Default);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("Could not parse"));
    }

    #[test]
    fn newer_schema_version_is_warned_about() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "schema_version = 99").expect("write");

        let result = load_config_from(&path);
        assert_eq!(result.source, ConfigSource::File);
        assert!(result.warnings[0].contains("newer than supported"));
    }

    #[test]
    fn config_round_trips_through_toml() {
        let mut config = FileConfig::default();
        config.checks.remote = true;
        config.checks.max_line_chars = 80;
        config.review.model = "anthropic/claude-sonnet-4.5".to_string();

        let encoded = toml::to_string_pretty(&config).expect("serialize");
        let decoded: FileConfig = toml::from_str(&encoded).expect("parse");
        assert!(decoded.checks.remote);
        assert_eq!(decoded.checks.max_line_chars, 80);
        assert_eq!(decoded.review.model, "anthropic/claude-sonnet-4.5");
    }
}
