//! Configuration management for reaction-finder
//!
//! Values come from three places, later ones winning: built-in defaults,
//! the TOML config file, and `REACTION_FINDER_SECTION__KEY` environment
//! variables. Command-line flags are applied on top by `main`.

use crate::error::{ReactionFinderError, Result};
use crate::pipeline::{DEFAULT_MAX_RESULTS, DEFAULT_TOP_N};
use crate::slack::{DEFAULT_API_BASE_URL, DEFAULT_TIMEOUT_SECS};
use crate::verify::DEFAULT_PREVIEW_CHARS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod validator;

pub use validator::ConfigValidator;

/// Prefix of environment variable overrides
pub const ENV_PREFIX: &str = "REACTION_FINDER_";

/// Environment variable holding the Slack token unless configured otherwise
pub const DEFAULT_TOKEN_ENV: &str = "SLACK_REACTION_FINDER";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub slack: SlackConfig,
    pub search: SearchConfig,
    pub report: ReportConfig,
    pub verify: VerifyConfig,
}

/// Slack API access
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackConfig {
    /// Name of the environment variable holding the token
    pub token_env: String,
    pub api_base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Used when `--max` is not given
    pub default_max_results: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Used when `--top` is not given
    pub default_top_n: usize,
    /// Maximum characters of message text shown per item
    pub preview_chars: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    /// Concurrent detail lookups (1 = sequential)
    pub concurrency: usize,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            token_env: DEFAULT_TOKEN_ENV.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            default_top_n: DEFAULT_TOP_N,
            preview_chars: DEFAULT_PREVIEW_CHARS,
        }
    }
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self { concurrency: 1 }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ReactionFinderError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ReactionFinderError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides()?;
        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Built-in defaults plus environment overrides, for when no file exists
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        config.apply_env_overrides()?;
        ConfigValidator::validate(&config)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ReactionFinderError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: REACTION_FINDER_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(std::env::vars())
    }

    /// Apply `(name, value)` pairs carrying [`ENV_PREFIX`]; other names are ignored
    pub fn apply_overrides<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(config_key) = key.strip_prefix(ENV_PREFIX) {
                self.set_value_from_env(config_key, &value)?;
            }
        }
        Ok(())
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "SLACK__TOKEN_ENV" => self.slack.token_env = value.to_string(),
            "SLACK__API_BASE_URL" => self.slack.api_base_url = value.to_string(),
            "SLACK__TIMEOUT_SECS" => self.slack.timeout_secs = parse_number(path, value)?,
            "SEARCH__DEFAULT_MAX_RESULTS" => {
                self.search.default_max_results = parse_number(path, value)?
            }
            "REPORT__DEFAULT_TOP_N" => self.report.default_top_n = parse_number(path, value)?,
            "REPORT__PREVIEW_CHARS" => self.report.preview_chars = parse_number(path, value)?,
            "VERIFY__CONCURRENCY" => self.verify.concurrency = parse_number(path, value)?,
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            ReactionFinderError::Config("Cannot determine config directory".to_string())
        })?;

        Ok(config_dir.join("reaction-finder").join("config.toml"))
    }
}

fn parse_number<T: std::str::FromStr>(path: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ReactionFinderError::InvalidConfigValue {
            path: path.to_string(),
            message: format!("Cannot parse '{}' as a number", value),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.slack.token_env, "SLACK_REACTION_FINDER");
        assert_eq!(config.slack.api_base_url, "https://slack.com/api");
        assert_eq!(config.search.default_max_results, 100);
        assert_eq!(config.report.default_top_n, 3);
        assert_eq!(config.report.preview_chars, 150);
        assert_eq!(config.verify.concurrency, 1);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.report.default_top_n = 10;
        config.verify.concurrency = 4;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.report.default_top_n, 10);
        assert_eq!(loaded.verify.concurrency, 4);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[search]\ndefault_max_results = 250\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.search.default_max_results, 250);
        assert_eq!(config.report.default_top_n, 3);
        assert_eq!(config.slack.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ReactionFinderError::ConfigNotFound { .. }));
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[verify]\nconcurrency = 64\n").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ReactionFinderError::ConfigValidation { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(vars(&[
                (
                    "REACTION_FINDER_SLACK__API_BASE_URL",
                    "http://127.0.0.1:9000/api",
                ),
                ("REACTION_FINDER_REPORT__DEFAULT_TOP_N", "5"),
                ("REACTION_FINDER_UNKNOWN__KEY", "ignored"),
                ("OTHER_VAR", "ignored"),
            ]))
            .unwrap();

        assert_eq!(config.slack.api_base_url, "http://127.0.0.1:9000/api");
        assert_eq!(config.report.default_top_n, 5);
    }

    #[test]
    fn test_env_override_parse_error() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(vars(&[("REACTION_FINDER_VERIFY__CONCURRENCY", "many")]))
            .unwrap_err();
        match err {
            ReactionFinderError::InvalidConfigValue { path, .. } => {
                assert_eq!(path, "VERIFY__CONCURRENCY")
            }
            other => panic!("expected InvalidConfigValue, got {:?}", other),
        }
    }
}
