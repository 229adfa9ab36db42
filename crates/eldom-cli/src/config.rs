//! Configuration file handling for eldom-cli

use anyhow::{Context, Result};
use clap::ValueEnum;
use eldom_client::config::DEFAULT_BASE_URL;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::output::OutputFormat;

/// Configuration for the CLI tool
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// API base URL
    pub base_url: Option<String>,
    /// Account username
    pub username: Option<String>,
    /// Account password
    pub password: Option<String>,
    /// Default output format
    pub output: Option<String>,
    /// Disable colored output
    pub no_color: Option<bool>,
}

impl Config {
    /// Load configuration from the default config file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("eldom-cli");

        Ok(config_dir.join("config.toml"))
    }

    /// Merge CLI arguments over config file values
    pub fn merge_with_args(
        &self,
        base_url: Option<&str>,
        username: Option<&str>,
        password: Option<&str>,
        output: Option<OutputFormat>,
        no_color: bool,
    ) -> MergedConfig {
        MergedConfig {
            base_url: base_url
                .map(String::from)
                .or_else(|| self.base_url.clone())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            username: username.map(String::from).or_else(|| self.username.clone()),
            password: password.map(String::from).or_else(|| self.password.clone()),
            output: output
                .or_else(|| {
                    self.output
                        .as_deref()
                        .and_then(|s| OutputFormat::from_str(s, true).ok())
                })
                .unwrap_or_default(),
            no_color: no_color || self.no_color.unwrap_or(false),
        }
    }
}

/// Fully resolved configuration after merging CLI args
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub base_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub output: OutputFormat,
    pub no_color: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "username = \"user@example.com\"\npassword = \"secret\"\noutput = \"json\""
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.username.as_deref(), Some("user@example.com"));
        assert_eq!(config.password.as_deref(), Some("secret"));
        assert_eq!(config.output.as_deref(), Some("json"));
        assert!(config.base_url.is_none());
    }

    #[test]
    fn test_load_from_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "username = [").unwrap();
        assert!(Config::load_from(file.path()).is_err());
    }

    #[test]
    fn test_merge_defaults() {
        let merged = Config::default().merge_with_args(None, None, None, None, false);
        assert_eq!(merged.base_url, DEFAULT_BASE_URL);
        assert_eq!(merged.output, OutputFormat::Table);
        assert!(merged.username.is_none());
        assert!(!merged.no_color);
    }

    #[test]
    fn test_args_override_file() {
        let config = Config {
            base_url: Some("http://localhost:9080".to_string()),
            username: Some("file-user".to_string()),
            password: Some("file-pass".to_string()),
            output: Some("CSV".to_string()),
            no_color: Some(true),
        };

        let merged = config.merge_with_args(None, Some("cli-user"), None, None, false);
        assert_eq!(merged.base_url, "http://localhost:9080");
        assert_eq!(merged.username.as_deref(), Some("cli-user"));
        assert_eq!(merged.password.as_deref(), Some("file-pass"));
        assert_eq!(merged.output, OutputFormat::Csv);
        assert!(merged.no_color);

        let merged = config.merge_with_args(None, None, None, Some(OutputFormat::Json), false);
        assert_eq!(merged.output, OutputFormat::Json);
    }
}
