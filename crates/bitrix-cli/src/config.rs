//! Configuration file handling for bx

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use bitrix_client::{BitrixConfig, Credentials};
use serde::{Deserialize, Serialize};

use crate::output::OutputFormat;

/// Configuration for the CLI tool
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// REST endpoint, e.g. `https://example.bitrix24.ru/rest`
    pub base_url: Option<String>,
    /// Account (user) id the webhook token belongs to
    pub user_id: Option<String>,
    /// Webhook access token
    pub token: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Upload transfer timeout in seconds
    pub upload_timeout_secs: Option<u64>,
    /// Default output format
    pub output: Option<OutputFormat>,
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
            .join("bitrix-cli");

        Ok(config_dir.join("config.toml"))
    }

    /// Merge CLI arguments (and their environment fallbacks) over file values
    pub fn merge_with_args(
        &self,
        base_url: Option<&str>,
        user_id: Option<&str>,
        token: Option<&str>,
    ) -> Result<MergedConfig> {
        let base_url = base_url
            .map(String::from)
            .or_else(|| self.base_url.clone())
            .context("No base URL: pass --base-url, set BITRIX_BASE_URL or add base_url to the config file")?;
        let user_id = user_id
            .map(String::from)
            .or_else(|| self.user_id.clone())
            .context("No user id: pass --user-id, set BITRIX_USER_ID or add user_id to the config file")?;
        let token = token
            .map(String::from)
            .or_else(|| self.token.clone())
            .context("No token: pass --token, set BITRIX_TOKEN or add token to the config file")?;

        Ok(MergedConfig {
            base_url,
            user_id,
            token,
            timeout: self.timeout_secs.map(Duration::from_secs),
            upload_timeout: self.upload_timeout_secs.map(Duration::from_secs),
        })
    }
}

/// Fully resolved configuration after merging CLI args
#[derive(Clone)]
pub struct MergedConfig {
    pub base_url: String,
    pub user_id: String,
    pub token: String,
    pub timeout: Option<Duration>,
    pub upload_timeout: Option<Duration>,
}

impl MergedConfig {
    pub fn client_config(&self) -> BitrixConfig {
        let mut builder = BitrixConfig::builder(&self.base_url);
        if let Some(timeout) = self.timeout {
            builder = builder.request_timeout_ms(timeout.as_millis() as u64);
        }
        if let Some(timeout) = self.upload_timeout {
            builder = builder.upload_timeout_ms(timeout.as_millis() as u64);
        }
        builder.build()
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.user_id, self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
base_url = "https://example.bitrix24.ru/rest"
user_id = "159096"
token = "abc"
timeout_secs = 30
output = "json"
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.output, Some(OutputFormat::Json));
        assert_eq!(config.base_url.as_deref(), Some("https://example.bitrix24.ru/rest"));
        assert_eq!(config.timeout_secs, Some(30));
        assert_eq!(config.no_color, None);
    }

    #[test]
    fn test_args_override_file() {
        let config = Config {
            base_url: Some("https://file.example/rest".into()),
            user_id: Some("1".into()),
            token: Some("file-token".into()),
            timeout_secs: Some(5),
            ..Default::default()
        };

        let merged = config
            .merge_with_args(Some("https://arg.example/rest"), None, Some("arg-token"))
            .unwrap();
        assert_eq!(merged.base_url, "https://arg.example/rest");
        assert_eq!(merged.user_id, "1");
        assert_eq!(merged.token, "arg-token");

        let client_config = merged.client_config();
        assert_eq!(client_config.timeouts.request_ms, 5000);
        assert_eq!(client_config.connection.base_url, "https://arg.example/rest");
    }

    #[test]
    fn test_missing_token_is_reported() {
        let err = Config::default()
            .merge_with_args(Some("https://x/rest"), Some("1"), None)
            .err()
            .unwrap();
        assert!(err.to_string().contains("BITRIX_TOKEN"));
    }
}
