//! Client configuration with YAML support

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Bitrix24 client configuration
///
/// Can be loaded from YAML, JSON, or constructed programmatically. Credentials
/// are kept out of this struct and passed separately as [`Credentials`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BitrixConfig {
    /// Connection settings
    pub connection: ConnectionConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
}

/// Connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Base URL of the REST endpoint (e.g. "https://example.bitrix24.ru/rest")
    pub base_url: String,
}

/// Timeout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    /// API request timeout in milliseconds (default: 60s)
    #[serde(default = "default_request_timeout")]
    pub request_ms: u64,

    /// Connect timeout in milliseconds (default: 10s)
    #[serde(default = "default_connect_timeout")]
    pub connect_ms: u64,

    /// Timeout for the file transfer to an upload ticket (default: 5 minutes)
    #[serde(default = "default_upload_timeout")]
    pub upload_ms: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            request_ms: default_request_timeout(),
            connect_ms: default_connect_timeout(),
            upload_ms: default_upload_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    60_000 // 60 seconds
}

fn default_connect_timeout() -> u64 {
    10_000 // 10 seconds
}

fn default_upload_timeout() -> u64 {
    300_000 // 5 minutes
}

impl TimeoutsConfig {
    pub fn request(&self) -> Duration {
        Duration::from_millis(self.request_ms)
    }

    pub fn connect(&self) -> Duration {
        Duration::from_millis(self.connect_ms)
    }

    pub fn upload(&self) -> Duration {
        Duration::from_millis(self.upload_ms)
    }
}

/// Settings file layout used by older deployments:
/// `{"BASE_URL": "...", "TIMEOUT": 60}` with the timeout in seconds.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LegacySettings {
    #[serde(rename = "BASE_URL")]
    base_url: String,
    #[serde(rename = "TIMEOUT", default = "default_legacy_timeout")]
    timeout: f64,
}

fn default_legacy_timeout() -> f64 {
    60.0
}

impl BitrixConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Parse configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Parse a `BASE_URL`/`TIMEOUT` settings document
    pub fn from_settings_json(json: &str) -> Result<Self, ConfigError> {
        let settings: LegacySettings =
            serde_json::from_str(json).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        if !settings.timeout.is_finite() || settings.timeout <= 0.0 {
            return Err(ConfigError::ParseError(format!(
                "TIMEOUT must be a positive number of seconds, got {}",
                settings.timeout
            )));
        }

        Ok(Self::builder(settings.base_url)
            .request_timeout_ms((settings.timeout * 1000.0).round() as u64)
            .build())
    }

    /// Serialize configuration to YAML
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::SerializeError(e.to_string()))
    }

    /// Create a builder for programmatic configuration
    pub fn builder(base_url: impl Into<String>) -> BitrixConfigBuilder {
        BitrixConfigBuilder::new(base_url)
    }
}

/// Builder for BitrixConfig
pub struct BitrixConfigBuilder {
    config: BitrixConfig,
}

impl BitrixConfigBuilder {
    /// Create a new builder with the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            config: BitrixConfig {
                connection: ConnectionConfig {
                    base_url: base_url.into(),
                },
                timeouts: TimeoutsConfig::default(),
            },
        }
    }

    /// Set request timeout in milliseconds
    pub fn request_timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeouts.request_ms = ms;
        self
    }

    /// Set connect timeout in milliseconds
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeouts.connect_ms = ms;
        self
    }

    /// Set upload transfer timeout in milliseconds
    pub fn upload_timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeouts.upload_ms = ms;
        self
    }

    /// Build the configuration
    pub fn build(self) -> BitrixConfig {
        self.config
    }
}

/// Account identifier and access token that form part of every API URL
#[derive(Clone)]
pub struct Credentials {
    pub account_id: String,
    pub token: String,
}

impl Credentials {
    pub fn new(account_id: impl ToString, token: impl Into<String>) -> Self {
        Self {
            account_id: account_id.to_string(),
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("account_id", &self.account_id)
            .field("token", &"***")
            .finish()
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_yaml_parsing() {
        let yaml = r#"
connection:
  base_url: "https://example.bitrix24.ru/rest"

timeouts:
  request_ms: 15000
  upload_ms: 60000
"#;

        let config = BitrixConfig::from_yaml(yaml).unwrap();
        assert_eq!(
            config.connection.base_url,
            "https://example.bitrix24.ru/rest"
        );
        assert_eq!(config.timeouts.request_ms, 15000);
        assert_eq!(config.timeouts.upload_ms, 60000);
        // Not given, falls back to the default
        assert_eq!(config.timeouts.connect_ms, 10_000);
    }

    #[test]
    fn test_yaml_without_timeouts() {
        let config = BitrixConfig::from_yaml("connection:\n  base_url: http://localhost\n").unwrap();
        assert_eq!(config.timeouts.request(), Duration::from_secs(60));
    }

    #[test]
    fn test_yaml_missing_base_url() {
        let err = BitrixConfig::from_yaml("timeouts:\n  request_ms: 1\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_settings_json() {
        let config = BitrixConfig::from_settings_json(
            r#"{"BASE_URL": "https://example.bitrix24.ru/rest/", "TIMEOUT": 12.5}"#,
        )
        .unwrap();
        assert_eq!(
            config.connection.base_url,
            "https://example.bitrix24.ru/rest/"
        );
        assert_eq!(config.timeouts.request_ms, 12_500);
    }

    #[test]
    fn test_settings_json_default_timeout() {
        let config = BitrixConfig::from_settings_json(r#"{"BASE_URL": "http://b24"}"#).unwrap();
        assert_eq!(config.timeouts.request_ms, 60_000);
    }

    #[test]
    fn test_settings_json_rejects_unknown_keys() {
        let err = BitrixConfig::from_settings_json(r#"{"BASE_URL": "http://b24", "PROXY": "x"}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_settings_json_rejects_non_positive_timeout() {
        let err = BitrixConfig::from_settings_json(r#"{"BASE_URL": "http://b24", "TIMEOUT": 0}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_builder() {
        let config = BitrixConfig::builder("http://localhost:9080")
            .request_timeout_ms(5_000)
            .connect_timeout_ms(1_000)
            .upload_timeout_ms(120_000)
            .build();

        assert_eq!(config.connection.base_url, "http://localhost:9080");
        assert_eq!(config.timeouts.request(), Duration::from_secs(5));
        assert_eq!(config.timeouts.connect(), Duration::from_secs(1));
        assert_eq!(config.timeouts.upload(), Duration::from_secs(120));
    }

    #[test]
    fn test_to_yaml_roundtrip_through_file() {
        let config = BitrixConfig::builder("http://localhost:8080").build();
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("base_url"));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        let loaded = BitrixConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(loaded.connection.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_missing_file() {
        let err = BitrixConfig::from_yaml_file("/nonexistent/bitrix.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }

    #[test]
    fn test_credentials_debug_hides_token() {
        let creds = Credentials::new(159096, "yaikpz2ql7745g9k");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("159096"));
        assert!(!debug.contains("yaikpz2ql7745g9k"));
    }
}
