//! Configuration management for flagboard.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Directory under the user config dir holding our files.
const CONFIG_DIR_NAME: &str = "flagboard";

/// Prefix for environment overrides, e.g. `FLAGBOARD_SERVER__PORT`.
const ENV_PREFIX: &str = "FLAGBOARD_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `FLAGBOARD_`, `__` between sections)
/// 2. TOML config file at `~/.config/flagboard/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Flag service listener configuration.
    pub server: ServerConfig,
    /// Host platform endpoints used by the panel.
    pub host: HostConfig,
}

/// Where and how the flag service listens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// TCP port to bind. 0 picks an ephemeral port.
    pub port: u16,
    /// How long browsers may cache CORS preflight answers, in seconds.
    pub cors_max_age_secs: u64,
}

/// Endpoints the host platform hands to the panel at registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Base URL of the flag service.
    pub backend_url: String,
    /// Base URL of the issue tracker's REST API serving the project directory.
    pub directory_url: Option<String>,
    /// Bearer token sent to the project directory. Never serialized back out.
    #[serde(skip_serializing)]
    pub token: Option<String>,
    /// Per-request timeout for outbound calls, in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_max_age_secs: 60 * 60,
        }
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:8080".to_string(),
            directory_url: None,
            token: None,
            request_timeout_ms: 5_000,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// A missing file is not an error; defaults and environment still apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.host.request_timeout_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "request_timeout_ms must be greater than 0".to_string(),
            });
        }

        self.bind_address()?;
        parse_url("backend_url", &self.host.backend_url)?;
        if let Some(directory_url) = &self.host.directory_url {
            parse_url("directory_url", directory_url)?;
        }

        Ok(())
    }

    /// The socket address the flag service binds to.
    ///
    /// # Errors
    ///
    /// Returns an error if `server.host` is not an IP address.
    pub fn bind_address(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .server
            .host
            .parse()
            .map_err(|e| Error::ConfigValidation {
                message: format!("invalid server address '{}': {e}", self.server.host),
            })?;
        Ok(SocketAddr::new(ip, self.server.port))
    }

    /// Outbound request timeout as a Duration.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.host.request_timeout_ms)
    }

    /// CORS preflight cache lifetime as a Duration.
    #[must_use]
    pub fn cors_max_age(&self) -> Duration {
        Duration::from_secs(self.server.cors_max_age_secs)
    }
}

/// Parse a configured base URL, naming the offending key on failure.
pub(crate) fn parse_url(key: &str, value: &str) -> Result<Url> {
    Url::parse(value).map_err(|e| Error::ConfigValidation {
        message: format!("{key} '{value}' is not a valid URL: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.host.backend_url, "http://127.0.0.1:8080");
        assert!(config.host.directory_url.is_none());
        assert!(config.host.token.is_none());
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default();
        config.host.request_timeout_ms = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("request_timeout_ms"));
    }

    #[test]
    fn test_validate_bad_backend_url() {
        let mut config = Config::default();
        config.host.backend_url = "not a url".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("backend_url"));
    }

    #[test]
    fn test_validate_bad_directory_url() {
        let mut config = Config::default();
        config.host.directory_url = Some("::nope".to_string());

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("directory_url"));
    }

    #[test]
    fn test_validate_bad_bind_host() {
        let mut config = Config::default();
        config.server.host = "localhost name".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("invalid server address"));
    }

    #[test]
    fn test_bind_address() {
        let config = Config::default();
        let addr = config.bind_address().unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:8080");

        let mut config = Config::default();
        config.server.host = "::1".to_string();
        assert_eq!(config.bind_address().unwrap().to_string(), "[::1]:8080");
    }

    #[test]
    fn test_durations() {
        let config = Config::default();
        assert_eq!(config.request_timeout(), Duration::from_millis(5_000));
        assert_eq!(config.cors_max_age(), Duration::from_secs(3_600));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("flagboard"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
        assert!(result.is_ok());
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9191

[host]
directory_url = "https://tracker.example.com/api"
token = "perm:abc"
"#
        )
        .unwrap();

        let config = Config::load_from(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.server.port, 9191);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(
            config.host.directory_url.as_deref(),
            Some("https://tracker.example.com/api")
        );
        assert_eq!(config.host.token.as_deref(), Some("perm:abc"));
    }

    #[test]
    fn test_load_rejects_invalid_file_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[host]\nrequest_timeout_ms = 0").unwrap();

        let result = Config::load_from(Some(file.path().to_path_buf()));
        assert!(matches!(result, Err(Error::ConfigValidation { .. })));
    }

    #[test]
    fn test_config_serialize() {
        let mut config = Config::default();
        config.host.token = Some("perm:secret".to_string());
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("backend_url"));
        assert!(json.contains("cors_max_age_secs"));
        assert!(!json.contains("perm:secret"));
    }

    #[test]
    fn test_config_clone() {
        let config = Config::default();
        assert_eq!(config.clone(), config);
    }
}
