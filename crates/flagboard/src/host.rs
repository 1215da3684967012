//! Registration with the host platform.
//!
//! Before it can load anything the panel registers with the host, which hands
//! back the two capabilities it needs: a flag client and a project directory.
//! If registration fails the panel load fails as a whole.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::client::{FlagClient, HttpFlagClient};
use crate::config::{parse_url, Config};
use crate::directory::{HttpProjectDirectory, ProjectDirectory};
use crate::error::{Error, Result};

/// What the host grants the panel at registration.
#[derive(Clone)]
pub struct HostCapabilities {
    /// Access to the flag service.
    pub flags: Arc<dyn FlagClient>,
    /// Access to the project directory.
    pub directory: Arc<dyn ProjectDirectory>,
}

impl std::fmt::Debug for HostCapabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostCapabilities").finish_non_exhaustive()
    }
}

/// A runtime the panel can register with.
#[async_trait]
pub trait HostRuntime: Send + Sync {
    /// Register and obtain the panel's capabilities.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HostUnavailable`] if the host cannot provide them.
    async fn register(&self) -> Result<HostCapabilities>;
}

/// Host whose services are reached over HTTP, as described by `[host]` config.
#[derive(Debug, Clone)]
pub struct HttpHost {
    config: Config,
}

impl HttpHost {
    /// Create a host from loaded configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    fn http_client(&self) -> Result<Client> {
        Client::builder()
            .timeout(self.config.request_timeout())
            .user_agent(concat!("flagboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::host_unavailable(format!("cannot build HTTP client: {e}")))
    }

    /// Build just the flag client, for callers that never need the directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HostUnavailable`] if the backend URL is unusable.
    pub fn flag_client(&self) -> Result<HttpFlagClient> {
        let backend_url = parse_url("backend_url", &self.config.host.backend_url)
            .map_err(|e| Error::host_unavailable(e.to_string()))?;
        HttpFlagClient::new(self.http_client()?, &backend_url)
    }
}

#[async_trait]
impl HostRuntime for HttpHost {
    async fn register(&self) -> Result<HostCapabilities> {
        let host = &self.config.host;
        let Some(directory_url) = &host.directory_url else {
            warn!("No project directory configured");
            return Err(Error::host_unavailable(
                "no project directory configured (set host.directory_url)",
            ));
        };
        let directory_url = parse_url("directory_url", directory_url)
            .map_err(|e| Error::host_unavailable(e.to_string()))?;

        let flags = self.flag_client()?;
        let directory =
            HttpProjectDirectory::new(self.http_client()?, &directory_url, host.token.clone())?;

        debug!(
            flags = %flags.flags_url(),
            projects = %directory.projects_url(),
            "Registered with host"
        );
        Ok(HostCapabilities {
            flags: Arc::new(flags),
            directory: Arc::new(directory),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_directory() -> Config {
        let mut config = Config::default();
        config.host.directory_url = Some("https://tracker.example.com/api".to_string());
        config
    }

    #[tokio::test]
    async fn test_register_succeeds_with_full_config() {
        let host = HttpHost::new(config_with_directory());
        assert!(host.register().await.is_ok());
    }

    #[tokio::test]
    async fn test_register_fails_without_directory() {
        let host = HttpHost::new(Config::default());
        let err = host.register().await.unwrap_err();

        assert!(matches!(err, Error::HostUnavailable(_)));
        assert!(err.to_string().contains("directory_url"));
    }

    #[tokio::test]
    async fn test_register_fails_with_bad_backend_url() {
        let mut config = config_with_directory();
        config.host.backend_url = "nowhere".to_string();

        let err = HttpHost::new(config).register().await.unwrap_err();
        assert!(matches!(err, Error::HostUnavailable(_)));
        assert!(err.to_string().contains("backend_url"));
    }

    #[test]
    fn test_flag_client_resolves_endpoint() {
        let client = HttpHost::new(Config::default()).flag_client().unwrap();
        assert_eq!(client.flags_url().as_str(), "http://127.0.0.1:8080/flags");
    }
}
