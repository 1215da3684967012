//! Clients of the flag service.
//!
//! The panel only ever talks to a [`FlagClient`]. Over the network that is
//! [`HttpFlagClient`]; in-process callers can hand it a [`FlagStore`]
//! directly.

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::flags::{FlagSet, FlagStore, ProjectId, SetFlagRequest};

/// Name used for the flag service in error messages.
const SERVICE: &str = "flag service";

/// Longest slice of a non-JSON error body carried into an error message.
const MAX_DETAIL_CHARS: usize = 200;

/// Read and toggle access to a flag set.
#[async_trait]
pub trait FlagClient: Send + Sync {
    /// Fetch the current flag set.
    ///
    /// # Errors
    ///
    /// Returns an error if the flag service cannot be reached or answers badly.
    async fn get_flags(&self) -> Result<FlagSet>;

    /// Flag or unflag a project and return the authoritative new set.
    ///
    /// # Errors
    ///
    /// Returns an error if the flag service cannot be reached or rejects the
    /// request.
    async fn set_flag(&self, project_id: &ProjectId, flagged: bool) -> Result<FlagSet>;
}

#[async_trait]
impl FlagClient for FlagStore {
    async fn get_flags(&self) -> Result<FlagSet> {
        Ok(FlagStore::get_flags(self))
    }

    async fn set_flag(&self, project_id: &ProjectId, flagged: bool) -> Result<FlagSet> {
        Ok(FlagStore::set_flag(self, project_id.clone(), flagged))
    }
}

/// [`FlagClient`] speaking the `GET/POST flags` HTTP contract.
#[derive(Debug, Clone)]
pub struct HttpFlagClient {
    http: Client,
    flags_url: Url,
}

impl HttpFlagClient {
    /// Create a client for the flag service rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the flags endpoint URL cannot be derived from
    /// `base_url`.
    pub fn new(http: Client, base_url: &Url) -> Result<Self> {
        Ok(Self {
            http,
            flags_url: endpoint(base_url, "flags")?,
        })
    }

    /// The resolved `flags` endpoint.
    #[must_use]
    pub fn flags_url(&self) -> &Url {
        &self.flags_url
    }
}

#[async_trait]
impl FlagClient for HttpFlagClient {
    async fn get_flags(&self) -> Result<FlagSet> {
        debug!(url = %self.flags_url, "fetching flags");
        let response = self
            .http
            .get(self.flags_url.clone())
            .send()
            .await
            .map_err(|e| Error::upstream(SERVICE, e.to_string()))?;
        decode(SERVICE, response).await
    }

    async fn set_flag(&self, project_id: &ProjectId, flagged: bool) -> Result<FlagSet> {
        debug!(url = %self.flags_url, %project_id, flagged, "setting flag");
        let body = SetFlagRequest {
            project_id: project_id.clone(),
            flagged,
        };
        let response = self
            .http
            .post(self.flags_url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::upstream(SERVICE, e.to_string()))?;
        decode(SERVICE, response).await
    }
}

/// Resolve `path` beneath `base`, treating `base` as a directory even when it
/// lacks a trailing slash.
pub(crate) fn endpoint(base: &Url, path: &str) -> Result<Url> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let dir = format!("{}/", base.path());
        base.set_path(&dir);
    }
    base.join(path)
        .map_err(|e| Error::internal(format!("cannot resolve '{path}' against {base}: {e}")))
}

/// Check the status and decode a JSON body from an upstream response.
pub(crate) async fn decode<T: DeserializeOwned>(
    service: &'static str,
    response: Response,
) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let detail = response.text().await.ok().and_then(|body| error_detail(&body));
        return Err(Error::UpstreamStatus {
            service,
            status: status.as_u16(),
            detail,
        });
    }
    response
        .json()
        .await
        .map_err(|e| Error::upstream(service, format!("undecodable response: {e}")))
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Pull a readable explanation out of an error response body: the `error`
/// field of our own JSON error shape, else the (shortened) raw text.
fn error_detail(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => Some(parsed.error),
        Err(_) => Some(body.chars().take(MAX_DETAIL_CHARS).collect()),
    }
}
