//! Read access to the issue tracker's project directory.
//!
//! Projects are owned by the tracker. We only list them for display and never
//! write back.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{decode, endpoint};
use crate::error::{Error, Result};
use crate::flags::ProjectId;

/// Name used for the directory in error messages.
const SERVICE: &str = "project directory";

/// Fields requested from the tracker's project listing.
const PROJECT_FIELDS: &str = "id,name,shortName,description,iconUrl";

/// A project as listed by the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Tracker-assigned identifier.
    pub id: ProjectId,
    /// Display name.
    pub name: String,
    /// Short key, also used in project URLs.
    pub short_name: String,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Icon location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

impl Project {
    /// Path of the project's page within the tracker.
    #[must_use]
    pub fn link(&self) -> String {
        format!("/projects/{}", self.short_name)
    }
}

/// Source of the project list.
#[async_trait]
pub trait ProjectDirectory: Send + Sync {
    /// List every project visible to the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be reached or answers badly.
    async fn list_projects(&self) -> Result<Vec<Project>>;
}

/// [`ProjectDirectory`] backed by the tracker's REST API.
#[derive(Debug, Clone)]
pub struct HttpProjectDirectory {
    http: Client,
    projects_url: Url,
    token: Option<String>,
}

impl HttpProjectDirectory {
    /// Create a directory client for the REST API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the projects URL cannot be derived from `base_url`.
    pub fn new(http: Client, base_url: &Url, token: Option<String>) -> Result<Self> {
        let mut projects_url = endpoint(base_url, "admin/projects")?;
        projects_url
            .query_pairs_mut()
            .append_pair("fields", PROJECT_FIELDS);
        Ok(Self {
            http,
            projects_url,
            token,
        })
    }

    /// The resolved project listing URL.
    #[must_use]
    pub fn projects_url(&self) -> &Url {
        &self.projects_url
    }
}

#[async_trait]
impl ProjectDirectory for HttpProjectDirectory {
    async fn list_projects(&self) -> Result<Vec<Project>> {
        debug!(url = %self.projects_url, "listing projects");
        let mut request = self
            .http
            .get(self.projects_url.clone())
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::upstream(SERVICE, e.to_string()))?;
        let projects: Vec<Project> = decode(SERVICE, response).await?;
        debug!(count = projects.len(), "projects listed");
        Ok(projects)
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        extract::RawQuery,
        http::{HeaderMap, StatusCode},
        routing::get,
        Json, Router,
    };
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    use super::*;

    async fn spawn_router(app: Router) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });
        Url::parse(&format!("http://{addr}/api")).unwrap()
    }

    fn sample() -> Value {
        json!([
            {
                "id": "0-1",
                "name": "Demo",
                "shortName": "DEMO",
                "description": "Sample project",
                "iconUrl": "/icons/demo.png",
                "$type": "Project"
            },
            { "id": "0-2", "name": "Bare", "shortName": "BARE" }
        ])
    }

    #[test]
    fn test_projects_url() {
        let base = Url::parse("https://tracker.example.com/api").unwrap();
        let directory = HttpProjectDirectory::new(Client::new(), &base, None).unwrap();
        assert_eq!(
            directory.projects_url().as_str(),
            "https://tracker.example.com/api/admin/projects?fields=id%2Cname%2CshortName%2Cdescription%2CiconUrl"
        );
    }

    #[test]
    fn test_project_deserialize_optional_fields() {
        let projects: Vec<Project> = serde_json::from_value(sample()).unwrap();

        assert_eq!(projects[0].id.as_str(), "0-1");
        assert_eq!(projects[0].short_name, "DEMO");
        assert_eq!(projects[0].icon_url.as_deref(), Some("/icons/demo.png"));
        assert!(projects[1].description.is_none());
        assert!(projects[1].icon_url.is_none());
    }

    #[test]
    fn test_project_link() {
        let projects: Vec<Project> = serde_json::from_value(sample()).unwrap();
        assert_eq!(projects[0].link(), "/projects/DEMO");
    }

    #[tokio::test]
    async fn test_list_projects_sends_fields_and_token() {
        let app = Router::new().route(
            "/api/admin/projects",
            get(|headers: HeaderMap, RawQuery(query): RawQuery| async move {
                let authorized = headers
                    .get("authorization")
                    .is_some_and(|v| v == "Bearer perm:secret");
                let has_fields = query.is_some_and(|q| q.contains("shortName"));
                if authorized && has_fields {
                    Ok(Json(sample()))
                } else {
                    Err(StatusCode::UNAUTHORIZED)
                }
            }),
        );
        let base = spawn_router(app).await;
        let directory =
            HttpProjectDirectory::new(Client::new(), &base, Some("perm:secret".to_string()))
                .unwrap();

        let projects = directory.list_projects().await.unwrap();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[1].name, "Bare");
    }

    #[tokio::test]
    async fn test_list_projects_maps_error_status() {
        let app = Router::new().route(
            "/api/admin/projects",
            get(|| async { StatusCode::FORBIDDEN }),
        );
        let base = spawn_router(app).await;
        let directory = HttpProjectDirectory::new(Client::new(), &base, None).unwrap();

        let err = directory.list_projects().await.unwrap_err();
        assert_eq!(err.to_string(), "project directory responded with status 403");
    }
}
