//! Remote content service client
//!
//! Commands never talk HTTP directly; they go through the [`ContentClient`]
//! trait so hosts and tests can substitute their own transport. The trait is
//! annotated for `mockall` so consumers can generate deterministic mocks for
//! unit/integration tests.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};
use url::Url;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::config::Config;
use crate::error::ClientError;

/// Fields needed to create a repository on the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRepository {
    pub repo_id: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    /// Upstream feed to sync ISO content from (optional).
    pub feed_url: Option<String>,
}

/// Partial update applied to an existing repository.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryDelta {
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub feed_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub repo_id: String,
    pub display_name: String,
    pub description: Option<String>,
    pub feed_url: Option<String>,
    #[serde(default)]
    pub content_unit_counts: HashMap<String, u64>,
    pub last_sync: Option<DateTime<Utc>>,
    pub last_publish: Option<DateTime<Utc>>,
}

/// Server-side selection of content units, used by copy/remove/search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitCriteria {
    pub type_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

impl UnitCriteria {
    pub fn for_type(type_id: &str) -> Self {
        Self {
            type_ids: vec![type_id.to_string()],
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub unit_id: String,
    pub type_id: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Waiting,
    Running,
    Completed,
    Failed,
    Canceled,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Failed | TaskState::Canceled
        )
    }
}

/// A long-running server-side operation (sync, publish, copy, remove).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub task_id: String,
    pub state: TaskState,
    pub progress: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

/// Connection to the remote content server. Implemented over HTTP in
/// production and by mocks in tests.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ContentClient: Send + Sync {
    async fn create_repository(&self, repo: NewRepository) -> Result<Repository, ClientError>;

    async fn update_repository(
        &self,
        repo_id: &str,
        delta: RepositoryDelta,
    ) -> Result<Repository, ClientError>;

    async fn delete_repository(&self, repo_id: &str) -> Result<(), ClientError>;

    async fn list_repositories(&self) -> Result<Vec<Repository>, ClientError>;

    /// Copy units matching `criteria` from one repository into another.
    /// Returns the server task tracking the copy.
    async fn copy_units(
        &self,
        source_repo_id: &str,
        dest_repo_id: &str,
        criteria: UnitCriteria,
    ) -> Result<Task, ClientError>;

    async fn remove_units(
        &self,
        repo_id: &str,
        criteria: UnitCriteria,
    ) -> Result<Task, ClientError>;

    async fn search_units(
        &self,
        repo_id: &str,
        criteria: UnitCriteria,
    ) -> Result<Vec<Unit>, ClientError>;

    async fn sync_repository(&self, repo_id: &str) -> Result<Task, ClientError>;

    async fn publish_repository(&self, repo_id: &str) -> Result<Task, ClientError>;

    async fn task_status(&self, task_id: &str) -> Result<Task, ClientError>;
}

pub struct HttpContentClient {
    base: Url,
    http: reqwest::Client,
    api_key: Option<String>,
}

impl HttpContentClient {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        // Url::join treats a base without a trailing slash as a file; make
        // sure relative endpoint paths resolve under the configured prefix.
        let mut base_url = config.server_url.clone();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let base = Url::parse(&base_url)?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()?;

        Ok(Self {
            base,
            http,
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base.join(path)?)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let mut builder = self.http.request(method, url);
        if let Some(ref key) = self.api_key {
            if let Ok(value) = HeaderValue::from_str(key) {
                builder = builder.header("X-Api-Key", value);
            }
        }
        builder
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound { resource: message });
        }
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ContentClient for HttpContentClient {
    async fn create_repository(&self, repo: NewRepository) -> Result<Repository, ClientError> {
        let url = self.endpoint("v2/repositories/")?;
        let response = self
            .request(reqwest::Method::POST, url)
            .json(&repo)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn update_repository(
        &self,
        repo_id: &str,
        delta: RepositoryDelta,
    ) -> Result<Repository, ClientError> {
        let url = self.endpoint(&format!("v2/repositories/{}/", repo_id))?;
        let response = self
            .request(reqwest::Method::PUT, url)
            .json(&delta)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn delete_repository(&self, repo_id: &str) -> Result<(), ClientError> {
        let url = self.endpoint(&format!("v2/repositories/{}/", repo_id))?;
        let response = self.request(reqwest::Method::DELETE, url).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn list_repositories(&self) -> Result<Vec<Repository>, ClientError> {
        let url = self.endpoint("v2/repositories/")?;
        let response = self.request(reqwest::Method::GET, url).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn copy_units(
        &self,
        source_repo_id: &str,
        dest_repo_id: &str,
        criteria: UnitCriteria,
    ) -> Result<Task, ClientError> {
        let url = self.endpoint(&format!(
            "v2/repositories/{}/actions/associate/",
            dest_repo_id
        ))?;
        let body = serde_json::json!({
            "source_repo_id": source_repo_id,
            "criteria": criteria,
        });
        let response = self
            .request(reqwest::Method::POST, url)
            .json(&body)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn remove_units(
        &self,
        repo_id: &str,
        criteria: UnitCriteria,
    ) -> Result<Task, ClientError> {
        let url = self.endpoint(&format!(
            "v2/repositories/{}/actions/unassociate/",
            repo_id
        ))?;
        let body = serde_json::json!({ "criteria": criteria });
        let response = self
            .request(reqwest::Method::POST, url)
            .json(&body)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn search_units(
        &self,
        repo_id: &str,
        criteria: UnitCriteria,
    ) -> Result<Vec<Unit>, ClientError> {
        let url = self.endpoint(&format!("v2/repositories/{}/search/units/", repo_id))?;
        let body = serde_json::json!({ "criteria": criteria });
        let response = self
            .request(reqwest::Method::POST, url)
            .json(&body)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn sync_repository(&self, repo_id: &str) -> Result<Task, ClientError> {
        let url = self.endpoint(&format!("v2/repositories/{}/actions/sync/", repo_id))?;
        let response = self.request(reqwest::Method::POST, url).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn publish_repository(&self, repo_id: &str) -> Result<Task, ClientError> {
        let url = self.endpoint(&format!("v2/repositories/{}/actions/publish/", repo_id))?;
        let response = self.request(reqwest::Method::POST, url).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn task_status(&self, task_id: &str) -> Result<Task, ClientError> {
        let url = self.endpoint(&format!("v2/tasks/{}/", task_id))?;
        let response = self.request(reqwest::Method::GET, url).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(url: &str) -> HttpContentClient {
        let config = Config {
            server_url: url.to_string(),
            ..Config::default()
        };
        HttpContentClient::new(&config).expect("client builds")
    }

    #[test]
    fn test_endpoint_joins_under_prefix() {
        let client = client_for("https://content.example.com/api/");
        let url = client.endpoint("v2/repositories/").expect("endpoint");
        assert_eq!(
            url.as_str(),
            "https://content.example.com/api/v2/repositories/"
        );
    }

    #[test]
    fn test_endpoint_handles_missing_trailing_slash() {
        let client = client_for("https://content.example.com/api");
        let url = client.endpoint("v2/tasks/abc/").expect("endpoint");
        assert_eq!(url.as_str(), "https://content.example.com/api/v2/tasks/abc/");
    }

    #[test]
    fn test_criteria_serialization_skips_empty_fields() {
        let criteria = UnitCriteria::for_type("iso");
        let value = serde_json::to_value(&criteria).expect("serialize");
        assert_eq!(value["type_ids"][0], "iso");
        assert!(value.get("filters").is_none());
        assert!(value.get("limit").is_none());
    }

    #[test]
    fn test_task_state_terminal() {
        assert!(TaskState::Completed.is_terminal());
        assert!(TaskState::Failed.is_terminal());
        assert!(!TaskState::Running.is_terminal());

        let state: TaskState = serde_json::from_str("\"completed\"").expect("parse");
        assert_eq!(state, TaskState::Completed);
    }
}
