//! Upload-manager collaborator
//!
//! Uploads are handled by an external workflow on the server: request an
//! upload slot, send the content in chunks, import the finished upload into
//! the target repository, then delete the slot. Commands that need uploads
//! receive an [`UploadManagerFactory`] at construction and resolve the
//! manager lazily on first use, so hosts and tests can swap the factory
//! without touching the command tree.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderValue;
use serde::Deserialize;
use tracing::debug;
use url::Url;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::config::Config;
use crate::error::ClientError;

/// Result of a completed upload-and-import workflow.
#[derive(Debug, Clone)]
pub struct UploadReport {
    pub upload_id: String,
    pub bytes_sent: usize,
    pub imported: bool,
}

#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait UploadManager: Send + Sync {
    /// Upload `content` as a new unit named `filename` into `repo_id`.
    async fn upload(
        &self,
        repo_id: &str,
        filename: &str,
        content: Vec<u8>,
    ) -> Result<UploadReport, ClientError>;
}

/// Resolver for the upload manager, injected into upload-dependent commands.
/// Registrars pass it through untouched; nothing is resolved or validated at
/// registration time.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait UploadManagerFactory: Send + Sync {
    fn upload_manager(&self) -> Result<Arc<dyn UploadManager>, ClientError>;
}

#[derive(Deserialize)]
struct UploadSlot {
    upload_id: String,
}

pub struct HttpUploadManager {
    base: Url,
    http: reqwest::Client,
    api_key: Option<String>,
    chunk_size: usize,
}

impl HttpUploadManager {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
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
            chunk_size: config.chunk_size,
        })
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
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl UploadManager for HttpUploadManager {
    async fn upload(
        &self,
        repo_id: &str,
        filename: &str,
        content: Vec<u8>,
    ) -> Result<UploadReport, ClientError> {
        // 1. Request an upload slot
        let url = self.base.join("v2/content/uploads/")?;
        let response = self.request(reqwest::Method::POST, url).send().await?;
        let slot: UploadSlot = Self::check(response).await?.json().await?;
        debug!("Opened upload slot {}", slot.upload_id);

        // 2. Send the content in chunks at the right offsets
        let mut offset = 0usize;
        for chunk in content.chunks(self.chunk_size) {
            let url = self.base.join(&format!(
                "v2/content/uploads/{}/{}/",
                slot.upload_id, offset
            ))?;
            let response = self
                .request(reqwest::Method::PUT, url)
                .body(chunk.to_vec())
                .send()
                .await?;
            Self::check(response).await?;
            offset += chunk.len();
        }

        // 3. Import the finished upload into the repository
        let url = self
            .base
            .join(&format!("v2/repositories/{}/actions/import_upload/", repo_id))?;
        let body = serde_json::json!({
            "upload_id": slot.upload_id,
            "unit_type_id": "iso",
            "unit_key": { "name": filename, "size": content.len() },
        });
        let response = self
            .request(reqwest::Method::POST, url)
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;

        // 4. Delete the slot; failure here is not fatal to the upload
        let url = self
            .base
            .join(&format!("v2/content/uploads/{}/", slot.upload_id))?;
        if let Err(e) = self.request(reqwest::Method::DELETE, url).send().await {
            debug!("Failed to clean up upload slot {}: {}", slot.upload_id, e);
        }

        Ok(UploadReport {
            upload_id: slot.upload_id,
            bytes_sent: offset,
            imported: true,
        })
    }
}

/// Default factory: builds an [`HttpUploadManager`] against the configured
/// server. Construction is deferred until a command actually needs it.
pub struct HttpUploadManagerFactory {
    config: Arc<Config>,
}

impl HttpUploadManagerFactory {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

impl UploadManagerFactory for HttpUploadManagerFactory {
    fn upload_manager(&self) -> Result<Arc<dyn UploadManager>, ClientError> {
        Ok(Arc::new(HttpUploadManager::new(&self.config)?))
    }
}
