//! Shared client context
//!
//! One `ClientContext` is built per process and threaded by `Arc` through the
//! registrars into every command. The tree never mutates it; commands only
//! read the handles it carries.

use std::sync::Arc;

use crate::client::{ContentClient, HttpContentClient};
use crate::config::Config;
use crate::error::ClientError;
use crate::upload::{HttpUploadManagerFactory, UploadManagerFactory};

pub struct ClientContext {
    config: Arc<Config>,
    client: Arc<dyn ContentClient>,
    uploads: Option<Arc<dyn UploadManagerFactory>>,
}

impl ClientContext {
    pub fn new(config: Arc<Config>, client: Arc<dyn ContentClient>) -> Self {
        Self {
            config,
            client,
            uploads: None,
        }
    }

    /// Attach the upload-manager resolver. Upload-dependent commands refuse
    /// to register without one.
    pub fn with_upload_factory(mut self, uploads: Arc<dyn UploadManagerFactory>) -> Self {
        self.uploads = Some(uploads);
        self
    }

    /// Build a context with the production HTTP client and upload factory.
    pub fn from_config(config: Config) -> Result<Self, ClientError> {
        let config = Arc::new(config);
        let client = Arc::new(HttpContentClient::new(&config)?);
        let uploads = Arc::new(HttpUploadManagerFactory::new(config.clone()));
        Ok(Self {
            config,
            client,
            uploads: Some(uploads),
        })
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn client(&self) -> Arc<dyn ContentClient> {
        self.client.clone()
    }

    pub fn upload_factory(&self) -> Option<Arc<dyn UploadManagerFactory>> {
        self.uploads.clone()
    }
}
