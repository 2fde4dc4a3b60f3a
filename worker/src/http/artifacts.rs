//! Artifact store client

use std::path::Path;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use tracing::debug;

use crate::errors::WorkerError;
use crate::models::job::{ArtifactLocation, ScopedCredentials};

/// Artifact store operations consumed by the worker
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Fetch a single bundle to `dest`, authenticating with the job's
    /// scoped temporary credentials
    async fn fetch(
        &self,
        location: &ArtifactLocation,
        credentials: &ScopedCredentials,
        dest: &Path,
    ) -> Result<(), WorkerError>;
}

/// HTTP-backed artifact store client
pub struct HttpArtifactStore {
    client: Client,
    base_url: String,
}

impl HttpArtifactStore {
    /// Create a new artifact store client
    pub fn new(base_url: &str) -> Result<Self, WorkerError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ArtifactStore for HttpArtifactStore {
    async fn fetch(
        &self,
        location: &ArtifactLocation,
        credentials: &ScopedCredentials,
        dest: &Path,
    ) -> Result<(), WorkerError> {
        let url = format!("{}/{}/{}", self.base_url, location.bucket, location.key);
        debug!("Fetching artifact {}", url);

        let response = self
            .client
            .get(&url)
            .header("x-access-key-id", &credentials.access_key_id)
            .header(
                "x-secret-access-key",
                credentials.secret_access_key.expose_secret(),
            )
            .header("x-session-token", credentials.session_token.expose_secret())
            .send()
            .await
            .map_err(|e| WorkerError::ArtifactFetchError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(WorkerError::ArtifactFetchError(format!(
                "Fetch of {}/{} failed: {}",
                location.bucket,
                location.key,
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| WorkerError::ArtifactFetchError(e.to_string()))?;

        tokio::fs::write(dest, &bytes).await?;
        debug!("Wrote {} bytes to {}", bytes.len(), dest.display());
        Ok(())
    }
}
