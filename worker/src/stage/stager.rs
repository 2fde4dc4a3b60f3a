//! Artifact stager
//!
//! Materializes a job's deployable bundle into its staging directory.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::WorkerError;
use crate::http::artifacts::ArtifactStore;
use crate::models::job::Job;
use crate::stage::archive;

/// Artifact stager
pub struct Stager {
    store: Arc<dyn ArtifactStore>,
}

impl Stager {
    /// Create a new stager
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self { store }
    }

    /// Fetch and unpack the job's bundle into `dest_dir`.
    ///
    /// The temporary compressed bundle is removed whether or not extraction
    /// succeeds.
    pub async fn stage(&self, job: &Job, dest_dir: &Path) -> Result<(), WorkerError> {
        tokio::fs::create_dir_all(dest_dir).await?;

        let bundle_path = dest_dir.join(format!("bundle-{}.tar.gz", Uuid::new_v4()));

        info!(
            "Staging bundle {}/{} for job {}",
            job.artifact.bucket, job.artifact.key, job.id
        );

        self.store
            .fetch(&job.artifact, &job.credentials, &bundle_path)
            .await?;

        let extracted = archive::extract_tar_gz(&bundle_path, dest_dir).await;

        if let Err(e) = tokio::fs::remove_file(&bundle_path).await {
            warn!("Failed to remove temporary bundle {}: {}", bundle_path.display(), e);
        }

        extracted?;
        info!("Staged job {} into {}", job.id, dest_dir.display());
        Ok(())
    }
}
