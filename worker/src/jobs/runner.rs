//! Per-job execution pipeline
//!
//! Drives one reserved job through staging, per-environment deployment, and
//! result reporting.

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::engine::context::{EnvironmentContext, EnvironmentDeployResult};
use crate::engine::deploy::DeploymentEngine;
use crate::engine::registry::DeployerRegistry;
use crate::errors::WorkerError;
use crate::http::artifacts::ArtifactStore;
use crate::http::pipeline::PipelineService;
use crate::jobs::reporter::{self, JobOutcome};
use crate::models::job::Job;
use crate::models::spec::{DeploySpecFile, DEPLOY_SPEC_FILE};
use crate::stage::stager::Stager;
use crate::storage::layout::StorageLayout;

/// Job runner
pub struct JobRunner {
    stager: Stager,
    engine: DeploymentEngine,
    layout: StorageLayout,
}

impl JobRunner {
    /// Create a new job runner
    pub fn new(
        store: Arc<dyn ArtifactStore>,
        registry: Arc<DeployerRegistry>,
        layout: StorageLayout,
    ) -> Self {
        Self {
            stager: Stager::new(store),
            engine: DeploymentEngine::new(registry),
            layout,
        }
    }

    /// Execute one job: stage the bundle, then deploy every requested
    /// environment in order.
    ///
    /// The staging directory is removed afterwards on both paths.
    pub async fn execute(&self, job: &Job) -> Result<Vec<EnvironmentDeployResult>, WorkerError> {
        let staging_dir = self
            .layout
            .staging_dir(&job.configuration.pipeline_name, &job.id);

        let run = self.execute_in(job, &staging_dir).await;

        if let Err(e) = tokio::fs::remove_dir_all(&staging_dir).await {
            warn!(
                "Failed to remove staging dir {}: {}",
                staging_dir.display(),
                e
            );
        }

        run
    }

    async fn execute_in(
        &self,
        job: &Job,
        staging_dir: &Path,
    ) -> Result<Vec<EnvironmentDeployResult>, WorkerError> {
        self.stager.stage(job, staging_dir).await?;

        let spec = DeploySpecFile::load(staging_dir).await?;

        let mut results = Vec::new();
        for environment_name in job.configuration.environments() {
            match spec.environments.get(&environment_name) {
                Some(services) => {
                    let env = EnvironmentContext::new(
                        &spec.name,
                        &job.configuration.pipeline_name,
                        &environment_name,
                        services.clone(),
                        staging_dir.to_owned(),
                    );
                    results.push(self.engine.deploy_environment(&env).await);
                }
                None => {
                    results.push(EnvironmentDeployResult::failure(format!(
                        "Environment '{}' is not declared in {}",
                        environment_name, DEPLOY_SPEC_FILE
                    )));
                }
            }
        }

        Ok(results)
    }

    /// Execute a job and report its outcome to the pipeline service.
    ///
    /// Failures anywhere in the job's pipeline become a job failure report;
    /// nothing propagates to sibling jobs.
    pub async fn execute_and_report(&self, pipeline: &dyn PipelineService, job: Job) {
        info!(
            "Executing job {} for pipeline {}",
            job.id, job.configuration.pipeline_name
        );

        let outcome = match self.execute(&job).await {
            Ok(results) => reporter::aggregate(&results),
            Err(e) => JobOutcome::Failure(e.to_string()),
        };

        if let Err(e) = reporter::report(pipeline, &job.id, &outcome).await {
            error!("Failed to report result for job {}: {}", job.id, e);
        }
    }
}
