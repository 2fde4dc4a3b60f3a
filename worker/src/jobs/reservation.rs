//! Job reservation
//!
//! Enforces at-most-one-worker-executes-this-job through the pipeline
//! service's nonce acknowledgment.

use futures::future::join_all;
use tracing::info;

use crate::errors::WorkerError;
use crate::http::pipeline::{AckStatus, PipelineService};
use crate::models::job::Job;

/// Reserve one job.
///
/// A nonce conflict means another worker already claimed the job; that is a
/// benign outcome, reported as `None`. Any other failure propagates.
pub async fn reserve(pipeline: &dyn PipelineService, job: Job) -> Result<Option<Job>, WorkerError> {
    match pipeline.acknowledge_job(&job.id, &job.nonce).await? {
        AckStatus::Ok => {
            info!("Reserved job {}", job.id);
            Ok(Some(job))
        }
        AckStatus::ReservationConflict => {
            info!("Job {} was already reserved", job.id);
            Ok(None)
        }
    }
}

/// Reserve a batch of polled jobs concurrently.
///
/// Returns exactly the jobs whose reservation succeeded, in arbitrary order.
pub async fn reserve_batch(
    pipeline: &dyn PipelineService,
    jobs: Vec<Job>,
) -> Result<Vec<Job>, WorkerError> {
    let results = join_all(jobs.into_iter().map(|job| reserve(pipeline, job))).await;

    let mut reserved = Vec::new();
    for result in results {
        if let Some(job) = result? {
            reserved.push(job);
        }
    }
    Ok(reserved)
}
