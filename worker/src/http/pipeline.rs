//! Pipeline service API client
//!
//! Operations consumed from the external pipeline-orchestration service:
//! job polling, nonce acknowledgment, and job result reporting.

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::WorkerError;
use crate::http::client::HttpClient;
use crate::models::job::{ActionIdentity, Job};

/// Outcome of a job acknowledgment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckStatus {
    /// The job is now owned by this worker
    Ok,

    /// The nonce was already consumed by another reservation
    ReservationConflict,
}

/// Pipeline service operations consumed by the worker
#[async_trait]
pub trait PipelineService: Send + Sync {
    /// Poll for up to `max_batch_size` jobs matching the action identity.
    /// Returns an empty list when no jobs are ready.
    async fn poll_for_jobs(
        &self,
        action: &ActionIdentity,
        max_batch_size: u32,
    ) -> Result<Vec<Job>, WorkerError>;

    /// Acknowledge a job with its single-use nonce
    async fn acknowledge_job(&self, job_id: &str, nonce: &str) -> Result<AckStatus, WorkerError>;

    /// Report job success
    async fn put_job_success(&self, job_id: &str) -> Result<(), WorkerError>;

    /// Report job failure with a message
    async fn put_job_failure(&self, job_id: &str, message: &str) -> Result<(), WorkerError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PollRequest<'a> {
    action_type_id: &'a ActionIdentity,
    max_batch_size: u32,
}

#[derive(Debug, Deserialize)]
struct PollResponse {
    jobs: Vec<Job>,
}

#[derive(Debug, Serialize)]
struct AcknowledgeRequest<'a> {
    nonce: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SuccessRequest {
    completed_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FailureRequest<'a> {
    message: &'a str,
    completed_at: chrono::DateTime<chrono::Utc>,
}

/// HTTP-backed pipeline service client
pub struct HttpPipelineClient {
    client: HttpClient,
    token: SecretString,
}

impl HttpPipelineClient {
    /// Create a new pipeline service client
    pub fn new(base_url: &str, token: SecretString) -> Result<Self, WorkerError> {
        Ok(Self {
            client: HttpClient::new(base_url)?,
            token,
        })
    }
}

#[async_trait]
impl PipelineService for HttpPipelineClient {
    async fn poll_for_jobs(
        &self,
        action: &ActionIdentity,
        max_batch_size: u32,
    ) -> Result<Vec<Job>, WorkerError> {
        let request = PollRequest {
            action_type_id: action,
            max_batch_size,
        };
        let response: PollResponse = self
            .client
            .post("/jobs/poll", self.token.expose_secret(), &request)
            .await?;
        Ok(response.jobs)
    }

    async fn acknowledge_job(&self, job_id: &str, nonce: &str) -> Result<AckStatus, WorkerError> {
        let path = format!("/jobs/{}/acknowledge", job_id);
        let status = self
            .client
            .post_status(&path, self.token.expose_secret(), &AcknowledgeRequest { nonce })
            .await?;

        match status {
            s if s.is_success() => Ok(AckStatus::Ok),
            StatusCode::CONFLICT => {
                debug!("Job {} was already reserved", job_id);
                Ok(AckStatus::ReservationConflict)
            }
            s => Err(WorkerError::PipelineServiceError(format!(
                "Acknowledge of job {} failed: {}",
                job_id, s
            ))),
        }
    }

    async fn put_job_success(&self, job_id: &str) -> Result<(), WorkerError> {
        let path = format!("/jobs/{}/result/success", job_id);
        let status = self
            .client
            .post_status(
                &path,
                self.token.expose_secret(),
                &SuccessRequest {
                    completed_at: chrono::Utc::now(),
                },
            )
            .await?;
        if !status.is_success() {
            return Err(WorkerError::PipelineServiceError(format!(
                "Success report for job {} failed: {}",
                job_id, status
            )));
        }
        Ok(())
    }

    async fn put_job_failure(&self, job_id: &str, message: &str) -> Result<(), WorkerError> {
        let path = format!("/jobs/{}/result/failure", job_id);
        let status = self
            .client
            .post_status(
                &path,
                self.token.expose_secret(),
                &FailureRequest {
                    message,
                    completed_at: chrono::Utc::now(),
                },
            )
            .await?;
        if !status.is_success() {
            return Err(WorkerError::PipelineServiceError(format!(
                "Failure report for job {} failed: {}",
                job_id, status
            )));
        }
        Ok(())
    }
}
