//! Error types for the stevedore worker

use thiserror::Error;

/// Main error type for the worker
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Pipeline service error: {0}")]
    PipelineServiceError(String),

    #[error("Artifact fetch error: {0}")]
    ArtifactFetchError(String),

    #[error("Stage error: {0}")]
    StageError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Cyclic dependency between services: {0}")]
    CyclicDependencyError(String),

    #[error("Deployer error: {0}")]
    DeployerError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for WorkerError {
    fn from(err: anyhow::Error) -> Self {
        WorkerError::Internal(err.to_string())
    }
}
