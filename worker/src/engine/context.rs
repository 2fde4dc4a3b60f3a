//! Deployment engine contexts and results

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::spec::ServiceSpec;

/// Tag added to every service spec at ingestion, recording which pipeline
/// is deploying it
pub const PIPELINE_TAG: &str = "deployed-by-pipeline";

/// Per-service context handed to deployers
#[derive(Debug, Clone)]
pub struct ServiceContext {
    /// Application name from the deploy spec
    pub app_name: String,

    /// Pipeline performing the deploy
    pub pipeline_name: String,

    /// Environment this service belongs to
    pub environment_name: String,

    /// Service name
    pub service_name: String,

    /// Declared service type
    pub service_type: String,

    /// The declared spec (params, tags, dependencies)
    pub spec: ServiceSpec,

    /// Staged bundle directory for this job
    pub working_dir: PathBuf,
}

/// Context for one environment deploy run.
///
/// Owned exclusively by a single engine invocation; never shared across
/// concurrent jobs.
#[derive(Debug, Clone)]
pub struct EnvironmentContext {
    pub app_name: String,
    pub pipeline_name: String,
    pub environment_name: String,
    pub service_contexts: HashMap<String, ServiceContext>,
    pub working_dir: PathBuf,
}

impl EnvironmentContext {
    /// Build an environment context from the declared services.
    ///
    /// Each spec's tag set is augmented once with the pipeline marker tag.
    pub fn new(
        app_name: &str,
        pipeline_name: &str,
        environment_name: &str,
        services: HashMap<String, ServiceSpec>,
        working_dir: PathBuf,
    ) -> Self {
        let mut service_contexts = HashMap::new();
        for (name, mut spec) in services {
            spec.tags
                .insert(PIPELINE_TAG.to_string(), pipeline_name.to_string());

            let service_type = spec.service_type.clone();
            service_contexts.insert(
                name.clone(),
                ServiceContext {
                    app_name: app_name.to_string(),
                    pipeline_name: pipeline_name.to_string(),
                    environment_name: environment_name.to_string(),
                    service_name: name,
                    service_type,
                    spec,
                    working_dir: working_dir.clone(),
                },
            );
        }

        Self {
            app_name: app_name.to_string(),
            pipeline_name: pipeline_name.to_string(),
            environment_name: environment_name.to_string(),
            service_contexts,
            working_dir,
        }
    }

    /// Service names in deterministic order
    pub fn service_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.service_contexts.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Artifact of the pre-deploy phase for one service
#[derive(Debug, Clone, Default)]
pub struct PreDeployContext {
    pub service_name: String,
    pub outputs: HashMap<String, serde_json::Value>,
}

impl PreDeployContext {
    pub fn new(service_name: &str) -> Self {
        Self {
            service_name: service_name.to_string(),
            outputs: HashMap::new(),
        }
    }
}

/// Artifact of the bind phase for one service
#[derive(Debug, Clone, Default)]
pub struct BindContext {
    pub service_name: String,
    pub outputs: HashMap<String, serde_json::Value>,
}

impl BindContext {
    pub fn new(service_name: &str) -> Self {
        Self {
            service_name: service_name.to_string(),
            outputs: HashMap::new(),
        }
    }
}

/// Artifact of the deploy phase for one service, readable by dependent
/// services in later levels
#[derive(Debug, Clone, Default)]
pub struct DeployContext {
    pub service_name: String,

    /// Environment variables this service exports to its dependents
    pub environment_variables: HashMap<String, String>,

    pub outputs: HashMap<String, serde_json::Value>,
}

impl DeployContext {
    pub fn new(service_name: &str) -> Self {
        Self {
            service_name: service_name.to_string(),
            environment_variables: HashMap::new(),
            outputs: HashMap::new(),
        }
    }
}

/// Status of an environment deploy attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployStatus {
    Success,
    Failure,
}

/// Result of one environment deploy attempt
#[derive(Debug, Clone)]
pub struct EnvironmentDeployResult {
    pub status: DeployStatus,
    pub message: String,
    pub bind_contexts: HashMap<String, BindContext>,
    pub deploy_contexts: HashMap<String, DeployContext>,
}

impl EnvironmentDeployResult {
    /// Successful run with its accumulated contexts
    pub fn success(
        message: String,
        bind_contexts: HashMap<String, BindContext>,
        deploy_contexts: HashMap<String, DeployContext>,
    ) -> Self {
        Self {
            status: DeployStatus::Success,
            message,
            bind_contexts,
            deploy_contexts,
        }
    }

    /// Failed run with the captured error message
    pub fn failure(message: String) -> Self {
        Self {
            status: DeployStatus::Failure,
            message,
            bind_contexts: HashMap::new(),
            deploy_contexts: HashMap::new(),
        }
    }
}
