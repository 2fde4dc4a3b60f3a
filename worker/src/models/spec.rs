//! Deploy spec models
//!
//! The staged bundle carries a `deploy-spec.yml` file at its root declaring
//! the services to deploy for each environment.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::WorkerError;

/// File name of the deploy spec inside the staged bundle
pub const DEPLOY_SPEC_FILE: &str = "deploy-spec.yml";

/// A single declared service within an environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSpec {
    /// Declared service type, resolved against the deployer registry
    #[serde(rename = "type")]
    pub service_type: String,

    /// Names of other services in the same environment this service depends on
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Tag set; augmented once at ingestion with the pipeline marker
    #[serde(default)]
    pub tags: HashMap<String, String>,

    /// Type-specific parameters
    #[serde(flatten)]
    pub params: HashMap<String, serde_json::Value>,
}

/// The parsed deploy spec file
#[derive(Debug, Clone, Deserialize)]
pub struct DeploySpecFile {
    /// Spec format version
    pub version: u32,

    /// Application name
    pub name: String,

    /// Environment name -> service name -> spec
    pub environments: HashMap<String, HashMap<String, ServiceSpec>>,
}

impl DeploySpecFile {
    /// Load the deploy spec from a staged bundle directory
    pub async fn load(bundle_dir: &Path) -> Result<Self, WorkerError> {
        let path = bundle_dir.join(DEPLOY_SPEC_FILE);
        debug!("Loading deploy spec from {}", path.display());

        let contents = tokio::fs::read_to_string(&path).await.map_err(|e| {
            WorkerError::StageError(format!(
                "Missing or unreadable {} in bundle: {}",
                DEPLOY_SPEC_FILE, e
            ))
        })?;

        let spec: DeploySpecFile = serde_yaml::from_str(&contents)?;
        Ok(spec)
    }
}
