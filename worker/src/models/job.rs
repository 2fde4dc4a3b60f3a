//! Job models

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Identity of the pipeline action this worker executes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionIdentity {
    /// Action category, e.g. "Deploy"
    pub category: String,

    /// Action provider name
    pub provider: String,

    /// Action version
    pub version: String,
}

impl Default for ActionIdentity {
    fn default() -> Self {
        Self {
            category: "Deploy".to_string(),
            provider: "Stevedore".to_string(),
            version: "v1".to_string(),
        }
    }
}

/// Location of the job's input artifact in the artifact store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactLocation {
    pub bucket: String,
    pub key: String,
}

/// Scoped temporary credentials for fetching the input artifact
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopedCredentials {
    pub access_key_id: String,
    pub secret_access_key: SecretString,
    pub session_token: SecretString,
}

/// Action configuration carried by a job
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionConfiguration {
    /// Name of the pipeline the job belongs to
    pub pipeline_name: String,

    /// Comma-separated list of environments to deploy
    pub environments_to_deploy: String,
}

impl ActionConfiguration {
    /// Environment names to deploy, in declaration order
    pub fn environments(&self) -> Vec<String> {
        self.environments_to_deploy
            .split(',')
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect()
    }
}

/// A deployment job dispatched by the pipeline service
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Unique job ID
    pub id: String,

    /// Single-use reservation nonce
    pub nonce: String,

    /// Input artifact location
    pub artifact: ArtifactLocation,

    /// Scoped temporary credentials for the artifact store
    pub credentials: ScopedCredentials,

    /// Action configuration
    pub configuration: ActionConfiguration,
}
