//! Application configuration options

use secrecy::SecretString;

use crate::models::job::ActionIdentity;
use crate::storage::layout::StorageLayout;
use crate::workers::poller;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Pipeline service base URL
    pub pipeline_base_url: String,

    /// Artifact store base URL
    pub artifact_base_url: String,

    /// API token for the pipeline service
    pub api_token: SecretString,

    /// Action identity this worker polls for
    pub action: ActionIdentity,

    /// Storage configuration
    pub storage: StorageOptions,

    /// Poller worker options
    pub poller: poller::Options,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            pipeline_base_url: "https://pipeline.example.com/api/v1".to_string(),
            artifact_base_url: "https://artifacts.example.com".to_string(),
            api_token: SecretString::from(String::new()),
            action: ActionIdentity::default(),
            storage: StorageOptions::default(),
            poller: poller::Options::default(),
        }
    }
}

/// Storage configuration options
#[derive(Debug, Clone, Default)]
pub struct StorageOptions {
    /// Storage layout paths
    pub layout: StorageLayout,
}
