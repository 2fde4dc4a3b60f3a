//! Worker settings file

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::WorkerError;
use crate::models::job::ActionIdentity;

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Settings loaded from the worker's settings file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Pipeline service base URL
    pub pipeline_base_url: String,

    /// Artifact store base URL
    pub artifact_base_url: String,

    /// API token for the pipeline service
    pub api_token: String,

    /// Action identity this worker polls for
    #[serde(default)]
    pub action: ActionIdentity,

    /// Poll interval in seconds
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable rolling file logging under the storage layout's logs dir
    #[serde(default)]
    pub log_to_file: bool,
}

impl Settings {
    /// Read settings from a JSON file
    pub async fn load(path: &Path) -> Result<Self, WorkerError> {
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            WorkerError::ConfigError(format!("Unable to read settings file {}: {}", path.display(), e))
        })?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }
}
