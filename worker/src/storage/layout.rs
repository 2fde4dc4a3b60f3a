//! Storage layout configuration

use std::path::PathBuf;

/// Storage layout for the worker
#[derive(Debug, Clone)]
pub struct StorageLayout {
    /// Base directory for all storage
    pub base_dir: PathBuf,
}

impl Default for StorageLayout {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("/var/lib/stevedore"),
        }
    }
}

impl StorageLayout {
    /// Create a new storage layout
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Get the settings file path
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("settings.json")
    }

    /// Get the logs directory
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// Get the staging directory for one job.
    ///
    /// Namespaced by pipeline name and job id so concurrently staged jobs
    /// never collide.
    pub fn staging_dir(&self, pipeline_name: &str, job_id: &str) -> PathBuf {
        self.base_dir
            .join("staging")
            .join(pipeline_name)
            .join(job_id)
    }
}
