//! Job result reporting
//!
//! Collapses the per-environment deploy results into a single job-level
//! outcome. A job is binary; partial environment success reports as failure.

use tracing::info;

use crate::engine::context::{DeployStatus, EnvironmentDeployResult};
use crate::errors::WorkerError;
use crate::http::pipeline::PipelineService;

/// Job-level outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Success,
    Failure(String),
}

/// Aggregate the environment results, in the order environments were
/// processed, into one outcome
pub fn aggregate(results: &[EnvironmentDeployResult]) -> JobOutcome {
    let failures: Vec<&str> = results
        .iter()
        .filter(|r| r.status != DeployStatus::Success)
        .map(|r| r.message.as_str())
        .collect();

    if failures.is_empty() {
        JobOutcome::Success
    } else {
        JobOutcome::Failure(failures.join("\n"))
    }
}

/// Report the outcome to the pipeline service
pub async fn report(
    pipeline: &dyn PipelineService,
    job_id: &str,
    outcome: &JobOutcome,
) -> Result<(), WorkerError> {
    match outcome {
        JobOutcome::Success => {
            info!("Reporting success for job {}", job_id);
            pipeline.put_job_success(job_id).await
        }
        JobOutcome::Failure(message) => {
            info!("Reporting failure for job {}", job_id);
            pipeline.put_job_failure(job_id, message).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::context::EnvironmentDeployResult;
    use std::collections::HashMap;

    fn success(message: &str) -> EnvironmentDeployResult {
        EnvironmentDeployResult::success(message.to_string(), HashMap::new(), HashMap::new())
    }

    #[test]
    fn test_all_success_reports_success() {
        let results = vec![success("a"), success("b")];
        assert_eq!(aggregate(&results), JobOutcome::Success);
    }

    #[test]
    fn test_single_failure_message_is_verbatim() {
        let results = vec![
            EnvironmentDeployResult::failure("X".to_string()),
            success(""),
        ];
        assert_eq!(aggregate(&results), JobOutcome::Failure("X".to_string()));
    }

    #[test]
    fn test_failures_join_in_environment_order() {
        let results = vec![
            EnvironmentDeployResult::failure("first".to_string()),
            success("fine"),
            EnvironmentDeployResult::failure("second".to_string()),
        ];
        assert_eq!(
            aggregate(&results),
            JobOutcome::Failure("first\nsecond".to_string())
        );
    }

    #[test]
    fn test_no_results_reports_success() {
        assert_eq!(aggregate(&[]), JobOutcome::Success);
    }
}
