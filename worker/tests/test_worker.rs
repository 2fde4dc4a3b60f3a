//! Poll cycle, reservation, and reporting tests

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use secrecy::SecretString;

use stevedore::engine::context::{
    BindContext, DeployContext, PreDeployContext, ServiceContext,
};
use stevedore::engine::registry::{DeployerRegistry, ServiceDeployer};
use stevedore::errors::WorkerError;
use stevedore::http::artifacts::ArtifactStore;
use stevedore::http::pipeline::{AckStatus, PipelineService};
use stevedore::jobs::reservation;
use stevedore::jobs::runner::JobRunner;
use stevedore::models::job::{
    ActionConfiguration, ActionIdentity, ArtifactLocation, Job, ScopedCredentials,
};
use stevedore::storage::layout::StorageLayout;
use stevedore::workers::poller;

/// Pipeline service mock backed by an in-memory nonce table
#[derive(Default)]
struct MockPipeline {
    /// Jobs handed out by every poll
    jobs: Mutex<Vec<Job>>,

    /// Drain jobs on first poll instead of repeating them
    drain_on_poll: bool,

    /// Nonces already consumed by an acknowledgment
    consumed_nonces: Mutex<HashSet<String>>,

    /// Job ids that always see a reservation conflict
    always_conflicting: HashSet<String>,

    success_reports: Mutex<Vec<String>>,
    failure_reports: Mutex<Vec<(String, String)>>,
}

impl MockPipeline {
    fn with_jobs(jobs: Vec<Job>, drain_on_poll: bool) -> Self {
        Self {
            jobs: Mutex::new(jobs),
            drain_on_poll,
            ..Default::default()
        }
    }

    fn successes(&self) -> Vec<String> {
        self.success_reports.lock().unwrap().clone()
    }

    fn failures(&self) -> Vec<(String, String)> {
        self.failure_reports.lock().unwrap().clone()
    }
}

#[async_trait]
impl PipelineService for MockPipeline {
    async fn poll_for_jobs(
        &self,
        _action: &ActionIdentity,
        _max_batch_size: u32,
    ) -> Result<Vec<Job>, WorkerError> {
        let mut jobs = self.jobs.lock().unwrap();
        if self.drain_on_poll {
            Ok(std::mem::take(&mut *jobs))
        } else {
            Ok(jobs.clone())
        }
    }

    async fn acknowledge_job(&self, job_id: &str, nonce: &str) -> Result<AckStatus, WorkerError> {
        if self.always_conflicting.contains(job_id) {
            return Ok(AckStatus::ReservationConflict);
        }
        let mut consumed = self.consumed_nonces.lock().unwrap();
        if consumed.contains(nonce) {
            Ok(AckStatus::ReservationConflict)
        } else {
            consumed.insert(nonce.to_string());
            Ok(AckStatus::Ok)
        }
    }

    async fn put_job_success(&self, job_id: &str) -> Result<(), WorkerError> {
        self.success_reports.lock().unwrap().push(job_id.to_string());
        Ok(())
    }

    async fn put_job_failure(&self, job_id: &str, message: &str) -> Result<(), WorkerError> {
        self.failure_reports
            .lock()
            .unwrap()
            .push((job_id.to_string(), message.to_string()));
        Ok(())
    }
}

/// Artifact store mock serving a fixed bundle
struct MockStore {
    bundle: Vec<u8>,
    fetched_keys: Mutex<Vec<String>>,
}

impl MockStore {
    fn new(bundle: Vec<u8>) -> Self {
        Self {
            bundle,
            fetched_keys: Mutex::new(Vec::new()),
        }
    }

    fn fetch_count(&self) -> usize {
        self.fetched_keys.lock().unwrap().len()
    }
}

#[async_trait]
impl ArtifactStore for MockStore {
    async fn fetch(
        &self,
        location: &ArtifactLocation,
        _credentials: &ScopedCredentials,
        dest: &Path,
    ) -> Result<(), WorkerError> {
        self.fetched_keys.lock().unwrap().push(location.key.clone());
        tokio::fs::write(dest, &self.bundle).await?;
        Ok(())
    }
}

/// Deployer that succeeds without side effects
struct NoopDeployer;

#[async_trait]
impl ServiceDeployer for NoopDeployer {
    fn check(&self, _ctx: &ServiceContext) -> Vec<String> {
        Vec::new()
    }

    async fn pre_deploy(&self, ctx: &ServiceContext) -> Result<PreDeployContext, WorkerError> {
        Ok(PreDeployContext::new(&ctx.service_name))
    }

    async fn bind(
        &self,
        ctx: &ServiceContext,
        _dependency_contexts: &HashMap<String, DeployContext>,
    ) -> Result<BindContext, WorkerError> {
        Ok(BindContext::new(&ctx.service_name))
    }

    async fn deploy(
        &self,
        ctx: &ServiceContext,
        _pre_deploy_contexts: &HashMap<String, PreDeployContext>,
        _dependency_contexts: &HashMap<String, DeployContext>,
    ) -> Result<DeployContext, WorkerError> {
        Ok(DeployContext::new(&ctx.service_name))
    }
}

const SPEC_YAML: &str = r#"
version: 1
name: sampleapp
environments:
  dev:
    database:
      type: mock
    app:
      type: mock
      dependencies:
        - database
"#;

/// Build a tar.gz bundle carrying a deploy spec
fn bundle_with_spec(spec_yaml: &str) -> Vec<u8> {
    let mut bytes = Vec::new();
    {
        let encoder =
            flate2::write::GzEncoder::new(&mut bytes, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);

        let data = spec_yaml.as_bytes();
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, "deploy-spec.yml", data)
            .unwrap();

        builder.into_inner().unwrap().finish().unwrap();
    }
    bytes
}

fn job(id: &str, environments: &str) -> Job {
    Job {
        id: id.to_string(),
        nonce: format!("nonce-{}", id),
        artifact: ArtifactLocation {
            bucket: "artifacts".to_string(),
            key: format!("{}.tar.gz", id),
        },
        credentials: ScopedCredentials {
            access_key_id: "AKID".to_string(),
            secret_access_key: SecretString::from("secret".to_string()),
            session_token: SecretString::from("token".to_string()),
        },
        configuration: ActionConfiguration {
            pipeline_name: "pipe".to_string(),
            environments_to_deploy: environments.to_string(),
        },
    }
}

fn runner_with(store: Arc<MockStore>, base_dir: &Path) -> Arc<JobRunner> {
    let mut registry = DeployerRegistry::new();
    registry.register("mock", Arc::new(NoopDeployer));
    Arc::new(JobRunner::new(
        store,
        Arc::new(registry),
        StorageLayout::new(base_dir),
    ))
}

#[tokio::test]
async fn test_only_reserved_jobs_are_staged_and_executed() {
    let tmp = tempfile::tempdir().unwrap();
    let store = Arc::new(MockStore::new(bundle_with_spec(SPEC_YAML)));
    let runner = runner_with(store.clone(), tmp.path());

    let mut pipeline = MockPipeline::with_jobs(
        vec![job("j1", "dev"), job("j2", "dev"), job("j3", "dev")],
        true,
    );
    pipeline.always_conflicting.insert("j2".to_string());
    let pipeline = Arc::new(pipeline);

    poller::run_cycle(pipeline.clone(), runner, ActionIdentity::default(), 5).await;

    // j2 lost the reservation: no fetch, no report
    assert_eq!(store.fetch_count(), 2);
    let mut successes = pipeline.successes();
    successes.sort();
    assert_eq!(successes, vec!["j1".to_string(), "j3".to_string()]);
    assert!(pipeline.failures().is_empty());
}

#[tokio::test]
async fn test_stale_nonce_acknowledgment_is_benign() {
    let pipeline = MockPipeline::default();

    let first = reservation::reserve(&pipeline, job("j1", "dev")).await.unwrap();
    assert!(first.is_some());

    // Same nonce a second time: dropped silently, no error
    let second = reservation::reserve(&pipeline, job("j1", "dev")).await.unwrap();
    assert!(second.is_none());
}

#[tokio::test]
async fn test_overlapping_cycles_claim_a_job_at_most_once() {
    let tmp = tempfile::tempdir().unwrap();
    let store = Arc::new(MockStore::new(bundle_with_spec(SPEC_YAML)));
    let runner = runner_with(store.clone(), tmp.path());

    // Both cycles poll the same job; the nonce table admits one claim
    let pipeline = Arc::new(MockPipeline::with_jobs(vec![job("j1", "dev")], false));

    tokio::join!(
        poller::run_cycle(pipeline.clone(), runner.clone(), ActionIdentity::default(), 5),
        poller::run_cycle(pipeline.clone(), runner.clone(), ActionIdentity::default(), 5),
    );

    assert_eq!(store.fetch_count(), 1);
    assert_eq!(pipeline.successes(), vec!["j1".to_string()]);
}

#[tokio::test]
async fn test_end_to_end_success_report() {
    let tmp = tempfile::tempdir().unwrap();
    let store = Arc::new(MockStore::new(bundle_with_spec(SPEC_YAML)));
    let runner = runner_with(store.clone(), tmp.path());
    let pipeline = Arc::new(MockPipeline::with_jobs(vec![job("j1", "dev")], true));

    poller::run_cycle(pipeline.clone(), runner, ActionIdentity::default(), 5).await;

    assert_eq!(pipeline.successes(), vec!["j1".to_string()]);
    assert!(pipeline.failures().is_empty());
    // Staging dir is cleaned up after the run
    assert!(!tmp.path().join("staging").join("pipe").join("j1").exists());
}

#[tokio::test]
async fn test_environment_missing_from_spec_reports_failure() {
    let tmp = tempfile::tempdir().unwrap();
    let store = Arc::new(MockStore::new(bundle_with_spec(SPEC_YAML)));
    let runner = runner_with(store.clone(), tmp.path());
    let pipeline = Arc::new(MockPipeline::with_jobs(vec![job("j1", "dev,qa")], true));

    poller::run_cycle(pipeline.clone(), runner, ActionIdentity::default(), 5).await;

    // dev deployed fine but qa is undeclared, so the job is a failure
    assert!(pipeline.successes().is_empty());
    let failures = pipeline.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "j1");
    assert!(failures[0].1.contains("qa"));
}

#[tokio::test]
async fn test_corrupt_bundle_fails_only_that_job() {
    let tmp = tempfile::tempdir().unwrap();
    let store = Arc::new(MockStore::new(b"not a tarball".to_vec()));
    let runner = runner_with(store.clone(), tmp.path());
    let pipeline = Arc::new(MockPipeline::with_jobs(vec![job("j1", "dev")], true));

    poller::run_cycle(pipeline.clone(), runner, ActionIdentity::default(), 5).await;

    let failures = pipeline.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "j1");
}
