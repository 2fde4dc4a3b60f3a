//! Main application run loop

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{error, info};

use crate::app::options::AppOptions;
use crate::deployers;
use crate::errors::WorkerError;
use crate::http::artifacts::{ArtifactStore, HttpArtifactStore};
use crate::http::pipeline::{HttpPipelineClient, PipelineService};
use crate::jobs::runner::JobRunner;
use crate::workers::poller;

/// Run the stevedore worker
pub async fn run(
    worker_version: String,
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), WorkerError> {
    info!("Initializing stevedore worker v{}...", worker_version);

    let pipeline: Arc<dyn PipelineService> = Arc::new(HttpPipelineClient::new(
        &options.pipeline_base_url,
        options.api_token.clone(),
    )?);
    let store: Arc<dyn ArtifactStore> = Arc::new(HttpArtifactStore::new(&options.artifact_base_url)?);

    let registry = Arc::new(deployers::default_registry());
    let runner = Arc::new(JobRunner::new(
        store,
        registry,
        options.storage.layout.clone(),
    ));

    // Create shutdown channel
    let (shutdown_tx, _shutdown_rx): (broadcast::Sender<()>, _) = broadcast::channel(1);
    let mut shutdown_rx = shutdown_tx.subscribe();

    let poller_options = options.poller.clone();
    let action = options.action.clone();
    let poller_handle = tokio::spawn(async move {
        poller::run(
            &poller_options,
            pipeline,
            runner,
            action,
            tokio::time::sleep,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });

    shutdown_signal.await;
    info!("Shutdown signal received, shutting down...");

    drop(shutdown_tx);
    if let Err(e) = poller_handle.await {
        error!("Poller worker ended abnormally: {}", e);
    }

    Ok(())
}
