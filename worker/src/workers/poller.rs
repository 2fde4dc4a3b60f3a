//! Polling worker for job discovery and execution

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, error, info};

use crate::errors::WorkerError;
use crate::http::pipeline::PipelineService;
use crate::jobs::reservation;
use crate::jobs::runner::JobRunner;
use crate::models::job::ActionIdentity;

/// Poller worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Polling interval
    pub interval: Duration,

    /// Initial delay before first poll
    pub initial_delay: Duration,

    /// Maximum jobs requested per poll
    pub max_batch_size: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            initial_delay: Duration::from_secs(5),
            max_batch_size: 5,
        }
    }
}

/// Run the poller worker.
///
/// Every tick spawns an independent cycle; the timer never waits for a
/// previous cycle to drain, so cycles may overlap.
pub async fn run<S, F>(
    options: &Options,
    pipeline: Arc<dyn PipelineService>,
    runner: Arc<JobRunner>,
    action: ActionIdentity,
    sleep_fn: S,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Poller worker starting...");

    // Initial delay
    sleep_fn(options.initial_delay).await;

    loop {
        // Check for shutdown
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Poller worker shutting down...");
                return;
            }
            _ = sleep_fn(options.interval) => {
                // Continue with poll
            }
        }

        tokio::spawn(run_cycle(
            pipeline.clone(),
            runner.clone(),
            action.clone(),
            options.max_batch_size,
        ));
    }
}

/// Run one poll cycle.
///
/// Any failure is logged and swallowed so the timer survives every cycle.
pub async fn run_cycle(
    pipeline: Arc<dyn PipelineService>,
    runner: Arc<JobRunner>,
    action: ActionIdentity,
    max_batch_size: u32,
) {
    if let Err(e) = cycle(pipeline, runner, action, max_batch_size).await {
        error!("Poll cycle failed: {}", e);
    }
}

async fn cycle(
    pipeline: Arc<dyn PipelineService>,
    runner: Arc<JobRunner>,
    action: ActionIdentity,
    max_batch_size: u32,
) -> Result<(), WorkerError> {
    debug!("Polling for jobs...");
    let jobs = pipeline.poll_for_jobs(&action, max_batch_size).await?;
    if jobs.is_empty() {
        debug!("No jobs ready");
        return Ok(());
    }

    info!("Polled {} job(s)", jobs.len());
    let reserved = reservation::reserve_batch(pipeline.as_ref(), jobs).await?;

    // Reserved jobs run concurrently and independently of each other
    join_all(reserved.into_iter().map(|job| {
        let pipeline = pipeline.clone();
        let runner = runner.clone();
        async move {
            runner.execute_and_report(pipeline.as_ref(), job).await;
        }
    }))
    .await;

    Ok(())
}
