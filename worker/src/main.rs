//! Stevedore - Entry Point
//!
//! A worker that polls an external pipeline service for deployment jobs and
//! executes dependency-ordered multi-service deployments.

use std::collections::HashMap;
use std::env;
use std::str::FromStr;

use secrecy::SecretString;
use tracing::{error, info};

use stevedore::app::options::{AppOptions, StorageOptions};
use stevedore::app::run::run;
use stevedore::logs::{init_logging, LogLevel, LogOptions};
use stevedore::storage::layout::StorageLayout;
use stevedore::storage::settings::Settings;
use stevedore::utils::version_info;
use stevedore::workers::poller;

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    let version = version_info();
    if cli_args.contains_key("version") {
        println!("{}", serde_json::to_string_pretty(&version).unwrap());
        return;
    }

    // Retrieve the settings file
    let layout = match cli_args.get("base-dir") {
        Some(dir) => StorageLayout::new(dir),
        None => StorageLayout::default(),
    };
    let settings = match Settings::load(&layout.settings_file()).await {
        Ok(settings) => settings,
        Err(e) => {
            error!("Unable to read settings file: {}", e);
            return;
        }
    };

    // Initialize logging
    let log_options = LogOptions {
        log_level: LogLevel::from_str(&settings.log_level).unwrap_or_default(),
        log_dir: settings.log_to_file.then(|| layout.logs_dir()),
    };
    let _log_guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            println!("Failed to initialize logging: {e}");
            None
        }
    };

    // Run the worker
    let options = AppOptions {
        pipeline_base_url: settings.pipeline_base_url.clone(),
        artifact_base_url: settings.artifact_base_url.clone(),
        api_token: SecretString::from(settings.api_token.clone()),
        action: settings.action.clone(),
        storage: StorageOptions { layout },
        poller: poller::Options {
            interval: std::time::Duration::from_secs(settings.poll_interval_secs),
            ..Default::default()
        },
    };

    info!("Running stevedore worker for action {:?}", options.action);
    let result = run(version.version, options, await_shutdown_signal()).await;
    if let Err(e) = result {
        error!("Failed to run the worker: {e}");
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).unwrap();

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
        info!("Ctrl+C received, shutting down...");
    }
}
