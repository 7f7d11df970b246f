//! `jobpool-worker` -- bulk record importer.
//!
//! Reads a JSON array of record requests, creates them concurrently and
//! prints a partial-success summary as JSON on stdout. Ctrl-C cancels the
//! batch.
//!
//! # Environment variables
//!
//! | Variable              | Required | Default | Description                          |
//! |-----------------------|----------|---------|--------------------------------------|
//! | `IMPORT_INPUT_PATH`   | no       | stdin   | JSON file holding the record array   |
//! | `IMPORT_CONCURRENCY`  | no       | `5`     | Worker count (`0` = one per record)  |
//! | `IMPORT_TIMEOUT_SECS` | no       | --      | Deadline for the whole batch         |

use std::io::Read;

use jobpool_core::Context;
use jobpool_worker::config::ImportConfig;
use jobpool_worker::import::{self, ImportError};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jobpool_worker=info,jobpool_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ImportConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });

    tracing::info!(
        input = ?config.input_path,
        concurrency = config.concurrency,
        timeout_secs = config.timeout.map(|t| t.as_secs()),
        "Starting jobpool-worker",
    );

    match run(&config).await {
        Ok(all_succeeded) => {
            if !all_succeeded {
                std::process::exit(2);
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Bulk import failed");
            std::process::exit(1);
        }
    }
}

/// Returns whether every record was created.
async fn run(config: &ImportConfig) -> Result<bool, ImportError> {
    let input = read_input(config)?;
    let requests = import::parse_requests(&input)?;

    let shutdown = Context::new();
    let ctx = match config.timeout {
        Some(timeout) => shutdown.with_timeout(timeout),
        None => shutdown.child(),
    };

    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling import");
            on_signal.cancel();
        }
    });

    let summary = import::bulk_import(&ctx, &requests, config.concurrency).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(summary.all_succeeded())
}

fn read_input(config: &ImportConfig) -> Result<String, ImportError> {
    match &config.input_path {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;
            Ok(input)
        }
    }
}
