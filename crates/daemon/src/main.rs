// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Herd master (herdd)
//!
//! Long-running process that keeps a pool of worker processes alive and
//! reacts to operator signals.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod args;
mod lifecycle;
mod signals;

use std::time::Instant;

use clap::Parser;
use herd_core::{ClusterConfig, Event};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::args::Args;
use crate::lifecycle::LifecycleError;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Args::parse().into_config()?;

    // Write startup marker to log (before tracing setup, so the operator can find it)
    write_startup_marker(&config)?;

    // Set up logging
    let log_guard = setup_logging(&config)?;

    info!("Starting {} (pid: {})", config.title, std::process::id());

    let mut master = match lifecycle::startup(&config).await {
        Ok(m) => m,
        Err(e) => {
            // Write error synchronously (tracing is non-blocking and may not flush in time)
            write_startup_error(&config, &e);
            error!("Failed to start master: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    // Set up signal handlers before the first worker exists
    let (signal_tx, mut signals) = mpsc::channel(16);
    signals::bind_all(signal_tx)?;

    master.start().await;

    // Main event loop
    loop {
        let deadline = master.next_deadline();

        tokio::select! {
            Some(signal) = signals.recv() => {
                master.process_event(Event::Signal { signal }).await;
            }

            // Exit and message notifications from workers
            Some(event) = master.worker_events.recv() => {
                master.process_event(event).await;
            }

            _ = sleep_until(deadline) => {
                master.fire_timers().await;
            }
        }

        if master.exit_requested() {
            break;
        }
    }

    master.shutdown().await;
    info!("Master stopped");
    Ok(())
}

/// Sleep until the next timer deadline, or forever when none is armed
async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending().await,
    }
}

/// Startup marker prefix written to log before anything else.
/// Full format: "--- herdd: starting (pid: 12345) ---"
pub const STARTUP_MARKER_PREFIX: &str = "--- herdd: starting (pid: ";

/// Write startup marker to log file (appends to existing log)
fn write_startup_marker(config: &ClusterConfig) -> Result<(), LifecycleError> {
    use std::io::Write;

    if let Some(parent) = config.log.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log)?;
    writeln!(file, "{}{}) ---", STARTUP_MARKER_PREFIX, std::process::id())?;

    Ok(())
}

/// Write startup error synchronously to log file.
fn write_startup_error(config: &ClusterConfig, error: &LifecycleError) {
    use std::io::Write;

    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log)
    else {
        return;
    };
    let _ = writeln!(file, "ERROR Failed to start master: {}", error);
}

fn setup_logging(
    config: &ClusterConfig,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let invalid = || LifecycleError::InvalidLogPath(config.log.clone());
    let file_appender = tracing_appender::rolling::never(
        config.log.parent().ok_or_else(invalid)?,
        config.log.file_name().ok_or_else(invalid)?,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Every line goes to the log file and is echoed on the console
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(guard)
}
