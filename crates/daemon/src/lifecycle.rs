// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Master lifecycle management: startup, shutdown.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use fs2::FileExt;
use herd_adapters::{ChildProcessAdapter, LaunchConfig, TracedProcessAdapter};
use herd_core::{ClusterConfig, ControlSignal, Event, SystemClock};
use herd_engine::{Runtime, RuntimeDeps};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Master runtime with concrete adapter types (wrapped with tracing)
pub type MasterRuntime = Runtime<TracedProcessAdapter<ChildProcessAdapter>, SystemClock>;

/// Capacity of the worker exit/message channel
const WORKER_EVENT_CAPACITY: usize = 256;

/// Master state during operation
pub struct MasterState {
    pub config: ClusterConfig,
    // NOTE(lifetime): Held to maintain exclusive pidfile lock; released on drop
    #[allow(dead_code)]
    pidfile_lock: Option<File>,
    /// Runtime for event processing
    pub runtime: MasterRuntime,
    /// Exit and message notifications from worker processes
    pub worker_events: mpsc::Receiver<Event>,
    /// When the master started
    pub start_time: Instant,
}

impl MasterState {
    /// Begin launching the initial workers
    pub async fn start(&self) {
        self.runtime.start().await;
    }

    /// Process an event and everything it feeds back through the runtime
    pub async fn process_event(&self, event: Event) {
        self.runtime.process(event).await;
    }

    /// Fire due timers
    pub async fn fire_timers(&self) {
        self.runtime.fire_timers().await;
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.runtime.next_deadline()
    }

    /// Whether the supervisor finished draining workers
    pub fn exit_requested(&self) -> bool {
        self.runtime.exit_requested()
    }

    /// Shutdown the master once the loop has ended
    pub async fn shutdown(&mut self) {
        self.process_event(Event::Signal {
            signal: ControlSignal::MasterExit,
        })
        .await;

        // Normally already removed by the supervisor once drained
        if let Some(path) = &self.config.pidfile {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    warn!("Failed to remove pidfile: {}", e);
                }
            }
        }

        info!(
            uptime_secs = self.start_time.elapsed().as_secs(),
            "Master shutdown complete"
        );
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("pidfile {0} is locked: master already running?")]
    LockFailed(PathBuf, #[source] std::io::Error),

    #[error("Invalid log path: {0}")]
    InvalidLogPath(PathBuf),

    #[error("Configuration error: {0}")]
    Config(#[from] herd_core::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the master
pub async fn startup(config: &ClusterConfig) -> Result<MasterState, LifecycleError> {
    // Lock failures must not remove a running master's pidfile
    let pidfile_lock = match &config.pidfile {
        Some(path) => Some(acquire_pidfile(path)?),
        None => None,
    };

    match startup_inner(config, pidfile_lock) {
        Ok(state) => Ok(state),
        Err(e) => {
            cleanup_on_failure(config);
            Err(e)
        }
    }
}

/// Create the pid directory, lock the pidfile and write our pid into it
pub fn acquire_pidfile(path: &Path) -> Result<File, LifecycleError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Not truncated until the lock is ours
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;
    file.try_lock_exclusive()
        .map_err(|e| LifecycleError::LockFailed(path.to_path_buf(), e))?;

    file.set_len(0)?;
    writeln!(file, "{}", std::process::id())?;
    file.flush()?;
    Ok(file)
}

fn startup_inner(
    config: &ClusterConfig,
    pidfile_lock: Option<File>,
) -> Result<MasterState, LifecycleError> {
    if let Some(parent) = config.log.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !config.exec.exists() {
        warn!(
            exec = %config.exec.display(),
            "worker executable not found; launches will be retried"
        );
    }

    let (worker_tx, worker_events) = mpsc::channel(WORKER_EVENT_CAPACITY);
    let processes = TracedProcessAdapter::new(ChildProcessAdapter::new(
        LaunchConfig::from_cluster(config),
        worker_tx,
    ));

    let runtime = Runtime::new(RuntimeDeps { processes }, config, SystemClock);

    log_options(config);

    Ok(MasterState {
        config: config.clone(),
        pidfile_lock,
        runtime,
        worker_events,
        start_time: Instant::now(),
    })
}

/// Options block written at startup
fn log_options(config: &ClusterConfig) {
    info!(" - STARTING CLUSTER -");
    for (key, value) in config.entries() {
        info!(" > {}: {}", key, value);
    }
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &ClusterConfig) {
    if let Some(path) = &config.pidfile {
        if path.exists() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
