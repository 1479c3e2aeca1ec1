// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker process adapters

mod child;

pub use child::ChildProcessAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeProcess, FakeProcessAdapter, ProcessCall};

use async_trait::async_trait;
use herd_core::{ClusterConfig, WorkerId};
use std::path::PathBuf;
use thiserror::Error;

/// Environment variable carrying the worker's title
pub const TITLE_ENV: &str = "HERD_WORKER_TITLE";
/// Environment variable carrying the worker's descriptor id
pub const ID_ENV: &str = "HERD_WORKER_ID";

/// Errors from process operations
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to spawn worker: {0}")]
    SpawnFailed(String),
    #[error("worker not found: {0}")]
    NotFound(WorkerId),
    #[error("send to worker {id} failed: {reason}")]
    SendFailed { id: WorkerId, reason: String },
}

/// How every worker is launched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchConfig {
    /// Application entry point
    pub exec: PathBuf,
    pub args: Vec<String>,
    /// Discard worker stderr instead of forwarding it
    pub silent: bool,
}

impl LaunchConfig {
    pub fn from_cluster(config: &ClusterConfig) -> Self {
        Self {
            exec: config.exec.clone(),
            args: config.args.clone(),
            silent: config.silent,
        }
    }
}

/// Adapter for starting and talking to worker processes
///
/// Exit notifications and worker messages are not return values: adapters
/// deliver them asynchronously as events to the master loop.
#[async_trait]
pub trait ProcessAdapter: Clone + Send + Sync + 'static {
    /// Start one worker process and return its OS pid
    async fn spawn(&self, id: WorkerId, title: &str) -> Result<u32, ProcessError>;

    /// Deliver one control message to a worker
    async fn send(&self, id: WorkerId, message: &str) -> Result<(), ProcessError>;
}
