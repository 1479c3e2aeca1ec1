// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrapper for consistent observability

use crate::process::{ProcessAdapter, ProcessError};
use async_trait::async_trait;
use herd_core::WorkerId;

/// Wrapper that adds tracing to any ProcessAdapter
#[derive(Clone)]
pub struct TracedProcessAdapter<P> {
    inner: P,
}

impl<P> TracedProcessAdapter<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: ProcessAdapter> ProcessAdapter for TracedProcessAdapter<P> {
    async fn spawn(&self, id: WorkerId, title: &str) -> Result<u32, ProcessError> {
        let span = tracing::info_span!("process.spawn", worker_id = %id, title);
        let _guard = span.enter();

        tracing::debug!("starting");

        let start = std::time::Instant::now();
        let result = self.inner.spawn(id, title).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(pid) => tracing::info!(
                pid,
                elapsed_ms = elapsed.as_millis() as u64,
                "worker process created"
            ),
            Err(e) => tracing::error!(
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "spawn failed"
            ),
        }

        result
    }

    async fn send(&self, id: WorkerId, message: &str) -> Result<(), ProcessError> {
        let span = tracing::info_span!("process.send", worker_id = %id, message);
        let _guard = span.enter();

        let result = self.inner.send(id, message).await;

        // A worker that already exited cannot be told anything; its exit event is in flight
        match &result {
            Ok(()) => tracing::debug!("sent"),
            Err(e) => tracing::warn!(error = %e, "send failed (worker may be exiting)"),
        }

        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
