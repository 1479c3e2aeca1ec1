// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Effect executor

use crate::Scheduler;
use herd_adapters::{ProcessAdapter, ProcessError};
use herd_core::{Clock, Effect, Event, WorkerId};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors that can occur during effect execution
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("launch of worker {id} failed: {source}")]
    Launch {
        id: WorkerId,
        #[source]
        source: ProcessError,
    },
    #[error("message to worker failed: {0}")]
    Send(#[source] ProcessError),
    #[error("failed to remove pidfile {path}: {source}")]
    PidFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExecuteError {
    /// Event the supervisor still has to see after this failure
    pub fn into_event(self) -> Option<Event> {
        match self {
            // A worker that never started is indistinguishable from an immediate exit
            ExecuteError::Launch { id, .. } => Some(Event::WorkerExited {
                id,
                code: None,
                signal: None,
            }),
            ExecuteError::Send(_) | ExecuteError::PidFile { .. } => None,
        }
    }
}

/// Executes effects using the configured adapters
pub struct Executor<P, C> {
    processes: P,
    scheduler: Arc<Mutex<Scheduler>>,
    clock: C,
    pidfile: Option<PathBuf>,
    exit_requested: AtomicBool,
}

impl<P, C> Executor<P, C>
where
    P: ProcessAdapter,
    C: Clock,
{
    pub fn new(
        processes: P,
        scheduler: Arc<Mutex<Scheduler>>,
        clock: C,
        pidfile: Option<PathBuf>,
    ) -> Self {
        Self {
            processes,
            scheduler,
            clock,
            pidfile,
            exit_requested: AtomicBool::new(false),
        }
    }

    /// Execute a single effect with tracing
    ///
    /// Returns an optional event that should be fed back into the event loop.
    pub async fn execute(&self, effect: Effect) -> Result<Option<Event>, ExecuteError> {
        use herd_core::TracedEffect;

        let op_name = effect.name();
        let span = tracing::info_span!("effect", effect = op_name);
        let _guard = span.enter();

        tracing::debug!(fields = ?effect.fields(), "executing");

        let start = std::time::Instant::now();
        let result = self.execute_inner(effect).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(event) => tracing::debug!(
                elapsed_ms = elapsed.as_millis() as u64,
                has_event = event.is_some(),
                "completed"
            ),
            Err(e) => tracing::warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "failed"
            ),
        }

        result
    }

    async fn execute_inner(&self, effect: Effect) -> Result<Option<Event>, ExecuteError> {
        match effect {
            Effect::Launch { id, title } => {
                let pid = self
                    .processes
                    .spawn(id, &title)
                    .await
                    .map_err(|source| ExecuteError::Launch { id, source })?;
                Ok(Some(Event::WorkerSpawned { id, pid }))
            }

            Effect::Send { id, message } => {
                self.processes
                    .send(id, message.as_str())
                    .await
                    .map_err(ExecuteError::Send)?;
                Ok(None)
            }

            Effect::SetTimer { id, duration } => {
                let now = self.clock.now();
                self.scheduler
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .set_timer(id, duration, now);
                Ok(None)
            }

            Effect::CancelTimer { id } => {
                self.scheduler
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .cancel_timer(&id);
                Ok(None)
            }

            Effect::RemovePidFile => {
                let Some(path) = &self.pidfile else {
                    return Ok(None);
                };
                match std::fs::remove_file(path) {
                    Ok(()) => {
                        tracing::info!(path = %path.display(), "removed pidfile");
                        Ok(None)
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                    Err(source) => Err(ExecuteError::PidFile {
                        path: path.clone(),
                        source,
                    }),
                }
            }

            Effect::Exit => {
                self.exit_requested.store(true, Ordering::SeqCst);
                Ok(None)
            }
        }
    }

    /// Execute multiple effects in order
    ///
    /// A failed effect does not stop the ones after it. Returns any events
    /// that were produced (to be fed back into the event loop).
    pub async fn execute_all(&self, effects: Vec<Effect>) -> Vec<Event> {
        let mut result_events = Vec::new();
        for effect in effects {
            match self.execute(effect).await {
                Ok(Some(event)) => result_events.push(event),
                Ok(None) => {}
                Err(e) => result_events.extend(e.into_event()),
            }
        }
        result_events
    }

    /// Get a reference to the scheduler
    pub fn scheduler(&self) -> Arc<Mutex<Scheduler>> {
        Arc::clone(&self.scheduler)
    }

    /// Whether an `Exit` effect has run
    pub fn exit_requested(&self) -> bool {
        self.exit_requested.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
