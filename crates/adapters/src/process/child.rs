// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Child-process worker launcher
//!
//! Each worker is the configured executable started as a child process with
//! three pipes: stdin carries control lines from the master, stdout lines
//! are reported as worker messages, and stderr is forwarded or discarded.

use super::{LaunchConfig, ProcessAdapter, ProcessError, ID_ENV, TITLE_ENV};
use async_trait::async_trait;
use herd_core::{Event, WorkerId};
use std::collections::HashMap;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{mpsc, Mutex};

/// Launches workers as OS child processes
#[derive(Clone)]
pub struct ChildProcessAdapter {
    launch: Arc<LaunchConfig>,
    events: mpsc::Sender<Event>,
    channels: Arc<Mutex<HashMap<WorkerId, ChildStdin>>>,
}

impl ChildProcessAdapter {
    /// Exit and message notifications are delivered on `events`
    pub fn new(launch: LaunchConfig, events: mpsc::Sender<Event>) -> Self {
        Self {
            launch: Arc::new(launch),
            events,
            channels: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of workers with an open control channel
    pub async fn open_channels(&self) -> usize {
        self.channels.lock().await.len()
    }
}

#[async_trait]
impl ProcessAdapter for ChildProcessAdapter {
    async fn spawn(&self, id: WorkerId, title: &str) -> Result<u32, ProcessError> {
        let stderr = if self.launch.silent {
            Stdio::null()
        } else {
            Stdio::inherit()
        };

        let mut child = Command::new(&self.launch.exec)
            .args(&self.launch.args)
            .env(TITLE_ENV, title)
            .env(ID_ENV, id.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(stderr)
            .kill_on_drop(false)
            .spawn()
            .map_err(|e| {
                ProcessError::SpawnFailed(format!("{}: {}", self.launch.exec.display(), e))
            })?;

        // None only after the child has been reaped, which cannot have happened yet
        let pid = child.id().unwrap_or_default();

        if let Some(stdin) = child.stdin.take() {
            self.channels.lock().await.insert(id, stdin);
        }
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_messages(id, stdout, self.events.clone()));
        }
        tokio::spawn(wait_for_exit(
            id,
            child,
            self.events.clone(),
            Arc::clone(&self.channels),
        ));

        Ok(pid)
    }

    async fn send(&self, id: WorkerId, message: &str) -> Result<(), ProcessError> {
        let mut channels = self.channels.lock().await;
        let stdin = channels.get_mut(&id).ok_or(ProcessError::NotFound(id))?;

        let line = format!("{}\n", message);
        let result = match stdin.write_all(line.as_bytes()).await {
            Ok(()) => stdin.flush().await,
            Err(e) => Err(e),
        };

        result.map_err(|e| {
            // Broken pipe: the worker is going away, its exit event follows
            channels.remove(&id);
            ProcessError::SendFailed {
                id,
                reason: e.to_string(),
            }
        })
    }
}

async fn forward_messages(id: WorkerId, stdout: ChildStdout, events: mpsc::Sender<Event>) {
    let mut lines = BufReader::new(stdout).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(message)) => {
                if events
                    .send(Event::WorkerMessage { id, message })
                    .await
                    .is_err()
                {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(worker_id = %id, error = %e, "stopped reading worker output");
                break;
            }
        }
    }
}

async fn wait_for_exit(
    id: WorkerId,
    mut child: Child,
    events: mpsc::Sender<Event>,
    channels: Arc<Mutex<HashMap<WorkerId, ChildStdin>>>,
) {
    let status = child.wait().await;
    channels.lock().await.remove(&id);

    let (code, signal) = match status {
        Ok(status) => (status.code(), exit_signal(&status)),
        Err(e) => {
            tracing::warn!(worker_id = %id, error = %e, "failed to wait for worker");
            (None, None)
        }
    };

    // Receiver gone means the master loop is already down
    let _ = events.send(Event::WorkerExited { id, code, signal }).await;
}

#[cfg(unix)]
fn exit_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &ExitStatus) -> Option<i32> {
    None
}

#[cfg(test)]
#[path = "child_tests.rs"]
mod tests;
