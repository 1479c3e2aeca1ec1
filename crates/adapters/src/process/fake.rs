// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake process adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ProcessAdapter, ProcessError};
use async_trait::async_trait;
use herd_core::{Event, WorkerId};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// First pid handed out by the fake
const FIRST_PID: u32 = 1000;

/// Recorded process call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessCall {
    Spawn { id: WorkerId, title: String },
    Send { id: WorkerId, message: String },
}

/// Fake worker state
#[derive(Debug, Clone)]
pub struct FakeProcess {
    pub title: String,
    pub pid: u32,
    pub received: Vec<String>,
}

#[derive(Default)]
struct FakeState {
    processes: BTreeMap<WorkerId, FakeProcess>,
    calls: Vec<ProcessCall>,
    spawned: u32,
    fail_spawns: bool,
}

/// Fake process adapter for testing
///
/// Nothing exits on its own: tests decide when a worker dies with [`Self::exit`]
/// and feed the returned event back into the code under test.
#[derive(Clone, Default)]
pub struct FakeProcessAdapter {
    inner: Arc<Mutex<FakeState>>,
}

impl FakeProcessAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<ProcessCall> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .calls
            .clone()
    }

    /// Ids of all live fake workers
    pub fn live(&self) -> Vec<WorkerId> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .processes
            .keys()
            .copied()
            .collect()
    }

    pub fn get_process(&self, id: WorkerId) -> Option<FakeProcess> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .processes
            .get(&id)
            .cloned()
    }

    /// Control lines received by a worker, in order
    pub fn received(&self, id: WorkerId) -> Vec<String> {
        self.get_process(id)
            .map(|p| p.received)
            .unwrap_or_default()
    }

    /// Make subsequent spawns fail
    pub fn set_spawn_failure(&self, fail: bool) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).fail_spawns = fail;
    }

    /// Terminate a worker, returning the exit event to deliver
    pub fn exit(&self, id: WorkerId, code: i32) -> Option<Event> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.processes.remove(&id).map(|_| Event::WorkerExited {
            id,
            code: Some(code),
            signal: None,
        })
    }

    /// Terminate every worker that has been told to stop
    pub fn exit_stopped(&self) -> Vec<Event> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let stopped: Vec<WorkerId> = inner
            .processes
            .iter()
            .filter(|(_, p)| p.received.iter().any(|m| m == "stop" || m == "restart"))
            .map(|(id, _)| *id)
            .collect();
        stopped
            .into_iter()
            .filter_map(|id| {
                inner.processes.remove(&id).map(|_| Event::WorkerExited {
                    id,
                    code: Some(0),
                    signal: None,
                })
            })
            .collect()
    }
}

#[async_trait]
impl ProcessAdapter for FakeProcessAdapter {
    async fn spawn(&self, id: WorkerId, title: &str) -> Result<u32, ProcessError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.calls.push(ProcessCall::Spawn {
            id,
            title: title.to_string(),
        });

        if inner.fail_spawns {
            return Err(ProcessError::SpawnFailed("fake spawn failure".to_string()));
        }

        let pid = FIRST_PID + inner.spawned;
        inner.spawned += 1;
        inner.processes.insert(
            id,
            FakeProcess {
                title: title.to_string(),
                pid,
                received: Vec::new(),
            },
        );
        Ok(pid)
    }

    async fn send(&self, id: WorkerId, message: &str) -> Result<(), ProcessError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.calls.push(ProcessCall::Send {
            id,
            message: message.to_string(),
        });

        let process = inner
            .processes
            .get_mut(&id)
            .ok_or(ProcessError::NotFound(id))?;
        process.received.push(message.to_string());
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
