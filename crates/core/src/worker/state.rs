// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker descriptor state machine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sequence number assigned at launch, never reused within one master
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WorkerId(pub u64);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of one worker process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerState {
    /// Launch requested, process not confirmed yet
    Spawning,
    /// Process exists
    Running,
    /// `stop` has been sent
    StopRequested,
    /// Exit notification received
    Exited,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerState::Spawning => "spawning",
            WorkerState::Running => "running",
            WorkerState::StopRequested => "stop-requested",
            WorkerState::Exited => "exited",
        };
        f.write_str(name)
    }
}

/// Identity and state record for one supervised worker
///
/// The IPC channel itself is owned by the process adapter and addressed by
/// `id`; the descriptor only tracks what the supervisor needs to decide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerDescriptor {
    pub id: WorkerId,
    pub title: String,
    pub pid: Option<u32>,
    pub state: WorkerState,
    /// Stopped by the rolling restart controller rather than a signal
    pub rolling: bool,
}

impl WorkerDescriptor {
    /// Create a descriptor for a worker that is about to be launched
    pub fn new(id: WorkerId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            pid: None,
            state: WorkerState::Spawning,
            rolling: false,
        }
    }

    /// Record the OS process id once the spawn completed
    ///
    /// A worker already asked to stop keeps that state.
    pub fn mark_running(&mut self, pid: u32) {
        self.pid = Some(pid);
        if self.state == WorkerState::Spawning {
            self.state = WorkerState::Running;
        }
    }

    /// Record that `stop` was sent
    pub fn request_stop(&mut self) {
        if self.state != WorkerState::Exited {
            self.state = WorkerState::StopRequested;
        }
    }

    /// Record the exit notification
    pub fn mark_exited(&mut self) {
        self.state = WorkerState::Exited;
    }

    /// Whether messages from this worker should be logged
    pub fn accepts_messages(&self) -> bool {
        matches!(self.state, WorkerState::Running | WorkerState::StopRequested)
    }

    pub fn is_stopping(&self) -> bool {
        self.state == WorkerState::StopRequested
    }

    /// Human-readable label used in log lines: `<pid> (#<id>)`
    pub fn label(&self) -> String {
        match self.pid {
            Some(pid) => format!("{} (#{})", pid, self.id),
            None => format!("? (#{})", self.id),
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
