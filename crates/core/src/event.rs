// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events that drive the supervisor

use crate::signal::ControlSignal;
use crate::worker::WorkerId;
use serde::{Deserialize, Serialize};

/// Everything the master loop can observe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Operator control signal
    Signal { signal: ControlSignal },

    /// Worker process exists
    WorkerSpawned { id: WorkerId, pid: u32 },

    /// Free-form message from a worker
    WorkerMessage { id: WorkerId, message: String },

    /// Worker process exited (or failed to launch)
    WorkerExited {
        id: WorkerId,
        code: Option<i32>,
        signal: Option<i32>,
    },

    /// Named timer fired
    Timer { id: String },
}

impl Event {
    /// Event name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Event::Signal { .. } => "signal",
            Event::WorkerSpawned { .. } => "worker:spawned",
            Event::WorkerMessage { .. } => "worker:message",
            Event::WorkerExited { .. } => "worker:exited",
            Event::Timer { .. } => "timer",
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
