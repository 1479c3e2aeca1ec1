// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Side effects requested by the supervisor state machine

use crate::worker::WorkerId;
use std::fmt;
use std::time::Duration;

/// Control vocabulary understood by workers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    Stop,
    Restart,
}

impl ControlMessage {
    /// Wire form sent over the worker channel
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlMessage::Stop => "stop",
            ControlMessage::Restart => "restart",
        }
    }
}

impl fmt::Display for ControlMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effects are executed by the engine, never by the state machine itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Start one worker process
    Launch { id: WorkerId, title: String },
    /// Deliver a control message to a worker
    Send { id: WorkerId, message: ControlMessage },
    /// Arm (or re-arm) a named one-shot timer
    SetTimer { id: String, duration: Duration },
    /// Disarm a named timer
    CancelTimer { id: String },
    /// Delete the master pidfile; failures are logged, never fatal
    RemovePidFile,
    /// Terminate the master process
    Exit,
}
