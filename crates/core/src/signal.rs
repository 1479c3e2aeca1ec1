// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operator control signals, decoupled from the OS signal numbers they are bound to

use serde::{Deserialize, Serialize};
use std::fmt;

/// Control request delivered to the supervisor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlSignal {
    /// Graceful shutdown (SIGTERM)
    Terminate,
    /// Graceful shutdown (SIGINT)
    Interrupt,
    /// Forced shutdown request (SIGQUIT; SIGKILL itself cannot be observed)
    Kill,
    /// Replace every worker one at a time (SIGUSR2)
    ReloadRolling,
    /// Send `restart` to every worker at once (SIGHUP)
    ReloadAll,
    /// Stop every worker and keep none running (SIGWINCH)
    Quiesce,
    /// Add a worker (SIGTTIN)
    ScaleUp,
    /// Remove a worker (SIGTTOU)
    ScaleDown,
    /// The master process itself is exiting
    MasterExit,
}

impl ControlSignal {
    /// Every signal the dispatcher understands
    pub const ALL: [ControlSignal; 9] = [
        ControlSignal::Terminate,
        ControlSignal::Interrupt,
        ControlSignal::Kill,
        ControlSignal::ReloadRolling,
        ControlSignal::ReloadAll,
        ControlSignal::Quiesce,
        ControlSignal::ScaleUp,
        ControlSignal::ScaleDown,
        ControlSignal::MasterExit,
    ];

    /// Name of the OS signal this request is bound to
    pub fn os_name(&self) -> &'static str {
        match self {
            ControlSignal::Terminate => "SIGTERM",
            ControlSignal::Interrupt => "SIGINT",
            ControlSignal::Kill => "SIGQUIT",
            ControlSignal::ReloadRolling => "SIGUSR2",
            ControlSignal::ReloadAll => "SIGHUP",
            ControlSignal::Quiesce => "SIGWINCH",
            ControlSignal::ScaleUp => "SIGTTIN",
            ControlSignal::ScaleDown => "SIGTTOU",
            ControlSignal::MasterExit => "exit",
        }
    }
}

impl fmt::Display for ControlSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.os_name())
    }
}
