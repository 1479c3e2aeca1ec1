// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Locating and signalling a running master through its pidfile

use crate::error::HerdError;
use herd_core::ControlSignal;
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// What the pidfile says about the master
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MasterStatus {
    Running { pid: u32 },
    NotRunning,
    /// Pidfile left behind by a master that died
    Stale { pid: u32 },
}

impl fmt::Display for MasterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MasterStatus::Running { pid } => write!(f, "running (pid {})", pid),
            MasterStatus::NotRunning => write!(f, "not running"),
            MasterStatus::Stale { pid } => {
                write!(f, "not running (stale pidfile for pid {})", pid)
            }
        }
    }
}

/// Handle on the master named by a pidfile
pub struct Master {
    pidfile: PathBuf,
}

impl Master {
    pub fn new(pidfile: PathBuf) -> Self {
        Self { pidfile }
    }

    /// Pid recorded in the pidfile, `None` when there is no pidfile
    pub fn read_pid(&self) -> Result<Option<u32>, HerdError> {
        let contents = match std::fs::read_to_string(&self.pidfile) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(
                    HerdError::new(format!("cannot read pidfile {}", self.pidfile.display()))
                        .with_context(e.to_string()),
                )
            }
        };

        // Pid 0 would address our own process group
        match contents.trim().parse::<u32>() {
            Ok(pid) if pid > 0 && i32::try_from(pid).is_ok() => Ok(Some(pid)),
            _ => Err(HerdError::corrupt_pidfile(&self.pidfile, &contents)),
        }
    }

    pub fn status(&self) -> Result<MasterStatus, HerdError> {
        Ok(match self.read_pid()? {
            None => MasterStatus::NotRunning,
            Some(pid) if is_alive(pid) => MasterStatus::Running { pid },
            Some(pid) => MasterStatus::Stale { pid },
        })
    }

    /// Deliver the OS signal bound to `control`; returns the master's pid
    pub fn send(&self, control: ControlSignal) -> Result<u32, HerdError> {
        let signal = os_signal(control)?;
        let pid = match self.status()? {
            MasterStatus::Running { pid } => pid,
            MasterStatus::NotRunning => return Err(HerdError::master_not_running(&self.pidfile)),
            MasterStatus::Stale { pid } => {
                return Err(HerdError::stale_pidfile(&self.pidfile, pid))
            }
        };

        tracing::debug!(pid, signal = signal.as_str(), "signalling master");
        kill(to_pid(pid), signal).map_err(|e| {
            HerdError::new(format!("failed to send {} to pid {}", signal.as_str(), pid))
                .with_context(e.desc())
        })?;
        Ok(pid)
    }
}

/// OS signal the master binds to `control`
pub fn os_signal(control: ControlSignal) -> Result<Signal, HerdError> {
    control
        .os_name()
        .parse::<Signal>()
        .map_err(|_| HerdError::new(format!("{:?} cannot be sent to the master", control)))
}

fn is_alive(pid: u32) -> bool {
    // Signal 0 only checks that the process exists; EPERM means it does
    match kill(to_pid(pid), None) {
        Ok(()) | Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

fn to_pid(pid: u32) -> Pid {
    // read_pid only yields pids that fit
    Pid::from_raw(i32::try_from(pid).unwrap_or(i32::MAX))
}

#[cfg(test)]
#[path = "master_tests.rs"]
mod tests;
