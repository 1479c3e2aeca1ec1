// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for running a real herdd against shell-script workers

#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tempfile::TempDir;

/// Worker that announces itself and exits when told to stop or restart
pub const WORKER_SCRIPT: &str = r#"#!/bin/sh
echo "ready $HERD_WORKER_TITLE"
while read cmd; do
  case "$cmd" in
    stop|restart) exit 0 ;;
  esac
done
"#;

pub const WAIT: Duration = Duration::from_secs(20);

/// A herdd process that is killed if the test ends early
pub struct Master {
    pub dir: TempDir,
    child: Option<Child>,
}

impl Master {
    /// Start herdd in a fresh directory with fast timers
    pub fn start(workers: usize) -> Self {
        let dir = tempfile::tempdir().unwrap();
        write_worker(dir.path());
        let child = spawn_herdd(dir.path(), workers, Stdio::null());
        Self {
            dir,
            child: Some(child),
        }
    }

    pub fn pid(&self) -> u32 {
        self.child.as_ref().map(|c| c.id()).unwrap()
    }

    pub fn pidfile(&self) -> PathBuf {
        self.dir.path().join("pids").join("cluster_pidfile")
    }

    pub fn log(&self) -> String {
        std::fs::read_to_string(self.dir.path().join("log").join("cluster.log")).unwrap_or_default()
    }

    /// Number of `ready` announcements received so far
    pub fn ready_count(&self) -> usize {
        self.log()
            .lines()
            .filter(|l| l.contains("Message [") && l.contains("ready herd-worker"))
            .count()
    }

    pub fn signal(&self, signal: Signal) {
        kill(Pid::from_raw(self.pid() as i32), signal).unwrap();
    }

    pub fn wait_for_ready(&self, count: usize) {
        assert!(
            wait_until(WAIT, || self.ready_count() >= count),
            "expected {count} ready workers; log:\n{}",
            self.log()
        );
    }

    /// Wait for the master to exit on its own
    pub fn wait_exit(&mut self) -> ExitStatus {
        let mut child = self.child.take().unwrap();
        let deadline = Instant::now() + WAIT;
        loop {
            if let Some(status) = child.try_wait().unwrap() {
                return status;
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                panic!("herdd did not exit; log:\n{}", self.log());
            }
            std::thread::sleep(Duration::from_millis(50));
        }
    }
}

impl Drop for Master {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

pub fn write_worker(dir: &Path) {
    let bin = dir.join("bin");
    std::fs::create_dir_all(&bin).unwrap();
    let path = bin.join("worker");
    std::fs::write(&path, WORKER_SCRIPT).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

pub fn herdd(dir: &Path, workers: usize) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_herdd"));
    cmd.arg("--dir")
        .arg(dir)
        .args(["--workers", &workers.to_string()])
        .args(["--set", "reconcile_interval=100ms"])
        .args(["--set", "relaunch_delay=100ms"])
        .args(["--set", "shutdown_poll_interval=100ms"])
        .stdin(Stdio::null());
    cmd
}

pub fn spawn_herdd(dir: &Path, workers: usize, stderr: Stdio) -> Child {
    herdd(dir, workers)
        .stdout(Stdio::null())
        .stderr(stderr)
        .spawn()
        .unwrap()
}

pub fn wait_until(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    check()
}
