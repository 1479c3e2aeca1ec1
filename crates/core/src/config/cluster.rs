// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cluster configuration
//!
//! Defaults are computed relative to the directory the master runs in. Any
//! option can be replaced by a textual `key=value` override supplied by the
//! caller; loading configuration from disk is left to the embedding program,
//! which can hand over a deserialized [`ClusterConfig`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Option keys accepted by [`ClusterConfig::apply_override`]
pub const KEYS: [&str; 11] = [
    "exec",
    "args",
    "workers",
    "pidfile",
    "log",
    "title",
    "worker_title_prefix",
    "silent",
    "reconcile_interval",
    "relaunch_delay",
    "shutdown_poll_interval",
];

/// Errors from applying configuration overrides
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown option: {0}")]
    UnknownKey(String),
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
    #[error("override must look like key=value: {0:?}")]
    MalformedOverride(String),
}

/// Everything the master needs to run a pool of workers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Worker entry point
    pub exec: PathBuf,
    /// Arguments passed to every worker
    pub args: Vec<String>,
    /// Initial desired worker count
    pub workers: usize,
    /// Where the master records its pid; `None` disables the pidfile
    pub pidfile: Option<PathBuf>,
    /// Append-only supervisor log
    pub log: PathBuf,
    /// Master process label
    pub title: String,
    /// Worker labels are this prefix followed by a number
    pub worker_title_prefix: String,
    /// Do not forward worker stderr to the master's terminal
    pub silent: bool,
    #[serde(with = "humantime_serde")]
    pub reconcile_interval: Duration,
    #[serde(with = "humantime_serde")]
    pub relaunch_delay: Duration,
    #[serde(with = "humantime_serde")]
    pub shutdown_poll_interval: Duration,
}

impl ClusterConfig {
    /// Defaults for a master running in `dir`
    pub fn for_dir(dir: &Path) -> Self {
        Self {
            exec: dir.join("bin").join("worker"),
            args: vec!["start".to_string()],
            workers: default_worker_count(),
            pidfile: Some(dir.join("pids").join("cluster_pidfile")),
            log: dir.join("log").join("cluster.log"),
            title: "herd-master".to_string(),
            worker_title_prefix: "herd-worker".to_string(),
            silent: true,
            reconcile_interval: Duration::from_secs(1),
            relaunch_delay: Duration::from_secs(1),
            shutdown_poll_interval: Duration::from_secs(1),
        }
    }

    /// Replace one option from its textual form
    pub fn apply_override(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "exec" => self.exec = PathBuf::from(value),
            "args" => {
                self.args = value
                    .split(',')
                    .filter(|arg| !arg.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            "workers" => {
                self.workers = value
                    .parse()
                    .map_err(|e: std::num::ParseIntError| invalid(key, value, e))?;
            }
            "pidfile" => {
                self.pidfile = match value {
                    "" | "none" => None,
                    path => Some(PathBuf::from(path)),
                };
            }
            "log" => self.log = PathBuf::from(value),
            "title" => self.title = value.to_string(),
            "worker_title_prefix" => self.worker_title_prefix = value.to_string(),
            "silent" => {
                self.silent = match value {
                    "true" => true,
                    "false" => false,
                    _ => return Err(invalid(key, value, "expected true or false")),
                };
            }
            "reconcile_interval" => self.reconcile_interval = parse_duration(key, value)?,
            "relaunch_delay" => self.relaunch_delay = parse_duration(key, value)?,
            "shutdown_poll_interval" => {
                self.shutdown_poll_interval = parse_duration(key, value)?
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    /// Apply `key=value` overrides in order
    pub fn apply_overrides<I, S>(&mut self, overrides: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for raw in overrides {
            let raw = raw.as_ref();
            let (key, value) = raw
                .split_once('=')
                .ok_or_else(|| ConfigError::MalformedOverride(raw.to_string()))?;
            self.apply_override(key.trim(), value.trim())?;
        }
        Ok(())
    }

    /// Every option with its display value, in [`KEYS`] order
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("exec", self.exec.display().to_string()),
            ("args", self.args.join(",")),
            ("workers", self.workers.to_string()),
            (
                "pidfile",
                self.pidfile
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "none".to_string()),
            ),
            ("log", self.log.display().to_string()),
            ("title", self.title.clone()),
            ("worker_title_prefix", self.worker_title_prefix.clone()),
            ("silent", self.silent.to_string()),
            (
                "reconcile_interval",
                humantime::format_duration(self.reconcile_interval).to_string(),
            ),
            (
                "relaunch_delay",
                humantime::format_duration(self.relaunch_delay).to_string(),
            ),
            (
                "shutdown_poll_interval",
                humantime::format_duration(self.shutdown_poll_interval).to_string(),
            ),
        ]
    }
}

/// `max(cpus - 2, 2)` for this host
pub fn default_worker_count() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    worker_count_for(cpus)
}

/// Default worker count for a host with `cpus` processors
pub fn worker_count_for(cpus: usize) -> usize {
    cpus.saturating_sub(2).max(2)
}

fn parse_duration(key: &str, value: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(value).map_err(|e| invalid(key, value, e))
}

fn invalid(key: &str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
#[path = "cluster_tests.rs"]
mod tests;
