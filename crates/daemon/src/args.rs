// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command-line options for herdd

use std::path::PathBuf;

use clap::Parser;
use herd_core::ClusterConfig;

use crate::lifecycle::LifecycleError;

#[derive(Debug, Parser)]
#[command(name = "herdd", version, about = "Process-cluster master")]
pub struct Args {
    /// Working directory that relative defaults are computed from
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Worker executable
    #[arg(long, value_name = "PATH")]
    pub exec: Option<PathBuf>,

    /// Initial number of workers
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Pidfile location
    #[arg(long, value_name = "PATH", conflicts_with = "no_pidfile")]
    pub pidfile: Option<PathBuf>,

    /// Run without a pidfile
    #[arg(long)]
    pub no_pidfile: bool,

    /// Supervisor log location
    #[arg(long, value_name = "PATH")]
    pub log: Option<PathBuf>,

    /// Override any option, e.g. --set relaunch_delay=500ms
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub overrides: Vec<String>,
}

impl Args {
    /// Resolve the effective cluster configuration
    ///
    /// Defaults come first, then the dedicated flags, then `--set` overrides.
    pub fn into_config(self) -> Result<ClusterConfig, LifecycleError> {
        let dir = match self.dir {
            Some(dir) => dir,
            None => std::env::current_dir()?,
        };
        let mut config = ClusterConfig::for_dir(&dir);

        if let Some(exec) = self.exec {
            config.exec = exec;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(pidfile) = self.pidfile {
            config.pidfile = Some(pidfile);
        }
        if self.no_pidfile {
            config.pidfile = None;
        }
        if let Some(log) = self.log {
            config.log = log;
        }

        config.apply_overrides(&self.overrides)?;
        Ok(config)
    }
}

#[cfg(test)]
#[path = "args_tests.rs"]
mod tests;
