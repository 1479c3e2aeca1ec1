// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! herd - operator CLI for the herdd cluster master

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod commands;
mod error;
mod master;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{control, status};
use herd_core::{ClusterConfig, ControlSignal};
use std::path::PathBuf;

use crate::master::Master;

#[derive(Parser)]
#[command(name = "herd", version, about = "Control a herdd process cluster")]
struct Cli {
    /// Application directory the master runs in
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Master pidfile (defaults to <dir>/pids/cluster_pidfile)
    #[arg(long, global = true)]
    pidfile: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show whether the master is running
    Status(status::StatusArgs),
    /// Stop every worker, then the master
    Stop {
        /// Request forced shutdown (SIGQUIT)
        #[arg(long)]
        force: bool,
    },
    /// Replace workers one at a time
    Reload,
    /// Tell every worker to restart now
    Restart,
    /// Add one worker
    Add,
    /// Remove one worker
    Remove,
    /// Stop all workers but keep the master running
    Quiesce,
}

fn main() -> Result<()> {
    setup_logging();

    let cli = Cli::parse();
    let master = Master::new(resolve_pidfile(cli.dir, cli.pidfile)?);

    match cli.command {
        Commands::Status(args) => status::handle(&master, args),
        Commands::Stop { force: false } => control::handle(&master, ControlSignal::Terminate),
        Commands::Stop { force: true } => control::handle(&master, ControlSignal::Kill),
        Commands::Reload => control::handle(&master, ControlSignal::ReloadRolling),
        Commands::Restart => control::handle(&master, ControlSignal::ReloadAll),
        Commands::Add => control::handle(&master, ControlSignal::ScaleUp),
        Commands::Remove => control::handle(&master, ControlSignal::ScaleDown),
        Commands::Quiesce => control::handle(&master, ControlSignal::Quiesce),
    }
}

/// Explicit pidfile, else the master's default for the directory
fn resolve_pidfile(dir: Option<PathBuf>, pidfile: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(pidfile) = pidfile {
        return Ok(pidfile);
    }
    let dir = match dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    ClusterConfig::for_dir(&dir)
        .pidfile
        .ok_or_else(|| anyhow::anyhow!("no default pidfile for {}", dir.display()))
}

fn setup_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
