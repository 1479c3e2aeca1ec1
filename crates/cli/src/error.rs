// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-friendly error display with context and suggestions.

use std::fmt;
use std::path::Path;

/// Error with context and recovery suggestions for user-friendly display.
#[derive(Debug)]
pub struct HerdError {
    /// What went wrong
    pub message: String,
    /// Why it might have happened
    pub context: Vec<String>,
    /// How to fix it
    pub suggestions: Vec<String>,
}

impl HerdError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }
}

impl fmt::Display for HerdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error: {}", self.message)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            for ctx in &self.context {
                writeln!(f, "  -> {}", ctx)?;
            }
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            writeln!(f, "suggestions:")?;
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HerdError {}

/// Common error builders
impl HerdError {
    /// No pidfile: the master was never started or has shut down cleanly
    pub fn master_not_running(pidfile: &Path) -> Self {
        HerdError::new("master is not running")
            .with_context(format!("No pidfile at {}", pidfile.display()))
            .with_suggestion("Start the master: herdd --dir <app dir>")
            .with_suggestion("Point at another pidfile: herd --pidfile <path> ...")
    }

    /// Pidfile names a process that no longer exists
    pub fn stale_pidfile(pidfile: &Path, pid: u32) -> Self {
        HerdError::new(format!("master (pid {}) is not running", pid))
            .with_context(format!("{} is left over from a master that died", pidfile.display()))
            .with_suggestion(format!("Remove it: rm {}", pidfile.display()))
            .with_suggestion("Start the master again: herdd --dir <app dir>")
    }

    /// Pidfile contents are not a pid
    pub fn corrupt_pidfile(pidfile: &Path, contents: &str) -> Self {
        HerdError::new(format!("invalid pidfile {}", pidfile.display()))
            .with_context(format!("Expected a process id, found {:?}", contents.trim()))
            .with_suggestion(format!("Remove it: rm {}", pidfile.display()))
    }
}
