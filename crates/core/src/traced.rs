// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing infrastructure for effects

use crate::effect::Effect;

/// Trait for operations that should be traced
///
/// Provides consistent naming and structured fields for logging.
pub trait TracedEffect {
    /// Effect name for log spans (e.g., "launch", "send")
    fn name(&self) -> &'static str;

    /// Key-value pairs for structured logging
    fn fields(&self) -> Vec<(&'static str, String)>;
}

impl TracedEffect for Effect {
    fn name(&self) -> &'static str {
        match self {
            Effect::Launch { .. } => "launch",
            Effect::Send { .. } => "send",
            Effect::SetTimer { .. } => "set_timer",
            Effect::CancelTimer { .. } => "cancel_timer",
            Effect::RemovePidFile => "remove_pidfile",
            Effect::Exit => "exit",
        }
    }

    fn fields(&self) -> Vec<(&'static str, String)> {
        match self {
            Effect::Launch { id, title } => {
                vec![("worker_id", id.to_string()), ("title", title.clone())]
            }
            Effect::Send { id, message } => {
                vec![("worker_id", id.to_string()), ("message", message.to_string())]
            }
            Effect::SetTimer { id, duration } => vec![
                ("timer_id", id.clone()),
                ("duration_ms", duration.as_millis().to_string()),
            ],
            Effect::CancelTimer { id } => vec![("timer_id", id.clone())],
            Effect::RemovePidFile | Effect::Exit => Vec::new(),
        }
    }
}
