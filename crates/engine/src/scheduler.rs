// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Named one-shot timers

use herd_core::Event;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Armed timers keyed by id
///
/// Setting a timer that is already armed replaces its deadline.
#[derive(Debug, Default)]
pub struct Scheduler {
    timers: HashMap<String, Instant>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_timer(&mut self, id: String, duration: Duration, now: Instant) {
        self.timers.insert(id, now + duration);
    }

    pub fn cancel_timer(&mut self, id: &str) {
        self.timers.remove(id);
    }

    /// Disarm and return every timer due at `now`, earliest first
    pub fn fired_timers(&mut self, now: Instant) -> Vec<Event> {
        let mut due: Vec<(Instant, String)> = self
            .timers
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(id, deadline)| (*deadline, id.clone()))
            .collect();
        due.sort();

        due.into_iter()
            .map(|(_, id)| {
                self.timers.remove(&id);
                Event::Timer { id }
            })
            .collect()
    }

    pub fn has_timers(&self) -> bool {
        !self.timers.is_empty()
    }

    pub fn is_armed(&self, id: &str) -> bool {
        self.timers.contains_key(id)
    }

    /// Earliest armed deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.values().min().copied()
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
