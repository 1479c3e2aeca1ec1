// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime for the herd engine

use crate::{Executor, Scheduler};
use herd_adapters::ProcessAdapter;
use herd_core::{Clock, ClusterConfig, Event, Supervisor};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Runtime adapter dependencies
pub struct RuntimeDeps<P> {
    pub processes: P,
}

/// Runtime that drives the supervisor against real (or fake) processes
pub struct Runtime<P, C: Clock> {
    executor: Executor<P, C>,
    supervisor: Mutex<Supervisor>,
    clock: C,
    workers: usize,
}

impl<P, C> Runtime<P, C>
where
    P: ProcessAdapter,
    C: Clock,
{
    pub fn new(deps: RuntimeDeps<P>, config: &ClusterConfig, clock: C) -> Self {
        let scheduler = Arc::new(Mutex::new(Scheduler::new()));
        Self {
            executor: Executor::new(
                deps.processes,
                scheduler,
                clock.clone(),
                config.pidfile.clone(),
            ),
            supervisor: Mutex::new(Supervisor::from_config(config)),
            clock,
            workers: config.workers,
        }
    }

    /// Begin converging on the configured worker count
    pub async fn start(&self) {
        let effects = self.lock_supervisor().start(self.workers);
        let events = self.executor.execute_all(effects).await;
        self.drain(events).await;
    }

    /// Handle an incoming event
    ///
    /// Returns any events that were produced by effects (to be fed back into the event loop).
    pub async fn handle_event(&self, event: Event) -> Vec<Event> {
        tracing::trace!(event = event.name(), "handling");
        let effects = self.lock_supervisor().handle(&event);
        self.executor.execute_all(effects).await
    }

    /// Handle an event and everything it feeds back, to quiescence
    pub async fn process(&self, event: Event) {
        self.drain(vec![event]).await;
    }

    /// Deliver every timer that is due now
    pub async fn fire_timers(&self) {
        let fired = {
            let scheduler = self.executor.scheduler();
            let mut scheduler = scheduler.lock().unwrap_or_else(|e| e.into_inner());
            scheduler.fired_timers(self.clock.now())
        };
        self.drain(fired).await;
    }

    /// When the next timer falls due
    pub fn next_deadline(&self) -> Option<Instant> {
        let scheduler = self.executor.scheduler();
        let scheduler = scheduler.lock().unwrap_or_else(|e| e.into_inner());
        scheduler.next_deadline()
    }

    /// Whether the supervisor has finished shutting down
    pub fn exit_requested(&self) -> bool {
        self.executor.exit_requested()
    }

    /// Read supervisor state
    pub fn with_supervisor<R>(&self, f: impl FnOnce(&Supervisor) -> R) -> R {
        f(&self.lock_supervisor())
    }

    async fn drain(&self, events: Vec<Event>) {
        let mut pending: VecDeque<Event> = events.into();
        while let Some(event) = pending.pop_front() {
            let produced = self.handle_event(event).await;
            pending.extend(produced);
        }
    }

    fn lock_supervisor(&self) -> std::sync::MutexGuard<'_, Supervisor> {
        self.supervisor.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
