// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor state machine
//!
//! Owns the active worker set, the desired worker count and the rolling
//! restart queue. Every input arrives as an [`Event`]; every side effect
//! leaves as an [`Effect`] for the engine to execute. Waiting is never done
//! here: convergence, crash-loop damping and shutdown draining are expressed
//! as named one-shot timers that come back as [`Event::Timer`].

use crate::config::ClusterConfig;
use crate::effect::{ControlMessage, Effect};
use crate::event::Event;
use crate::signal::ControlSignal;
use crate::worker::{WorkerDescriptor, WorkerId};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Pool reconciler tick
pub const RECONCILE_TIMER: &str = "reconcile";
/// Shutdown drain poll
pub const SHUTDOWN_TIMER: &str = "shutdown";
/// Prefix of the per-exit damped relaunch timers
const RELAUNCH_TIMER_PREFIX: &str = "relaunch:";

/// Fixed delays used by the supervisor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorTimings {
    pub reconcile_interval: Duration,
    pub relaunch_delay: Duration,
    pub shutdown_poll_interval: Duration,
}

impl Default for SupervisorTimings {
    fn default() -> Self {
        Self {
            reconcile_interval: Duration::from_secs(1),
            relaunch_delay: Duration::from_secs(1),
            shutdown_poll_interval: Duration::from_secs(1),
        }
    }
}

/// Process-cluster supervisor
#[derive(Debug, Clone)]
pub struct Supervisor {
    worker_title_prefix: String,
    timings: SupervisorTimings,
    workers: BTreeMap<WorkerId, WorkerDescriptor>,
    desired: usize,
    restart_queue: Vec<WorkerId>,
    next_id: u64,
    shutting_down: bool,
    exit_requested: bool,
}

impl Supervisor {
    pub fn new(worker_title_prefix: impl Into<String>, timings: SupervisorTimings) -> Self {
        Self {
            worker_title_prefix: worker_title_prefix.into(),
            timings,
            workers: BTreeMap::new(),
            desired: 0,
            restart_queue: Vec::new(),
            next_id: 1,
            shutting_down: false,
            exit_requested: false,
        }
    }

    pub fn from_config(config: &ClusterConfig) -> Self {
        Self::new(
            config.worker_title_prefix.clone(),
            SupervisorTimings {
                reconcile_interval: config.reconcile_interval,
                relaunch_delay: config.relaunch_delay,
                shutdown_poll_interval: config.shutdown_poll_interval,
            },
        )
    }

    /// Set the initial desired count and run the first reconciliation tick
    pub fn start(&mut self, workers: usize) -> Vec<Effect> {
        info!(workers, "starting cluster");
        self.desired = workers;
        self.reconcile()
    }

    /// Feed one event through the state machine
    pub fn handle(&mut self, event: &Event) -> Vec<Effect> {
        match event {
            Event::Signal { signal } => self.dispatch(*signal),
            Event::WorkerSpawned { id, pid } => {
                self.on_spawned(*id, *pid);
                Vec::new()
            }
            Event::WorkerMessage { id, message } => {
                self.on_message(*id, message);
                Vec::new()
            }
            Event::WorkerExited { id, code, signal } => self.on_exit(*id, *code, *signal),
            Event::Timer { id } => self.on_timer(id),
        }
    }

    /// Apply an operator signal to the desired state
    pub fn dispatch(&mut self, signal: ControlSignal) -> Vec<Effect> {
        info!("Signal: {}", signal);
        match signal {
            ControlSignal::Terminate | ControlSignal::Interrupt | ControlSignal::Kill => {
                self.desired = 0;
                self.shutdown()
            }
            ControlSignal::ReloadRolling => {
                info!("swap out new workers one-by-one");
                self.restart_queue = self.workers.keys().copied().collect();
                self.reload_one()
            }
            ControlSignal::ReloadAll => {
                info!("reload all workers now");
                self.broadcast(ControlMessage::Restart)
            }
            ControlSignal::Quiesce => {
                info!("stop all workers");
                self.desired = 0;
                self.broadcast(ControlMessage::Stop)
            }
            ControlSignal::ScaleUp => {
                if self.shutting_down {
                    warn!("ignoring scale-up during shutdown");
                    return Vec::new();
                }
                info!("add a worker");
                self.desired += 1;
                vec![self.launch()]
            }
            ControlSignal::ScaleDown => {
                info!("remove a worker");
                self.desired = self.desired.saturating_sub(1);
                self.stop_one()
            }
            ControlSignal::MasterExit => {
                self.desired = 0;
                info!("Bye!");
                Vec::new()
            }
        }
    }

    /// Target pool size
    pub fn desired(&self) -> usize {
        self.desired
    }

    /// Workers launched and not yet exited
    pub fn live_count(&self) -> usize {
        self.workers.len()
    }

    /// Active set in enumeration (id) order
    pub fn workers(&self) -> impl Iterator<Item = &WorkerDescriptor> {
        self.workers.values()
    }

    pub fn worker(&self, id: WorkerId) -> Option<&WorkerDescriptor> {
        self.workers.get(&id)
    }

    /// Workers still waiting for rolling replacement; the last one is retired next
    pub fn restart_queue(&self) -> &[WorkerId] {
        &self.restart_queue
    }

    /// Workers that were sent `stop` by the rolling restart controller and are still alive
    pub fn rolling_in_flight(&self) -> usize {
        self.workers
            .values()
            .filter(|w| w.rolling && w.is_stopping())
            .count()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down
    }

    /// Whether shutdown finished and the master was told to exit
    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    fn launch(&mut self) -> Effect {
        let id = WorkerId(self.next_id);
        self.next_id += 1;

        // Label follows the live count, so titles may repeat across restarts
        let title = format!("{}{}", self.worker_title_prefix, self.workers.len() + 1);
        info!(worker_id = %id, title = %title, "starting worker #{}", id);

        self.workers
            .insert(id, WorkerDescriptor::new(id, title.clone()));
        Effect::Launch { id, title }
    }

    fn on_spawned(&mut self, id: WorkerId, pid: u32) {
        match self.workers.get_mut(&id) {
            Some(worker) => {
                worker.mark_running(pid);
                info!(worker_id = %id, pid, "worker {} has spawned", worker.label());
            }
            None => debug!(worker_id = %id, pid, "spawn reported for unknown worker"),
        }
    }

    fn on_message(&self, id: WorkerId, message: &str) {
        match self.workers.get(&id) {
            Some(worker) if worker.accepts_messages() => {
                let pid = worker.pid.unwrap_or_default();
                info!(worker_id = %id, "Message [{}]: {}", pid, message);
            }
            _ => debug!(worker_id = %id, message, "dropping message from starting worker"),
        }
    }

    fn on_exit(&mut self, id: WorkerId, code: Option<i32>, signal: Option<i32>) -> Vec<Effect> {
        let Some(mut worker) = self.workers.remove(&id) else {
            debug!(worker_id = %id, "exit reported for unknown worker");
            return Vec::new();
        };
        worker.mark_exited();
        info!(
            worker_id = %id,
            code = ?code,
            signal = ?signal,
            "worker {} has exited",
            worker.label()
        );

        if self.shutting_down {
            return Vec::new();
        }

        // Damped: never relaunch in the same tick as the exit
        vec![Effect::SetTimer {
            id: format!("{}{}", RELAUNCH_TIMER_PREFIX, id),
            duration: self.timings.relaunch_delay,
        }]
    }

    fn on_timer(&mut self, id: &str) -> Vec<Effect> {
        if id == RECONCILE_TIMER {
            self.reconcile()
        } else if id == SHUTDOWN_TIMER {
            self.poll_drained()
        } else if id.starts_with(RELAUNCH_TIMER_PREFIX) {
            self.reload_one()
        } else {
            debug!(timer_id = id, "ignoring unknown timer");
            Vec::new()
        }
    }

    /// One pool reconciler tick: launch at most one worker, reschedule until converged
    fn reconcile(&mut self) -> Vec<Effect> {
        if self.shutting_down || self.workers.len() >= self.desired {
            return Vec::new();
        }
        vec![
            self.launch(),
            Effect::SetTimer {
                id: RECONCILE_TIMER.to_string(),
                duration: self.timings.reconcile_interval,
            },
        ]
    }

    /// Relaunch if below target, then retire the next queued worker
    fn reload_one(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();

        if !self.shutting_down && self.desired > self.workers.len() {
            effects.push(self.launch());
        }

        if let Some(id) = self.restart_queue.pop() {
            match self.workers.get_mut(&id) {
                Some(worker) if worker.is_stopping() => {
                    debug!(worker_id = %id, "queued worker already stopping");
                }
                Some(worker) => {
                    worker.request_stop();
                    worker.rolling = true;
                    info!(
                        worker_id = %id,
                        remaining = self.restart_queue.len(),
                        "retiring worker {}",
                        worker.label()
                    );
                    effects.push(Effect::Send {
                        id,
                        message: ControlMessage::Stop,
                    });
                }
                None => debug!(worker_id = %id, "queued worker already exited"),
            }
        }

        effects
    }

    fn broadcast(&mut self, message: ControlMessage) -> Vec<Effect> {
        self.workers
            .values_mut()
            .map(|worker| {
                // A restarted worker stays in the pool
                if message == ControlMessage::Stop {
                    worker.request_stop();
                }
                Effect::Send {
                    id: worker.id,
                    message,
                }
            })
            .collect()
    }

    fn stop_one(&mut self) -> Vec<Effect> {
        let Some(worker) = self.workers.values_mut().find(|w| !w.is_stopping()) else {
            warn!("no running worker to remove");
            return Vec::new();
        };
        worker.request_stop();
        vec![Effect::Send {
            id: worker.id,
            message: ControlMessage::Stop,
        }]
    }

    fn shutdown(&mut self) -> Vec<Effect> {
        if self.shutting_down {
            info!("shutdown already in progress");
            return Vec::new();
        }
        self.shutting_down = true;
        self.restart_queue.clear();

        info!("Cluster manager quitting");
        info!("Stopping each worker...");

        let mut effects = vec![Effect::CancelTimer {
            id: RECONCILE_TIMER.to_string(),
        }];
        effects.extend(self.broadcast(ControlMessage::Stop));
        effects.push(Effect::SetTimer {
            id: SHUTDOWN_TIMER.to_string(),
            duration: self.timings.shutdown_poll_interval,
        });
        effects
    }

    fn poll_drained(&mut self) -> Vec<Effect> {
        if self.exit_requested {
            return Vec::new();
        }
        if !self.workers.is_empty() {
            info!("there are still {} workers...", self.workers.len());
            return vec![Effect::SetTimer {
                id: SHUTDOWN_TIMER.to_string(),
                duration: self.timings.shutdown_poll_interval,
            }];
        }

        info!("all workers gone");
        self.exit_requested = true;
        vec![Effect::RemovePidFile, Effect::Exit]
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
