// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! herd-core: Core library for the herd process-cluster supervisor
//!
//! This crate provides:
//! - The worker descriptor and its lifecycle states
//! - The pure `Supervisor` state machine (desired count, restart queue, active set)
//! - Events consumed and effects requested by the supervisor
//! - Cluster configuration with textual overrides

pub mod clock;
pub mod config;
pub mod effect;
pub mod event;
pub mod signal;
pub mod supervisor;
pub mod traced;
pub mod worker;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{default_worker_count, ClusterConfig, ConfigError};
pub use effect::{ControlMessage, Effect};
pub use event::Event;
pub use signal::ControlSignal;
pub use supervisor::{Supervisor, SupervisorTimings, RECONCILE_TIMER, SHUTDOWN_TIMER};
pub use traced::TracedEffect;
pub use worker::{WorkerDescriptor, WorkerId, WorkerState};
