// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration modules

mod cluster;

pub use cluster::{default_worker_count, worker_count_for, ClusterConfig, ConfigError};
