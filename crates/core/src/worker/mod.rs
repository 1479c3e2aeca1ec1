// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker descriptor and lifecycle states

mod state;

pub use state::{WorkerDescriptor, WorkerId, WorkerState};
