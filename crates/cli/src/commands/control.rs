// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operator requests delivered to the master as signals

use crate::master::Master;
use anyhow::Result;
use herd_core::ControlSignal;

pub fn handle(master: &Master, control: ControlSignal) -> Result<()> {
    let pid = master.send(control)?;
    println!("{} (sent {} to pid {})", describe(control), control.os_name(), pid);
    Ok(())
}

fn describe(control: ControlSignal) -> &'static str {
    match control {
        ControlSignal::Terminate | ControlSignal::Interrupt => "Stopping cluster",
        ControlSignal::Kill => "Forcing cluster shutdown",
        ControlSignal::ReloadRolling => "Rolling restart started",
        ControlSignal::ReloadAll => "Restarting all workers",
        ControlSignal::Quiesce => "Stopping all workers",
        ControlSignal::ScaleUp => "Adding a worker",
        ControlSignal::ScaleDown => "Removing a worker",
        ControlSignal::MasterExit => "Exiting",
    }
}
