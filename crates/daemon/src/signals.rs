// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Binding of OS signals to operator requests

use herd_core::ControlSignal;
use nix::sys::signal::Signal;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;

/// OS signal bound to an operator request
///
/// SIGKILL cannot be caught, so forced shutdown listens on SIGQUIT.
/// Process exit is internal and has no OS signal.
pub fn os_signal(control: ControlSignal) -> Option<Signal> {
    match control {
        ControlSignal::Terminate => Some(Signal::SIGTERM),
        ControlSignal::Interrupt => Some(Signal::SIGINT),
        ControlSignal::Kill => Some(Signal::SIGQUIT),
        ControlSignal::ReloadRolling => Some(Signal::SIGUSR2),
        ControlSignal::ReloadAll => Some(Signal::SIGHUP),
        ControlSignal::Quiesce => Some(Signal::SIGWINCH),
        ControlSignal::ScaleUp => Some(Signal::SIGTTIN),
        ControlSignal::ScaleDown => Some(Signal::SIGTTOU),
        ControlSignal::MasterExit => None,
    }
}

/// Install handlers for every bound signal, forwarding them on `tx`
///
/// Must be called from within a tokio runtime.
pub fn bind_all(tx: mpsc::Sender<ControlSignal>) -> std::io::Result<()> {
    for control in ControlSignal::ALL {
        let Some(os) = os_signal(control) else {
            continue;
        };
        let mut stream = signal(SignalKind::from_raw(os as i32))?;
        let tx = tx.clone();
        tokio::spawn(async move {
            while stream.recv().await.is_some() {
                if tx.send(control).await.is_err() {
                    break;
                }
            }
        });
    }
    Ok(())
}
