// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::worker::WorkerState;
use proptest::prelude::*;
use std::collections::BTreeSet;
use yare::parameterized;

/// Executes supervisor effects in memory: launches succeed immediately and
/// timers only fire when the test asks for a tick.
struct Harness {
    sup: Supervisor,
    timers: BTreeSet<String>,
    launched: Vec<WorkerId>,
    sent: Vec<(WorkerId, ControlMessage)>,
    pidfile_removals: usize,
    exited: bool,
}

impl Harness {
    fn new() -> Self {
        Self {
            sup: Supervisor::new("herd-worker", SupervisorTimings::default()),
            timers: BTreeSet::new(),
            launched: Vec::new(),
            sent: Vec::new(),
            pidfile_removals: 0,
            exited: false,
        }
    }

    /// Start with `n` desired workers and tick until the pool converged
    fn running(n: usize) -> Self {
        let mut h = Self::new();
        let effects = h.sup.start(n);
        h.apply(effects);
        h.settle();
        assert_eq!(h.sup.live_count(), n);
        h.launched.clear();
        h
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Launch { id, .. } => {
                    self.launched.push(id);
                    let more = self.sup.handle(&Event::WorkerSpawned {
                        id,
                        pid: 1000 + id.0 as u32,
                    });
                    self.apply(more);
                }
                Effect::Send { id, message } => self.sent.push((id, message)),
                Effect::SetTimer { id, .. } => {
                    self.timers.insert(id);
                }
                Effect::CancelTimer { id } => {
                    self.timers.remove(&id);
                }
                Effect::RemovePidFile => self.pidfile_removals += 1,
                Effect::Exit => self.exited = true,
            }
        }
    }

    fn signal(&mut self, signal: ControlSignal) {
        let effects = self.sup.handle(&Event::Signal { signal });
        self.apply(effects);
    }

    fn exit(&mut self, id: WorkerId) {
        let effects = self.sup.handle(&Event::WorkerExited {
            id,
            code: Some(0),
            signal: None,
        });
        self.apply(effects);
    }

    /// Fire every timer armed before this call
    fn tick(&mut self) {
        let due = std::mem::take(&mut self.timers);
        for id in due {
            let effects = self.sup.handle(&Event::Timer { id });
            self.apply(effects);
        }
    }

    fn settle(&mut self) {
        for _ in 0..100 {
            if self.timers.is_empty() {
                return;
            }
            self.tick();
        }
        panic!("timers never settled: {:?}", self.timers);
    }

    fn stops_sent(&self) -> Vec<WorkerId> {
        self.sent
            .iter()
            .filter(|(_, m)| *m == ControlMessage::Stop)
            .map(|(id, _)| *id)
            .collect()
    }

    fn stopping(&self) -> Vec<WorkerId> {
        self.sup
            .workers()
            .filter(|w| w.is_stopping())
            .map(|w| w.id)
            .collect()
    }
}

#[test]
fn start_launches_one_worker_per_tick() {
    let mut h = Harness::new();

    let effects = h.sup.start(3);
    assert!(matches!(effects[0], Effect::Launch { id: WorkerId(1), .. }));
    assert!(effects.contains(&Effect::SetTimer {
        id: RECONCILE_TIMER.to_string(),
        duration: Duration::from_secs(1),
    }));
    h.apply(effects);
    assert_eq!(h.sup.live_count(), 1);

    h.tick();
    assert_eq!(h.sup.live_count(), 2);
    h.tick();
    assert_eq!(h.sup.live_count(), 3);
    assert!(h.timers.contains(RECONCILE_TIMER));

    // Converged: the loop stops rescheduling itself
    h.tick();
    assert!(h.timers.is_empty());
    assert_eq!(h.launched.len(), 3);
}

#[test]
fn launched_workers_get_titles_from_live_count() {
    let mut h = Harness::new();
    let effects = h.sup.start(1);
    let Effect::Launch { title, .. } = &effects[0] else {
        panic!("expected launch, got {:?}", effects[0]);
    };
    assert_eq!(title, "herd-worker1");
    h.apply(effects);
    h.signal(ControlSignal::ScaleUp);

    let titles: Vec<_> = h.sup.workers().map(|w| w.title.clone()).collect();
    assert_eq!(titles, vec!["herd-worker1", "herd-worker2"]);
}

#[test]
fn spawn_marks_worker_running_with_pid() {
    let h = Harness::running(2);
    for worker in h.sup.workers() {
        assert_eq!(worker.state, WorkerState::Running);
        assert_eq!(worker.pid, Some(1000 + worker.id.0 as u32));
    }
}

#[test]
fn crashed_worker_is_replaced_after_one_tick() {
    let mut h = Harness::running(4);

    h.exit(WorkerId(3));
    assert_eq!(h.sup.live_count(), 3);
    // Damped: nothing launched in the same tick as the exit
    assert!(h.launched.is_empty());

    h.tick();
    assert_eq!(h.launched, vec![WorkerId(5)]);
    assert_eq!(h.sup.live_count(), 4);
    assert!(h.sup.worker(WorkerId(3)).is_none());
}

#[test]
fn launch_failure_is_handled_like_a_crash() {
    let mut h = Harness::new();
    let effects = h.sup.start(1);
    // The launch never reports a spawn; the process adapter reports an exit instead
    assert!(matches!(effects[0], Effect::Launch { .. }));
    h.exit(WorkerId(1));
    assert_eq!(h.sup.live_count(), 0);

    h.tick();
    assert_eq!(h.sup.live_count(), 1);
    assert!(h.sup.worker(WorkerId(2)).is_some());
}

#[test]
fn rolling_restart_retires_workers_in_lifo_order() {
    let mut h = Harness::running(4);

    h.signal(ControlSignal::ReloadRolling);
    assert_eq!(h.stops_sent(), vec![WorkerId(4)]);
    assert_eq!(
        h.sup.restart_queue(),
        &[WorkerId(1), WorkerId(2), WorkerId(3)]
    );

    while let Some(&retiring) = h.stopping().first() {
        assert_eq!(h.sup.rolling_in_flight(), 1);
        h.exit(retiring);
        assert!(h.sup.live_count() >= 3);
        h.tick();
        assert_eq!(h.sup.live_count(), 4);
    }

    assert_eq!(
        h.stops_sent(),
        vec![WorkerId(4), WorkerId(3), WorkerId(2), WorkerId(1)]
    );
    assert_eq!(h.launched.len(), 4);
    assert!(h.sup.restart_queue().is_empty());
    assert_eq!(h.sup.rolling_in_flight(), 0);
    let ids: Vec<_> = h.sup.workers().map(|w| w.id.0).collect();
    assert_eq!(ids, vec![5, 6, 7, 8]);
}

#[test]
fn rolling_restart_skips_workers_that_already_exited() {
    let mut h = Harness::running(3);
    h.signal(ControlSignal::ReloadRolling);
    assert_eq!(h.stops_sent(), vec![WorkerId(3)]);

    // Worker 2 crashes on its own while 3 drains
    h.exit(WorkerId(2));
    h.tick();
    // Replacement launched, and worker 2 is the next queue entry: skipped
    assert_eq!(h.launched.len(), 1);
    assert_eq!(h.stops_sent(), vec![WorkerId(3)]);

    h.exit(WorkerId(3));
    h.tick();
    assert_eq!(h.stops_sent(), vec![WorkerId(3), WorkerId(1)]);
    h.exit(WorkerId(1));
    h.settle();
    assert_eq!(h.sup.live_count(), 3);
}

#[test]
fn scale_down_stops_exactly_one_worker() {
    let mut h = Harness::running(4);

    h.signal(ControlSignal::ScaleDown);
    assert_eq!(h.sup.desired(), 3);
    assert_eq!(h.sent, vec![(WorkerId(1), ControlMessage::Stop)]);

    h.exit(WorkerId(1));
    h.settle();
    assert_eq!(h.sup.live_count(), 3);
    assert!(h.launched.is_empty());
    assert_eq!(h.sent.len(), 1);
}

#[test]
fn repeated_scale_down_picks_distinct_workers() {
    let mut h = Harness::running(3);
    h.signal(ControlSignal::ScaleDown);
    h.signal(ControlSignal::ScaleDown);
    assert_eq!(h.stops_sent(), vec![WorkerId(1), WorkerId(2)]);
    assert_eq!(h.sup.desired(), 1);
}

#[test]
fn scale_down_saturates_at_zero() {
    let mut h = Harness::running(0);
    h.signal(ControlSignal::ScaleDown);
    assert_eq!(h.sup.desired(), 0);
    assert!(h.sent.is_empty());
}

#[test]
fn scale_up_launches_immediately() {
    let mut h = Harness::running(2);
    h.signal(ControlSignal::ScaleUp);
    assert_eq!(h.sup.desired(), 3);
    assert_eq!(h.launched, vec![WorkerId(3)]);
    assert_eq!(h.sup.live_count(), 3);
}

#[test]
fn reload_all_sends_restart_to_every_worker() {
    let mut h = Harness::running(3);
    h.signal(ControlSignal::ReloadAll);

    assert_eq!(h.sup.desired(), 3);
    assert_eq!(
        h.sent,
        vec![
            (WorkerId(1), ControlMessage::Restart),
            (WorkerId(2), ControlMessage::Restart),
            (WorkerId(3), ControlMessage::Restart),
        ]
    );
    assert!(h.sup.restart_queue().is_empty());
}

#[test]
fn scale_down_after_reload_all_still_stops_a_worker() {
    let mut h = Harness::running(4);
    h.signal(ControlSignal::ReloadAll);
    assert!(h.stopping().is_empty());
    h.sent.clear();

    h.signal(ControlSignal::ScaleDown);
    assert_eq!(h.sup.desired(), 3);
    assert_eq!(h.stops_sent(), vec![WorkerId(1)]);

    h.exit(WorkerId(1));
    h.settle();
    assert_eq!(h.sup.live_count(), 3);
    assert!(h.launched.is_empty());
}

#[test]
fn repeated_rolling_restart_does_not_stop_draining_worker_twice() {
    let mut h = Harness::running(4);
    h.signal(ControlSignal::ReloadRolling);
    h.signal(ControlSignal::ReloadRolling);

    assert_eq!(h.stops_sent(), vec![WorkerId(4)]);
    assert_eq!(h.sup.rolling_in_flight(), 1);

    h.exit(WorkerId(4));
    h.tick();
    assert_eq!(h.stops_sent(), vec![WorkerId(4), WorkerId(3)]);
    assert_eq!(h.sup.rolling_in_flight(), 1);
    assert_eq!(h.sup.live_count(), 4);
}

#[test]
fn quiesce_stops_everything_and_never_relaunches() {
    let mut h = Harness::running(3);
    h.signal(ControlSignal::Quiesce);
    assert_eq!(h.sup.desired(), 0);
    assert_eq!(h.stops_sent().len(), 3);

    for id in 1..=3 {
        h.exit(WorkerId(id));
    }
    h.settle();
    assert_eq!(h.sup.live_count(), 0);
    assert!(h.launched.is_empty());
    // Quiesce is not a shutdown
    assert!(!h.exited);
}

#[test]
fn shutdown_drains_before_exiting() {
    let mut h = Harness::running(2);
    h.signal(ControlSignal::Terminate);

    assert!(h.sup.is_shutting_down());
    assert_eq!(h.sup.desired(), 0);
    assert_eq!(h.stops_sent(), vec![WorkerId(1), WorkerId(2)]);

    // Still draining
    h.tick();
    assert!(!h.exited);
    assert!(h.timers.contains(SHUTDOWN_TIMER));

    h.exit(WorkerId(1));
    h.exit(WorkerId(2));
    assert!(!h.timers.iter().any(|t| t.starts_with("relaunch:")));

    h.tick();
    assert!(h.exited);
    assert!(h.sup.exit_requested());
    assert_eq!(h.pidfile_removals, 1);
    assert!(h.launched.is_empty());
}

#[test]
fn shutdown_cancels_pending_reconcile() {
    let mut h = Harness::new();
    let effects = h.sup.start(4);
    h.apply(effects);
    assert!(h.timers.contains(RECONCILE_TIMER));

    h.signal(ControlSignal::Interrupt);
    assert!(!h.timers.contains(RECONCILE_TIMER));

    h.exit(WorkerId(1));
    h.settle();
    assert!(h.exited);
    assert_eq!(h.launched, vec![WorkerId(1)]);
}

#[test]
fn repeated_termination_is_idempotent() {
    let mut h = Harness::running(1);
    h.signal(ControlSignal::Terminate);
    h.signal(ControlSignal::Kill);
    assert_eq!(h.stops_sent(), vec![WorkerId(1)]);

    h.exit(WorkerId(1));
    h.settle();
    h.signal(ControlSignal::Terminate);
    let effects = h.sup.handle(&Event::Timer {
        id: SHUTDOWN_TIMER.to_string(),
    });
    assert!(effects.is_empty());
    assert_eq!(h.pidfile_removals, 1);
}

#[test]
fn scale_up_is_ignored_during_shutdown() {
    let mut h = Harness::running(1);
    h.signal(ControlSignal::Terminate);
    h.signal(ControlSignal::ScaleUp);
    assert_eq!(h.sup.desired(), 0);
    assert!(h.launched.is_empty());
}

#[test]
fn master_exit_resets_desired_count() {
    let mut h = Harness::running(2);
    h.signal(ControlSignal::MasterExit);
    assert_eq!(h.sup.desired(), 0);
    assert!(h.sent.is_empty());
}

#[test]
fn messages_do_not_change_state() {
    let mut h = Harness::new();
    let effects = h.sup.start(1);
    // Worker 1 is still spawning: its chatter is dropped
    let more = h.sup.handle(&Event::WorkerMessage {
        id: WorkerId(1),
        message: "booting".to_string(),
    });
    assert!(more.is_empty());
    assert_eq!(
        h.sup.worker(WorkerId(1)).map(|w| w.state),
        Some(WorkerState::Spawning)
    );

    h.apply(effects);
    let more = h.sup.handle(&Event::WorkerMessage {
        id: WorkerId(1),
        message: "ready".to_string(),
    });
    assert!(more.is_empty());
    assert_eq!(
        h.sup.worker(WorkerId(1)).map(|w| w.state),
        Some(WorkerState::Running)
    );
}

#[test]
fn unknown_timer_is_ignored() {
    let mut sup = Supervisor::new("w", SupervisorTimings::default());
    assert!(sup
        .handle(&Event::Timer {
            id: "nope".to_string()
        })
        .is_empty());
}

#[parameterized(
    terminate = { ControlSignal::Terminate, 0, 4, true },
    interrupt = { ControlSignal::Interrupt, 0, 4, true },
    kill = { ControlSignal::Kill, 0, 4, true },
    reload_rolling = { ControlSignal::ReloadRolling, 4, 1, false },
    reload_all = { ControlSignal::ReloadAll, 4, 4, false },
    quiesce = { ControlSignal::Quiesce, 0, 4, false },
    scale_up = { ControlSignal::ScaleUp, 5, 0, false },
    scale_down = { ControlSignal::ScaleDown, 3, 1, false },
    master_exit = { ControlSignal::MasterExit, 0, 0, false },
)]
fn signal_table(
    signal: ControlSignal,
    desired_after: usize,
    messages_sent: usize,
    shutting_down: bool,
) {
    let mut h = Harness::running(4);
    h.signal(signal);
    assert_eq!(h.sup.desired(), desired_after);
    assert_eq!(h.sent.len(), messages_sent);
    assert_eq!(h.sup.is_shutting_down(), shutting_down);
}

#[derive(Debug, Clone, Copy)]
enum Scale {
    Up,
    Down,
}

fn arb_scale() -> impl Strategy<Value = Scale> {
    prop_oneof![Just(Scale::Up), Just(Scale::Down)]
}

proptest! {
    #[test]
    fn scaling_converges_to_desired_count(
        initial in 0usize..5,
        ops in proptest::collection::vec(arb_scale(), 0..20),
    ) {
        let mut h = Harness::running(initial);

        for op in ops {
            match op {
                Scale::Up => h.signal(ControlSignal::ScaleUp),
                Scale::Down => h.signal(ControlSignal::ScaleDown),
            }
        }

        // Let every stopped worker exit and every timer run out
        for _ in 0..100 {
            for id in h.stopping() {
                h.exit(id);
            }
            if h.timers.is_empty() && h.stopping().is_empty() {
                break;
            }
            h.tick();
        }

        prop_assert_eq!(h.sup.live_count(), h.sup.desired());
    }

    #[test]
    fn exits_after_quiesce_never_relaunch(n in 1usize..6) {
        let mut h = Harness::running(n);
        h.signal(ControlSignal::Quiesce);
        for id in h.stopping() {
            h.exit(id);
            h.tick();
        }
        h.settle();
        prop_assert!(h.launched.is_empty());
        prop_assert_eq!(h.sup.live_count(), 0);
    }
}
