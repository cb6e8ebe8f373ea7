//! Integration tests for hl-sim.
//!
//! Time is driven by a `ManualSource` clock and moved with `jump`, so every
//! test is deterministic and sleeps nowhere.

use std::sync::Arc;
use std::time::Duration;

use hl_core::{ConnectionId, Manifest, ManualSource, Minute, ProductId, TransportId, VirtualClock, WarehouseId};
use hl_routing::{DijkstraPathFinder, NextHop};
use hl_store::{AdminStore, MemoryStore};

use crate::{Dispatched, Outcome, Scheduler, SchedulerBuilder, SchedulerObserver, SimError, TickReport, TransportAdvancer};

// ── Helpers ───────────────────────────────────────────────────────────────────

type TestClock = Arc<VirtualClock<Arc<ManualSource>>>;

fn clock_at_zero() -> TestClock {
    Arc::new(VirtualClock::with_source(Arc::new(ManualSource::new()), 0.0))
}

fn minutes(n: u64) -> Duration {
    Duration::from_secs(n * 60)
}

fn advancer() -> TransportAdvancer<DijkstraPathFinder> {
    TransportAdvancer::new(DijkstraPathFinder)
}

/// A→B:5, B→C:5, A→C:20, all one-way.
struct Triangle {
    a:    WarehouseId,
    b:    WarehouseId,
    c:    WarehouseId,
    ab:   ConnectionId,
    bc:   ConnectionId,
    bolt: ProductId,
}

fn triangle<S: AdminStore>(store: &mut S) -> Triangle {
    let a = store.add_warehouse("A").unwrap();
    let b = store.add_warehouse("B").unwrap();
    let c = store.add_warehouse("C").unwrap();
    let ab = store.add_connection(a, b, 5, false).unwrap()[0];
    let bc = store.add_connection(b, c, 5, false).unwrap()[0];
    store.add_connection(a, c, 20, false).unwrap();
    let bolt = store.add_product("bolt").unwrap();
    Triangle { a, b, c, ab, bc, bolt }
}

fn cargo(w: &Triangle, n: u64) -> Manifest {
    Manifest::new().with(w.bolt, n)
}

fn scheduler<S: AdminStore>(store: S, clock: &TestClock) -> Scheduler<S, DijkstraPathFinder, Arc<ManualSource>> {
    SchedulerBuilder::new(store, Arc::clone(clock)).build().unwrap()
}

/// Jump the clock by `n` minutes and drain.
fn step<S: AdminStore, O: SchedulerObserver>(
    s: &mut Scheduler<S, DijkstraPathFinder, Arc<ManualSource>>,
    n: u64,
    observer: &mut O,
) -> Vec<TickReport> {
    s.clock().jump(minutes(n));
    s.drain_due(observer)
}

fn totals(reports: &[TickReport]) -> (usize, usize, usize, usize) {
    reports.iter().fold((0, 0, 0, 0), |acc, r| {
        (acc.0 + r.delivered, acc.1 + r.continued, acc.2 + r.stranded, acc.3 + r.failed)
    })
}

#[derive(Default)]
struct Recorder {
    starts: Vec<Minute>,
    ends:   Vec<TickReport>,
    events: Vec<(Minute, TransportId, &'static str)>,
}

impl SchedulerObserver for Recorder {
    fn on_tick_start(&mut self, minute: Minute) {
        self.starts.push(minute);
    }

    fn on_leg_started(&mut self, m: Minute, t: TransportId, _from: WarehouseId, _hop: &NextHop) {
        self.events.push((m, t, "leg"));
    }

    fn on_delivered(&mut self, m: Minute, t: TransportId, _at: WarehouseId) {
        self.events.push((m, t, "delivered"));
    }

    fn on_stranded(&mut self, m: Minute, t: TransportId, _at: WarehouseId) {
        self.events.push((m, t, "stranded"));
    }

    fn on_failed(&mut self, m: Minute, t: TransportId, _e: &SimError) {
        self.events.push((m, t, "failed"));
    }

    fn on_tick_end(&mut self, report: &TickReport) {
        self.ends.push(*report);
    }
}

// ── Minute loop ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod loop_tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::{NoopObserver, SchedulerConfig};

    #[test]
    fn starts_after_current_minute() {
        let clock = clock_at_zero();
        clock.jump(Duration::from_secs(150));
        let s = scheduler(MemoryStore::new(), &clock);
        assert_eq!(s.next_minute(), Minute(3));
    }

    #[test]
    fn jump_processes_each_minute_once_in_order() {
        let clock = clock_at_zero();
        let mut s = scheduler(MemoryStore::new(), &clock);
        let mut rec = Recorder::default();

        let reports = step(&mut s, 7, &mut rec);
        let seen: Vec<Minute> = reports.iter().map(|r| r.minute).collect();
        assert_eq!(seen, (1..=7).map(Minute).collect::<Vec<_>>());
        assert_eq!(rec.starts, seen);
        assert_eq!(rec.ends.len(), 7);
        assert_eq!(s.next_minute(), Minute(8));

        // Nothing new is due until the clock moves again.
        assert!(s.drain_due(&mut rec).is_empty());
    }

    /// Raises the stop flag once `after` ticks have ended.
    struct StopAfter<'a> {
        stop:  &'a AtomicBool,
        after: usize,
        ended: usize,
    }

    impl SchedulerObserver for StopAfter<'_> {
        fn on_tick_end(&mut self, _report: &TickReport) {
            self.ended += 1;
            if self.ended == self.after {
                self.stop.store(true, Ordering::Relaxed);
            }
        }
    }

    #[test]
    fn stop_interrupts_a_long_backlog() {
        let clock = clock_at_zero();
        let mut s = scheduler(MemoryStore::new(), &clock);
        clock.jump(minutes(7 * 24 * 60));

        let stop = AtomicBool::new(false);
        let mut obs = StopAfter { stop: &stop, after: 3, ended: 0 };
        s.run_until(&stop, &mut obs);
        assert_eq!(obs.ended, 3);
        assert_eq!(s.next_minute(), Minute(4));
    }

    #[test]
    fn partial_minute_is_not_processed() {
        let clock = clock_at_zero();
        let mut s = scheduler(MemoryStore::new(), &clock);
        clock.jump(Duration::from_secs(119));
        assert_eq!(s.drain_due(&mut NoopObserver).len(), 1);
        clock.jump(Duration::from_secs(1));
        assert_eq!(s.drain_due(&mut NoopObserver)[0].minute, Minute(2));
    }

    #[test]
    fn list_failure_does_not_advance_minute() {
        let clock = clock_at_zero();
        let mut s = scheduler(MemoryStore::new(), &clock);
        clock.jump(minutes(3));
        s.store_mut().fail_next(hl_store::FaultPoint::ListTransports);

        assert!(s.drain_due(&mut NoopObserver).is_empty());
        assert_eq!(s.next_minute(), Minute(1));

        let reports = s.drain_due(&mut NoopObserver);
        assert_eq!(reports.len(), 3);
        assert_eq!(reports[0].minute, Minute(1));
    }

    #[test]
    fn builder_rejects_zero_sleep_cap() {
        let result = SchedulerBuilder::new(MemoryStore::new(), clock_at_zero())
            .config(SchedulerConfig { max_sleep: Duration::ZERO, ..Default::default() })
            .build();
        assert!(matches!(result, Err(SimError::Config(_))));
    }

    #[test]
    fn explicit_start_minute_replays_from_there() {
        let clock = clock_at_zero();
        clock.jump(minutes(10));
        let mut s = SchedulerBuilder::new(MemoryStore::new(), Arc::clone(&clock))
            .start_minute(Minute(8))
            .build()
            .unwrap();
        assert_eq!(s.drain_due(&mut NoopObserver).len(), 3);
    }
}

// ── Sleep computation ─────────────────────────────────────────────────────────

#[cfg(test)]
mod sleep_tests {
    use super::*;
    use crate::sleep_duration;

    const CAP: Duration = Duration::from_secs(5);

    #[test]
    fn divides_gap_by_scale() {
        // 30 virtual seconds to go at 10× → 3 real seconds.
        assert_eq!(sleep_duration(30.0, Minute(1), 10.0, CAP), Duration::from_secs(3));
    }

    #[test]
    fn capped_at_max_sleep() {
        assert_eq!(sleep_duration(30.0, Minute(1), 1.0, CAP), CAP);
        assert_eq!(sleep_duration(0.0, Minute(1000), 0.001, CAP), CAP);
    }

    #[test]
    fn paused_or_reversed_sleeps_cap() {
        assert_eq!(sleep_duration(30.0, Minute(1), 0.0, CAP), CAP);
        assert_eq!(sleep_duration(30.0, Minute(1), -2.0, CAP), CAP);
        assert_eq!(sleep_duration(30.0, Minute(1), f64::NAN, CAP), CAP);
    }

    #[test]
    fn boundary_already_passed_is_zero() {
        assert_eq!(sleep_duration(61.0, Minute(1), 1.0, CAP), Duration::ZERO);
        assert_eq!(sleep_duration(60.0, Minute(1), 1.0, CAP), Duration::ZERO);
    }

    #[test]
    fn scheduler_reads_live_scale() {
        let clock = clock_at_zero();
        let s = scheduler(MemoryStore::new(), &clock);
        clock.jump(Duration::from_secs(54));
        clock.set_scale(2.0);
        assert_eq!(s.pending_sleep(), Duration::from_secs(3));
        clock.set_scale(0.0);
        assert_eq!(s.pending_sleep(), s.config().max_sleep);
    }
}

// ── Transport movement ────────────────────────────────────────────────────────

#[cfg(test)]
mod movement_tests {
    use super::*;
    use crate::{NoopObserver, Pending};
    use hl_store::LogisticsStore;

    #[test]
    fn dispatch_takes_cheaper_two_hop_route() {
        let mut store = MemoryStore::new();
        let w = triangle(&mut store);
        let d = advancer().dispatch(&mut store, w.a, w.c, &cargo(&w, 12), Minute(0)).unwrap();
        assert!(matches!(d.outcome, Outcome::Continued { hop, .. } if hop.connection == w.ab));

        let active = store.list_active_transports().unwrap();
        assert_eq!(active[0].current_target, w.b);
        assert_eq!(active[0].leg_minutes, 5);
    }

    #[test]
    fn intermediate_arrival_opens_exactly_one_leg_from_there() {
        let mut store = MemoryStore::new();
        let w = triangle(&mut store);
        let Dispatched { transport, .. } =
            advancer().dispatch(&mut store, w.a, w.c, &cargo(&w, 12), Minute(0)).unwrap();
        let clock = clock_at_zero();
        let mut s = scheduler(store, &clock);

        let reports = step(&mut s, 5, &mut NoopObserver);
        assert_eq!(totals(&reports), (0, 1, 0, 0));
        assert_eq!(reports[4].continued, 1);

        let legs = s.store_mut().legs(transport).unwrap();
        assert_eq!(legs.len(), 2);
        assert_eq!(legs[0].arrival, Some(Minute(5)));
        assert_eq!(legs[1].connection, Some(w.bc));
        assert_eq!(legs[1].from, w.b);
        assert_eq!(legs[1].start, Minute(5));
        assert_eq!(legs[1].arrival, None);
    }

    #[test]
    fn final_arrival_unloads_and_finishes() {
        let mut store = MemoryStore::new();
        let w = triangle(&mut store);
        store.upsert_stock(w.c, &cargo(&w, 3)).unwrap();
        let d = advancer().dispatch(&mut store, w.a, w.c, &cargo(&w, 12), Minute(0)).unwrap();
        let clock = clock_at_zero();
        let mut s = scheduler(store, &clock);

        let reports = step(&mut s, 10, &mut NoopObserver);
        assert_eq!(totals(&reports), (1, 1, 0, 0));
        assert_eq!(reports[9].delivered, 1);

        let store = s.store_mut();
        assert_eq!(store.stock(w.c).unwrap().get(w.bolt), 15);
        assert_eq!(store.list_finished_transports().unwrap(), [(d.transport, Minute(10))]);
        assert!(store.list_active_transports().unwrap().is_empty());
        assert_eq!(store.legs(d.transport).unwrap().len(), 2);
    }

    #[test]
    fn dispatch_to_own_warehouse_delivers_at_once() {
        let mut store = MemoryStore::new();
        let w = triangle(&mut store);
        let d = advancer().dispatch(&mut store, w.b, w.b, &cargo(&w, 4), Minute(9)).unwrap();
        assert_eq!(d.outcome, Outcome::Delivered { at: w.b });
        assert_eq!(store.stock(w.b).unwrap().get(w.bolt), 4);
        assert!(store.legs(d.transport).unwrap().is_empty());
    }

    #[test]
    fn replayed_arrival_has_no_effect() {
        let mut store = MemoryStore::new();
        let w = triangle(&mut store);
        let d = advancer().dispatch(&mut store, w.a, w.c, &cargo(&w, 1), Minute(0)).unwrap();
        let due = store.list_due_transports(Minute(5)).unwrap()[0];
        let pending = Pending::Due(due);

        let first = advancer().advance(&mut store, &pending, Minute(5)).unwrap();
        assert!(matches!(first, Outcome::Continued { .. }));
        let again = advancer().advance(&mut store, &pending, Minute(5)).unwrap();
        assert_eq!(again, Outcome::Unchanged);
        assert_eq!(store.legs(d.transport).unwrap().len(), 2);
    }

    #[test]
    fn replayed_tick_has_no_effect() {
        let mut store = MemoryStore::new();
        let w = triangle(&mut store);
        let d = advancer().dispatch(&mut store, w.a, w.b, &cargo(&w, 2), Minute(0)).unwrap();
        let clock = clock_at_zero();
        let mut s = scheduler(store, &clock);
        step(&mut s, 5, &mut NoopObserver);

        let replay = s.process_tick(Minute(5), &mut NoopObserver).unwrap();
        assert!(replay.is_empty());
        let store = s.store_mut();
        assert_eq!(store.stock(w.b).unwrap().get(w.bolt), 2);
        assert_eq!(store.legs(d.transport).unwrap().len(), 1);
    }

    #[test]
    fn reroute_takes_effect_at_next_arrival() {
        let mut store = MemoryStore::new();
        let w = triangle(&mut store);
        store.add_connection(w.b, w.a, 5, false).unwrap();
        let d = advancer().dispatch(&mut store, w.a, w.c, &cargo(&w, 8), Minute(0)).unwrap();
        let clock = clock_at_zero();
        let mut s = scheduler(store, &clock);

        step(&mut s, 2, &mut NoopObserver);
        s.store_mut().reroute_transport(d.transport, w.a).unwrap();
        step(&mut s, 8, &mut NoopObserver);

        let store = s.store_mut();
        assert_eq!(store.stock(w.a).unwrap().get(w.bolt), 8);
        assert!(store.stock(w.c).unwrap().is_empty());
        let legs = store.legs(d.transport).unwrap();
        assert_eq!(legs[1].from, w.b);
        assert_eq!(legs[1].to, w.a);
    }

    #[test]
    fn same_minute_is_applied_in_transport_order() {
        let mut store = MemoryStore::new();
        let w = triangle(&mut store);
        let ids: Vec<TransportId> = (0..3)
            .map(|i| advancer().dispatch(&mut store, w.a, w.b, &cargo(&w, i + 1), Minute(0)).unwrap().transport)
            .collect();
        let clock = clock_at_zero();
        let mut s = scheduler(store, &clock);
        let mut rec = Recorder::default();

        step(&mut s, 5, &mut rec);
        let delivered: Vec<TransportId> = rec
            .events
            .iter()
            .filter(|e| e.2 == "delivered")
            .map(|e| e.1)
            .collect();
        assert_eq!(delivered, ids);
        assert!(rec.events.iter().all(|e| e.0 == Minute(5)));
        assert_eq!(s.store_mut().stock(w.b).unwrap().get(w.bolt), 6);
    }
}

// ── Stranded transports ───────────────────────────────────────────────────────

#[cfg(test)]
mod stranded_tests {
    use super::*;
    use crate::{NoopObserver, SchedulerConfig};
    use hl_store::{FaultPoint, LogisticsStore};

    #[test]
    fn dispatch_without_path_leaves_transport_stranded() {
        let mut store = MemoryStore::new();
        let w = triangle(&mut store);
        let d = advancer().dispatch(&mut store, w.c, w.a, &cargo(&w, 1), Minute(0)).unwrap();
        assert_eq!(d.outcome, Outcome::Stranded { at: w.c });
        let stranded = store.list_stranded_transports().unwrap();
        assert_eq!(stranded[0].transport, d.transport);
    }

    #[test]
    fn arrival_with_no_onward_path_strands_then_resumes() {
        let mut store = MemoryStore::new();
        let w = triangle(&mut store);
        let d = advancer().dispatch(&mut store, w.a, w.c, &cargo(&w, 5), Minute(0)).unwrap();
        store.remove_connection(w.bc).unwrap();
        let clock = clock_at_zero();
        let mut s = scheduler(store, &clock);
        let mut rec = Recorder::default();

        let reports = step(&mut s, 5, &mut rec);
        assert_eq!(reports[4].stranded, 1);
        assert_eq!(rec.events, [(Minute(5), d.transport, "stranded")]);

        // Retries stay quiet while nothing has changed.
        let reports = step(&mut s, 3, &mut rec);
        assert!(reports.iter().all(TickReport::is_empty));

        s.store_mut().add_connection(w.b, w.c, 2, false).unwrap();
        let reports = step(&mut s, 1, &mut rec);
        assert_eq!(reports[0].continued, 1);
        let legs = s.store_mut().legs(d.transport).unwrap();
        assert_eq!(legs[1].start, Minute(9));

        step(&mut s, 2, &mut rec);
        assert_eq!(s.store_mut().stock(w.c).unwrap().get(w.bolt), 5);
    }

    #[test]
    fn stranded_at_source_departs_when_path_appears() {
        let mut store = MemoryStore::new();
        let w = triangle(&mut store);
        let d = advancer().dispatch(&mut store, w.c, w.a, &cargo(&w, 1), Minute(0)).unwrap();
        let clock = clock_at_zero();
        let mut s = scheduler(store, &clock);
        step(&mut s, 1, &mut NoopObserver);

        s.store_mut().add_connection(w.c, w.a, 4, false).unwrap();
        let reports = step(&mut s, 1, &mut NoopObserver);
        assert_eq!(reports[0].continued, 1);
        step(&mut s, 4, &mut NoopObserver);
        assert_eq!(
            s.store_mut().list_finished_transports().unwrap(),
            [(d.transport, Minute(6))]
        );
    }

    #[test]
    fn retry_can_be_switched_off() {
        let mut store = MemoryStore::new();
        let w = triangle(&mut store);
        advancer().dispatch(&mut store, w.c, w.a, &cargo(&w, 1), Minute(0)).unwrap();
        store.add_connection(w.c, w.a, 4, false).unwrap();
        let clock = clock_at_zero();
        let mut s = SchedulerBuilder::new(store, Arc::clone(&clock))
            .config(SchedulerConfig { retry_stranded: false, ..Default::default() })
            .build()
            .unwrap();

        let reports = step(&mut s, 10, &mut NoopObserver);
        assert!(reports.iter().all(TickReport::is_empty));
        assert_eq!(s.store_mut().list_stranded_transports().unwrap().len(), 1);
    }

    #[test]
    fn retry_without_path_writes_nothing() {
        let mut store = MemoryStore::new();
        let w = triangle(&mut store);
        let d = advancer().dispatch(&mut store, w.c, w.a, &cargo(&w, 1), Minute(0)).unwrap();
        let clock = clock_at_zero();
        let mut s = scheduler(store, &clock);

        // A unit of work would trip the armed fault.
        s.store_mut().fail_next(FaultPoint::Begin);
        let reports = step(&mut s, 30, &mut NoopObserver);
        assert!(reports.iter().all(TickReport::is_empty));

        // Once there is a path the next unit does open, and hits it.
        s.store_mut().add_connection(w.c, w.a, 4, false).unwrap();
        let reports = step(&mut s, 2, &mut NoopObserver);
        assert_eq!((reports[0].failed, reports[1].continued), (1, 1));
        assert_eq!(s.store_mut().legs(d.transport).unwrap()[0].start, Minute(32));
    }
}

// ── Failures ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod failure_tests {
    use super::*;
    use crate::NoopObserver;
    use hl_store::{FaultPoint, LogisticsStore};

    #[test]
    fn write_failure_rolls_back_only_that_transport() {
        let mut store = MemoryStore::new();
        let w = triangle(&mut store);
        let first = advancer().dispatch(&mut store, w.a, w.c, &cargo(&w, 1), Minute(0)).unwrap();
        let second = advancer().dispatch(&mut store, w.a, w.c, &cargo(&w, 1), Minute(0)).unwrap();
        let clock = clock_at_zero();
        let mut s = scheduler(store, &clock);
        let mut rec = Recorder::default();

        step(&mut s, 4, &mut rec);
        s.store_mut().fail_next(FaultPoint::StartLeg);
        let reports = step(&mut s, 1, &mut rec);
        assert_eq!((reports[0].failed, reports[0].continued), (1, 1));
        assert_eq!(rec.events, [
            (Minute(5), first.transport, "failed"),
            (Minute(5), second.transport, "leg"),
        ]);

        // The failed arrival was rolled back, so the leg is still open.
        let legs = s.store_mut().legs(first.transport).unwrap();
        assert_eq!(legs.len(), 1);
        assert_eq!(legs[0].arrival, None);

        // And it is picked up again on the next tick.
        let reports = step(&mut s, 1, &mut rec);
        assert_eq!(reports[0].continued, 1);
        let legs = s.store_mut().legs(first.transport).unwrap();
        assert_eq!(legs[0].arrival, Some(Minute(6)));
        assert_eq!(legs[1].start, Minute(6));
    }

    #[test]
    fn unload_failure_keeps_cargo_on_board() {
        let mut store = MemoryStore::new();
        let w = triangle(&mut store);
        let d = advancer().dispatch(&mut store, w.a, w.b, &cargo(&w, 9), Minute(0)).unwrap();
        let clock = clock_at_zero();
        let mut s = scheduler(store, &clock);

        step(&mut s, 4, &mut NoopObserver);
        s.store_mut().fail_next(FaultPoint::FinishTransport);
        let reports = step(&mut s, 1, &mut NoopObserver);
        assert_eq!(reports[0].failed, 1);

        let store = s.store_mut();
        assert!(store.stock(w.b).unwrap().is_empty());
        assert_eq!(store.list_active_transports().unwrap()[0].transport, d.transport);
    }

    #[test]
    fn failed_error_names_transport() {
        let mut store = MemoryStore::new();
        let w = triangle(&mut store);
        let d = advancer().dispatch(&mut store, w.a, w.b, &cargo(&w, 1), Minute(0)).unwrap();
        store.fail_next(FaultPoint::RecordArrival);
        let due = store.list_due_transports(Minute(5)).unwrap()[0];
        let err = advancer()
            .advance(&mut store, &crate::Pending::Due(due), Minute(5))
            .unwrap_err();
        assert_eq!(err.transport(), Some(d.transport));
    }

    #[test]
    fn failed_dispatch_leaves_no_transport() {
        let mut store = MemoryStore::new();
        let w = triangle(&mut store);

        store.fail_next(FaultPoint::ListConnections);
        assert!(advancer().dispatch(&mut store, w.a, w.c, &cargo(&w, 3), Minute(0)).is_err());
        store.fail_next(FaultPoint::StartLeg);
        assert!(advancer().dispatch(&mut store, w.a, w.c, &cargo(&w, 3), Minute(0)).is_err());
        assert!(store.list_stranded_transports().unwrap().is_empty());
        assert!(store.list_active_transports().unwrap().is_empty());

        // Dispatching again ships the cargo exactly once.
        let d = advancer().dispatch(&mut store, w.a, w.c, &cargo(&w, 3), Minute(0)).unwrap();
        let clock = clock_at_zero();
        let mut s = scheduler(store, &clock);
        step(&mut s, 30, &mut NoopObserver);

        let store = s.store_mut();
        assert_eq!(store.list_finished_transports().unwrap(), [(d.transport, Minute(10))]);
        assert_eq!(store.stock(w.c).unwrap().get(w.bolt), 3);
    }
}

// ── SQLite-backed run ─────────────────────────────────────────────────────────

#[cfg(test)]
mod sqlite_tests {
    use super::*;
    use crate::NoopObserver;
    use hl_store::{LogisticsStore, SqliteStore};

    #[test]
    fn triangle_delivery_end_to_end() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let w = triangle(&mut store);
        let d = advancer().dispatch(&mut store, w.a, w.c, &cargo(&w, 30), Minute(0)).unwrap();
        let clock = clock_at_zero();
        let mut s = scheduler(store, &clock);

        let reports = step(&mut s, 12, &mut NoopObserver);
        assert_eq!(totals(&reports), (1, 1, 0, 0));
        let store = s.store_mut();
        assert_eq!(store.stock(w.c).unwrap().get(w.bolt), 30);
        assert!(store.list_stranded_transports().unwrap().is_empty());
        assert_eq!(store.list_finished_transports().unwrap(), [(d.transport, Minute(10))]);
    }
}
