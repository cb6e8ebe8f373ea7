//! The `Scheduler` struct and its minute loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use hl_core::{Minute, MonotonicSource, TimeSource, VirtualClock};
use hl_routing::{DijkstraPathFinder, PathFinder, RoutingGraph};
use hl_store::LogisticsStore;
use tracing::{error, info, trace, warn};

use crate::advancer::{Decision, Outcome, Pending};
use crate::{SchedulerObserver, SimResult, TransportAdvancer};

// ── Configuration ─────────────────────────────────────────────────────────────

/// Tunables for the minute loop.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct SchedulerConfig {
    /// Longest real-time sleep between drains.  Bounds how long a scale
    /// change or jump takes to be noticed, and is the sleep used while the
    /// clock is paused (scale ≤ 0).
    pub max_sleep:      Duration,
    /// Re-plan stranded transports on every tick.
    pub retry_stranded: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_sleep:      Duration::from_secs(5),
            retry_stranded: true,
        }
    }
}

// ── TickReport ────────────────────────────────────────────────────────────────

/// Counts for one processed minute.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct TickReport {
    pub minute:    Minute,
    pub delivered: usize,
    pub continued: usize,
    pub stranded:  usize,
    pub failed:    usize,
}

impl TickReport {
    pub fn new(minute: Minute) -> Self {
        Self { minute, ..Self::default() }
    }

    /// `true` if nothing happened this minute.
    pub fn is_empty(&self) -> bool {
        self.delivered + self.continued + self.stranded + self.failed == 0
    }
}

// ── Scheduler ─────────────────────────────────────────────────────────────────

/// Turns virtual time into minute ticks.
///
/// Every minute boundary the virtual clock has passed is processed exactly
/// once, in increasing order, however far the clock jumped.  Between drains
/// the scheduler sleeps until the next boundary is expected, recomputed from
/// the live clock every iteration so that drift and scale changes are
/// absorbed.
///
/// Each tick runs in two phases:
///
/// 1. **Plan** (pure, parallel with the `parallel` feature): every due
///    transport, and every stranded one when retries are on, gets a
///    [`Decision`] against one routing snapshot.  The snapshot is built only
///    if at least one transport is not already at its goal.
/// 2. **Apply** (sequential, ascending transport id): each decision commits
///    in its own unit of work.  A failure rolls back that transport only.
///
/// Create via [`SchedulerBuilder`][crate::SchedulerBuilder].
pub struct Scheduler<S: LogisticsStore, P: PathFinder = DijkstraPathFinder, T: TimeSource = MonotonicSource> {
    pub(crate) store:       S,
    pub(crate) advancer:    TransportAdvancer<P>,
    pub(crate) clock:       Arc<VirtualClock<T>>,
    pub(crate) config:      SchedulerConfig,
    pub(crate) next_minute: Minute,
}

impl<S: LogisticsStore, P: PathFinder, T: TimeSource> Scheduler<S, P, T> {
    // ── Accessors ─────────────────────────────────────────────────────────

    /// The next minute boundary to be processed.
    pub fn next_minute(&self) -> Minute {
        self.next_minute
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn clock(&self) -> &Arc<VirtualClock<T>> {
        &self.clock
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn advancer(&self) -> &TransportAdvancer<P> {
        &self.advancer
    }

    // ── Loop ──────────────────────────────────────────────────────────────

    /// Loop forever: drain due minutes, then sleep.
    pub fn run<O: SchedulerObserver>(&mut self, observer: &mut O) -> ! {
        info!(next_minute = %self.next_minute, "scheduler started");
        loop {
            self.drain_due(observer);
            std::thread::sleep(self.pending_sleep());
        }
    }

    /// Like [`run`][Self::run] but returns once `stop` is set.  The flag is
    /// checked before every tick, so a long backlog after a jump does not
    /// delay shutdown by more than one tick.
    pub fn run_until<O: SchedulerObserver>(&mut self, stop: &AtomicBool, observer: &mut O) {
        info!(next_minute = %self.next_minute, "scheduler started");
        while !stop.load(Ordering::Relaxed) {
            self.drain(Some(stop), observer);
            if stop.load(Ordering::Relaxed) {
                break;
            }
            std::thread::sleep(self.pending_sleep());
        }
        info!(next_minute = %self.next_minute, "scheduler stopped");
    }

    /// Process every minute whose boundary the clock has reached.
    ///
    /// Returns the reports of the minutes processed.  If a tick fails before
    /// any transport is touched (the store cannot list work), the minute is
    /// not advanced and the drain stops; the same minute is retried next
    /// call.
    pub fn drain_due<O: SchedulerObserver>(&mut self, observer: &mut O) -> Vec<TickReport> {
        self.drain(None, observer)
    }

    fn drain<O: SchedulerObserver>(
        &mut self,
        stop:     Option<&AtomicBool>,
        observer: &mut O,
    ) -> Vec<TickReport> {
        let mut reports = Vec::new();
        while self.clock.get_time() >= self.next_minute.start_secs() {
            if stop.is_some_and(|s| s.load(Ordering::Relaxed)) {
                info!(next_minute = %self.next_minute, "stop requested mid-drain");
                break;
            }
            match self.process_tick(self.next_minute, observer) {
                Ok(report) => {
                    reports.push(report);
                    self.next_minute = self.next_minute.next();
                }
                Err(e) => {
                    error!(minute = %self.next_minute, error = %e, "tick failed; will retry");
                    break;
                }
            }
        }
        reports
    }

    /// How long to sleep before the next boundary is due.
    pub fn pending_sleep(&self) -> Duration {
        sleep_duration(
            self.clock.get_time(),
            self.next_minute,
            self.clock.get_scale(),
            self.config.max_sleep,
        )
    }

    // ── Core tick processing ──────────────────────────────────────────────

    /// Process one minute.
    ///
    /// Errors only when listing work or building the routing snapshot fails;
    /// per-transport failures are counted in the report.
    pub fn process_tick<O: SchedulerObserver>(
        &mut self,
        minute:   Minute,
        observer: &mut O,
    ) -> SimResult<TickReport> {
        // ── Phase 0: collect work ─────────────────────────────────────────
        //
        // Stranded transports are listed before anything is applied so a
        // transport stranded by this very tick is not retried against the
        // same snapshot.
        let mut pending: Vec<Pending> = self
            .store
            .list_due_transports(minute)?
            .into_iter()
            .map(Pending::Due)
            .collect();
        if self.config.retry_stranded {
            pending.extend(
                self.store
                    .list_stranded_transports()?
                    .into_iter()
                    .map(Pending::Stranded),
            );
        }
        pending.sort_by_key(Pending::transport);

        let graph = if pending.iter().any(Pending::needs_routing) {
            RoutingGraph::from_connections(&self.store.list_connections()?)?
        } else {
            RoutingGraph::empty()
        };

        observer.on_tick_start(minute);

        // ── Phase 1: plan (pure) ──────────────────────────────────────────
        let decisions = self.plan_all(&graph, &pending);

        // ── Phase 2: apply (sequential, ascending transport id) ───────────
        let mut report = TickReport::new(minute);
        for (p, decision) in pending.iter().zip(decisions) {
            let transport = p.transport();
            match self.advancer.apply(&mut self.store, p, decision, minute) {
                Ok(Outcome::Delivered { at }) => {
                    report.delivered += 1;
                    observer.on_delivered(minute, transport, at);
                }
                Ok(Outcome::Continued { from, hop, leg }) => {
                    report.continued += 1;
                    trace!(%transport, %leg, %from, to = %hop.target, "leg started");
                    observer.on_leg_started(minute, transport, from, &hop);
                }
                Ok(Outcome::Stranded { at }) => {
                    report.stranded += 1;
                    warn!(%transport, %at, goal = %p.goal(), "no path to destination; stranded");
                    observer.on_stranded(minute, transport, at);
                }
                Ok(Outcome::Unchanged) => {}
                Err(e) => {
                    report.failed += 1;
                    error!(%transport, %minute, error = %e, "transport update rolled back");
                    observer.on_failed(minute, transport, &e);
                }
            }
        }

        if report.is_empty() {
            trace!(%minute, "tick");
        } else {
            info!(
                %minute,
                delivered = report.delivered,
                continued = report.continued,
                stranded = report.stranded,
                failed = report.failed,
                "tick"
            );
        }
        observer.on_tick_end(&report);
        Ok(report)
    }

    /// Decide every pending transport against `graph`.
    ///
    /// With the `parallel` feature this runs on rayon's thread pool; the
    /// output order always matches `pending`.
    fn plan_all(&self, graph: &RoutingGraph, pending: &[Pending]) -> Vec<Decision> {
        let advancer = &self.advancer;

        #[cfg(not(feature = "parallel"))]
        {
            pending.iter().map(|p| advancer.plan(graph, p)).collect()
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            pending.par_iter().map(|p| advancer.plan(graph, p)).collect()
        }
    }
}

// ── Sleep computation ─────────────────────────────────────────────────────────

/// Real time to sleep from virtual `now_secs` until `next_minute` begins.
///
/// The virtual gap is divided by `scale` and capped at `cap`.  A paused or
/// reversed clock (`scale ≤ 0`, or NaN) always sleeps the full cap.  A
/// boundary already passed gives zero.
pub fn sleep_duration(now_secs: f64, next_minute: Minute, scale: f64, cap: Duration) -> Duration {
    if !(scale > 0.0) {
        return cap;
    }
    let remaining = next_minute.start_secs() - now_secs;
    if remaining <= 0.0 {
        return Duration::ZERO;
    }
    let real = remaining / scale;
    if real >= cap.as_secs_f64() {
        cap
    } else {
        Duration::from_secs_f64(real)
    }
}
