//! Scheduler observer trait for progress reporting and journaling.

use hl_core::{Minute, TransportId, WarehouseId};
use hl_routing::NextHop;

use crate::{SimError, TickReport};

/// Callbacks invoked by the [`Scheduler`][crate::Scheduler] while it
/// processes minute ticks.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.  Hooks fire only after the matching
/// store unit of work has committed.
///
/// # Example: delivery counter
///
/// ```rust,ignore
/// struct Deliveries(usize);
///
/// impl SchedulerObserver for Deliveries {
///     fn on_delivered(&mut self, _m: Minute, _t: TransportId, _at: WarehouseId) {
///         self.0 += 1;
///     }
/// }
/// ```
pub trait SchedulerObserver {
    /// Called once per tick, after the due transports have been listed.
    fn on_tick_start(&mut self, _minute: Minute) {}

    /// A transport left `from` along `hop.connection`.
    fn on_leg_started(
        &mut self,
        _minute:    Minute,
        _transport: TransportId,
        _from:      WarehouseId,
        _hop:       &NextHop,
    ) {}

    /// A transport reached its final warehouse and its cargo was unloaded.
    fn on_delivered(&mut self, _minute: Minute, _transport: TransportId, _at: WarehouseId) {}

    /// A transport arrived at `at` but no path leads on to its destination.
    fn on_stranded(&mut self, _minute: Minute, _transport: TransportId, _at: WarehouseId) {}

    /// Applying a decision for `transport` failed and was rolled back.
    fn on_failed(&mut self, _minute: Minute, _transport: TransportId, _error: &SimError) {}

    /// Called at the end of each tick with its counts.
    fn on_tick_end(&mut self, _report: &TickReport) {}
}

/// A [`SchedulerObserver`] that does nothing.
pub struct NoopObserver;

impl SchedulerObserver for NoopObserver {}
