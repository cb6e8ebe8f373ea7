//! Moving one transport forward.
//!
//! Work is split the same way as the tick loop:
//!
//! - [`TransportAdvancer::plan`] is pure.  It reads only the routing
//!   snapshot, so a whole tick's worth of plans can run in parallel.
//! - [`TransportAdvancer::apply`] writes the decision to the store inside one
//!   `begin`/`commit` unit of work and rolls back on any error.
//!
//! Arrivals are guarded by [`LogisticsStore::record_leg_arrival`]: if the
//! arrival is already recorded the unit commits with no further effect, so a
//! tick replayed after a crash or a concurrent runner never unloads twice or
//! opens a second leg.

use hl_core::{LegId, Manifest, Minute, TransportId, WarehouseId};
use hl_routing::{DijkstraPathFinder, NextHop, PathFinder, Route, RoutingGraph};
use hl_store::{ActiveTransport, AdminStore, LogisticsStore, StrandedTransport};
use tracing::{debug, error};

use crate::SimResult;

// ── Pending work ──────────────────────────────────────────────────────────────

/// One transport that needs a decision this tick.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Pending {
    /// Its open leg has completed.
    Due(ActiveTransport),
    /// It has no open leg and is waiting for a path to appear.
    Stranded(StrandedTransport),
}

impl Pending {
    pub fn transport(&self) -> TransportId {
        match self {
            Pending::Due(t) => t.transport,
            Pending::Stranded(t) => t.transport,
        }
    }

    /// The warehouse the transport is at (or about to be at).
    pub fn at(&self) -> WarehouseId {
        match self {
            Pending::Due(t) => t.current_target,
            Pending::Stranded(t) => t.at,
        }
    }

    pub fn goal(&self) -> WarehouseId {
        match self {
            Pending::Due(t) => t.final_target,
            Pending::Stranded(t) => t.final_target,
        }
    }

    /// `true` when deciding requires a routing snapshot.
    pub fn needs_routing(&self) -> bool {
        self.at() != self.goal()
    }
}

// ── Decisions and outcomes ────────────────────────────────────────────────────

/// What should happen to a pending transport.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Decision {
    /// Unload at the current warehouse and finish.
    Arrive,
    /// Open a new leg along this hop.
    Continue(NextHop),
    /// No path onward; stay put.
    Strand,
}

/// What applying a [`Decision`] actually did.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Outcome {
    Delivered { at: WarehouseId },
    Continued { from: WarehouseId, hop: NextHop, leg: LegId },
    /// Newly stranded by this arrival.
    Stranded { at: WarehouseId },
    /// Nothing changed: the arrival was already recorded, or a stranded
    /// transport still has no path.
    Unchanged,
}

/// Result of [`TransportAdvancer::dispatch`].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Dispatched {
    pub transport: TransportId,
    pub outcome:   Outcome,
}

// ── TransportAdvancer ─────────────────────────────────────────────────────────

/// Decides and applies next steps for transports using a [`PathFinder`].
#[derive(Clone, Debug, Default)]
pub struct TransportAdvancer<P: PathFinder = DijkstraPathFinder> {
    path_finder: P,
}

impl<P: PathFinder> TransportAdvancer<P> {
    pub fn new(path_finder: P) -> Self {
        Self { path_finder }
    }

    /// Decide what `pending` should do next against `graph`.
    ///
    /// A transport at its goal arrives without consulting the graph, so an
    /// empty snapshot is fine when nothing [`needs_routing`][Pending::needs_routing].
    pub fn plan(&self, graph: &RoutingGraph, pending: &Pending) -> Decision {
        self.decide(graph, pending.at(), pending.goal())
    }

    fn decide(&self, graph: &RoutingGraph, at: WarehouseId, goal: WarehouseId) -> Decision {
        match self.path_finder.next_hop(graph, at, goal) {
            Route::AtGoal => Decision::Arrive,
            Route::Next(hop) => Decision::Continue(hop),
            Route::NoPath => Decision::Strand,
        }
    }

    /// Apply `decision` to `pending` at `minute` in one unit of work.
    pub fn apply<S: LogisticsStore>(
        &self,
        store:    &mut S,
        pending:  &Pending,
        decision: Decision,
        minute:   Minute,
    ) -> SimResult<Outcome> {
        let transport = pending.transport();
        let at = pending.at();
        if let (Decision::Strand, Pending::Stranded(_)) = (decision, pending) {
            // Still no path: nothing to write.
            return Ok(Outcome::Unchanged);
        }
        let result = in_unit(store, |store| {
            if let Pending::Due(t) = pending {
                if !store.record_leg_arrival(t.leg, minute)? {
                    debug!(%transport, leg = %t.leg, "arrival already recorded");
                    return Ok(Outcome::Unchanged);
                }
            }
            match (decision, pending) {
                (Decision::Arrive, _) => {
                    unload(store, transport, at, minute)?;
                    Ok(Outcome::Delivered { at })
                }
                (Decision::Continue(hop), _) => {
                    let leg = store.start_next_leg(transport, hop.connection, minute)?;
                    Ok(Outcome::Continued { from: at, hop, leg })
                }
                (Decision::Strand, Pending::Due(_)) => Ok(Outcome::Stranded { at }),
                (Decision::Strand, Pending::Stranded(_)) => Ok(Outcome::Unchanged),
            }
        });
        result.map_err(|e| e.for_transport(transport))
    }

    /// Plan and apply a single transport against a fresh snapshot.
    pub fn advance<S: LogisticsStore>(
        &self,
        store:   &mut S,
        pending: &Pending,
        minute:  Minute,
    ) -> SimResult<Outcome> {
        let graph = if pending.needs_routing() {
            RoutingGraph::from_connections(&store.list_connections()?)?
        } else {
            RoutingGraph::empty()
        };
        let decision = self.plan(&graph, pending);
        self.apply(store, pending, decision, minute)
    }

    /// Create a transport at `source` bound for `target`, load `cargo`, and
    /// open its first leg at `now`.
    ///
    /// The route is planned first; creating the transport and applying the
    /// plan then share one unit of work, so a failure leaves nothing behind.
    /// With no path the transport is left stranded at `source` and picked up
    /// by the scheduler's retry once a path exists.  `source == target`
    /// delivers immediately.
    pub fn dispatch<S: AdminStore>(
        &self,
        store:  &mut S,
        source: WarehouseId,
        target: WarehouseId,
        cargo:  &Manifest,
        now:    Minute,
    ) -> SimResult<Dispatched> {
        let graph = if source != target {
            RoutingGraph::from_connections(&store.list_connections()?)?
        } else {
            RoutingGraph::empty()
        };
        let decision = self.decide(&graph, source, target);
        in_unit(store, |store| {
            let transport = store.create_transport(source, target, cargo)?;
            let outcome = match decision {
                Decision::Arrive => {
                    unload(store, transport, source, now)?;
                    Outcome::Delivered { at: source }
                }
                Decision::Continue(hop) => {
                    let leg = store.start_next_leg(transport, hop.connection, now)?;
                    Outcome::Continued { from: source, hop, leg }
                }
                Decision::Strand => Outcome::Stranded { at: source },
            };
            Ok(Dispatched { transport, outcome })
        })
    }
}

// ── Store helpers ─────────────────────────────────────────────────────────────

/// Run `f` between `begin` and `commit`, rolling back if anything fails.
fn in_unit<S, T, F>(store: &mut S, f: F) -> SimResult<T>
where
    S: LogisticsStore,
    F: FnOnce(&mut S) -> SimResult<T>,
{
    store.begin()?;
    let result = f(store).and_then(|value| {
        store.commit()?;
        Ok(value)
    });
    if result.is_err() {
        if let Err(e) = store.rollback() {
            error!(error = %e, "rollback failed");
        }
    }
    result
}

/// Move the whole cargo into `at`'s stock and archive the transport.
fn unload<S: LogisticsStore>(
    store:     &mut S,
    transport: TransportId,
    at:        WarehouseId,
    minute:    Minute,
) -> SimResult<()> {
    let cargo = store.get_cargo(transport)?;
    store.upsert_stock(at, &cargo)?;
    store.finish_transport(transport, minute)?;
    debug!(%transport, %at, units = cargo.total_units(), "cargo unloaded");
    Ok(())
}
