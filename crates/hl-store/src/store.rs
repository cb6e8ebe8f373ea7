//! The persistence contract.

use hl_core::{
    Connection, ConnectionId, LegId, Manifest, Minute, ProductId, TransportId, WarehouseId,
};

use crate::StoreResult;

// ── Rows ──────────────────────────────────────────────────────────────────────

/// A transport with an open (not yet arrived) leg.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct ActiveTransport {
    pub leg:            LegId,
    pub transport:      TransportId,
    pub leg_start:      Minute,
    pub leg_minutes:    u32,
    /// Where the open leg ends.
    pub current_target: WarehouseId,
    pub final_target:   WarehouseId,
}

impl ActiveTransport {
    /// `true` once the open leg has completed by minute `now`.
    #[inline]
    pub fn is_due(&self, now: Minute) -> bool {
        now.has_elapsed(self.leg_start, self.leg_minutes)
    }
}

/// An unfinished transport with no open leg, typically left behind by an
/// unreachable destination.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct StrandedTransport {
    pub transport:    TransportId,
    /// Target of its last leg, or its source if it never moved.
    pub at:           WarehouseId,
    pub final_target: WarehouseId,
}

/// One persisted leg, for inspection.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct LegRecord {
    pub id:         LegId,
    pub transport:  TransportId,
    /// `None` once the connection row has been deleted.
    pub connection: Option<ConnectionId>,
    pub from:       WarehouseId,
    pub to:         WarehouseId,
    pub start:      Minute,
    pub minutes:    u32,
    pub arrival:    Option<Minute>,
}

// ── Core-consumed contract ────────────────────────────────────────────────────

/// Operations the scheduler and transport advancer rely on.
///
/// Implementations serialise conflicting writes themselves; callers bracket
/// each transport's update with `begin`/`commit`.
pub trait LogisticsStore {
    /// All transports with an open leg, ordered by transport id.
    fn list_active_transports(&mut self) -> StoreResult<Vec<ActiveTransport>>;

    /// Active transports whose open leg has completed by `now`.
    fn list_due_transports(&mut self, now: Minute) -> StoreResult<Vec<ActiveTransport>> {
        let mut active = self.list_active_transports()?;
        active.retain(|t| t.is_due(now));
        Ok(active)
    }

    /// Unfinished transports with no open leg, ordered by transport id.
    fn list_stranded_transports(&mut self) -> StoreResult<Vec<StrandedTransport>>;

    /// Every directed connection, ordered by connection id.
    fn list_connections(&mut self) -> StoreResult<Vec<Connection>>;

    /// Close `leg` at `arrival`.
    ///
    /// Returns `false` (and changes nothing) if the arrival was already
    /// recorded.  This is the guard that makes re-running a tick harmless.
    fn record_leg_arrival(&mut self, leg: LegId, arrival: Minute) -> StoreResult<bool>;

    /// Open a new leg for `transport` along `connection`, starting at `start`.
    ///
    /// Fails if the transport still has an open leg, is finished, or is not
    /// at the connection's source.
    fn start_next_leg(
        &mut self,
        transport: TransportId,
        connection: ConnectionId,
        start: Minute,
    ) -> StoreResult<LegId>;

    fn get_cargo(&mut self, transport: TransportId) -> StoreResult<Manifest>;

    /// Add every entry of `items` to `warehouse`'s stock.
    fn upsert_stock(&mut self, warehouse: WarehouseId, items: &Manifest) -> StoreResult<()>;

    /// Archive `transport` as delivered at `at`.
    fn finish_transport(&mut self, transport: TransportId, at: Minute) -> StoreResult<()>;

    /// Point an unfinished transport at a new final warehouse.  Takes effect
    /// when its current leg completes.
    fn reroute_transport(&mut self, transport: TransportId, target: WarehouseId) -> StoreResult<()>;

    fn begin(&mut self) -> StoreResult<()> {
        Ok(())
    }

    fn commit(&mut self) -> StoreResult<()> {
        Ok(())
    }

    fn rollback(&mut self) -> StoreResult<()> {
        Ok(())
    }
}

// ── Host-side writes ──────────────────────────────────────────────────────────

/// Seeding and inspection operations used by hosts and tests.  The scheduler
/// never needs these.
pub trait AdminStore: LogisticsStore {
    fn add_warehouse(&mut self, name: &str) -> StoreResult<WarehouseId>;

    fn add_product(&mut self, name: &str) -> StoreResult<ProductId>;

    /// Add a connection.  A two-way connection is stored as two directed
    /// rows; both ids are returned, forward first.
    fn add_connection(
        &mut self,
        source: WarehouseId,
        target: WarehouseId,
        minutes: u32,
        two_way: bool,
    ) -> StoreResult<Vec<ConnectionId>>;

    fn remove_connection(&mut self, connection: ConnectionId) -> StoreResult<()>;

    /// Register a transport at `source` carrying `cargo`.  It has no leg yet
    /// and is therefore stranded until one is started.
    fn create_transport(
        &mut self,
        source: WarehouseId,
        target: WarehouseId,
        cargo: &Manifest,
    ) -> StoreResult<TransportId>;

    fn stock(&mut self, warehouse: WarehouseId) -> StoreResult<Manifest>;

    /// Legs of `transport` in the order they were started.
    fn legs(&mut self, transport: TransportId) -> StoreResult<Vec<LegRecord>>;

    /// Finished transports with their delivery minute, ordered by id.
    fn list_finished_transports(&mut self) -> StoreResult<Vec<(TransportId, Minute)>>;
}
