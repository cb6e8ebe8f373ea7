//! In-process store.
//!
//! Mirrors the SQLite backend's semantics (ordering, guards, error cases) on
//! plain collections.  `begin` snapshots the whole state and `rollback`
//! restores it, so a failed unit of work leaves no trace.  Faults can be
//! injected at named points to exercise the scheduler's error paths.

use std::collections::{BTreeMap, BTreeSet};

use hl_core::{
    Connection, ConnectionId, LegId, Manifest, Minute, ProductId, TransportId, WarehouseId,
};

use crate::store::{ActiveTransport, AdminStore, LegRecord, LogisticsStore, StrandedTransport};
use crate::{StoreError, StoreResult};

/// Operations at which [`MemoryStore::fail_next`] can inject an error.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum FaultPoint {
    Begin,
    ListTransports,
    ListConnections,
    RecordArrival,
    StartLeg,
    UpsertStock,
    FinishTransport,
}

#[derive(Clone, Debug)]
struct TransportRow {
    source:   WarehouseId,
    target:   WarehouseId,
    cargo:    Manifest,
    finished: Option<Minute>,
}

#[derive(Clone, Debug, Default)]
struct State {
    warehouses:  BTreeMap<WarehouseId, String>,
    products:    BTreeMap<ProductId, String>,
    connections: BTreeMap<ConnectionId, Connection>,
    transports:  BTreeMap<TransportId, TransportRow>,
    legs:        BTreeMap<LegId, LegRecord>,
    stock:       BTreeMap<WarehouseId, Manifest>,
    next_id:     i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn transport(&self, id: TransportId) -> StoreResult<&TransportRow> {
        self.transports.get(&id).ok_or(StoreError::TransportNotFound(id))
    }

    fn last_leg(&self, transport: TransportId) -> Option<&LegRecord> {
        self.legs.values().filter(|l| l.transport == transport).next_back()
    }

    fn open_leg(&self, transport: TransportId) -> Option<&LegRecord> {
        self.legs
            .values()
            .find(|l| l.transport == transport && l.arrival.is_none())
    }

    fn location(&self, transport: TransportId) -> StoreResult<WarehouseId> {
        let row = self.transport(transport)?;
        Ok(self.last_leg(transport).map_or(row.source, |l| l.to))
    }
}

/// A [`LogisticsStore`] + [`AdminStore`] held entirely in memory.
///
/// Ids are drawn from one shared counter, so every id in a store is unique
/// across tables.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state:  State,
    saved:  Option<State>,
    faults: BTreeSet<FaultPoint>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call at `point` fail with [`StoreError::Injected`].
    pub fn fail_next(&mut self, point: FaultPoint) {
        self.faults.insert(point);
    }

    fn check(&mut self, point: FaultPoint) -> StoreResult<()> {
        if self.faults.remove(&point) {
            return Err(StoreError::Injected(point));
        }
        Ok(())
    }
}

impl LogisticsStore for MemoryStore {
    fn list_active_transports(&mut self) -> StoreResult<Vec<ActiveTransport>> {
        self.check(FaultPoint::ListTransports)?;
        let s = &self.state;
        let mut active: Vec<ActiveTransport> = s
            .legs
            .values()
            .filter(|l| l.arrival.is_none())
            .filter_map(|l| {
                let t = s.transports.get(&l.transport)?;
                t.finished.is_none().then_some(ActiveTransport {
                    leg:            l.id,
                    transport:      l.transport,
                    leg_start:      l.start,
                    leg_minutes:    l.minutes,
                    current_target: l.to,
                    final_target:   t.target,
                })
            })
            .collect();
        active.sort_by_key(|t| t.transport);
        Ok(active)
    }

    fn list_stranded_transports(&mut self) -> StoreResult<Vec<StrandedTransport>> {
        self.check(FaultPoint::ListTransports)?;
        let s = &self.state;
        let mut stranded = Vec::new();
        for (&id, row) in &s.transports {
            if row.finished.is_some() || s.open_leg(id).is_some() {
                continue;
            }
            stranded.push(StrandedTransport {
                transport:    id,
                at:           s.location(id)?,
                final_target: row.target,
            });
        }
        Ok(stranded)
    }

    fn list_connections(&mut self) -> StoreResult<Vec<Connection>> {
        self.check(FaultPoint::ListConnections)?;
        Ok(self.state.connections.values().copied().collect())
    }

    fn record_leg_arrival(&mut self, leg: LegId, arrival: Minute) -> StoreResult<bool> {
        self.check(FaultPoint::RecordArrival)?;
        let record = self.state.legs.get_mut(&leg).ok_or(StoreError::LegNotFound(leg))?;
        if record.arrival.is_some() {
            return Ok(false);
        }
        if arrival <= record.start {
            return Err(StoreError::ArrivalNotAfterStart { leg, start: record.start, arrival });
        }
        record.arrival = Some(arrival);
        Ok(true)
    }

    fn start_next_leg(
        &mut self,
        transport: TransportId,
        connection: ConnectionId,
        start: Minute,
    ) -> StoreResult<LegId> {
        self.check(FaultPoint::StartLeg)?;
        let s = &mut self.state;
        if s.transport(transport)?.finished.is_some() {
            return Err(StoreError::TransportFinished(transport));
        }
        if s.open_leg(transport).is_some() {
            return Err(StoreError::OpenLegExists(transport));
        }
        let c = *s
            .connections
            .get(&connection)
            .ok_or(StoreError::ConnectionNotFound(connection))?;
        let at = s.location(transport)?;
        if c.source != at {
            return Err(StoreError::ConnectionNotAtLocation { connection, transport, at });
        }
        let id = LegId(s.next_id());
        s.legs.insert(id, LegRecord {
            id,
            transport,
            connection: Some(connection),
            from: c.source,
            to: c.target,
            start,
            minutes: c.minutes,
            arrival: None,
        });
        Ok(id)
    }

    fn get_cargo(&mut self, transport: TransportId) -> StoreResult<Manifest> {
        Ok(self.state.transport(transport)?.cargo.clone())
    }

    fn upsert_stock(&mut self, warehouse: WarehouseId, items: &Manifest) -> StoreResult<()> {
        self.check(FaultPoint::UpsertStock)?;
        if !self.state.warehouses.contains_key(&warehouse) {
            return Err(StoreError::WarehouseNotFound(warehouse));
        }
        let mut merged = self.state.stock.get(&warehouse).cloned().unwrap_or_default();
        // Same ceiling as an SQLite INTEGER column.
        if merged.try_merge(items).is_err() || merged.iter().any(|(_, c)| i64::try_from(c).is_err()) {
            return Err(StoreError::OutOfRange { what: "count", value: i64::MAX });
        }
        self.state.stock.insert(warehouse, merged);
        Ok(())
    }

    fn finish_transport(&mut self, transport: TransportId, at: Minute) -> StoreResult<()> {
        self.check(FaultPoint::FinishTransport)?;
        let row = self
            .state
            .transports
            .get_mut(&transport)
            .ok_or(StoreError::TransportNotFound(transport))?;
        if row.finished.is_some() {
            return Err(StoreError::TransportFinished(transport));
        }
        row.finished = Some(at);
        Ok(())
    }

    fn reroute_transport(&mut self, transport: TransportId, target: WarehouseId) -> StoreResult<()> {
        let row = self
            .state
            .transports
            .get_mut(&transport)
            .ok_or(StoreError::TransportNotFound(transport))?;
        if row.finished.is_some() {
            return Err(StoreError::TransportFinished(transport));
        }
        row.target = target;
        Ok(())
    }

    fn begin(&mut self) -> StoreResult<()> {
        self.check(FaultPoint::Begin)?;
        self.saved = Some(self.state.clone());
        Ok(())
    }

    fn commit(&mut self) -> StoreResult<()> {
        self.saved = None;
        Ok(())
    }

    fn rollback(&mut self) -> StoreResult<()> {
        if let Some(saved) = self.saved.take() {
            self.state = saved;
        }
        Ok(())
    }
}

impl AdminStore for MemoryStore {
    fn add_warehouse(&mut self, name: &str) -> StoreResult<WarehouseId> {
        let id = WarehouseId(self.state.next_id());
        self.state.warehouses.insert(id, name.to_owned());
        Ok(id)
    }

    fn add_product(&mut self, name: &str) -> StoreResult<ProductId> {
        let id = ProductId(self.state.next_id());
        self.state.products.insert(id, name.to_owned());
        Ok(id)
    }

    fn add_connection(
        &mut self,
        source: WarehouseId,
        target: WarehouseId,
        minutes: u32,
        two_way: bool,
    ) -> StoreResult<Vec<ConnectionId>> {
        if minutes == 0 {
            return Err(StoreError::ZeroMinutes);
        }
        for w in [source, target] {
            if !self.state.warehouses.contains_key(&w) {
                return Err(StoreError::WarehouseNotFound(w));
            }
        }
        let mut directions = vec![(source, target)];
        if two_way {
            directions.push((target, source));
        }
        let ids = directions
            .into_iter()
            .map(|(from, to)| {
                let id = ConnectionId(self.state.next_id());
                self.state.connections.insert(id, Connection::new(id, from, to, minutes));
                id
            })
            .collect();
        Ok(ids)
    }

    fn remove_connection(&mut self, connection: ConnectionId) -> StoreResult<()> {
        self.state
            .connections
            .remove(&connection)
            .ok_or(StoreError::ConnectionNotFound(connection))?;
        for leg in self.state.legs.values_mut() {
            if leg.connection == Some(connection) {
                leg.connection = None;
            }
        }
        Ok(())
    }

    fn create_transport(
        &mut self,
        source: WarehouseId,
        target: WarehouseId,
        cargo: &Manifest,
    ) -> StoreResult<TransportId> {
        for w in [source, target] {
            if !self.state.warehouses.contains_key(&w) {
                return Err(StoreError::WarehouseNotFound(w));
            }
        }
        let id = TransportId(self.state.next_id());
        self.state.transports.insert(id, TransportRow {
            source,
            target,
            cargo: cargo.clone(),
            finished: None,
        });
        Ok(id)
    }

    fn stock(&mut self, warehouse: WarehouseId) -> StoreResult<Manifest> {
        Ok(self.state.stock.get(&warehouse).cloned().unwrap_or_default())
    }

    fn legs(&mut self, transport: TransportId) -> StoreResult<Vec<LegRecord>> {
        Ok(self
            .state
            .legs
            .values()
            .filter(|l| l.transport == transport)
            .copied()
            .collect())
    }

    fn list_finished_transports(&mut self) -> StoreResult<Vec<(TransportId, Minute)>> {
        Ok(self
            .state
            .transports
            .iter()
            .filter_map(|(&id, row)| row.finished.map(|at| (id, at)))
            .collect())
    }
}
