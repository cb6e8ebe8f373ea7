//! SQLite backend.
//!
//! Opens (or creates) one database file and initialises the schema with
//! `CREATE TABLE IF NOT EXISTS`.  Every thread that needs the store opens its
//! own `SqliteStore`; SQLite's locking (WAL journal, 10 s busy timeout)
//! serialises conflicting writers across them.
//!
//! Leg rows copy the endpoints and travel time of their connection, so a
//! connection may be edited or deleted while a transport is on it.

use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection as SqlConnection, OptionalExtension, params};
use tracing::debug;

use hl_core::{
    Connection, ConnectionId, LegId, Manifest, Minute, ProductId, TransportId, WarehouseId,
};

use crate::store::{ActiveTransport, AdminStore, LegRecord, LogisticsStore, StrandedTransport};
use crate::{StoreError, StoreResult};

const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

const SCHEMA: &str = "
    PRAGMA foreign_keys = ON;
    CREATE TABLE IF NOT EXISTS warehouses (
        id   INTEGER PRIMARY KEY,
        name TEXT    NOT NULL
    );
    CREATE TABLE IF NOT EXISTS products (
        id   INTEGER PRIMARY KEY,
        name TEXT    NOT NULL
    );
    CREATE TABLE IF NOT EXISTS connections (
        id                          INTEGER PRIMARY KEY,
        source_warehouse_id         INTEGER NOT NULL REFERENCES warehouses(id) ON DELETE CASCADE,
        target_warehouse_id         INTEGER NOT NULL REFERENCES warehouses(id) ON DELETE CASCADE,
        transportation_time_minutes INTEGER NOT NULL CHECK (transportation_time_minutes > 0)
    );
    CREATE TABLE IF NOT EXISTS stock (
        warehouse_id INTEGER NOT NULL REFERENCES warehouses(id) ON DELETE CASCADE,
        product_id   INTEGER NOT NULL REFERENCES products(id)   ON DELETE CASCADE,
        count        INTEGER NOT NULL CHECK (count >= 0),
        PRIMARY KEY (warehouse_id, product_id)
    );
    CREATE TABLE IF NOT EXISTS transports (
        id                  INTEGER PRIMARY KEY,
        source_warehouse_id INTEGER NOT NULL REFERENCES warehouses(id),
        target_warehouse_id INTEGER NOT NULL REFERENCES warehouses(id),
        finished_minute     INTEGER
    );
    CREATE TABLE IF NOT EXISTS transport_legs (
        id                INTEGER PRIMARY KEY,
        transport_id      INTEGER NOT NULL REFERENCES transports(id) ON DELETE CASCADE,
        connection_id     INTEGER REFERENCES connections(id) ON DELETE SET NULL,
        from_warehouse_id INTEGER NOT NULL,
        to_warehouse_id   INTEGER NOT NULL,
        start_minute      INTEGER NOT NULL,
        duration_minutes  INTEGER NOT NULL CHECK (duration_minutes > 0),
        arrival_minute    INTEGER CHECK (arrival_minute IS NULL OR arrival_minute > start_minute)
    );
    CREATE UNIQUE INDEX IF NOT EXISTS transport_legs_one_open
        ON transport_legs (transport_id) WHERE arrival_minute IS NULL;
    CREATE TABLE IF NOT EXISTS transported_stock (
        transport_id INTEGER NOT NULL REFERENCES transports(id) ON DELETE CASCADE,
        product_id   INTEGER NOT NULL REFERENCES products(id),
        count        INTEGER NOT NULL CHECK (count > 0),
        PRIMARY KEY (transport_id, product_id)
    );
";

/// [`LogisticsStore`] + [`AdminStore`] over one SQLite connection.
pub struct SqliteStore {
    conn: SqlConnection,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and initialise the schema.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = SqlConnection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")?;
        debug!(path = %path.display(), "opened sqlite store");
        Self::init(conn)
    }

    /// A private in-memory database, for tests and dry runs.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(SqlConnection::open_in_memory()?)
    }

    fn init(conn: SqlConnection) -> StoreResult<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Where `transport` currently is and whether it is finished.
    fn location(&self, transport: TransportId) -> StoreResult<(WarehouseId, bool)> {
        let row: Option<(i64, Option<i64>, Option<i64>)> = self
            .conn
            .query_row(
                "SELECT t.source_warehouse_id, t.finished_minute,
                        (SELECT l.to_warehouse_id FROM transport_legs l
                          WHERE l.transport_id = t.id ORDER BY l.id DESC LIMIT 1)
                   FROM transports t WHERE t.id = ?1",
                params![transport.0],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .optional()?;
        let (source, finished, last_to) = row.ok_or(StoreError::TransportNotFound(transport))?;
        Ok((WarehouseId(last_to.unwrap_or(source)), finished.is_some()))
    }

    fn has_open_leg(&self, transport: TransportId) -> StoreResult<bool> {
        let open: bool = self.conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM transport_legs
                             WHERE transport_id = ?1 AND arrival_minute IS NULL)",
            params![transport.0],
            |r| r.get(0),
        )?;
        Ok(open)
    }
}

// ── Conversions ───────────────────────────────────────────────────────────────

fn to_minutes(value: i64) -> StoreResult<u32> {
    u32::try_from(value).map_err(|_| StoreError::OutOfRange { what: "minutes", value })
}

fn to_count(value: i64) -> StoreResult<u64> {
    u64::try_from(value).map_err(|_| StoreError::OutOfRange { what: "count", value })
}

fn from_count(count: u64) -> StoreResult<i64> {
    i64::try_from(count).map_err(|_| StoreError::OutOfRange { what: "count", value: i64::MAX })
}

fn manifest_from_rows(rows: Vec<(i64, i64)>) -> StoreResult<Manifest> {
    let mut manifest = Manifest::new();
    for (product, count) in rows {
        manifest.add(ProductId(product), to_count(count)?);
    }
    Ok(manifest)
}

// ── LogisticsStore ────────────────────────────────────────────────────────────

const ACTIVE_SELECT: &str = "
    SELECT l.id, l.transport_id, l.start_minute, l.duration_minutes,
           l.to_warehouse_id, t.target_warehouse_id
      FROM transport_legs l
      JOIN transports t ON t.id = l.transport_id
     WHERE l.arrival_minute IS NULL AND t.finished_minute IS NULL";

type ActiveRow = (i64, i64, i64, i64, i64, i64);

fn active_from_row(r: ActiveRow) -> StoreResult<ActiveTransport> {
    Ok(ActiveTransport {
        leg:            LegId(r.0),
        transport:      TransportId(r.1),
        leg_start:      Minute(r.2),
        leg_minutes:    to_minutes(r.3)?,
        current_target: WarehouseId(r.4),
        final_target:   WarehouseId(r.5),
    })
}

impl SqliteStore {
    fn query_active(&self, sql: &str, now: Option<Minute>) -> StoreResult<Vec<ActiveTransport>> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let map = |r: &rusqlite::Row<'_>| -> rusqlite::Result<ActiveRow> {
            Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?, r.get(5)?))
        };
        let rows: Vec<ActiveRow> = match now {
            Some(now) => stmt.query_map(params![now.0], map)?.collect::<Result<_, _>>()?,
            None => stmt.query_map([], map)?.collect::<Result<_, _>>()?,
        };
        rows.into_iter().map(active_from_row).collect()
    }
}

impl LogisticsStore for SqliteStore {
    fn list_active_transports(&mut self) -> StoreResult<Vec<ActiveTransport>> {
        self.query_active(&format!("{ACTIVE_SELECT} ORDER BY l.transport_id"), None)
    }

    fn list_due_transports(&mut self, now: Minute) -> StoreResult<Vec<ActiveTransport>> {
        self.query_active(
            &format!(
                "{ACTIVE_SELECT} AND ?1 - l.start_minute >= l.duration_minutes
                 ORDER BY l.transport_id"
            ),
            Some(now),
        )
    }

    fn list_stranded_transports(&mut self) -> StoreResult<Vec<StrandedTransport>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT t.id,
                    COALESCE((SELECT l.to_warehouse_id FROM transport_legs l
                               WHERE l.transport_id = t.id ORDER BY l.id DESC LIMIT 1),
                             t.source_warehouse_id),
                    t.target_warehouse_id
               FROM transports t
              WHERE t.finished_minute IS NULL
                AND NOT EXISTS (SELECT 1 FROM transport_legs l
                                 WHERE l.transport_id = t.id AND l.arrival_minute IS NULL)
              ORDER BY t.id",
        )?;
        let rows = stmt
            .query_map([], |r| {
                Ok(StrandedTransport {
                    transport:    TransportId(r.get(0)?),
                    at:           WarehouseId(r.get(1)?),
                    final_target: WarehouseId(r.get(2)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn list_connections(&mut self) -> StoreResult<Vec<Connection>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, source_warehouse_id, target_warehouse_id, transportation_time_minutes
               FROM connections ORDER BY id",
        )?;
        let rows: Vec<(i64, i64, i64, i64)> = stmt
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)))?
            .collect::<Result<_, _>>()?;
        rows.into_iter()
            .map(|(id, source, target, minutes)| {
                Ok(Connection::new(
                    ConnectionId(id),
                    WarehouseId(source),
                    WarehouseId(target),
                    to_minutes(minutes)?,
                ))
            })
            .collect()
    }

    fn record_leg_arrival(&mut self, leg: LegId, arrival: Minute) -> StoreResult<bool> {
        let row: Option<(i64, Option<i64>)> = self
            .conn
            .query_row(
                "SELECT start_minute, arrival_minute FROM transport_legs WHERE id = ?1",
                params![leg.0],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;
        let (start, recorded) = row.ok_or(StoreError::LegNotFound(leg))?;
        if recorded.is_some() {
            return Ok(false);
        }
        if arrival.0 <= start {
            return Err(StoreError::ArrivalNotAfterStart { leg, start: Minute(start), arrival });
        }
        let changed = self.conn.execute(
            "UPDATE transport_legs SET arrival_minute = ?2 WHERE id = ?1 AND arrival_minute IS NULL",
            params![leg.0, arrival.0],
        )?;
        Ok(changed == 1)
    }

    fn start_next_leg(
        &mut self,
        transport: TransportId,
        connection: ConnectionId,
        start: Minute,
    ) -> StoreResult<LegId> {
        let (at, finished) = self.location(transport)?;
        if finished {
            return Err(StoreError::TransportFinished(transport));
        }
        if self.has_open_leg(transport)? {
            return Err(StoreError::OpenLegExists(transport));
        }
        let conn_row: Option<(i64, i64, i64)> = self
            .conn
            .query_row(
                "SELECT source_warehouse_id, target_warehouse_id, transportation_time_minutes
                   FROM connections WHERE id = ?1",
                params![connection.0],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .optional()?;
        let (source, target, minutes) = conn_row.ok_or(StoreError::ConnectionNotFound(connection))?;
        if WarehouseId(source) != at {
            return Err(StoreError::ConnectionNotAtLocation { connection, transport, at });
        }
        self.conn.execute(
            "INSERT INTO transport_legs
                 (transport_id, connection_id, from_warehouse_id, to_warehouse_id,
                  start_minute, duration_minutes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![transport.0, connection.0, source, target, start.0, minutes],
        )?;
        Ok(LegId(self.conn.last_insert_rowid()))
    }

    fn get_cargo(&mut self, transport: TransportId) -> StoreResult<Manifest> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT product_id, count FROM transported_stock
              WHERE transport_id = ?1 ORDER BY product_id",
        )?;
        let rows: Vec<(i64, i64)> = stmt
            .query_map(params![transport.0], |r| Ok((r.get(0)?, r.get(1)?)))?
            .collect::<Result<_, _>>()?;
        manifest_from_rows(rows)
    }

    fn upsert_stock(&mut self, warehouse: WarehouseId, items: &Manifest) -> StoreResult<()> {
        // SQLite turns an overflowing integer sum into a REAL, so totals are
        // checked here.
        let tx = self.conn.savepoint()?;
        {
            let mut current = tx.prepare_cached(
                "SELECT count FROM stock WHERE warehouse_id = ?1 AND product_id = ?2",
            )?;
            let mut write = tx.prepare_cached(
                "INSERT INTO stock (warehouse_id, product_id, count) VALUES (?1, ?2, ?3)
                 ON CONFLICT (warehouse_id, product_id) DO UPDATE SET count = excluded.count",
            )?;
            for (product, count) in items {
                let held: Option<i64> = current
                    .query_row(params![warehouse.0, product.0], |r| r.get(0))
                    .optional()?;
                let total = to_count(held.unwrap_or(0))?
                    .checked_add(count)
                    .ok_or(StoreError::OutOfRange { what: "count", value: i64::MAX })?;
                write.execute(params![warehouse.0, product.0, from_count(total)?])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn finish_transport(&mut self, transport: TransportId, at: Minute) -> StoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE transports SET finished_minute = ?2 WHERE id = ?1 AND finished_minute IS NULL",
            params![transport.0, at.0],
        )?;
        if changed == 0 {
            // Distinguish "missing" from "already finished".
            self.location(transport)?;
            return Err(StoreError::TransportFinished(transport));
        }
        Ok(())
    }

    fn reroute_transport(&mut self, transport: TransportId, target: WarehouseId) -> StoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE transports SET target_warehouse_id = ?2 WHERE id = ?1 AND finished_minute IS NULL",
            params![transport.0, target.0],
        )?;
        if changed == 0 {
            self.location(transport)?;
            return Err(StoreError::TransportFinished(transport));
        }
        Ok(())
    }

    fn begin(&mut self) -> StoreResult<()> {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
    }

    fn commit(&mut self) -> StoreResult<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> StoreResult<()> {
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("ROLLBACK")?;
        }
        Ok(())
    }
}

// ── AdminStore ────────────────────────────────────────────────────────────────

impl AdminStore for SqliteStore {
    fn add_warehouse(&mut self, name: &str) -> StoreResult<WarehouseId> {
        self.conn.execute("INSERT INTO warehouses (name) VALUES (?1)", params![name])?;
        Ok(WarehouseId(self.conn.last_insert_rowid()))
    }

    fn add_product(&mut self, name: &str) -> StoreResult<ProductId> {
        self.conn.execute("INSERT INTO products (name) VALUES (?1)", params![name])?;
        Ok(ProductId(self.conn.last_insert_rowid()))
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
        // A savepoint nests inside an open `begin()` unit of work.
        let tx = self.conn.savepoint()?;
        let mut ids = Vec::with_capacity(2);
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO connections
                     (source_warehouse_id, target_warehouse_id, transportation_time_minutes)
                 VALUES (?1, ?2, ?3)",
            )?;
            let mut directions = vec![(source, target)];
            if two_way {
                directions.push((target, source));
            }
            for (from, to) in directions {
                stmt.execute(params![from.0, to.0, minutes])?;
                ids.push(ConnectionId(tx.last_insert_rowid()));
            }
        }
        tx.commit()?;
        Ok(ids)
    }

    fn remove_connection(&mut self, connection: ConnectionId) -> StoreResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM connections WHERE id = ?1", params![connection.0])?;
        if changed == 0 {
            return Err(StoreError::ConnectionNotFound(connection));
        }
        Ok(())
    }

    fn create_transport(
        &mut self,
        source: WarehouseId,
        target: WarehouseId,
        cargo: &Manifest,
    ) -> StoreResult<TransportId> {
        let tx = self.conn.savepoint()?;
        tx.execute(
            "INSERT INTO transports (source_warehouse_id, target_warehouse_id) VALUES (?1, ?2)",
            params![source.0, target.0],
        )?;
        let transport = TransportId(tx.last_insert_rowid());
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO transported_stock (transport_id, product_id, count) VALUES (?1, ?2, ?3)",
            )?;
            for (product, count) in cargo {
                stmt.execute(params![transport.0, product.0, from_count(count)?])?;
            }
        }
        tx.commit()?;
        Ok(transport)
    }

    fn stock(&mut self, warehouse: WarehouseId) -> StoreResult<Manifest> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT product_id, count FROM stock WHERE warehouse_id = ?1 ORDER BY product_id",
        )?;
        let rows: Vec<(i64, i64)> = stmt
            .query_map(params![warehouse.0], |r| Ok((r.get(0)?, r.get(1)?)))?
            .collect::<Result<_, _>>()?;
        manifest_from_rows(rows)
    }

    fn legs(&mut self, transport: TransportId) -> StoreResult<Vec<LegRecord>> {
        type LegRow = (i64, Option<i64>, i64, i64, i64, i64, Option<i64>);
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, connection_id, from_warehouse_id, to_warehouse_id,
                    start_minute, duration_minutes, arrival_minute
               FROM transport_legs WHERE transport_id = ?1 ORDER BY id",
        )?;
        let rows: Vec<LegRow> = stmt
            .query_map(params![transport.0], |r| {
                Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?, r.get(5)?, r.get(6)?))
            })?
            .collect::<Result<_, _>>()?;
        rows.into_iter()
            .map(|(id, connection, from, to, start, minutes, arrival)| {
                Ok(LegRecord {
                    id: LegId(id),
                    transport,
                    connection: connection.map(ConnectionId),
                    from: WarehouseId(from),
                    to: WarehouseId(to),
                    start: Minute(start),
                    minutes: to_minutes(minutes)?,
                    arrival: arrival.map(Minute),
                })
            })
            .collect()
    }

    fn list_finished_transports(&mut self) -> StoreResult<Vec<(TransportId, Minute)>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, finished_minute FROM transports
              WHERE finished_minute IS NOT NULL ORDER BY id",
        )?;
        let rows = stmt
            .query_map([], |r| Ok((TransportId(r.get(0)?), Minute(r.get(1)?))))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
