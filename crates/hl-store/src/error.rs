//! Store error type.

use thiserror::Error;

use hl_core::{ConnectionId, LegId, Minute, TransportId, WarehouseId};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("leg {0} not found")]
    LegNotFound(LegId),

    #[error("transport {0} not found")]
    TransportNotFound(TransportId),

    #[error("connection {0} not found")]
    ConnectionNotFound(ConnectionId),

    #[error("warehouse {0} not found")]
    WarehouseNotFound(WarehouseId),

    #[error("transport {0} is already finished")]
    TransportFinished(TransportId),

    #[error("transport {0} already has an open leg")]
    OpenLegExists(TransportId),

    #[error("connection {connection} does not leave {at}, where transport {transport} is")]
    ConnectionNotAtLocation {
        connection: ConnectionId,
        transport:  TransportId,
        at:         WarehouseId,
    },

    #[error("leg {leg} cannot arrive at {arrival}: it started at {start}")]
    ArrivalNotAfterStart {
        leg:     LegId,
        start:   Minute,
        arrival: Minute,
    },

    #[error("connection travel time must be positive")]
    ZeroMinutes,

    #[error("{what} value {value} is out of range")]
    OutOfRange { what: &'static str, value: i64 },

    #[error("injected failure at {0:?}")]
    Injected(crate::FaultPoint),
}

pub type StoreResult<T> = Result<T, StoreError>;
