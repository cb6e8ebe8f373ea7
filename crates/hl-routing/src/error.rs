//! Routing error type.

use thiserror::Error;

use hl_core::{ConnectionId, WarehouseId};

/// Errors produced while building a [`RoutingGraph`](crate::RoutingGraph).
///
/// An unreachable destination is *not* an error; it is
/// [`Route::NoPath`](crate::Route::NoPath).
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("connection {id} from {from} to {to} has zero travel time")]
    ZeroWeight {
        id:   ConnectionId,
        from: WarehouseId,
        to:   WarehouseId,
    },

    #[error("graph has {0} edges, more than the u32 index space")]
    TooManyEdges(usize),
}

pub type RoutingResult<T> = Result<T, RoutingError>;
