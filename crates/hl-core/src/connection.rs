//! Directed connection rows: the edges of the warehouse network.

use crate::{ConnectionId, WarehouseId};

/// One directed connection between two warehouses.
///
/// Two-way routes are stored as two rows, one per direction, each with its
/// own [`ConnectionId`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Connection {
    pub id:      ConnectionId,
    pub source:  WarehouseId,
    pub target:  WarehouseId,
    /// Travel time in whole virtual minutes.  Always positive.
    pub minutes: u32,
}

impl Connection {
    pub fn new(id: ConnectionId, source: WarehouseId, target: WarehouseId, minutes: u32) -> Self {
        Self { id, source, target, minutes }
    }
}
