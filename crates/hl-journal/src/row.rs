//! Plain data rows written by journal backends.

use std::fmt;

use hl_core::{ConnectionId, Minute, TransportId, WarehouseId};

/// What happened to a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegEvent {
    Departed,
    Delivered,
    Stranded,
    Failed,
}

impl LegEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            LegEvent::Departed => "departed",
            LegEvent::Delivered => "delivered",
            LegEvent::Stranded => "stranded",
            LegEvent::Failed => "failed",
        }
    }
}

impl fmt::Display for LegEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One transport event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegEventRow {
    pub minute:     Minute,
    pub transport:  TransportId,
    pub event:      LegEvent,
    /// Departure warehouse for `Departed`; where the transport is otherwise.
    /// `None` for `Failed`.
    pub node:       Option<WarehouseId>,
    /// Set only for `Departed`.
    pub connection: Option<ConnectionId>,
}

/// Counts for one processed minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickRow {
    pub minute:    Minute,
    pub delivered: usize,
    pub continued: usize,
    pub stranded:  usize,
    pub failed:    usize,
}
