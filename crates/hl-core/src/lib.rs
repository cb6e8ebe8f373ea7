//! `hl-core`: foundational types for the humble-logistics simulation.
//!
//! This crate is a dependency of every other `hl-*` crate.  It has no `hl-*`
//! dependencies and minimal external ones (`thiserror`, `tracing`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module       | Contents                                                      |
//! |--------------|---------------------------------------------------------------|
//! | [`ids`]      | `WarehouseId`, `ConnectionId`, `TransportId`, `LegId`, `ProductId` |
//! | [`time`]     | `Minute`: whole virtual-minute index                         |
//! | [`connection`] | `Connection`: one directed edge row                  |
//! | [`clock`]    | `VirtualClock`, `TimeSource`, `MonotonicSource`, `ManualSource` |
//! | [`manifest`] | `Manifest`: product → count cargo map                        |
//! | [`error`]    | `CoreError`, `CoreResult`                                     |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to ids, minutes, manifests. |

pub mod clock;
pub mod connection;
pub mod error;
pub mod ids;
pub mod manifest;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use clock::{ManualSource, MonotonicSource, TimeSource, VirtualClock};
pub use connection::Connection;
pub use error::{CoreError, CoreResult};
pub use ids::{ConnectionId, LegId, ProductId, TransportId, WarehouseId};
pub use manifest::Manifest;
pub use time::Minute;
