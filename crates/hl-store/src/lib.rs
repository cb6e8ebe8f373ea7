//! `hl-store`: the persistence collaborator.
//!
//! The simulation core never sees SQL.  It talks to storage through the
//! [`LogisticsStore`] trait; hosts that also seed networks and dispatch
//! transports use the wider [`AdminStore`].
//!
//! | Module     | Contents                                                      |
//! |------------|---------------------------------------------------------------|
//! | [`store`]  | `LogisticsStore`, `AdminStore`, row types                     |
//! | [`sqlite`] | `SqliteStore`: one `rusqlite` connection per thread          |
//! | [`memory`] | `MemoryStore`: in-process store with fault injection (tests) |
//! | [`error`]  | `StoreError`, `StoreResult<T>`                                |
//!
//! # Units of work
//!
//! Each transport advance is bracketed by [`begin`](LogisticsStore::begin) /
//! [`commit`](LogisticsStore::commit), or [`rollback`](LogisticsStore::rollback)
//! on failure.  Both backends make the bracket atomic.

pub mod error;
pub mod memory;
pub mod sqlite;
pub mod store;


pub use error::{StoreError, StoreResult};
pub use memory::{FaultPoint, MemoryStore};
pub use sqlite::SqliteStore;
pub use store::{ActiveTransport, AdminStore, LegRecord, LogisticsStore, StrandedTransport};
