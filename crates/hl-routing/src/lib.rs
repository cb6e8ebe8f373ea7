//! `hl-routing`: connection-graph snapshots and next-hop routing.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                  |
//! |----------------|-----------------------------------------------------------|
//! | [`graph`]      | `RoutingGraph` (immutable CSR snapshot of connections)    |
//! | [`pathfinder`] | `PathFinder` trait, `Route`, `DijkstraPathFinder`         |
//! | [`error`]      | `RoutingError`, `RoutingResult<T>`                        |
//!
//! # Snapshot discipline
//!
//! A [`RoutingGraph`] is built from a fresh `list_connections()` read every
//! time routing is needed and is never mutated afterwards.  Connections may
//! be added or removed by another thread at any moment; a cached mutable
//! graph would go stale, a per-batch snapshot cannot.
//!
//! Only the **next hop** of a shortest path is ever returned.  A transport
//! commits to one leg at a time and re-routes against a new snapshot when
//! that leg completes.

pub mod error;
pub mod graph;
pub mod pathfinder;


pub use error::{RoutingError, RoutingResult};
pub use graph::RoutingGraph;
pub use pathfinder::{DijkstraPathFinder, NextHop, PathFinder, Route};
