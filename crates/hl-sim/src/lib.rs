//! `hl-sim`: the minute scheduler that moves transports through the
//! warehouse network.
//!
//! # Tick loop
//!
//! ```text
//! loop:
//!   while clock.get_time() >= next_minute × 60:
//!     ① Collect : due transports (leg finished by next_minute), plus
//!                  stranded ones when retries are on.
//!     ② Snapshot: one RoutingGraph from list_connections(), only if some
//!                  transport is not already at its goal.
//!     ③ Plan    : Decision per transport: Arrive | Continue(hop) | Strand
//!                  (parallel with the `parallel` feature).
//!     ④ Apply   : ascending transport id, one store unit of work each:
//!                    Arrive      → unload cargo into stock, finish
//!                    Continue(h) → open a leg on h.connection at next_minute
//!                    Strand      → leave in place
//!     next_minute += 1
//!   sleep min((next boundary − now) / scale, max_sleep)
//! ```
//!
//! # Cargo features
//!
//! | Feature    | Effect                                         |
//! |------------|------------------------------------------------|
//! | `parallel` | Runs the plan phase on rayon's thread pool.    |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use hl_core::VirtualClock;
//! use hl_sim::{NoopObserver, SchedulerBuilder};
//! use hl_store::SqliteStore;
//!
//! let clock = Arc::new(VirtualClock::new());
//! let mut scheduler = SchedulerBuilder::new(SqliteStore::open(path)?, clock).build()?;
//! scheduler.run(&mut NoopObserver);
//! ```

pub mod advancer;
pub mod builder;
pub mod error;
pub mod observer;
pub mod scheduler;

#[cfg(test)]
mod tests;

pub use advancer::{Decision, Dispatched, Outcome, Pending, TransportAdvancer};
pub use builder::SchedulerBuilder;
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SchedulerObserver};
pub use scheduler::{Scheduler, SchedulerConfig, TickReport, sleep_duration};
