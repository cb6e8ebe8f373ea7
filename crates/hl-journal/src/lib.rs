//! `hl-journal`: an append-only record of what the scheduler did.
//!
//! | File        | One row per                                             |
//! |-------------|---------------------------------------------------------|
//! | `legs.csv`  | leg started, delivery, stranding, or failed update      |
//! | `ticks.csv` | processed minute, with its counts                       |
//!
//! [`CsvJournal`] implements [`JournalWriter`] and is driven by
//! [`JournalObserver`], which implements `hl_sim::SchedulerObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use hl_journal::{CsvJournal, JournalObserver};
//!
//! let mut obs = JournalObserver::new(CsvJournal::open(Path::new("./journal"))?);
//! scheduler.run_until(&stop, &mut obs);
//! obs.finish();
//! if let Some(e) = obs.take_error() { eprintln!("journal error: {e}"); }
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;


pub use csv::CsvJournal;
pub use error::{JournalError, JournalResult};
pub use observer::JournalObserver;
pub use row::{LegEvent, LegEventRow, TickRow};
pub use writer::JournalWriter;
