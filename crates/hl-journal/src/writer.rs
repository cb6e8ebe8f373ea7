//! The `JournalWriter` trait implemented by journal backends.

use crate::{JournalResult, LegEventRow, TickRow};

/// Sink for journal rows.
///
/// Errors are surfaced to [`JournalObserver`][crate::JournalObserver], which
/// stores the first one instead of interrupting the scheduler.
pub trait JournalWriter {
    fn write_leg_event(&mut self, row: &LegEventRow) -> JournalResult<()>;

    fn write_tick(&mut self, row: &TickRow) -> JournalResult<()>;

    /// Push buffered rows to the underlying files.
    fn flush(&mut self) -> JournalResult<()>;
}
