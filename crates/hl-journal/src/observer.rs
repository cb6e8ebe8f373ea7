//! `JournalObserver<W>`: bridges `SchedulerObserver` to a `JournalWriter`.

use hl_core::{Minute, TransportId, WarehouseId};
use hl_routing::NextHop;
use hl_sim::{SchedulerObserver, SimError, TickReport};
use tracing::warn;

use crate::row::{LegEvent, LegEventRow, TickRow};
use crate::writer::JournalWriter;
use crate::{JournalError, JournalResult};

/// A [`SchedulerObserver`] that journals every transport event and tick to a
/// [`JournalWriter`].
///
/// Observer hooks cannot fail, so the first write error is stored and can be
/// collected with [`take_error`][Self::take_error].  The scheduler is never
/// interrupted by journaling.  Rows are flushed at the end of every tick that
/// did something.
pub struct JournalObserver<W: JournalWriter> {
    writer:     W,
    last_error: Option<JournalError>,
}

impl<W: JournalWriter> JournalObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, last_error: None }
    }

    /// Take the stored write error, if any.
    pub fn take_error(&mut self) -> Option<JournalError> {
        self.last_error.take()
    }

    /// Flush outstanding rows.  Call once the scheduler has stopped.
    pub fn finish(&mut self) {
        let result = self.writer.flush();
        self.store_err(result);
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: JournalResult<()>) {
        if let Err(e) = result {
            if self.last_error.is_none() {
                warn!(error = %e, "journal write failed");
                self.last_error = Some(e);
            }
        }
    }

    fn event(
        &mut self,
        minute:     Minute,
        transport:  TransportId,
        event:      LegEvent,
        node:       Option<WarehouseId>,
        connection: Option<hl_core::ConnectionId>,
    ) {
        let row = LegEventRow { minute, transport, event, node, connection };
        let result = self.writer.write_leg_event(&row);
        self.store_err(result);
    }
}

impl<W: JournalWriter> SchedulerObserver for JournalObserver<W> {
    fn on_leg_started(
        &mut self,
        minute:    Minute,
        transport: TransportId,
        from:      WarehouseId,
        hop:       &NextHop,
    ) {
        self.event(minute, transport, LegEvent::Departed, Some(from), Some(hop.connection));
    }

    fn on_delivered(&mut self, minute: Minute, transport: TransportId, at: WarehouseId) {
        self.event(minute, transport, LegEvent::Delivered, Some(at), None);
    }

    fn on_stranded(&mut self, minute: Minute, transport: TransportId, at: WarehouseId) {
        self.event(minute, transport, LegEvent::Stranded, Some(at), None);
    }

    fn on_failed(&mut self, minute: Minute, transport: TransportId, _error: &SimError) {
        self.event(minute, transport, LegEvent::Failed, None, None);
    }

    fn on_tick_end(&mut self, report: &TickReport) {
        let row = TickRow {
            minute:    report.minute,
            delivered: report.delivered,
            continued: report.continued,
            stranded:  report.stranded,
            failed:    report.failed,
        };
        let result = self.writer.write_tick(&row);
        self.store_err(result);
        if !report.is_empty() {
            let result = self.writer.flush();
            self.store_err(result);
        }
    }
}
