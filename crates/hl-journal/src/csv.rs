//! CSV journal backend.
//!
//! Keeps two files in the journal directory:
//! - `legs.csv`
//! - `ticks.csv`
//!
//! Files are opened for append so a restarted service continues the same
//! journal.  The header row is written only when a file is new or empty.

use std::fs::{self, File, OpenOptions};
use std::path::Path;

use csv::{Writer, WriterBuilder};
use tracing::debug;

use crate::writer::JournalWriter;
use crate::{JournalResult, LegEventRow, TickRow};

pub const LEGS_FILE: &str = "legs.csv";
pub const TICKS_FILE: &str = "ticks.csv";

const LEGS_HEADER: [&str; 5] = ["minute", "transport_id", "event", "node", "connection_id"];
const TICKS_HEADER: [&str; 5] = ["minute", "delivered", "continued", "stranded", "failed"];

/// Appends journal rows to two CSV files.
pub struct CsvJournal {
    legs:  Writer<File>,
    ticks: Writer<File>,
}

impl CsvJournal {
    /// Open (or create) the journal files in `dir`, creating `dir` if needed.
    pub fn open(dir: &Path) -> JournalResult<Self> {
        fs::create_dir_all(dir)?;
        let legs = open_append(&dir.join(LEGS_FILE), &LEGS_HEADER)?;
        let ticks = open_append(&dir.join(TICKS_FILE), &TICKS_HEADER)?;
        debug!(dir = %dir.display(), "journal opened");
        Ok(Self { legs, ticks })
    }
}

fn open_append(path: &Path, header: &[&str]) -> JournalResult<Writer<File>> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let fresh = file.metadata()?.len() == 0;
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
    if fresh {
        writer.write_record(header)?;
        writer.flush()?;
    }
    Ok(writer)
}

fn opt<T: Into<i64>>(value: Option<T>) -> String {
    value.map(|v| v.into().to_string()).unwrap_or_default()
}

impl JournalWriter for CsvJournal {
    fn write_leg_event(&mut self, row: &LegEventRow) -> JournalResult<()> {
        self.legs.write_record(&[
            row.minute.0.to_string(),
            row.transport.get().to_string(),
            row.event.as_str().to_owned(),
            opt(row.node),
            opt(row.connection),
        ])?;
        Ok(())
    }

    fn write_tick(&mut self, row: &TickRow) -> JournalResult<()> {
        self.ticks.write_record(&[
            row.minute.0.to_string(),
            row.delivered.to_string(),
            row.continued.to_string(),
            row.stranded.to_string(),
            row.failed.to_string(),
        ])?;
        Ok(())
    }

    fn flush(&mut self) -> JournalResult<()> {
        self.legs.flush()?;
        self.ticks.flush()?;
        Ok(())
    }
}
