use std::time::Duration;

use aerocrawl_core::{CompletionFlag, Record, RecordDrain};
use crawl_logging::{crawl_debug, crawl_error};

use crate::sheet::{SheetError, SheetStore};

/// How long one timed receive waits before re-checking the completion flag.
const RECEIVE_WINDOW: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistStats {
    pub rows_written: u64,
}

/// Drains the record queue into the sheet store and finalizes the book once
/// production has ended.
pub struct Persister<S: SheetStore> {
    drain: RecordDrain,
    done: CompletionFlag,
    store: S,
    with_coordinates: bool,
}

impl<S: SheetStore> Persister<S> {
    /// Prepares the store by creating one section per configured category
    /// ahead of any writes.
    pub fn new(
        drain: RecordDrain,
        done: CompletionFlag,
        mut store: S,
        categories: &[String],
        columns: &[String],
        with_coordinates: bool,
    ) -> Result<Self, SheetError> {
        for category in categories {
            store.ensure_section(category, columns)?;
        }
        Ok(Self {
            drain,
            done,
            store,
            with_coordinates,
        })
    }

    /// Runs until the completion flag is observed, then drains whatever is
    /// still queued and saves the book exactly once. A write failure stops
    /// further appends but the book is still saved best-effort with the rows
    /// accumulated so far.
    pub fn run(mut self) -> Result<PersistStats, SheetError> {
        let mut stats = PersistStats::default();
        let mut failure: Option<SheetError> = None;

        while !self.done.is_complete() {
            if let Some(record) = self.drain.next_within(RECEIVE_WINDOW) {
                if let Err(err) = self.write(record) {
                    failure = Some(err);
                    break;
                }
                stats.rows_written += 1;
            }
        }

        if failure.is_none() {
            // Final drain: catch records enqueued between the last timed
            // receive and the flag flip.
            for record in self.drain.drain_now() {
                if let Err(err) = self.write(record) {
                    failure = Some(err);
                    break;
                }
                stats.rows_written += 1;
            }
        }

        let saved = self.store.save();
        match failure {
            Some(err) => {
                if let Err(save_err) = saved {
                    crawl_error!("best-effort save also failed: {save_err}");
                }
                Err(err)
            }
            None => {
                saved?;
                Ok(stats)
            }
        }
    }

    fn write(&mut self, record: Record) -> Result<(), SheetError> {
        let section = record.category().to_string();
        crawl_debug!("appending '{}' to section '{section}'", record.stub().name);
        self.store
            .append_row(&section, record.into_row(self.with_coordinates))
    }
}
