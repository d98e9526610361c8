use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

use crate::error::{Phase, Result, SiftError};
use crate::external_sort::constants::{LINE_SEPARATOR, SHUTDOWN_CHECK_INTERVAL_RECORDS};
use crate::external_sort::cursor::MergeCursor;

/// Heap slot ordered by (current record, cursor id). Exhausted cursors are never inserted.
struct MergeEntry<R> {
    cursor: MergeCursor<R>,
}

impl<R: BufRead> PartialEq for MergeEntry<R> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<R: BufRead> Eq for MergeEntry<R> {}

impl<R: BufRead> PartialOrd for MergeEntry<R> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<R: BufRead> Ord for MergeEntry<R> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cursor
            .current()
            .cmp(&other.cursor.current())
            .then_with(|| self.cursor.id().cmp(&other.cursor.id()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    pub records_written: u64,
    pub duplicates_removed: u64,
    pub fan_in: usize,
}

pub struct KWayMerger {
    progress_interval: Duration,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl KWayMerger {
    pub fn new(progress_interval_seconds: u64) -> Self {
        Self {
            progress_interval: Duration::from_secs(progress_interval_seconds),
            shutdown_flag: None,
        }
    }

    pub fn with_shutdown_signal(mut self, shutdown_flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(shutdown_flag);
        self
    }

    /// Merges sorted, duplicate-free cursors into `output`, emitting each
    /// distinct record once. Every cursor is closed by the time this returns
    /// successfully; on error the remaining ones are dropped.
    pub fn merge<R, W>(&self, cursors: Vec<MergeCursor<R>>, output: &mut W) -> Result<MergeOutcome>
    where
        R: BufRead,
        W: Write,
    {
        let fan_in = cursors.len();
        let mut heap = BinaryHeap::with_capacity(fan_in);
        for cursor in cursors {
            if cursor.is_exhausted() {
                cursor.close();
            } else {
                heap.push(Reverse(MergeEntry { cursor }));
            }
        }

        info!("Merging {} chunks", fan_in);

        let mut last_emitted = String::new();
        let mut emitted_any = false;
        let mut records_written = 0u64;
        let mut duplicates_removed = 0u64;
        let mut steps = 0u64;
        let mut last_progress_time = Instant::now();

        while let Some(Reverse(MergeEntry { mut cursor })) = heap.pop() {
            if steps % SHUTDOWN_CHECK_INTERVAL_RECORDS == 0 && self.shutdown_requested() {
                info!("Merge interrupted after {} records written", records_written);
                return Err(SiftError::Interrupted { phase: Phase::Merge });
            }
            steps += 1;

            let Some(record) = cursor.current() else {
                cursor.close();
                continue;
            };

            if !emitted_any || record != last_emitted {
                output
                    .write_all(record.as_bytes())
                    .and_then(|_| output.write_all(&[LINE_SEPARATOR]))
                    .map_err(|source| SiftError::OutputWrite { source })?;
                last_emitted.clear();
                last_emitted.push_str(record);
                emitted_any = true;
                records_written += 1;
            } else {
                duplicates_removed += 1;
            }

            cursor.advance()?;
            if cursor.is_exhausted() {
                cursor.close();
            } else {
                heap.push(Reverse(MergeEntry { cursor }));
            }

            if last_progress_time.elapsed() >= self.progress_interval {
                info!(
                    "Merge progress: {} unique, {} duplicates removed, {} chunks open",
                    records_written,
                    duplicates_removed,
                    heap.len()
                );
                last_progress_time = Instant::now();
            }
        }

        output
            .flush()
            .map_err(|source| SiftError::OutputWrite { source })?;

        info!(
            "Merge completed: {} unique records, {} cross-chunk duplicates removed",
            records_written, duplicates_removed
        );

        Ok(MergeOutcome {
            records_written,
            duplicates_removed,
            fan_in,
        })
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|flag| flag.load(AtomicOrdering::Relaxed))
    }
}
