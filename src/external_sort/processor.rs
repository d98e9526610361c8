use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::constants::BYTES_PER_KB;
use crate::error::{Result, SiftError};
use crate::external_sort::chunk::ChunkWriter;
use crate::external_sort::constants::*;
use crate::external_sort::cursor::MergeCursor;
use crate::external_sort::merger::KWayMerger;
use crate::external_sort::partition::Partitioner;
use crate::external_sort::workspace::Workspace;
use crate::external_sort::{ExternalSortConfig, ExternalSortStats};

/// Runs partition, merge and cleanup for one input.
pub struct ExternalSortProcessor {
    config: ExternalSortConfig,
    shutdown_flag: Arc<AtomicBool>,
}

impl ExternalSortProcessor {
    pub fn new(config: ExternalSortConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            shutdown_flag: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn with_shutdown_signal(mut self, shutdown_flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = shutdown_flag;
        self
    }

    /// Deduplicates `input_path` into `output_path`. The output is staged next
    /// to its destination and only renamed into place once the merge succeeds.
    pub fn run(&self, input_path: &Path, output_path: &Path) -> Result<ExternalSortStats> {
        info!(
            "Deduplicating {} into {}",
            input_path.display(),
            output_path.display()
        );

        let input = File::open(input_path).map_err(|source| SiftError::InputRead { line: 0, source })?;
        let reader = BufReader::with_capacity(self.config.io_buffer_size_bytes(), input);

        let output_dir = match output_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let staged = tempfile::Builder::new()
            .prefix(OUTPUT_STAGING_PREFIX)
            .tempfile_in(output_dir)
            .map_err(|source| SiftError::OutputWrite { source })?;
        let mut writer = BufWriter::with_capacity(OUTPUT_BUFFER_SIZE_KB * BYTES_PER_KB, staged);

        let stats = self.run_streams(reader, &mut writer)?;

        let staged = writer
            .into_inner()
            .map_err(|e| SiftError::OutputWrite { source: e.into_error() })?;
        staged
            .persist(output_path)
            .map_err(|e| SiftError::OutputWrite { source: e.error })?;

        Ok(stats)
    }

    /// Same pipeline over arbitrary streams. `output` is flushed but left open.
    pub fn run_streams<R, W>(&self, input: R, output: &mut W) -> Result<ExternalSortStats>
    where
        R: BufRead,
        W: Write,
    {
        let start_time = Instant::now();
        let mut workspace = Workspace::create(&self.config.temp_directory)?;

        info!(
            "Partitioning with a {} byte memory ceiling, staging chunks in {}",
            self.config.memory_ceiling_bytes(),
            workspace.path().display()
        );

        let partitioner = Partitioner::new(
            self.config.memory_ceiling_bytes(),
            self.config.skip_blank_lines,
        )
        .with_shutdown_signal(self.shutdown_flag.clone());

        let partition = {
            let mut chunk_writer = ChunkWriter::new(
                &mut workspace,
                self.config.io_buffer_size_bytes(),
                self.config.parallel_sort,
            );
            partitioner.partition(input, &mut chunk_writer)?
        };
        let partition_time = start_time.elapsed();

        let merge_start = Instant::now();
        let cursors = partition
            .chunks
            .iter()
            .enumerate()
            .map(|(cursor_id, chunk)| {
                MergeCursor::open(cursor_id, chunk, self.config.merge_buffer_size_bytes())
                    .map(|cursor| cursor.delete_on_close(true))
            })
            .collect::<Result<Vec<_>>>()?;

        let merger = KWayMerger::new(self.config.merge_progress_interval_seconds)
            .with_shutdown_signal(self.shutdown_flag.clone());
        let merge = merger.merge(cursors, output)?;
        let merge_time = merge_start.elapsed();

        workspace.release();

        let stats = ExternalSortStats {
            total_records: partition.records_read,
            unique_records: merge.records_written,
            duplicates_removed: partition.records_read.saturating_sub(merge.records_written),
            cross_chunk_duplicates: merge.duplicates_removed,
            chunks_created: partition.chunks.len(),
            merge_fan_in: merge.fan_in,
            input_bytes: partition.bytes_read,
            partition_time_ms: partition_time.as_millis() as u64,
            merge_time_ms: merge_time.as_millis() as u64,
            processing_time_ms: start_time.elapsed().as_millis() as u64,
        };

        info!(
            "Run finished: {} records in, {} unique out, {} chunks",
            stats.total_records, stats.unique_records, stats.chunks_created
        );

        Ok(stats)
    }
}
