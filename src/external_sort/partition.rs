use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{Phase, Result, SiftError};
use crate::external_sort::chunk::ChunkSink;
use crate::external_sort::constants::SHUTDOWN_CHECK_INTERVAL_LINES;
use crate::external_sort::record::Record;

/// Splits an input stream into buffers whose estimated footprint reaches the
/// memory ceiling, handing each one to a [`ChunkSink`].
pub struct Partitioner {
    memory_ceiling_bytes: usize,
    skip_blank_lines: bool,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

#[derive(Debug)]
pub struct PartitionOutcome<C> {
    pub chunks: Vec<C>,
    pub lines_read: u64,
    pub records_read: u64,
    pub bytes_read: u64,
}

impl Partitioner {
    pub fn new(memory_ceiling_bytes: usize, skip_blank_lines: bool) -> Self {
        Self {
            memory_ceiling_bytes,
            skip_blank_lines,
            shutdown_flag: None,
        }
    }

    pub fn with_shutdown_signal(mut self, shutdown_flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(shutdown_flag);
        self
    }

    pub fn partition<R, S>(&self, mut reader: R, sink: &mut S) -> Result<PartitionOutcome<S::Chunk>>
    where
        R: BufRead,
        S: ChunkSink,
    {
        let mut chunks = Vec::new();
        let mut buffer: Vec<Record> = Vec::new();
        let mut current_size = 0usize;
        let mut lines_read = 0u64;
        let mut records_read = 0u64;
        let mut bytes_read = 0u64;

        let mut line = String::new();
        loop {
            if lines_read % SHUTDOWN_CHECK_INTERVAL_LINES == 0 && self.shutdown_requested() {
                info!("Partitioning interrupted at line {}", lines_read);
                return Err(SiftError::Interrupted { phase: Phase::Partition });
            }

            line.clear();
            let read = reader.read_line(&mut line).map_err(|source| SiftError::InputRead {
                line: lines_read + 1,
                source,
            })?;
            if read == 0 {
                break;
            }
            lines_read += 1;
            bytes_read += read as u64;

            let record = Record::from_line(&line);
            if self.skip_blank_lines && record.is_blank() {
                continue;
            }

            current_size += record.estimated_size();
            buffer.push(record);
            records_read += 1;

            if current_size >= self.memory_ceiling_bytes {
                debug!(
                    "Buffer reached {} bytes ({} records), flushing chunk {}",
                    current_size,
                    buffer.len(),
                    chunks.len()
                );
                chunks.push(sink.write_chunk(std::mem::take(&mut buffer))?);
                current_size = 0;
            }
        }

        if !buffer.is_empty() {
            debug!("Flushing final partial chunk of {} records", buffer.len());
            chunks.push(sink.write_chunk(buffer)?);
        }

        info!(
            "Partitioned {} records from {} lines into {} chunks",
            records_read,
            lines_read,
            chunks.len()
        );

        Ok(PartitionOutcome {
            chunks,
            lines_read,
            records_read,
            bytes_read,
        })
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}
