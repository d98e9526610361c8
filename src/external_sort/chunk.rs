use rayon::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use tracing::debug;

use crate::error::{Phase, Result, SiftError};
use crate::external_sort::constants::LINE_SEPARATOR;
use crate::external_sort::record::Record;
use crate::external_sort::workspace::Workspace;

/// A sorted, duplicate-free chunk persisted in the run's workspace.
#[derive(Debug, Clone)]
pub struct ChunkHandle {
    pub chunk_id: usize,
    pub file_path: PathBuf,
    pub record_count: usize,
    pub file_size_bytes: u64,
}

/// Destination for the buffers the partitioner flushes.
pub trait ChunkSink {
    type Chunk;

    fn write_chunk(&mut self, records: Vec<Record>) -> Result<Self::Chunk>;
}

/// Sorts a buffer in place and collapses equal neighbours, leaving it strictly increasing.
pub fn sort_and_dedup(records: &mut Vec<Record>, parallel: bool) {
    if parallel {
        records.par_sort_unstable();
    } else {
        records.sort_unstable();
    }
    records.dedup();
}

pub struct ChunkWriter<'a> {
    workspace: &'a mut Workspace,
    io_buffer_size: usize,
    parallel_sort: bool,
}

impl<'a> ChunkWriter<'a> {
    pub fn new(workspace: &'a mut Workspace, io_buffer_size: usize, parallel_sort: bool) -> Self {
        Self {
            workspace,
            io_buffer_size,
            parallel_sort,
        }
    }
}

impl ChunkSink for ChunkWriter<'_> {
    type Chunk = ChunkHandle;

    fn write_chunk(&mut self, mut records: Vec<Record>) -> Result<ChunkHandle> {
        let buffered = records.len();
        sort_and_dedup(&mut records, self.parallel_sort);

        let (chunk_id, chunk_path, file) = self.workspace.create_chunk_file()?;
        let to_storage_error = |e| SiftError::temp_storage(Phase::Partition, &chunk_path, e);

        let mut writer = BufWriter::with_capacity(self.io_buffer_size, file);
        for record in &records {
            writer.write_all(record.as_str().as_bytes()).map_err(to_storage_error)?;
            writer.write_all(&[LINE_SEPARATOR]).map_err(to_storage_error)?;
        }
        writer.flush().map_err(to_storage_error)?;

        let file_size_bytes = writer
            .get_ref()
            .metadata()
            .map_err(to_storage_error)?
            .len();

        debug!(
            "Wrote chunk {}: {} records ({} buffered) to {}",
            chunk_id,
            records.len(),
            buffered,
            chunk_path.display()
        );

        Ok(ChunkHandle {
            chunk_id,
            record_count: records.len(),
            file_size_bytes,
            file_path: chunk_path,
        })
    }
}

/// Loads a whole chunk. Only meant for inspection; the merger streams chunks through cursors.
pub fn read_chunk_records(chunk: &ChunkHandle) -> Result<Vec<Record>> {
    let to_storage_error = |e| SiftError::temp_storage(Phase::Merge, &chunk.file_path, e);
    let file = File::open(&chunk.file_path).map_err(to_storage_error)?;
    let mut reader = BufReader::new(file);

    let mut records = Vec::with_capacity(chunk.record_count);
    let mut line = String::new();
    while reader.read_line(&mut line).map_err(to_storage_error)? > 0 {
        records.push(Record::from_line(&line));
        line.clear();
    }
    Ok(records)
}
