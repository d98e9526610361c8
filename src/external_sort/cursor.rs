use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::error::{Phase, Result, SiftError};
use crate::external_sort::chunk::ChunkHandle;

/// Forward-only view over one sorted chunk, holding at most one record in memory.
pub struct MergeCursor<R> {
    cursor_id: usize,
    reader: Option<R>,
    current: String,
    exhausted: bool,
    source: Option<PathBuf>,
    delete_on_close: bool,
    records_read: u64,
}

impl MergeCursor<BufReader<File>> {
    /// Opens a chunk file and positions the cursor on its first record.
    pub fn open(cursor_id: usize, chunk: &ChunkHandle, buffer_size: usize) -> Result<Self> {
        let file = File::open(&chunk.file_path)
            .map_err(|e| SiftError::temp_storage(Phase::Merge, &chunk.file_path, e))?;
        let mut cursor = Self::unprimed(cursor_id, BufReader::with_capacity(buffer_size, file));
        cursor.source = Some(chunk.file_path.clone());
        cursor.advance()?;
        Ok(cursor)
    }
}

impl<R: BufRead> MergeCursor<R> {
    pub fn from_reader(cursor_id: usize, reader: R) -> Result<Self> {
        let mut cursor = Self::unprimed(cursor_id, reader);
        cursor.advance()?;
        Ok(cursor)
    }

    fn unprimed(cursor_id: usize, reader: R) -> Self {
        Self {
            cursor_id,
            reader: Some(reader),
            current: String::new(),
            exhausted: false,
            source: None,
            delete_on_close: false,
            records_read: 0,
        }
    }

    /// Removes the backing chunk file when the cursor is closed.
    pub fn delete_on_close(mut self, enabled: bool) -> Self {
        self.delete_on_close = enabled;
        self
    }

    pub fn id(&self) -> usize {
        self.cursor_id
    }

    pub fn current(&self) -> Option<&str> {
        if self.exhausted {
            None
        } else {
            Some(&self.current)
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    pub fn advance(&mut self) -> Result<()> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(());
        };

        self.current.clear();
        let read = reader.read_line(&mut self.current).map_err(|e| {
            SiftError::temp_storage(Phase::Merge, self.source.clone().unwrap_or_default(), e)
        })?;

        if read == 0 {
            self.exhausted = true;
            self.reader = None;
            return Ok(());
        }

        // Chunks are written with a bare `\n`; a preceding `\r` is record content.
        if self.current.ends_with('\n') {
            self.current.pop();
        }
        self.records_read += 1;
        Ok(())
    }

    /// Releases the reader and, when requested, the chunk file behind it.
    pub fn close(mut self) {
        self.reader = None;

        let Some(path) = self.source.take() else {
            return;
        };
        if !self.delete_on_close {
            return;
        }

        match std::fs::remove_file(&path) {
            Ok(()) => debug!(
                "Consumed chunk {} ({} records), removed {}",
                self.cursor_id,
                self.records_read,
                path.display()
            ),
            Err(e) => warn!("Failed to remove chunk file {}: {}", path.display(), e),
        }
    }
}
