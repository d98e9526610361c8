use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

use crate::error::{Phase, Result, SiftError};
use crate::external_sort::constants::*;

/// Scratch directory owned by exactly one run. Removed on `release` or drop,
/// whichever comes first; removal failures are logged, never raised.
pub struct Workspace {
    dir: Option<TempDir>,
    path: PathBuf,
    next_chunk_id: usize,
}

impl Workspace {
    pub fn create(parent: &Path) -> Result<Self> {
        std::fs::create_dir_all(parent)
            .map_err(|e| SiftError::temp_storage(Phase::Setup, parent, e))?;

        let dir = tempfile::Builder::new()
            .prefix(TEMP_DIR_PREFIX)
            .tempdir_in(parent)
            .map_err(|e| SiftError::temp_storage(Phase::Setup, parent, e))?;

        let path = dir.path().to_path_buf();
        debug!("Created scratch directory {}", path.display());

        Ok(Self {
            dir: Some(dir),
            path,
            next_chunk_id: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Allocates the next chunk file. Fails if the name is already taken.
    pub fn create_chunk_file(&mut self) -> Result<(usize, PathBuf, File)> {
        let chunk_id = self.next_chunk_id;
        let chunk_path = self.path.join(format!(
            "{}{}{}",
            CHUNK_FILE_PREFIX, chunk_id, CHUNK_FILE_EXTENSION
        ));

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&chunk_path)
            .map_err(|e| SiftError::temp_storage(Phase::Partition, &chunk_path, e))?;

        self.next_chunk_id += 1;
        Ok((chunk_id, chunk_path, file))
    }

    pub fn chunks_allocated(&self) -> usize {
        self.next_chunk_id
    }

    pub fn release(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if let Some(dir) = self.dir.take() {
            match dir.close() {
                Ok(()) => debug!("Removed scratch directory {}", self.path.display()),
                Err(e) => warn!(
                    "Failed to remove scratch directory {}: {}",
                    self.path.display(),
                    e
                ),
            }
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.remove();
    }
}
