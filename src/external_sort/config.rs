use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::constants::{BYTES_PER_KB, BYTES_PER_MB};
use crate::error::{Result, SiftError};
use crate::external_sort::constants::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalSortConfig {
    /// Estimated buffer footprint at which a partition is flushed to a chunk.
    pub memory_ceiling_mb: usize,
    /// Exact ceiling in bytes; takes precedence over `memory_ceiling_mb`.
    pub memory_ceiling_bytes: Option<usize>,
    /// Parent directory for the per-run scratch directory.
    pub temp_directory: PathBuf,
    pub io_buffer_size_kb: usize,
    pub merge_buffer_size_kb: usize,
    pub parallel_sort: bool,
    pub skip_blank_lines: bool,
    pub merge_progress_interval_seconds: u64,
    pub verbose: bool,
}

impl Default for ExternalSortConfig {
    fn default() -> Self {
        Self {
            memory_ceiling_mb: DEFAULT_MEMORY_CEILING_MB,
            memory_ceiling_bytes: None,
            temp_directory: std::env::temp_dir(),
            io_buffer_size_kb: DEFAULT_IO_BUFFER_SIZE_KB,
            merge_buffer_size_kb: DEFAULT_MERGE_BUFFER_SIZE_KB,
            parallel_sort: true,
            skip_blank_lines: false,
            merge_progress_interval_seconds: crate::constants::DEFAULT_PROGRESS_INTERVAL_SECONDS,
            verbose: false,
        }
    }
}

impl ExternalSortConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_file(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn with_memory_ceiling_bytes(mut self, bytes: usize) -> Self {
        self.memory_ceiling_bytes = Some(bytes);
        self
    }

    pub fn with_temp_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_directory = dir.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.memory_ceiling_bytes() == 0 {
            return Err(SiftError::configuration("memory ceiling must be greater than zero"));
        }

        if self.io_buffer_size_kb == 0 || self.io_buffer_size_kb > MAX_IO_BUFFER_SIZE_KB {
            return Err(SiftError::configuration(format!(
                "I/O buffer size must be between 1 and {} KB",
                MAX_IO_BUFFER_SIZE_KB
            )));
        }

        if self.merge_buffer_size_kb == 0 || self.merge_buffer_size_kb > MAX_IO_BUFFER_SIZE_KB {
            return Err(SiftError::configuration(format!(
                "Merge buffer size must be between 1 and {} KB",
                MAX_IO_BUFFER_SIZE_KB
            )));
        }

        if self.temp_directory.as_os_str().is_empty() {
            return Err(SiftError::configuration("temp directory path is empty"));
        }

        if self.temp_directory.exists() && !self.temp_directory.is_dir() {
            return Err(SiftError::configuration(format!(
                "temp directory path is not a directory: {}",
                self.temp_directory.display()
            )));
        }

        if let Some(total) = total_memory_bytes() {
            if self.memory_ceiling_bytes() as u64 > total {
                warn!(
                    "Memory ceiling of {} bytes exceeds total system memory ({} bytes)",
                    self.memory_ceiling_bytes(),
                    total
                );
            }
        }

        Ok(())
    }

    pub fn memory_ceiling_bytes(&self) -> usize {
        self.memory_ceiling_bytes
            .unwrap_or_else(|| self.memory_ceiling_mb.saturating_mul(BYTES_PER_MB))
    }

    pub fn io_buffer_size_bytes(&self) -> usize {
        self.io_buffer_size_kb * BYTES_PER_KB
    }

    pub fn merge_buffer_size_bytes(&self) -> usize {
        self.merge_buffer_size_kb * BYTES_PER_KB
    }
}

fn total_memory_bytes() -> Option<u64> {
    use sysinfo::System;
    let mut system = System::new();
    system.refresh_memory();

    match system.total_memory() {
        0 => None,
        total => Some(total),
    }
}
