pub mod chunk;
pub mod config;
pub mod constants;
pub mod cursor;
pub mod merger;
pub mod partition;
pub mod processor;
pub mod record;
pub mod workspace;


pub use chunk::{ChunkHandle, ChunkSink, ChunkWriter};
pub use config::ExternalSortConfig;
pub use cursor::MergeCursor;
pub use merger::{KWayMerger, MergeOutcome};
pub use partition::{PartitionOutcome, Partitioner};
pub use processor::ExternalSortProcessor;
pub use record::Record;
pub use workspace::Workspace;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalSortStats {
    pub total_records: u64,
    pub unique_records: u64,
    pub duplicates_removed: u64,
    /// Duplicates that only met during the merge, i.e. spanned chunks.
    pub cross_chunk_duplicates: u64,
    pub chunks_created: usize,
    pub merge_fan_in: usize,
    pub input_bytes: u64,
    pub partition_time_ms: u64,
    pub merge_time_ms: u64,
    pub processing_time_ms: u64,
}

/// Runs the blocking pipeline off the async executor.
pub async fn sort_and_deduplicate(
    input_file: PathBuf,
    output_file: PathBuf,
    config: ExternalSortConfig,
    shutdown_flag: Option<Arc<AtomicBool>>,
) -> Result<ExternalSortStats> {
    let mut processor = ExternalSortProcessor::new(config)?;
    if let Some(flag) = shutdown_flag {
        processor = processor.with_shutdown_signal(flag);
    }

    let stats = tokio::task::spawn_blocking(move || processor.run(&input_file, &output_file))
        .await
        .context("deduplication task panicked")??;
    Ok(stats)
}
