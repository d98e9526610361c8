pub const DEFAULT_MEMORY_CEILING_MB: usize = 100;
pub const DEFAULT_IO_BUFFER_SIZE_KB: usize = 64;
pub const DEFAULT_MERGE_BUFFER_SIZE_KB: usize = 64;
pub const OUTPUT_BUFFER_SIZE_KB: usize = 512;

pub const MAX_IO_BUFFER_SIZE_KB: usize = 64 * 1024;

/// Accounted per record on top of its encoded length.
pub const LINE_SEPARATOR_BYTES: usize = 1;
pub const LINE_SEPARATOR: u8 = b'\n';

pub const CHUNK_FILE_PREFIX: &str = "chunk_";
pub const CHUNK_FILE_EXTENSION: &str = ".txt";
pub const TEMP_DIR_PREFIX: &str = "line_sift_";
pub const OUTPUT_STAGING_PREFIX: &str = ".line_sift_output_";

pub const SHUTDOWN_CHECK_INTERVAL_LINES: u64 = 1000;
pub const SHUTDOWN_CHECK_INTERVAL_RECORDS: u64 = 1000;
