// External sort-merge deduplication engine
pub mod external_sort;

pub mod constants;
pub mod error;
pub mod utils;

// Re-export main types for convenience
pub use error::{Phase, SiftError};
pub use external_sort::{ExternalSortConfig, ExternalSortProcessor, ExternalSortStats};
