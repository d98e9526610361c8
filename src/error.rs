use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Stage of a run an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Setup,
    Partition,
    Merge,
    Cleanup,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Setup => "setup",
            Phase::Partition => "partition",
            Phase::Merge => "merge",
            Phase::Cleanup => "cleanup",
        };
        f.write_str(name)
    }
}

/// Fatal conditions surfaced by a deduplication run.
#[derive(Error, Debug)]
pub enum SiftError {
    #[error("invalid configuration: {message}")]
    Configuration { message: String },

    #[error("failed to read input at line {line}: {source}")]
    InputRead {
        line: u64,
        #[source]
        source: io::Error,
    },

    #[error("temporary storage failure during {phase} at {}: {source}", .path.display())]
    TempStorage {
        phase: Phase,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write output: {source}")]
    OutputWrite {
        #[source]
        source: io::Error,
    },

    #[error("run interrupted during {phase}")]
    Interrupted { phase: Phase },
}

impl SiftError {
    pub fn configuration(message: impl Into<String>) -> Self {
        SiftError::Configuration { message: message.into() }
    }

    pub fn temp_storage(phase: Phase, path: impl Into<PathBuf>, source: io::Error) -> Self {
        SiftError::TempStorage {
            phase,
            path: path.into(),
            source,
        }
    }

    /// Phase the error belongs to. Configuration problems are caught before any I/O.
    pub fn phase(&self) -> Phase {
        match self {
            SiftError::Configuration { .. } => Phase::Setup,
            SiftError::InputRead { .. } => Phase::Partition,
            SiftError::TempStorage { phase, .. } => *phase,
            SiftError::OutputWrite { .. } => Phase::Merge,
            SiftError::Interrupted { phase } => *phase,
        }
    }
}

pub type Result<T> = std::result::Result<T, SiftError>;
