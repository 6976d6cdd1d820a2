//! Error taxonomy for the durability subsystem.
//!
//! Each layer gets its own small enum with a manual `Display`/`Error`
//! impl (no derive-macro error crate, matching the rest of the tree).
//! `CoreError` is the union the store surfaces to its caller; the HTTP
//! adapter maps it onto a status code.

use std::fmt;
use std::io;

/// Errors from the superblock manager.
#[derive(Debug)]
pub enum SuperblockError {
    Io(io::Error),
    /// Checksum didn't match on a normal-startup read.
    Corrupt,
}

impl fmt::Display for SuperblockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuperblockError::Io(e) => write!(f, "superblock I/O error: {}", e),
            SuperblockError::Corrupt => write!(f, "superblock checksum invalid"),
        }
    }
}

impl std::error::Error for SuperblockError {}

impl From<io::Error> for SuperblockError {
    fn from(e: io::Error) -> Self {
        SuperblockError::Io(e)
    }
}

/// Errors from the log manager.
#[derive(Debug)]
pub enum LogError {
    Io(io::Error),
    /// `tail == MAX_BLOCKS`; the mutation was not appended and must not
    /// be applied to the in-memory graph.
    Full,
}

impl fmt::Display for LogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogError::Io(e) => write!(f, "log I/O error: {}", e),
            LogError::Full => write!(f, "log region is full"),
        }
    }
}

impl std::error::Error for LogError {}

impl From<io::Error> for LogError {
    fn from(e: io::Error) -> Self {
        LogError::Io(e)
    }
}

/// Errors from the checkpoint manager.
#[derive(Debug)]
pub enum CheckpointError {
    Io(io::Error),
    /// Read was short, or post-load node/edge counts disagreed with the
    /// on-disk header.
    Truncated,
    /// Serialized image would not fit in `CHECKPOINT_REGION_SIZE`.
    TooLarge { nsize: u64, esize: u64 },
}

impl fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckpointError::Io(e) => write!(f, "checkpoint I/O error: {}", e),
            CheckpointError::Truncated => write!(f, "checkpoint image truncated or inconsistent"),
            CheckpointError::TooLarge { nsize, esize } => write!(
                f,
                "checkpoint image too large for checkpoint region (nsize={}, esize={})",
                nsize, esize
            ),
        }
    }
}

impl std::error::Error for CheckpointError {}

impl From<io::Error> for CheckpointError {
    fn from(e: io::Error) -> Self {
        CheckpointError::Io(e)
    }
}

/// Semantic codes the graph store returns for a mutation. Not an error
/// in the Rust sense — these are the §4.4 "result" contracts, carried
/// through `Store` so the adapter can map them to HTTP statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// 200: mutation applied.
    Applied,
    /// 204: semantically redundant (vertex present, edge present/absent).
    NoOp,
    /// 400: validation failed at the graph boundary (self-loop, missing endpoint).
    BadRequest,
}

/// Top-level error returned by `Store` operations that touch the device.
#[derive(Debug)]
pub enum CoreError {
    Superblock(SuperblockError),
    Log(LogError),
    Checkpoint(CheckpointError),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::Superblock(e) => write!(f, "{}", e),
            CoreError::Log(e) => write!(f, "{}", e),
            CoreError::Checkpoint(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<SuperblockError> for CoreError {
    fn from(e: SuperblockError) -> Self {
        CoreError::Superblock(e)
    }
}

impl From<LogError> for CoreError {
    fn from(e: LogError) -> Self {
        CoreError::Log(e)
    }
}

impl From<CheckpointError> for CoreError {
    fn from(e: CheckpointError) -> Self {
        CoreError::Checkpoint(e)
    }
}

impl CoreError {
    /// True when this is specifically a full log, which the adapter
    /// surfaces as `507` rather than `500`.
    pub fn is_log_full(&self) -> bool {
        matches!(self, CoreError::Log(LogError::Full))
    }
}
