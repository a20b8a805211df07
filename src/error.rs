//! Error taxonomy for splitting, archiving, extraction and verification.
//!
//! Integrity mismatches are not errors: they are collected into
//! [`IntegrityReport`](crate::integrity::IntegrityReport) so every part is still checked.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the library. Per-part failures are wrapped with the part name by the callers.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Bad path or argument, detected before any work starts.
    #[error("invalid argument: {0}")]
    Validation(String),

    /// A single file or symlink does not fit into an empty part.
    #[error(
        "{} with {size} bytes is larger than the maximum part size of {max_size} bytes",
        .path.display()
    )]
    OversizedEntry {
        path: PathBuf,
        size: u64,
        max_size: u64,
    },

    /// A hash, path or tar listing line could not be parsed.
    #[error("malformed line {line_no} in {origin}: {line:?}")]
    SidecarFormat {
        origin: String,
        line_no: usize,
        line: String,
    },

    /// An external bundler/compressor/encryptor exited unsuccessfully or could not be started.
    #[error("{tool} failed ({status}): {output}")]
    ExternalTool {
        tool: String,
        status: String,
        output: String,
    },

    /// Not enough free space on the target filesystem; checked before writing.
    #[error(
        "not enough space for {operation} in {}: {available} bytes available, {required} required",
        .path.display()
    )]
    DiskSpace {
        operation: &'static str,
        path: PathBuf,
        available: u64,
        required: u64,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

impl ArchiveError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ArchiveError::Validation(msg.into())
    }
}

/// Result alias for library operations that surface [`ArchiveError`].
pub type ArchiveResult<T> = std::result::Result<T, ArchiveError>;
