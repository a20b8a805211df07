//! Parchiver: split large directory trees into size-bounded parts, archive each part with
//! external tools and verify the resulting archive set.

pub mod archive_set;
pub mod encryption;
pub mod engine;
pub mod error;
pub mod extract;
pub mod integrity;
pub mod listing;
pub mod pipeline;
pub mod sidecar;
pub mod splitter;
pub mod tools;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

pub use archive_set::ArchiveSet;
pub use encryption::{decrypt_archive, encrypt_archive};
pub use error::{ArchiveError, ArchiveResult};
pub use extract::extract_archive;
pub use integrity::{IntegrityReport, check_integrity};
pub use listing::{list_archive, relevant_parts};
pub use pipeline::{PipelineSummary, archive, compress_bundles, create_bundles, create_filelists};
pub use splitter::{DirectorySplitter, split_directory};
pub use tools::Toolchain;
