//! Archiving pipeline: context, per-part stages, orchestration, outcome reporting.

pub mod context;
pub mod error_handler;
pub mod orchestrator;
pub mod stages;

pub use context::PipelineContext;
pub use error_handler::{PartOutcome, PipelineSummary, report_part_failures};
pub use orchestrator::{
    archive, compress_bundles, create_bundles, create_filelists, plan_parts, prepare_archive,
    recorded_part_names,
};
pub use stages::{
    SymlinkConcern, audit_symlink, bundle_part, compress_part, encrypt_part, run_part,
    write_filelists,
};
