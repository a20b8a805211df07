//! Integrity verification of an archive set.
//!
//! The shallow check compares artifact digests and the part count. The deep check extracts every
//! part, diffs its content against the recorded listing, and resolves symlinks across parts.
//! Both are read-only on the archive and give the same answer when repeated.

pub mod deep;
pub mod report;
pub mod shallow;
pub mod symlinks;

use log::info;
use std::path::Path;

use crate::archive_set::ArchiveSet;
use crate::error::ArchiveResult;
use crate::tools::Toolchain;
use crate::types::CheckOpts;

pub use deep::{deep_check, diff_listings, ensure_scratch_capacity, hash_tree};
pub use report::{
    ArtifactStatus, Corrupted, DeepReport, IntegrityReport, ListingWarning, PartDiff, ShallowPart,
    ShallowReport, SymlinkIssue, SymlinkWarning,
};
pub use shallow::shallow_check;
pub use symlinks::{MemberIndex, check_symlinks, resolve_link};

/// Run the shallow check and, with `opts.deep`, the deep check. The deep check runs even when
/// the shallow one already failed. Free scratch space is checked before anything is extracted.
pub fn check_integrity(
    archive: &Path,
    opts: &CheckOpts,
    toolchain: &Toolchain,
) -> ArchiveResult<IntegrityReport> {
    let set = ArchiveSet::discover(archive)?;
    info!(
        "Checking {} part(s) of {} in {}",
        set.parts.len(),
        set.basename,
        set.dir.display()
    );
    if opts.deep {
        ensure_scratch_capacity(&set.parts, toolchain, opts.work_dir.as_deref())?;
    }
    let shallow = shallow_check(&set, opts.threads);
    let deep = if opts.deep {
        let parts = deep_check(&set.parts, toolchain, opts.work_dir.as_deref(), opts.threads);
        let (symlink_warnings, unreadable_listings) = check_symlinks(&set);
        Some(DeepReport {
            parts,
            symlink_warnings,
            unreadable_listings,
        })
    } else {
        None
    };
    Ok(IntegrityReport { shallow, deep })
}
