//! Printing the recorded bundler listings and finding the parts that hold a path.

use log::warn;
use std::io::Write;
use std::path::Path;

use crate::archive_set::ArchiveSet;
use crate::error::ArchiveResult;
use crate::sidecar::read_tar_listing;
use crate::types::PartArtifactChain;

/// Write every part's stored `.tar.lst`, in part order. With `filter`, only lines containing it.
pub fn list_archive<W: Write>(set: &ArchiveSet, filter: Option<&str>, mut out: W) -> ArchiveResult<()> {
    for chain in &set.parts {
        if !chain.bundle_listing.is_file() {
            warn!("{}: no listing at {}", chain.name, chain.bundle_listing.display());
            continue;
        }
        let text = std::fs::read_to_string(&chain.bundle_listing)?;
        for line in text.lines() {
            if filter.is_none_or(|f| line.contains(f)) {
                writeln!(out, "{line}")?;
            }
        }
    }
    out.flush()?;
    Ok(())
}

/// Whether a listed member path lies at or below `subpath` (component-wise).
pub fn member_under(member: &str, subpath: &Path) -> bool {
    Path::new(member.trim_end_matches('/')).starts_with(subpath)
}

/// The parts whose listing holds `subpath` or anything below it.
pub fn relevant_parts(set: &ArchiveSet, subpath: &Path) -> ArchiveResult<Vec<PartArtifactChain>> {
    let mut out = Vec::new();
    for chain in &set.parts {
        if !chain.bundle_listing.is_file() {
            warn!("{}: no listing, skipping", chain.name);
            continue;
        }
        let entries = read_tar_listing(&chain.bundle_listing)?;
        if entries.iter().any(|e| member_under(&e.path, subpath)) {
            out.push(chain.clone());
        }
    }
    Ok(out)
}
