//! Deep check: extract each part into a throwaway directory and diff its content against the
//! recorded hash listing.

use log::debug;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::engine::hashing::hash_path;
use crate::engine::parallel::run_bounded;
use crate::engine::tools::{path_relative_to, path_to_sidecar_string};
use crate::error::ArchiveResult;
use crate::extract::{extract_part, unpackable, unpacked_size};
use crate::sidecar::{HashListing, read_hash_listing};
use crate::tools::Toolchain;
use crate::types::PartArtifactChain;
use crate::utils::config::PackagePaths;
use crate::utils::disk_space::ensure_capacity;

use super::report::{Corrupted, PartDiff};

/// Hash every file and symlink below `root`, keyed by path relative to `root`.
pub fn hash_tree(root: &Path) -> ArchiveResult<HashListing> {
    let mut listing = HashListing::new();
    for entry in WalkDir::new(root).follow_links(false).min_depth(1) {
        let entry = entry?;
        if entry.file_type().is_dir() {
            continue;
        }
        let rel = path_relative_to(entry.path(), root).unwrap_or_else(|| entry.path().to_path_buf());
        listing.insert(path_to_sidecar_string(&rel), hash_path(entry.path())?);
    }
    Ok(listing)
}

/// Compare recorded and actual listings.
pub fn diff_listings(name: &str, expected: &HashListing, actual: &HashListing) -> PartDiff {
    let mut diff = PartDiff::new(name);
    for (path, digest) in expected {
        match actual.get(path) {
            None => diff.missing.push(path.clone()),
            Some(found) if found != digest => diff.corrupted.push(Corrupted {
                path: path.clone(),
                expected: digest.clone(),
                actual: found.clone(),
            }),
            Some(_) => {}
        }
    }
    diff.unexpected = actual
        .keys()
        .filter(|p| !expected.contains_key(*p))
        .cloned()
        .collect();
    diff
}

fn scratch_dir(parent: Option<&Path>) -> ArchiveResult<tempfile::TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(PackagePaths::get().scratch_prefix());
    Ok(match parent {
        Some(dir) => builder.tempdir_in(dir)?,
        None => builder.tempdir()?,
    })
}

fn extract_and_hash(
    chain: &PartArtifactChain,
    toolchain: &Toolchain,
    scratch: &Path,
    threads: usize,
) -> ArchiveResult<HashListing> {
    let content = scratch.join("content");
    std::fs::create_dir(&content)?;
    extract_part(chain, toolchain, scratch, &content, threads)?;
    hash_tree(&content)
}

/// Bytes the scratch area holds while `chain` is checked: the decrypted file for an encrypted
/// part, the unpacked content otherwise.
pub fn scratch_bytes(chain: &PartArtifactChain, toolchain: &Toolchain) -> ArchiveResult<u64> {
    if let Some(encrypted) = chain.encrypted.as_ref().filter(|p| p.is_file()) {
        return Ok(fs::metadata(encrypted)?.len());
    }
    unpacked_size(&unpackable(chain, None)?, toolchain)
}

/// Fail with a disk space error unless the scratch parent can hold every part at once.
/// Parts whose size cannot be determined are left out; their extraction fails on its own later.
pub fn ensure_scratch_capacity(
    parts: &[PartArtifactChain],
    toolchain: &Toolchain,
    work_dir: Option<&Path>,
) -> ArchiveResult<()> {
    let mut needed = 0u64;
    for chain in parts {
        match scratch_bytes(chain, toolchain) {
            Ok(bytes) => needed = needed.saturating_add(bytes),
            Err(e) => debug!("{}: size unknown: {e}", chain.name),
        }
    }
    let parent = work_dir.map_or_else(std::env::temp_dir, Path::to_path_buf);
    ensure_capacity("deep check", &parent, needed)
}

/// Deep-check one part. Extraction problems are recorded in the diff, not returned.
pub fn check_part(
    chain: &PartArtifactChain,
    toolchain: &Toolchain,
    work_dir: Option<&Path>,
    threads: usize,
) -> PartDiff {
    let failed = |msg: String| PartDiff {
        extraction_error: Some(msg),
        ..PartDiff::new(&chain.name)
    };
    let expected = match read_hash_listing(&chain.hash_listing) {
        Ok(listing) => listing,
        Err(e) => return failed(format!("cannot read {}: {e}", chain.hash_listing.display())),
    };
    let scratch = match scratch_dir(work_dir) {
        Ok(dir) => dir,
        Err(e) => return failed(e.to_string()),
    };
    debug!("{}: extracting into {}", chain.name, scratch.path().display());
    match extract_and_hash(chain, toolchain, scratch.path(), threads) {
        Ok(actual) => diff_listings(&chain.name, &expected, &actual),
        Err(e) => failed(e.to_string()),
    }
}

/// Deep-check every part on `threads` workers, each extraction single-threaded.
pub fn deep_check(
    parts: &[PartArtifactChain],
    toolchain: &Toolchain,
    work_dir: Option<&Path>,
    threads: usize,
) -> Vec<PartDiff> {
    run_bounded(parts.iter().collect::<Vec<_>>(), threads, |chain| {
        check_part(chain, toolchain, work_dir, 1)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(pairs: &[(&str, &str)]) -> HashListing {
        pairs
            .iter()
            .map(|(p, d)| (p.to_string(), d.to_string()))
            .collect()
    }

    #[test]
    fn diff_reports_each_kind() {
        let expected = listing(&[("r/a", "1"), ("r/b", "2"), ("r/c", "3")]);
        let actual = listing(&[("r/a", "1"), ("r/b", "x"), ("r/d", "4")]);
        let diff = diff_listings("p", &expected, &actual);
        assert_eq!(diff.missing, ["r/c"]);
        assert_eq!(diff.unexpected, ["r/d"]);
        assert_eq!(
            diff.corrupted,
            [Corrupted {
                path: "r/b".into(),
                expected: "2".into(),
                actual: "x".into(),
            }]
        );
        assert!(!diff.passed());
        assert!(diff_listings("p", &expected, &expected).passed());
    }

    #[test]
    fn tree_hashing_uses_relative_paths() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("r/sub")).unwrap();
        std::fs::write(tmp.path().join("r/sub/f"), b"abc").unwrap();
        let tree = hash_tree(tmp.path()).unwrap();
        assert_eq!(
            tree.get("r/sub/f").map(String::as_str),
            Some("900150983cd24fb0d6963f7d28e17f72")
        );
        assert_eq!(tree.len(), 1);
    }
}
