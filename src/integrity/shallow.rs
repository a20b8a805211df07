//! Shallow check: re-hash each part's outermost artifact and compare with its sidecar.

use log::debug;

use crate::archive_set::ArchiveSet;
use crate::engine::hashing::hash_file;
use crate::engine::parallel::run_bounded;
use crate::sidecar::read_artifact_hash;
use crate::types::PartArtifactChain;

use super::report::{ArtifactStatus, ShallowPart, ShallowReport};

pub fn check_part(chain: &PartArtifactChain) -> ShallowPart {
    let mut part = ShallowPart {
        name: chain.name.clone(),
        artifact: None,
        expected: None,
        actual: None,
        status: ArtifactStatus::Missing,
        error: None,
    };
    let Some((artifact, sidecar)) = chain.outermost() else {
        part.error = Some("no bundle, compressed or encrypted artifact found".to_string());
        return part;
    };
    part.artifact = Some(artifact.to_path_buf());

    let expected = match read_artifact_hash(sidecar) {
        Ok(digest) => digest,
        Err(e) => {
            part.status = ArtifactStatus::Changed;
            part.error = Some(format!("cannot read {}: {e}", sidecar.display()));
            return part;
        }
    };
    match hash_file(artifact) {
        Ok(actual) => {
            part.status = if actual == expected {
                ArtifactStatus::Intact
            } else {
                ArtifactStatus::Changed
            };
            part.actual = Some(actual);
        }
        Err(e) => {
            part.status = ArtifactStatus::Changed;
            part.error = Some(format!("cannot read {}: {e}", artifact.display()));
        }
    }
    part.expected = Some(expected);
    debug!("{}: {:?}", part.name, part.status);
    part
}

/// Check every part of `set` on `threads` workers. Parts come back in natural order.
pub fn shallow_check(set: &ArchiveSet, threads: usize) -> ShallowReport {
    let parts = run_bounded(set.parts.iter().collect::<Vec<_>>(), threads, check_part);
    ShallowReport {
        parts,
        expected_parts: set.expected_parts,
        found_parts: set.parts.len(),
    }
}
