//! Cross-part symlink resolution over the recorded listings.
//!
//! A link may point at a file that went into another part, so targets are looked up in the union
//! of every part's members rather than in the link's own part.

use log::warn;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::archive_set::ArchiveSet;
use crate::engine::tools::{normalize_lexically, path_to_sidecar_string};
use crate::sidecar::{read_path_listing, read_tar_listing};
use crate::types::{PartArtifactChain, TarListingEntry};

use super::report::{ListingWarning, SymlinkIssue, SymlinkWarning};

fn member_key(path: &str) -> String {
    path.trim_end_matches('/').to_string()
}

/// Every recorded member path (ancestors included) and every symlink (path → raw target) of a set.
#[derive(Debug, Default)]
pub struct MemberIndex {
    pub members: BTreeSet<String>,
    pub links: BTreeMap<String, String>,
    pub unreadable: Vec<ListingWarning>,
}

impl MemberIndex {
    fn insert_member(&mut self, path: &str) {
        let key = member_key(path);
        for ancestor in Path::new(&key).ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            if !self.members.insert(path_to_sidecar_string(ancestor)) {
                break;
            }
        }
        self.members.insert(key);
    }

    fn skip(&mut self, chain: &PartArtifactChain, listing: &Path, error: String) {
        warn!("{}: cannot read {}: {error}", chain.name, listing.display());
        self.unreadable.push(ListingWarning {
            part: chain.name.clone(),
            listing: listing.to_path_buf(),
            error,
        });
    }

    fn add_bundle_listing(&mut self, entries: Vec<TarListingEntry>) {
        for entry in entries {
            if entry.permissions.starts_with('l')
                && let Some(target) = entry.link_target
            {
                self.links.insert(member_key(&entry.path), target);
            }
            self.insert_member(&entry.path);
        }
    }
}

/// Build the member index of `set`. A listing that cannot be read is skipped and recorded in
/// [`MemberIndex::unreadable`]; the other parts are still indexed.
pub fn collect_members(set: &ArchiveSet) -> MemberIndex {
    let mut index = MemberIndex::default();
    for chain in &set.parts {
        if chain.path_listing.is_file() {
            match read_path_listing(&chain.path_listing) {
                Ok(paths) => paths.iter().for_each(|p| index.insert_member(p)),
                Err(e) => index.skip(chain, &chain.path_listing, e.to_string()),
            }
        }
        if chain.bundle_listing.is_file() {
            match read_tar_listing(&chain.bundle_listing) {
                Ok(entries) => index.add_bundle_listing(entries),
                Err(e) => index.skip(chain, &chain.bundle_listing, e.to_string()),
            }
        } else {
            warn!("{}: no listing, its symlinks are not checked", chain.name);
        }
    }
    index
}

/// Resolve one link against the member set. `None` when the target is a member.
pub fn resolve_link(link: &str, target: &str, members: &BTreeSet<String>) -> Option<SymlinkIssue> {
    let target_path = Path::new(target);
    if target_path.is_absolute() {
        return Some(SymlinkIssue::Absolute);
    }
    let parent = Path::new(link).parent().unwrap_or(Path::new(""));
    let Some(resolved) = normalize_lexically(&parent.join(target_path)) else {
        return Some(SymlinkIssue::EscapesRoot);
    };
    let key = member_key(&path_to_sidecar_string(&resolved));
    if members.contains(&key) {
        None
    } else {
        Some(SymlinkIssue::Unresolved)
    }
}

/// Warnings for every recorded symlink whose target cannot be found in any part, plus the
/// listings that had to be skipped.
pub fn check_symlinks(set: &ArchiveSet) -> (Vec<SymlinkWarning>, Vec<ListingWarning>) {
    let MemberIndex {
        members,
        links,
        unreadable,
    } = collect_members(set);
    let warnings = links
        .into_iter()
        .filter_map(|(link, target)| {
            resolve_link(&link, &target, &members).map(|issue| SymlinkWarning {
                link,
                target,
                issue,
            })
        })
        .collect();
    (warnings, unreadable)
}
