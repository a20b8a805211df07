//! Discovery of an on-disk archive set from the artifact naming convention.

use log::debug;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::engine::tools::{canonicalize_existing, sort_by_part_name, split_part_name};
use crate::error::{ArchiveError, ArchiveResult};
use crate::sidecar::read_part_count;
use crate::types::PartArtifactChain;
use crate::utils::config::Suffixes;

/// Suffixes that mark a part's main artifact, outermost first.
const ARTIFACT_SUFFIXES: [&str; 3] = [Suffixes::ENCRYPTED, Suffixes::COMPRESSED, Suffixes::BUNDLE];

/// The parts of one archive, in natural part order.
#[derive(Clone, Debug)]
pub struct ArchiveSet {
    pub dir: PathBuf,
    pub basename: String,
    pub parts: Vec<PartArtifactChain>,
    /// Count from `<basename>.parts.txt`, when that file exists.
    pub expected_parts: Option<usize>,
    pub encrypted: bool,
}

/// Part name of an artifact file name, e.g. `data.part2.tar.lz` → `data.part2`.
pub fn artifact_part_name(file_name: &str) -> Option<&str> {
    ARTIFACT_SUFFIXES
        .iter()
        .find_map(|suffix| file_name.strip_suffix(suffix))
        .filter(|name| !name.is_empty())
}

impl ArchiveSet {
    /// Scan an archive directory, or take a single artifact file as a one-part set.
    pub fn discover(path: &Path) -> ArchiveResult<Self> {
        let path = canonicalize_existing(path)?;
        if path.is_file() {
            return Self::from_artifact(&path);
        }

        let mut names = BTreeSet::new();
        let mut encrypted = false;
        for entry in std::fs::read_dir(&path)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if let Some(name) = artifact_part_name(&file_name) {
                encrypted |= file_name.ends_with(Suffixes::ENCRYPTED);
                names.insert(name.to_string());
            }
        }

        let basenames: BTreeSet<&str> = names.iter().map(|n| split_part_name(n).0).collect();
        let basename = match basenames.len() {
            0 => {
                return Err(ArchiveError::validation(format!(
                    "no archive found in {}",
                    path.display()
                )));
            }
            1 => basenames.into_iter().next().unwrap_or_default().to_string(),
            _ => {
                return Err(ArchiveError::validation(format!(
                    "{} holds more than one archive: {}",
                    path.display(),
                    basenames.into_iter().collect::<Vec<_>>().join(", ")
                )));
            }
        };

        let count_file = path.join(format!("{basename}{}", Suffixes::PART_COUNT));
        let expected_parts = if count_file.is_file() {
            Some(read_part_count(&count_file)?)
        } else {
            None
        };

        let mut parts: Vec<PartArtifactChain> = names
            .iter()
            .map(|name| PartArtifactChain::new(&path, name, encrypted))
            .collect();
        sort_by_part_name(&mut parts, |c| c.name.as_str());
        debug!(
            "Found {} part(s) of {basename} in {} (expected {:?})",
            parts.len(),
            path.display(),
            expected_parts
        );

        Ok(ArchiveSet {
            dir: path,
            basename,
            parts,
            expected_parts,
            encrypted,
        })
    }

    fn from_artifact(file: &Path) -> ArchiveResult<Self> {
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = artifact_part_name(&file_name).ok_or_else(|| {
            ArchiveError::validation(format!("not an archive file: {}", file.display()))
        })?;
        let dir = file.parent().unwrap_or(Path::new(".")).to_path_buf();
        let encrypted = file_name.ends_with(Suffixes::ENCRYPTED);
        Ok(ArchiveSet {
            basename: split_part_name(name).0.to_string(),
            parts: vec![PartArtifactChain::new(&dir, name, encrypted)],
            dir,
            expected_parts: None,
            encrypted,
        })
    }

    /// Parts found versus parts recorded. `None` when no count was recorded.
    pub fn is_complete(&self) -> Option<bool> {
        self.expected_parts.map(|n| n == self.parts.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"x").unwrap();
    }

    #[test]
    fn part_names_from_artifacts() {
        assert_eq!(artifact_part_name("d.part2.tar.lz"), Some("d.part2"));
        assert_eq!(artifact_part_name("d.part2.tar.lz.gpg"), Some("d.part2"));
        assert_eq!(artifact_part_name("d.tar"), Some("d"));
        assert_eq!(artifact_part_name("d.tar.lst"), None);
        assert_eq!(artifact_part_name("d.tar.lz.md5"), None);
    }

    #[test]
    fn discovers_parts_in_natural_order() {
        let tmp = tempfile::tempdir().unwrap();
        for i in [10, 2, 1] {
            touch(tmp.path(), &format!("data.part{i}.tar.lz"));
            touch(tmp.path(), &format!("data.part{i}.tar.lz.md5"));
        }
        std::fs::write(tmp.path().join("data.parts.txt"), "11\n").unwrap();

        let set = ArchiveSet::discover(tmp.path()).unwrap();
        assert_eq!(set.basename, "data");
        let names: Vec<&str> = set.parts.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["data.part1", "data.part2", "data.part10"]);
        assert_eq!(set.expected_parts, Some(11));
        assert_eq!(set.is_complete(), Some(false));
        assert!(!set.encrypted);
    }

    #[test]
    fn mixed_archives_are_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "a.part1.tar");
        touch(tmp.path(), "b.part1.tar");
        assert!(matches!(
            ArchiveSet::discover(tmp.path()),
            Err(ArchiveError::Validation(_))
        ));
    }

    #[test]
    fn single_artifact_file() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "data.part3.tar.lz.gpg");
        let set = ArchiveSet::discover(&tmp.path().join("data.part3.tar.lz.gpg")).unwrap();
        assert_eq!(set.parts.len(), 1);
        assert_eq!(set.parts[0].name, "data.part3");
        assert!(set.encrypted);
        assert_eq!(set.expected_parts, None);
    }
}
