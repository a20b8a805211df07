//! Integrity check results. Mismatches are data, not errors: every part is always checked.

use log::{error, info, warn};
use serde::Serialize;
use std::path::PathBuf;

use crate::utils::Colors;

/// Shallow verdict for one part's outermost artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactStatus {
    Intact,
    Changed,
    /// Neither the artifact nor a readable sidecar was found.
    Missing,
}

#[derive(Clone, Debug, Serialize)]
pub struct ShallowPart {
    pub name: String,
    pub artifact: Option<PathBuf>,
    pub expected: Option<String>,
    pub actual: Option<String>,
    pub status: ArtifactStatus,
    /// Why the digest could not be compared (unreadable sidecar, I/O error).
    pub error: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ShallowReport {
    pub parts: Vec<ShallowPart>,
    pub expected_parts: Option<usize>,
    pub found_parts: usize,
}

impl ShallowReport {
    /// Fewer (or more) parts on disk than recorded in the part-count file.
    pub fn files_missing(&self) -> bool {
        self.expected_parts.is_some_and(|n| n != self.found_parts)
    }

    pub fn changed(&self) -> impl Iterator<Item = &ShallowPart> {
        self.parts
            .iter()
            .filter(|p| p.status != ArtifactStatus::Intact)
    }

    pub fn passed(&self) -> bool {
        !self.files_missing() && self.changed().next().is_none()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Corrupted {
    pub path: String,
    pub expected: String,
    pub actual: String,
}

/// Deep verdict for one part: recorded content listing versus the extracted tree.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PartDiff {
    pub name: String,
    pub unexpected: Vec<String>,
    pub missing: Vec<String>,
    pub corrupted: Vec<Corrupted>,
    pub extraction_error: Option<String>,
}

impl PartDiff {
    pub fn new(name: impl Into<String>) -> Self {
        PartDiff {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn passed(&self) -> bool {
        self.unexpected.is_empty()
            && self.missing.is_empty()
            && self.corrupted.is_empty()
            && self.extraction_error.is_none()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SymlinkIssue {
    /// Absolute targets are not checked against the archive.
    Absolute,
    /// Relative target climbs above the archive root.
    EscapesRoot,
    /// Relative target found in no part.
    Unresolved,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SymlinkWarning {
    pub link: String,
    pub target: String,
    pub issue: SymlinkIssue,
}

/// A part listing the symlink pass had to skip.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ListingWarning {
    pub part: String,
    pub listing: PathBuf,
    pub error: String,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct DeepReport {
    pub parts: Vec<PartDiff>,
    /// Reported only; never affects the verdict.
    pub symlink_warnings: Vec<SymlinkWarning>,
    /// Reported only; links recorded in these listings were not checked.
    pub unreadable_listings: Vec<ListingWarning>,
}

impl DeepReport {
    pub fn passed(&self) -> bool {
        self.parts.iter().all(PartDiff::passed)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct IntegrityReport {
    pub shallow: ShallowReport,
    pub deep: Option<DeepReport>,
}

impl IntegrityReport {
    pub fn passed(&self) -> bool {
        self.shallow.passed() && self.deep.as_ref().is_none_or(DeepReport::passed)
    }

    /// Log a human-readable summary.
    pub fn log_summary(&self) {
        let shallow = &self.shallow;
        for part in &shallow.parts {
            match part.status {
                ArtifactStatus::Intact => {}
                ArtifactStatus::Changed => error!(
                    "{}: hash mismatch (expected {}, got {})",
                    part.name,
                    part.expected.as_deref().unwrap_or("?"),
                    part.actual.as_deref().unwrap_or("?")
                ),
                ArtifactStatus::Missing => error!(
                    "{}: {}",
                    part.name,
                    part.error.as_deref().unwrap_or("artifact missing")
                ),
            }
        }
        if shallow.files_missing() {
            error!(
                "Files missing in archive: {} part(s) recorded, {} found",
                shallow.expected_parts.unwrap_or_default(),
                shallow.found_parts
            );
        }
        let changed = shallow.changed().count();
        info!(
            "{} | {} | {}",
            Colors::colorize(
                Colors::INTACT,
                &format!("Intact: {}", shallow.parts.len() - changed)
            ),
            Colors::colorize(Colors::CHANGED, &format!("Changed: {changed}")),
            Colors::colorize(
                Colors::MISSING,
                &format!(
                    "Missing: {}",
                    shallow
                        .expected_parts
                        .map(|n| n.saturating_sub(shallow.found_parts))
                        .unwrap_or(0)
                )
            )
        );

        if let Some(deep) = &self.deep {
            for diff in &deep.parts {
                for path in &diff.missing {
                    error!("{}: missing {path}", diff.name);
                }
                for path in &diff.unexpected {
                    error!("{}: unexpected {path}", diff.name);
                }
                for c in &diff.corrupted {
                    error!(
                        "{}: corrupted {} (expected {}, got {})",
                        diff.name, c.path, c.expected, c.actual
                    );
                }
                if let Some(e) = &diff.extraction_error {
                    error!("{}: extraction failed: {e}", diff.name);
                }
            }
            for w in &deep.symlink_warnings {
                warn!("Symlink {} -> {}: {:?}", w.link, w.target, w.issue);
            }
            for w in &deep.unreadable_listings {
                warn!("{}: skipped {}: {}", w.part, w.listing.display(), w.error);
            }
        }

        if self.passed() {
            info!("{}", Colors::colorize(Colors::INTACT, "Integrity check passed"));
        } else {
            error!("Integrity check failed");
        }
    }
}
