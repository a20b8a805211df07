//! Greedy size-bounded partitioning of a directory tree into [`Part`]s.
//!
//! The tree is walked depth-first with children in byte order of their names. A directory whose
//! whole subtree fits next to the current part is absorbed as a single entry and not descended
//! into; a directory that fits on its own starts a new part; anything bigger is descended into
//! and listed (without its content) in the part that is open at that point. Files and symlinks
//! are leaves. All comparisons are strict: a part never reaches `max_size`.

use log::debug;
use std::iter::FusedIterator;
use std::mem;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::engine::tools::{canonicalize_existing, path_relative_to};
use crate::error::{ArchiveError, ArchiveResult};
use crate::types::{Entry, EntryKind, Part};

/// Lazy, non-restartable sequence of parts. Yields at most one error, then ends.
pub struct DirectorySplitter {
    walker: walkdir::IntoIter,
    base: PathBuf,
    max_size: u64,
    current: Part,
    done: bool,
}

/// Start splitting `root` into parts smaller than `max_size` bytes.
///
/// `root` must be an existing directory and `max_size` positive; both are checked here, before
/// anything is walked.
pub fn split_directory(root: &Path, max_size: u64) -> ArchiveResult<DirectorySplitter> {
    if max_size == 0 {
        return Err(ArchiveError::validation("maximum part size must be positive"));
    }
    let root = canonicalize_existing(root)?;
    if !root.is_dir() {
        return Err(ArchiveError::validation(format!(
            "not a directory: {}",
            root.display()
        )));
    }
    let base = root.parent().unwrap_or(&root).to_path_buf();
    debug!(
        "Splitting {} into parts below {max_size} bytes",
        root.display()
    );
    let walker = sorted_walk(&root).min_depth(1).into_iter();
    Ok(DirectorySplitter {
        walker,
        base,
        max_size,
        current: Part::default(),
        done: false,
    })
}

/// The whole tree as one part holding the root directory. Used when no part size is given.
pub fn single_part(root: &Path) -> ArchiveResult<Part> {
    let root = canonicalize_existing(root)?;
    let base = root.parent().unwrap_or(&root);
    let kind = kind_of(&root)?;
    let size = match kind {
        EntryKind::Directory => directory_size(&root)?,
        _ => leaf_size(&root)?,
    };
    let path = path_relative_to(&root, base).unwrap_or_else(|| root.clone());
    Ok(Part::with_entry(Entry {
        path,
        abs_path: root,
        kind,
        size,
        descended: false,
    }))
}

fn sorted_walk(root: &Path) -> WalkDir {
    WalkDir::new(root).follow_links(false).sort_by_file_name()
}

fn kind_of(path: &Path) -> ArchiveResult<EntryKind> {
    let ft = std::fs::symlink_metadata(path)?.file_type();
    Ok(if ft.is_symlink() {
        EntryKind::Symlink
    } else if ft.is_dir() {
        EntryKind::Directory
    } else {
        EntryKind::File
    })
}

fn entry_kind(entry: &DirEntry) -> EntryKind {
    let ft = entry.file_type();
    if ft.is_symlink() {
        EntryKind::Symlink
    } else if ft.is_dir() {
        EntryKind::Directory
    } else {
        EntryKind::File
    }
}

/// Size of a file or symlink: `stat` of the target, 0 for a broken symlink.
pub fn leaf_size(path: &Path) -> ArchiveResult<u64> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(meta.len()),
        Err(e) => {
            if std::fs::symlink_metadata(path)?.file_type().is_symlink() {
                Ok(0)
            } else {
                Err(e.into())
            }
        }
    }
}

/// Aggregate size of every leaf below `dir`. Symlinked directories count as leaves.
pub fn directory_size(dir: &Path) -> ArchiveResult<u64> {
    let mut total = 0u64;
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            total += leaf_size(entry.path())?;
        }
    }
    Ok(total)
}

/// Every path a part covers, in walk order: directory entries are expanded into themselves plus
/// their whole subtree. Descended directories stay as they are.
pub fn expand_entries(part: &Part, base: &Path) -> ArchiveResult<Vec<Entry>> {
    let mut out = Vec::with_capacity(part.entries.len());
    for entry in &part.entries {
        if entry.kind != EntryKind::Directory || entry.descended {
            out.push(entry.clone());
            continue;
        }
        for child in sorted_walk(&entry.abs_path) {
            let child = child?;
            let kind = entry_kind(&child);
            let size = match kind {
                EntryKind::Directory => 0,
                _ => leaf_size(child.path())?,
            };
            let abs_path = child.into_path();
            let path = path_relative_to(&abs_path, base).unwrap_or_else(|| abs_path.clone());
            out.push(Entry {
                path,
                abs_path,
                kind,
                size,
                descended: false,
            });
        }
    }
    Ok(out)
}

impl DirectorySplitter {
    fn make_entry(&self, dent: &DirEntry, kind: EntryKind, size: u64) -> Entry {
        let abs_path = dent.path().to_path_buf();
        let path = path_relative_to(&abs_path, &self.base).unwrap_or_else(|| abs_path.clone());
        Entry {
            path,
            abs_path,
            kind,
            size,
            descended: false,
        }
    }

    /// Put `entry` into the current part, or close the current part and start a new one with it.
    /// Returns the closed part, if any.
    fn place(&mut self, entry: Entry) -> Option<Part> {
        if self.current.size + entry.size < self.max_size {
            self.current.push(entry);
            return None;
        }
        let closed = mem::replace(&mut self.current, Part::with_entry(entry));
        (!closed.is_empty()).then_some(closed)
    }

    fn fail(&mut self, err: ArchiveError) -> Option<ArchiveResult<Part>> {
        self.done = true;
        Some(Err(err))
    }
}

impl Iterator for DirectorySplitter {
    type Item = ArchiveResult<Part>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let dent = match self.walker.next() {
                None => {
                    self.done = true;
                    let last = mem::take(&mut self.current);
                    return (!last.is_empty()).then_some(Ok(last));
                }
                Some(Err(e)) => return self.fail(e.into()),
                Some(Ok(dent)) => dent,
            };

            let kind = entry_kind(&dent);
            if kind == EntryKind::Directory {
                let size = match directory_size(dent.path()) {
                    Ok(size) => size,
                    Err(e) => return self.fail(e),
                };
                if size >= self.max_size {
                    // Too big even on its own: list the directory itself, then descend.
                    let mut entry = self.make_entry(&dent, kind, 0);
                    entry.descended = true;
                    self.current.push(entry);
                    continue;
                }
                self.walker.skip_current_dir();
                let entry = self.make_entry(&dent, kind, size);
                if let Some(closed) = self.place(entry) {
                    return Some(Ok(closed));
                }
                continue;
            }

            let size = match leaf_size(dent.path()) {
                Ok(size) => size,
                Err(e) => return self.fail(e),
            };
            if size >= self.max_size {
                return self.fail(ArchiveError::OversizedEntry {
                    path: dent.path().to_path_buf(),
                    size,
                    max_size: self.max_size,
                });
            }
            let entry = self.make_entry(&dent, kind, size);
            if let Some(closed) = self.place(entry) {
                return Some(Ok(closed));
            }
        }
    }
}

impl FusedIterator for DirectorySplitter {}
