//! Path, naming and argument utilities

use log::warn;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use crate::error::{ArchiveError, ArchiveResult};
use crate::utils::config::Suffixes;

/// Convert absolute path to relative path from base
pub fn path_relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    path.strip_prefix(base).ok().map(|p| p.to_path_buf())
}

/// Path as written into sidecar files. Non-UTF-8 bytes are replaced.
pub fn path_to_sidecar_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Append `suffix` to the file name: `a/b.tar` + `.md5` → `a/b.tar.md5`.
pub fn add_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Name of part `index` (1-based) of `basename`; `None` for a non-split archive.
pub fn part_name(basename: &str, index: Option<usize>) -> String {
    match index {
        Some(i) => format!("{basename}{}{i}", Suffixes::PART_INFIX),
        None => basename.to_string(),
    }
}

/// Split `folder.part12` into (`folder`, Some(12)); names without a part number return `None`.
pub fn split_part_name(name: &str) -> (&str, Option<u64>) {
    if let Some((base, digits)) = name.rsplit_once(Suffixes::PART_INFIX)
        && !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && let Ok(n) = digits.parse::<u64>()
    {
        return (base, Some(n));
    }
    (name, None)
}

/// Natural ordering of part names: `x.part2` < `x.part10`; unnumbered names sort before numbered ones.
pub fn compare_part_names(a: &str, b: &str) -> Ordering {
    let (base_a, idx_a) = split_part_name(a);
    let (base_b, idx_b) = split_part_name(b);
    base_a
        .cmp(base_b)
        .then_with(|| idx_a.cmp(&idx_b))
        .then_with(|| a.cmp(b))
}

/// Sort items by their part name in natural order.
pub fn sort_by_part_name<T>(items: &mut [T], name: impl Fn(&T) -> &str) {
    items.sort_by(|a, b| compare_part_names(name(a), name(b)));
}

const SIZE_UNITS: [(&str, u64); 9] = [
    ("B", 1),
    ("KB", 1 << 10),
    ("K", 1 << 10),
    ("MB", 1 << 20),
    ("M", 1 << 20),
    ("GB", 1 << 30),
    ("G", 1 << 30),
    ("TB", 1 << 40),
    ("T", 1 << 40),
];

/// Parse a size with unit (`5G`, `1.5 MB`, `50000000B`); units are powers of 1024. A bare number is bytes.
pub fn parse_size(text: &str) -> ArchiveResult<u64> {
    let invalid = || {
        ArchiveError::validation(format!(
            "unable to parse size {text:?}; specify a size with unit, for example 5G for 5 gibibytes (2^30 bytes)"
        ))
    };
    let upper = text.trim().to_uppercase();
    let split_at = upper
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(upper.len());
    let (number, unit) = upper.split_at(split_at);
    let number: f64 = number.trim().parse().map_err(|_| invalid())?;
    let unit = unit.trim();
    let multiplier = if unit.is_empty() {
        1
    } else {
        SIZE_UNITS
            .iter()
            .find(|(u, _)| *u == unit)
            .map(|(_, m)| *m)
            .ok_or_else(invalid)?
    };
    if !number.is_finite() || number <= 0.0 {
        return Err(ArchiveError::validation(format!(
            "size must be positive, got {text:?}"
        )));
    }
    Ok((number * multiplier as f64) as u64)
}

/// Canonicalize a source path that must exist.
pub fn canonicalize_existing(path: &Path) -> ArchiveResult<PathBuf> {
    path.canonicalize().map_err(|e| {
        ArchiveError::validation(format!("no such file or directory: {} ({e})", path.display()))
    })
}

/// Create the destination directory. Without `force` the directory must not exist and its parent
/// must; with `force` an existing directory is replaced and missing parents are created.
pub fn prepare_destination(dest: &Path, force: bool) -> ArchiveResult<()> {
    let parent_exists = dest
        .parent()
        .map(|p| p.as_os_str().is_empty() || p.is_dir())
        .unwrap_or(true);
    if !dest.exists() && parent_exists {
        std::fs::create_dir(dest)?;
        return Ok(());
    }
    if force {
        if dest.exists() {
            warn!("Deleting existing directory: {}", dest.display());
            std::fs::remove_dir_all(dest)?;
        }
        std::fs::create_dir_all(dest)?;
        return Ok(());
    }
    if !parent_exists {
        return Err(ArchiveError::validation(format!(
            "directory {} must exist; use --force to create missing parents",
            dest.parent().unwrap_or(Path::new("")).display()
        )));
    }
    Err(ArchiveError::validation(format!(
        "path {} must not exist; use --force to override",
        dest.display()
    )))
}

/// Every path in `keys` must be an existing file.
pub fn ensure_files_exist(keys: &[PathBuf]) -> ArchiveResult<()> {
    for key in keys {
        if !key.is_file() {
            return Err(ArchiveError::validation(format!(
                "no such file: {}",
                key.display()
            )));
        }
    }
    Ok(())
}

/// Lexically resolve `.` and `..` without touching the filesystem. Returns `None` when the path
/// climbs above its starting point.
pub fn normalize_lexically(path: &Path) -> Option<PathBuf> {
    use std::path::Component;
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    return None;
                }
            }
            Component::Normal(c) => out.push(c),
            Component::RootDir | Component::Prefix(_) => out.push(component.as_os_str()),
        }
    }
    Some(out)
}
