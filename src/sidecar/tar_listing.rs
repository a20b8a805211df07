//! Parser for verbose bundler listings (`tar -tvf`), GNU and BSD column layouts.

use std::path::Path;

use regex::Regex;

use crate::error::{ArchiveError, ArchiveResult};
use crate::types::TarListingEntry;

/// Leading columns before the path: GNU `perm owner/group size date time`.
const GNU_COLUMNS: usize = 5;
/// BSD `perm links owner group size Mon DD time|year`.
const BSD_COLUMNS: usize = 8;

/// Parse a whole listing. Empty lines are skipped; `origin` names the source in errors.
pub fn parse_tar_listing(text: &str, origin: &str) -> ArchiveResult<Vec<TarListingEntry>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            parse_line(line).ok_or_else(|| ArchiveError::SidecarFormat {
                origin: origin.to_string(),
                line_no: idx + 1,
                line: line.to_string(),
            })
        })
        .collect()
}

/// Read and parse a stored `.tar.lst` file.
pub fn read_tar_listing(path: &Path) -> ArchiveResult<Vec<TarListingEntry>> {
    let text = std::fs::read_to_string(path)?;
    parse_tar_listing(&text, &path.display().to_string())
}

fn parse_line(line: &str) -> Option<TarListingEntry> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 4 {
        return None;
    }
    let gnu = tokens[3].contains('-');
    let leading = if gnu { GNU_COLUMNS } else { BSD_COLUMNS };
    if tokens.len() <= leading {
        return None;
    }

    let (owner, group, size, mtime) = if gnu {
        let (owner, group) = tokens[1].split_once('/').unwrap_or((tokens[1], ""));
        (owner, group, tokens[2], format!("{} {}", tokens[3], tokens[4]))
    } else {
        (
            tokens[2],
            tokens[3],
            tokens[4],
            format!("{} {} {}", tokens[5], tokens[6], tokens[7]),
        )
    };
    let size = size.parse::<u64>().ok()?;

    let remainder = remainder_after(line, &tokens[..leading])?;
    let (path, link_target) = split_link(&remainder);

    Some(TarListingEntry {
        permissions: tokens[0].to_string(),
        owner: owner.to_string(),
        group: group.to_string(),
        size,
        mtime,
        path,
        link_target,
    })
}

/// Cut everything after the leading columns out of the raw line so that runs of spaces inside
/// the path are preserved.
fn remainder_after(line: &str, leading: &[&str]) -> Option<String> {
    let columns: Vec<String> = leading.iter().map(|t| regex::escape(t)).collect();
    let pattern = format!(r"^\s*{}\s(.*)$", columns.join(r"\s+"));
    let re = Regex::new(&pattern).ok()?;
    let caps = re.captures(line)?;
    Some(caps.get(1)?.as_str().to_string())
}

/// `name -> target` (symlink) or `name link to target` (hard link) into path and target.
fn split_link(remainder: &str) -> (String, Option<String>) {
    if let Some((path, target)) = remainder.split_once(" -> ") {
        return (path.to_string(), Some(target.to_string()));
    }
    if let Some((path, target)) = remainder.split_once(" link to ") {
        return (path.to_string(), Some(target.to_string()));
    }
    (remainder.to_string(), None)
}
