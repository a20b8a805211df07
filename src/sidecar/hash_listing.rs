//! Reading and writing hash listings, path listings and artifact hash sidecars.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::engine::hashing::hash_file;
use crate::engine::tools::add_suffix;
use crate::error::{ArchiveError, ArchiveResult};
use crate::utils::config::Suffixes;

use super::codec::{decode_hash_line, decode_path_line, encode_hash_line, encode_path_line};

/// Relative path → hex digest. Sorted by path so listings written from it are deterministic.
pub type HashListing = BTreeMap<String, String>;

/// Write `(path, digest)` pairs as `<digest>  <path>` lines.
pub fn write_hash_listing<W: Write>(out: W, hashes: &[(String, String)]) -> ArchiveResult<()> {
    let mut out = BufWriter::new(out);
    for (path, digest) in hashes {
        out.write_all(encode_hash_line(digest, path).as_bytes())?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_path_listing<W: Write>(out: W, paths: &[String]) -> ArchiveResult<()> {
    let mut out = BufWriter::new(out);
    for path in paths {
        out.write_all(encode_path_line(path).as_bytes())?;
    }
    out.flush()?;
    Ok(())
}

/// Split a reader into lines, keeping only the `\n` terminator semantics (a `\r` stays in the path).
fn raw_lines(path: &Path) -> ArchiveResult<impl Iterator<Item = std::io::Result<Vec<u8>>>> {
    let reader = BufReader::new(File::open(path)?);
    Ok(reader.split(b'\n'))
}

fn format_error(path: &Path, line_no: usize, line: &[u8]) -> ArchiveError {
    ArchiveError::SidecarFormat {
        origin: path.display().to_string(),
        line_no,
        line: String::from_utf8_lossy(line).into_owned(),
    }
}

/// Read a content hash listing. A leading `./` on paths is dropped.
pub fn read_hash_listing(path: &Path) -> ArchiveResult<HashListing> {
    let mut listing = HashListing::new();
    for (idx, line) in raw_lines(path)?.enumerate() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let text = String::from_utf8_lossy(&line);
        let (digest, file) =
            decode_hash_line(&text).ok_or_else(|| format_error(path, idx + 1, &line))?;
        let file = file.strip_prefix("./").map(str::to_string).unwrap_or(file);
        listing.insert(file, digest);
    }
    Ok(listing)
}

pub fn read_path_listing(path: &Path) -> ArchiveResult<Vec<String>> {
    let mut paths = Vec::new();
    for (idx, line) in raw_lines(path)?.enumerate() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let text = String::from_utf8_lossy(&line);
        paths.push(decode_path_line(&text).ok_or_else(|| format_error(path, idx + 1, &line))?);
    }
    Ok(paths)
}

/// Sidecar path of an artifact: `<artifact>.md5`.
pub fn artifact_hash_path(artifact: &Path) -> PathBuf {
    add_suffix(artifact, Suffixes::HASH)
}

/// Hash `artifact` and write `<digest>  <file name>` to its sidecar. Returns the digest.
pub fn write_artifact_hash(artifact: &Path) -> ArchiveResult<String> {
    let digest = hash_file(artifact)?;
    let name = artifact
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file = File::create(artifact_hash_path(artifact))?;
    write_hash_listing(file, &[(name, digest.clone())])?;
    Ok(digest)
}

/// Digest recorded in an artifact sidecar (the first field of the first line).
pub fn read_artifact_hash(sidecar: &Path) -> ArchiveResult<String> {
    let content = std::fs::read_to_string(sidecar)?;
    let first = content.lines().next().unwrap_or("");
    decode_hash_line(first)
        .map(|(digest, _)| digest)
        .ok_or_else(|| format_error(sidecar, 1, first.as_bytes()))
}

/// Integer stored in `<basename>.parts.txt`.
pub fn read_part_count(path: &Path) -> ArchiveResult<usize> {
    let content = std::fs::read_to_string(path)?;
    let trimmed = content.trim();
    trimmed
        .parse::<usize>()
        .map_err(|_| format_error(path, 1, trimmed.as_bytes()))
}

pub fn write_part_count(path: &Path, count: usize) -> ArchiveResult<()> {
    std::fs::write(path, format!("{count}\n"))?;
    Ok(())
}
