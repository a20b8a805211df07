//! Extraction of an archive set: decrypt, decompress and unbundle each part into one directory.
//!
//! Free space is checked for the whole set before decrypting and again before unpacking, so a
//! full disk is reported up front rather than halfway through a part.

use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

use crate::archive_set::ArchiveSet;
use crate::engine::parallel::run_bounded;
use crate::engine::tools::prepare_destination;
use crate::error::{ArchiveError, ArchiveResult};
use crate::listing::relevant_parts;
use crate::pipeline::{PartOutcome, PipelineSummary};
use crate::tools::Toolchain;
use crate::types::{ExtractOpts, PartArtifactChain};
use crate::utils::config::{PackagePaths, Suffixes};
use crate::utils::disk_space::ensure_capacity;

/// What a part can be unpacked from once any encryption is removed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Unpackable {
    Compressed(PathBuf),
    Bundle(PathBuf),
}

impl Unpackable {
    pub fn path(&self) -> &Path {
        match self {
            Unpackable::Compressed(p) | Unpackable::Bundle(p) => p,
        }
    }
}

/// Decrypt the part into `scratch` when its outermost artifact is encrypted.
pub fn decrypt_part(
    chain: &PartArtifactChain,
    toolchain: &Toolchain,
    scratch: &Path,
) -> ArchiveResult<Option<PathBuf>> {
    let Some(encrypted) = chain.encrypted.as_ref().filter(|p| p.is_file()) else {
        return Ok(None);
    };
    let out = scratch.join(format!("{}{}", chain.name, Suffixes::COMPRESSED));
    debug!("Decrypting {} to {}", encrypted.display(), out.display());
    toolchain.encryptor.decrypt(encrypted, &out)?;
    Ok(Some(out))
}

/// Pick the artifact to unpack: a decrypted file, else the compressed bundle, else the bundle.
pub fn unpackable(chain: &PartArtifactChain, decrypted: Option<PathBuf>) -> ArchiveResult<Unpackable> {
    if let Some(path) = decrypted {
        return Ok(Unpackable::Compressed(path));
    }
    if chain.compressed.is_file() {
        return Ok(Unpackable::Compressed(chain.compressed.clone()));
    }
    if chain.bundle.is_file() {
        return Ok(Unpackable::Bundle(chain.bundle.clone()));
    }
    Err(ArchiveError::validation(format!(
        "{}: no artifact to extract",
        chain.name
    )))
}

/// Bytes the unpacked content will take.
pub fn unpacked_size(source: &Unpackable, toolchain: &Toolchain) -> ArchiveResult<u64> {
    match source {
        Unpackable::Compressed(p) => toolchain.compressor.uncompressed_size(p),
        Unpackable::Bundle(p) => Ok(fs::metadata(p)?.len()),
    }
}

pub fn unpack(
    source: &Unpackable,
    toolchain: &Toolchain,
    dest: &Path,
    subpath: Option<&Path>,
    threads: usize,
) -> ArchiveResult<()> {
    match source {
        Unpackable::Compressed(p) => toolchain.extractor.extract(p, dest, subpath, threads),
        Unpackable::Bundle(p) => toolchain.bundler.extract(p, dest, subpath),
    }
}

/// Decrypt (into `scratch`) and unpack one part into `dest`. Decrypted files are removed afterwards.
pub fn extract_part(
    chain: &PartArtifactChain,
    toolchain: &Toolchain,
    scratch: &Path,
    dest: &Path,
    threads: usize,
) -> ArchiveResult<()> {
    let decrypted = decrypt_part(chain, toolchain, scratch)?;
    let source = unpackable(chain, decrypted.clone())?;
    let result = unpack(&source, toolchain, dest, None, threads);
    if let Some(path) = decrypted {
        let _ = fs::remove_file(path);
    }
    result
}

/// Sum of the outermost encrypted artifacts' sizes.
fn encrypted_bytes(parts: &[PartArtifactChain]) -> ArchiveResult<u64> {
    let mut total = 0;
    for chain in parts {
        if let Some(enc) = chain.encrypted.as_ref().filter(|p| p.is_file()) {
            total += fs::metadata(enc)?.len();
        }
    }
    Ok(total)
}

/// Extract the set at `archive` into `dest`, or only `opts.subpath` and the parts holding it.
pub fn extract_archive(
    archive: &Path,
    dest: &Path,
    opts: &ExtractOpts,
    toolchain: &Toolchain,
) -> ArchiveResult<PipelineSummary> {
    let set = ArchiveSet::discover(archive)?;
    let parts = match &opts.subpath {
        Some(sub) => {
            let parts = relevant_parts(&set, sub)?;
            if parts.is_empty() {
                return Err(ArchiveError::validation(format!(
                    "{} is not in the archive",
                    sub.display()
                )));
            }
            info!("{} found in {} part(s)", sub.display(), parts.len());
            parts
        }
        None => set.parts.clone(),
    };

    prepare_destination(dest, opts.force)?;
    let scratch_parent = opts.work_dir.as_deref().unwrap_or(dest);
    let scratch = tempfile::Builder::new()
        .prefix(PackagePaths::get().scratch_prefix())
        .tempdir_in(scratch_parent)?;

    let encrypted = encrypted_bytes(&parts)?;
    if encrypted > 0 {
        ensure_capacity("decryption", scratch.path(), encrypted)?;
    }
    let decrypted = run_bounded(parts.clone(), opts.threads, |chain| {
        decrypt_part(&chain, toolchain, scratch.path()).and_then(|d| unpackable(&chain, d))
    });

    let mut sources = Vec::with_capacity(parts.len());
    let mut outcomes = Vec::new();
    let mut needed = 0u64;
    for (chain, source) in parts.into_iter().zip(decrypted) {
        match source.and_then(|s| unpacked_size(&s, toolchain).map(|size| (s, size))) {
            Ok((source, size)) => {
                needed = needed.saturating_add(size);
                sources.push((chain, source));
            }
            Err(e) => outcomes.push(PartOutcome {
                name: chain.name,
                result: Err(e),
            }),
        }
    }
    ensure_capacity("extraction", dest, needed)?;

    let subpath = opts.subpath.as_deref();
    outcomes.extend(run_bounded(sources, opts.threads, |(chain, source)| {
        let result = unpack(&source, toolchain, dest, subpath, opts.threads);
        if source.path().starts_with(scratch.path()) {
            let _ = fs::remove_file(source.path());
        }
        PartOutcome {
            name: chain.name,
            result,
        }
    }));
    Ok(PipelineSummary::new(outcomes))
}
