//! The per-part stages. Each stage reads the previous stage's artifacts from disk so stages can
//! also be run on their own.

use log::{debug, warn};
use rayon::prelude::*;
use std::fs::{self, File};
use std::path::Path;

use crate::encryption::encrypt_file;
use crate::engine::hashing::hash_path;
use crate::engine::tools::{normalize_lexically, path_to_sidecar_string};
use crate::error::{ArchiveError, ArchiveResult};
use crate::sidecar::{read_path_listing, write_artifact_hash, write_hash_listing, write_path_listing};
use crate::splitter::expand_entries;
use crate::types::{Entry, EntryKind, Part, PartArtifactChain};
use crate::utils::disk_space::ensure_capacity;

use super::context::PipelineContext;

/// Why a symlink inside the source tree deserves a warning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SymlinkConcern {
    /// Absolute target that still lies inside the tree; breaks when extracted elsewhere.
    AbsoluteInside,
    /// Target outside the archived tree.
    Outside,
    /// Target inside the tree that does not exist.
    Broken,
}

/// Classify the link at `link` (inside `source`), or `None` when it is a healthy relative link.
pub fn audit_symlink(link: &Path, source: &Path) -> ArchiveResult<Option<SymlinkConcern>> {
    let target = fs::read_link(link)?;
    if target.is_absolute() {
        return Ok(Some(if target.starts_with(source) {
            SymlinkConcern::AbsoluteInside
        } else {
            SymlinkConcern::Outside
        }));
    }
    let parent = link.parent().unwrap_or(source);
    let Some(resolved) = normalize_lexically(&parent.join(&target)) else {
        return Ok(Some(SymlinkConcern::Outside));
    };
    if !resolved.starts_with(source) {
        return Ok(Some(SymlinkConcern::Outside));
    }
    if fs::symlink_metadata(&resolved).is_err() {
        return Ok(Some(SymlinkConcern::Broken));
    }
    Ok(None)
}

fn warn_symlink(entry: &Entry, source: &Path) {
    match audit_symlink(&entry.abs_path, source) {
        Ok(None) => {}
        Ok(Some(SymlinkConcern::AbsoluteInside)) => warn!(
            "Symlink {} uses an absolute path into the archived tree",
            entry.path.display()
        ),
        Ok(Some(SymlinkConcern::Outside)) => warn!(
            "Symlink {} points outside the archived tree",
            entry.path.display()
        ),
        Ok(Some(SymlinkConcern::Broken)) => {
            warn!("Symlink {} is broken", entry.path.display())
        }
        Err(e) => warn!("Cannot read symlink {}: {e}", entry.path.display()),
    }
}

/// Hash every file and symlink a part covers and write its `.md5` and `.lst` listings.
/// Returns the number of hashed members.
pub fn write_filelists(
    ctx: &PipelineContext,
    chain: &PartArtifactChain,
    part: &Part,
) -> ArchiveResult<usize> {
    let members = expand_entries(part, &ctx.base)?;
    let paths: Vec<String> = members
        .iter()
        .map(|e| path_to_sidecar_string(&e.path))
        .collect();
    let leaves: Vec<&Entry> = members
        .iter()
        .filter(|e| e.kind != EntryKind::Directory)
        .collect();

    let hashes: Vec<(String, String)> = ctx.hash_pool.install(|| {
        leaves
            .par_iter()
            .map(|entry| {
                if entry.kind == EntryKind::Symlink {
                    warn_symlink(entry, &ctx.source);
                }
                let digest = hash_path(&entry.abs_path)?;
                Ok((path_to_sidecar_string(&entry.path), digest))
            })
            .collect::<ArchiveResult<Vec<_>>>()
    })?;

    write_hash_listing(File::create(&chain.hash_listing)?, &hashes)?;
    write_path_listing(File::create(&chain.path_listing)?, &paths)?;
    debug!(
        "{}: {} paths, {} hashed",
        chain.name,
        paths.len(),
        hashes.len()
    );
    Ok(hashes.len())
}

/// Bundle the members listed in the part's `.lst`, hash the bundle and store its verbose listing.
///
/// The listing is taken here because compression consumes the bundle.
pub fn bundle_part(ctx: &PipelineContext, chain: &PartArtifactChain) -> ArchiveResult<()> {
    let members = read_path_listing(&chain.path_listing)?;
    let bundler = &ctx.toolchain.bundler;
    bundler.bundle(
        &members,
        &ctx.base,
        &chain.bundle,
        ctx.opts.work_dir.as_deref(),
    )?;
    write_artifact_hash(&chain.bundle)?;
    let listing = bundler.list(&chain.bundle)?;
    fs::write(&chain.bundle_listing, listing)?;
    debug!("{}: bundled {} members", chain.name, members.len());
    Ok(())
}

pub fn compress_part(ctx: &PipelineContext, chain: &PartArtifactChain) -> ArchiveResult<()> {
    let out = ctx.toolchain.compressor.compress(
        &chain.bundle,
        ctx.opts.compression,
        ctx.opts.threads,
    )?;
    if out != chain.compressed {
        fs::rename(&out, &chain.compressed)?;
    }
    write_artifact_hash(&chain.compressed)?;
    Ok(())
}

/// Encrypt the compressed bundle for every key. Checks free space first.
pub fn encrypt_part(ctx: &PipelineContext, chain: &PartArtifactChain) -> ArchiveResult<()> {
    let (Some(encrypted), Some(_)) = (&chain.encrypted, &chain.encrypted_hash) else {
        return Err(ArchiveError::validation(format!(
            "{}: no encryption keys given",
            chain.name
        )));
    };
    let size = fs::metadata(&chain.compressed)?.len();
    ensure_capacity("encryption", &ctx.dest, size)?;
    encrypt_file(
        &ctx.toolchain,
        &chain.compressed,
        encrypted,
        &ctx.opts.encryption_keys,
        ctx.opts.remove_unencrypted,
    )
}

/// All stages of one part, in order.
pub fn run_part(ctx: &PipelineContext, chain: &PartArtifactChain, part: &Part) -> ArchiveResult<()> {
    write_filelists(ctx, chain, part)?;
    bundle_part(ctx, chain)?;
    compress_part(ctx, chain)?;
    if ctx.is_encrypted() {
        encrypt_part(ctx, chain)?;
    }
    Ok(())
}
