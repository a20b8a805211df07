//! Encrypting and decrypting an existing archive set, outside of the archiving pipeline.
//!
//! Both directions check free space for the whole set before touching a part, then work part by
//! part: one failed part never stops the others.

use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

use crate::archive_set::ArchiveSet;
use crate::engine::hashing::hash_file;
use crate::engine::parallel::run_bounded;
use crate::engine::tools::{canonicalize_existing, ensure_files_exist, prepare_destination};
use crate::error::{ArchiveError, ArchiveResult};
use crate::pipeline::{PartOutcome, PipelineSummary};
use crate::sidecar::{artifact_hash_path, read_artifact_hash, write_artifact_hash};
use crate::tools::Toolchain;
use crate::types::{DecryptOpts, EncryptOpts, PartArtifactChain};
use crate::utils::config::Suffixes;
use crate::utils::disk_space::ensure_capacity;

/// Encrypt `src` to `dest` for `keys`, write the sidecar of `dest`, then optionally remove `src`.
pub fn encrypt_file(
    toolchain: &Toolchain,
    src: &Path,
    dest: &Path,
    keys: &[PathBuf],
    remove_src: bool,
) -> ArchiveResult<()> {
    info!("Encrypting {}", src.display());
    toolchain.encryptor.encrypt(src, dest, keys)?;
    write_artifact_hash(dest)?;
    if remove_src {
        debug!("Removing unencrypted {}", src.display());
        fs::remove_file(src)?;
    }
    Ok(())
}

/// Decrypt `src` to `dest`. An existing sidecar of `dest` must match the decrypted content (a
/// mismatching `dest` is deleted again); when there is none it is written. `src` and its sidecar
/// are removed only after that.
pub fn decrypt_file(
    toolchain: &Toolchain,
    src: &Path,
    dest: &Path,
    remove_src: bool,
) -> ArchiveResult<()> {
    info!("Decrypting {}", src.display());
    toolchain.encryptor.decrypt(src, dest)?;
    let sidecar = artifact_hash_path(dest);
    if sidecar.is_file() {
        let expected = read_artifact_hash(&sidecar)?;
        let actual = hash_file(dest)?;
        if actual != expected {
            let _ = fs::remove_file(dest);
            return Err(ArchiveError::validation(format!(
                "decrypted {} does not match its recorded hash (expected {expected}, got {actual})",
                dest.display()
            )));
        }
    } else {
        write_artifact_hash(dest)?;
    }
    if remove_src {
        debug!("Removing encrypted {}", src.display());
        fs::remove_file(src)?;
        let src_sidecar = artifact_hash_path(src);
        if src_sidecar.is_file() {
            fs::remove_file(src_sidecar)?;
        }
    }
    Ok(())
}

/// Directory the results go to: `dest` when it is a different directory (created per `force`),
/// the set's own directory otherwise.
fn output_dir(set: &ArchiveSet, dest: Option<&Path>, force: bool) -> ArchiveResult<PathBuf> {
    let Some(dest) = dest else {
        return Ok(set.dir.clone());
    };
    if dest.exists() && canonicalize_existing(dest)? == set.dir {
        return Ok(set.dir.clone());
    }
    prepare_destination(dest, force)?;
    canonicalize_existing(dest)
}

fn total_size(files: impl Iterator<Item = PathBuf>) -> ArchiveResult<u64> {
    let mut total = 0u64;
    for file in files {
        total = total.saturating_add(fs::metadata(file)?.len());
    }
    Ok(total)
}

/// Encrypt every compressed part of the set at `archive` (a directory or one `.tar.lz` file).
///
/// Results go next to the parts, or to `dest`. With `opts.reencrypt` an encrypted set is
/// decrypted in place first and the intermediate `.tar.lz` files are removed afterwards.
pub fn encrypt_archive(
    archive: &Path,
    dest: Option<&Path>,
    opts: &EncryptOpts,
    toolchain: &Toolchain,
) -> ArchiveResult<PipelineSummary> {
    if opts.keys.is_empty() {
        return Err(ArchiveError::validation("at least one encryption key is required"));
    }
    ensure_files_exist(&opts.keys)?;

    let mut remove_unencrypted = opts.remove_unencrypted;
    if opts.reencrypt {
        let decrypt = DecryptOpts {
            threads: opts.threads,
            remove_encrypted: true,
            force: false,
        };
        let decrypted = decrypt_archive(archive, None, &decrypt, toolchain)?;
        if !decrypted.is_success() {
            return Ok(decrypted);
        }
        remove_unencrypted = true;
    }

    // A single encrypted part file was replaced by its decrypted counterpart.
    let archive = match archive.to_string_lossy().strip_suffix(Suffixes::ENCRYPTED) {
        Some(name) if opts.reencrypt => PathBuf::from(format!("{name}{}", Suffixes::COMPRESSED)),
        _ => archive.to_path_buf(),
    };
    let set = ArchiveSet::discover(&archive)?;
    if set.parts.iter().any(|c| c.encrypted.as_ref().is_some_and(|p| p.is_file())) {
        return Err(ArchiveError::validation(format!(
            "{} is already encrypted; use reencrypt to change its keys",
            set.dir.display()
        )));
    }
    let parts: Vec<PartArtifactChain> = set
        .parts
        .iter()
        .filter(|c| c.compressed.is_file())
        .cloned()
        .collect();
    if parts.is_empty() {
        return Err(ArchiveError::validation(format!(
            "no {} files to encrypt in {}",
            Suffixes::COMPRESSED,
            set.dir.display()
        )));
    }

    let out_dir = output_dir(&set, dest, opts.force)?;
    let needed = total_size(parts.iter().map(|c| c.compressed.clone()))?;
    ensure_capacity("encryption", &out_dir, needed)?;

    info!("Encrypting {} part(s) of {}", parts.len(), set.basename);
    let outcomes = run_bounded(parts, opts.threads, |chain| {
        let out = PartArtifactChain::new(&out_dir, &chain.name, true);
        let result = match &out.encrypted {
            Some(encrypted) => encrypt_file(
                toolchain,
                &chain.compressed,
                encrypted,
                &opts.keys,
                remove_unencrypted,
            ),
            None => Err(ArchiveError::validation(format!(
                "{}: no encrypted artifact path",
                chain.name
            ))),
        };
        PartOutcome {
            name: chain.name,
            result,
        }
    });
    Ok(PipelineSummary::new(outcomes))
}

/// Decrypt every encrypted part of the set at `archive` (a directory or one `.tar.lz.gpg` file)
/// into `<name>.tar.lz` next to it, or in `dest`.
pub fn decrypt_archive(
    archive: &Path,
    dest: Option<&Path>,
    opts: &DecryptOpts,
    toolchain: &Toolchain,
) -> ArchiveResult<PipelineSummary> {
    let set = ArchiveSet::discover(archive)?;
    let parts: Vec<PartArtifactChain> = set
        .parts
        .iter()
        .filter(|c| c.encrypted.as_ref().is_some_and(|p| p.is_file()))
        .cloned()
        .collect();
    if parts.is_empty() {
        return Err(ArchiveError::validation(format!(
            "no {} files to decrypt in {}",
            Suffixes::ENCRYPTED,
            set.dir.display()
        )));
    }

    let out_dir = output_dir(&set, dest, opts.force)?;
    if let Some(existing) = parts
        .iter()
        .map(|c| PartArtifactChain::new(&out_dir, &c.name, false).compressed)
        .find(|p| p.is_file())
    {
        return Err(ArchiveError::validation(format!(
            "{} already exists; not overwriting unencrypted parts",
            existing.display()
        )));
    }
    let needed = total_size(parts.iter().filter_map(|c| c.encrypted.clone()))?;
    ensure_capacity("decryption", &out_dir, needed)?;

    info!("Decrypting {} part(s) of {}", parts.len(), set.basename);
    let outcomes = run_bounded(parts, opts.threads, |chain| {
        let out = PartArtifactChain::new(&out_dir, &chain.name, false);
        let result = match &chain.encrypted {
            Some(encrypted) => {
                decrypt_file(toolchain, encrypted, &out.compressed, opts.remove_encrypted)
            }
            None => Err(ArchiveError::validation(format!(
                "{}: not encrypted",
                chain.name
            ))),
        };
        PartOutcome {
            name: chain.name,
            result,
        }
    });
    Ok(PipelineSummary::new(outcomes))
}
