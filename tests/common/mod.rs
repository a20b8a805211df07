//! Shared fixtures: sparse source trees and an in-process toolchain built on the `tar` crate, so
//! the tests need no external binaries.

#![allow(dead_code)]

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parchiver::engine::tools::add_suffix;
use parchiver::tools::{Bundler, Compressor, Encryptor, Extractor, Toolchain};
use parchiver::{ArchiveError, ArchiveResult};

pub const MB: u64 = 1_000_000;

/// Create `path` (and its parents) as a sparse file of `size` bytes.
pub fn sparse_file(path: &Path, size: u64) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    File::create(path).unwrap().set_len(size).unwrap();
}

/// Create `path` with `content`.
pub fn text_file(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// The tree from the 50 MB example: two loose files, a small folder and a large folder with two
/// subfolders. Returns the root (`<tmp>/source`).
pub fn fifty_mb_tree(tmp: &Path) -> PathBuf {
    let root = tmp.join("source");
    sparse_file(&root.join("file_a.txt"), 5 * MB);
    sparse_file(&root.join("file_b.pdf"), 7 * MB);
    sparse_file(&root.join("subfolder-small/notes.txt"), 2 * MB);
    sparse_file(&root.join("subfolder-large/folder_a/one.bin"), 13 * MB);
    sparse_file(&root.join("subfolder-large/folder_a/two.bin"), 13 * MB);
    sparse_file(&root.join("subfolder-large/folder_b/x.bin"), 17 * MB);
    sparse_file(&root.join("subfolder-large/folder_b/y.bin"), 9 * MB);
    sparse_file(&root.join("subfolder-large/folder_b/z.bin"), 15 * MB);
    root
}

/// `<tmp>/data` with three 30-byte directories: three parts at a 50-byte bound.
pub fn three_part_tree(tmp: &Path) -> PathBuf {
    let root = tmp.join("data");
    for (dir, fill) in [("d1", 'a'), ("d2", 'b'), ("d3", 'c')] {
        text_file(&root.join(dir).join("f.txt"), &fill.to_string().repeat(30));
    }
    root
}

// ---- Fake collaborators ----

fn io_err(e: std::io::Error) -> ArchiveError {
    ArchiveError::Io(e)
}

/// Bundles with the `tar` crate and lists members in GNU `tar -tvf` layout.
#[derive(Default)]
pub struct CrateTarBundler {
    /// Fail when bundling into a file whose name contains this text.
    pub fail_on: Option<String>,
}

impl Bundler for CrateTarBundler {
    fn bundle(
        &self,
        paths: &[String],
        base_dir: &Path,
        dest: &Path,
        _work_dir: Option<&Path>,
    ) -> ArchiveResult<()> {
        if let Some(pattern) = &self.fail_on
            && dest.to_string_lossy().contains(pattern.as_str())
        {
            return Err(ArchiveError::ExternalTool {
                tool: "tar".into(),
                status: "exit status: 2".into(),
                output: "simulated failure".into(),
            });
        }
        let mut builder = tar::Builder::new(File::create(dest)?);
        builder.follow_symlinks(false);
        for path in paths {
            let abs = base_dir.join(path);
            if fs::symlink_metadata(&abs)?.is_dir() {
                builder.append_dir(path, &abs)?;
            } else {
                builder.append_path_with_name(&abs, path)?;
            }
        }
        builder.into_inner()?;
        Ok(())
    }

    fn list(&self, bundle: &Path) -> ArchiveResult<String> {
        let mut archive = tar::Archive::new(File::open(bundle)?);
        let mut out = String::new();
        for entry in archive.entries()? {
            let entry = entry?;
            let header = entry.header();
            let kind = header.entry_type();
            let mut path = entry.path()?.to_string_lossy().into_owned();
            let perm = if kind.is_dir() {
                if !path.ends_with('/') {
                    path.push('/');
                }
                "drwxr-xr-x"
            } else if kind.is_symlink() {
                "lrwxrwxrwx"
            } else {
                "-rw-r--r--"
            };
            let size = header.size()?;
            let mut line = format!("{perm} user/group {size:>9} 2020-12-17 10:31 {path}");
            if kind.is_symlink()
                && let Some(target) = entry.link_name()?
            {
                line.push_str(&format!(" -> {}", target.display()));
            }
            out.push_str(&line);
            out.push('\n');
        }
        Ok(out)
    }

    fn extract(&self, bundle: &Path, dest_dir: &Path, subpath: Option<&Path>) -> ArchiveResult<()> {
        let mut archive = tar::Archive::new(File::open(bundle)?);
        for entry in archive.entries()? {
            let mut entry = entry?;
            let path = entry.path()?.into_owned();
            if subpath.is_some_and(|sub| !path.starts_with(sub)) {
                continue;
            }
            entry.unpack_in(dest_dir)?;
        }
        Ok(())
    }
}

/// "Compresses" by renaming `x.tar` to `x.tar.lz`.
pub struct RenameCompressor;

impl Compressor for RenameCompressor {
    fn compress(&self, src: &Path, _level: u32, _threads: usize) -> ArchiveResult<PathBuf> {
        let out = add_suffix(src, ".lz");
        fs::rename(src, &out).map_err(io_err)?;
        Ok(out)
    }

    fn decompress(&self, src: &Path, _threads: usize) -> ArchiveResult<PathBuf> {
        let out = PathBuf::from(src.to_string_lossy().trim_end_matches(".lz"));
        fs::rename(src, &out).map_err(io_err)?;
        Ok(out)
    }

    fn uncompressed_size(&self, src: &Path) -> ArchiveResult<u64> {
        Ok(fs::metadata(src)?.len())
    }
}

/// "Encrypts" by copying; every key file must exist.
pub struct CopyEncryptor;

impl Encryptor for CopyEncryptor {
    fn encrypt(&self, src: &Path, dest: &Path, keys: &[PathBuf]) -> ArchiveResult<()> {
        for key in keys {
            fs::metadata(key)?;
        }
        fs::copy(src, dest)?;
        Ok(())
    }

    fn decrypt(&self, src: &Path, dest: &Path) -> ArchiveResult<()> {
        fs::copy(src, dest)?;
        Ok(())
    }
}

/// [`RenameCompressor`] that reports `size` as the unpacked size of every file, or fails the size
/// query for files whose name contains `fail_on`.
pub struct SizedCompressor {
    pub size: Option<u64>,
    pub fail_on: Option<String>,
}

impl Compressor for SizedCompressor {
    fn compress(&self, src: &Path, level: u32, threads: usize) -> ArchiveResult<PathBuf> {
        RenameCompressor.compress(src, level, threads)
    }

    fn decompress(&self, src: &Path, threads: usize) -> ArchiveResult<PathBuf> {
        RenameCompressor.decompress(src, threads)
    }

    fn uncompressed_size(&self, src: &Path) -> ArchiveResult<u64> {
        if let Some(pattern) = &self.fail_on
            && src.to_string_lossy().contains(pattern.as_str())
        {
            return Err(ArchiveError::ExternalTool {
                tool: "plzip".into(),
                status: "exit status: 2".into(),
                output: "simulated corrupt member".into(),
            });
        }
        match self.size {
            Some(size) => Ok(size),
            None => RenameCompressor.uncompressed_size(src),
        }
    }
}

/// The "compressed" file is a plain tar, so extraction is unbundling.
pub struct TarExtractor;

impl Extractor for TarExtractor {
    fn extract(
        &self,
        archive: &Path,
        dest_dir: &Path,
        subpath: Option<&Path>,
        _threads: usize,
    ) -> ArchiveResult<()> {
        CrateTarBundler::default().extract(archive, dest_dir, subpath)
    }
}

pub fn fake_toolchain() -> Toolchain {
    Toolchain {
        bundler: Arc::new(CrateTarBundler::default()),
        compressor: Arc::new(RenameCompressor),
        encryptor: Arc::new(CopyEncryptor),
        extractor: Arc::new(TarExtractor),
    }
}

/// Fake toolchain whose bundler fails for parts whose file name contains `pattern`.
pub fn failing_toolchain(pattern: &str) -> Toolchain {
    Toolchain {
        bundler: Arc::new(CrateTarBundler {
            fail_on: Some(pattern.to_string()),
        }),
        ..fake_toolchain()
    }
}

/// Relative path → content of every regular file below `root`.
pub fn read_tree(root: &Path) -> std::collections::BTreeMap<String, Vec<u8>> {
    walkdir::WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap().to_string_lossy().into_owned();
            (rel, fs::read(e.path()).unwrap())
        })
        .collect()
}

/// Fake toolchain whose compressor claims every part unpacks to far more than any disk holds.
pub fn oversized_toolchain() -> Toolchain {
    Toolchain {
        compressor: Arc::new(SizedCompressor {
            size: Some(u64::MAX / 4),
            fail_on: None,
        }),
        ..fake_toolchain()
    }
}

/// Fake toolchain whose compressor cannot size parts whose file name contains `pattern`.
pub fn unsizable_toolchain(pattern: &str) -> Toolchain {
    Toolchain {
        compressor: Arc::new(SizedCompressor {
            size: None,
            fail_on: Some(pattern.to_string()),
        }),
        ..fake_toolchain()
    }
}
