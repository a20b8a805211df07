//! Collaborators that do the byte-level work: bundling, compression, encryption, extraction.
//!
//! The pipeline and the verifier only talk to these traits. [`Toolchain::default`] wires up the
//! system tools (`tar`, `plzip`, `gpg`); tests swap in in-process fakes.

pub mod command;
pub mod extractor;
pub mod gpg;
pub mod plzip;
pub mod tar;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::ArchiveResult;

pub use command::{run_tool, run_tool_stdout};
pub use extractor::PipeExtractor;
pub use gpg::Gpg;
pub use plzip::Plzip;
pub use tar::TarBundler;

pub trait Bundler: Send + Sync {
    /// Bundle exactly `paths` (relative to `base_dir`, directories included, no recursion) into
    /// `dest`. Temporary files go to `work_dir` when given.
    fn bundle(
        &self,
        paths: &[String],
        base_dir: &Path,
        dest: &Path,
        work_dir: Option<&Path>,
    ) -> ArchiveResult<()>;

    /// Verbose listing of a bundle, one member per line.
    fn list(&self, bundle: &Path) -> ArchiveResult<String>;

    /// Unpack a bundle (or only `subpath` of it) into `dest_dir`.
    fn extract(&self, bundle: &Path, dest_dir: &Path, subpath: Option<&Path>) -> ArchiveResult<()>;
}

pub trait Compressor: Send + Sync {
    /// Compress `src` in place and return the compressed file. `src` is consumed.
    fn compress(&self, src: &Path, level: u32, threads: usize) -> ArchiveResult<PathBuf>;

    /// Decompress `src` in place and return the decompressed file.
    fn decompress(&self, src: &Path, threads: usize) -> ArchiveResult<PathBuf>;

    /// Size the content of `src` will have once decompressed.
    fn uncompressed_size(&self, src: &Path) -> ArchiveResult<u64>;
}

pub trait Encryptor: Send + Sync {
    /// Encrypt `src` to `dest` for every recipient key file in `keys`.
    fn encrypt(&self, src: &Path, dest: &Path, keys: &[PathBuf]) -> ArchiveResult<()>;

    fn decrypt(&self, src: &Path, dest: &Path) -> ArchiveResult<()>;
}

/// Decompress and unbundle a compressed bundle in one go.
pub trait Extractor: Send + Sync {
    fn extract(
        &self,
        archive: &Path,
        dest_dir: &Path,
        subpath: Option<&Path>,
        threads: usize,
    ) -> ArchiveResult<()>;
}

/// The set of collaborators one operation runs with. Cheap to clone.
#[derive(Clone)]
pub struct Toolchain {
    pub bundler: Arc<dyn Bundler>,
    pub compressor: Arc<dyn Compressor>,
    pub encryptor: Arc<dyn Encryptor>,
    pub extractor: Arc<dyn Extractor>,
}

impl Default for Toolchain {
    fn default() -> Self {
        Toolchain {
            bundler: Arc::new(TarBundler::default()),
            compressor: Arc::new(Plzip::default()),
            encryptor: Arc::new(Gpg::default()),
            extractor: Arc::new(PipeExtractor::default()),
        }
    }
}

impl fmt::Debug for Toolchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Toolchain").finish_non_exhaustive()
    }
}
