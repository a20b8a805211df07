//! Pipeline context: everything one archiving run shares across its part workers.

use log::debug;
use rayon::ThreadPool;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::engine::parallel::hashing_pool;
use crate::engine::tools::{canonicalize_existing, part_name};
use crate::error::{ArchiveError, ArchiveResult};
use crate::tools::Toolchain;
use crate::types::{ArchiveOpts, PartArtifactChain};
use crate::utils::config::Suffixes;

/// Shared, read-only state of one run. Built once and borrowed by every part worker.
pub struct PipelineContext {
    /// Canonical source directory.
    pub source: PathBuf,
    /// Parent of `source`; member paths are relative to it.
    pub base: PathBuf,
    /// Archive directory all artifacts are written to.
    pub dest: PathBuf,
    /// Source directory name, prefix of every artifact.
    pub basename: String,
    pub opts: ArchiveOpts,
    pub toolchain: Toolchain,
    pub hash_pool: Arc<ThreadPool>,
}

impl PipelineContext {
    pub fn new(
        source: &Path,
        dest: &Path,
        opts: ArchiveOpts,
        toolchain: Toolchain,
    ) -> ArchiveResult<Self> {
        let source = canonicalize_existing(source)?;
        let basename = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                ArchiveError::validation(format!("cannot archive {}", source.display()))
            })?;
        let base = source.parent().unwrap_or(&source).to_path_buf();
        let hash_pool = Arc::new(hashing_pool(opts.threads)?);
        let ctx = PipelineContext {
            source,
            base,
            dest: dest.to_path_buf(),
            basename,
            opts,
            toolchain,
            hash_pool,
        };
        debug!(
            "{} CONFIG: source={} dest={} {:#?}",
            env!("CARGO_PKG_NAME").to_uppercase(),
            ctx.source.display(),
            ctx.dest.display(),
            ctx.opts
        );
        Ok(ctx)
    }

    /// Whether the tree is split into numbered parts.
    pub fn is_split(&self) -> bool {
        self.opts.part_size.is_some()
    }

    pub fn is_encrypted(&self) -> bool {
        !self.opts.encryption_keys.is_empty()
    }

    /// Name of part `index` (1-based), or the bare basename for an unsplit archive.
    pub fn part_name(&self, index: usize) -> String {
        part_name(&self.basename, self.is_split().then_some(index))
    }

    pub fn chain(&self, name: &str) -> PartArtifactChain {
        PartArtifactChain::new(&self.dest, name, self.is_encrypted())
    }

    pub fn part_count_path(&self) -> PathBuf {
        self.dest
            .join(format!("{}{}", self.basename, Suffixes::PART_COUNT))
    }
}
