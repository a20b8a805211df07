//! Public and internal types for splitting, archiving and verification.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::utils::config::{DEFAULT_COMPRESSION_LEVEL, Suffixes};

/// What a walked path is. Symlinks are never followed, even when they point at directories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
}

/// One unit placed into a [`Part`].
///
/// A `Directory` entry stands for its whole subtree unless `descended` is set. `size` is the
/// aggregate of the subtree for directories, the `stat` size for files and symlinks (0 for broken
/// symlinks).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    /// Path relative to the parent of the source root, e.g. `project/data/a.bin`.
    pub path: PathBuf,
    pub abs_path: PathBuf,
    pub kind: EntryKind,
    pub size: u64,
    /// A directory too big for one part. Only the directory itself is listed here (with size 0);
    /// its children follow as entries of their own.
    pub descended: bool,
}

/// A size-bounded slice of the source tree, in traversal order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Part {
    pub entries: Vec<Entry>,
    /// Sum of the entries' sizes.
    pub size: u64,
}

impl Part {
    pub fn with_entry(entry: Entry) -> Self {
        let mut part = Part::default();
        part.push(entry);
        part
    }

    pub fn push(&mut self, entry: Entry) {
        self.size += entry.size;
        self.entries.push(entry);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One line of a verbose bundler listing (`tar -tvf`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TarListingEntry {
    pub permissions: String,
    pub owner: String,
    pub group: String,
    pub size: u64,
    /// Modification time as printed (`2020-12-17 10:31` or `Dec 17 10:31`).
    pub mtime: String,
    pub path: String,
    pub link_target: Option<String>,
}

/// Every file derived from one part, named `<basename>[.partN]<suffix>` inside the archive directory.
///
/// Created by the pipeline and read-only afterwards. `encrypted` is set when the set was (or is
/// going to be) encrypted; the other artifact paths are always populated but may not exist on disk
/// (e.g. the bundle is consumed by compression).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PartArtifactChain {
    pub name: String,
    pub bundle: PathBuf,
    pub bundle_hash: PathBuf,
    pub compressed: PathBuf,
    pub compressed_hash: PathBuf,
    pub encrypted: Option<PathBuf>,
    pub encrypted_hash: Option<PathBuf>,
    pub hash_listing: PathBuf,
    pub path_listing: PathBuf,
    pub bundle_listing: PathBuf,
}

impl PartArtifactChain {
    pub fn new(dir: &Path, name: &str, encrypted: bool) -> Self {
        let file = |suffix: &str| dir.join(format!("{name}{suffix}"));
        let sidecar = |suffix: &str| dir.join(format!("{name}{suffix}{}", Suffixes::HASH));
        PartArtifactChain {
            name: name.to_string(),
            bundle: file(Suffixes::BUNDLE),
            bundle_hash: sidecar(Suffixes::BUNDLE),
            compressed: file(Suffixes::COMPRESSED),
            compressed_hash: sidecar(Suffixes::COMPRESSED),
            encrypted: encrypted.then(|| file(Suffixes::ENCRYPTED)),
            encrypted_hash: encrypted.then(|| sidecar(Suffixes::ENCRYPTED)),
            hash_listing: file(Suffixes::HASH_LISTING),
            path_listing: file(Suffixes::PATH_LISTING),
            bundle_listing: file(Suffixes::BUNDLE_LISTING),
        }
    }

    /// Outermost artifact present on disk and its hash sidecar: encrypted > compressed > bundle.
    pub fn outermost(&self) -> Option<(&Path, &Path)> {
        if let (Some(enc), Some(enc_hash)) = (&self.encrypted, &self.encrypted_hash)
            && enc.is_file()
        {
            return Some((enc, enc_hash));
        }
        if self.compressed.is_file() {
            return Some((&self.compressed, &self.compressed_hash));
        }
        if self.bundle.is_file() {
            return Some((&self.bundle, &self.bundle_hash));
        }
        None
    }
}

/// Options for creating an archive (CLI, config file and lib).
#[derive(Clone, Debug)]
pub struct ArchiveOpts {
    /// Worker count for parts and for per-file hashing.
    pub threads: usize,
    /// Compressor level, 0 (fastest) to 9 (smallest).
    pub compression: u32,
    /// Maximum uncompressed part size in bytes. `None` archives the whole tree as one part.
    pub part_size: Option<u64>,
    /// Recipient public key files. Empty means no encryption.
    pub encryption_keys: Vec<PathBuf>,
    /// Delete the `.tar.lz` once its encrypted counterpart is written.
    pub remove_unencrypted: bool,
    /// Replace an existing destination and create missing parents.
    pub force: bool,
    /// Directory for temporary files (bundler path lists).
    pub work_dir: Option<PathBuf>,
    /// Show a progress bar.
    pub verbose: bool,
}

impl Default for ArchiveOpts {
    fn default() -> Self {
        ArchiveOpts {
            threads: 1,
            compression: DEFAULT_COMPRESSION_LEVEL,
            part_size: None,
            encryption_keys: Vec::new(),
            remove_unencrypted: false,
            force: false,
            work_dir: None,
            verbose: false,
        }
    }
}

/// Options for `check`.
#[derive(Clone, Debug)]
pub struct CheckOpts {
    pub threads: usize,
    /// Also extract every part and re-hash its content.
    pub deep: bool,
    /// Parent for the scratch extraction directories. Defaults to the system temp dir.
    pub work_dir: Option<PathBuf>,
}

impl Default for CheckOpts {
    fn default() -> Self {
        CheckOpts {
            threads: 1,
            deep: false,
            work_dir: None,
        }
    }
}

/// Options for `extract`.
#[derive(Clone, Debug)]
pub struct ExtractOpts {
    pub threads: usize,
    /// Only extract this path (relative to the archive root, e.g. `project/data`).
    pub subpath: Option<PathBuf>,
    pub force: bool,
    /// Where encrypted parts are decrypted before extraction. Defaults to the destination.
    pub work_dir: Option<PathBuf>,
}

impl Default for ExtractOpts {
    fn default() -> Self {
        ExtractOpts {
            threads: 1,
            subpath: None,
            force: false,
            work_dir: None,
        }
    }
}

/// Options for encrypting an existing archive.
#[derive(Clone, Debug)]
pub struct EncryptOpts {
    pub threads: usize,
    /// Recipient public key files. At least one is required.
    pub keys: Vec<PathBuf>,
    /// Delete each `.tar.lz` once its encrypted counterpart and sidecar are written.
    pub remove_unencrypted: bool,
    /// Decrypt an already encrypted set first, then encrypt it for `keys` only.
    pub reencrypt: bool,
    /// Replace an existing destination directory.
    pub force: bool,
}

impl Default for EncryptOpts {
    fn default() -> Self {
        EncryptOpts {
            threads: 1,
            keys: Vec::new(),
            remove_unencrypted: false,
            reencrypt: false,
            force: false,
        }
    }
}

/// Options for decrypting an existing archive.
#[derive(Clone, Debug)]
pub struct DecryptOpts {
    pub threads: usize,
    /// Delete each `.tar.lz.gpg` (and its sidecar) once decrypted and verified.
    pub remove_encrypted: bool,
    /// Replace an existing destination directory.
    pub force: bool,
}

impl Default for DecryptOpts {
    fn default() -> Self {
        DecryptOpts {
            threads: 1,
            remove_encrypted: false,
            force: false,
        }
    }
}
