//! Application configuration constants.
//! Naming, tuning and thresholds in one place.

use std::sync::OnceLock;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    config_filename: String,
    threads_env_var: String,
    scratch_prefix: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                config_filename: format!(".{pkg}.toml"),
                threads_env_var: format!("{}_THREADS", pkg.to_uppercase()),
                scratch_prefix: format!("{pkg}-"),
            }
        })
    }

    /// Optional settings file looked up in the working directory.
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }

    /// Environment variable holding the default worker count.
    pub fn threads_env_var(&self) -> &str {
        &self.threads_env_var
    }

    /// Prefix for temporary files and scratch directories.
    pub fn scratch_prefix(&self) -> &str {
        &self.scratch_prefix
    }
}

// ---- Artifact naming ----

/// File suffixes of the on-disk artifact set. Part files are `<basename>.part<N><suffix>`.
pub struct Suffixes;

impl Suffixes {
    /// Content hash listing of the part's files.
    pub const HASH_LISTING: &'static str = ".md5";
    /// Path listing of the part, directories included.
    pub const PATH_LISTING: &'static str = ".lst";
    pub const BUNDLE: &'static str = ".tar";
    /// Verbose bundler listing (`tar -tvf`).
    pub const BUNDLE_LISTING: &'static str = ".tar.lst";
    pub const COMPRESSED: &'static str = ".tar.lz";
    pub const ENCRYPTED: &'static str = ".tar.lz.gpg";
    /// Appended to an artifact name for its hash sidecar.
    pub const HASH: &'static str = ".md5";
    /// `<basename>.parts.txt` holds the number of parts.
    pub const PART_COUNT: &'static str = ".parts.txt";
    /// Infix between basename and part number.
    pub const PART_INFIX: &'static str = ".part";
}

// ---- Pipeline ----

/// Default compressor level (0 fastest, 9 smallest).
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Highest accepted compressor level.
pub const MAX_COMPRESSION_LEVEL: u32 = 9;

/// Free space must exceed the estimated output size times this factor.
pub const REQUIRED_SPACE_MULTIPLIER: f64 = 1.1;

/// Cipher passed to the encryptor.
pub const ENCRYPTION_ALGORITHM: &str = "AES256";

// ---- Hashing ----

/// Hashing I/O thresholds and buffer sizes.
pub struct HashingConsts;

impl HashingConsts {
    /// File size above which hashing uses memory-mapped I/O (bytes). 100 MB.
    pub const HASH_MMAP_THRESHOLD: u64 = 100 * 1024 * 1024;
    /// Chunk size for reading files below mmap threshold (bytes). 1 MB.
    pub const HASH_READ_CHUNK_SIZE: usize = 1024 * 1024;
}

// ---- Exit codes ----

/// Process exit codes. 2 is left to clap for argument errors.
pub struct ExitCodes;

impl ExitCodes {
    /// Could not run the requested operation.
    pub const FAILURE: u8 = 1;
    /// The integrity check ran and found problems.
    pub const INTEGRITY_FAILED: u8 = 3;
}
