use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Split directories into size-bounded parts, archive them with tar/plzip/gpg and verify the result.
#[derive(Clone, Debug, Parser)]
#[command(name = "parchiver", version)]
#[command(about = "Split, archive, encrypt and verify large directory trees.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output (debug logging and progress bars).
    #[arg(long, short = 'v', global = true, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,

    /// Directory for temporary files and scratch extraction. Default: system temp dir / destination.
    #[arg(long, short = 'w', global = true)]
    pub work_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Split SOURCE into parts and write bundled, compressed (and optionally encrypted) parts to DEST.
    Archive(ArchiveArgs),

    /// Run a single stage of archiving.
    #[command(subcommand)]
    Create(CreateCommands),

    /// Encrypt the .tar.lz parts of an existing archive.
    Encrypt(EncryptArgs),

    /// Decrypt the .tar.lz.gpg parts of an existing archive.
    Decrypt(DecryptArgs),

    /// Extract an archive (or the parts holding SUBPATH) into DEST.
    Extract(ExtractArgs),

    /// Print the recorded content listing of an archive.
    List(ListArgs),

    /// Verify artifact hashes and the part count; --deep also extracts and re-hashes content.
    Check(CheckArgs),
}

#[derive(Clone, Debug, Subcommand)]
pub enum CreateCommands {
    /// Split SOURCE and write per-part hash and path listings plus the part count to DEST.
    Filelist(FilelistArgs),

    /// Bundle the parts listed in DEST (all, or --part).
    Tar(StageArgs),

    /// Bundle and compress the parts listed in DEST (all, or --part).
    CompressedTar(StageArgs),
}

/// Options shared by every command that writes parts.
#[derive(Clone, Debug, Args)]
pub struct CommonArgs {
    /// Worker count. Default: settings file, PARCHIVER_THREADS, or all cores.
    #[arg(long, short = 'n')]
    pub threads: Option<usize>,

    /// Replace an existing destination and create missing parent directories.
    #[arg(long, short = 'f', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub force: Option<bool>,
}

#[derive(Clone, Debug, Args)]
pub struct ArchiveArgs {
    /// Directory to archive.
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Archive directory to create.
    #[arg(value_name = "DEST")]
    pub dest: PathBuf,

    /// Maximum uncompressed part size, e.g. 5G, 500M, 50000000B. Default: one part.
    #[arg(long, short = 'p')]
    pub part_size: Option<String>,

    /// Compression level 0-9.
    #[arg(long, short = 'c')]
    pub compression: Option<u32>,

    /// Public key file(s) to encrypt for. Can specify multiple: -k a.pub b.pub
    #[arg(long = "key", short = 'k', num_args = 1..)]
    pub keys: Vec<PathBuf>,

    /// Delete the unencrypted .tar.lz once the encrypted file is written.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub remove_unencrypted: Option<bool>,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Clone, Debug, Args)]
pub struct FilelistArgs {
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    #[arg(value_name = "DEST")]
    pub dest: PathBuf,

    /// Maximum uncompressed part size, e.g. 5G. Default: one part.
    #[arg(long, short = 'p')]
    pub part_size: Option<String>,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Clone, Debug, Args)]
pub struct StageArgs {
    /// Directory the listings were created from.
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Archive directory holding the listings.
    #[arg(value_name = "DEST")]
    pub dest: PathBuf,

    /// Only this part, e.g. data.part3.
    #[arg(long)]
    pub part: Option<String>,

    /// Compression level 0-9 (compressed-tar only).
    #[arg(long, short = 'c')]
    pub compression: Option<u32>,

    /// Worker count.
    #[arg(long, short = 'n')]
    pub threads: Option<usize>,
}

#[derive(Clone, Debug, Args)]
pub struct EncryptArgs {
    /// Archive directory or single .tar.lz file.
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Directory for the encrypted parts. Default: next to the parts.
    #[arg(value_name = "DEST")]
    pub dest: Option<PathBuf>,

    /// Public key file(s) to encrypt for.
    #[arg(long = "key", short = 'k', num_args = 1.., required = true)]
    pub keys: Vec<PathBuf>,

    /// Delete each .tar.lz once its encrypted file is written.
    #[arg(long = "remove", short = 'r', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub remove_unencrypted: Option<bool>,

    /// Decrypt an encrypted archive first and encrypt it for the given keys only.
    #[arg(long, short = 'e')]
    pub reencrypt: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Clone, Debug, Args)]
pub struct DecryptArgs {
    /// Archive directory or single .tar.lz.gpg file.
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Directory for the decrypted parts. Default: next to the parts.
    #[arg(value_name = "DEST")]
    pub dest: Option<PathBuf>,

    /// Delete each .tar.lz.gpg once it is decrypted and verified.
    #[arg(long = "remove", short = 'r', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub remove_encrypted: Option<bool>,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Clone, Debug, Args)]
pub struct ExtractArgs {
    /// Archive directory or single part file.
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Directory to extract into.
    #[arg(value_name = "DEST")]
    pub dest: PathBuf,

    /// Only extract this path, relative to the archive root (e.g. data/results).
    #[arg(long, short = 's')]
    pub subpath: Option<PathBuf>,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Clone, Debug, Args)]
pub struct ListArgs {
    /// Archive directory or single part file.
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Only print lines containing this text.
    #[arg(value_name = "SUBPATH")]
    pub subpath: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct CheckArgs {
    /// Archive directory or single part file.
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Also extract every part and compare its content with the recorded hashes.
    #[arg(long, short = 'd', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub deep: Option<bool>,

    /// Print the full report as JSON on stdout.
    #[arg(long)]
    pub json: bool,

    /// Worker count.
    #[arg(long, short = 'n')]
    pub threads: Option<usize>,
}
