//! File hashing utilities

use memmap2::Mmap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::utils::config::HashingConsts;

/// Hex digest of a file's content. Uses memory-mapped I/O above the threshold, chunked reading otherwise.
pub fn hash_file(path: &Path) -> std::io::Result<String> {
    let file = File::open(path)?;
    let size = file.metadata()?.len();
    let mut ctx = md5::Context::new();

    if size > HashingConsts::HASH_MMAP_THRESHOLD {
        let mmap = unsafe { Mmap::map(&file)? };
        ctx.consume(&mmap[..]);
    } else {
        let mut reader =
            std::io::BufReader::with_capacity(HashingConsts::HASH_READ_CHUNK_SIZE, file);
        let mut buffer = vec![0u8; HashingConsts::HASH_READ_CHUNK_SIZE];
        loop {
            let n = reader.read(&mut buffer)?;
            if n == 0 {
                break;
            }
            ctx.consume(&buffer[..n]);
        }
    }

    Ok(format!("{:x}", ctx.compute()))
}

/// Hex digest of a symlink's raw target string; the target itself is never read.
pub fn hash_symlink(path: &Path) -> std::io::Result<String> {
    let target = std::fs::read_link(path)?;
    Ok(hash_bytes(target.as_os_str().as_encoded_bytes()))
}

/// Symlink-aware digest: link target string for symlinks, content for everything else.
pub fn hash_path(path: &Path) -> std::io::Result<String> {
    if std::fs::symlink_metadata(path)?.file_type().is_symlink() {
        hash_symlink(path)
    } else {
        hash_file(path)
    }
}

pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:x}", md5::compute(bytes))
}
