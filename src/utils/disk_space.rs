//! Free-space checks run before decrypting, encrypting or extracting.

use log::debug;
use std::path::Path;

use crate::error::{ArchiveError, ArchiveResult};
use crate::utils::config::REQUIRED_SPACE_MULTIPLIER;

/// Bytes available to an unprivileged user on the filesystem holding `path`.
#[cfg(unix)]
pub fn available_bytes(path: &Path) -> std::io::Result<u64> {
    use std::ffi::CString;
    use std::mem::MaybeUninit;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    let mut stat = MaybeUninit::<libc::statvfs>::uninit();
    if unsafe { libc::statvfs(c_path.as_ptr(), stat.as_mut_ptr()) } != 0 {
        return Err(std::io::Error::last_os_error());
    }
    let stat = unsafe { stat.assume_init() };
    Ok(stat.f_frsize as u64 * stat.f_bavail as u64)
}

#[cfg(not(unix))]
pub fn available_bytes(_path: &Path) -> std::io::Result<u64> {
    Ok(u64::MAX)
}

/// Bytes that must be free to write `estimated` bytes, safety margin included.
pub fn required_with_margin(estimated: u64) -> u64 {
    (estimated as f64 * REQUIRED_SPACE_MULTIPLIER).ceil() as u64
}

/// Fail with [`ArchiveError::DiskSpace`] unless `path`'s filesystem can take `estimated` bytes plus margin.
pub fn ensure_capacity(operation: &'static str, path: &Path, estimated: u64) -> ArchiveResult<()> {
    let available = available_bytes(path)?;
    let required = required_with_margin(estimated);
    debug!(
        "Space for {operation} in {}: {available} available, {required} required",
        path.display()
    );
    if available < required {
        return Err(ArchiveError::DiskSpace {
            operation,
            path: path.to_path_buf(),
            available,
            required,
        });
    }
    Ok(())
}
