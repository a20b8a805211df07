//! Caps the part worker count by the open-file limit. A part worker holds tool pipes, a sidecar
//! writer and hashing handles at the same time.

use log::debug;

/// Descriptors one part worker may hold at once.
pub const FDS_PER_WORKER: u64 = 16;

/// Share of the soft limit (in percent) the part workers may use together.
const FD_BUDGET_PERCENT: u64 = 80;

/// Soft `RLIMIT_NOFILE`, or `None` when it is unlimited or cannot be read.
#[cfg(unix)]
pub fn open_file_limit() -> Option<u64> {
    let mut rlim = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    // SAFETY: `rlim` is a valid, writable rlimit for the duration of the call.
    let rc = unsafe { libc::getrlimit(libc::RLIMIT_NOFILE, &mut rlim) };
    if rc != 0 || rlim.rlim_cur == libc::RLIM_INFINITY {
        return None;
    }
    Some(rlim.rlim_cur as u64)
}

#[cfg(not(unix))]
pub fn open_file_limit() -> Option<u64> {
    None
}

/// Part workers that fit into the descriptor budget of `limit`. Never less than one.
pub fn workers_within(limit: u64) -> usize {
    let budget = limit.saturating_mul(FD_BUDGET_PERCENT) / 100;
    usize::try_from(budget / FDS_PER_WORKER)
        .unwrap_or(usize::MAX)
        .max(1)
}

/// Clamp `requested` to at least one and to what the open-file limit allows.
pub fn cap_workers(requested: usize) -> usize {
    let requested = requested.max(1);
    let Some(limit) = open_file_limit() else {
        return requested;
    };
    let cap = workers_within(limit);
    if cap < requested {
        debug!("{requested} workers would exceed the open-file limit of {limit}, using {cap}");
        return cap;
    }
    requested
}
