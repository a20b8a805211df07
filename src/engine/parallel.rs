//! Bounded worker pools: a crossbeam-channel pool for whole parts, a rayon pool for per-file hashing.

use crossbeam_channel::bounded;
use log::debug;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::thread;

use crate::error::{ArchiveError, ArchiveResult};

/// Run `f` over `items` on at most `workers` threads and return the results in input order.
///
/// Items are handed out through a channel, so execution order is unspecified; the call returns
/// once every item has been processed. A panicking job propagates when the scope joins.
pub fn run_bounded<T, R, F>(items: Vec<T>, workers: usize, f: F) -> Vec<R>
where
    T: Send,
    R: Send,
    F: Fn(T) -> R + Sync,
{
    let total = items.len();
    if total == 0 {
        return Vec::new();
    }
    let workers = workers.clamp(1, total);
    debug!("Running {total} jobs on {workers} workers");

    let (job_tx, job_rx) = bounded::<(usize, T)>(total);
    let (result_tx, result_rx) = bounded::<(usize, R)>(total);
    for job in items.into_iter().enumerate() {
        // Capacity equals the job count, so this never blocks.
        let _ = job_tx.send(job);
    }
    drop(job_tx);

    let f = &f;
    thread::scope(|s| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            s.spawn(move || {
                while let Ok((idx, item)) = job_rx.recv() {
                    let _ = result_tx.send((idx, f(item)));
                }
            });
        }
    });
    drop(result_tx);

    let mut slots: Vec<Option<R>> = (0..total).map(|_| None).collect();
    for (idx, result) in result_rx.iter() {
        slots[idx] = Some(result);
    }
    slots.into_iter().flatten().collect()
}

/// Thread pool for hashing the files of one part.
pub fn hashing_pool(threads: usize) -> ArchiveResult<ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .thread_name(|i| format!("{}-hash-{i}", env!("CARGO_PKG_NAME")))
        .build()
        .map_err(|e| ArchiveError::validation(format!("cannot build hashing pool: {e}")))
}
