//! Part-level progress bar, shown in verbose mode only.

use kdam::{Animation, Bar, BarExt};
use std::sync::Mutex;

/// Counts finished parts of one stage. Shared by reference between the part workers.
pub struct PartsProgress {
    bar: Mutex<Bar>,
}

impl PartsProgress {
    pub fn new(total: usize, desc: &'static str) -> Self {
        PartsProgress {
            bar: Mutex::new(kdam::tqdm!(
                total = total,
                desc = desc,
                animation = Animation::Classic,
                unit = " parts"
            )),
        }
    }

    /// A bar when `verbose` is set, nothing otherwise.
    pub fn start(verbose: bool, total: usize, desc: &'static str) -> Option<Self> {
        verbose.then(|| Self::new(total, desc))
    }

    /// One more part done. A contended lock skips the redraw rather than blocking a worker;
    /// [`finish`](Self::finish) catches up.
    pub fn advance(&self) {
        if let Ok(mut bar) = self.bar.try_lock() {
            let _ = bar.update(1);
        }
    }

    /// Bring the bar to its total and move the cursor past it.
    pub fn finish(self) {
        if let Ok(mut bar) = self.bar.into_inner() {
            let total = bar.total;
            let _ = bar.update_to(total);
            eprintln!();
        }
    }
}
