pub mod config;
pub mod disk_space;
pub mod env;
pub mod fd_limit;
pub mod logger;
pub mod settings;

pub use config::*;
pub use disk_space::{available_bytes, ensure_capacity};
pub use env::resolve_threads;
pub use fd_limit::{FDS_PER_WORKER, cap_workers, open_file_limit, workers_within};
pub use logger::{Colors, setup_logging};
pub use settings::{ParchiverToml, load_settings};
