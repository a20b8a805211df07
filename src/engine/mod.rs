//! Engine module: CLI front-end and the shared building blocks (hashing, worker pools, paths)

pub mod arg_parser;
pub mod handlers;
pub mod hashing;
pub mod parallel;
pub mod progress;
pub mod tools;

// Re-export commonly used functions
pub use arg_parser::{Cli, Commands, CommonArgs, CreateCommands};
pub use handlers::{failure_code, handle_run};
pub use hashing::{hash_bytes, hash_file, hash_path};
pub use parallel::run_bounded;
pub use tools::{compare_part_names, parse_size, path_relative_to};
