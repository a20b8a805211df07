//! Worker count resolution: CLI flag → settings file → env var → .env in dir → available parallelism.

use log::{debug, info, warn};
use std::path::Path;

use crate::utils::config::PackagePaths;
use crate::utils::fd_limit::cap_workers;

fn parse_threads(var: &str, raw: &str) -> Option<usize> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            warn!("Environment variable {var} doesn't contain a valid number of threads");
            None
        }
    }
}

fn try_env_then_dotenv(dir: &Path) -> Option<usize> {
    let var = PackagePaths::get().threads_env_var();
    if let Ok(s) = std::env::var(var) {
        return parse_threads(var, &s);
    }
    let env_path = dir.join(".env");
    if env_path.is_file() {
        let _ = dotenvy::from_path(&env_path);
        if let Ok(s) = std::env::var(var) {
            return parse_threads(var, &s);
        }
    }
    debug!("Environment variable {var} is not set");
    None
}

/// Pick the worker count from the first source that provides one, capped by the FD limit.
pub fn resolve_threads(cli: Option<usize>, file: Option<usize>, dir: &Path) -> usize {
    let threads = cli.or(file).or_else(|| try_env_then_dotenv(dir));
    let threads = match threads {
        Some(n) => n,
        None => {
            let n = rayon::current_num_threads();
            info!("Number of threads is not set, using {n} threads");
            n
        }
    };
    cap_workers(threads)
}
