//! Load `.parchiver.toml` from the working directory (CLI only). Lib callers pass options directly.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::ArchiveOpts;
use crate::utils::config::PackagePaths;

#[derive(Debug, Default, Deserialize)]
pub struct ParchiverToml {
    #[serde(default)]
    settings: SettingsSection,
}

#[derive(Debug, Default, Deserialize)]
struct SettingsSection {
    threads: Option<usize>,
    compression: Option<u32>,
    work_dir: Option<String>,
    keys: Option<Vec<String>>,
    remove_unencrypted: Option<bool>,
    verbose: Option<bool>,
}

/// Load the settings file from `dir` if present. Returns None if file missing or unreadable.
pub fn load_settings(dir: &Path) -> Option<ParchiverToml> {
    let path = dir.join(PackagePaths::get().config_filename());
    let s = std::fs::read_to_string(&path).ok()?;
    toml::from_str(&s)
        .map_err(|e| log::warn!("{}: {}", path.display(), e))
        .ok()
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($idx:expr, $opts:expr, $idx_field:ident => $opts_field:ident) => {
        if let Some(v) = $idx.$idx_field {
            $opts.$opts_field = v;
        }
    };
}

impl ParchiverToml {
    pub fn threads(&self) -> Option<usize> {
        self.settings.threads
    }

    pub fn work_dir(&self) -> Option<PathBuf> {
        self.settings.work_dir.as_ref().map(PathBuf::from)
    }

    pub fn verbose(&self) -> bool {
        self.settings.verbose.unwrap_or(false)
    }

    /// Apply file values to `opts` (only fields present in the file). Call before applying CLI flags.
    pub fn apply_to_archive_opts(&self, opts: &mut ArchiveOpts) {
        let s = &self.settings;
        apply_file_opt!(s, opts, threads => threads);
        apply_file_opt!(s, opts, compression => compression);
        apply_file_opt!(s, opts, remove_unencrypted => remove_unencrypted);
        apply_file_opt!(s, opts, verbose => verbose);
        if let Some(ref dir) = s.work_dir {
            opts.work_dir = Some(PathBuf::from(dir));
        }
        if let Some(ref keys) = s.keys {
            opts.encryption_keys = keys.iter().map(PathBuf::from).collect();
        }
    }
}
