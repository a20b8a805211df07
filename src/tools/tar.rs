//! `tar` as the bundler.

use std::io::Write;
use std::path::Path;
use std::process::Command;

use crate::error::ArchiveResult;
use crate::utils::config::PackagePaths;

use super::Bundler;
use super::command::{run_tool, run_tool_stdout};

/// GNU tar in POSIX format. Members are passed NUL-separated through a temporary file list so
/// any file name survives.
#[derive(Clone, Debug)]
pub struct TarBundler {
    program: String,
}

impl Default for TarBundler {
    fn default() -> Self {
        TarBundler {
            program: "tar".to_string(),
        }
    }
}

impl Bundler for TarBundler {
    fn bundle(
        &self,
        paths: &[String],
        base_dir: &Path,
        dest: &Path,
        work_dir: Option<&Path>,
    ) -> ArchiveResult<()> {
        let list_dir = work_dir
            .or_else(|| dest.parent())
            .unwrap_or_else(|| Path::new("."));
        let mut list = tempfile::Builder::new()
            .prefix(PackagePaths::get().scratch_prefix())
            .suffix(".files")
            .tempfile_in(list_dir)?;
        for path in paths {
            list.write_all(path.as_bytes())?;
            list.write_all(b"\0")?;
        }
        list.flush()?;

        run_tool(
            Command::new(&self.program)
                .arg("--posix")
                .arg("-cf")
                .arg(dest)
                .arg("-C")
                .arg(base_dir)
                .args(["--null", "--no-recursion", "--verbatim-files-from"])
                .arg("--files-from")
                .arg(list.path()),
        )?;
        Ok(())
    }

    fn list(&self, bundle: &Path) -> ArchiveResult<String> {
        run_tool_stdout(Command::new(&self.program).arg("-tvf").arg(bundle))
    }

    fn extract(&self, bundle: &Path, dest_dir: &Path, subpath: Option<&Path>) -> ArchiveResult<()> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-xf").arg(bundle).arg("-C").arg(dest_dir);
        if let Some(sub) = subpath {
            cmd.arg(sub);
        }
        run_tool(&mut cmd)?;
        Ok(())
    }
}
