//! `plzip` (parallel lzip) as the compressor.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::engine::tools::add_suffix;
use crate::error::{ArchiveError, ArchiveResult};

use super::Compressor;
use super::command::{run_tool, run_tool_stdout};

/// Extension plzip appends to the file it compresses.
pub const LZ_EXTENSION: &str = ".lz";

#[derive(Clone, Debug)]
pub struct Plzip {
    program: String,
}

impl Default for Plzip {
    fn default() -> Self {
        Plzip {
            program: "plzip".to_string(),
        }
    }
}

/// `plzip -l` prints a header and one row per file; the uncompressed size is the first column
/// of the last row.
pub fn parse_list_output(text: &str) -> Option<u64> {
    text.lines()
        .rev()
        .find(|l| !l.trim().is_empty())?
        .split_whitespace()
        .next()?
        .parse()
        .ok()
}

impl Compressor for Plzip {
    fn compress(&self, src: &Path, level: u32, threads: usize) -> ArchiveResult<PathBuf> {
        run_tool(
            Command::new(&self.program)
                .arg(format!("-{level}"))
                .arg("--threads")
                .arg(threads.max(1).to_string())
                .arg(src),
        )?;
        Ok(add_suffix(src, LZ_EXTENSION))
    }

    fn decompress(&self, src: &Path, threads: usize) -> ArchiveResult<PathBuf> {
        let name = src.to_string_lossy();
        let out = name.strip_suffix(LZ_EXTENSION).ok_or_else(|| {
            ArchiveError::validation(format!("not an {LZ_EXTENSION} file: {}", src.display()))
        })?;
        run_tool(
            Command::new(&self.program)
                .args(["-d", "--threads"])
                .arg(threads.max(1).to_string())
                .arg(src),
        )?;
        Ok(PathBuf::from(out))
    }

    fn uncompressed_size(&self, src: &Path) -> ArchiveResult<u64> {
        let text = run_tool_stdout(Command::new(&self.program).arg("-l").arg(src))?;
        parse_list_output(&text).ok_or_else(|| ArchiveError::SidecarFormat {
            origin: format!("{} -l {}", self.program, src.display()),
            line_no: text.lines().count(),
            line: text.lines().last().unwrap_or("").to_string(),
        })
    }
}
