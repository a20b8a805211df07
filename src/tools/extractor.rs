//! Streaming extraction: `plzip -d -c` piped into `tar -x`, no intermediate bundle on disk.

use std::path::Path;
use std::process::{Child, Command, Stdio};

use log::debug;

use crate::error::ArchiveResult;

use super::Extractor;
use super::command::{combined_output, spawn_error, tool_error};

#[derive(Clone, Debug)]
pub struct PipeExtractor {
    decompressor: String,
    bundler: String,
}

impl Default for PipeExtractor {
    fn default() -> Self {
        PipeExtractor {
            decompressor: "plzip".to_string(),
            bundler: "tar".to_string(),
        }
    }
}

/// Stop a child whose counterpart in the pipe never started, and reap it.
fn abandon(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

impl Extractor for PipeExtractor {
    fn extract(
        &self,
        archive: &Path,
        dest_dir: &Path,
        subpath: Option<&Path>,
        threads: usize,
    ) -> ArchiveResult<()> {
        debug!("Extracting {} into {}", archive.display(), dest_dir.display());
        let mut decompress = Command::new(&self.decompressor)
            .args(["-d", "-c", "--threads"])
            .arg(threads.max(1).to_string())
            .arg(archive)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| spawn_error(&self.decompressor, e))?;
        let pipe = decompress
            .stdout
            .take()
            .map(Stdio::from)
            .unwrap_or_else(Stdio::null);

        let mut unbundle = Command::new(&self.bundler);
        unbundle.arg("-x").arg("-C").arg(dest_dir);
        if let Some(sub) = subpath {
            unbundle.arg(sub);
        }
        let unbundle = match unbundle
            .stdin(pipe)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                abandon(&mut decompress);
                return Err(spawn_error(&self.bundler, e));
            }
        };

        let unbundle_out = unbundle.wait_with_output()?;
        let decompress_out = decompress.wait_with_output()?;
        if !decompress_out.status.success() {
            return Err(tool_error(
                &self.decompressor,
                &decompress_out.status,
                combined_output(&decompress_out),
            ));
        }
        if !unbundle_out.status.success() {
            return Err(tool_error(
                &self.bundler,
                &unbundle_out.status,
                combined_output(&unbundle_out),
            ));
        }
        Ok(())
    }
}
