//! `gpg` as the encryptor, public-key recipients read from key files.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::ArchiveResult;
use crate::utils::config::ENCRYPTION_ALGORITHM;

use super::Encryptor;
use super::command::run_tool;

#[derive(Clone, Debug)]
pub struct Gpg {
    program: String,
}

impl Default for Gpg {
    fn default() -> Self {
        Gpg {
            program: "gpg".to_string(),
        }
    }
}

impl Encryptor for Gpg {
    fn encrypt(&self, src: &Path, dest: &Path, keys: &[PathBuf]) -> ArchiveResult<()> {
        let mut cmd = Command::new(&self.program);
        // Input is already compressed.
        cmd.args(["--cipher-algo", ENCRYPTION_ALGORITHM, "-z", "0", "--batch", "--yes"])
            .arg("--output")
            .arg(dest)
            .arg("--encrypt");
        for key in keys {
            cmd.arg("--recipient-file").arg(key);
        }
        cmd.arg(src);
        run_tool(&mut cmd)?;
        Ok(())
    }

    fn decrypt(&self, src: &Path, dest: &Path) -> ArchiveResult<()> {
        run_tool(
            Command::new(&self.program)
                .args(["--batch", "--yes", "--output"])
                .arg(dest)
                .arg("--decrypt")
                .arg(src),
        )?;
        Ok(())
    }
}
