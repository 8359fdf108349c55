//! Build log accumulation for native extension builds.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::Result;

/// Default build log name, resolved against the process working directory.
pub const DEFAULT_BUILD_LOG: &str = "gem_make.out";

/// Append-only log collecting every extension build's output for one
/// install. The file is created on first append and left on disk so
/// failures can be inspected afterwards.
#[derive(Debug, Clone)]
pub struct BuildLog {
    path: PathBuf,
}

impl BuildLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Where the log lives; build-failure errors point here.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one block of text, creating the file if needed.
    pub fn append(&self, text: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(text.as_bytes())?;
        Ok(())
    }
}
