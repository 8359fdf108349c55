//! Gem home directory layout.

use std::path::{Path, PathBuf};

use crate::gemspec::Gemspec;

/// Layout of an installation root.
///
/// Gems are unpacked to `gems/<name>-<version>`, executables are published
/// into the shared `bin/`, and installed gemspecs are recorded under
/// `specifications/`.
#[derive(Debug, Clone)]
pub struct GemHome {
    base: PathBuf,
}

impl GemHome {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// The installation root itself.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Directory holding one subdirectory per installed gem version.
    pub fn gems_dir(&self) -> PathBuf {
        self.base.join("gems")
    }

    /// Shared executable directory for all installed gems.
    pub fn bin_dir(&self) -> PathBuf {
        self.base.join("bin")
    }

    /// Record of installed gemspecs.
    pub fn specifications_dir(&self) -> PathBuf {
        self.base.join("specifications")
    }

    /// Per-version directory a gem's files are unpacked into.
    pub fn package_dir(&self, spec: &Gemspec) -> PathBuf {
        self.gems_dir().join(spec.full_name())
    }
}
