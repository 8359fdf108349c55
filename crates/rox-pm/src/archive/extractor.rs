//! Containment-checked extraction of archive entries.

use std::ffi::OsStr;
use std::fs;
use std::path::{Component, Path, PathBuf};

use log::debug;

use crate::{InstallError, Result};

use super::PackageArchive;

/// Writes archive entries under a destination directory, rejecting any
/// entry whose declared path would land outside it.
pub struct ArchiveExtractor;

impl ArchiveExtractor {
    /// Unpack every entry of `archive` under `dest_dir`.
    ///
    /// Entry paths are validated before anything is written: absolute
    /// paths and `..` segments that climb out of `dest_dir` abort the
    /// whole extraction. Surviving entries are written and then have the
    /// entry's permission bits applied.
    pub fn extract_files(dest_dir: &Path, archive: &mut dyn PackageArchive) -> Result<()> {
        fs::create_dir_all(dest_dir)?;

        for entry in archive.entries()? {
            let entry = entry?;
            let target = Self::entry_target(dest_dir, &entry.path)?;

            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, &entry.data)?;
            Self::apply_mode(&target, entry.mode)?;

            debug!("extracted {} ({} bytes)", target.display(), entry.data.len());
        }

        Ok(())
    }

    /// Resolve an entry's declared path against the destination. The check
    /// is lexical: `.` segments collapse, `..` segments pop, and popping
    /// past the destination or starting from an absolute path is a
    /// containment violation.
    fn entry_target(dest_dir: &Path, declared: &str) -> Result<PathBuf> {
        let violation = || InstallError::PathContainment {
            path: declared.to_string(),
            destination: dest_dir.to_path_buf(),
        };

        let mut parts: Vec<&OsStr> = Vec::new();
        for component in Path::new(declared).components() {
            match component {
                Component::Normal(part) => parts.push(part),
                Component::CurDir => {}
                Component::ParentDir => {
                    if parts.pop().is_none() {
                        return Err(violation());
                    }
                }
                Component::RootDir | Component::Prefix(_) => return Err(violation()),
            }
        }

        // an entry that resolves to the destination itself is no file
        if parts.is_empty() {
            return Err(violation());
        }

        let mut target = dest_dir.to_path_buf();
        target.extend(parts);
        Ok(target)
    }

    #[cfg(unix)]
    fn apply_mode(path: &Path, mode: u32) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn apply_mode(_path: &Path, _mode: u32) -> Result<()> {
        Ok(())
    }
}
