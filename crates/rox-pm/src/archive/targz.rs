//! tar.gz archive adapter.

use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;

use crate::{InstallError, Result};

use super::{FileEntry, PackageArchive};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Adapter over a gzipped tar file, the container gems ship their data
/// files in. Non-regular entries (directories, links) are skipped.
pub struct TarGzArchive {
    path: PathBuf,
    archive: tar::Archive<GzDecoder<File>>,
}

impl TarGzArchive {
    /// Open an archive file, sniffing the gzip magic so that handing the
    /// installer a non-gem file fails up front.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)?;

        let mut magic = [0u8; 2];
        let valid = match file.read_exact(&mut magic) {
            Ok(()) => magic == GZIP_MAGIC,
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => false,
            Err(e) => return Err(e.into()),
        };
        if !valid {
            return Err(InstallError::InvalidArchive {
                path: path.to_path_buf(),
            });
        }
        file.seek(SeekFrom::Start(0))?;

        Ok(Self {
            path: path.to_path_buf(),
            archive: tar::Archive::new(GzDecoder::new(file)),
        })
    }
}

// the inner tar reader has no Debug impl
impl fmt::Debug for TarGzArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TarGzArchive")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl PackageArchive for TarGzArchive {
    fn entries(&mut self) -> Result<Box<dyn Iterator<Item = Result<FileEntry>> + '_>> {
        let path = self.path.clone();
        let entries = self.archive.entries().map_err(|_| InstallError::InvalidArchive {
            path: path.clone(),
        })?;

        Ok(Box::new(entries.filter_map(move |entry| {
            read_entry(entry, &path).transpose()
        })))
    }
}

fn read_entry(
    entry: std::io::Result<tar::Entry<'_, GzDecoder<File>>>,
    archive_path: &Path,
) -> Result<Option<FileEntry>> {
    let mut entry = entry.map_err(|_| InstallError::InvalidArchive {
        path: archive_path.to_path_buf(),
    })?;

    if !entry.header().entry_type().is_file() {
        return Ok(None);
    }

    let path = entry
        .path()
        .map_err(|_| InstallError::InvalidArchive {
            path: archive_path.to_path_buf(),
        })?
        .to_string_lossy()
        .into_owned();
    let size = entry.header().size()?;
    let mode = entry.header().mode()?;

    // the declared size is untrusted; cap the allocation hint and treat
    // an entry that cannot deliver its declared bytes as malformed
    let mut data = Vec::with_capacity(size.min(64 * 1024) as usize);
    entry.read_to_end(&mut data)?;
    if data.len() as u64 != size {
        return Err(InstallError::InvalidArchive {
            path: archive_path.to_path_buf(),
        });
    }

    Ok(Some(FileEntry {
        path,
        size,
        mode,
        data,
    }))
}
