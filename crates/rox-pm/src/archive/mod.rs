//! Package archives and containment-checked extraction.
//!
//! The container format stays behind the `PackageArchive` trait: the
//! extractor only ever sees a lazy sequence of entries whose declared
//! paths are untrusted.

mod extractor;
mod targz;

pub use extractor::ArchiveExtractor;
pub use targz::TarGzArchive;

use crate::Result;

/// One file carried by a package archive.
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Declared path, relative to the unpack destination. Untrusted.
    pub path: String,
    /// Content size in bytes
    pub size: u64,
    /// POSIX permission bits
    pub mode: u32,
    /// File content
    pub data: Vec<u8>,
}

/// A gem's data archive: a finite, single-pass sequence of file entries
/// in no guaranteed order.
pub trait PackageArchive {
    /// Iterate the archive's file entries. Reading is lazy, so container
    /// corruption can surface from the iterator as well as from `entries`
    /// itself.
    fn entries(&mut self) -> Result<Box<dyn Iterator<Item = Result<FileEntry>> + '_>>;
}

/// An archive already materialized in memory.
///
/// The smallest useful adapter; also how tests feed the extractor.
#[derive(Debug, Default)]
pub struct MemoryArchive {
    entries: Vec<FileEntry>,
}

impl MemoryArchive {
    pub fn new(entries: Vec<FileEntry>) -> Self {
        Self { entries }
    }
}

impl PackageArchive for MemoryArchive {
    fn entries(&mut self) -> Result<Box<dyn Iterator<Item = Result<FileEntry>> + '_>> {
        Ok(Box::new(self.entries.drain(..).map(Ok)))
    }
}
