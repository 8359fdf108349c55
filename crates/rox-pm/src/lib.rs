pub mod archive;
pub mod error;
pub mod extension;
pub mod gemspec;
pub mod home;
pub mod installer;
pub mod output;

pub use archive::{ArchiveExtractor, FileEntry, MemoryArchive, PackageArchive, TarGzArchive};
pub use error::{InstallError, Result};
pub use extension::{BuildConfig, BuildLog, BuilderKind, ExtensionBuilder};
pub use gemspec::Gemspec;
pub use home::GemHome;
pub use installer::{wrapper_script, BinStubInstaller, InstallOptions, Installer, StubConfig};
pub use output::{ConsoleOutput, InstallOutput, MemoryOutput};
