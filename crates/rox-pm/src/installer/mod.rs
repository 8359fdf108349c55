//! Gem installation.
//!
//! The installer drives one gem through extraction, extension builds, and
//! bin stub publication, then records the gemspec under specifications/.

mod binstub;
mod installer;

pub use binstub::{wrapper_script, BinStubInstaller, StubConfig};
pub use installer::{InstallOptions, Installer};
