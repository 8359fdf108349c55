//! Native extension builds.
//!
//! Gems declare build scripts by file name; the builder picks the
//! matching tool chain and funnels every command's output into a shared
//! build log.

mod build_log;
mod builder;

pub use build_log::{BuildLog, DEFAULT_BUILD_LOG};
pub use builder::{BuildConfig, BuilderKind, ExtensionBuilder};
