//! Gem-style version ordering and requirement matching
//!
//! This crate provides version parsing with the total ordering used by
//! gem-style package managers, plus requirement matching over the
//! operators `=`, `!=`, `>`, `<`, `>=`, `<=` and `~>`.

mod requirement;
mod version;

pub use requirement::{Op, Requirement};
pub use version::{Segment, Version, VersionError};
