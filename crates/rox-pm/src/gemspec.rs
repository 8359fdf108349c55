//! Gemspec model.

use std::path::Path;

use serde::{Deserialize, Serialize};

use rox_version::{Requirement, Version};

use crate::Result;

/// An installable gem's descriptor.
///
/// Loaded from the metadata shipped alongside the data archive; immutable
/// for the duration of an install.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gemspec {
    /// Gem name
    pub name: String,

    /// Gem version
    pub version: Version,

    /// Command names published into the shared bin directory
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub executables: Vec<String>,

    /// Native extension build scripts, relative to the gem directory
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<String>,

    /// Ruby version the gem requires
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_ruby_version: Option<Requirement>,

    /// RubyGems version the gem requires
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_rubygems_version: Option<Requirement>,

    /// Message shown after a successful install
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_install_message: Option<String>,
}

impl Gemspec {
    /// Create a gemspec with no executables, extensions, or requirements.
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
            executables: Vec::new(),
            extensions: Vec::new(),
            required_ruby_version: None,
            required_rubygems_version: None,
            post_install_message: None,
        }
    }

    /// "<name>-<version>", the per-version directory name.
    pub fn full_name(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }

    /// File name of this gemspec under specifications/.
    pub fn spec_file_name(&self) -> String {
        format!("{}.json", self.full_name())
    }

    /// Parse a gemspec from its JSON form.
    pub fn from_json(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }

    /// Serialize to the JSON form recorded under specifications/.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a gemspec from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}
