use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InstallError {
    // Archive errors
    #[error("invalid gem format for {}", path.display())]
    InvalidArchive { path: PathBuf },

    #[error("attempt to install file into {path:?} under {}", destination.display())]
    PathContainment { path: String, destination: PathBuf },

    // Extension build errors
    #[error("No builder for extension '{extension}'")]
    UnsupportedExtension { extension: String },

    #[error("Failed to build gem native extension; results logged to {}", log.display())]
    ExtensionBuild { log: PathBuf },

    // Bin stub errors
    #[error("You don't have write permissions into the {} directory", path.display())]
    FilePermission { path: PathBuf },

    // Precondition errors
    #[error("{package} requires {tool} version {constraint}")]
    RequirementUnmet {
        package: String,
        tool: String,
        constraint: String,
    },

    // Version errors
    #[error("Invalid version: {0}")]
    Version(#[from] rox_version::VersionError),

    // Gemspec errors
    #[error("Invalid gemspec JSON: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, InstallError>;
