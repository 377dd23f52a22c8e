//! Error types for cartridge-repo

use std::path::PathBuf;

/// Result type for repository operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in repository operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid cartridge source {path}: {reason}")]
    InvalidArgument { path: PathBuf, reason: String },

    #[error("Cartridge not found: {}", describe_key(.name, .software_version.as_deref(), .revision.as_deref()))]
    NotFound {
        name: String,
        software_version: Option<String>,
        revision: Option<String>,
    },

    #[error("Manifest error: {0}")]
    Manifest(#[from] cartridge_manifest::Error),

    #[error("Filesystem error: {0}")]
    Fs(#[from] cartridge_fs::Error),
}

impl Error {
    pub fn invalid_argument(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(name: &str, software_version: Option<&str>, revision: Option<&str>) -> Self {
        Self::NotFound {
            name: name.to_string(),
            software_version: software_version.map(str::to_string),
            revision: revision.map(str::to_string),
        }
    }
}

/// Render a possibly partial key as `name, version, revision` with `*` for wildcards.
fn describe_key(name: &str, software_version: Option<&str>, revision: Option<&str>) -> String {
    format!(
        "name '{}', version '{}', revision '{}'",
        name,
        software_version.unwrap_or("*"),
        revision.unwrap_or("*")
    )
}
