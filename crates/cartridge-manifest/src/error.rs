use std::path::PathBuf;

/// Errors raised while loading a cartridge manifest.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Manifest is not valid YAML.
    #[error("failed to parse cartridge manifest: {0}")]
    ManifestParse(#[from] serde_yaml::Error),

    /// Manifest file not found at the expected path.
    #[error("cartridge manifest not found: {0}")]
    ManifestNotFound(PathBuf),

    /// Manifest could not be read.
    #[error("failed to read cartridge manifest at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Manifest YAML is not a mapping at the top level.
    #[error("cartridge manifest must be a mapping of fields")]
    NotAMapping,

    /// A required field is absent or empty.
    #[error("cartridge manifest is missing required field '{field}'")]
    MissingField { field: &'static str },

    /// Name or vendor contains characters unusable in a repository path.
    #[error("invalid cartridge {field} '{value}': {reason}")]
    InvalidName {
        field: &'static str,
        value: String,
        reason: String,
    },

    /// The selected software version is not declared by the manifest.
    #[error("cartridge '{name}' does not support version '{version}' (supported: {})", .supported.join(", "))]
    UnsupportedVersion {
        name: String,
        version: String,
        supported: Vec<String>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
