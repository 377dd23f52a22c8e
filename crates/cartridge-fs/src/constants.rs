//! Well-known names in a cartridge's on-disk layout.

use std::path::Path;

/// Standard cartridge layout entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartridgePath {
    /// The `metadata` directory holding the manifest
    MetadataDir,
    /// The `manifest.yml` file inside `metadata`
    ManifestFile,
    /// The `bin` directory holding cartridge hooks
    BinDir,
    /// The `control` script inside `bin`
    ControlScript,
    /// The `usr` directory of shared, read-mostly assets
    UsrDir,
}

impl CartridgePath {
    /// Get the string representation of the path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MetadataDir => "metadata",
            Self::ManifestFile => "manifest.yml",
            Self::BinDir => "bin",
            Self::ControlScript => "control",
            Self::UsrDir => "usr",
        }
    }

    /// Path of the manifest relative to a cartridge root: `metadata/manifest.yml`.
    pub fn manifest_relative() -> &'static Path {
        Path::new("metadata/manifest.yml")
    }

    /// Path of the control script relative to a cartridge root: `bin/control`.
    pub fn control_relative() -> &'static Path {
        Path::new("bin/control")
    }
}

impl AsRef<Path> for CartridgePath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for CartridgePath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for CartridgePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
