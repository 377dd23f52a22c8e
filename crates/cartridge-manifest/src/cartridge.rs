//! The cartridge descriptor produced by manifest parsing.

use std::fmt;
use std::path::{Path, PathBuf};

use serde_yaml::Mapping;
use uuid::Uuid;

use crate::error::Result;
use crate::manifest;

/// Stable identity assigned when a descriptor is created.
///
/// Projections of a descriptor onto one of its software versions keep the
/// identity, so the index can find every slot that refers to the same package
/// without comparing fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CartridgeId(Uuid);

impl CartridgeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CartridgeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CartridgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a descriptor's manifest came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestOrigin {
    /// Read from a manifest file on local disk.
    File(PathBuf),
    /// Supplied as text; the cartridge's files must be fetched from `Source-Url`.
    Url,
}

/// A parsed cartridge descriptor.
#[derive(Debug, Clone)]
pub struct Cartridge {
    pub(crate) id: CartridgeId,
    pub(crate) name: String,
    pub(crate) vendor: String,
    pub(crate) software_version: String,
    pub(crate) versions: Vec<String>,
    pub(crate) revision: String,
    pub(crate) display_name: Option<String>,
    pub(crate) short_name: Option<String>,
    pub(crate) source_url: Option<String>,
    pub(crate) source_checksum: Option<String>,
    pub(crate) origin: ManifestOrigin,
    pub(crate) repository_path: Option<PathBuf>,
    /// Manifest fields after any version override was applied.
    pub(crate) raw: Mapping,
    /// Manifest fields as written, used to project onto other versions.
    pub(crate) base: Mapping,
}

impl Cartridge {
    pub fn id(&self) -> CartridgeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    /// The selected software version, or the manifest's default `Version`.
    pub fn software_version(&self) -> &str {
        &self.software_version
    }

    /// Every software version the cartridge declares, in manifest order.
    pub fn versions(&self) -> &[String] {
        &self.versions
    }

    /// The package revision (`Cartridge-Version`).
    pub fn revision(&self) -> &str {
        &self.revision
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn short_name(&self) -> Option<&str> {
        self.short_name.as_deref()
    }

    pub fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }

    pub fn source_checksum(&self) -> Option<&str> {
        self.source_checksum.as_deref()
    }

    pub fn origin(&self) -> &ManifestOrigin {
        &self.origin
    }

    /// The manifest file path, when the manifest was read from disk.
    pub fn manifest_path(&self) -> Option<&Path> {
        match &self.origin {
            ManifestOrigin::File(path) => Some(path),
            ManifestOrigin::Url => None,
        }
    }

    /// The cartridge's home in the on-disk store, once placed there.
    pub fn repository_path(&self) -> Option<&Path> {
        self.repository_path.as_deref()
    }

    /// The raw manifest mapping for downstream consumers.
    pub fn raw(&self) -> &Mapping {
        &self.raw
    }

    /// The `{vendor}-{name}` directory name used in the store.
    pub fn directory_name(&self) -> String {
        format!("{}-{}", self.vendor, self.name)
    }

    /// The store location for this cartridge: `{root}/{vendor}-{name}/{revision}`.
    pub fn repository_path_under(&self, root: &Path) -> PathBuf {
        root.join(self.directory_name()).join(&self.revision)
    }

    /// Attach the store root, deriving the repository path from it.
    pub fn with_repository_root(mut self, root: &Path) -> Self {
        self.repository_path = Some(self.repository_path_under(root));
        self
    }

    /// Point the descriptor at the manifest inside its repository path.
    pub(crate) fn relocate_manifest(mut self) -> Self {
        if matches!(self.origin, ManifestOrigin::File(_)) {
            if let Some(repo) = &self.repository_path {
                self.origin = ManifestOrigin::File(manifest::manifest_path_in(repo));
            }
        }
        self
    }

    /// Attach the store root and re-point the manifest path into the store.
    pub fn placed_in(self, root: &Path) -> Self {
        self.with_repository_root(root).relocate_manifest()
    }

    /// Whether `version` is one of the declared software versions.
    pub fn supports(&self, version: &str) -> bool {
        self.versions.iter().any(|v| v == version)
    }

    /// Re-derive this descriptor for another of its software versions,
    /// applying that version's `Version-Overrides`. The identity is preserved.
    pub fn project(&self, version: &str) -> Result<Cartridge> {
        let mut projected = manifest::from_mapping(self.base.clone(), Some(version))?;
        projected.id = self.id;
        projected.origin = self.origin.clone();
        projected.repository_path = self.repository_path.clone();
        Ok(projected)
    }

    /// The fully qualified `(name, software version, revision)` key.
    pub fn key(&self) -> (&str, &str, &str) {
        (&self.name, &self.software_version, &self.revision)
    }
}

impl fmt::Display for Cartridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{} ({})",
            self.name,
            self.software_version,
            self.revision,
            self.vendor
        )
    }
}
