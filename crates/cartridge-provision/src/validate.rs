//! Structural validation of an instantiated cartridge tree.

use std::path::Path;

use cartridge_fs::{CartridgePath, tree};
use cartridge_manifest::Cartridge;

use crate::error::{Error, Result};

/// Every structural problem with the tree at `target`. Empty when valid.
pub fn violations(target: &Path) -> Vec<String> {
    let mut found = Vec::new();

    let metadata = target.join(CartridgePath::MetadataDir);
    if !metadata.is_dir() {
        found.push(format!("{} directory is missing", CartridgePath::MetadataDir.as_str()));
    }

    let bin = target.join(CartridgePath::BinDir);
    if !bin.is_dir() {
        found.push(format!("{} directory is missing", CartridgePath::BinDir.as_str()));
    }

    let manifest = target.join(CartridgePath::manifest_relative());
    if !manifest.is_file() {
        found.push(format!(
            "{} is not a regular file",
            CartridgePath::manifest_relative().display()
        ));
    }

    let control = target.join(CartridgePath::control_relative());
    if !control.exists() {
        found.push(format!(
            "{} is missing",
            CartridgePath::control_relative().display()
        ));
    } else if !tree::is_executable(&control) {
        found.push(format!(
            "{} is not executable",
            CartridgePath::control_relative().display()
        ));
    }

    found
}

/// Fail with [`Error::MalformedPackage`] listing every violation found.
pub fn validate(target: &Path, cartridge: &Cartridge) -> Result<()> {
    let violations = violations(target);
    if violations.is_empty() {
        return Ok(());
    }
    Err(Error::MalformedPackage {
        name: cartridge.name().to_string(),
        software_version: cartridge.software_version().to_string(),
        revision: cartridge.revision().to_string(),
        violations,
    })
}
