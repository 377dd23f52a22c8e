//! Manifest loading for `metadata/manifest.yml`.
//!
//! # Example YAML
//!
//! ```yaml
//! Name: php
//! Cartridge-Short-Name: PHP
//! Display-Name: PHP 5.3
//! Cartridge-Vendor: redhat
//! Cartridge-Version: '1.0.1'
//! Version: '5.3'
//! Versions: ['5.3', '5.4']
//! Source-Url: https://example.com/php.tar.gz
//! Source-Checksum: sha256:9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08
//! Version-Overrides:
//!   '5.4':
//!     Display-Name: PHP 5.4
//! ```
//!
//! Scalars may be written unquoted (`Version: 5.3`); they are read back as
//! their textual form.

use std::path::{Path, PathBuf};

use cartridge_fs::CartridgePath;
use serde_yaml::{Mapping, Value};

use crate::cartridge::{Cartridge, CartridgeId, ManifestOrigin};
use crate::error::{Error, Result};
use crate::version::compare_versions;

const NAME: &str = "Name";
const VENDOR: &str = "Cartridge-Vendor";
const REVISION: &str = "Cartridge-Version";
const VERSION: &str = "Version";
const VERSIONS: &str = "Versions";
const DISPLAY_NAME: &str = "Display-Name";
const SHORT_NAME: &str = "Cartridge-Short-Name";
const SOURCE_URL: &str = "Source-Url";
const SOURCE_CHECKSUM: &str = "Source-Checksum";
const OVERRIDES: &str = "Version-Overrides";

/// Location of the manifest inside a cartridge directory.
pub fn manifest_path_in(dir: &Path) -> PathBuf {
    dir.join(CartridgePath::manifest_relative())
}

/// Read and parse the manifest at `path`.
///
/// With `selected` set, the descriptor is projected onto that software
/// version; otherwise the manifest's default `Version` is used.
pub fn parse(path: &Path, selected: Option<&str>) -> Result<Cartridge> {
    if !path.is_file() {
        return Err(Error::ManifestNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut cartridge = from_yaml(&content, selected)?;
    cartridge.origin = ManifestOrigin::File(path.to_path_buf());
    Ok(cartridge)
}

/// Parse manifest text whose cartridge files live at its `Source-Url`.
pub fn parse_text(yaml: &str, selected: Option<&str>) -> Result<Cartridge> {
    from_yaml(yaml, selected)
}

fn from_yaml(yaml: &str, selected: Option<&str>) -> Result<Cartridge> {
    match serde_yaml::from_str::<Value>(yaml)? {
        Value::Mapping(mapping) => from_mapping(mapping, selected),
        _ => Err(Error::NotAMapping),
    }
}

pub(crate) fn from_mapping(base: Mapping, selected: Option<&str>) -> Result<Cartridge> {
    let name = required(&base, NAME)?;
    validate_identifier("name", &name)?;

    let declared_default = optional(&base, VERSION);
    let mut versions = string_list(&base, VERSIONS);
    if versions.is_empty() {
        versions.extend(declared_default.clone());
    }
    if versions.is_empty() {
        return Err(Error::MissingField { field: VERSIONS });
    }

    let software_version = match selected.or(declared_default.as_deref()) {
        Some(version) => version.to_string(),
        None => latest(&versions),
    };
    if !versions.contains(&software_version) {
        return Err(Error::UnsupportedVersion {
            name,
            version: software_version,
            supported: versions,
        });
    }

    let raw = match selected {
        Some(version) => apply_overrides(&base, version),
        None => base.clone(),
    };

    let vendor = required(&raw, VENDOR)?;
    validate_identifier("vendor", &vendor)?;
    let revision = required(&raw, REVISION)?;
    validate_identifier("revision", &revision)?;

    tracing::debug!(
        name = %name,
        version = %software_version,
        revision = %revision,
        "Parsed cartridge manifest"
    );

    Ok(Cartridge {
        id: CartridgeId::new(),
        display_name: optional(&raw, DISPLAY_NAME),
        short_name: optional(&raw, SHORT_NAME),
        source_url: optional(&raw, SOURCE_URL),
        source_checksum: optional(&raw, SOURCE_CHECKSUM),
        origin: ManifestOrigin::Url,
        repository_path: None,
        name,
        vendor,
        software_version,
        versions,
        revision,
        raw,
        base,
    })
}

/// Overlay the `Version-Overrides` entry for `version` onto the base fields.
fn apply_overrides(base: &Mapping, version: &str) -> Mapping {
    let mut merged = base.clone();
    let Some(Value::Mapping(overrides)) = base.get(OVERRIDES) else {
        return merged;
    };
    let entry = overrides
        .iter()
        .find(|(key, _)| scalar(key).as_deref() == Some(version))
        .map(|(_, value)| value);
    if let Some(Value::Mapping(fields)) = entry {
        for (key, value) in fields {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

fn latest(versions: &[String]) -> String {
    versions
        .iter()
        .max_by(|a, b| compare_versions(a, b))
        .cloned()
        .unwrap_or_default()
}

fn required(mapping: &Mapping, field: &'static str) -> Result<String> {
    optional(mapping, field).ok_or(Error::MissingField { field })
}

fn optional(mapping: &Mapping, field: &str) -> Option<String> {
    mapping
        .get(field)
        .and_then(scalar)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn string_list(mapping: &Mapping, field: &str) -> Vec<String> {
    match mapping.get(field) {
        Some(Value::Sequence(items)) => items
            .iter()
            .filter_map(scalar)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(other) => scalar(other).into_iter().collect(),
        None => Vec::new(),
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Names, vendors and revisions become path components in the store.
fn validate_identifier(field: &'static str, value: &str) -> Result<()> {
    if value == "." || value == ".." {
        return Err(Error::InvalidName {
            field,
            value: value.to_string(),
            reason: "must not be a relative path component".to_string(),
        });
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(Error::InvalidName {
            field,
            value: value.to_string(),
            reason: "must contain only alphanumeric characters, dots, hyphens, or underscores"
                .to_string(),
        });
    }
    Ok(())
}
