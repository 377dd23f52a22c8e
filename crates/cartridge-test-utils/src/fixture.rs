//! [`CartridgeFixture`] builder for cartridge source trees.
//!
//! A fixture writes `metadata/manifest.yml`, an executable `bin/control` and
//! optionally a `usr/` directory, which is the minimum a cartridge needs to
//! be installed or instantiated.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Describes a cartridge tree to write under a directory.
///
/// # Example
///
/// ```rust,no_run
/// use cartridge_test_utils::CartridgeFixture;
///
/// let fixture = CartridgeFixture::new("php", "1.0").versions(&["5.3", "5.4"]);
/// let (_tmp, dir) = fixture.in_temp_dir();
/// assert!(dir.join("metadata/manifest.yml").exists());
/// ```
#[derive(Debug, Clone)]
pub struct CartridgeFixture {
    name: String,
    vendor: String,
    revision: String,
    versions: Vec<String>,
    default_version: Option<String>,
    source_url: Option<String>,
    source_checksum: Option<String>,
    extra_manifest: String,
    control: ControlScript,
    with_usr: bool,
    with_manifest: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ControlScript {
    Executable,
    NotExecutable,
    Missing,
}

impl CartridgeFixture {
    /// A `redhat` cartridge with one software version, `1.0`.
    pub fn new(name: &str, revision: &str) -> Self {
        Self {
            name: name.to_string(),
            vendor: "redhat".to_string(),
            revision: revision.to_string(),
            versions: vec!["1.0".to_string()],
            default_version: None,
            source_url: None,
            source_checksum: None,
            extra_manifest: String::new(),
            control: ControlScript::Executable,
            with_usr: false,
            with_manifest: true,
        }
    }

    pub fn vendor(mut self, vendor: &str) -> Self {
        self.vendor = vendor.to_string();
        self
    }

    /// Declared software versions. The first one is the default unless
    /// [`default_version`](Self::default_version) says otherwise.
    pub fn versions(mut self, versions: &[&str]) -> Self {
        self.versions = versions.iter().map(|v| v.to_string()).collect();
        self
    }

    pub fn default_version(mut self, version: &str) -> Self {
        self.default_version = Some(version.to_string());
        self
    }

    pub fn source_url(mut self, url: &str) -> Self {
        self.source_url = Some(url.to_string());
        self
    }

    pub fn source_checksum(mut self, checksum: &str) -> Self {
        self.source_checksum = Some(checksum.to_string());
        self
    }

    /// Raw YAML appended to the generated manifest.
    pub fn extra_manifest(mut self, yaml: &str) -> Self {
        self.extra_manifest.push_str(yaml);
        if !yaml.ends_with('\n') {
            self.extra_manifest.push('\n');
        }
        self
    }

    pub fn with_usr(mut self) -> Self {
        self.with_usr = true;
        self
    }

    pub fn without_control(mut self) -> Self {
        self.control = ControlScript::Missing;
        self
    }

    pub fn control_not_executable(mut self) -> Self {
        self.control = ControlScript::NotExecutable;
        self
    }

    pub fn without_manifest(mut self) -> Self {
        self.with_manifest = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn revision(&self) -> &str {
        &self.revision
    }

    /// The `{vendor}-{name}` directory the store files this cartridge under.
    pub fn directory_name(&self) -> String {
        format!("{}-{}", self.vendor, self.name)
    }

    /// The manifest text this fixture writes.
    pub fn manifest_yaml(&self) -> String {
        let default = self
            .default_version
            .clone()
            .or_else(|| self.versions.first().cloned())
            .unwrap_or_else(|| "1.0".to_string());
        let versions = self
            .versions
            .iter()
            .map(|v| format!("'{v}'"))
            .collect::<Vec<_>>()
            .join(", ");

        let mut yaml = format!(
            "Name: {}\nCartridge-Short-Name: {}\nDisplay-Name: {} {}\nCartridge-Vendor: {}\nCartridge-Version: '{}'\nVersion: '{}'\nVersions: [{}]\n",
            self.name,
            self.name.to_uppercase(),
            self.name,
            default,
            self.vendor,
            self.revision,
            default,
            versions
        );
        if let Some(url) = &self.source_url {
            yaml.push_str(&format!("Source-Url: {url}\n"));
        }
        if let Some(checksum) = &self.source_checksum {
            yaml.push_str(&format!("Source-Checksum: {checksum}\n"));
        }
        yaml.push_str(&self.extra_manifest);
        yaml
    }

    /// Write the cartridge tree into `dir`, creating it if needed.
    ///
    /// # Panics
    /// Panics if any filesystem operation fails.
    pub fn write_to(&self, dir: &Path) {
        fs::create_dir_all(dir.join("metadata")).unwrap();
        fs::create_dir_all(dir.join("bin")).unwrap();

        if self.with_manifest {
            fs::write(dir.join("metadata/manifest.yml"), self.manifest_yaml()).unwrap();
        }

        let control = dir.join("bin/control");
        match self.control {
            ControlScript::Missing => {}
            ControlScript::Executable => {
                fs::write(&control, "#!/bin/sh\nexit 0\n").unwrap();
                set_mode(&control, 0o755);
            }
            ControlScript::NotExecutable => {
                fs::write(&control, "#!/bin/sh\nexit 0\n").unwrap();
                set_mode(&control, 0o644);
            }
        }

        if self.with_usr {
            fs::create_dir_all(dir.join("usr/lib")).unwrap();
            fs::write(dir.join("usr/lib/shared.txt"), "shared").unwrap();
        }

        fs::create_dir_all(dir.join("template")).unwrap();
        fs::write(
            dir.join("template/index.html"),
            format!("{} {}\n", self.name, self.revision),
        )
        .unwrap();
    }

    /// Write the tree into a fresh temporary directory.
    ///
    /// Returns the guard and the cartridge directory inside it.
    pub fn in_temp_dir(&self) -> (TempDir, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join(format!("{}-{}", self.name, self.revision));
        self.write_to(&dir);
        (tmp, dir)
    }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_minimal_layout() {
        let (_tmp, dir) = CartridgeFixture::new("php", "1.0").with_usr().in_temp_dir();
        assert!(dir.join("metadata/manifest.yml").is_file());
        assert!(dir.join("bin/control").is_file());
        assert!(dir.join("usr/lib/shared.txt").is_file());
    }

    #[test]
    fn manifest_lists_versions_and_default() {
        let yaml = CartridgeFixture::new("php", "1.0")
            .versions(&["5.3", "5.4"])
            .default_version("5.4")
            .manifest_yaml();
        assert!(yaml.contains("Versions: ['5.3', '5.4']"));
        assert!(yaml.contains("Version: '5.4'"));
        assert!(yaml.contains("Cartridge-Version: '1.0'"));
    }

    #[test]
    fn without_manifest_leaves_metadata_empty() {
        let (_tmp, dir) = CartridgeFixture::new("php", "1.0")
            .without_manifest()
            .in_temp_dir();
        assert!(dir.join("metadata").is_dir());
        assert!(!dir.join("metadata/manifest.yml").exists());
    }
}
