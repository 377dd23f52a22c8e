//! Materializing a resolved cartridge into a gear directory.

use std::ffi::OsStr;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use cartridge_fs::{CartridgePath, tree};
use cartridge_manifest::{Cartridge, ManifestOrigin};

use crate::config::{DownloadLimits, ProvisionConfig};
use crate::download;
use crate::error::{Error, Result};
use crate::extract;
use crate::process::{CommandRunner, CommandSpec, SystemRunner};
use crate::source::{self, SourceKind};
use crate::validate;

/// Produces a cartridge's file tree in a target directory, all or nothing.
///
/// Instantiators hold no per-call state and can be shared across threads;
/// each call works only on its own target and temporary files.
#[derive(Clone)]
pub struct Instantiator {
    limits: DownloadLimits,
    runner: Arc<dyn CommandRunner>,
}

impl std::fmt::Debug for Instantiator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instantiator")
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl Default for Instantiator {
    fn default() -> Self {
        Self::new(&ProvisionConfig::default())
    }
}

impl Instantiator {
    /// An instantiator running real external tools.
    pub fn new(config: &ProvisionConfig) -> Self {
        Self::with_runner(config, SystemRunner)
    }

    pub fn with_runner(config: &ProvisionConfig, runner: impl CommandRunner + 'static) -> Self {
        Self {
            limits: config.download.clone(),
            runner: Arc::new(runner),
        }
    }

    pub fn limits(&self) -> &DownloadLimits {
        &self.limits
    }

    /// Materialize `cartridge` into `target` and validate the result.
    ///
    /// On any failure `target` is removed before the error is returned.
    pub fn instantiate(&self, cartridge: &Cartridge, target: &Path) -> Result<()> {
        if target.file_name().is_none() || target.parent().is_none() {
            return Err(Error::invalid_argument(target, "must name a directory"));
        }

        let result = fs::create_dir_all(target)
            .map_err(|e| Error::from(cartridge_fs::Error::io(target, e)))
            .and_then(|()| self.materialize(cartridge, target))
            .and_then(|()| validate::validate(target, cartridge));

        match result {
            Ok(()) => {
                tracing::info!(
                    name = cartridge.name(),
                    version = cartridge.software_version(),
                    revision = cartridge.revision(),
                    target = ?target,
                    "Instantiated cartridge"
                );
                Ok(())
            }
            Err(e) => {
                tracing::debug!(target = ?target, error = %e, "Rolling back instantiation");
                if let Err(cleanup) = tree::remove_tree(target) {
                    tracing::warn!(target = ?target, error = %cleanup, "Failed to remove partial target");
                }
                Err(e)
            }
        }
    }

    fn materialize(&self, cartridge: &Cartridge, target: &Path) -> Result<()> {
        match cartridge.origin() {
            ManifestOrigin::File(_) => {
                let repository = cartridge.repository_path().ok_or_else(|| {
                    Error::invalid_argument(target, format!("{cartridge} has no repository path"))
                })?;
                copy_local(repository, target)
            }
            ManifestOrigin::Url => {
                let url = cartridge.source_url().ok_or_else(|| {
                    Error::unsupported("", format!("{cartridge} has no Source-Url"))
                })?;
                self.fetch_remote(cartridge, url, target)
            }
        }
    }

    fn fetch_remote(&self, cartridge: &Cartridge, url: &str, target: &Path) -> Result<()> {
        match source::classify(url)? {
            SourceKind::Git(remote) => self.clone_git(&remote, target),
            SourceKind::Archive { url, format } => {
                let archive = download::download(
                    self.runner.as_ref(),
                    &self.limits,
                    &url,
                    cartridge.name(),
                    format,
                )?;
                if let Some(expected) = cartridge.source_checksum() {
                    download::verify_checksum(archive.path(), expected, url.as_str())?;
                }
                extract::extract(self.runner.as_ref(), archive.path(), format, target)?;
                drop(archive);
                extract::hoist_single_directory(target)?;
                Ok(())
            }
            SourceKind::File(path) => {
                if !path.is_dir() {
                    return Err(Error::invalid_argument(&path, "file source is not a directory"));
                }
                tracing::debug!(source = ?path, target = ?target, "Copying file source");
                tree::copy_contents(&path, target, &[])?;
                Ok(())
            }
        }
    }

    fn clone_git(&self, remote: &str, target: &Path) -> Result<()> {
        let (parent, name) = clone_location(target)?;
        tracing::debug!(url = remote, target = ?target, "Cloning git source");
        self.runner.run(
            &CommandSpec::new("git")
                .arg("clone")
                .arg(remote)
                .arg(name)
                .current_dir(parent),
        )?;
        self.runner.run(
            &CommandSpec::new("git")
                .args(["repack", "-a", "-d"])
                .current_dir(target),
        )?;
        Ok(())
    }
}

/// The directory to clone from and the name to clone as. A bare relative
/// name such as `php` clones from the current directory.
fn clone_location(target: &Path) -> Result<(&Path, &OsStr)> {
    let Some(name) = target.file_name() else {
        return Err(Error::invalid_argument(target, "must name a directory"));
    };
    let parent = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Ok((parent, name))
}

/// Copy a repository cartridge into `target`, linking `usr` instead of copying it.
fn copy_local(repository: &Path, target: &Path) -> Result<()> {
    let usr = repository.join(CartridgePath::UsrDir);
    let link_usr = usr.is_dir();
    let exclude: &[&str] = if link_usr {
        &[CartridgePath::UsrDir.as_str()]
    } else {
        &[]
    };

    tracing::debug!(source = ?repository, target = ?target, "Copying repository cartridge");
    tree::copy_contents(repository, target, exclude)?;
    if link_usr {
        link_dir(&usr, &target.join(CartridgePath::UsrDir))?;
    }
    Ok(())
}

#[cfg(unix)]
fn link_dir(original: &Path, link: &Path) -> Result<()> {
    std::os::unix::fs::symlink(original, link).map_err(|e| cartridge_fs::Error::io(link, e))?;
    Ok(())
}

#[cfg(not(unix))]
fn link_dir(original: &Path, link: &Path) -> Result<()> {
    tree::copy_tree(original, link)?;
    Ok(())
}
