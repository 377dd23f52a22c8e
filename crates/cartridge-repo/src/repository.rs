//! The cartridge repository: index plus on-disk store.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use cartridge_fs::{CartridgePath, tree};
use cartridge_manifest::{Cartridge, manifest_path_in};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::index::{CartridgeIndex, IndexEntry};

/// A node's cartridge repository rooted at a store directory.
///
/// One instance is constructed per process and shared by reference. Reads go
/// through a shared lock on the index. Mutations are serialized by a separate
/// mutation lock that is held across their disk work, and only take the
/// index write lock for the final in-memory swap.
#[derive(Debug)]
pub struct CartridgeRepository {
    root: PathBuf,
    index: RwLock<CartridgeIndex>,
    mutation: Mutex<()>,
}

impl CartridgeRepository {
    /// Create an empty repository, creating the store root if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| cartridge_fs::Error::io(&root, e))?;
        Ok(Self {
            root,
            index: RwLock::new(CartridgeIndex::new()),
            mutation: Mutex::new(()),
        })
    }

    /// Create the repository and index everything already in the store.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let repository = Self::new(root)?;
        repository.load()?;
        Ok(repository)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Rebuild the index from the store root.
    ///
    /// The new index is assembled off to the side and swapped in whole, so
    /// readers see either the old or the new contents. Returns the number of
    /// distinct cartridges indexed.
    pub fn load(&self) -> Result<usize> {
        let _guard = self.lock_mutation();
        let mut fresh = CartridgeIndex::new();
        scan_store(&self.root, &mut fresh)?;
        let count = fresh.len();
        *self.write_index() = fresh;
        tracing::info!(path = ?self.root, count, "Loaded cartridge repository");
        Ok(count)
    }

    /// Index cartridges found under `dir` in addition to the current contents.
    ///
    /// `dir` must use the store layout; descriptors are placed relative to it.
    pub fn load_from(&self, dir: &Path) -> Result<usize> {
        let _guard = self.lock_mutation();
        let mut staged = self.read_index().clone();
        scan_store(dir, &mut staged)?;
        let count = staged.len();
        *self.write_index() = staged;
        tracing::info!(path = ?dir, count, "Loaded cartridges");
        Ok(count)
    }

    /// Resolve a possibly partial key. Omitted components resolve to the
    /// greatest known value.
    pub fn select(
        &self,
        name: &str,
        software_version: Option<&str>,
        revision: Option<&str>,
    ) -> Result<Arc<Cartridge>> {
        tracing::debug!(name, ?software_version, ?revision, "Selecting cartridge");
        self.read_index()
            .select(name, software_version, revision)
            .ok_or_else(|| Error::not_found(name, software_version, revision))
    }

    /// Whether the exact `(name, version, revision)` triple is indexed.
    pub fn contains(&self, name: &str, software_version: &str, revision: &str) -> bool {
        self.read_index()
            .exact(name, software_version, revision)
            .is_some()
    }

    /// Copy the cartridge in `source` into the store and index it.
    ///
    /// The tree is copied into a hidden staging directory beside its final
    /// location and renamed into place only once complete. The index is
    /// updated last, so a failed copy leaves both the store and the index as
    /// they were.
    pub fn install(&self, source: &Path) -> Result<Arc<Cartridge>> {
        let source_real = self.check_install_source(source)?;
        let manifest = manifest_path_in(source);
        if !manifest.is_file() {
            return Err(Error::invalid_argument(
                source,
                format!("missing {}", CartridgePath::manifest_relative().display()),
            ));
        }

        let _guard = self.lock_mutation();

        let cartridge = cartridge_manifest::parse(&manifest, None)?.placed_in(&self.root);
        let destination = cartridge.repository_path_under(&self.root);
        self.check_no_overlap(source, &source_real, &destination)?;
        let entry = IndexEntry::prepare(cartridge)?;

        let vendor_dir = self.root.join(entry.cartridge().directory_name());
        let staging = vendor_dir.join(format!(
            ".{}.staging-{}",
            entry.cartridge().revision(),
            Uuid::new_v4().simple()
        ));

        if let Err(e) = stage_copy(source, &staging) {
            discard(&staging);
            discard_if_empty(&vendor_dir);
            return Err(e);
        }

        let replaced = tree::remove_tree(&destination).and_then(|()| {
            fs::rename(&staging, &destination)
                .map_err(|e| cartridge_fs::Error::io(&destination, e))
        });
        if let Err(e) = replaced {
            discard(&staging);
            // The previous copy may be partly or wholly gone; stop indexing it.
            if let Some(stale) = self.write_index().remove_at_home(&destination) {
                tracing::warn!(cartridge = %stale, "Dropped cartridge whose files were replaced");
            }
            discard_if_empty(&vendor_dir);
            return Err(e.into());
        }

        let (installed, displaced) = self.write_index().insert_entry(entry);
        for previous in &displaced {
            tracing::debug!(cartridge = %previous, "Replaced previously installed cartridge");
            // Same key under another vendor lives in its own home.
            if let Some(home) = previous.repository_path().filter(|home| *home != destination.as_path()) {
                if let Err(e) = remove_home(home) {
                    tracing::warn!(path = ?home, error = %e, "Failed to remove displaced cartridge");
                }
            }
        }
        tracing::info!(
            name = installed.name(),
            version = installed.software_version(),
            revision = installed.revision(),
            path = ?destination,
            "Installed cartridge"
        );
        Ok(installed)
    }

    /// Remove the exact `(name, version, revision)` cartridge from the index
    /// and the store.
    ///
    /// Every slot belonging to the same cartridge is scrubbed, including the
    /// slots for its other software versions. Sibling revisions are untouched.
    pub fn erase(&self, name: &str, software_version: &str, revision: &str) -> Result<Arc<Cartridge>> {
        let _guard = self.lock_mutation();

        let erased = {
            let mut index = self.write_index();
            let found = index
                .exact(name, software_version, revision)
                .ok_or_else(|| Error::not_found(name, Some(software_version), Some(revision)))?;
            index.remove(found.id()).unwrap_or(found)
        };

        let path = erased
            .repository_path()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| erased.repository_path_under(&self.root));
        remove_home(&path)?;

        tracing::info!(
            name,
            version = software_version,
            revision,
            path = ?path,
            "Erased cartridge"
        );
        Ok(erased)
    }

    /// Number of distinct cartridges indexed.
    pub fn len(&self) -> usize {
        self.read_index().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_index().is_empty()
    }

    /// Snapshot of every distinct cartridge, ordered by name, software
    /// version, then revision.
    pub fn cartridges(&self) -> Vec<Arc<Cartridge>> {
        self.read_index().cartridges()
    }

    /// Iterate over a snapshot of the indexed cartridges.
    pub fn iter(&self) -> impl Iterator<Item = Arc<Cartridge>> {
        self.cartridges().into_iter()
    }

    /// For each name and software version, the cartridge a wildcard revision
    /// resolves to.
    pub fn latest_versions(&self) -> Vec<Arc<Cartridge>> {
        self.read_index().latest_versions()
    }

    /// Forget every indexed cartridge. The store is left alone.
    pub fn clear(&self) {
        let _guard = self.lock_mutation();
        self.write_index().clear();
    }

    fn check_install_source(&self, source: &Path) -> Result<PathBuf> {
        if !source.exists() {
            return Err(Error::invalid_argument(source, "does not exist"));
        }
        if !source.is_dir() {
            return Err(Error::invalid_argument(source, "is not a directory"));
        }
        let source_real =
            dunce::canonicalize(source).map_err(|e| cartridge_fs::Error::io(source, e))?;
        let root_real =
            dunce::canonicalize(&self.root).map_err(|e| cartridge_fs::Error::io(&self.root, e))?;
        if source_real == root_real {
            return Err(Error::invalid_argument(
                source,
                "is the repository root",
            ));
        }
        Ok(source_real)
    }

    fn check_no_overlap(&self, source: &Path, source_real: &Path, destination: &Path) -> Result<()> {
        let root_real =
            dunce::canonicalize(&self.root).map_err(|e| cartridge_fs::Error::io(&self.root, e))?;
        let relative = destination.strip_prefix(&self.root).unwrap_or(destination);
        let destination_real = root_real.join(relative);
        if source_real.starts_with(&destination_real) || destination_real.starts_with(source_real) {
            return Err(Error::invalid_argument(
                source,
                format!("overlaps install destination {}", destination.display()),
            ));
        }
        Ok(())
    }

    fn lock_mutation(&self) -> MutexGuard<'_, ()> {
        self.mutation.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_index(&self) -> RwLockReadGuard<'_, CartridgeIndex> {
        self.index.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_index(&self) -> RwLockWriteGuard<'_, CartridgeIndex> {
        self.index.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Index every `*/*/metadata/manifest.yml` under `dir` into `index`.
///
/// Hidden entries are skipped at both levels. Manifests that fail to parse,
/// or that sit somewhere other than their derived `{vendor}-{name}/{revision}`
/// home, are logged and skipped.
fn scan_store(dir: &Path, index: &mut CartridgeIndex) -> Result<()> {
    for vendor_dir in visible_subdirs(dir)? {
        for revision_dir in visible_subdirs(&vendor_dir)? {
            let manifest = manifest_path_in(&revision_dir);
            if !manifest.is_file() {
                continue;
            }

            let cartridge = match cartridge_manifest::parse(&manifest, None) {
                Ok(cartridge) => cartridge.placed_in(dir),
                Err(e) => {
                    tracing::warn!(path = ?manifest, error = %e, "Skipping unreadable manifest");
                    continue;
                }
            };

            if cartridge.repository_path() != Some(revision_dir.as_path()) {
                tracing::warn!(
                    path = ?revision_dir,
                    expected = ?cartridge.repository_path(),
                    "Skipping cartridge stored outside its repository path"
                );
                continue;
            }

            match index.insert(cartridge) {
                Ok((cartridge, displaced)) => {
                    tracing::debug!(cartridge = %cartridge, "Indexed cartridge");
                    for previous in displaced {
                        tracing::debug!(cartridge = %previous, "Re-indexed cartridge");
                    }
                }
                Err(e) => {
                    tracing::warn!(path = ?manifest, error = %e, "Skipping cartridge");
                }
            }
        }
    }
    Ok(())
}

/// Remove a cartridge's home and its vendor directory if that is left empty.
fn remove_home(home: &Path) -> Result<()> {
    tree::remove_tree(home)?;
    if let Some(vendor_dir) = home.parent() {
        if tree::remove_dir_if_empty(vendor_dir)? {
            tracing::debug!(path = ?vendor_dir, "Removed empty vendor directory");
        }
    }
    Ok(())
}

fn visible_subdirs(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    Ok(tree::list_entries(dir)?
        .into_iter()
        .filter(|path| {
            path.file_name()
                .map(|name| !name.to_string_lossy().starts_with('.'))
                .unwrap_or(false)
        })
        .filter(|path| path.is_dir())
        .collect())
}

fn stage_copy(source: &Path, staging: &Path) -> Result<()> {
    fs::create_dir_all(staging).map_err(|e| cartridge_fs::Error::io(staging, e))?;
    tree::copy_contents(source, staging, &[])?;
    Ok(())
}

fn discard(path: &Path) {
    if let Err(e) = tree::remove_tree(path) {
        tracing::warn!(path = ?path, error = %e, "Failed to clean up");
    }
}

fn discard_if_empty(dir: &Path) {
    if let Err(e) = tree::remove_dir_if_empty(dir) {
        tracing::warn!(path = ?dir, error = %e, "Failed to clean up");
    }
}
