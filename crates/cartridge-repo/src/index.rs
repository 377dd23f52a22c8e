//! In-memory cartridge index.
//!
//! Each cartridge name maps to a record holding the concrete
//! `software version -> revision -> descriptor` table together with the
//! descriptors that currently answer wildcard lookups. The wildcard slots are
//! recomputed whenever the record changes, so they always name the greatest
//! version present and never outlive an erased cartridge.
//!
//! A cartridge declaring several software versions occupies one slot per
//! version. Each slot holds the descriptor projected onto that version; all
//! projections share the cartridge's [`CartridgeId`], which is what removal
//! and counting go by.
//!
//! A placed cartridge also owns its on-disk home. Two identities never share
//! one: inserting a cartridge displaces whichever cartridge held its home,
//! even when their versions don't overlap.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cartridge_manifest::{Cartridge, CartridgeId, VersionKey};

use crate::error::Result;

type Revisions = BTreeMap<VersionKey, Arc<Cartridge>>;

/// Index entries for a single cartridge name.
#[derive(Debug, Default, Clone)]
struct NameRecord {
    versions: BTreeMap<VersionKey, Revisions>,
    /// Greatest revision per software version.
    latest_by_version: BTreeMap<VersionKey, Arc<Cartridge>>,
    /// Greatest revision of the greatest software version.
    latest: Option<Arc<Cartridge>>,
}

impl NameRecord {
    fn refresh_wildcards(&mut self) {
        self.latest_by_version = self
            .versions
            .iter()
            .filter_map(|(version, revisions)| {
                revisions
                    .values()
                    .next_back()
                    .map(|cart| (version.clone(), Arc::clone(cart)))
            })
            .collect();
        self.latest = self.latest_by_version.values().next_back().cloned();
    }

    fn remove_id(&mut self, id: CartridgeId) {
        for revisions in self.versions.values_mut() {
            revisions.retain(|_, cart| cart.id() != id);
        }
        self.versions.retain(|_, revisions| !revisions.is_empty());
        self.refresh_wildcards();
    }

    fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

/// A cartridge together with its projection onto each declared version.
///
/// Building the projections can fail on a bad `Version-Overrides` entry, so
/// callers that must not fail halfway through a mutation prepare first.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    canonical: Arc<Cartridge>,
    projections: Vec<(VersionKey, Arc<Cartridge>)>,
}

impl IndexEntry {
    pub fn prepare(cartridge: Cartridge) -> Result<Self> {
        let mut projections = Vec::with_capacity(cartridge.versions().len());
        for version in cartridge.versions() {
            let projected = if version == cartridge.software_version() {
                cartridge.clone()
            } else {
                cartridge.project(version)?
            };
            projections.push((VersionKey::new(version.as_str()), Arc::new(projected)));
        }
        Ok(Self {
            canonical: Arc::new(cartridge),
            projections,
        })
    }

    pub fn cartridge(&self) -> &Arc<Cartridge> {
        &self.canonical
    }
}

/// Three-level cartridge index with default-to-latest resolution.
#[derive(Debug, Default, Clone)]
pub struct CartridgeIndex {
    names: BTreeMap<String, NameRecord>,
    /// Canonical descriptor per identity, as it was inserted.
    by_id: HashMap<CartridgeId, Arc<Cartridge>>,
    /// Owner of each repository path.
    by_home: HashMap<PathBuf, CartridgeId>,
}

impl CartridgeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a cartridge under every software version it declares.
    ///
    /// Any previously indexed cartridge occupying one of the same
    /// `(name, version, revision)` slots, or the same repository path, is
    /// removed entirely and returned.
    pub fn insert(&mut self, cartridge: Cartridge) -> Result<(Arc<Cartridge>, Vec<Arc<Cartridge>>)> {
        Ok(self.insert_entry(IndexEntry::prepare(cartridge)?))
    }

    /// Insert an already projected entry. Cannot fail.
    pub fn insert_entry(&mut self, entry: IndexEntry) -> (Arc<Cartridge>, Vec<Arc<Cartridge>>) {
        let IndexEntry {
            canonical,
            projections,
        } = entry;
        let displaced = self.remove_conflicts(&canonical);

        let revision = VersionKey::new(canonical.revision());
        let record = self.names.entry(canonical.name().to_string()).or_default();
        for (version, projected) in projections {
            record
                .versions
                .entry(version)
                .or_default()
                .insert(revision.clone(), projected);
        }
        record.refresh_wildcards();
        if let Some(home) = canonical.repository_path() {
            self.by_home.insert(home.to_path_buf(), canonical.id());
        }
        self.by_id.insert(canonical.id(), Arc::clone(&canonical));

        (canonical, displaced)
    }

    /// Remove every slot referring to `id`. Returns the canonical descriptor.
    pub fn remove(&mut self, id: CartridgeId) -> Option<Arc<Cartridge>> {
        let canonical = self.by_id.remove(&id)?;
        if let Some(home) = canonical.repository_path() {
            if self.by_home.get(home) == Some(&id) {
                self.by_home.remove(home);
            }
        }
        if let Some(record) = self.names.get_mut(canonical.name()) {
            record.remove_id(id);
            if record.is_empty() {
                self.names.remove(canonical.name());
            }
        }
        Some(canonical)
    }

    /// Remove cartridges occupying any slot or the home `cartridge` would occupy.
    pub fn remove_conflicts(&mut self, cartridge: &Cartridge) -> Vec<Arc<Cartridge>> {
        let mut conflicting: HashSet<CartridgeId> = cartridge
            .versions()
            .iter()
            .filter_map(|version| self.exact(cartridge.name(), version, cartridge.revision()))
            .map(|existing| existing.id())
            .collect();
        if let Some(owner) = cartridge.repository_path().and_then(|home| self.by_home.get(home)) {
            conflicting.insert(*owner);
        }
        conflicting.remove(&cartridge.id());

        let mut removed: Vec<Arc<Cartridge>> = conflicting
            .into_iter()
            .filter_map(|id| self.remove(id))
            .collect();
        removed.sort_by(|a, b| a.id().cmp(&b.id()));
        removed
    }

    /// The cartridge whose repository path is `home`.
    pub fn at_home(&self, home: &Path) -> Option<Arc<Cartridge>> {
        self.by_home.get(home).and_then(|id| self.get(*id))
    }

    /// Remove the cartridge whose repository path is `home`, if any.
    pub fn remove_at_home(&mut self, home: &Path) -> Option<Arc<Cartridge>> {
        let id = *self.by_home.get(home)?;
        self.remove(id)
    }

    /// Resolve a possibly partial key.
    ///
    /// - name only: greatest revision of the greatest software version
    /// - name and version: greatest revision of that version
    /// - name and revision: that revision under the greatest version carrying it
    /// - all three: the exact slot
    pub fn select(
        &self,
        name: &str,
        software_version: Option<&str>,
        revision: Option<&str>,
    ) -> Option<Arc<Cartridge>> {
        let record = self.names.get(name)?;
        match (software_version, revision) {
            (None, None) => record.latest.clone(),
            (Some(version), None) => record
                .latest_by_version
                .get(&VersionKey::from(version))
                .cloned(),
            (Some(version), Some(revision)) => self.exact(name, version, revision),
            (None, Some(revision)) => {
                let revision = VersionKey::from(revision);
                record
                    .versions
                    .values()
                    .rev()
                    .find_map(|revisions| revisions.get(&revision).cloned())
            }
        }
    }

    /// Look up a fully qualified `(name, version, revision)` slot.
    pub fn exact(&self, name: &str, software_version: &str, revision: &str) -> Option<Arc<Cartridge>> {
        self.names
            .get(name)?
            .versions
            .get(&VersionKey::from(software_version))?
            .get(&VersionKey::from(revision))
            .cloned()
    }

    /// Look up the canonical descriptor for an identity.
    pub fn get(&self, id: CartridgeId) -> Option<Arc<Cartridge>> {
        self.by_id.get(&id).cloned()
    }

    /// Number of distinct cartridges, regardless of how many slots each holds.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Every distinct cartridge, ordered by name, software version, then revision.
    pub fn cartridges(&self) -> Vec<Arc<Cartridge>> {
        let mut all: Vec<Arc<Cartridge>> = self.by_id.values().cloned().collect();
        all.sort_by(|a, b| {
            a.name()
                .cmp(b.name())
                .then_with(|| {
                    VersionKey::from(a.software_version())
                        .cmp(&VersionKey::from(b.software_version()))
                })
                .then_with(|| VersionKey::from(a.revision()).cmp(&VersionKey::from(b.revision())))
                .then_with(|| a.id().cmp(&b.id()))
        });
        all
    }

    /// For each name and software version, the descriptor a wildcard revision
    /// lookup resolves to. A cartridge appears once even if it is the latest
    /// for several of its versions.
    pub fn latest_versions(&self) -> Vec<Arc<Cartridge>> {
        let mut seen = HashSet::new();
        self.names
            .values()
            .flat_map(|record| record.latest_by_version.values())
            .filter(|cart| seen.insert(cart.id()))
            .cloned()
            .collect()
    }

    /// Distinct cartridge names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.names.keys().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.names.clear();
        self.by_id.clear();
        self.by_home.clear();
    }
}
