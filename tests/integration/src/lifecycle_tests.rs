//! End-to-end cartridge lifecycle
//!
//! Exercises the full flow across crates: install into the store -> resolve
//! with partial keys -> instantiate into a gear -> erase.

use cartridge_fs::tree;
use cartridge_provision::{Error as ProvisionError, Instantiator};
use cartridge_repo::{CartridgeRepository, Error as RepoError};
use cartridge_test_utils::CartridgeFixture;
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

struct Node {
    tmp: TempDir,
    repository: CartridgeRepository,
    instantiator: Instantiator,
}

impl Node {
    fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let repository = CartridgeRepository::new(tmp.path().join("cartridges")).unwrap();
        Self {
            tmp,
            repository,
            instantiator: Instantiator::default(),
        }
    }

    fn install(&self, fixture: CartridgeFixture) {
        let (_src, dir) = fixture.in_temp_dir();
        self.repository.install(&dir).unwrap();
    }

    fn gear(&self, name: &str) -> std::path::PathBuf {
        self.tmp.path().join("gears").join(name)
    }
}

#[test]
fn test_install_instantiate_erase() {
    let node = Node::new();
    node.install(
        CartridgeFixture::new("php", "1.0")
            .versions(&["5.3", "5.4"])
            .with_usr(),
    );

    let cartridge = node.repository.select("php", None, None).unwrap();
    let target = node.gear("abc123/php");
    node.instantiator.instantiate(&cartridge, &target).unwrap();

    assert!(tree::is_executable(&target.join("bin/control")));
    assert!(target.join("metadata/manifest.yml").is_file());
    #[cfg(unix)]
    assert_eq!(
        fs::read_link(target.join("usr")).unwrap(),
        node.repository.root().join("redhat-php/1.0/usr")
    );

    node.repository.erase("php", "5.4", "1.0").unwrap();

    assert!(matches!(
        node.repository.select("php", None, None).unwrap_err(),
        RepoError::NotFound { .. }
    ));
    // The gear keeps its copy; only the shared usr link now dangles.
    assert!(target.join("bin/control").is_file());
    assert!(!node.repository.root().join("redhat-php").exists());
}

#[test]
fn test_instantiated_manifest_matches_store() {
    let node = Node::new();
    node.install(CartridgeFixture::new("ruby", "0.0.3").versions(&["1.9"]));
    let cartridge = node.repository.select("ruby", Some("1.9"), None).unwrap();
    let target = node.gear("g1/ruby");

    node.instantiator.instantiate(&cartridge, &target).unwrap();

    let stored = fs::read_to_string(cartridge.manifest_path().unwrap()).unwrap();
    let copied = fs::read_to_string(target.join("metadata/manifest.yml")).unwrap();
    assert_eq!(stored, copied);
}

#[test]
fn test_newer_revision_is_instantiated_by_default() {
    let node = Node::new();
    node.install(CartridgeFixture::new("nodejs", "1.0").versions(&["0.10"]));
    node.install(CartridgeFixture::new("nodejs", "1.2").versions(&["0.10"]));
    node.install(CartridgeFixture::new("nodejs", "1.1").versions(&["0.10"]));

    let cartridge = node.repository.select("nodejs", Some("0.10"), None).unwrap();
    let target = node.gear("g2/nodejs");
    node.instantiator.instantiate(&cartridge, &target).unwrap();

    assert_eq!(
        fs::read_to_string(target.join("template/index.html")).unwrap(),
        "nodejs 1.2\n"
    );
}

#[test]
fn test_corrupted_store_entry_fails_instantiation_cleanly() {
    let node = Node::new();
    node.install(CartridgeFixture::new("perl", "1.0"));
    let cartridge = node.repository.select("perl", None, None).unwrap();
    fs::remove_file(cartridge.repository_path().unwrap().join("bin/control")).unwrap();
    let target = node.gear("g3/perl");

    let err = node.instantiator.instantiate(&cartridge, &target).unwrap_err();

    match err {
        ProvisionError::MalformedPackage { violations, .. } => {
            assert_eq!(violations, vec!["bin/control is missing"]);
        }
        other => panic!("expected MalformedPackage, got {other:?}"),
    }
    assert!(!target.exists());
    assert!(node.gear("g3").is_dir());
}

#[test]
fn test_reopened_node_resolves_same_cartridges() {
    let node = Node::new();
    node.install(CartridgeFixture::new("php", "1.0").versions(&["5.3", "5.4"]));
    node.install(CartridgeFixture::new("mysql", "2.0").versions(&["5.1", "5.5"]));

    let reopened = CartridgeRepository::open(node.repository.root()).unwrap();

    assert_eq!(reopened.len(), node.repository.len());
    for (name, version) in [("php", "5.3"), ("php", "5.4"), ("mysql", "5.5")] {
        let before = node.repository.select(name, Some(version), None).unwrap();
        let after = reopened.select(name, Some(version), None).unwrap();
        assert_eq!(before.key(), after.key());
        assert_eq!(before.repository_path(), after.repository_path());
    }
}
