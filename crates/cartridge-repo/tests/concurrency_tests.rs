//! Concurrent readers and writers against one repository instance

use cartridge_repo::CartridgeRepository;
use cartridge_test_utils::CartridgeFixture;
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::TempDir;

#[test]
fn test_readers_see_consistent_snapshots_during_installs() {
    let tmp = TempDir::new().unwrap();
    let repo = Arc::new(CartridgeRepository::new(tmp.path().join("store")).unwrap());
    let sources: Vec<_> = (0..8)
        .map(|rev| CartridgeFixture::new("php", &format!("1.{rev}")).versions(&["5.3", "5.4"]))
        .map(|fixture| fixture.in_temp_dir())
        .collect();

    let readers = 4;
    let barrier = Arc::new(Barrier::new(readers + 1));

    let reader_handles: Vec<_> = (0..readers)
        .map(|_| {
            let repo = Arc::clone(&repo);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..200 {
                    // A cartridge visible by name must be visible under each of its versions.
                    if let Ok(latest) = repo.select("php", None, None) {
                        for version in ["5.3", "5.4"] {
                            let exact = repo
                                .select("php", Some(version), Some(latest.revision()))
                                .expect("every version slot of an indexed revision resolves");
                            assert_eq!(exact.id(), latest.id());
                        }
                    }
                    let listed = repo.cartridges();
                    assert!(listed.len() <= 8);
                }
            })
        })
        .collect();

    barrier.wait();
    for (_guard, dir) in &sources {
        repo.install(dir).unwrap();
    }

    for handle in reader_handles {
        handle.join().expect("Reader should not panic");
    }

    assert_eq!(repo.len(), 8);
    assert_eq!(repo.select("php", None, None).unwrap().revision(), "1.7");
}

#[test]
fn test_concurrent_installs_of_distinct_cartridges_all_land() {
    let tmp = TempDir::new().unwrap();
    let repo = Arc::new(CartridgeRepository::new(tmp.path().join("store")).unwrap());
    let writers = 6;
    let barrier = Arc::new(Barrier::new(writers));

    let handles: Vec<_> = (0..writers)
        .map(|i| {
            let repo = Arc::clone(&repo);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let (_guard, dir) = CartridgeFixture::new(&format!("cart{i}"), "1.0").in_temp_dir();
                barrier.wait();
                repo.install(&dir).unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Writer should not panic");
    }

    assert_eq!(repo.len(), writers);
    for i in 0..writers {
        assert!(repo.root().join(format!("redhat-cart{i}/1.0/metadata/manifest.yml")).is_file());
    }
}

#[test]
fn test_erase_races_with_select() {
    let tmp = TempDir::new().unwrap();
    let repo = Arc::new(CartridgeRepository::new(tmp.path().join("store")).unwrap());
    for rev in ["1.0", "1.1", "1.2"] {
        let (_guard, dir) = CartridgeFixture::new("ruby", rev).versions(&["1.9"]).in_temp_dir();
        repo.install(&dir).unwrap();
    }

    let barrier = Arc::new(Barrier::new(2));
    let reader = {
        let repo = Arc::clone(&repo);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            for _ in 0..500 {
                if let Ok(found) = repo.select("ruby", Some("1.9"), None) {
                    assert!(["1.0", "1.1", "1.2"].contains(&found.revision()));
                }
            }
        })
    };

    barrier.wait();
    for rev in ["1.2", "1.1"] {
        repo.erase("ruby", "1.9", rev).unwrap();
    }
    reader.join().expect("Reader should not panic");

    assert_eq!(repo.len(), 1);
    assert_eq!(repo.select("ruby", None, None).unwrap().revision(), "1.0");
}
