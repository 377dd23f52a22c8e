//! Concurrent provisioning against one node repository

use cartridge_provision::Instantiator;
use cartridge_repo::CartridgeRepository;
use cartridge_test_utils::CartridgeFixture;
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::TempDir;

#[test]
fn test_parallel_instantiations_of_one_cartridge() {
    let tmp = TempDir::new().unwrap();
    let repository = Arc::new(CartridgeRepository::new(tmp.path().join("store")).unwrap());
    let (_src, dir) = CartridgeFixture::new("php", "1.0").with_usr().in_temp_dir();
    repository.install(&dir).unwrap();

    let gears = 8;
    let barrier = Arc::new(Barrier::new(gears));
    let instantiator = Instantiator::default();

    let handles: Vec<_> = (0..gears)
        .map(|i| {
            let repository = Arc::clone(&repository);
            let barrier = Arc::clone(&barrier);
            let instantiator = instantiator.clone();
            let target = tmp.path().join(format!("gears/{i}/php"));
            thread::spawn(move || {
                barrier.wait();
                let cartridge = repository.select("php", None, None).unwrap();
                instantiator.instantiate(&cartridge, &target).unwrap();
                target
            })
        })
        .collect();

    for handle in handles {
        let target = handle.join().expect("Instantiation thread should not panic");
        assert!(target.join("bin/control").is_file());
    }
}

#[test]
fn test_provisioning_while_new_revisions_install() {
    let tmp = TempDir::new().unwrap();
    let repository = Arc::new(CartridgeRepository::new(tmp.path().join("store")).unwrap());
    let (_first, dir) = CartridgeFixture::new("ruby", "1.0").versions(&["1.9"]).in_temp_dir();
    repository.install(&dir).unwrap();
    let newer: Vec<_> = (1..5)
        .map(|rev| {
            CartridgeFixture::new("ruby", &format!("1.{rev}"))
                .versions(&["1.9"])
                .in_temp_dir()
        })
        .collect();

    let barrier = Arc::new(Barrier::new(2));
    let provisioner = {
        let repository = Arc::clone(&repository);
        let barrier = Arc::clone(&barrier);
        let gears = tmp.path().join("gears");
        thread::spawn(move || {
            barrier.wait();
            let instantiator = Instantiator::default();
            for i in 0..10 {
                let cartridge = repository.select("ruby", Some("1.9"), None).unwrap();
                // Earlier revisions are never erased, so whichever is resolved stays valid.
                instantiator
                    .instantiate(&cartridge, &gears.join(format!("{i}/ruby")))
                    .unwrap();
            }
        })
    };

    barrier.wait();
    for (_guard, dir) in &newer {
        repository.install(dir).unwrap();
    }
    provisioner.join().expect("Provisioner should not panic");

    assert_eq!(repository.len(), 5);
    assert_eq!(repository.select("ruby", None, None).unwrap().revision(), "1.4");
}
