//! Instantiate a cartridge into a target directory

use std::path::Path;

use colored::Colorize;

use cartridge_provision::Instantiator;
use cartridge_repo::CartridgeRepository;

use crate::error::{CliError, Result};

/// Run the instantiate command
pub fn run_instantiate(
    repository: &CartridgeRepository,
    instantiator: &Instantiator,
    name: &str,
    version: Option<&str>,
    revision: Option<&str>,
    target: &Path,
) -> Result<()> {
    if target.exists() {
        return Err(CliError::user(format!(
            "Target {} already exists",
            target.display()
        )));
    }

    let cartridge = repository.select(name, version, revision)?;
    instantiator.instantiate(&cartridge, target)?;
    println!(
        "{} Instantiated {} at {}",
        "OK".green().bold(),
        cartridge.to_string().cyan(),
        target.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartridge_test_utils::CartridgeFixture;
    use tempfile::TempDir;

    #[test]
    fn refuses_existing_target() {
        let tmp = TempDir::new().unwrap();
        let repository = CartridgeRepository::new(tmp.path().join("store")).unwrap();
        let (_src, dir) = CartridgeFixture::new("php", "1.0").in_temp_dir();
        repository.install(&dir).unwrap();

        let err = run_instantiate(
            &repository,
            &Instantiator::default(),
            "php",
            None,
            None,
            tmp.path(),
        )
        .unwrap_err();
        assert!(matches!(err, CliError::User { .. }));
        // An existing directory is never rolled back by a refused command.
        assert!(tmp.path().join("store").is_dir());
    }

    #[test]
    fn instantiates_resolved_cartridge() {
        let tmp = TempDir::new().unwrap();
        let repository = CartridgeRepository::new(tmp.path().join("store")).unwrap();
        let (_src, dir) = CartridgeFixture::new("php", "1.0").in_temp_dir();
        repository.install(&dir).unwrap();
        let target = tmp.path().join("gear/php");

        run_instantiate(&repository, &Instantiator::default(), "php", None, None, &target).unwrap();

        assert!(target.join("bin/control").is_file());
    }
}
