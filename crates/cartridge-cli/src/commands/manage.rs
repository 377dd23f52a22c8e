//! Install and erase commands

use std::path::Path;

use colored::Colorize;

use cartridge_repo::CartridgeRepository;

use crate::error::Result;

/// Run the install command
pub fn run_install(repository: &CartridgeRepository, source: &Path) -> Result<()> {
    let cartridge = repository.install(source)?;
    println!(
        "{} Installed {} into {}",
        "OK".green().bold(),
        cartridge.to_string().cyan(),
        cartridge
            .repository_path()
            .unwrap_or_else(|| repository.root())
            .display()
    );
    Ok(())
}

/// Run the erase command
pub fn run_erase(
    repository: &CartridgeRepository,
    name: &str,
    version: &str,
    revision: &str,
) -> Result<()> {
    let cartridge = repository.erase(name, version, revision)?;
    println!("{} Erased {}", "OK".green().bold(), cartridge.to_string().cyan());
    Ok(())
}
