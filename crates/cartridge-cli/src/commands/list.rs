//! List installed cartridges

use colored::Colorize;
use std::sync::Arc;

use cartridge_manifest::Cartridge;
use cartridge_repo::CartridgeRepository;

use super::CartridgeSummary;
use crate::error::Result;

/// Run the list command
pub fn run_list(repository: &CartridgeRepository, json: bool, latest: bool) -> Result<()> {
    let cartridges: Vec<Arc<Cartridge>> = if latest {
        repository.latest_versions()
    } else {
        repository.cartridges()
    };

    if json {
        let summaries: Vec<CartridgeSummary> =
            cartridges.iter().map(|c| CartridgeSummary::from(c.as_ref())).collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if cartridges.is_empty() {
        println!(
            "No cartridges installed in {}. Use {} to add one.",
            repository.root().display(),
            "cartridge install <dir>".cyan()
        );
        return Ok(());
    }

    println!("{}", "Installed Cartridges".bold());
    println!();
    for cartridge in &cartridges {
        println!(
            "  {:<16} {:<10} {:<10} {}",
            cartridge.name().green(),
            cartridge.versions().join(","),
            cartridge.revision(),
            cartridge.vendor().dimmed()
        );
    }
    println!();
    println!("{} {} cartridges", "Total:".dimmed(), cartridges.len());

    Ok(())
}
