//! Resolve and describe one cartridge

use colored::Colorize;

use cartridge_repo::CartridgeRepository;

use super::CartridgeSummary;
use crate::error::Result;

/// Run the show command
pub fn run_show(
    repository: &CartridgeRepository,
    name: &str,
    version: Option<&str>,
    revision: Option<&str>,
    json: bool,
) -> Result<()> {
    let cartridge = repository.select(name, version, revision)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&CartridgeSummary::from(cartridge.as_ref()))?
        );
        return Ok(());
    }

    println!("{}", cartridge.to_string().bold());
    if let Some(display) = cartridge.display_name() {
        println!("  {:<12} {}", "Display:".dimmed(), display);
    }
    println!("  {:<12} {}", "Versions:".dimmed(), cartridge.versions().join(", "));
    println!("  {:<12} {}", "Revision:".dimmed(), cartridge.revision());
    if let Some(path) = cartridge.repository_path() {
        println!("  {:<12} {}", "Path:".dimmed(), path.display());
    }
    if let Some(url) = cartridge.source_url() {
        println!("  {:<12} {}", "Source:".dimmed(), url);
    }

    Ok(())
}
