//! Command implementations for cartridge-cli

pub mod instantiate;
pub mod list;
pub mod manage;
pub mod show;

pub use instantiate::run_instantiate;
pub use list::run_list;
pub use manage::{run_erase, run_install};
pub use show::run_show;

use std::path::PathBuf;

use cartridge_manifest::Cartridge;
use serde::Serialize;

/// Machine-readable view of a cartridge for `--json` output.
#[derive(Debug, Serialize)]
pub struct CartridgeSummary {
    pub name: String,
    pub vendor: String,
    pub version: String,
    pub versions: Vec<String>,
    pub revision: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl From<&Cartridge> for CartridgeSummary {
    fn from(cartridge: &Cartridge) -> Self {
        Self {
            name: cartridge.name().to_string(),
            vendor: cartridge.vendor().to_string(),
            version: cartridge.software_version().to_string(),
            versions: cartridge.versions().to_vec(),
            revision: cartridge.revision().to_string(),
            display_name: cartridge.display_name().map(str::to_string),
            source_url: cartridge.source_url().map(str::to_string),
            path: cartridge.repository_path().map(PathBuf::from),
        }
    }
}
