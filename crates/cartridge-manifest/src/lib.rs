//! Cartridge manifest parsing for `metadata/manifest.yml` files.
//!
//! A manifest declares a cartridge's name, vendor, the software versions it
//! supports, and its package revision (`Cartridge-Version`). Parsing yields a
//! [`Cartridge`] descriptor carrying a stable identity that the repository
//! index uses to tell apart descriptors with equal fields.

pub mod cartridge;
pub mod error;
pub mod manifest;
pub mod version;

pub use cartridge::{Cartridge, CartridgeId, ManifestOrigin};
pub use error::{Error, Result};
pub use manifest::{manifest_path_in, parse, parse_text};
pub use version::{VersionKey, compare_versions};
