//! Filesystem primitives for the cartridge repository
//!
//! Provides tree copy and removal, content checksums, the well-known
//! names of a cartridge's on-disk layout, and format-agnostic config loading.

pub mod checksum;
pub mod config;
pub mod constants;
pub mod error;
pub mod tree;

pub use config::ConfigStore;
pub use constants::CartridgePath;
pub use error::{Error, Result};
