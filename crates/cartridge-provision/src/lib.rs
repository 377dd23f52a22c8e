//! Cartridge instantiation engine.
//!
//! Given a resolved [`Cartridge`](cartridge_manifest::Cartridge) and a target
//! directory, an [`Instantiator`] produces the cartridge's file tree there by
//! one of several strategies:
//!
//! - repository copy, linking the shared `usr` directory
//! - `git clone` followed by `git repack`
//! - `curl` download of a zip, tar.gz or tar archive, checksum verification,
//!   and extraction
//! - copy from a `file://` URL
//!
//! The result is then structurally validated. Any failure removes the target
//! before the error is returned.

pub mod config;
pub mod download;
pub mod error;
pub mod extract;
pub mod instantiate;
pub mod process;
pub mod source;
pub mod validate;

pub use config::{DownloadLimits, ProvisionConfig};
pub use error::{Error, Result};
pub use instantiate::Instantiator;
pub use process::{CommandOutput, CommandRunner, CommandSpec, SystemRunner, find_on_path};
pub use source::{ArchiveFormat, SourceKind};
