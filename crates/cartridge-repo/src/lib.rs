//! Versioned cartridge repository for a node.
//!
//! The repository keeps an in-memory [`CartridgeIndex`] over an on-disk
//! store laid out as `{root}/{vendor}-{name}/{revision}/`. Lookups accept a
//! name alone, a name and software version, or a fully qualified triple;
//! omitted components resolve to the greatest known version.
//!
//! All mutations (`load`, `install`, `erase`) are serialized through one
//! lock per repository instance. Readers take a short shared lock on the
//! index only and never wait on disk I/O.

pub mod error;
pub mod index;
pub mod repository;

pub use error::{Error, Result};
pub use index::{CartridgeIndex, IndexEntry};
pub use repository::CartridgeRepository;
