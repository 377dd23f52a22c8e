//! Shared test utilities for the cartridge workspace.
//!
//! This crate is a dev-dependency only and is never published.
//!
//! # Modules
//!
//! - [`fixture`]: [`CartridgeFixture`] builder for on-disk cartridge trees
//! - [`git`]: git repositories holding a cartridge, for clone-based instantiation

pub mod fixture;
pub mod git;

pub use fixture::CartridgeFixture;
