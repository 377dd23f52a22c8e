//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Cartridge repository - install, resolve and instantiate node cartridges
#[derive(Parser, Debug)]
#[command(name = "cartridge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Repository root, overriding the configured path
    #[arg(long, global = true, env = "CARTRIDGE_REPOSITORY")]
    pub root: Option<PathBuf>,

    /// Node configuration file (TOML, JSON or YAML)
    #[arg(long, global = true, env = "CARTRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// List every installed cartridge
    List {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,

        /// Only the latest revision of each software version
        #[arg(long)]
        latest: bool,
    },

    /// Resolve a cartridge and show its details
    ///
    /// Omitted version or revision resolve to the greatest installed one.
    Show {
        name: String,
        version: Option<String>,
        revision: Option<String>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Install the cartridge in a directory into the repository
    Install {
        /// Directory containing metadata/manifest.yml
        source: PathBuf,
    },

    /// Erase an installed cartridge
    Erase {
        name: String,
        version: String,
        revision: String,
    },

    /// Materialize a cartridge into a target directory
    ///
    /// Examples:
    ///   cartridge instantiate php --target /var/lib/gears/abc/php
    ///   cartridge instantiate php 5.4 1.0 --target ./php
    Instantiate {
        name: String,
        version: Option<String>,
        revision: Option<String>,

        /// Directory to create
        #[arg(short, long)]
        target: PathBuf,
    },
}
