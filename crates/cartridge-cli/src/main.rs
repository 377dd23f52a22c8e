//! Cartridge repository CLI
//!
//! Operator interface to a node's cartridge repository: list and resolve
//! installed cartridges, install and erase them, and instantiate one into a
//! gear directory.

mod cli;
mod commands;
mod context;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cli::{Cli, Commands};
use context::NodeContext;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let Some(command) = cli.command else {
        println!("{} Cartridge repository CLI", "cartridge".green().bold());
        println!();
        println!("Run {} for available commands.", "cartridge --help".cyan());
        return Ok(());
    };

    let context = NodeContext::open(cli.config.as_deref(), cli.root.as_deref())?;
    execute_command(&context, command)
}

/// Log to stderr so `--json` output on stdout stays parseable.
fn init_tracing(verbose: bool) {
    let result = if verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_target(true)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    };
    if let Err(e) = result {
        eprintln!("{}: failed to install logger: {}", "warning".yellow().bold(), e);
    }
    tracing::debug!("Verbose mode enabled");
}

fn execute_command(context: &NodeContext, command: Commands) -> Result<()> {
    let repository = &context.repository;
    match command {
        Commands::List { json, latest } => commands::run_list(repository, json, latest),
        Commands::Show {
            name,
            version,
            revision,
            json,
        } => commands::run_show(
            repository,
            &name,
            version.as_deref(),
            revision.as_deref(),
            json,
        ),
        Commands::Install { source } => commands::run_install(repository, &source),
        Commands::Erase {
            name,
            version,
            revision,
        } => commands::run_erase(repository, &name, &version, &revision),
        Commands::Instantiate {
            name,
            version,
            revision,
            target,
        } => commands::run_instantiate(
            repository,
            &context.instantiator,
            &name,
            version.as_deref(),
            revision.as_deref(),
            &target,
        ),
    }
}
