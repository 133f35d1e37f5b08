//! ebuilder CLI - Generate Gentoo ebuilds from PyPI project metadata

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ebuilder::util::shell::{ColorChoice, Shell};

mod cli;
mod commands;

use cli::{Cli, Commands};

/// Options shared by every command.
pub struct GlobalOptions {
    pub shell: Shell,
    pub verbose: bool,
    /// Explicit config file
    pub config: Option<PathBuf>,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("ebuilder=debug")
    } else if cli.quiet {
        EnvFilter::new("ebuilder=error")
    } else {
        EnvFilter::new("ebuilder=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let color = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    let global_opts = GlobalOptions {
        shell: Shell::from_flags(cli.quiet, cli.verbose, color),
        verbose: cli.verbose,
        config: cli.config,
    };

    // Execute command
    match cli.command {
        Commands::Generate(args) => commands::generate::execute(args, &global_opts),
        Commands::Deps(args) => commands::deps::execute(args, &global_opts),
        Commands::Scan(args) => commands::scan::execute(args, &global_opts),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
