//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// ebuilder - Generate Gentoo ebuilds from PyPI project metadata
#[derive(Parser)]
#[command(name = "ebuilder")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Config file to use instead of .ebuilder/config.toml
    #[arg(long, global = true, env = "EBUILDER_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate ebuilds for PyPI projects
    Generate(GenerateArgs),

    /// Show the dependencies a project would get, without writing anything
    Deps(DepsArgs),

    /// List PyPI projects already packaged in a package tree
    Scan(ScanArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Where project metadata and existing packages come from.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Read project JSON from `<DIR>/<name>.json` instead of the network
    #[arg(long, value_name = "DIR")]
    pub index_dir: Option<PathBuf>,

    /// Package tree to scan for existing packages (repeatable)
    #[arg(long = "scan", value_name = "DIR")]
    pub scan: Vec<PathBuf>,

    /// Do not scan any package tree
    #[arg(long, conflicts_with = "scan")]
    pub no_scan: bool,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// PyPI projects to generate
    #[arg(required = true, value_name = "PACKAGES")]
    pub packages: Vec<String>,

    /// Output repository
    #[arg(long, value_name = "DIR")]
    pub repo: Option<PathBuf>,

    /// Also generate missing dependencies
    #[arg(short = 'R', long)]
    pub recursive: bool,

    /// Run the manifest tool after each ebuild is written
    #[arg(short = 'p', long)]
    pub manifest: bool,

    /// Category for packages that do not exist yet
    #[arg(long, value_name = "CAT")]
    pub category: Option<String>,

    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Args, Debug)]
pub struct DepsArgs {
    /// PyPI project to inspect
    pub package: String,

    /// Category for packages that do not exist yet
    #[arg(long, value_name = "CAT")]
    pub category: Option<String>,

    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Package trees to scan (defaults to the configured ones)
    #[arg(value_name = "DIR")]
    pub dirs: Vec<PathBuf>,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}
