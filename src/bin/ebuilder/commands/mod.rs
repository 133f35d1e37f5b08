//! Command implementations

pub mod completions;
pub mod deps;
pub mod generate;
pub mod scan;

use std::path::PathBuf;

use anyhow::Result;

use crate::cli::SourceArgs;
use crate::GlobalOptions;
use ebuilder::resolver::{ExistingPackageIndex, IdentityResolver};
use ebuilder::sources::{scan_repositories, DescriptorSettings, LocalIndex, ProjectSource, PypiClient};
use ebuilder::util::diagnostic::suggestions;
use ebuilder::util::shell::Status;
use ebuilder::util::GlobalContext;

/// Load the config and build the context for the current directory.
pub fn load_context(global_opts: &GlobalOptions) -> Result<GlobalContext> {
    let cwd = std::env::current_dir()?;
    let mut ctx = GlobalContext::load(cwd, global_opts.config.as_deref())?;
    ctx.set_verbose(global_opts.verbose);
    Ok(ctx)
}

/// The registry source selected by `--index-dir` or the config.
pub fn open_source(ctx: &GlobalContext, args: &SourceArgs) -> Result<Box<dyn ProjectSource>> {
    let config = ctx.config();
    let settings = DescriptorSettings::new(config.python_compat(), config.license_aliases());

    match &args.index_dir {
        Some(dir) => Ok(Box::new(LocalIndex::new(ctx.resolve_path(dir), settings))),
        None => Ok(Box::new(PypiClient::new(
            config.index_url()?,
            config.timeout(),
            settings,
        )?)),
    }
}

/// Package trees to scan: `--scan` values, else the configured trees,
/// followed by `extra`.
pub fn scan_roots(ctx: &GlobalContext, args: &SourceArgs, extra: Option<PathBuf>) -> Vec<PathBuf> {
    if args.no_scan {
        return Vec::new();
    }

    let configured = if args.scan.is_empty() {
        ctx.config().scan_repos()
    } else {
        args.scan.clone()
    };

    let mut roots: Vec<PathBuf> = configured
        .iter()
        .map(|dir| ctx.resolve_path(dir))
        .collect();
    if let Some(extra) = extra {
        if !roots.contains(&extra) {
            roots.push(extra);
        }
    }
    roots
}

/// Scan `roots` and build the per-run resolver.
pub fn build_resolver(
    ctx: &GlobalContext,
    roots: &[PathBuf],
    global_opts: &GlobalOptions,
) -> Result<IdentityResolver> {
    let shell = &global_opts.shell;
    let exceptions = ctx.config().exception_table()?;
    let mut index = ExistingPackageIndex::new();

    if !roots.is_empty() {
        for root in roots {
            shell.verbose(Status::Scanning, root.display());
        }
        let summary = scan_repositories(roots, &mut index)?;
        if summary.total() == 0 {
            shell.warn("no existing packages found");
            shell.note(suggestions::EMPTY_INDEX);
        }
    }

    Ok(IdentityResolver::new(exceptions, index))
}
