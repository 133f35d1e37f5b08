//! `ebuilder scan` command

use anyhow::Result;

use super::load_context;
use crate::cli::ScanArgs;
use crate::GlobalOptions;
use ebuilder::resolver::ExistingPackageIndex;
use ebuilder::sources::scan_repositories;
use ebuilder::util::shell::Status;

pub fn execute(args: ScanArgs, global_opts: &GlobalOptions) -> Result<()> {
    let shell = &global_opts.shell;
    let ctx = load_context(global_opts)?;

    let dirs = if args.dirs.is_empty() {
        ctx.config().scan_repos()
    } else {
        args.dirs
    };
    let roots: Vec<_> = dirs.iter().map(|dir| ctx.resolve_path(dir)).collect();

    let mut index = ExistingPackageIndex::new();
    let summary = scan_repositories(&roots, &mut index)?;

    print!("{}", format_index(&index));

    for (root, count) in &summary.repositories {
        shell.status(
            Status::Scanning,
            format!("{} ({} packages)", root.display(), count),
        );
    }
    shell.status(
        Status::Finished,
        format!("{} PyPI projects packaged", index.len()),
    );
    Ok(())
}

/// One `project -> category/name (version)` line per entry.
fn format_index(index: &ExistingPackageIndex) -> String {
    index
        .entries()
        .into_iter()
        .map(|(project, known)| {
            format!(
                "{} -> {} ({})\n",
                project,
                known.identity,
                known.version.as_deref().unwrap_or("no ebuild")
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ebuilder::resolver::PackageIdentity;

    #[test]
    fn test_format_index() {
        let mut index = ExistingPackageIndex::new();
        index.insert(
            "Requests",
            PackageIdentity::new("dev-python", "requests"),
            Some("2.31.0".to_string()),
        );
        index.insert("bare", PackageIdentity::new("dev-python", "bare"), None);

        assert_eq!(
            format_index(&index),
            "bare -> dev-python/bare (no ebuild)\n\
             requests -> dev-python/requests (2.31.0)\n"
        );
    }
}
