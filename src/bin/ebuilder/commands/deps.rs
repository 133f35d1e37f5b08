//! `ebuilder deps` command

use anyhow::{bail, Result};

use super::{build_resolver, load_context, open_source, scan_roots};
use crate::cli::DepsArgs;
use crate::GlobalOptions;
use ebuilder::ops::generate::{plan_project, GenerateOptions, ProjectPlan};
use ebuilder::util::diagnostic::emit;
use ebuilder::util::shell::Status;

pub fn execute(args: DepsArgs, global_opts: &GlobalOptions) -> Result<()> {
    let shell = &global_opts.shell;
    let ctx = load_context(global_opts)?;
    let config = ctx.config();

    let roots = scan_roots(&ctx, &args.source, None);
    let mut resolver = build_resolver(&ctx, &roots, global_opts)?;
    let mut source = open_source(&ctx, &args.source)?;

    let options = GenerateOptions {
        default_category: args
            .category
            .clone()
            .unwrap_or_else(|| config.default_category().to_string()),
        exclusions: config.exclusions(),
        ..GenerateOptions::default()
    };

    shell.verbose(Status::Fetching, &args.package);
    let plan = match plan_project(&args.package, source.as_mut(), &mut resolver, &options) {
        Ok(plan) => plan,
        Err(e) => {
            emit(&e.to_diagnostic(), shell.use_color());
            bail!("could not inspect `{}`", args.package);
        }
    };

    for skipped in &plan.skipped {
        shell.warn(skipped);
    }

    let pending: Vec<&str> = resolver.pending().iter().collect();
    print!("{}", format_plan(&plan, &pending));
    Ok(())
}

/// Human-readable summary of a plan.
fn format_plan(plan: &ProjectPlan, pending: &[&str]) -> String {
    let mut out = format!(
        "{} {} -> {}\n",
        plan.descriptor.name, plan.descriptor.version, plan.identity
    );
    out.push_str(&format!("IUSE=\"{}\"\n", plan.dependencies.iuse_string()));
    if plan.dependencies.entries.is_empty() {
        out.push_str("RDEPEND=\"\"\n");
    } else {
        out.push_str(&format!(
            "RDEPEND=\"\n\t{}\n\"\n",
            plan.dependencies.rdepend_block()
        ));
    }
    if !pending.is_empty() {
        out.push_str(&format!("not packaged yet: {}\n", pending.join(" ")));
    }
    out
}
