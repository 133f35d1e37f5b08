//! `ebuilder generate` command

use anyhow::Result;

use super::{build_resolver, load_context, open_source, scan_roots};
use crate::cli::GenerateArgs;
use crate::GlobalOptions;
use ebuilder::ops::ebuild::{prepare_repository, EbuildWriter};
use ebuilder::ops::generate::{generate, GenerateOptions, GenerationReport};
use ebuilder::util::diagnostic::{emit, suggestions, Diagnostic};
use ebuilder::util::shell::{Shell, Status};

pub fn execute(args: GenerateArgs, global_opts: &GlobalOptions) -> Result<()> {
    let shell = &global_opts.shell;
    let ctx = load_context(global_opts)?;
    let config = ctx.config();

    let repo = ctx.repo_dir(args.repo.as_deref());
    prepare_repository(&repo)?;

    // Earlier runs count as existing packages too
    let roots = scan_roots(&ctx, &args.source, Some(repo.clone()));
    let mut resolver = build_resolver(&ctx, &roots, global_opts)?;
    let mut source = open_source(&ctx, &args.source)?;

    let run_manifest = args.manifest || config.run_manifest();
    let options = GenerateOptions {
        default_category: args
            .category
            .clone()
            .unwrap_or_else(|| config.default_category().to_string()),
        recursive: args.recursive || config.recursive(),
        exclusions: config.exclusions(),
        manifest_command: run_manifest.then(|| config.manifest_command()),
    };

    let mut writer = EbuildWriter::new(&repo, config.ebuild_settings());
    let report = generate(
        &args.packages,
        source.as_mut(),
        &mut writer,
        &mut resolver,
        &options,
    );

    print_report(&report, shell);
    Ok(())
}

fn print_report(report: &GenerationReport, shell: &Shell) {
    for package in &report.generated {
        shell.status(
            Status::Generated,
            format!(
                "{}-{} ({})",
                package.identity, package.version, package.project
            ),
        );
        if shell.is_verbose() {
            for skipped in &package.skipped {
                emit(
                    &Diagnostic::warning(skipped.to_string())
                        .with_suggestion(suggestions::MALFORMED_REQUIREMENT),
                    shell.use_color(),
                );
            }
        }
    }

    for failed in &report.failed {
        shell.status(Status::Failed, &failed.project);
        emit(&failed.error.to_diagnostic(), shell.use_color());
    }

    if !report.pending.is_empty() {
        shell.note(format!(
            "{} dependencies are not packaged yet: {} (use --recursive to generate them)",
            report.pending.len(),
            report.pending.join(", ")
        ));
    }

    shell.status(
        Status::Finished,
        format!(
            "{} generated, {} failed",
            report.generated.len(),
            report.failed.len()
        ),
    );
}
