//! Implementation of `ebuilder generate`.
//!
//! The driver works through an explicit queue: the requested seeds first,
//! then (when recursive) every project the resolver queued as pending while
//! rendering dependencies. Each project is fetched, grouped, resolved,
//! rendered and written; a failure is recorded for that project only.

use std::collections::HashSet;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::name::normalize;
use crate::core::{ProjectDescriptor, RequirementError};
use crate::ops::ebuild::{GenerationRecord, RecipeSink};
use crate::ops::manifest::run_manifest_or_warn;
use crate::resolver::{
    render_dependencies, Exclusions, IdentityResolver, PackageIdentity, RenderedDependencies,
    RequirementGroup, DEFAULT_CATEGORY,
};
use crate::sources::{FetchError, ProjectSource};
use crate::util::diagnostic::Diagnostic;

/// Options for a generation run.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Category for projects that are not packaged yet
    pub default_category: String,

    /// Also generate every dependency that is not packaged yet
    pub recursive: bool,

    /// Requirement exclusion rules
    pub exclusions: Exclusions,

    /// Manifest command run in each written package directory
    pub manifest_command: Option<Vec<String>>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        GenerateOptions {
            default_category: DEFAULT_CATEGORY.to_string(),
            recursive: false,
            exclusions: Exclusions::default(),
            manifest_command: None,
        }
    }
}

/// Why one project could not be generated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to write recipe for `{project}`: {message}")]
    Write { project: String, message: String },
}

impl GenerateError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            GenerateError::Fetch(e) => e.to_diagnostic(),
            GenerateError::Write { project, message } => {
                Diagnostic::error(format!("failed to write recipe for `{}`", project))
                    .with_context(message.clone())
                    .with_suggestion("Check that the output repository is writable")
            }
        }
    }
}

/// A project fetched, grouped and rendered, ready to be written.
#[derive(Debug, Clone)]
pub struct ProjectPlan {
    pub descriptor: ProjectDescriptor,
    /// Where the recipe goes
    pub identity: PackageIdentity,
    pub requirements: RequirementGroup,
    /// Requirement lines that were skipped
    pub skipped: Vec<RequirementError>,
    pub dependencies: RenderedDependencies,
}

impl ProjectPlan {
    pub fn record(&self) -> GenerationRecord {
        GenerationRecord::new(
            &self.descriptor,
            self.identity.clone(),
            self.dependencies.clone(),
        )
    }
}

/// A recipe that was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPackage {
    /// Name as requested or referenced
    pub project: String,
    pub identity: PackageIdentity,
    pub version: String,
    pub path: PathBuf,
    /// Requirement lines that were skipped
    pub skipped: Vec<RequirementError>,
}

/// A project that could not be generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedPackage {
    pub project: String,
    pub error: GenerateError,
}

/// Outcome of a generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub generated: Vec<GeneratedPackage>,
    pub failed: Vec<FailedPackage>,
    /// Projects still pending at the end of the run
    pub pending: Vec<String>,
}

impl GenerationReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn generated_projects(&self) -> Vec<&str> {
        self.generated.iter().map(|p| p.project.as_str()).collect()
    }
}

/// Fetch one project and render its dependencies.
///
/// Unresolved dependencies are queued on `resolver`; the project's own
/// target identity is not. The target is derived from `project` rather than
/// the registry's spelling of the name, so it matches the atom any
/// dependent rendered for it.
pub fn plan_project(
    project: &str,
    source: &mut dyn ProjectSource,
    resolver: &mut IdentityResolver,
    options: &GenerateOptions,
) -> Result<ProjectPlan, FetchError> {
    let descriptor = source.fetch_project(project)?;
    tracing::debug!(
        "{}: version {}, {} requirement lines",
        descriptor.name,
        descriptor.version,
        descriptor.requires_dist.len()
    );

    // Keyed on the requested name, the same one dependents resolved
    let identity = resolver.target_for(project, &options.default_category);

    let (requirements, skipped) =
        RequirementGroup::build(Some(&descriptor.requires_dist), &options.exclusions);
    let dependencies = render_dependencies(&requirements, resolver, &options.default_category);

    Ok(ProjectPlan {
        descriptor,
        identity,
        requirements,
        skipped,
        dependencies,
    })
}

/// Generate recipes for `seeds`, and for their missing dependencies when
/// `options.recursive` is set.
///
/// Seeds are generated even if already packaged. Per-project failures are
/// collected in the report; nothing here aborts the run.
pub fn generate(
    seeds: &[String],
    source: &mut dyn ProjectSource,
    sink: &mut dyn RecipeSink,
    resolver: &mut IdentityResolver,
    options: &GenerateOptions,
) -> GenerationReport {
    let mut report = GenerationReport::default();
    let mut seen = HashSet::new();

    for seed in seeds {
        if !seen.insert(normalize(seed)) {
            continue;
        }
        generate_one(seed, source, sink, resolver, options, &mut report);
    }

    if options.recursive {
        while let Some(project) = resolver.next_pending() {
            if resolver.find(&project).is_some() {
                tracing::debug!("{} was packaged meanwhile, skipping", project);
                continue;
            }
            generate_one(&project, source, sink, resolver, options, &mut report);
        }
    }

    report.pending = resolver.pending().iter().map(str::to_string).collect();
    report
}

fn generate_one(
    project: &str,
    source: &mut dyn ProjectSource,
    sink: &mut dyn RecipeSink,
    resolver: &mut IdentityResolver,
    options: &GenerateOptions,
    report: &mut GenerationReport,
) {
    tracing::info!("Generating {}", project);

    let plan = match plan_project(project, source, resolver, options) {
        Ok(plan) => plan,
        Err(e) => {
            tracing::warn!("{}", e);
            resolver.mark_failed(project);
            report.failed.push(FailedPackage {
                project: project.to_string(),
                error: e.into(),
            });
            return;
        }
    };

    let record = plan.record();
    let path = match sink.write_recipe(&record) {
        Ok(path) => path,
        Err(e) => {
            tracing::warn!("failed to write recipe for {}: {:#}", project, e);
            resolver.mark_failed(project);
            report.failed.push(FailedPackage {
                project: project.to_string(),
                error: GenerateError::Write {
                    project: project.to_string(),
                    message: format!("{:#}", e),
                },
            });
            return;
        }
    };

    let version = plan.descriptor.version.clone();
    resolver.mark_generated(project, plan.identity.clone(), &version);
    if normalize(&plan.descriptor.name) != normalize(project) {
        resolver.mark_generated(&plan.descriptor.name, plan.identity.clone(), &version);
    }

    if let Some(command) = &options.manifest_command {
        if let Some(package_dir) = path.parent() {
            run_manifest_or_warn(command, package_dir);
        }
    }

    report.generated.push(GeneratedPackage {
        project: project.to_string(),
        identity: plan.identity,
        version,
        path,
        skipped: plan.skipped,
    });
}
