//! High-level operations.
//!
//! This module contains the implementation of ebuilder commands.

pub mod ebuild;
pub mod generate;
pub mod manifest;

pub use ebuild::{
    prepare_repository, render_ebuild, render_metadata_xml, EbuildSettings, EbuildWriter,
    GenerationRecord, RecipeSink,
};
pub use generate::{
    generate, plan_project, FailedPackage, GenerateError, GenerateOptions, GeneratedPackage,
    GenerationReport, ProjectPlan,
};
pub use manifest::{run_manifest, run_manifest_or_warn, ManifestError};
