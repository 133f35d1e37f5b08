//! Requirement grouping and package-identity resolution.
//!
//! This module is pure and deterministic - all I/O happens in `sources` and
//! `ops`. The only mutable state is the per-run [`IdentityResolver`].

pub mod depend;
pub mod identity;
pub mod requirements;

pub use depend::{render_atoms, render_dependencies, RenderedDependencies, PYTHON_USEDEP};
pub use identity::{
    ExceptionTable, ExistingPackageIndex, IdentityResolver, KnownPackage, PackageIdentity,
    PendingSet, DEFAULT_CATEGORY,
};
pub use requirements::{Exclusions, RequirementGroup};
