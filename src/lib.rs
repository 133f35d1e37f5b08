//! ebuilder - generate Gentoo ebuilds from PyPI project metadata
//!
//! This crate provides the library behind the `ebuilder` command: parsing
//! and grouping requirement strings, mapping registry projects to packages,
//! scanning existing package trees and writing recipes.

pub mod core;
pub mod ops;
pub mod resolver;
pub mod sources;
pub mod util;

/// Test utilities and mocks for ebuilder unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests.
#[cfg(test)]
pub mod test_support;

pub use core::{ProjectDescriptor, Requirement, RequirementError};
pub use resolver::{IdentityResolver, PackageIdentity, RequirementGroup};
pub use util::context::GlobalContext;
