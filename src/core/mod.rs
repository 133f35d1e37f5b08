//! Core data structures for ebuilder.
//!
//! This module contains the pure, I/O-free building blocks:
//! - Project name canonicalization
//! - Requirement-string parsing
//! - Marker classification
//! - Project descriptors

pub mod descriptor;
pub mod marker;
pub mod name;
pub mod requirement;

pub use descriptor::ProjectDescriptor;
pub use marker::Marker;
pub use name::normalize;
pub use requirement::{Requirement, RequirementError, VersionClause, VersionOp};
