//! Metadata sources.
//!
//! Registry sources produce project descriptors; the portage scanner reads
//! an existing package tree to seed the package index.

pub mod portage;
pub mod pypi;
pub mod source;

pub use portage::{scan_repositories, scan_repository, ScanSummary, ScannedPackage};
pub use pypi::{DescriptorSettings, LocalIndex, PypiClient, PypiProject};
pub use source::{FetchError, ProjectSource};
