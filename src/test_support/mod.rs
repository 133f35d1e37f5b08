//! Test utilities and mocks for ebuilder unit tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use ebuilder::test_support::{MemorySource, RecordingSink};
//!
//! #[test]
//! fn test_example() {
//!     let mut source = MemorySource::new();
//!     source.add(ProjectDescriptor::new("requests", "2.31.0"));
//!
//!     let mut sink = RecordingSink::new();
//!     // Drive the generator with `source` and `sink`...
//! }
//! ```

pub mod fixtures;

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{bail, Result};

use crate::core::name::normalize;
use crate::core::ProjectDescriptor;
use crate::ops::ebuild::{GenerationRecord, RecipeSink};
use crate::sources::{FetchError, ProjectSource};

pub use fixtures::*;

/// In-memory registry.
///
/// Projects are keyed by normalized name. Unknown projects fail with
/// `NotFound`; projects registered with [`MemorySource::fail_transport`]
/// fail with `Transport`.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    projects: HashMap<String, ProjectDescriptor>,
    broken: HashMap<String, String>,
    fetches: Vec<String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor under its own name.
    pub fn add(&mut self, descriptor: ProjectDescriptor) -> &mut Self {
        self.projects
            .insert(normalize(&descriptor.name), descriptor);
        self
    }

    /// Register a descriptor under a name other than its own, the way a
    /// registry answers for a differently spelled request.
    pub fn add_as(&mut self, project: &str, descriptor: ProjectDescriptor) -> &mut Self {
        self.projects.insert(normalize(project), descriptor);
        self
    }

    /// Make fetches of `project` fail with a transport error.
    pub fn fail_transport(&mut self, project: &str, message: &str) -> &mut Self {
        self.broken
            .insert(normalize(project), message.to_string());
        self
    }

    /// Every fetch, in call order, as requested.
    pub fn fetches(&self) -> &[String] {
        &self.fetches
    }

    /// Number of fetches of `project`.
    pub fn fetch_count(&self, project: &str) -> usize {
        let key = normalize(project);
        self.fetches.iter().filter(|p| normalize(p) == key).count()
    }
}

impl ProjectSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    fn fetch_project(&mut self, project: &str) -> Result<ProjectDescriptor, FetchError> {
        self.fetches.push(project.to_string());
        let key = normalize(project);

        if let Some(message) = self.broken.get(&key) {
            return Err(FetchError::Transport {
                project: project.to_string(),
                message: message.clone(),
            });
        }

        self.projects
            .get(&key)
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                project: project.to_string(),
            })
    }
}

/// Sink that keeps every record instead of writing files.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    records: Vec<GenerationRecord>,
    fail_for: Vec<String>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make writes for `project` fail.
    pub fn fail_for(&mut self, project: &str) -> &mut Self {
        self.fail_for.push(normalize(project));
        self
    }

    pub fn records(&self) -> &[GenerationRecord] {
        &self.records
    }

    /// The record written for `project`, if any.
    pub fn record(&self, project: &str) -> Option<&GenerationRecord> {
        let key = normalize(project);
        self.records.iter().find(|r| normalize(&r.project) == key)
    }

    /// Projects written, in order.
    pub fn projects(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.project.as_str()).collect()
    }
}

impl RecipeSink for RecordingSink {
    fn write_recipe(&mut self, record: &GenerationRecord) -> Result<PathBuf> {
        if self.fail_for.contains(&normalize(&record.project)) {
            bail!("disk full");
        }
        self.records.push(record.clone());
        Ok(PathBuf::from(&record.identity.category)
            .join(&record.identity.name)
            .join(record.ebuild_file_name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_source() {
        let mut source = MemorySource::new();
        source.add(ProjectDescriptor::new("Zope.Interface", "6.0"));
        source.fail_transport("flaky", "connection reset");

        assert_eq!(source.fetch_project("zope-interface").unwrap().version, "6.0");
        assert!(matches!(
            source.fetch_project("flaky"),
            Err(FetchError::Transport { .. })
        ));
        assert!(matches!(
            source.fetch_project("missing"),
            Err(FetchError::NotFound { .. })
        ));
        assert_eq!(source.fetches().len(), 3);
        assert_eq!(source.fetch_count("zope.interface"), 1);
    }
}
