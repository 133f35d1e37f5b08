//! Mapping registry project names to target packages.
//!
//! Resolution consults, in order: the exception table, the index of packages
//! already present in a scanned tree (exact key, then separator-swapped
//! keys), and finally synthesizes a name in the default category. A
//! synthesized identity queues the project for generation.
//!
//! All state lives in one [`IdentityResolver`] created per run; every
//! read-modify-write across the index and the pending queue goes through
//! `&mut self`.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::str::FromStr;

use crate::core::name::{normalize, package_name, separator_variants};

/// Category used when nothing else is known.
pub const DEFAULT_CATEGORY: &str = "dev-python";

/// A package in the target repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageIdentity {
    /// Category, e.g. `dev-python`
    pub category: String,

    /// Package name within the category
    pub name: String,

    /// `false` when the identity was synthesized rather than found
    pub exists: bool,
}

impl PackageIdentity {
    /// An identity known to exist.
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
        PackageIdentity {
            category: category.into(),
            name: name.into(),
            exists: true,
        }
    }

    /// An identity made up for a project that is not packaged yet.
    pub fn synthesized(category: impl Into<String>, name: impl Into<String>) -> Self {
        PackageIdentity {
            category: category.into(),
            name: name.into(),
            exists: false,
        }
    }

    /// `category/name`
    pub fn atom(&self) -> String {
        format!("{}/{}", self.category, self.name)
    }
}

impl fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.name)
    }
}

impl FromStr for PackageIdentity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('/') {
            Some((category, name))
                if !category.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(PackageIdentity::new(category, name))
            }
            _ => Err(format!("expected `category/name`, found `{}`", s)),
        }
    }
}

/// An index entry: where a project lives and which version is packaged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownPackage {
    pub identity: PackageIdentity,
    pub version: Option<String>,
}

/// Projects already packaged in the target repository.
///
/// Keys are normalized here, at the only point of entry, so callers pass
/// registry names as they have them.
#[derive(Debug, Clone, Default)]
pub struct ExistingPackageIndex {
    entries: HashMap<String, KnownPackage>,
}

impl ExistingPackageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a packaged project. Returns the entry it replaced, if any.
    pub fn insert(
        &mut self,
        project: &str,
        identity: PackageIdentity,
        version: Option<String>,
    ) -> Option<KnownPackage> {
        let identity = PackageIdentity {
            exists: true,
            ..identity
        };
        self.entries
            .insert(normalize(project), KnownPackage { identity, version })
    }

    /// Exact lookup on the normalized key.
    pub fn get(&self, project: &str) -> Option<&KnownPackage> {
        self.entries.get(&normalize(project))
    }

    /// Exact lookup, then lookups with `-` and `_` swapped.
    pub fn lookup(&self, project: &str) -> Option<&KnownPackage> {
        let key = normalize(project);
        if let Some(hit) = self.entries.get(&key) {
            return Some(hit);
        }
        separator_variants(&key)
            .iter()
            .find_map(|variant| self.entries.get(variant))
    }

    pub fn contains(&self, project: &str) -> bool {
        self.get(project).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by key.
    pub fn entries(&self) -> Vec<(&str, &KnownPackage)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|(key, pkg)| (key.as_str(), pkg))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

/// Hard-coded registry → target mappings that override the index.
#[derive(Debug, Clone, Default)]
pub struct ExceptionTable {
    entries: HashMap<String, PackageIdentity>,
}

impl ExceptionTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Projects provided by packages that do not declare the registry
    /// upstream, or that live under a different name.
    pub fn builtin() -> Self {
        let mut table = ExceptionTable::new();
        for (project, category, name) in [
            ("bs4", "dev-python", "beautifulsoup"),
            ("funcsigs", "dev-lang", "python"),
            ("opencv-python", "media-libs", "opencv"),
            ("tensorflow", "sci-libs", "tensorflow"),
            ("tensorflow-cpu", "sci-libs", "tensorflow"),
            ("tensorflow-gpu", "sci-libs", "tensorflow"),
            ("torch", "sci-libs", "pytorch"),
        ] {
            table.insert(project, PackageIdentity::new(category, name));
        }
        table
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, project: &str, identity: PackageIdentity) {
        let identity = PackageIdentity {
            exists: true,
            ..identity
        };
        self.entries.insert(normalize(project), identity);
    }

    pub fn get(&self, project: &str) -> Option<&PackageIdentity> {
        self.entries.get(&normalize(project))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Projects that still need a recipe, in discovery order.
///
/// Membership is tracked by [`package_name`], so `foo_bar` and `foo-bar` are
/// one entry; the queue keeps the name as it was first referenced so it can
/// be fetched as-is.
#[derive(Debug, Clone, Default)]
pub struct PendingSet {
    queue: VecDeque<String>,
    members: HashSet<String>,
}

impl PendingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a project. Returns `false` if it was already pending.
    pub fn insert(&mut self, project: &str) -> bool {
        if self.members.insert(package_name(project)) {
            self.queue.push_back(project.to_string());
            true
        } else {
            false
        }
    }

    /// Take the oldest pending project.
    pub fn pop(&mut self) -> Option<String> {
        let project = self.queue.pop_front()?;
        self.members.remove(&package_name(&project));
        Some(project)
    }

    /// Drop a project from the queue. Returns whether it was pending.
    pub fn remove(&mut self, project: &str) -> bool {
        let key = package_name(project);
        if self.members.remove(&key) {
            self.queue.retain(|p| package_name(p) != key);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, project: &str) -> bool {
        self.members.contains(&package_name(project))
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Pending projects in queue order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.queue.iter().map(String::as_str)
    }
}

/// Per-run resolver state.
#[derive(Debug, Clone, Default)]
pub struct IdentityResolver {
    exceptions: ExceptionTable,
    index: ExistingPackageIndex,
    pending: PendingSet,
}

impl IdentityResolver {
    pub fn new(exceptions: ExceptionTable, index: ExistingPackageIndex) -> Self {
        IdentityResolver {
            exceptions,
            index,
            pending: PendingSet::new(),
        }
    }

    /// Resolve a registry project to a target package.
    ///
    /// On a miss the synthesized identity's project is queued as pending.
    pub fn resolve(&mut self, project: &str, default_category: &str) -> PackageIdentity {
        if let Some(identity) = self.find(project) {
            return identity;
        }

        if self.pending.insert(project) {
            tracing::debug!("{} is not packaged yet, queued for generation", project);
        }
        PackageIdentity::synthesized(default_category, package_name(project))
    }

    /// Exception table, then index. Never queues anything.
    pub fn find(&self, project: &str) -> Option<PackageIdentity> {
        if let Some(identity) = self.exceptions.get(project) {
            tracing::debug!("{} resolved by exception table to {}", project, identity);
            return Some(identity.clone());
        }

        if let Some(known) = self.index.lookup(project) {
            tracing::debug!("{} resolved by index to {}", project, known.identity);
            return Some(known.identity.clone());
        }

        None
    }

    /// Where a recipe for `project` goes: its existing identity, or a
    /// synthesized one in `default_category`. Never queues anything.
    pub fn target_for(&self, project: &str, default_category: &str) -> PackageIdentity {
        self.find(project)
            .unwrap_or_else(|| PackageIdentity::synthesized(default_category, package_name(project)))
    }

    /// Record that a recipe for `project` now exists.
    pub fn mark_generated(&mut self, project: &str, identity: PackageIdentity, version: &str) {
        self.pending.remove(project);
        self.index
            .insert(project, identity, Some(version.to_string()));
    }

    /// Forget a project that could not be generated.
    ///
    /// It is not added to the index, so a later reference queues it again.
    pub fn mark_failed(&mut self, project: &str) {
        self.pending.remove(project);
    }

    /// Take the next pending project.
    pub fn next_pending(&mut self) -> Option<String> {
        self.pending.pop()
    }

    pub fn exceptions(&self) -> &ExceptionTable {
        &self.exceptions
    }

    pub fn index(&self) -> &ExistingPackageIndex {
        &self.index
    }

    pub fn pending(&self) -> &PendingSet {
        &self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver_with_index(entries: &[(&str, &str, &str)]) -> IdentityResolver {
        let mut index = ExistingPackageIndex::new();
        for (project, category, name) in entries {
            index.insert(project, PackageIdentity::new(*category, *name), None);
        }
        IdentityResolver::new(ExceptionTable::builtin(), index)
    }

    #[test]
    fn test_exception_table_wins() {
        let mut resolver = resolver_with_index(&[("bs4", "dev-python", "bs4-impostor")]);
        let identity = resolver.resolve("bs4", DEFAULT_CATEGORY);
        assert_eq!(identity, PackageIdentity::new("dev-python", "beautifulsoup"));
        assert!(identity.exists);
        assert!(resolver.pending().is_empty());
    }

    #[test]
    fn test_index_exact_hit() {
        let mut resolver = resolver_with_index(&[("zope.interface", "dev-python", "zope-interface")]);
        let identity = resolver.resolve("Zope.Interface", DEFAULT_CATEGORY);
        assert_eq!(identity, PackageIdentity::new("dev-python", "zope-interface"));
        assert!(resolver.pending().is_empty());
    }

    #[test]
    fn test_swapped_separator_hit() {
        let mut resolver = resolver_with_index(&[("foo-bar", "dev-python", "foo-bar")]);
        let identity = resolver.resolve("Foo_Bar", DEFAULT_CATEGORY);
        assert_eq!(identity, PackageIdentity::new("dev-python", "foo-bar"));

        let mut resolver = resolver_with_index(&[("typing_extensions", "dev-python", "typing-extensions")]);
        let identity = resolver.resolve("typing-extensions", DEFAULT_CATEGORY);
        assert_eq!(identity.name, "typing-extensions");
        assert!(identity.exists);
    }

    #[test]
    fn test_exact_beats_swapped() {
        let mut resolver = resolver_with_index(&[
            ("foo-bar", "dev-python", "dashed"),
            ("foo_bar", "dev-python", "underscored"),
        ]);
        assert_eq!(resolver.resolve("foo_bar", DEFAULT_CATEGORY).name, "underscored");
        assert_eq!(resolver.resolve("foo-bar", DEFAULT_CATEGORY).name, "dashed");
    }

    #[test]
    fn test_miss_synthesizes_and_queues() {
        let mut resolver = resolver_with_index(&[]);
        let identity = resolver.resolve("Some.Project", "dev-python");
        assert_eq!(identity, PackageIdentity::synthesized("dev-python", "some-project"));
        assert!(resolver.pending().contains("some.project"));
        assert_eq!(resolver.pending().len(), 1);
    }

    #[test]
    fn test_separator_spellings_share_one_identity() {
        let mut resolver = resolver_with_index(&[]);
        let underscored = resolver.resolve("typing_extensions", DEFAULT_CATEGORY);
        let dashed = resolver.resolve("Typing-Extensions", DEFAULT_CATEGORY);
        assert_eq!(underscored, dashed);
        assert_eq!(dashed.name, "typing-extensions");
        assert_eq!(resolver.pending().iter().collect::<Vec<_>>(), vec!["typing_extensions"]);
        assert_eq!(
            resolver.target_for("typing_extensions", DEFAULT_CATEGORY),
            dashed
        );
    }

    #[test]
    fn test_resolve_is_stable() {
        let mut resolver = resolver_with_index(&[]);
        let first = resolver.resolve("requests", DEFAULT_CATEGORY);
        let second = resolver.resolve("requests", DEFAULT_CATEGORY);
        assert_eq!(first, second);
        assert_eq!(resolver.pending().len(), 1);
    }

    #[test]
    fn test_mark_generated_moves_to_index() {
        let mut resolver = resolver_with_index(&[]);
        resolver.resolve("requests", DEFAULT_CATEGORY);
        resolver.mark_generated(
            "requests",
            PackageIdentity::synthesized("dev-python", "requests"),
            "2.31.0",
        );
        assert!(resolver.pending().is_empty());
        let known = resolver.index().get("requests").unwrap();
        assert!(known.identity.exists);
        assert_eq!(known.version.as_deref(), Some("2.31.0"));
        assert!(resolver.resolve("requests", DEFAULT_CATEGORY).exists);
    }

    #[test]
    fn test_mark_failed_allows_retry() {
        let mut resolver = resolver_with_index(&[]);
        resolver.resolve("flaky", DEFAULT_CATEGORY);
        resolver.mark_failed("flaky");
        assert!(resolver.pending().is_empty());
        assert!(!resolver.index().contains("flaky"));

        resolver.resolve("flaky", DEFAULT_CATEGORY);
        assert!(resolver.pending().contains("flaky"));
    }

    #[test]
    fn test_pending_queue_order() {
        let mut pending = PendingSet::new();
        assert!(pending.insert("b"));
        assert!(pending.insert("A"));
        assert!(!pending.insert("a"));
        assert_eq!(pending.iter().collect::<Vec<_>>(), vec!["b", "A"]);
        assert_eq!(pending.pop().as_deref(), Some("b"));
        assert!(pending.remove("a"));
        assert!(pending.is_empty());

        assert!(pending.insert("foo_bar"));
        assert!(!pending.insert("Foo-Bar"));
        assert!(pending.contains("foo.bar"));
    }

    #[test]
    fn test_target_for_does_not_queue() {
        let resolver = resolver_with_index(&[("numpy", "sci-libs", "numpy")]);
        assert_eq!(
            resolver.target_for("numpy", DEFAULT_CATEGORY),
            PackageIdentity::new("sci-libs", "numpy")
        );
        assert_eq!(
            resolver.target_for("New.Project", "dev-ml"),
            PackageIdentity::synthesized("dev-ml", "new-project")
        );
        assert!(resolver.find("new.project").is_none());
        assert!(resolver.pending().is_empty());
    }

    #[test]
    fn test_identity_from_str() {
        let identity: PackageIdentity = "dev-python/beautifulsoup".parse().unwrap();
        assert_eq!(identity, PackageIdentity::new("dev-python", "beautifulsoup"));
        assert!("no-slash".parse::<PackageIdentity>().is_err());
        assert!("a/b/c".parse::<PackageIdentity>().is_err());
    }

    #[test]
    fn test_index_entries_sorted() {
        let resolver = resolver_with_index(&[
            ("zeta", "dev-python", "zeta"),
            ("Alpha", "dev-python", "alpha"),
        ]);
        let keys: Vec<&str> = resolver.index().entries().iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["alpha", "zeta"]);
    }
}
