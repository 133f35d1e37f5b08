//! Project descriptors.

/// Snapshot of one registry project at one version.
///
/// The version is opaque: it is compared for equality and formatted into
/// file names, never parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectDescriptor {
    /// Registry-canonical name
    pub name: String,

    /// Current version
    pub version: String,

    /// License string, after alias mapping
    pub license: String,

    /// Project homepage (may be empty)
    pub homepage: String,

    /// One-line summary
    pub summary: String,

    /// Long description
    pub description: String,

    /// Raw requirement strings, in registry order
    pub requires_dist: Vec<String>,

    /// Supported interpreter versions, e.g. `3.11`
    pub python_versions: Vec<String>,

    /// Whether a source distribution exists for `version`
    pub has_sdist: bool,
}

impl ProjectDescriptor {
    /// Create a descriptor with only a name and version set.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        ProjectDescriptor {
            name: name.into(),
            version: version.into(),
            has_sdist: true,
            ..Default::default()
        }
    }

    /// Set the raw requirement strings.
    pub fn with_requirements<I, S>(mut self, requirements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires_dist = requirements.into_iter().map(Into::into).collect();
        self
    }

    /// `PYTHON_COMPAT` entries, e.g. `python3_11`.
    pub fn python_compat(&self) -> Vec<String> {
        self.python_versions
            .iter()
            .map(|v| format!("python{}", v.replace('.', "_")))
            .collect()
    }
}
