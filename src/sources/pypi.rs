//! Project metadata from a PyPI-compatible JSON API.
//!
//! [`PypiClient`] talks to the registry over HTTP; [`LocalIndex`] reads the
//! same JSON documents from a directory (offline mirrors and tests). Both
//! decode into [`PypiProject`] and convert to a [`ProjectDescriptor`] with
//! the same [`DescriptorSettings`].

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use regex::Regex;
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

use crate::core::name::{normalize, separator_variants};
use crate::core::ProjectDescriptor;
use crate::sources::source::{FetchError, ProjectSource};

/// Classifier prefix naming a supported interpreter version.
const PYTHON_CLASSIFIER_PREFIX: &str = "Programming Language :: Python :: ";

/// Versions that are safe as the version part of a recipe file name:
/// alphanumeric runs joined by single `.`, `_` or `+`.
static RELEASE_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]+(?:[._+][A-Za-z0-9]+)*$").unwrap());

/// Top-level JSON document served at `<index>/<project>/json`.
#[derive(Debug, Clone, Deserialize)]
pub struct PypiProject {
    pub info: PypiInfo,

    /// Files per released version
    #[serde(default)]
    pub releases: HashMap<String, Vec<ReleaseFile>>,

    /// Files of the current version
    #[serde(default)]
    pub urls: Vec<ReleaseFile>,
}

/// The `info` object.
///
/// Every field is optional in practice; `null` and absent decode the same.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PypiInfo {
    pub name: Option<String>,
    pub version: Option<String>,
    pub license: Option<String>,
    pub home_page: Option<String>,
    pub project_urls: Option<BTreeMap<String, String>>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub requires_dist: Option<Vec<String>>,
    pub classifiers: Option<Vec<String>>,
}

/// One distribution file of a release.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReleaseFile {
    /// `sdist` or `bdist_wheel`
    pub packagetype: Option<String>,
    pub python_version: Option<String>,
    pub url: Option<String>,
}

impl ReleaseFile {
    fn is_sdist(&self) -> bool {
        self.packagetype.as_deref() == Some("sdist")
    }
}

/// Settings applied when converting registry data to a descriptor.
#[derive(Debug, Clone, Default)]
pub struct DescriptorSettings {
    /// Interpreter versions the target supports, in order
    pub python_compat: Vec<String>,

    /// Registry license string → target license name
    pub license_aliases: BTreeMap<String, String>,
}

impl DescriptorSettings {
    pub fn new(python_compat: Vec<String>, license_aliases: BTreeMap<String, String>) -> Self {
        DescriptorSettings {
            python_compat,
            license_aliases,
        }
    }

    /// Map a registry license string through the alias table.
    pub fn license(&self, raw: &str) -> String {
        let raw = raw.trim();
        if let Some(alias) = self.license_aliases.get(raw) {
            return alias.clone();
        }
        // Some projects paste the whole license text here
        match raw.lines().next() {
            Some(first) if raw.contains('\n') => {
                tracing::warn!("multi-line license field, keeping only `{}`", first.trim());
                first.trim().to_string()
            }
            _ => raw.to_string(),
        }
    }

    /// Supported interpreter versions declared by trove classifiers.
    ///
    /// Falls back to every configured version when none is declared.
    pub fn python_versions(&self, classifiers: &[String]) -> Vec<String> {
        let declared: Vec<String> = self
            .python_compat
            .iter()
            .filter(|version| {
                classifiers.iter().any(|c| {
                    c.strip_prefix(PYTHON_CLASSIFIER_PREFIX)
                        .is_some_and(|v| v.trim() == version.as_str())
                })
            })
            .cloned()
            .collect();

        if declared.is_empty() {
            self.python_compat.clone()
        } else {
            declared
        }
    }
}

impl PypiProject {
    /// Decode a JSON document.
    pub fn from_json(requested: &str, body: &str) -> Result<Self, FetchError> {
        serde_json::from_str(body).map_err(|e| FetchError::InvalidResponse {
            project: requested.to_string(),
            message: e.to_string(),
        })
    }

    /// Whether a source distribution exists for `version`.
    pub fn has_sdist(&self, version: &str) -> bool {
        match self.releases.get(version) {
            Some(files) => files.iter().any(ReleaseFile::is_sdist),
            None => self.urls.iter().any(ReleaseFile::is_sdist),
        }
    }

    /// Convert to a descriptor. `requested` is the name used in error
    /// messages.
    pub fn into_descriptor(
        self,
        requested: &str,
        settings: &DescriptorSettings,
    ) -> Result<ProjectDescriptor, FetchError> {
        let invalid = |message: &str| FetchError::InvalidResponse {
            project: requested.to_string(),
            message: message.to_string(),
        };

        let name = non_empty(self.info.name.as_deref())
            .ok_or_else(|| invalid("missing `info.name`"))?
            .to_string();
        let version = non_empty(self.info.version.as_deref())
            .ok_or_else(|| invalid("missing `info.version`"))?
            .to_string();
        if !RELEASE_VERSION.is_match(&version) {
            return Err(invalid(&format!("unusable version `{}`", version)));
        }

        let has_sdist = self.has_sdist(&version);
        if !has_sdist {
            tracing::warn!("{} {} has no source distribution", name, version);
        }

        let homepage = non_empty(self.info.home_page.as_deref())
            .map(str::to_string)
            .or_else(|| {
                self.info.project_urls.as_ref().and_then(|urls| {
                    urls.iter()
                        .find(|(label, _)| label.eq_ignore_ascii_case("homepage"))
                        .map(|(_, url)| url.clone())
                })
            })
            .unwrap_or_default();

        let classifiers = self.info.classifiers.unwrap_or_default();

        Ok(ProjectDescriptor {
            license: settings.license(self.info.license.as_deref().unwrap_or_default()),
            homepage,
            summary: self.info.summary.unwrap_or_default().trim().to_string(),
            description: self.info.description.unwrap_or_default(),
            requires_dist: self.info.requires_dist.unwrap_or_default(),
            python_versions: settings.python_versions(&classifiers),
            has_sdist,
            name,
            version,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// HTTP client for the registry JSON API.
///
/// Descriptors are cached by normalized name, so a project is fetched at
/// most once per run.
#[derive(Debug)]
pub struct PypiClient {
    client: Client,
    index_url: Url,
    settings: DescriptorSettings,
    cache: HashMap<String, ProjectDescriptor>,
}

impl PypiClient {
    pub fn new(index_url: Url, timeout: Duration, settings: DescriptorSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pypi-ebuilder/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;

        Ok(PypiClient {
            client,
            index_url,
            settings,
            cache: HashMap::new(),
        })
    }

    /// URL of a project's JSON document.
    pub fn project_url(&self, project: &str) -> Result<Url, FetchError> {
        self.index_url
            .join(&format!("{}/json", project.trim()))
            .map_err(|e| FetchError::Transport {
                project: project.to_string(),
                message: format!("invalid project URL: {}", e),
            })
    }

    fn fetch_uncached(&self, project: &str) -> Result<ProjectDescriptor, FetchError> {
        let url = self.project_url(project)?;
        tracing::info!("Retrieving metadata of {} from {}", project, url);

        let transport = |message: String| FetchError::Transport {
            project: project.to_string(),
            message,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound {
                project: project.to_string(),
            });
        }
        if !status.is_success() {
            return Err(transport(format!("HTTP {} from {}", status, url)));
        }

        let body = response.text().map_err(|e| transport(e.to_string()))?;
        PypiProject::from_json(project, &body)?.into_descriptor(project, &self.settings)
    }
}

impl ProjectSource for PypiClient {
    fn name(&self) -> &str {
        self.index_url.as_str()
    }

    fn fetch_project(&mut self, project: &str) -> Result<ProjectDescriptor, FetchError> {
        let key = normalize(project);
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached.clone());
        }

        let descriptor = self.fetch_uncached(project)?;
        self.cache.insert(key, descriptor.clone());
        Ok(descriptor)
    }
}

/// Registry documents stored as `<dir>/<normalized-name>.json`.
///
/// A document stored under the other separator spelling (`foo_bar.json` for
/// `foo-bar`) is found too.
#[derive(Debug, Clone)]
pub struct LocalIndex {
    root: PathBuf,
    settings: DescriptorSettings,
}

impl LocalIndex {
    pub fn new(root: impl Into<PathBuf>, settings: DescriptorSettings) -> Self {
        LocalIndex {
            root: root.into(),
            settings,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a project's document: the normalized name if that file
    /// exists, then the separator-swapped names. Falls back to the
    /// normalized path when none exists.
    pub fn project_path(&self, project: &str) -> PathBuf {
        let key = normalize(project);
        let primary = self.document_path(&key);
        if primary.is_file() {
            return primary;
        }
        separator_variants(&key)
            .iter()
            .map(|variant| self.document_path(variant))
            .find(|path| path.is_file())
            .unwrap_or(primary)
    }

    fn document_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }
}

impl ProjectSource for LocalIndex {
    fn name(&self) -> &str {
        "local index"
    }

    fn fetch_project(&mut self, project: &str) -> Result<ProjectDescriptor, FetchError> {
        let path = self.project_path(project);
        if !path.is_file() {
            return Err(FetchError::NotFound {
                project: project.to_string(),
            });
        }

        tracing::debug!("Reading metadata of {} from {}", project, path.display());
        let body = std::fs::read_to_string(&path).map_err(|e| FetchError::Transport {
            project: project.to_string(),
            message: format!("failed to read {}: {}", path.display(), e),
        })?;

        PypiProject::from_json(project, &body)?.into_descriptor(project, &self.settings)
    }
}
