//! Configuration file support for ebuilder.
//!
//! ebuilder supports two configuration file locations:
//! - Global: `~/.ebuilder/config.toml` - User-wide defaults
//! - Project: `.ebuilder/config.toml` - Overrides for the current directory
//!
//! Project config takes precedence over global config. An explicit
//! `--config` path takes the place of the project config.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::ops::ebuild::EbuildSettings;
use crate::resolver::{ExceptionTable, Exclusions, PackageIdentity, DEFAULT_CATEGORY};

/// Default PyPI JSON API base.
pub const DEFAULT_INDEX_URL: &str = "https://pypi.org/pypi/";

/// Default output repository.
pub const DEFAULT_REPO: &str = "../gentoo-localrepo";

/// Default tree scanned for existing packages.
pub const DEFAULT_SCAN_REPO: &str = "/var/db/repos/gentoo";

/// Interpreter versions assumed when classifiers name none.
pub const DEFAULT_PYTHON_COMPAT: &[&str] = &["3.10", "3.11", "3.12"];

/// ebuilder configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Generation settings
    pub generate: GenerateConfig,

    /// Interpreter settings
    pub python: PythonConfig,

    /// Requirement exclusion rules
    pub exclusions: ExclusionsConfig,

    /// License aliases, `"registry string" = "LICENSE"`
    pub licenses: BTreeMap<String, String>,

    /// Exception table entries, `"project" = "category/name"`
    pub exceptions: BTreeMap<String, String>,

    /// Ebuild template settings
    pub ebuild: EbuildConfig,

    /// Network settings
    pub net: NetConfig,

    /// Manifest tool settings
    pub manifest: ManifestConfig,
}

/// Generation-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    /// Category for newly generated packages
    pub default_category: Option<String>,

    /// Generate missing dependencies too
    pub recursive: Option<bool>,

    /// Output repository
    pub repo: Option<PathBuf>,

    /// Package trees scanned for existing packages
    pub scan_repos: Option<Vec<PathBuf>>,
}

/// Interpreter configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PythonConfig {
    /// Supported interpreter versions (e.g. "3.11")
    pub compat: Option<Vec<String>>,
}

/// Requirement exclusion configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExclusionsConfig {
    /// Feature flags never emitted
    pub blocked_extras: Option<Vec<String>>,

    /// Projects always dropped
    pub removed_projects: Option<Vec<String>>,

    /// Name prefixes of obsolete compatibility shims
    pub obsolete_prefixes: Option<Vec<String>>,
}

/// Ebuild template configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EbuildConfig {
    pub eapi: Option<u32>,
    pub keywords: Option<String>,
    pub maintainer_email: Option<String>,
    pub maintainer_name: Option<String>,
}

/// Network-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    /// Base URL of the registry JSON API
    pub index_url: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// Manifest tool configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestConfig {
    /// Run the tool after each recipe is written
    pub enabled: Option<bool>,

    /// Program and arguments, run inside the package directory
    pub command: Option<Vec<String>>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load the global config, then the explicit or project config on top.
    ///
    /// A config file that exists but cannot be parsed is an error.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        Self::discover_in(global_config_path().as_deref(), explicit, cwd)
    }

    /// [`Config::discover`] with the global config file given explicitly.
    pub fn discover_in(global: Option<&Path>, explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        let mut config = Config::default();

        if let Some(global) = global {
            if global.exists() {
                config.merge(Config::load(global)?);
            }
        }

        match explicit {
            Some(path) => config.merge(Config::load(path)?),
            None => {
                let project = project_config_path(cwd);
                if project.exists() {
                    config.merge(Config::load(&project)?);
                }
            }
        }

        Ok(config)
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        // Generate settings
        if other.generate.default_category.is_some() {
            self.generate.default_category = other.generate.default_category;
        }
        if other.generate.recursive.is_some() {
            self.generate.recursive = other.generate.recursive;
        }
        if other.generate.repo.is_some() {
            self.generate.repo = other.generate.repo;
        }
        if other.generate.scan_repos.is_some() {
            self.generate.scan_repos = other.generate.scan_repos;
        }

        if other.python.compat.is_some() {
            self.python.compat = other.python.compat;
        }

        if other.exclusions.blocked_extras.is_some() {
            self.exclusions.blocked_extras = other.exclusions.blocked_extras;
        }
        if other.exclusions.removed_projects.is_some() {
            self.exclusions.removed_projects = other.exclusions.removed_projects;
        }
        if other.exclusions.obsolete_prefixes.is_some() {
            self.exclusions.obsolete_prefixes = other.exclusions.obsolete_prefixes;
        }

        // Tables are merged key by key
        self.licenses.extend(other.licenses);
        self.exceptions.extend(other.exceptions);

        if other.ebuild.eapi.is_some() {
            self.ebuild.eapi = other.ebuild.eapi;
        }
        if other.ebuild.keywords.is_some() {
            self.ebuild.keywords = other.ebuild.keywords;
        }
        if other.ebuild.maintainer_email.is_some() {
            self.ebuild.maintainer_email = other.ebuild.maintainer_email;
        }
        if other.ebuild.maintainer_name.is_some() {
            self.ebuild.maintainer_name = other.ebuild.maintainer_name;
        }

        if other.net.index_url.is_some() {
            self.net.index_url = other.net.index_url;
        }
        if other.net.timeout_secs.is_some() {
            self.net.timeout_secs = other.net.timeout_secs;
        }

        if other.manifest.enabled.is_some() {
            self.manifest.enabled = other.manifest.enabled;
        }
        if other.manifest.command.is_some() {
            self.manifest.command = other.manifest.command;
        }
    }

    pub fn default_category(&self) -> &str {
        self.generate
            .default_category
            .as_deref()
            .unwrap_or(DEFAULT_CATEGORY)
    }

    pub fn recursive(&self) -> bool {
        self.generate.recursive.unwrap_or(false)
    }

    pub fn repo(&self) -> PathBuf {
        self.generate
            .repo
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_REPO))
    }

    pub fn scan_repos(&self) -> Vec<PathBuf> {
        self.generate
            .scan_repos
            .clone()
            .unwrap_or_else(|| vec![PathBuf::from(DEFAULT_SCAN_REPO)])
    }

    pub fn python_compat(&self) -> Vec<String> {
        self.python.compat.clone().unwrap_or_else(|| {
            DEFAULT_PYTHON_COMPAT
                .iter()
                .map(|v| v.to_string())
                .collect()
        })
    }

    /// Exclusion rules, falling back to the built-in defaults per list.
    pub fn exclusions(&self) -> Exclusions {
        let defaults = ExclusionsConfig {
            blocked_extras: Some(vec!["dev".to_string()]),
            removed_projects: Some(vec!["backports.lzma".to_string()]),
            obsolete_prefixes: Some(vec!["backports".to_string()]),
        };
        let pick = |own: &Option<Vec<String>>, fallback: Option<Vec<String>>| {
            own.clone().or(fallback).unwrap_or_default()
        };
        Exclusions::new(
            pick(&self.exclusions.blocked_extras, defaults.blocked_extras),
            pick(&self.exclusions.removed_projects, defaults.removed_projects),
            pick(&self.exclusions.obsolete_prefixes, defaults.obsolete_prefixes),
        )
    }

    /// Built-in license aliases with configured entries on top.
    pub fn license_aliases(&self) -> BTreeMap<String, String> {
        let mut aliases: BTreeMap<String, String> = [
            ("BSD 3-clause", "BSD"),
            ("BSD 3-clause License", "BSD"),
            ("BSD 3-Clause License", "BSD"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        aliases.extend(self.licenses.clone());
        aliases
    }

    /// Built-in exception table with configured entries on top.
    pub fn exception_table(&self) -> Result<ExceptionTable> {
        let mut table = ExceptionTable::builtin();
        for (project, target) in &self.exceptions {
            let identity: PackageIdentity = target
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))
                .with_context(|| format!("invalid exception entry for `{}`", project))?;
            table.insert(project, identity);
        }
        Ok(table)
    }

    /// Base URL of the registry JSON API.
    pub fn index_url(&self) -> Result<Url> {
        let raw = self.net.index_url.as_deref().unwrap_or(DEFAULT_INDEX_URL);
        let normalized = if raw.ends_with('/') {
            raw.to_string()
        } else {
            format!("{}/", raw)
        };
        Url::parse(&normalized).with_context(|| format!("invalid index URL: {}", raw))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.net.timeout_secs.unwrap_or(30))
    }

    pub fn run_manifest(&self) -> bool {
        self.manifest.enabled.unwrap_or(false)
    }

    pub fn manifest_command(&self) -> Vec<String> {
        self.manifest
            .command
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| vec!["pkgdev".to_string(), "manifest".to_string()])
    }

    /// Settings for the ebuild template.
    pub fn ebuild_settings(&self) -> EbuildSettings {
        let defaults = EbuildSettings::default();
        EbuildSettings {
            eapi: self.ebuild.eapi.unwrap_or(defaults.eapi),
            keywords: self.ebuild.keywords.clone().unwrap_or(defaults.keywords),
            maintainer_email: self
                .ebuild
                .maintainer_email
                .clone()
                .unwrap_or(defaults.maintainer_email),
            maintainer_name: self
                .ebuild
                .maintainer_name
                .clone()
                .unwrap_or(defaults.maintainer_name),
            ..defaults
        }
    }
}

/// Get the global ebuilder config directory (~/.ebuilder).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".ebuilder"))
}

/// Get the global config path (~/.ebuilder/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.ebuilder/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".ebuilder").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.default_category(), "dev-python");
        assert!(!config.recursive());
        assert_eq!(config.repo(), PathBuf::from("../gentoo-localrepo"));
        assert_eq!(config.python_compat(), vec!["3.10", "3.11", "3.12"]);
        assert!(config.exclusions().blocks_extra("dev"));
        assert!(config.exclusions().drops_project("backports.lzma"));
        assert_eq!(config.manifest_command(), vec!["pkgdev", "manifest"]);
        assert_eq!(config.index_url().unwrap().as_str(), "https://pypi.org/pypi/");
    }

    #[test]
    fn test_config_load() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");

        std::fs::write(
            &config_path,
            r#"
[generate]
default_category = "dev-ml"
recursive = true
scan_repos = ["/srv/gentoo", "/srv/overlay"]

[python]
compat = ["3.12", "3.13"]

[exclusions]
blocked_extras = ["dev", "lint"]

[licenses]
"Apache Software License" = "Apache-2.0"

[exceptions]
"PyQt5" = "dev-python/pyqt5"

[net]
index_url = "https://mirror.example.org/pypi"
"#,
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config.default_category(), "dev-ml");
        assert!(config.recursive());
        assert_eq!(config.scan_repos().len(), 2);
        assert_eq!(config.python_compat(), vec!["3.12", "3.13"]);
        assert!(config.exclusions().blocks_extra("lint"));
        // Untouched lists keep their defaults
        assert!(config.exclusions().drops_project("backports.ssl"));
        assert_eq!(
            config.license_aliases().get("Apache Software License"),
            Some(&"Apache-2.0".to_string())
        );
        assert_eq!(
            config.license_aliases().get("BSD 3-clause"),
            Some(&"BSD".to_string())
        );

        let table = config.exception_table().unwrap();
        assert_eq!(
            table.get("pyqt5"),
            Some(&PackageIdentity::new("dev-python", "pyqt5"))
        );
        assert!(table.get("bs4").is_some());

        assert_eq!(
            config.index_url().unwrap().as_str(),
            "https://mirror.example.org/pypi/"
        );
    }

    #[test]
    fn test_config_invalid_exception() {
        let mut config = Config::default();
        config
            .exceptions
            .insert("foo".to_string(), "not-an-atom".to_string());
        assert!(config.exception_table().is_err());
    }

    #[test]
    fn test_config_merge() {
        let mut base = Config::default();
        base.generate.default_category = Some("dev-python".to_string());
        base.net.timeout_secs = Some(10);
        base.licenses.insert("MIT License".into(), "MIT".into());

        let mut override_cfg = Config::default();
        override_cfg.generate.default_category = Some("sci-libs".to_string());
        override_cfg.licenses.insert("GPLv3".into(), "GPL-3".into());

        base.merge(override_cfg);

        assert_eq!(base.default_category(), "sci-libs");
        assert_eq!(base.timeout(), Duration::from_secs(10)); // Not overridden
        assert_eq!(base.licenses.len(), 2);
    }

    #[test]
    fn test_discover_layers() {
        let tmp = TempDir::new().unwrap();
        let global = tmp.path().join("home/.ebuilder/config.toml");
        std::fs::create_dir_all(global.parent().unwrap()).unwrap();
        std::fs::write(
            &global,
            "[generate]\nrecursive = true\ndefault_category = \"a\"\n",
        )
        .unwrap();

        let cwd = tmp.path().join("work");
        let project = project_config_path(&cwd);
        std::fs::create_dir_all(project.parent().unwrap()).unwrap();
        std::fs::write(&project, "[generate]\ndefault_category = \"b\"\n").unwrap();

        // Project overrides global, untouched keys keep the global value
        let config = Config::discover_in(Some(&global), None, &cwd).unwrap();
        assert_eq!(config.default_category(), "b");
        assert!(config.recursive());

        // An explicit file replaces the project layer
        let explicit = tmp.path().join("explicit.toml");
        std::fs::write(&explicit, "[net]\ntimeout_secs = 5\n").unwrap();
        let config = Config::discover_in(Some(&global), Some(&explicit), &cwd).unwrap();
        assert_eq!(config.default_category(), "a");
        assert_eq!(config.timeout(), Duration::from_secs(5));

        // No global file at all
        let missing = tmp.path().join("nowhere/config.toml");
        let config = Config::discover_in(Some(&missing), None, &cwd).unwrap();
        assert!(!config.recursive());
        let config = Config::discover_in(None, None, &cwd).unwrap();
        assert_eq!(config.default_category(), "b");
    }

    #[test]
    fn test_discover_rejects_invalid_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.toml");
        std::fs::write(&path, "[generate\n").unwrap();

        assert!(Config::discover_in(None, Some(&path), tmp.path()).is_err());
        // A broken global file is an error too
        assert!(Config::discover_in(Some(&path), None, tmp.path()).is_err());
    }

    #[test]
    fn test_ebuild_settings() {
        let mut config = Config::default();
        config.ebuild.eapi = Some(7);
        let settings = config.ebuild_settings();
        assert_eq!(settings.eapi, 7);
        assert_eq!(settings.keywords, EbuildSettings::default().keywords);
    }
}
