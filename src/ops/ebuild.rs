//! Writing ebuilds and metadata.xml into the output repository.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::ProjectDescriptor;
use crate::resolver::{PackageIdentity, RenderedDependencies};
use crate::util::fs;

/// Template settings shared by every generated recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EbuildSettings {
    pub eapi: u32,
    pub keywords: String,
    pub maintainer_email: String,
    pub maintainer_name: String,
    /// Year in the copyright header
    pub copyright_year: i32,
}

impl Default for EbuildSettings {
    fn default() -> Self {
        EbuildSettings {
            eapi: 8,
            keywords: "~amd64 ~arm64".to_string(),
            maintainer_email: "example@example.com".to_string(),
            maintainer_name: "Maintainer".to_string(),
            copyright_year: time::OffsetDateTime::now_utc().year(),
        }
    }
}

/// Everything needed to write one recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRecord {
    /// Registry project name
    pub project: String,
    pub identity: PackageIdentity,
    pub version: String,
    pub license: String,
    pub homepage: String,
    pub summary: String,
    pub description: String,
    /// `PYTHON_COMPAT` entries
    pub python_compat: Vec<String>,
    pub iuse: Vec<String>,
    /// RDEPEND entries, one per line
    pub rdepend: Vec<String>,
}

impl GenerationRecord {
    pub fn new(
        descriptor: &ProjectDescriptor,
        identity: PackageIdentity,
        dependencies: RenderedDependencies,
    ) -> Self {
        GenerationRecord {
            project: descriptor.name.clone(),
            identity,
            version: descriptor.version.clone(),
            license: descriptor.license.clone(),
            homepage: descriptor.homepage.clone(),
            summary: descriptor.summary.clone(),
            description: descriptor.description.clone(),
            python_compat: descriptor.python_compat(),
            iuse: dependencies.iuse,
            rdepend: dependencies.entries,
        }
    }

    /// `<name>-<version>.ebuild`
    pub fn ebuild_file_name(&self) -> String {
        format!("{}-{}.ebuild", self.identity.name, self.version)
    }
}

/// Destination for generated recipes.
pub trait RecipeSink {
    /// Write one recipe. Returns the path of the written recipe.
    fn write_recipe(&mut self, record: &GenerationRecord) -> Result<PathBuf>;
}

/// Writes recipes into a package repository on disk.
#[derive(Debug, Clone)]
pub struct EbuildWriter {
    repo: PathBuf,
    settings: EbuildSettings,
}

impl EbuildWriter {
    pub fn new(repo: impl Into<PathBuf>, settings: EbuildSettings) -> Self {
        EbuildWriter {
            repo: repo.into(),
            settings,
        }
    }

    pub fn repo(&self) -> &Path {
        &self.repo
    }

    pub fn package_dir(&self, identity: &PackageIdentity) -> PathBuf {
        self.repo.join(&identity.category).join(&identity.name)
    }
}

impl RecipeSink for EbuildWriter {
    fn write_recipe(&mut self, record: &GenerationRecord) -> Result<PathBuf> {
        let dir = self.package_dir(&record.identity);
        fs::ensure_dir(&dir)?;

        let ebuild_path = dir.join(record.ebuild_file_name());
        tracing::info!("Writing ebuild to {}", ebuild_path.display());
        fs::write_string(&ebuild_path, &render_ebuild(record, &self.settings))?;

        let metadata_path = dir.join("metadata.xml");
        if fs::write_if_absent(&metadata_path, &render_metadata_xml(record, &self.settings))? {
            tracing::debug!("Wrote {}", metadata_path.display());
        }

        Ok(ebuild_path)
    }
}

/// Escape a value for a double-quoted shell string.
pub fn escape_bash(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' | '"' | '$' | '`' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '\n' | '\r' | '\t' => escaped.push(' '),
            _ => escaped.push(c),
        }
    }
    escaped.trim().to_string()
}

/// Escape text content for XML.
pub fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render the ebuild text.
pub fn render_ebuild(record: &GenerationRecord, settings: &EbuildSettings) -> String {
    let rdepend = if record.rdepend.is_empty() {
        "RDEPEND=\"\"".to_string()
    } else {
        format!("RDEPEND=\"\n\t{}\n\"", record.rdepend.join("\n\t"))
    };

    format!(
        r#"# Copyright {year} Gentoo Authors
# Distributed under the terms of the GNU General Public License v2

EAPI={eapi}

PYTHON_COMPAT=( {compat} )
inherit distutils-r1 pypi

DESCRIPTION="{description}"
HOMEPAGE="{homepage}"

LICENSE="{license}"
SLOT="0"
KEYWORDS="{keywords}"
IUSE="{iuse}"

{rdepend}

distutils_enable_tests pytest
"#,
        year = settings.copyright_year,
        eapi = settings.eapi,
        compat = record.python_compat.join(" "),
        description = escape_bash(&record.summary),
        homepage = escape_bash(&record.homepage),
        license = escape_bash(&record.license),
        keywords = settings.keywords,
        iuse = record.iuse.join(" "),
        rdepend = rdepend,
    )
}

/// Render metadata.xml, including the registry cross-reference a later
/// scan uses to find the package.
pub fn render_metadata_xml(record: &GenerationRecord, settings: &EbuildSettings) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE pkgmetadata SYSTEM "https://www.gentoo.org/dtd/metadata.dtd">
<pkgmetadata>
	<maintainer type="person">
		<email>{email}</email>
		<name>{name}</name>
	</maintainer>
	<longdescription lang="en">
		{longdescription}
	</longdescription>
	<upstream>
		<remote-id type="pypi">{project}</remote-id>
	</upstream>
</pkgmetadata>
"#,
        email = escape_xml(&settings.maintainer_email),
        name = escape_xml(&settings.maintainer_name),
        longdescription = escape_xml(record.description.trim()),
        project = escape_xml(&record.project),
    )
}

/// Turn `repo` into a repository the package manager accepts.
///
/// Creates `metadata/layout.conf` and `profiles/repo_name` when missing.
pub fn prepare_repository(repo: &Path) -> Result<()> {
    fs::ensure_dir(repo)
        .with_context(|| format!("output repository {} is not writable", repo.display()))?;

    fs::write_if_absent(
        &repo.join("metadata").join("layout.conf"),
        "masters = gentoo\nauto-sync = false\n",
    )?;

    let repo_name = repo
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "localrepo".to_string());
    fs::write_if_absent(
        &repo.join("profiles").join("repo_name"),
        &format!("{}\n", repo_name),
    )?;

    Ok(())
}
