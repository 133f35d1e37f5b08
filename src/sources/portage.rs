//! Scanning a package tree for projects that are already packaged.
//!
//! A package declares its registry project in `metadata.xml`:
//!
//! ```xml
//! <upstream>
//!     <remote-id type="pypi">requests</remote-id>
//! </upstream>
//! ```
//!
//! Only `CATEGORY/PACKAGE/metadata.xml` files are considered.

use std::path::{Path, PathBuf};

use anyhow::Result;
use portage_atom::Version;
use roxmltree::{Document, ParsingOptions};
use walkdir::WalkDir;

use crate::resolver::{ExistingPackageIndex, PackageIdentity};

/// Remote-id type naming a registry project.
const PYPI_REMOTE_TYPE: &str = "pypi";

/// One package found in a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedPackage {
    /// Registry project named by the remote-id
    pub project: String,
    pub identity: PackageIdentity,
    /// Highest ebuild version in the package directory
    pub version: Option<String>,
    pub metadata_path: PathBuf,
}

/// Number of packages found per scanned tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub repositories: Vec<(PathBuf, usize)>,
}

impl ScanSummary {
    pub fn total(&self) -> usize {
        self.repositories.iter().map(|(_, count)| count).sum()
    }
}

/// Extract the first `upstream/remote-id` of type `pypi`.
pub fn pypi_remote_id(xml: &str) -> Result<Option<String>, roxmltree::Error> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(xml, options)?;

    let remote_id = doc
        .descendants()
        .filter(|node| node.has_tag_name("remote-id"))
        .filter(|node| {
            node.parent_element()
                .is_some_and(|parent| parent.has_tag_name("upstream"))
        })
        .find(|node| node.attribute("type") == Some(PYPI_REMOTE_TYPE))
        .and_then(|node| node.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string);

    Ok(remote_id)
}

/// Highest `PACKAGE-VERSION.ebuild` in a package directory.
pub fn highest_ebuild_version(package_dir: &Path, package: &str) -> Option<String> {
    let entries = std::fs::read_dir(package_dir).ok()?;
    let prefix = format!("{}-", package);

    entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let file_name = entry.file_name().to_string_lossy().into_owned();
            let raw = file_name
                .strip_suffix(".ebuild")?
                .strip_prefix(&prefix)?
                .to_string();
            let parsed = Version::parse(&raw).ok()?;
            Some((parsed, raw))
        })
        .max_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, raw)| raw)
}

/// Scan one tree.
///
/// A missing directory is logged and yields nothing; so does a
/// `metadata.xml` that does not parse.
pub fn scan_repository(root: &Path) -> Result<Vec<ScannedPackage>> {
    if !root.is_dir() {
        tracing::warn!(
            "package tree {} does not exist, skipping scan",
            root.display()
        );
        return Ok(Vec::new());
    }

    let mut packages = Vec::new();

    let walker = WalkDir::new(root)
        .min_depth(3)
        .max_depth(3)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("error walking {}: {}", root.display(), e);
                continue;
            }
        };

        if !entry.file_type().is_file() || entry.file_name() != "metadata.xml" {
            continue;
        }

        let metadata_path = entry.path();
        let Some(package_dir) = metadata_path.parent() else {
            continue;
        };
        let Some(category_dir) = package_dir.parent() else {
            continue;
        };
        let (Some(package), Some(category)) = (
            package_dir.file_name().and_then(|n| n.to_str()),
            category_dir.file_name().and_then(|n| n.to_str()),
        ) else {
            continue;
        };

        let xml = match std::fs::read_to_string(metadata_path) {
            Ok(xml) => xml,
            Err(e) => {
                tracing::warn!("failed to read {}: {}", metadata_path.display(), e);
                continue;
            }
        };

        let project = match pypi_remote_id(&xml) {
            Ok(Some(project)) => project,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!("failed to parse {}: {}", metadata_path.display(), e);
                continue;
            }
        };

        let version = highest_ebuild_version(package_dir, package);
        tracing::debug!(
            "found {} as {}/{} ({})",
            project,
            category,
            package,
            version.as_deref().unwrap_or("no ebuild")
        );

        packages.push(ScannedPackage {
            project,
            identity: PackageIdentity::new(category, package),
            version,
            metadata_path: metadata_path.to_path_buf(),
        });
    }

    Ok(packages)
}

/// Scan every tree in order and fill `index`.
///
/// Later trees override earlier ones for the same project.
pub fn scan_repositories(
    roots: &[PathBuf],
    index: &mut ExistingPackageIndex,
) -> Result<ScanSummary> {
    let mut summary = ScanSummary::default();

    for root in roots {
        let packages = scan_repository(root)?;
        let count = packages.len();
        for package in packages {
            index.insert(&package.project, package.identity, package.version);
        }
        tracing::info!("found {} packages in {}", count, root.display());
        summary.repositories.push((root.clone(), count));
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixtures::write_tree_package;
    use tempfile::TempDir;

    const METADATA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE pkgmetadata SYSTEM "https://www.gentoo.org/dtd/metadata.dtd">
<pkgmetadata>
    <maintainer type="project">
        <email>python@gentoo.org</email>
    </maintainer>
    <upstream>
        <remote-id type="github">psf/requests</remote-id>
        <remote-id type="pypi">requests</remote-id>
    </upstream>
</pkgmetadata>
"#;

    fn write_package(root: &Path, category: &str, name: &str, xml: &str, versions: &[&str]) {
        let dir = root.join(category).join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("metadata.xml"), xml).unwrap();
        for version in versions {
            std::fs::write(dir.join(format!("{}-{}.ebuild", name, version)), "EAPI=8\n").unwrap();
        }
    }

    #[test]
    fn test_pypi_remote_id() {
        assert_eq!(pypi_remote_id(METADATA).unwrap().as_deref(), Some("requests"));
    }

    #[test]
    fn test_pypi_remote_id_absent() {
        let xml = "<pkgmetadata><upstream><remote-id type=\"github\">a/b</remote-id></upstream></pkgmetadata>";
        assert_eq!(pypi_remote_id(xml).unwrap(), None);

        // Outside <upstream> does not count
        let xml = "<pkgmetadata><remote-id type=\"pypi\">stray</remote-id></pkgmetadata>";
        assert_eq!(pypi_remote_id(xml).unwrap(), None);
    }

    #[test]
    fn test_pypi_remote_id_malformed() {
        assert!(pypi_remote_id("<pkgmetadata><upstream>").is_err());
    }

    #[test]
    fn test_highest_ebuild_version() {
        let tmp = TempDir::new().unwrap();
        write_package(
            tmp.path(),
            "dev-python",
            "requests",
            METADATA,
            &["2.9.0", "2.31.0", "2.31.0-r1", "2.10.0"],
        );
        std::fs::write(
            tmp.path().join("dev-python/requests/requests-9999.ebuild.bak"),
            "",
        )
        .unwrap();

        let dir = tmp.path().join("dev-python/requests");
        assert_eq!(
            highest_ebuild_version(&dir, "requests").as_deref(),
            Some("2.31.0-r1")
        );
        assert_eq!(highest_ebuild_version(&tmp.path().join("missing"), "x"), None);
    }

    #[test]
    fn test_scan_repository() {
        let tmp = TempDir::new().unwrap();
        write_package(tmp.path(), "dev-python", "requests", METADATA, &["2.31.0"]);
        write_package(
            tmp.path(),
            "dev-python",
            "not-pypi",
            "<pkgmetadata><upstream/></pkgmetadata>",
            &["1.0"],
        );
        write_package(tmp.path(), "dev-python", "broken", "<pkgmetadata>", &[]);
        // Too deep to be a package
        write_package(
            &tmp.path().join("dev-python/requests"),
            "files",
            "nested",
            METADATA,
            &[],
        );

        let packages = scan_repository(tmp.path()).unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].project, "requests");
        assert_eq!(
            packages[0].identity,
            PackageIdentity::new("dev-python", "requests")
        );
        assert_eq!(packages[0].version.as_deref(), Some("2.31.0"));
    }

    #[test]
    fn test_scan_missing_directory() {
        let tmp = TempDir::new().unwrap();
        let packages = scan_repository(&tmp.path().join("nope")).unwrap();
        assert!(packages.is_empty());
    }

    #[test]
    fn test_scan_repositories_fills_index() {
        let gentoo = TempDir::new().unwrap();
        let overlay = TempDir::new().unwrap();
        write_tree_package(gentoo.path(), "dev-python", "requests", "requests", &["2.28.0"]);
        write_tree_package(overlay.path(), "net-misc", "requests", "Requests", &["2.31.0"]);

        let mut index = ExistingPackageIndex::new();
        let summary = scan_repositories(
            &[gentoo.path().to_path_buf(), overlay.path().to_path_buf()],
            &mut index,
        )
        .unwrap();

        assert_eq!(summary.total(), 2);
        assert_eq!(index.len(), 1);
        let known = index.get("Requests").unwrap();
        assert_eq!(known.identity, PackageIdentity::new("net-misc", "requests"));
        assert_eq!(known.version.as_deref(), Some("2.31.0"));
    }
}
